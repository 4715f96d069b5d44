//! Build-time codec generator.
//!
//! Given a universe of type declarations, discovers the types that take part
//! in serialization, resolves their concrete members through generic
//! inheritance, and synthesizes paired decode/encode routines plus a dispatch
//! table. Routines are handed to an [`codegen::backend::EmitBackend`] as
//! instruction lists; the backend owns the textual form.

pub mod codegen;
pub mod error;
pub mod manifest;
pub mod model;
pub mod pipeline;

pub use error::GenError;
pub use pipeline::{generate, CodecGenerator, Generation, GeneratorOptions, HostInput, RunSummary};
