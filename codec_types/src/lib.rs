//! Codec Declaration Types
//!
//! This crate contains the declaration model consumed by the codec generator:
//! structural type references and the candidate type declarations supplied by
//! the host. It provides pure data structures without any file I/O or code
//! generation logic.

pub mod type_ref;
pub mod types;

// Re-export commonly used types at the crate root
pub use type_ref::*;
pub use types::*;
