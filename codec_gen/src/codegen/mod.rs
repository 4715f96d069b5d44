pub mod backend;
pub mod dispatch;
pub mod ir;
pub mod naming;
pub mod rust;
pub mod synth;

pub use backend::{EmitBackend, EmitError, EmittedFile, IrJsonBackend};
pub use rust::RustBackend;
pub use synth::CodecSynthesizer;
