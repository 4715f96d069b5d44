use super::ir::{CodecBundle, GeneratedRoutine};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to serialize codec IR: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("routine '{routine}' cannot be emitted: {reason}")]
    Unsupported { routine: String, reason: String },
    #[error("emit called after finish")]
    Finished,
}

/// A file produced by a backend, relative to the namespace output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub relative_path: PathBuf,
    pub contents: String,
}

/// Receives routines in order and renders them into files.
///
/// Nothing is written to disk by a backend; the generator stages and commits
/// the returned files together with the known-types manifest.
pub trait EmitBackend {
    fn begin(&mut self, _namespace: &str) -> Result<(), EmitError> {
        Ok(())
    }

    fn emit_routine(&mut self, routine: &GeneratedRoutine) -> Result<(), EmitError>;

    fn finish(&mut self) -> Result<Vec<EmittedFile>, EmitError>;
}

pub const IR_FILE_NAME: &str = "codecs.ir.json";

/// Serializes the whole bundle as JSON for tooling and the interpreter.
#[derive(Debug, Default)]
pub struct IrJsonBackend {
    namespace: String,
    routines: Vec<GeneratedRoutine>,
    finished: bool,
}

impl IrJsonBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EmitBackend for IrJsonBackend {
    fn begin(&mut self, namespace: &str) -> Result<(), EmitError> {
        self.namespace = namespace.to_string();
        Ok(())
    }

    fn emit_routine(&mut self, routine: &GeneratedRoutine) -> Result<(), EmitError> {
        if self.finished {
            return Err(EmitError::Finished);
        }
        self.routines.push(routine.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<EmittedFile>, EmitError> {
        self.finished = true;
        let bundle = CodecBundle::new(self.namespace.clone(), std::mem::take(&mut self.routines));
        Ok(vec![EmittedFile { relative_path: PathBuf::from(IR_FILE_NAME), contents: bundle.to_json()? }])
    }
}
