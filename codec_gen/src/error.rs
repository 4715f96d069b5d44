use crate::codegen::backend::EmitError;
use crate::manifest::ManifestError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while generating codecs.
///
/// Everything except [`GenError::AmbiguousType`] aborts the run: the generator
/// commits all of its outputs or none of them.
#[derive(Debug, Error)]
pub enum GenError {
    /// A per-instance immutable (or otherwise unassignable) field was selected.
    #[error("unable to access field \"{field}\" in type {owner}: {reason}")]
    UnsupportedField {
        owner: String,
        field: String,
        reason: &'static str,
    },

    /// Type arguments could not be resolved to concrete types; the type is skipped.
    #[error("type '{type_name}' has no concrete instantiation: {reason}")]
    AmbiguousType { type_name: String, reason: String },

    #[error("type '{owner}' declares fields '{first}' and '{second}' with the same wire name '{wire_name}'")]
    DuplicateWireName {
        owner: String,
        wire_name: String,
        first: String,
        second: String,
    },

    #[error("field '{field}' of type '{owner}' is not a valid identifier")]
    InvalidFieldName { owner: String, field: String },

    #[error("circular inheritance: {}", chain.join(" -> "))]
    CircularInheritance { chain: Vec<String> },

    #[error("type '{type_name}' is not declared")]
    UnknownType { type_name: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("code emission failed: {0}")]
    Emit(#[from] EmitError),

    #[error("failed to write '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GenError::AmbiguousType { .. })
    }
}
