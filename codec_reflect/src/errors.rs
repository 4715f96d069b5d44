use codec_gen::codegen::ir::TokenKind;
use thiserror::Error;

/// Result alias used across the runtime.
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Name generated code uses for runtime failures.
pub type CodecError = ReflectError;

/// Errors produced by the token stream, the fallback codec and the interpreter.
#[derive(Debug, Error)]
pub enum ReflectError {
    #[error("expected {expected:?} but found {found:?}")]
    UnexpectedToken { expected: TokenKind, found: TokenKind },

    #[error("unexpected end of document")]
    UnexpectedEnd,

    #[error("malformed JSON at byte {offset}: {reason}")]
    Syntax { offset: usize, reason: &'static str },

    #[error("'{text}' is not a valid {target}")]
    NumberFormat { text: String, target: &'static str },

    #[error("{value} cannot be represented in JSON")]
    NonFiniteNumber { value: f64 },

    #[error("invalid write: {reason}")]
    InvalidWrite { reason: &'static str },

    /// A nested value failed to decode; carries the owning type and field.
    #[error("error parsing {owner}.{field}: {source}")]
    DecodeFailure {
        owner: String,
        field: String,
        #[source]
        source: Box<ReflectError>,
    },

    #[error("routine '{name}' not found in any loaded bundle")]
    UnknownRoutine { name: String },

    #[error("routine '{name}' is not a {expected} routine")]
    WrongRoutineKind { name: String, expected: &'static str },

    #[error("routine '{routine}' cannot execute {op}")]
    InvalidInstruction { routine: String, op: String },

    #[error("expected {expected} value but found {found}")]
    ValueMismatch { expected: &'static str, found: String },

    #[error("no codec available for '{type_name}'")]
    Unsupported { type_name: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReflectError {
    pub fn decode_failure(owner: &str, field: &str, source: ReflectError) -> Self {
        ReflectError::DecodeFailure {
            owner: owner.to_string(),
            field: field.to_string(),
            source: Box::new(source),
        }
    }
}
