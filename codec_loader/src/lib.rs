//! Declaration File Loading and Import Resolution
//!
//! This crate provides functionality for loading codec declaration files from
//! disk, resolving imports between them, qualifying type names with their
//! package, and flagging which declarations belong to the current
//! compilation unit.

pub mod file;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use file::{CodecMetadata, CodecOptions, DeclFile, ImportSource};
pub use resolver::{ImportResolver, LoadedDecl};

// Re-export codec_types for convenience
pub use codec_types;
