/* Codec Runtime Library
 *
 * Token-stream reader and writer shared by generated Rust codecs, the
 * serde-backed generic fallback, and an interpreter that runs codec IR
 * bundles directly against JSON documents.
 */

pub mod codec;
pub mod errors;
pub mod fallback;
pub mod ir;
pub mod stream;
pub mod value;

pub use codec::{from_json_str, to_json_string, Codec, CodecEntry, DecodeFn, EncodeFn};
pub use codec_gen::codegen::ir::TokenKind;
pub use errors::{CodecError, ReflectError, ReflectResult};
pub use fallback::{GenericCodec, PassthroughCodec, StrictCodec};
pub use indexmap::IndexMap;
pub use ir::CodecInterpreter;
pub use value::{ObjectValue, Value};
