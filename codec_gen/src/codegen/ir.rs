//! Codec IR shared by every emission backend.
//!
//! Each generated routine is a flat list of [`Instr`]s executed top to
//! bottom. Decoding routines pull from a token reader and return a value;
//! encoding routines push to a token writer. Backends either render the
//! instructions as source (see [`crate::codegen::rust`]) or serialize the
//! bundle for interpretation (see [`crate::codegen::backend::IrJsonBackend`]).
//!
//! # Example
//! ```
//! use codec_gen::codegen::ir::*;
//! use codec_types::TypeRef;
//!
//! let routine = GeneratedRoutine {
//!     name: "decode_empty_00000000".into(),
//!     kind: RoutineKind::Decode,
//!     owner: TypeRef::named("Empty"),
//!     params: vec![Param::reader()],
//!     body: vec![Instr::ReadNullAsAbsent, Instr::ReturnValue],
//! };
//! let bundle = CodecBundle::new("codecs", vec![routine]);
//!
//! assert_eq!(bundle.version, IR_SCHEMA_VERSION);
//! assert!(bundle.routine("decode_empty_00000000").is_some());
//! ```

use crate::model::classify::PrimitiveKind;
use codec_types::TypeRef;
use serde_derive::{Deserialize, Serialize};

/// Schema version used for every serialized IR export.
pub const IR_SCHEMA_VERSION: u32 = 1;

/// All routines produced by one generator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecBundle {
    /// IR schema version (mirrors `IR_SCHEMA_VERSION`).
    pub version: u32,
    /// Output namespace the routines belong to.
    pub namespace: String,
    pub routines: Vec<GeneratedRoutine>,
}

impl CodecBundle {
    pub fn new(namespace: impl Into<String>, routines: Vec<GeneratedRoutine>) -> Self {
        Self {
            version: IR_SCHEMA_VERSION,
            namespace: namespace.into(),
            routines,
        }
    }

    pub fn routine(&self, name: &str) -> Option<&GeneratedRoutine> {
        self.routines.iter().find(|routine| routine.name == name)
    }

    /// The type-keyed lookup routine, if the run produced one.
    pub fn dispatch(&self) -> Option<&GeneratedRoutine> {
        self.routines.iter().find(|routine| routine.kind == RoutineKind::Dispatch)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutineKind {
    Decode,
    Encode,
    DecodeList,
    EncodeList,
    DecodeMap,
    EncodeMap,
    Dispatch,
}

impl RoutineKind {
    pub fn is_decode(self) -> bool {
        matches!(self, RoutineKind::Decode | RoutineKind::DecodeList | RoutineKind::DecodeMap)
    }

    pub fn is_encode(self) -> bool {
        matches!(self, RoutineKind::Encode | RoutineKind::EncodeList | RoutineKind::EncodeMap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamRole {
    Reader,
    Writer,
    Value,
    TypeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub role: ParamRole,
    /// Declared type for value parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
}

impl Param {
    pub fn reader() -> Self {
        Self { name: "reader".into(), role: ParamRole::Reader, type_ref: None }
    }

    pub fn writer() -> Self {
        Self { name: "writer".into(), role: ParamRole::Writer, type_ref: None }
    }

    pub fn value(type_ref: TypeRef) -> Self {
        Self { name: "value".into(), role: ParamRole::Value, type_ref: Some(type_ref) }
    }

    pub fn type_id() -> Self {
        Self { name: "type_id".into(), role: ParamRole::TypeId, type_ref: None }
    }
}

/// A named routine and the type it serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRoutine {
    /// Unique within a bundle; derived from the owner's canonical name.
    pub name: String,
    pub kind: RoutineKind,
    pub owner: TypeRef,
    pub params: Vec<Param>,
    pub body: Vec<Instr>,
}

/// Token categories of the streaming JSON model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Name,
    String,
    Number,
    Boolean,
    Null,
    EndDocument,
}

/// How a single value is read or written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum Strategy {
    /// Read or written directly as a scalar token.
    Primitive { kind: PrimitiveKind },
    /// Delegated to a pair of generated routines.
    Routine { decode: String, encode: String },
    /// Delegated to the host's generic codec.
    External { type_ref: TypeRef },
}

impl Strategy {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Strategy::Primitive { .. })
    }
}

/// Initial value of an object slot before any key is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "default", rename_all = "kebab-case")]
pub enum DefaultValue {
    Zero { kind: PrimitiveKind },
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSlot {
    pub field: String,
    #[serde(flatten)]
    pub default: DefaultValue,
}

/// One accepted key of a decoded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCase {
    pub wire_name: String,
    /// Slot the decoded value is stored in.
    pub field: String,
    /// Token the value must start with; anything else is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<TokenKind>,
    pub strategy: Strategy,
    /// Failures inside this value are reported with the owning field.
    #[serde(default)]
    pub boundary: bool,
    /// The slot is declared through a type parameter; backends with static
    /// host types store it as optional even when the value is a scalar.
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Presence {
    /// Written even when unset (scalars with a zero value).
    Always,
    /// Omitted when unset.
    IfPresent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWrite {
    pub wire_name: String,
    pub field: String,
    pub strategy: Strategy,
    pub presence: Presence,
    #[serde(default)]
    pub optional: bool,
}

/// One entry of the dispatch table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchEntry {
    pub type_ref: TypeRef,
    pub decode: String,
    pub encode: String,
    /// False when the routines come from an earlier run or a dependency.
    #[serde(default)]
    pub generated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Instr {
    /* Decoding */
    /// A null token yields an absent value.
    ReadNullAsAbsent,
    /// Any token other than `token` is skipped and yields an absent value.
    SkipUnless { token: TokenKind },
    ReadBeginObject,
    ReadEndObject,
    ReadBeginArray,
    ReadEndArray,
    NewObject { type_ref: TypeRef, slots: Vec<FieldSlot> },
    NewList,
    NewMap,
    /// Reads keys until the end of the object. Unknown keys and null values
    /// are skipped.
    ReadFields { owner: String, cases: Vec<FieldCase> },
    ReadElements {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect: Option<TokenKind>,
        strategy: Strategy,
    },
    ReadEntries {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect: Option<TokenKind>,
        strategy: Strategy,
    },
    ReturnValue,

    /* Encoding */
    WriteBeginObject,
    /// Closes the object and returns when the value is absent.
    CloseObjectIfAbsent,
    /// Writes a null token and returns when the value is absent.
    WriteNullIfAbsent,
    WriteFields { fields: Vec<FieldWrite> },
    WriteEndObject,
    WriteBeginArray,
    WriteEndArray,
    WriteElements { strategy: Strategy },
    WriteEntries { strategy: Strategy },

    /* Lookup */
    /// Entries are sorted by canonical type name; anything else falls back
    /// to the generic codec.
    Dispatch { entries: Vec<DispatchEntry> },
}
