/* Generic codec used for every type without a generated routine */

use crate::errors::{ReflectError, ReflectResult};
use crate::stream::{JsonReader, JsonWriter};
use crate::value::Value;
use codec_gen::codegen::ir::TokenKind;
use codec_types::TypeRef;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Reads and writes values the generator left to the host.
pub trait GenericCodec {
    fn read_from_adapter(&self, type_ref: &TypeRef, reader: &mut JsonReader) -> ReflectResult<Value>;

    fn write_to_adapter(&self, type_ref: &TypeRef, value: &Value, writer: &mut JsonWriter) -> ReflectResult<()>;
}

/// Keeps unknown values as raw JSON trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCodec;

impl GenericCodec for PassthroughCodec {
    fn read_from_adapter(&self, _type_ref: &TypeRef, reader: &mut JsonReader) -> ReflectResult<Value> {
        if reader.peek() == TokenKind::Null {
            reader.next_null()?;
            return Ok(Value::Absent);
        }
        Ok(Value::Raw(reader.read_json()?))
    }

    fn write_to_adapter(&self, _type_ref: &TypeRef, value: &Value, writer: &mut JsonWriter) -> ReflectResult<()> {
        match value {
            Value::Absent => writer.null_value(),
            Value::Raw(json) => writer.json_value(json),
            other => writer.json_value(&other.to_json()),
        }
    }
}

/// Rejects every value; for hosts that require full generated coverage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictCodec;

impl GenericCodec for StrictCodec {
    fn read_from_adapter(&self, type_ref: &TypeRef, _reader: &mut JsonReader) -> ReflectResult<Value> {
        Err(ReflectError::Unsupported { type_name: type_ref.to_string() })
    }

    fn write_to_adapter(&self, type_ref: &TypeRef, _value: &Value, _writer: &mut JsonWriter) -> ReflectResult<()> {
        Err(ReflectError::Unsupported { type_name: type_ref.to_string() })
    }
}

/// Serde-backed fallback used by generated Rust code.
pub fn read_from_adapter<T: DeserializeOwned>(reader: &mut JsonReader) -> ReflectResult<Option<T>> {
    if reader.peek() == TokenKind::Null {
        reader.next_null()?;
        return Ok(None);
    }
    reader.deserialize_next().map(Some)
}

pub fn write_to_adapter<T: Serialize>(writer: &mut JsonWriter, value: &T) -> ReflectResult<()> {
    writer.serialize(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Color {
        Red,
        Green,
    }

    #[test]
    fn serde_fallback_round_trip() {
        let mut reader = JsonReader::parse(r#"["green", null]"#).unwrap();
        reader.begin_array().unwrap();
        assert_eq!(read_from_adapter::<Color>(&mut reader).unwrap(), Some(Color::Green));
        assert_eq!(read_from_adapter::<Color>(&mut reader).unwrap(), None);

        let mut writer = JsonWriter::new();
        write_to_adapter(&mut writer, &Color::Red).unwrap();
        assert_eq!(writer.into_string().unwrap(), "\"red\"");
    }

    #[test]
    fn passthrough_keeps_raw_json() {
        let mut reader = JsonReader::parse(r#"{"when": "2024-01-01"}"#).unwrap();
        let value = PassthroughCodec.read_from_adapter(&TypeRef::named("Instant"), &mut reader).unwrap();
        assert_eq!(value, Value::Raw(serde_json::json!({"when": "2024-01-01"})));
    }
}
