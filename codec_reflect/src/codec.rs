use crate::errors::{CodecError, ReflectError, ReflectResult};
use crate::fallback;
use crate::stream::{JsonReader, JsonWriter};
use serde_json::Value as Json;
use std::any::Any;

/// Implemented by generated code for every type with its own routines.
pub trait Codec: Sized {
    /// Canonical name of the concrete type.
    const TYPE_ID: &'static str;

    fn decode(reader: &mut JsonReader) -> Result<Option<Self>, CodecError>;

    fn encode(&self, writer: &mut JsonWriter) -> Result<(), CodecError>;
}

/// Decodes a document; null and non-object documents yield `None`.
pub fn from_json_str<T: Codec>(json: &str) -> ReflectResult<Option<T>> {
    let mut reader = JsonReader::parse(json)?;
    T::decode(&mut reader)
}

pub fn to_json_string<T: Codec>(value: &T) -> ReflectResult<String> {
    let mut writer = JsonWriter::new();
    value.encode(&mut writer)?;
    writer.into_string()
}

pub type DecodeFn = fn(&mut JsonReader) -> Result<Option<Box<dyn Any>>, CodecError>;
pub type EncodeFn = fn(&mut JsonWriter, &dyn Any) -> Result<(), CodecError>;

/// Type-erased routines returned by a generated `lookup_codec`.
#[derive(Clone, Copy)]
pub struct CodecEntry {
    pub decode: DecodeFn,
    pub encode: EncodeFn,
    /// False for the generic fallback, which carries values as raw JSON.
    pub generated: bool,
}

impl CodecEntry {
    pub fn of<T: Codec + 'static>() -> Self {
        Self { decode: decode_erased::<T>, encode: encode_erased::<T>, generated: true }
    }

    pub fn fallback() -> Self {
        Self { decode: decode_fallback, encode: encode_fallback, generated: false }
    }
}

fn decode_erased<T: Codec + 'static>(reader: &mut JsonReader) -> Result<Option<Box<dyn Any>>, CodecError> {
    Ok(T::decode(reader)?.map(|value| Box::new(value) as Box<dyn Any>))
}

fn encode_erased<T: Codec + 'static>(writer: &mut JsonWriter, value: &dyn Any) -> Result<(), CodecError> {
    match value.downcast_ref::<T>() {
        Some(value) => value.encode(writer),
        None => Err(ReflectError::ValueMismatch { expected: T::TYPE_ID, found: "a value of another type".into() }),
    }
}

fn decode_fallback(reader: &mut JsonReader) -> Result<Option<Box<dyn Any>>, CodecError> {
    Ok(fallback::read_from_adapter::<Json>(reader)?.map(|json| Box::new(json) as Box<dyn Any>))
}

fn encode_fallback(writer: &mut JsonWriter, value: &dyn Any) -> Result<(), CodecError> {
    match value.downcast_ref::<Json>() {
        Some(json) => fallback::write_to_adapter(writer, json),
        None => Err(ReflectError::ValueMismatch { expected: "JSON value", found: "a value of another type".into() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenKind;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        label: Option<String>,
    }

    impl Codec for Point {
        const TYPE_ID: &'static str = "Point";

        fn decode(reader: &mut JsonReader) -> Result<Option<Self>, CodecError> {
            if reader.peek() != TokenKind::BeginObject {
                reader.skip_value()?;
                return Ok(None);
            }
            reader.begin_object()?;
            let mut point = Point::default();
            while reader.has_next() {
                match reader.next_name()?.as_str() {
                    "x" => point.x = reader.next_int()?,
                    "label" => point.label = Some(reader.next_string()?),
                    _ => reader.skip_value()?,
                }
            }
            reader.end_object()?;
            Ok(Some(point))
        }

        fn encode(&self, writer: &mut JsonWriter) -> Result<(), CodecError> {
            writer.begin_object()?;
            writer.name("x")?;
            writer.int_value(self.x)?;
            if let Some(label) = &self.label {
                writer.name("label")?;
                writer.string_value(label)?;
            }
            writer.end_object()
        }
    }

    #[test]
    fn helpers_drive_codec_impls() {
        let point: Point = from_json_str(r#"{"x": 3, "extra": [1], "label": "p"}"#).unwrap().unwrap();
        assert_eq!(point, Point { x: 3, label: Some("p".into()) });
        assert_eq!(to_json_string(&point).unwrap(), r#"{"x":3,"label":"p"}"#);
        assert!(from_json_str::<Point>("17").unwrap().is_none());
    }

    #[test]
    fn erased_entries_round_trip_and_check_types() {
        let entry = CodecEntry::of::<Point>();
        assert!(entry.generated);

        let mut reader = JsonReader::parse(r#"{"x": 9}"#).unwrap();
        let decoded = (entry.decode)(&mut reader).unwrap().unwrap();
        assert_eq!(decoded.downcast_ref::<Point>(), Some(&Point { x: 9, label: None }));

        let mut writer = JsonWriter::new();
        (entry.encode)(&mut writer, decoded.as_ref()).unwrap();
        assert_eq!(writer.into_string().unwrap(), r#"{"x":9}"#);

        let mut writer = JsonWriter::new();
        assert!(matches!((entry.encode)(&mut writer, &17i32), Err(ReflectError::ValueMismatch { .. })));
    }
}
