use crate::errors::{ReflectError, ReflectResult};
use crate::fallback::GenericCodec;
use crate::stream::{JsonReader, JsonWriter};
use crate::value::{ObjectValue, Value};
use codec_gen::codegen::ir::{
    CodecBundle, DefaultValue, DispatchEntry, FieldCase, GeneratedRoutine, Instr, Presence, Strategy, TokenKind,
};
use codec_gen::model::PrimitiveKind;
use codec_types::TypeRef;
use indexmap::IndexMap;
use std::collections::BTreeMap;

static ABSENT: Value = Value::Absent;

/// Executes generated routines against the token stream.
///
/// Several bundles can be loaded at once, which is how codecs from earlier
/// runs and dependencies are reached. Types missing from every dispatch
/// table go to the generic codec.
pub struct CodecInterpreter<'a> {
    routines: BTreeMap<&'a str, &'a GeneratedRoutine>,
    dispatch: BTreeMap<String, &'a DispatchEntry>,
    fallback: &'a dyn GenericCodec,
}

impl<'a> CodecInterpreter<'a> {
    pub fn new(bundles: &[&'a CodecBundle], fallback: &'a dyn GenericCodec) -> Self {
        let mut routines = BTreeMap::new();
        let mut dispatch: BTreeMap<String, &'a DispatchEntry> = BTreeMap::new();

        for bundle in bundles {
            for routine in &bundle.routines {
                routines.entry(routine.name.as_str()).or_insert(routine);
                if let Some(Instr::Dispatch { entries }) = routine.body.first() {
                    for entry in entries {
                        let key = entry.type_ref.to_string();
                        /* Generated entries win over ones only known by name */
                        let replace = match dispatch.get(&key) {
                            None => true,
                            Some(existing) => !existing.generated && entry.generated,
                        };
                        if replace {
                            dispatch.insert(key, entry);
                        }
                    }
                }
            }
        }

        Self { routines, dispatch, fallback }
    }

    pub fn supports(&self, type_ref: &TypeRef) -> bool {
        self.dispatch.contains_key(&type_ref.to_string())
    }

    /// Canonical names of every type in the merged dispatch tables, sorted.
    pub fn supported_types(&self) -> impl Iterator<Item = &str> {
        self.dispatch.keys().map(String::as_str)
    }

    pub fn decode(&self, type_ref: &TypeRef, reader: &mut JsonReader) -> ReflectResult<Value> {
        match self.dispatch.get(&type_ref.to_string()) {
            Some(entry) => self.decode_with(&entry.decode, reader),
            None => self.fallback.read_from_adapter(type_ref, reader),
        }
    }

    pub fn decode_str(&self, type_ref: &TypeRef, json: &str) -> ReflectResult<Value> {
        let mut reader = JsonReader::parse(json)?;
        self.decode(type_ref, &mut reader)
    }

    pub fn encode(&self, type_ref: &TypeRef, value: &Value, writer: &mut JsonWriter) -> ReflectResult<()> {
        match self.dispatch.get(&type_ref.to_string()) {
            Some(entry) => self.encode_with(&entry.encode, value, writer),
            None => self.fallback.write_to_adapter(type_ref, value, writer),
        }
    }

    pub fn encode_to_json(&self, type_ref: &TypeRef, value: &Value) -> ReflectResult<serde_json::Value> {
        let mut writer = JsonWriter::new();
        self.encode(type_ref, value, &mut writer)?;
        writer.into_json()
    }

    pub fn decode_with(&self, name: &str, reader: &mut JsonReader) -> ReflectResult<Value> {
        let routine = self.lookup(name)?;
        if !routine.kind.is_decode() {
            return Err(ReflectError::WrongRoutineKind { name: name.to_string(), expected: "decode" });
        }
        self.run_decode(routine, reader)
    }

    pub fn encode_with(&self, name: &str, value: &Value, writer: &mut JsonWriter) -> ReflectResult<()> {
        let routine = self.lookup(name)?;
        if !routine.kind.is_encode() {
            return Err(ReflectError::WrongRoutineKind { name: name.to_string(), expected: "encode" });
        }
        self.run_encode(routine, value, writer)
    }

    fn lookup(&self, name: &str) -> ReflectResult<&'a GeneratedRoutine> {
        self.routines
            .get(name)
            .copied()
            .ok_or_else(|| ReflectError::UnknownRoutine { name: name.to_string() })
    }

    fn run_decode(&self, routine: &GeneratedRoutine, reader: &mut JsonReader) -> ReflectResult<Value> {
        let mut current = Value::Absent;

        for instr in &routine.body {
            match instr {
                Instr::ReadNullAsAbsent => {
                    if reader.peek() == TokenKind::Null {
                        reader.next_null()?;
                        return Ok(Value::Absent);
                    }
                }
                Instr::SkipUnless { token } => {
                    if reader.peek() != *token {
                        reader.skip_value()?;
                        return Ok(Value::Absent);
                    }
                }
                Instr::ReadBeginObject => reader.begin_object()?,
                Instr::ReadEndObject => reader.end_object()?,
                Instr::ReadBeginArray => reader.begin_array()?,
                Instr::ReadEndArray => reader.end_array()?,
                Instr::NewObject { type_ref, slots } => {
                    let mut object = ObjectValue::new(type_ref.clone());
                    for slot in slots {
                        let initial = match slot.default {
                            DefaultValue::Zero { kind } => Value::zero(kind),
                            DefaultValue::Absent => Value::Absent,
                        };
                        object.fields.insert(slot.field.clone(), initial);
                    }
                    current = Value::Object(object);
                }
                Instr::NewList => current = Value::List(Vec::new()),
                Instr::NewMap => current = Value::Map(IndexMap::new()),
                Instr::ReadFields { owner, cases } => {
                    let Value::Object(object) = &mut current else {
                        return Err(invalid(routine, instr));
                    };
                    self.read_fields(owner, cases, object, reader)?;
                }
                Instr::ReadElements { expect, strategy } => {
                    let Value::List(items) = &mut current else {
                        return Err(invalid(routine, instr));
                    };
                    while reader.has_next() {
                        if skip_mismatch(*expect, reader)? {
                            continue;
                        }
                        items.push(self.read_value(strategy, reader)?);
                    }
                }
                Instr::ReadEntries { expect, strategy } => {
                    let Value::Map(entries) = &mut current else {
                        return Err(invalid(routine, instr));
                    };
                    while reader.has_next() {
                        let key = reader.next_name()?;
                        if skip_mismatch(*expect, reader)? {
                            continue;
                        }
                        entries.insert(key, self.read_value(strategy, reader)?);
                    }
                }
                Instr::ReturnValue => return Ok(current),
                _ => return Err(invalid(routine, instr)),
            }
        }
        Ok(current)
    }

    fn read_fields(
        &self,
        owner: &str,
        cases: &[FieldCase],
        object: &mut ObjectValue,
        reader: &mut JsonReader,
    ) -> ReflectResult<()> {
        while reader.has_next() {
            let name = reader.next_name()?;
            let token = reader.peek();
            if token == TokenKind::Null {
                reader.skip_value()?;
                continue;
            }
            let Some(case) = cases.iter().find(|case| case.wire_name == name) else {
                reader.skip_value()?;
                continue;
            };
            if case.expect.is_some_and(|expected| expected != token) {
                reader.skip_value()?;
                continue;
            }

            let value = self.read_value(&case.strategy, reader);
            let value = if case.boundary {
                value.map_err(|err| ReflectError::decode_failure(owner, &case.field, err))?
            } else {
                value?
            };
            object.fields.insert(case.field.clone(), value);
        }
        Ok(())
    }

    fn read_value(&self, strategy: &Strategy, reader: &mut JsonReader) -> ReflectResult<Value> {
        match strategy {
            Strategy::Primitive { kind } => Ok(match kind {
                PrimitiveKind::Int => Value::Int(reader.next_int()?),
                PrimitiveKind::Long => Value::Long(reader.next_long()?),
                PrimitiveKind::Float => Value::Float(reader.next_float()?),
                PrimitiveKind::Double => Value::Double(reader.next_double()?),
                PrimitiveKind::Boolean => Value::Bool(reader.next_bool()?),
                PrimitiveKind::Text => Value::Text(reader.next_string()?),
            }),
            Strategy::Routine { decode, .. } => self.decode_with(decode, reader),
            Strategy::External { type_ref } => self.fallback.read_from_adapter(type_ref, reader),
        }
    }

    fn run_encode(&self, routine: &GeneratedRoutine, value: &Value, writer: &mut JsonWriter) -> ReflectResult<()> {
        for instr in &routine.body {
            match instr {
                Instr::WriteBeginObject => writer.begin_object()?,
                Instr::WriteEndObject => writer.end_object()?,
                Instr::WriteBeginArray => writer.begin_array()?,
                Instr::WriteEndArray => writer.end_array()?,
                Instr::CloseObjectIfAbsent => {
                    if value.is_absent() {
                        return writer.end_object();
                    }
                }
                Instr::WriteNullIfAbsent => {
                    if value.is_absent() {
                        return writer.null_value();
                    }
                }
                Instr::WriteFields { fields } => {
                    let object = value.as_object().ok_or_else(|| mismatch("object", value))?;
                    for field in fields {
                        let slot = object.fields.get(&field.field).unwrap_or(&ABSENT);
                        if field.presence == Presence::IfPresent && slot.is_absent() {
                            continue;
                        }
                        writer.name(&field.wire_name)?;
                        self.write_value(&field.strategy, slot, writer)?;
                    }
                }
                Instr::WriteElements { strategy } => {
                    let items = value.as_list().ok_or_else(|| mismatch("list", value))?;
                    for item in items {
                        self.write_value(strategy, item, writer)?;
                    }
                }
                Instr::WriteEntries { strategy } => {
                    let Value::Map(entries) = value else {
                        return Err(mismatch("map", value));
                    };
                    for (key, item) in entries {
                        writer.name(key)?;
                        self.write_value(strategy, item, writer)?;
                    }
                }
                _ => return Err(invalid(routine, instr)),
            }
        }
        Ok(())
    }

    fn write_value(&self, strategy: &Strategy, value: &Value, writer: &mut JsonWriter) -> ReflectResult<()> {
        match strategy {
            Strategy::Primitive { kind } => write_primitive(*kind, value, writer),
            Strategy::Routine { encode, .. } => self.encode_with(encode, value, writer),
            Strategy::External { type_ref } => self.fallback.write_to_adapter(type_ref, value, writer),
        }
    }
}

/* Unset scalars are written as their zero value */
fn write_primitive(kind: PrimitiveKind, value: &Value, writer: &mut JsonWriter) -> ReflectResult<()> {
    let zero;
    let value = if value.is_absent() {
        zero = Value::zero(kind);
        &zero
    } else {
        value
    };
    match (kind, value) {
        (PrimitiveKind::Text, Value::Absent) => writer.null_value(),
        (PrimitiveKind::Text, Value::Text(text)) => writer.string_value(text),
        (PrimitiveKind::Boolean, Value::Bool(b)) => writer.bool_value(*b),
        (PrimitiveKind::Int, v) => {
            let int = v.as_i64().and_then(|i| i32::try_from(i).ok()).ok_or_else(|| mismatch("int", v))?;
            writer.int_value(int)
        }
        (PrimitiveKind::Long, v) => writer.long_value(v.as_i64().ok_or_else(|| mismatch("long", v))?),
        (PrimitiveKind::Float, v) => writer.float_value(v.as_f64().ok_or_else(|| mismatch("float", v))? as f32),
        (PrimitiveKind::Double, v) => writer.double_value(v.as_f64().ok_or_else(|| mismatch("double", v))?),
        (PrimitiveKind::Text, v) => Err(mismatch("string", v)),
        (PrimitiveKind::Boolean, v) => Err(mismatch("boolean", v)),
    }
}

/* Skips the next value when it does not start with the expected token */
fn skip_mismatch(expect: Option<TokenKind>, reader: &mut JsonReader) -> ReflectResult<bool> {
    match expect {
        Some(token) if reader.peek() != token => {
            reader.skip_value()?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn mismatch(expected: &'static str, value: &Value) -> ReflectError {
    ReflectError::ValueMismatch { expected, found: value.describe() }
}

fn invalid(routine: &GeneratedRoutine, instr: &Instr) -> ReflectError {
    ReflectError::InvalidInstruction { routine: routine.name.clone(), op: format!("{:?}", instr) }
}
