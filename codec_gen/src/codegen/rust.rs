/* Rust source backend.

Lowers each routine instruction by instruction into a function over the
codec_reflect token stream. Host types are expected in the parent module and
must implement Default. Storage shapes follow the declared field type, never
the instantiation, so one generic host struct serves every instantiation:
- a field declared with a scalar type (int, long, float, double, boolean)
  is stored bare;
- a field declared through a type parameter, and every other field, is
  stored as Option;
- list elements and map values are always Option. */

use super::backend::{EmitBackend, EmitError, EmittedFile};
use super::dispatch::DISPATCH_ROUTINE;
use super::ir::*;
use crate::model::classify::{is_collection_name, is_map_name, PrimitiveKind};
use codec_types::TypeRef;
use std::path::PathBuf;

pub const RUST_FILE_NAME: &str = "codecs.rs";

const RUST_KEYWORDS: &[&str] = &[
  "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
  "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async", "await", "dyn",
  "abstract", "become", "box", "do", "final", "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
];

/* Keywords that cannot be raw identifiers; the host field carries a trailing underscore */
const RESERVED_PATH_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

#[derive(Debug, Default)]
pub struct RustBackend {
  namespace: String,
  functions: String,
  dispatch: String,
  finished: bool,
}

impl RustBackend {
  pub fn new() -> Self {
    Self::default()
  }
}

impl EmitBackend for RustBackend {
  fn begin(&mut self, namespace: &str) -> Result<(), EmitError> {
    self.namespace = namespace.to_string();
    Ok(())
  }

  fn emit_routine(&mut self, routine: &GeneratedRoutine) -> Result<(), EmitError> {
    if self.finished {
      return Err(EmitError::Finished);
    }
    match routine.kind {
      RoutineKind::Dispatch => self.dispatch = emit_dispatch(routine)?,
      kind if kind.is_decode() => self.functions.push_str(&emit_decode(routine)?),
      _ => self.functions.push_str(&emit_encode(routine)?),
    }
    Ok(())
  }

  fn finish(&mut self) -> Result<Vec<EmittedFile>, EmitError> {
    self.finished = true;
    let mut output = String::new();
    output.push_str(&format!("// Codecs for namespace `{}`. Generated by codec-gen; do not edit.\n\n", self.namespace));
    output.push_str("#[allow(unused_imports)]\n");
    output.push_str("use codec_reflect::stream::{JsonReader, JsonWriter};\n");
    output.push_str("#[allow(unused_imports)]\n");
    output.push_str("use codec_reflect::{fallback, Codec, CodecEntry, CodecError, IndexMap, TokenKind};\n");
    output.push_str("use super::*;\n\n");
    output.push_str(&self.functions);
    output.push_str(&self.dispatch);
    Ok(vec![EmittedFile { relative_path: PathBuf::from(RUST_FILE_NAME), contents: output }])
  }
}

/// Rust name of the host field bound to `name`.
pub fn field_ident(name: &str) -> String {
  if RESERVED_PATH_KEYWORDS.contains(&name) {
    format!("{}_", name)
  } else if RUST_KEYWORDS.contains(&name) {
    format!("r#{}", name)
  } else {
    name.to_string()
  }
}

fn quote(text: &str) -> String {
  format!("{:?}", text)
}

/* Rust type of a value of `type_ref` */
pub fn value_type(type_ref: &TypeRef) -> String {
  match type_ref {
    TypeRef::Var(name) => name.clone(),
    TypeRef::Named { name, args } => {
      if let (Some(kind), true) = (PrimitiveKind::from_name(name), args.is_empty()) {
        return primitive_type(kind).to_string();
      }
      match args.as_slice() {
        [element] if is_collection_name(name) => format!("Vec<{}>", element_type(element)),
        [_, value] if is_map_name(name) => format!("IndexMap<String, {}>", element_type(value)),
        [] => type_ref.simple_name().to_string(),
        _ => {
          let args: Vec<String> = args.iter().map(value_type).collect();
          format!("{}<{}>", type_ref.simple_name(), args.join(", "))
        }
      }
    }
  }
}

fn element_type(type_ref: &TypeRef) -> String {
  format!("Option<{}>", value_type(type_ref))
}

fn primitive_type(kind: PrimitiveKind) -> &'static str {
  match kind {
    PrimitiveKind::Int => "i32",
    PrimitiveKind::Long => "i64",
    PrimitiveKind::Float => "f32",
    PrimitiveKind::Double => "f64",
    PrimitiveKind::Boolean => "bool",
    PrimitiveKind::Text => "String",
  }
}

fn token_path(token: TokenKind) -> &'static str {
  match token {
    TokenKind::BeginObject => "TokenKind::BeginObject",
    TokenKind::EndObject => "TokenKind::EndObject",
    TokenKind::BeginArray => "TokenKind::BeginArray",
    TokenKind::EndArray => "TokenKind::EndArray",
    TokenKind::Name => "TokenKind::Name",
    TokenKind::String => "TokenKind::String",
    TokenKind::Number => "TokenKind::Number",
    TokenKind::Boolean => "TokenKind::Boolean",
    TokenKind::Null => "TokenKind::Null",
    TokenKind::EndDocument => "TokenKind::EndDocument",
  }
}

fn read_primitive(kind: PrimitiveKind) -> &'static str {
  match kind {
    PrimitiveKind::Int => "reader.next_int()?",
    PrimitiveKind::Long => "reader.next_long()?",
    PrimitiveKind::Float => "reader.next_float()?",
    PrimitiveKind::Double => "reader.next_double()?",
    PrimitiveKind::Boolean => "reader.next_bool()?",
    PrimitiveKind::Text => "reader.next_string()?",
  }
}

/* `value` names a reference to the scalar */
fn write_primitive(kind: PrimitiveKind, value: &str) -> String {
  match kind {
    PrimitiveKind::Text => format!("writer.string_value({})?;", value),
    _ => write_scalar(kind, &format!("*{}", value)),
  }
}

fn write_scalar(kind: PrimitiveKind, value: &str) -> String {
  match kind {
    PrimitiveKind::Int => format!("writer.int_value({})?;", value),
    PrimitiveKind::Long => format!("writer.long_value({})?;", value),
    PrimitiveKind::Float => format!("writer.float_value({})?;", value),
    PrimitiveKind::Double => format!("writer.double_value({})?;", value),
    PrimitiveKind::Boolean => format!("writer.bool_value({})?;", value),
    PrimitiveKind::Text => format!("writer.string_value(&{})?;", value),
  }
}

/* Expression reading one element as an Option */
fn read_element(strategy: &Strategy) -> String {
  match strategy {
    Strategy::Primitive { kind } => format!("Some({})", read_primitive(*kind)),
    Strategy::Routine { decode, .. } => format!("{}(reader)?", decode),
    Strategy::External { .. } => "fallback::read_from_adapter(reader)?".to_string(),
  }
}

/* Statement writing one element held as `&Option<_>` in `value`. Unset
scalars are written as zero, unset text as null. */
fn write_element(strategy: &Strategy, value: &str) -> String {
  match strategy {
    Strategy::Primitive { kind: PrimitiveKind::Text } => format!(
      "match {} {{\n      Some(text) => writer.string_value(text)?,\n      None => writer.null_value()?,\n    }}",
      value
    ),
    Strategy::Primitive { kind } => write_scalar(*kind, &format!("(*{}).unwrap_or_default()", value)),
    Strategy::Routine { encode, .. } => format!("{}(writer, {}.as_ref())?;", encode, value),
    Strategy::External { .. } => format!(
      "match {} {{\n        Some(item) => fallback::write_to_adapter(writer, item)?,\n        None => writer.null_value()?,\n      }}",
      value
    ),
  }
}

fn signature_type(routine: &GeneratedRoutine) -> String {
  value_type(&routine.owner)
}

fn emit_decode(routine: &GeneratedRoutine) -> Result<String, EmitError> {
  let mut out = String::new();
  let mut current = "value";
  out.push_str(&format!(
    "pub fn {}(reader: &mut JsonReader) -> Result<Option<{}>, CodecError> {{\n",
    routine.name,
    signature_type(routine)
  ));

  for instr in &routine.body {
    match instr {
      Instr::ReadNullAsAbsent => {
        out.push_str("  if reader.peek() == TokenKind::Null {\n    reader.next_null()?;\n    return Ok(None);\n  }\n");
      }
      Instr::SkipUnless { token } => {
        out.push_str(&format!(
          "  if reader.peek() != {} {{\n    reader.skip_value()?;\n    return Ok(None);\n  }}\n",
          token_path(*token)
        ));
      }
      Instr::ReadBeginObject => out.push_str("  reader.begin_object()?;\n"),
      Instr::ReadEndObject => out.push_str("  reader.end_object()?;\n"),
      Instr::ReadBeginArray => out.push_str("  reader.begin_array()?;\n"),
      Instr::ReadEndArray => out.push_str("  reader.end_array()?;\n"),
      Instr::NewObject { type_ref, slots } => {
        current = "object";
        let binding = if slots.is_empty() { "object" } else { "mut object" };
        out.push_str(&format!("  let {} = <{}>::default();\n", binding, value_type(type_ref)));
      }
      Instr::NewList => {
        current = "list";
        out.push_str("  let mut list = Vec::new();\n");
      }
      Instr::NewMap => {
        current = "map";
        out.push_str("  let mut map = IndexMap::new();\n");
      }
      Instr::ReadFields { owner, cases } => emit_read_fields(&mut out, owner, cases),
      Instr::ReadElements { expect, strategy } => {
        out.push_str("  while reader.has_next() {\n");
        emit_expect_guard(&mut out, *expect);
        out.push_str(&format!("    list.push({});\n", read_element(strategy)));
        out.push_str("  }\n");
      }
      Instr::ReadEntries { expect, strategy } => {
        out.push_str("  while reader.has_next() {\n    let key = reader.next_name()?;\n");
        emit_expect_guard(&mut out, *expect);
        out.push_str(&format!("    map.insert(key, {});\n", read_element(strategy)));
        out.push_str("  }\n");
      }
      Instr::ReturnValue => out.push_str(&format!("  Ok(Some({}))\n", current)),
      other => {
        return Err(EmitError::Unsupported {
          routine: routine.name.clone(),
          reason: format!("{:?} in a decode routine", other),
        });
      }
    }
  }

  out.push_str("}\n\n");
  Ok(out)
}

fn emit_expect_guard(out: &mut String, expect: Option<TokenKind>) {
  if let Some(token) = expect {
    out.push_str(&format!(
      "    if reader.peek() != {} {{\n      reader.skip_value()?;\n      continue;\n    }}\n",
      token_path(token)
    ));
  }
}

fn emit_read_fields(out: &mut String, owner: &str, cases: &[FieldCase]) {
  out.push_str("  while reader.has_next() {\n");
  out.push_str("    let name = reader.next_name()?;\n");
  out.push_str("    let token = reader.peek();\n");
  out.push_str("    if token == TokenKind::Null {\n      reader.skip_value()?;\n      continue;\n    }\n");
  out.push_str("    match name.as_str() {\n");

  for case in cases {
    let field = field_ident(&case.field);
    let guard = case.expect.map(|token| format!(" if token == {}", token_path(token))).unwrap_or_default();
    let read = match &case.strategy {
      Strategy::Primitive { kind: PrimitiveKind::Text } => "Some(reader.next_string()?)".to_string(),
      Strategy::Primitive { kind } if case.optional => format!("Some({})", read_primitive(*kind)),
      Strategy::Primitive { kind } => read_primitive(*kind).to_string(),
      Strategy::Routine { decode, .. } => format!("{}(reader)", decode),
      Strategy::External { .. } => "fallback::read_from_adapter(reader)".to_string(),
    };
    let read = if case.strategy.is_primitive() {
      read
    } else if case.boundary {
      format!(
        "{}.map_err(|err| CodecError::decode_failure({}, {}, err))?",
        read,
        quote(owner),
        quote(&case.field)
      )
    } else {
      format!("{}?", read)
    };
    out.push_str(&format!("      {}{} => {{\n        object.{} = {};\n      }}\n", quote(&case.wire_name), guard, field, read));
  }

  out.push_str("      _ => reader.skip_value()?,\n");
  out.push_str("    }\n  }\n");
}

fn emit_encode(routine: &GeneratedRoutine) -> Result<String, EmitError> {
  let mut out = String::new();
  let var = match routine.kind {
    RoutineKind::EncodeList => "list",
    RoutineKind::EncodeMap => "map",
    _ => "object",
  };
  out.push_str(&format!(
    "pub fn {}(writer: &mut JsonWriter, value: Option<&{}>) -> Result<(), CodecError> {{\n",
    routine.name,
    signature_type(routine)
  ));

  for instr in &routine.body {
    match instr {
      Instr::WriteBeginObject => out.push_str("  writer.begin_object()?;\n"),
      Instr::WriteEndObject => out.push_str("  writer.end_object()?;\n"),
      Instr::WriteBeginArray => out.push_str("  writer.begin_array()?;\n"),
      Instr::WriteEndArray => out.push_str("  writer.end_array()?;\n"),
      Instr::CloseObjectIfAbsent => {
        out.push_str(&format!("  let Some({}) = value else {{\n    return writer.end_object();\n  }};\n", var));
      }
      Instr::WriteNullIfAbsent => {
        out.push_str(&format!("  let Some({}) = value else {{\n    return writer.null_value();\n  }};\n", var));
      }
      Instr::WriteFields { fields } => {
        for field in fields {
          emit_write_field(&mut out, field);
        }
      }
      Instr::WriteElements { strategy } => {
        out.push_str("  for element in list {\n");
        out.push_str(&format!("    {}\n", write_element(strategy, "element")));
        out.push_str("  }\n");
      }
      Instr::WriteEntries { strategy } => {
        out.push_str("  for (key, element) in map {\n    writer.name(key)?;\n");
        out.push_str(&format!("    {}\n", write_element(strategy, "element")));
        out.push_str("  }\n");
      }
      other => {
        return Err(EmitError::Unsupported {
          routine: routine.name.clone(),
          reason: format!("{:?} in an encode routine", other),
        });
      }
    }
  }

  out.push_str("  Ok(())\n}\n\n");
  Ok(out)
}

fn emit_write_field(out: &mut String, field: &FieldWrite) {
  let slot = format!("object.{}", field_ident(&field.field));
  let name = quote(&field.wire_name);

  if field.presence == Presence::Always {
    if let Strategy::Primitive { kind } = &field.strategy {
      let value = if field.optional { format!("{}.unwrap_or_default()", slot) } else { slot };
      out.push_str(&format!("  writer.name({})?;\n  {}\n", name, write_scalar(*kind, &value)));
      return;
    }
  }

  let write = match &field.strategy {
    Strategy::Primitive { kind } => write_primitive(*kind, "field"),
    Strategy::Routine { encode, .. } => format!("{}(writer, Some(field))?;", encode),
    Strategy::External { .. } => "fallback::write_to_adapter(writer, field)?;".to_string(),
  };
  out.push_str(&format!(
    "  if let Some(field) = {}.as_ref() {{\n    writer.name({})?;\n    {}\n  }}\n",
    slot, name, write
  ));
}

fn emit_dispatch(routine: &GeneratedRoutine) -> Result<String, EmitError> {
  let entries = match routine.body.as_slice() {
    [Instr::Dispatch { entries }] => entries,
    _ => {
      return Err(EmitError::Unsupported {
        routine: routine.name.clone(),
        reason: "dispatch routine must hold a single dispatch instruction".into(),
      });
    }
  };

  let mut out = String::new();
  out.push_str("/// Every type with a codec, generated here or by an earlier run, sorted by name.\n");
  out.push_str("pub const SUPPORTED_TYPES: &[&str] = &[\n");
  for entry in entries {
    out.push_str(&format!("  {},\n", quote(&entry.type_ref.to_string())));
  }
  out.push_str("];\n\n");

  out.push_str("/// Codec for a canonical type name; anything unlisted goes through the generic fallback.\n");
  out.push_str(&format!("pub fn {}(type_id: &str) -> CodecEntry {{\n  match type_id {{\n", DISPATCH_ROUTINE));
  for entry in entries {
    out.push_str(&format!(
      "    {} => CodecEntry::of::<{}>(),\n",
      quote(&entry.type_ref.to_string()),
      value_type(&entry.type_ref)
    ));
  }
  out.push_str("    _ => CodecEntry::fallback(),\n  }\n}\n\n");

  for entry in entries.iter().filter(|entry| entry.generated) {
    let ty = value_type(&entry.type_ref);
    out.push_str(&format!("impl Codec for {} {{\n", ty));
    out.push_str(&format!("  const TYPE_ID: &'static str = {};\n\n", quote(&entry.type_ref.to_string())));
    out.push_str(&format!(
      "  fn decode(reader: &mut JsonReader) -> Result<Option<Self>, CodecError> {{\n    {}(reader)\n  }}\n\n",
      entry.decode
    ));
    out.push_str(&format!(
      "  fn encode(&self, writer: &mut JsonWriter) -> Result<(), CodecError> {{\n    {}(writer, Some(self))\n  }}\n",
      entry.encode
    ));
    out.push_str("}\n\n");
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_types_to_rust() {
    assert_eq!(value_type(&"List<a.Pair<int, string>>".parse().unwrap()), "Vec<Option<Pair<i32, String>>>");
    assert_eq!(value_type(&"Map<string, long>".parse().unwrap()), "IndexMap<String, Option<i64>>");
    assert_eq!(value_type(&"ArrayList<string>".parse().unwrap()), "Vec<Option<String>>");
    assert_eq!(value_type(&"a.Box<List<T>>".parse().unwrap()), "Box<Vec<Option<T>>>");
  }

  #[test]
  fn field_names_become_valid_identifiers() {
    assert_eq!(field_ident("type"), "r#type");
    assert_eq!(field_ident("name"), "name");
    for reserved in ["self", "Self", "super", "crate"] {
      assert_eq!(field_ident(reserved), format!("{}_", reserved));
    }
  }
}
