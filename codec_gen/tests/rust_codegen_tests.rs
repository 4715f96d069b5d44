/* Rust backend tests
 *
 * These tests check the shape of the generated Rust source for objects,
 * shared list helpers, external fields and the dispatch table.
 */

use codec_gen::codegen::{EmitBackend, RustBackend};
use codec_gen::manifest::KnownTypesManifest;
use codec_gen::model::TypeUniverse;
use codec_gen::generate;
use codec_types::{FieldDecl, TypeDecl};

fn field(name: &str, ty: &str) -> FieldDecl {
    FieldDecl::new(name, ty.parse().unwrap())
}

fn emit(decls: Vec<TypeDecl>) -> String {
    let universe = TypeUniverse::from_decls(decls);
    let generation = generate(&universe, &[], &KnownTypesManifest::new(), "app").unwrap();

    let mut backend = RustBackend::new();
    backend.begin("app").unwrap();
    for routine in &generation.routines {
        backend.emit_routine(routine).unwrap();
    }
    let files = backend.finish().unwrap();
    assert_eq!(files.len(), 1);
    files[0].contents.clone()
}

fn sample() -> Vec<TypeDecl> {
    vec![
        TypeDecl::class("app.Pair")
            .with_params(&["A", "B"])
            .field(field("first", "A"))
            .field(field("second", "B")),
        TypeDecl::class("app.Holder")
            .marked()
            .field(field("pairs", "List<app.Pair<int, string>>"))
            .field(field("type", "string").with_wire_name("kind"))
            .field(field("count", "int"))
            .field(field("created", "java.time.Instant")),
    ]
}

#[test]
fn emits_object_decoder() {
    let source = emit(sample());

    assert!(source.contains("use codec_reflect::stream::{JsonReader, JsonWriter};"));
    assert!(source.contains("-> Result<Option<Pair<i32, String>>, CodecError>"));
    assert!(source.contains("let mut object = <Holder>::default();"));
    assert!(source.contains("\"first\" if token == TokenKind::Number => {\n        object.first = Some(reader.next_int()?);"));
    assert!(source.contains("\"count\" if token == TokenKind::Number => {\n        object.count = reader.next_int()?;"));
    assert!(source.contains("\"kind\" if token == TokenKind::String => {\n        object.r#type = Some(reader.next_string()?);"));
    assert!(source.contains("CodecError::decode_failure(\"app.Holder\", \"pairs\", err)"));
    assert!(source.contains("object.created = fallback::read_from_adapter(reader).map_err("));
    assert!(source.contains("_ => reader.skip_value()?,"));
}

#[test]
fn emits_object_encoder() {
    let source = emit(sample());

    assert!(source.contains("value: Option<&Holder>) -> Result<(), CodecError>"));
    assert!(source.contains("let Some(object) = value else {\n    return writer.end_object();\n  };"));
    assert!(source.contains("writer.name(\"first\")?;\n  writer.int_value(object.first.unwrap_or_default())?;"));
    assert!(source.contains("writer.name(\"count\")?;\n  writer.int_value(object.count)?;"));
    assert!(source.contains("if let Some(field) = object.created.as_ref() {\n    writer.name(\"created\")?;\n    fallback::write_to_adapter(writer, field)?;"));
}

#[test]
fn emits_one_list_helper_pair() {
    let mut decls = sample();
    decls.push(
        TypeDecl::class("app.Other")
            .marked()
            .field(field("more", "ArrayList<app.Pair<int, string>>")),
    );
    let source = emit(decls);

    assert_eq!(source.matches("pub fn decode_list_pair_int_string_").count(), 1);
    assert_eq!(source.matches("pub fn encode_list_pair_int_string_").count(), 1);
    assert!(source.contains("-> Result<Option<Vec<Option<Pair<i32, String>>>>, CodecError>"));
}

#[test]
fn emits_dispatch_table() {
    let source = emit(sample());

    assert!(source.contains("pub const SUPPORTED_TYPES: &[&str] = &[\n  \"app.Holder\",\n  \"app.Pair<int, string>\",\n];"));
    assert!(source.contains("impl Codec for Pair<i32, String> {"));
    assert!(source.contains("const TYPE_ID: &'static str = \"app.Holder\";"));
    assert!(source.contains(
        "pub fn lookup_codec(type_id: &str) -> CodecEntry {\n  match type_id {\n    \"app.Holder\" => CodecEntry::of::<Holder>(),\n    \"app.Pair<int, string>\" => CodecEntry::of::<Pair<i32, String>>(),\n    _ => CodecEntry::fallback(),\n  }\n}"
    ));
}

#[test]
fn generic_slots_share_one_shape_across_instantiations() {
    let decls = vec![TypeDecl::class("app.Boxed").with_params(&["T"]).field(field("item", "T"))];
    let universe = TypeUniverse::from_decls(decls);
    let roots = vec!["app.Boxed<int>".parse().unwrap(), "app.Boxed<string>".parse().unwrap()];
    let generation = generate(&universe, &roots, &KnownTypesManifest::new(), "app").unwrap();
    let mut backend = RustBackend::new();
    backend.begin("app").unwrap();
    for routine in &generation.routines {
        backend.emit_routine(routine).unwrap();
    }
    let source = backend.finish().unwrap().remove(0).contents;

    assert!(source.contains("object.item = Some(reader.next_int()?);"));
    assert!(source.contains("object.item = Some(reader.next_string()?);"));
    assert!(source.contains("writer.int_value(object.item.unwrap_or_default())?;"));
    assert!(source.contains("if let Some(field) = object.item.as_ref() {\n    writer.name(\"item\")?;\n    writer.string_value(field)?;"));
}

#[test]
fn reserved_field_names_are_mangled() {
    let source = emit(vec![TypeDecl::class("app.Node")
        .marked()
        .field(field("self", "int"))
        .field(field("type", "int"))]);

    assert!(source.contains("object.self_ = reader.next_int()?;"));
    assert!(source.contains("object.r#type = reader.next_int()?;"));
    assert!(!source.contains("r#self"));
}
