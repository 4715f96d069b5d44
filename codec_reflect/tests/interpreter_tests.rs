use codec_gen::codegen::ir::CodecBundle;
use codec_gen::generate;
use codec_gen::manifest::KnownTypesManifest;
use codec_gen::model::TypeUniverse;
use codec_reflect::{CodecInterpreter, PassthroughCodec, ReflectError, StrictCodec, Value};
use codec_types::{FieldDecl, TypeDecl, TypeRef};
use serde_json::json;

fn field(name: &str, ty: &str) -> FieldDecl {
    FieldDecl::new(name, ty.parse().unwrap())
}

fn ty(text: &str) -> TypeRef {
    text.parse().unwrap()
}

fn decls() -> Vec<TypeDecl> {
    vec![
        TypeDecl::class("Pair")
            .with_params(&["T", "K"])
            .field(field("first", "T"))
            .field(field("second", "K")),
        TypeDecl::class("Holder")
            .marked()
            .field(field("pairs", "List<Pair<int, string>>"))
            .field(field("label", "string"))
            .field(field("counts", "Map<string, long>"))
            .field(field("when", "java.time.Instant")),
        TypeDecl::class("Base").with_params(&["X"]).field(field("value", "X")),
        TypeDecl::class("Leaf")
            .marked()
            .extends(ty("Base<string>"))
            .field(field("name", "string")),
    ]
}

fn bundle() -> CodecBundle {
    let universe = TypeUniverse::from_decls(decls());
    generate(&universe, &[ty("Pair<int, string>")], &KnownTypesManifest::new(), "test")
        .unwrap()
        .into_bundle("test")
}

fn pair(first: i32, second: &str) -> Value {
    Value::object(ty("Pair<int, string>"))
        .with_field("first", Value::Int(first))
        .with_field("second", Value::text(second))
}

#[test]
fn decodes_generic_instantiation() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);

    let value = interpreter.decode_str(&ty("Pair<int, string>"), r#"{"first":1,"second":"x"}"#).unwrap();
    assert_eq!(value, pair(1, "x"));
}

#[test]
fn unknown_keys_are_ignored() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);

    let plain = interpreter.decode_str(&ty("Pair<int, string>"), r#"{"first":1,"second":"x"}"#).unwrap();
    let ghost = interpreter
        .decode_str(&ty("Pair<int, string>"), r#"{"first":1,"ghost":{"deep":[true]},"second":"x"}"#)
        .unwrap();
    assert_eq!(plain, ghost);
}

#[test]
fn list_field_preserves_order() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);

    let value = interpreter
        .decode_str(&ty("Holder"), r#"{"pairs":[{"first":1,"second":"a"},{"first":2,"second":"b"}]}"#)
        .unwrap();
    assert_eq!(value.field("pairs"), Some(&Value::List(vec![pair(1, "a"), pair(2, "b")])));
}

#[test]
fn primitive_objects_round_trip() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);
    let input = json!({"first": 7, "second": "seven"});

    let value = interpreter.decode_str(&ty("Pair<int, string>"), &input.to_string()).unwrap();
    assert_eq!(interpreter.encode_to_json(&ty("Pair<int, string>"), &value).unwrap(), input);
}

#[test]
fn mismatched_tokens_leave_defaults() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);

    let value = interpreter
        .decode_str(&ty("Pair<int, string>"), r#"{"first":"one","second":null}"#)
        .unwrap();
    assert_eq!(value.field("first"), Some(&Value::Int(0)));
    assert_eq!(value.field("second"), Some(&Value::Absent));
}

#[test]
fn null_and_non_object_documents_are_absent() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);

    assert_eq!(interpreter.decode_str(&ty("Holder"), "null").unwrap(), Value::Absent);
    assert_eq!(interpreter.decode_str(&ty("Holder"), "[1, 2]").unwrap(), Value::Absent);
}

#[test]
fn absent_object_encodes_as_empty_object() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);

    assert_eq!(interpreter.encode_to_json(&ty("Holder"), &Value::Absent).unwrap(), json!({}));
}

#[test]
fn absent_composites_are_omitted() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);

    let holder = Value::object(ty("Holder")).with_field("label", Value::text("l"));
    assert_eq!(interpreter.encode_to_json(&ty("Holder"), &holder).unwrap(), json!({"label": "l"}));

    /* Unset scalars are still written */
    let empty_pair = Value::object(ty("Pair<int, string>"));
    assert_eq!(interpreter.encode_to_json(&ty("Pair<int, string>"), &empty_pair).unwrap(), json!({"first": 0}));
}

#[test]
fn nested_failure_names_owner_and_field() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);

    let err = interpreter
        .decode_str(&ty("Holder"), r#"{"pairs":[{"first":99999999999}]}"#)
        .unwrap_err();
    match err {
        ReflectError::DecodeFailure { owner, field, source } => {
            assert_eq!(owner, "Holder");
            assert_eq!(field, "pairs");
            assert!(matches!(*source, ReflectError::NumberFormat { .. }));
        }
        other => panic!("expected decode failure, got {other:?}"),
    }
}

#[test]
fn external_fields_use_the_generic_codec() {
    let bundle = bundle();
    let passthrough = CodecInterpreter::new(&[&bundle], &PassthroughCodec);
    let input = json!({"when": {"epoch": 12}, "counts": {"a": 1, "b": 2}});

    let value = passthrough.decode_str(&ty("Holder"), &input.to_string()).unwrap();
    assert_eq!(value.field("when"), Some(&Value::Raw(json!({"epoch": 12}))));
    assert_eq!(passthrough.encode_to_json(&ty("Holder"), &value).unwrap(), input);

    let strict = CodecInterpreter::new(&[&bundle], &StrictCodec);
    let err = strict.decode_str(&ty("Holder"), &input.to_string()).unwrap_err();
    assert!(matches!(err, ReflectError::DecodeFailure { ref field, .. } if field == "when"));
}

#[test]
fn inherited_generic_fields_are_substituted() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);

    let value = interpreter.decode_str(&ty("Leaf"), r#"{"value":"v","name":"n"}"#).unwrap();
    assert_eq!(value.field("value"), Some(&Value::text("v")));
    assert_eq!(value.field("name"), Some(&Value::text("n")));
}

#[test]
fn unlisted_types_fall_back() {
    let bundle = bundle();
    let interpreter = CodecInterpreter::new(&[&bundle], &PassthroughCodec);

    assert!(!interpreter.supports(&ty("Other")));
    let value = interpreter.decode_str(&ty("Other"), r#"{"any": 1}"#).unwrap();
    assert_eq!(value, Value::Raw(json!({"any": 1})));
}

#[test]
fn known_types_resolve_across_bundles() {
    let library = bundle();

    let mut universe = TypeUniverse::new();
    for decl in decls() {
        universe.add(decl, false);
    }
    universe.add(TypeDecl::class("Screen").marked().field(field("leaf", "Leaf")), true);
    let known = KnownTypesManifest::parse("Leaf\nHolder\nPair<int, string>\n");
    let app = generate(&universe, &[], &known, "app").unwrap().into_bundle("app");
    assert!(app.routines.iter().all(|r| !r.name.starts_with("decode_leaf_")));

    let interpreter = CodecInterpreter::new(&[&app, &library], &PassthroughCodec);
    let value = interpreter.decode_str(&ty("Screen"), r#"{"leaf":{"name":"n"}}"#).unwrap();
    assert_eq!(value.field("leaf").and_then(|leaf| leaf.field("name")), Some(&Value::text("n")));
}
