use codec_gen::codegen::backend::IR_FILE_NAME;
use codec_gen::codegen::ir::{CodecBundle, Instr, RoutineKind};
use codec_gen::codegen::IrJsonBackend;
use codec_gen::manifest::resource_path;
use codec_gen::model::TypeUniverse;
use codec_gen::{CodecGenerator, GenError, GeneratorOptions, HostInput};
use codec_types::{FieldDecl, TypeDecl, TypeRef};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::TempDir;

fn field(name: &str, ty: &str) -> FieldDecl {
    FieldDecl::new(name, ty.parse().unwrap())
}

fn library_decls() -> Vec<TypeDecl> {
    vec![
        TypeDecl::class("lib.Pair")
            .with_params(&["A", "B"])
            .field(field("first", "A"))
            .field(field("second", "B")),
        TypeDecl::class("lib.Holder")
            .marked()
            .field(field("pairs", "List<lib.Pair<int, string>>"))
            .field(field("label", "string")),
    ]
}

fn options(dir: &Path) -> GeneratorOptions {
    GeneratorOptions {
        output_dir: dir.to_path_buf(),
        namespace: "lib.codecs".to_string(),
        classpath: vec![],
    }
}

fn read_manifest(dir: &Path, namespace: &str) -> String {
    std::fs::read_to_string(dir.join(resource_path(namespace))).unwrap()
}

#[test]
fn writes_routines_and_manifest_once() {
    let temp_dir = TempDir::new().unwrap();
    let input = HostInput::new(TypeUniverse::from_decls(library_decls()), vec![]);
    let mut generator = CodecGenerator::new(options(temp_dir.path()));

    let summary = generator.process(&input, &mut IrJsonBackend::new()).unwrap().unwrap();
    assert_eq!(
        summary.generated.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
        vec!["lib.Holder", "lib.Pair<int, string>"]
    );
    assert_eq!(read_manifest(temp_dir.path(), "lib.codecs"), "lib.Holder\nlib.Pair<int, string>\n");

    let ir_path = temp_dir.path().join("lib/codecs").join(IR_FILE_NAME);
    let bundle = CodecBundle::from_json(&std::fs::read_to_string(ir_path).unwrap()).unwrap();
    assert_eq!(bundle.namespace, "lib.codecs");
    assert!(bundle.dispatch().is_some());
    assert_eq!(bundle.routines.iter().filter(|r| r.kind == RoutineKind::DecodeList).count(), 1);

    /* A second request on the same generator does nothing */
    assert!(generator.has_processed());
    assert!(generator.process(&input, &mut IrJsonBackend::new()).unwrap().is_none());
}

#[test]
fn dependent_run_reuses_known_codecs() {
    let lib_store = TempDir::new().unwrap();
    let app_store = TempDir::new().unwrap();

    let lib_input = HostInput::new(TypeUniverse::from_decls(library_decls()), vec![]);
    CodecGenerator::new(options(lib_store.path()))
        .process(&lib_input, &mut IrJsonBackend::new())
        .unwrap();

    let mut universe = TypeUniverse::new();
    for decl in library_decls() {
        universe.add(decl, false);
    }
    universe.add(TypeDecl::class("app.Screen").marked().field(field("holder", "lib.Holder")), true);

    let mut app_options = options(app_store.path());
    app_options.classpath = vec![lib_store.path().to_path_buf()];
    let mut generator = CodecGenerator::new(app_options);
    let summary = generator
        .process(&HostInput::new(universe, vec![]), &mut IrJsonBackend::new())
        .unwrap()
        .unwrap();

    assert_eq!(summary.generated, vec![TypeRef::named("app.Screen")]);
    assert_eq!(summary.known, 2);

    let ir_path = app_store.path().join("lib/codecs").join(IR_FILE_NAME);
    let bundle = CodecBundle::from_json(&std::fs::read_to_string(ir_path).unwrap()).unwrap();
    let Some(Instr::Dispatch { entries }) = bundle.dispatch().map(|d| &d.body[0]) else {
        panic!("missing dispatch routine");
    };
    let listed: Vec<(String, bool)> = entries.iter().map(|e| (e.type_ref.to_string(), e.generated)).collect();
    assert_eq!(
        listed,
        vec![
            ("app.Screen".to_string(), true),
            ("lib.Holder".to_string(), false),
            ("lib.Pair<int, string>".to_string(), false),
        ]
    );

    /* The app manifest carries forward what the classpath contributed */
    assert_eq!(
        read_manifest(app_store.path(), "lib.codecs"),
        "lib.Holder\nlib.Pair<int, string>\napp.Screen\n"
    );
}

#[test]
fn stale_manifest_entries_are_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let manifest_path = temp_dir.path().join(resource_path("lib.codecs"));
    std::fs::create_dir_all(manifest_path.parent().unwrap()).unwrap();
    std::fs::write(&manifest_path, "lib.Removed\r\nlib.Holder\r\n").unwrap();

    let input = HostInput::new(TypeUniverse::from_decls(library_decls()), vec![]);
    let summary = CodecGenerator::new(options(temp_dir.path()))
        .process(&input, &mut IrJsonBackend::new())
        .unwrap()
        .unwrap();

    assert_eq!(summary.dropped_manifest_entries, vec!["lib.Removed".to_string()]);
    assert_eq!(read_manifest(temp_dir.path(), "lib.codecs"), "lib.Holder\nlib.Pair<int, string>\n");
}

#[test]
fn fatal_error_commits_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let mut frozen = field("id", "long");
    frozen.is_final = true;

    let mut decls = library_decls();
    decls.push(TypeDecl::class("lib.Frozen").marked().field(frozen));
    let input = HostInput::new(TypeUniverse::from_decls(decls), vec![]);

    let err = CodecGenerator::new(options(temp_dir.path()))
        .process(&input, &mut IrJsonBackend::new())
        .unwrap_err();
    assert!(matches!(err, GenError::UnsupportedField { .. }));
    assert!(!temp_dir.path().join("lib").exists());
}

#[test]
fn ambiguous_roots_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let input = HostInput::new(
        TypeUniverse::from_decls(library_decls()),
        vec!["lib.Pair<int>".parse().unwrap(), "lib.Pair<long, lib.Holder>".parse().unwrap()],
    );
    let summary = CodecGenerator::new(options(temp_dir.path()))
        .process(&input, &mut IrJsonBackend::new())
        .unwrap()
        .unwrap();

    let generated: Vec<String> = summary.generated.iter().map(|t| t.to_string()).collect();
    assert!(generated.contains(&"lib.Pair<long, lib.Holder>".to_string()));
    assert!(!generated.iter().any(|t| t == "lib.Pair<int>"));
}
