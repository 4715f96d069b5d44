use codec_loader::ImportResolver;
use codec_types::TypeRef;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

const COMMON: &str = r#"
codec:
  package: com.example.common
types:
  - name: Paging
    fields:
      - { name: next, type: string }
"#;

const MODEL: &str = r#"
codec:
  package: com.example.model
  imports:
    - type: path
      path: common.codec.yaml
  roots:
    - "Page<User>"
  options:
    namespace: com.example.generated
types:
  - name: Page
    type-params: [T]
    fields:
      - { name: paging, type: Paging }
      - { name: data, type: "List<T>" }
  - name: User
    marked: true
    fields:
      - { name: id, type: long }
"#;

#[test]
fn loads_imports_and_qualifies_references() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "common.codec.yaml", COMMON);
    let model = write_file(temp_dir.path(), "model.codec.yaml", MODEL);

    let mut resolver = ImportResolver::new(vec![]);
    resolver.load_file_with_imports(&model).unwrap();
    assert_eq!(resolver.loaded_file_count(), 2);

    let types = resolver.get_all_types();
    let names: Vec<&str> = types.iter().map(|t| t.decl.name.as_str()).collect();
    assert_eq!(names, vec!["com.example.common.Paging", "com.example.model.Page", "com.example.model.User"]);

    // Imported declarations belong to a dependency, not to this compilation unit
    assert!(!types[0].local);
    assert!(types[1].local && types[2].local);

    let page = &types[1].decl;
    assert_eq!(page.fields[0].field_type, TypeRef::named("com.example.common.Paging"));
    assert_eq!(page.fields[1].field_type, TypeRef::generic("List", vec![TypeRef::var("T")]));

    assert_eq!(resolver.get_roots(), vec!["com.example.model.Page<com.example.model.User>".parse::<TypeRef>().unwrap()]);
    assert_eq!(resolver.get_namespace().as_deref(), Some("com.example.generated"));
}

#[test]
fn imports_resolve_through_include_dirs() {
    let lib_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    write_file(lib_dir.path(), "common.codec.yaml", COMMON);
    let model = write_file(src_dir.path(), "model.codec.yaml", MODEL);

    let mut resolver = ImportResolver::new(vec![lib_dir.path().to_path_buf()]);
    resolver.load_file_with_imports(&model).unwrap();
    assert_eq!(resolver.get_all_types().len(), 3);
}

#[test]
fn missing_import_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let model = write_file(temp_dir.path(), "model.codec.yaml", MODEL);

    let mut resolver = ImportResolver::new(vec![]);
    let err = resolver.load_file_with_imports(&model).unwrap_err();
    assert!(err.to_string().contains("common.codec.yaml"));
}

#[test]
fn circular_imports_load_each_file_once() {
    let temp_dir = TempDir::new().unwrap();
    let a = write_file(
        temp_dir.path(),
        "a.codec.yaml",
        "codec:\n  package: a\n  imports:\n    - { type: path, path: b.codec.yaml }\ntypes:\n  - name: A\n",
    );
    write_file(
        temp_dir.path(),
        "b.codec.yaml",
        "codec:\n  package: b\n  imports:\n    - { type: path, path: a.codec.yaml }\ntypes:\n  - name: B\n",
    );

    let mut resolver = ImportResolver::new(vec![]);
    resolver.load_file_with_imports(&a).unwrap();
    assert_eq!(resolver.loaded_file_count(), 2);
    assert_eq!(resolver.get_all_types().len(), 2);
}

#[test]
fn directly_requested_import_counts_as_local() {
    let temp_dir = TempDir::new().unwrap();
    let common = write_file(temp_dir.path(), "common.codec.yaml", COMMON);
    let model = write_file(temp_dir.path(), "model.codec.yaml", MODEL);

    let mut resolver = ImportResolver::new(vec![]);
    resolver.load_file_with_imports(&model).unwrap();
    resolver.load_file_with_imports(&common).unwrap();

    assert!(resolver.get_all_types().iter().all(|t| t.local));
}
