/* Generates the Rust codecs for the fixture declarations into OUT_DIR */

use anyhow::Context;
use codec_gen::codegen::{EmitBackend, RustBackend};
use codec_gen::manifest::KnownTypesManifest;
use codec_gen::{generate, HostInput};
use codec_loader::ImportResolver;
use std::path::{Path, PathBuf};

const DECLARATIONS: &str = "declarations/model.codec.yaml";

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed={}", DECLARATIONS);

    let mut resolver = ImportResolver::new(vec![PathBuf::from("declarations")]);
    resolver.load_file_with_imports(Path::new(DECLARATIONS))?;
    let input = HostInput::from_resolver(&resolver);
    let namespace = resolver.get_namespace().unwrap_or_else(|| "codecs".to_string());

    let generation = generate(&input.universe, &input.roots, &KnownTypesManifest::new(), &namespace)?;

    let mut backend = RustBackend::new();
    backend.begin(&namespace)?;
    for routine in &generation.routines {
        backend.emit_routine(routine)?;
    }

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").context("OUT_DIR is not set")?);
    for file in backend.finish()? {
        let path = out_dir.join(&file.relative_path);
        std::fs::write(&path, file.contents).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}
