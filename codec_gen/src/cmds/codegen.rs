/* Codegen command - generate codecs from declaration files */

use super::common::load_input;
use codec_gen::codegen::{EmitBackend, IrJsonBackend, RustBackend};
use codec_gen::pipeline::DEFAULT_NAMESPACE;
use codec_gen::{CodecGenerator, GeneratorOptions};
use std::path::PathBuf;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Format {
    Rust,
    Json,
}

/* Execute the codegen command */
pub fn run(
    files: Vec<PathBuf>,
    include_dirs: Vec<PathBuf>,
    format: Format,
    output_dir: PathBuf,
    namespace: Option<String>,
    classpath: Vec<PathBuf>,
    verbose: bool,
) -> anyhow::Result<()> {
    if verbose {
        println!("Codec Generator - Code Generation Tool");
        println!("======================================\n");
        println!("[~] Configuration:");
        println!("  Format: {:?}", format);
        println!("  Output directory: {}", output_dir.display());
        println!("  Input files: {}", files.len());
        for file in &files {
            println!("    - {}", file.display());
        }
        if !classpath.is_empty() {
            println!("  Classpath entries: {}", classpath.len());
            for dir in &classpath {
                println!("    - {}", dir.display());
            }
        }
        println!();
    }

    let loaded = load_input(&files, &include_dirs, verbose)?;

    /* Command line wins over the declaration files */
    let namespace = namespace.or(loaded.namespace).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    let options = GeneratorOptions { output_dir, namespace, classpath };

    let mut backend: Box<dyn EmitBackend> = match format {
        Format::Rust => Box::new(RustBackend::new()),
        Format::Json => Box::new(IrJsonBackend::new()),
    };

    let mut generator = CodecGenerator::new(options);
    let Some(summary) = generator.process(&loaded.input, backend.as_mut())? else {
        return Ok(());
    };

    if !summary.dropped_manifest_entries.is_empty() {
        println!("[~] Dropped {} stale known type(s):", summary.dropped_manifest_entries.len());
        for entry in &summary.dropped_manifest_entries {
            println!("    - {}", entry);
        }
    }

    println!(
        "[✓] Generated {} routine(s) for {} type(s) ({} already known)",
        summary.routines,
        summary.generated.len(),
        summary.known
    );
    if verbose {
        for type_ref in &summary.generated {
            println!("  - {}", type_ref);
        }
        println!("[~] Files written:");
        for file in &summary.files {
            println!("    - {}", file.display());
        }
    }

    Ok(())
}
