/* Analyze command - report discovered types and their resolved members */

use super::common::load_input;
use codec_gen::manifest::KnownTypesManifest;
use codec_gen::pipeline::DEFAULT_NAMESPACE;
use codec_gen::{generate, Generation};
use anyhow::Context;
use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub enum IrOutputFormat {
    Json,
    Yaml,
}

/* Execute the analyze command */
pub fn run(files: Vec<PathBuf>, include_dirs: Vec<PathBuf>, print_ir: bool, ir_format: IrOutputFormat) -> anyhow::Result<()> {
    println!("Codec Generator - Type Analysis Tool");
    println!("====================================\n");

    let loaded = load_input(&files, &include_dirs, true)?;
    let namespace = loaded.namespace.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

    /* Analysis never reads or writes an output store */
    let generation = generate(&loaded.input.universe, &loaded.input.roots, &KnownTypesManifest::new(), &namespace)
        .context("codec discovery failed")?;

    print_registry(&generation);

    if print_ir {
        let bundle = generation.into_bundle(&namespace);
        let rendered = match ir_format {
            IrOutputFormat::Json => bundle.to_json().context("failed to serialize IR as JSON")?,
            IrOutputFormat::Yaml => serde_yml::to_string(&bundle).context("failed to serialize IR as YAML")?,
        };
        println!("\n[~] Codec IR ({:?}):", ir_format);
        println!("{}", rendered);
    }

    Ok(())
}

fn print_registry(generation: &Generation) {
    let types = generation.registry.all_concrete();
    println!("[~] Supported types ({}):", types.len());
    for annotated in types {
        println!("  - {} ({:?})", annotated.type_ref, annotated.origin);
        for field in &annotated.fields {
            let binding = if field.binding != field.declared_name { format!(" as {}", field.binding) } else { String::new() };
            println!("      {} -> \"{}\": {} [from {}]{}", field.declared_name, field.wire_name, field.field_type, field.owner, binding);
        }
    }
    println!("[~] {} routine(s) synthesized", generation.routines.len());
}
