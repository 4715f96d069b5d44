/* Common utilities shared between analyze and codegen commands */

use codec_gen::HostInput;
use codec_loader::ImportResolver;
use std::path::PathBuf;

pub struct LoadedInput {
    pub input: HostInput,
    /* Namespace requested by a local declaration file, if any */
    pub namespace: Option<String>,
}

/* Load declaration files with their imports and build the generator input */
pub fn load_input(files: &[PathBuf], include_dirs: &[PathBuf], verbose: bool) -> anyhow::Result<LoadedInput> {
    let mut resolver = ImportResolver::new(include_dirs.to_vec());

    if verbose {
        println!("[~] Loading declaration files and resolving imports...");
        if !include_dirs.is_empty() {
            println!("    Include directories:");
            for dir in include_dirs {
                println!("      - {}", dir.display());
            }
        }
    }

    for file in files {
        resolver.load_file_with_imports(file)?;
    }

    let input = HostInput::from_resolver(&resolver);

    if verbose {
        println!("[~] Loaded {} file(s) total (including imports)", resolver.loaded_file_count());
        println!("[~] {} declaration(s), {} root(s)", input.universe.len(), input.roots.len());
        for decl in input.universe.decls() {
            let local = if input.universe.is_local(&decl.name) { "" } else { " (dependency)" };
            let marked = if decl.marked { " [marked]" } else { "" };
            println!("  - {}{}{}", decl.name, marked, local);
        }
        println!();
    }

    Ok(LoadedInput { input, namespace: resolver.get_namespace() })
}
