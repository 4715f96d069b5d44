//! One generator run: discovery, synthesis, emission and commit.

use crate::codegen::backend::EmitBackend;
use crate::codegen::dispatch::build_dispatch;
use crate::codegen::ir::{CodecBundle, GeneratedRoutine};
use crate::codegen::synth::CodecSynthesizer;
use crate::error::GenError;
use crate::manifest::{KnownTypesManifest, ManifestError, ManifestLocation};
use crate::model::registry::{discover, SupportedTypeRegistry};
use crate::model::universe::TypeUniverse;
use codec_loader::ImportResolver;
use codec_types::TypeRef;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const DEFAULT_NAMESPACE: &str = "codecs";

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Root of the output store; files land under the namespace path.
    pub output_dir: PathBuf,
    pub namespace: String,
    /// Output stores of dependencies, searched for their manifests.
    pub classpath: Vec<PathBuf>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated"),
            namespace: DEFAULT_NAMESPACE.to_string(),
            classpath: Vec::new(),
        }
    }
}

impl GeneratorOptions {
    pub fn namespace_dir(&self) -> PathBuf {
        let mut dir = self.output_dir.clone();
        for segment in self.namespace.split('.').filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        dir
    }

    pub fn manifest_location(&self) -> ManifestLocation {
        ManifestLocation::new(&self.output_dir, &self.namespace, &self.classpath)
    }
}

/// What the host hands the generator: declarations plus explicit roots.
#[derive(Debug, Clone, Default)]
pub struct HostInput {
    pub universe: TypeUniverse,
    pub roots: Vec<TypeRef>,
}

impl HostInput {
    pub fn new(universe: TypeUniverse, roots: Vec<TypeRef>) -> Self {
        Self { universe, roots }
    }

    /// Builds the input from loaded declaration files.
    pub fn from_resolver(resolver: &ImportResolver) -> Self {
        let mut universe = TypeUniverse::new();
        for loaded in resolver.get_all_types() {
            universe.add(loaded.decl, loaded.local);
        }
        Self { universe, roots: resolver.get_roots() }
    }
}

/// In-memory result of discovery and synthesis.
#[derive(Debug, Clone)]
pub struct Generation {
    pub registry: SupportedTypeRegistry,
    /// Type routines, then helpers, then the dispatch routine.
    pub routines: Vec<GeneratedRoutine>,
}

impl Generation {
    pub fn into_bundle(self, namespace: &str) -> CodecBundle {
        CodecBundle::new(namespace, self.routines)
    }
}

/// Discovers supported types and synthesizes every routine without touching
/// the filesystem. Types listed in `known` are treated as already supported.
pub fn generate(
    universe: &TypeUniverse,
    roots: &[TypeRef],
    known: &KnownTypesManifest,
    namespace: &str,
) -> Result<Generation, GenError> {
    let mut registry = SupportedTypeRegistry::new();
    for type_ref in known.type_refs() {
        registry.register_known(type_ref);
    }

    discover(universe, roots, &mut registry)?;

    let mut routines = CodecSynthesizer::new(universe, &registry).synthesize_all();
    routines.push(build_dispatch(namespace, &registry));
    Ok(Generation { registry, routines })
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub generated: Vec<TypeRef>,
    pub known: usize,
    pub routines: usize,
    pub files: Vec<PathBuf>,
    pub dropped_manifest_entries: Vec<String>,
}

/// Runs the full pipeline at most once per instance.
pub struct CodecGenerator {
    options: GeneratorOptions,
    processed: bool,
}

impl CodecGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options, processed: false }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn has_processed(&self) -> bool {
        self.processed
    }

    /// Returns `Ok(None)` when this generator has already run.
    ///
    /// Generated files and the updated manifest are staged next to their
    /// destinations and only moved into place once everything succeeded.
    pub fn process(&mut self, input: &HostInput, backend: &mut dyn EmitBackend) -> Result<Option<RunSummary>, GenError> {
        if self.processed {
            debug!("Generator already ran; ignoring repeated request");
            return Ok(None);
        }
        self.processed = true;

        let location = self.options.manifest_location();
        let mut manifest = KnownTypesManifest::load(&location)?;
        let dropped = manifest.retain_resolvable(&input.universe);

        let generation = generate(&input.universe, &input.roots, &manifest, &self.options.namespace)?;

        backend.begin(&self.options.namespace)?;
        for routine in &generation.routines {
            backend.emit_routine(routine)?;
        }
        let emitted = backend.finish()?;

        let generated: Vec<TypeRef> = generation
            .registry
            .all_concrete()
            .iter()
            .map(|annotated| annotated.type_ref.clone())
            .collect();
        for type_ref in &generated {
            manifest.insert(type_ref.to_string());
        }

        let namespace_dir = self.options.namespace_dir();
        let mut transaction = OutputTransaction::default();
        for file in &emitted {
            let path = namespace_dir.join(&file.relative_path);
            transaction
                .stage(&path, &file.contents)
                .map_err(|source| GenError::Output { path: path.clone(), source })?;
        }
        transaction
            .stage(&location.own, &manifest.render())
            .map_err(|source| ManifestError::Write { path: location.own.clone(), source })?;

        let files = transaction.commit().map_err(|(path, source)| {
            if path == location.own {
                GenError::Manifest(ManifestError::Write { path, source })
            } else {
                GenError::Output { path, source }
            }
        })?;

        info!(
            "Generated codecs for {} type(s) into {}",
            generated.len(),
            namespace_dir.display()
        );

        Ok(Some(RunSummary {
            known: generation.registry.known_types().len(),
            routines: generation.routines.len(),
            generated,
            files,
            dropped_manifest_entries: dropped,
        }))
    }
}

/* Temporary files written beside their targets. Dropping an uncommitted
transaction deletes them. */
#[derive(Default)]
struct OutputTransaction {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl OutputTransaction {
    fn stage(&mut self, path: &Path, contents: &str) -> std::io::Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(contents.as_bytes())?;
        temp.flush()?;
        self.staged.push((temp, path.to_path_buf()));
        Ok(())
    }

    /* The manifest is staged last, so it is also moved into place last */
    fn commit(self) -> Result<Vec<PathBuf>, (PathBuf, std::io::Error)> {
        let mut committed = Vec::with_capacity(self.staged.len());
        for (temp, path) in self.staged {
            temp.persist(&path).map_err(|err| (path.clone(), err.error))?;
            committed.push(path);
        }
        Ok(committed)
    }
}
