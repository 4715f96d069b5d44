/* Known-types manifest: the plain-text resource that lets later runs and
dependent compilation units reuse codecs generated earlier */

use crate::model::universe::TypeUniverse;
use codec_types::TypeRef;
use indexmap::IndexSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const MANIFEST_RESOURCE: &str = "codec_types.list";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read known-types manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write known-types manifest '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the manifest lives: the run's own output store plus any read-only
/// stores contributed by dependencies.
#[derive(Debug, Clone)]
pub struct ManifestLocation {
    pub own: PathBuf,
    pub classpath: Vec<PathBuf>,
}

impl ManifestLocation {
    pub fn new(output_dir: &Path, namespace: &str, classpath_dirs: &[PathBuf]) -> Self {
        let relative = resource_path(namespace);
        Self {
            own: output_dir.join(&relative),
            classpath: classpath_dirs.iter().map(|dir| dir.join(&relative)).collect(),
        }
    }
}

/// `com.example.codecs` -> `com/example/codecs/codec_types.list`
pub fn resource_path(namespace: &str) -> PathBuf {
    let mut path = PathBuf::new();
    for segment in namespace.split('.').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.push(MANIFEST_RESOURCE);
    path
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownTypesManifest {
    entries: IndexSet<String>,
}

impl KnownTypesManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries are separated by any run of line breaks; blank entries are dropped.
    pub fn parse(content: &str) -> Self {
        let mut manifest = Self::new();
        manifest.extend_from_str(content);
        manifest
    }

    pub fn extend_from_str(&mut self, content: &str) {
        for entry in content.split(['\n', '\r']) {
            let entry = entry.trim();
            if !entry.is_empty() {
                self.entries.insert(entry.to_string());
            }
        }
    }

    /// Reads the own store and every classpath store that exists.
    pub fn load(location: &ManifestLocation) -> Result<Self, ManifestError> {
        let mut manifest = Self::new();
        for path in std::iter::once(&location.own).chain(location.classpath.iter()) {
            if let Some(content) = read_if_present(path)? {
                debug!("Loaded known-types manifest {}", path.display());
                manifest.extend_from_str(&content);
            }
        }
        Ok(manifest)
    }

    pub fn insert(&mut self, entry: impl Into<String>) -> bool {
        self.entries.insert(entry.into())
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.contains(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Drops entries that no longer parse or name undeclared types and
    /// returns them.
    pub fn retain_resolvable(&mut self, universe: &TypeUniverse) -> Vec<String> {
        let mut dropped = Vec::new();
        self.entries.retain(|entry| {
            let keep = entry.parse::<TypeRef>().is_ok_and(|type_ref| universe.resolves(&type_ref));
            if !keep {
                warn!("Dropping stale known type '{}'", entry);
                dropped.push(entry.clone());
            }
            keep
        });
        dropped
    }

    pub fn type_refs(&self) -> Vec<TypeRef> {
        self.entries.iter().filter_map(|entry| entry.parse().ok()).collect()
    }

    /// One entry per line, each followed by a newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(entry);
            out.push('\n');
        }
        out
    }
}

fn read_if_present(path: &Path) -> Result<Option<String>, ManifestError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ManifestError::Read { path: path.to_path_buf(), source }),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|source| ManifestError::Read { path: path.to_path_buf(), source })?;
    Ok(Some(content))
}
