use codec_types::{TypeDecl, TypeRef};
use serde_derive::{Deserialize, Serialize};

/* ============================================================================
   Import Source Types
   ============================================================================ */

/* Where an imported declaration file comes from */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ImportSource {
    /* Local file path import */
    Path {
        /* Relative or absolute path to the declaration file */
        path: String,
    },
}

impl ImportSource {
    /* Get the path for path imports */
    pub fn path(&self) -> &str {
        match self {
            ImportSource::Path { path } => path,
        }
    }
}

/* Generation options carried by a declaration file */
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CodecOptions {
    /* Namespace the generated codecs (and the known-types manifest) live in */
    #[serde(default)]
    pub namespace: Option<String>,
}

/* Metadata for a declaration file */
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct CodecMetadata {
    /* Package prefix applied to the unqualified type names declared in this file */
    pub package: String,

    /* File description */
    #[serde(default)]
    pub description: Option<String>,

    /* List of imported declaration sources */
    #[serde(default)]
    pub imports: Vec<ImportSource>,

    /* Concrete instantiations to start discovery from, in addition to marked types */
    #[serde(default)]
    pub roots: Vec<TypeRef>,

    /* Optional configuration options */
    #[serde(default)]
    pub options: CodecOptions,
}

/* Complete declaration file with metadata and type declarations */
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct DeclFile {
    /* File metadata */
    pub codec: CodecMetadata,

    /* Type declarations */
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

impl DeclFile {
    /* Get the package identifier */
    pub fn package(&self) -> &str {
        &self.codec.package
    }

    /* Get the imports */
    pub fn imports(&self) -> &[ImportSource] {
        &self.codec.imports
    }

    /* Get the explicit discovery roots */
    pub fn roots(&self) -> &[TypeRef] {
        &self.codec.roots
    }

    /* Get the options */
    pub fn options(&self) -> &CodecOptions {
        &self.codec.options
    }

    /* Fully-qualified name for a type declared in this file */
    pub fn qualify(&self, name: &str) -> String {
        if name.contains('.') || self.codec.package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.codec.package, name)
        }
    }
}
