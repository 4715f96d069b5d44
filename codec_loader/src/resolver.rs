use codec_types::{TypeDecl, TypeRef};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::file::DeclFile;

/* A type declaration together with where it came from */
#[derive(Debug, Clone)]
pub struct LoadedDecl {
    pub decl: TypeDecl,
    /* True for declarations of the current compilation unit, false for imports */
    pub local: bool,
}

/* Import resolver for loading and merging imported declaration files */
pub struct ImportResolver {
    /* Track loaded files to detect circular imports */
    loaded_files: HashSet<PathBuf>,

    /* Files that were requested directly rather than through an import */
    local_files: HashSet<PathBuf>,

    /* Include directories for searching imports */
    include_dirs: Vec<PathBuf>,

    /* All collected declarations, qualified, keyed by the file that declared them */
    all_types: Vec<(PathBuf, TypeDecl)>,

    /* All loaded declaration files */
    all_files: Vec<(PathBuf, DeclFile)>,

    /* Map from simple type name to the qualified names declaring it */
    simple_names: HashMap<String, Vec<String>>,
}

impl ImportResolver {
    /* Create a new import resolver with the given include directories */
    pub fn new(include_dirs: Vec<PathBuf>) -> Self {
        Self {
            loaded_files: HashSet::new(),
            local_files: HashSet::new(),
            include_dirs,
            all_types: Vec::new(),
            all_files: Vec::new(),
            simple_names: HashMap::new(),
        }
    }

    /* Resolve an import path relative to a base file or include directories */
    fn resolve_import_path(&self, import_path: &str, base_file: &Path) -> anyhow::Result<PathBuf> {
        /* First try relative to the base file's directory */
        if let Some(parent) = base_file.parent() {
            let relative_path = parent.join(import_path);
            if relative_path.exists() {
                return Ok(relative_path.canonicalize()?);
            }
        }

        /* Then try each include directory */
        for include_dir in &self.include_dirs {
            let include_path = include_dir.join(import_path);
            if include_path.exists() {
                return Ok(include_path.canonicalize()?);
            }
        }

        anyhow::bail!(
            "Import '{}' not found relative to '{}' or in include directories",
            import_path,
            base_file.display()
        )
    }

    /* Load a declaration file of the current compilation unit and recursively load its imports */
    pub fn load_file_with_imports(&mut self, file_path: &Path) -> anyhow::Result<()> {
        let canonical_path = file_path.canonicalize()?;
        self.local_files.insert(canonical_path);
        self.load_file_internal(file_path)
    }

    fn load_file_internal(&mut self, file_path: &Path) -> anyhow::Result<()> {
        /* Canonicalize the path to detect duplicates */
        let canonical_path = file_path.canonicalize()?;

        /* Skip if already loaded */
        if self.loaded_files.contains(&canonical_path) {
            debug!("skipping already loaded file: {}", file_path.display());
            return Ok(());
        }

        /* Mark as loaded before processing imports to detect circular dependencies */
        self.loaded_files.insert(canonical_path.clone());

        debug!("loading declaration file: {}", file_path.display());

        /* Read and parse the declaration file */
        let file = std::fs::File::open(file_path)?;
        let contents = std::io::read_to_string(file)?;
        let decl_file: DeclFile = serde_yml::from_str(&contents)
            .map_err(|err| anyhow::anyhow!("Failed to parse '{}': {}", file_path.display(), err))?;

        debug!(package = decl_file.package(), imports = decl_file.imports().len(), "parsed declaration file");

        /* Recursively load imports */
        for import in decl_file.imports().to_vec() {
            let import_path = self.resolve_import_path(import.path(), file_path)?;
            self.load_file_internal(&import_path)?;
        }

        let own_names = own_names(&decl_file);
        for decl in &decl_file.types {
            let qualified = self.qualify_decl(decl, &decl_file, &own_names);
            self.simple_names
                .entry(simple_name(&qualified.name).to_string())
                .or_default()
                .push(qualified.name.clone());
            self.all_types.push((canonical_path.clone(), qualified));
        }

        self.all_files.push((canonical_path, decl_file));

        Ok(())
    }

    /* Qualify the declaration name and every reference it makes */
    fn qualify_decl(&self, decl: &TypeDecl, file: &DeclFile, own_names: &HashMap<String, String>) -> TypeDecl {
        let rename = |name: &str| self.qualify_reference(name, own_names);
        /* Parameters become variables first so they are never qualified */
        let mut qualified = decl.clone().normalize();
        qualified.name = file.qualify(&decl.name);
        qualified.extends = qualified.extends.map(|parent| parent.map_names(&rename));
        for field in &mut qualified.fields {
            field.field_type = field.field_type.map_names(&rename);
        }
        qualified
    }

    /* Same-file declarations win, then an unambiguous match among imported files */
    fn qualify_reference(&self, name: &str, own_names: &HashMap<String, String>) -> Option<String> {
        if name.contains('.') {
            return None;
        }
        if let Some(qualified) = own_names.get(name) {
            return Some(qualified.clone());
        }
        match self.simple_names.get(name) {
            Some(candidates) if candidates.len() == 1 => Some(candidates[0].clone()),
            _ => None,
        }
    }

    /* Get all collected declarations, flagged local or external */
    pub fn get_all_types(&self) -> Vec<LoadedDecl> {
        self.all_types
            .iter()
            .map(|(path, decl)| LoadedDecl { decl: decl.clone(), local: self.local_files.contains(path) })
            .collect()
    }

    /* Explicit discovery roots of the local files, qualified like their declarations */
    pub fn get_roots(&self) -> Vec<TypeRef> {
        let mut roots = Vec::new();
        for (_, file) in self.all_files.iter().filter(|(path, _)| self.local_files.contains(path)) {
            let own_names = own_names(file);
            let rename = |name: &str| self.qualify_reference(name, &own_names);
            for root in file.roots() {
                let root = root.map_names(&rename);
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }
        roots
    }

    /* Namespace option of the local files, falling back to the imported ones */
    pub fn get_namespace(&self) -> Option<String> {
        let (local, imported): (Vec<_>, Vec<_>) =
            self.all_files.iter().partition(|(path, _)| self.local_files.contains(path));
        local
            .into_iter()
            .chain(imported)
            .find_map(|(_, file)| file.options().namespace.clone())
    }

    /* Get all loaded declaration files */
    pub fn get_all_files(&self) -> impl Iterator<Item = &DeclFile> {
        self.all_files.iter().map(|(_, file)| file)
    }

    /* Get the number of loaded files */
    pub fn loaded_file_count(&self) -> usize {
        self.loaded_files.len()
    }
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/* Names declared by a file, simple -> qualified */
fn own_names(file: &DeclFile) -> HashMap<String, String> {
    file.types
        .iter()
        .map(|decl| (simple_name(&decl.name).to_string(), file.qualify(&decl.name)))
        .collect()
}
