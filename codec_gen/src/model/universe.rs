use crate::model::classify::is_builtin_name;
use codec_types::{DeclKind, TypeDecl, TypeRef};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone)]
struct UniverseEntry {
    decl: TypeDecl,
    local: bool,
}

/// Every declaration visible to a generator run, keyed by qualified name.
///
/// Local declarations belong to the compilation unit being processed; the
/// rest come from dependencies and may already have codecs of their own.
#[derive(Debug, Clone, Default)]
pub struct TypeUniverse {
    decls: BTreeMap<String, UniverseEntry>,
}

impl TypeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a universe in which every declaration is local.
    pub fn from_decls(decls: impl IntoIterator<Item = TypeDecl>) -> Self {
        let mut universe = Self::new();
        for decl in decls {
            universe.add(decl, true);
        }
        universe
    }

    /// Adds a declaration. Type parameters are bound before storing, so
    /// callers may pass declarations straight from YAML.
    ///
    /// A local declaration replaces an external one of the same name;
    /// otherwise the first declaration wins.
    pub fn add(&mut self, decl: TypeDecl, local: bool) {
        let decl = decl.normalize();
        match self.decls.get(&decl.name) {
            Some(existing) if existing.local || !local => {
                warn!("Duplicate declaration of '{}' ignored", decl.name);
            }
            _ => {
                self.decls.insert(decl.name.clone(), UniverseEntry { decl, local });
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.decls.get(name).map(|entry| &entry.decl)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.decls.get(name).is_some_and(|entry| entry.local)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Declarations in name order.
    pub fn decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.values().map(|entry| &entry.decl)
    }

    /// Marked class declarations in name order.
    pub fn marked(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls().filter(|decl| decl.marked && decl.kind == DeclKind::Class)
    }

    /// True when every name in `type_ref` is a builtin or a declaration.
    pub fn resolves(&self, type_ref: &TypeRef) -> bool {
        if type_ref.has_free_vars() {
            return false;
        }
        let mut resolved = true;
        type_ref.for_each_name(&mut |name| {
            if !is_builtin_name(name) && !self.contains(name) {
                resolved = false;
            }
        });
        resolved
    }
}
