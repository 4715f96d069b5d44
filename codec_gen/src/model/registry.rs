use crate::error::GenError;
use crate::model::classify::{Classifier, TypeClass};
use crate::model::members::{FieldDescriptor, MemberResolver};
use crate::model::universe::TypeUniverse;
use codec_types::{DeclKind, TypeRef};
use indexmap::IndexMap;
use serde_derive::Serialize;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeOrigin {
    /// Explicitly marked, or named as a root by the host.
    Marked,
    /// Discovered through a field of another supported type.
    Reached,
}

/// A concrete type this run generates codecs for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedType {
    pub type_ref: TypeRef,
    pub fields: Vec<FieldDescriptor>,
    pub origin: TypeOrigin,
}

#[derive(Debug, Clone, PartialEq)]
enum RegistryEntry {
    Generated(AnnotatedType),
    /// Supported by codecs from an earlier run or a dependency.
    Known,
}

/// Concrete types that have codecs, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct SupportedTypeRegistry {
    entries: IndexMap<TypeRef, RegistryEntry>,
}

impl SupportedTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a generated type. Returns false if it was already generated.
    pub fn register(&mut self, annotated: AnnotatedType) -> bool {
        if self.is_generated(&annotated.type_ref) {
            return false;
        }
        self.entries
            .insert(annotated.type_ref.clone(), RegistryEntry::Generated(annotated));
        true
    }

    /// Records a type whose codec already exists elsewhere.
    pub fn register_known(&mut self, type_ref: TypeRef) -> bool {
        if self.entries.contains_key(&type_ref) {
            return false;
        }
        self.entries.insert(type_ref, RegistryEntry::Known);
        true
    }

    pub fn contains(&self, type_ref: &TypeRef) -> bool {
        self.entries.contains_key(type_ref)
    }

    pub fn is_generated(&self, type_ref: &TypeRef) -> bool {
        matches!(self.entries.get(type_ref), Some(RegistryEntry::Generated(_)))
    }

    pub fn is_known(&self, type_ref: &TypeRef) -> bool {
        matches!(self.entries.get(type_ref), Some(RegistryEntry::Known))
    }

    pub fn get(&self, type_ref: &TypeRef) -> Option<&AnnotatedType> {
        match self.entries.get(type_ref) {
            Some(RegistryEntry::Generated(annotated)) => Some(annotated),
            _ => None,
        }
    }

    /// Generated types in the order they were registered.
    pub fn all_concrete(&self) -> Vec<&AnnotatedType> {
        self.entries
            .values()
            .filter_map(|entry| match entry {
                RegistryEntry::Generated(annotated) => Some(annotated),
                RegistryEntry::Known => None,
            })
            .collect()
    }

    /// Types supported by existing codecs and not regenerated by this run.
    pub fn known_types(&self) -> Vec<&TypeRef> {
        self.entries
            .iter()
            .filter(|(_, entry)| matches!(entry, RegistryEntry::Known))
            .map(|(type_ref, _)| type_ref)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Finds every concrete type reachable from the marked declarations and the
/// host roots, resolves its members and registers it.
///
/// Marked non-generic classes are seeded in name order, then the roots in the
/// order given. Field types are walked breadth-first, so the registry order
/// is deterministic for a given universe.
pub fn discover(
    universe: &TypeUniverse,
    roots: &[TypeRef],
    registry: &mut SupportedTypeRegistry,
) -> Result<(), GenError> {
    let mut discovery = Discovery {
        universe,
        classifier: Classifier::new(universe),
        resolver: MemberResolver::new(universe),
        queue: VecDeque::new(),
        seen: HashSet::new(),
    };

    for decl in universe.marked() {
        if decl.is_generic() {
            debug!("Skipping generic declaration {}: only its instantiations get codecs", decl.name);
            continue;
        }
        if decl.kind == DeclKind::Enum {
            debug!("Skipping enum {}: enums are written by name", decl.name);
            continue;
        }
        discovery.enqueue(decl.self_type(), TypeOrigin::Marked);
    }
    for root in roots {
        discovery.walk(root, TypeOrigin::Marked);
    }

    discovery.run(registry)
}

struct Discovery<'a> {
    universe: &'a TypeUniverse,
    classifier: Classifier<'a>,
    resolver: MemberResolver<'a>,
    queue: VecDeque<(TypeRef, TypeOrigin)>,
    seen: HashSet<TypeRef>,
}

impl<'a> Discovery<'a> {
    fn enqueue(&mut self, type_ref: TypeRef, origin: TypeOrigin) {
        if self.seen.insert(type_ref.clone()) {
            self.queue.push_back((type_ref, origin));
        }
    }

    fn walk(&mut self, type_ref: &TypeRef, origin: TypeOrigin) {
        match self.classifier.classify(type_ref) {
            TypeClass::Collection { element } => self.walk(element, origin),
            TypeClass::Map { key, value } => {
                self.walk(key, origin);
                self.walk(value, origin);
            }
            TypeClass::Declared { args, .. } => {
                if self.classifier.is_concrete(type_ref) {
                    self.enqueue(type_ref.clone(), origin);
                }
                for arg in args {
                    self.walk(arg, TypeOrigin::Reached);
                }
            }
            TypeClass::Opaque => {
                for arg in type_ref.args() {
                    self.walk(arg, TypeOrigin::Reached);
                }
            }
            TypeClass::Primitive(_) | TypeClass::Enumeration { .. } | TypeClass::Variable => {}
        }
    }

    fn run(&mut self, registry: &mut SupportedTypeRegistry) -> Result<(), GenError> {
        while let Some((type_ref, origin)) = self.queue.pop_front() {
            if registry.is_generated(&type_ref) {
                continue;
            }
            if registry.is_known(&type_ref) && !self.universe.is_local(type_ref.name()) {
                debug!("Codec for {} already exists", type_ref);
                continue;
            }

            let fields = match self.resolver.resolve_members(&type_ref) {
                Ok(fields) => fields,
                Err(err) if !err.is_fatal() => {
                    warn!("Skipping {}: {}", type_ref, err);
                    continue;
                }
                Err(err) => return Err(err),
            };

            for field in &fields {
                self.walk(&field.field_type, TypeOrigin::Reached);
            }
            debug!("Registered {} with {} fields", type_ref, fields.len());
            registry.register(AnnotatedType { type_ref, fields, origin });
        }
        Ok(())
    }
}
