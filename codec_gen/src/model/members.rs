use crate::error::GenError;
use crate::model::classify::Classifier;
use crate::model::universe::TypeUniverse;
use codec_types::{FieldDecl, TypeDecl, TypeRef, Visibility};
use serde_derive::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

/// A field selected for serialization, with its type fully substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
  pub declared_name: String,
  pub wire_name: String,
  pub field_type: TypeRef,
  /// Type as written on the declaring type, before substitution.
  pub declared_type: TypeRef,
  /// Declaration that introduced the field (the subtype or an ancestor).
  pub owner: String,
  /// Name of the slot generated code reads and writes. Equal to
  /// `declared_name` unless an ancestor shadows it.
  pub binding: String,
}

impl FieldDescriptor {
  /// Declared through a type parameter, so one host slot serves every
  /// instantiation.
  pub fn is_parameterized(&self) -> bool {
    matches!(self.declared_type, TypeRef::Var(_))
  }
}

/* One level of the inheritance chain with the bindings for its parameters */
struct Level<'a> {
  decl: &'a TypeDecl,
  bindings: BTreeMap<String, TypeRef>,
}

pub struct MemberResolver<'a> {
  universe: &'a TypeUniverse,
  classifier: Classifier<'a>,
}

impl<'a> MemberResolver<'a> {
  pub fn new(universe: &'a TypeUniverse) -> Self {
    Self { universe, classifier: Classifier::new(universe) }
  }

  /// Resolves the serializable members of a concrete instantiation.
  ///
  /// Own fields come first, then each ancestor's, nearest first. The walk
  /// stops at the first ancestor that is not declared in the universe.
  pub fn resolve_members(&self, concrete: &TypeRef) -> Result<Vec<FieldDescriptor>, GenError> {
    let type_name = concrete.to_string();
    if !self.universe.contains(concrete.name()) {
      return Err(GenError::UnknownType { type_name });
    }
    if !self.classifier.is_concrete(concrete) {
      return Err(GenError::AmbiguousType { type_name, reason: "type arguments are missing or unbound".into() });
    }

    let levels = self.flatten_ancestors(concrete)?;
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut fields = Vec::new();

    for level in &levels {
      for field in &level.decl.fields {
        if !seen.insert((level.decl.name.as_str(), field.name.as_str())) {
          continue;
        }
        if !self.is_selected(level.decl, field)? {
          continue;
        }
        let field_type = field.field_type.substitute(&level.bindings);
        if field_type.has_free_vars() {
          return Err(GenError::AmbiguousType {
            type_name,
            reason: format!("field '{}' of '{}' has type {} after substitution", field.name, level.decl.name, field_type),
          });
        }
        fields.push(FieldDescriptor {
          declared_name: field.name.clone(),
          wire_name: field.wire_name().to_string(),
          field_type,
          declared_type: field.field_type.clone(),
          owner: level.decl.name.clone(),
          binding: field.name.clone(),
        });
      }
    }

    check_wire_names(&type_name, &fields)?;
    assign_bindings(&mut fields);
    Ok(fields)
  }

  /* Walks from the subtype to its furthest declared ancestor, composing
  substitutions as it goes */
  fn flatten_ancestors(&self, concrete: &TypeRef) -> Result<Vec<Level<'a>>, GenError> {
    let mut levels = Vec::new();
    let mut chain: Vec<String> = Vec::new();
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut current = concrete.clone();

    while let Some(decl) = self.universe.get(current.name()) {
      chain.push(decl.name.clone());
      if !visited.insert(decl.name.as_str()) {
        return Err(GenError::CircularInheritance { chain });
      }
      if decl.type_params.len() != current.args().len() {
        return Err(GenError::AmbiguousType {
          type_name: concrete.to_string(),
          reason: format!("ancestor '{}' is used as {}", decl.name, current),
        });
      }

      let bindings: BTreeMap<String, TypeRef> =
        decl.type_params.iter().cloned().zip(current.args().iter().cloned()).collect();
      let parent = decl.extends.as_ref().map(|parent| parent.substitute(&bindings));
      levels.push(Level { decl, bindings });

      match parent {
        None => break,
        Some(parent) if parent.has_free_vars() => {
          return Err(GenError::AmbiguousType {
            type_name: concrete.to_string(),
            reason: format!("ancestor {} of '{}' is not fully bound", parent, decl.name),
          });
        }
        Some(parent) => current = parent,
      }
    }

    Ok(levels)
  }

  fn is_selected(&self, owner: &TypeDecl, field: &FieldDecl) -> Result<bool, GenError> {
    if field.is_static {
      /* Class-level constants, final or not, are never serialized */
      return Ok(false);
    }
    if field.is_final {
      return Err(GenError::UnsupportedField {
        owner: owner.name.clone(),
        field: field.name.clone(),
        reason: "field is final and cannot be assigned during decoding",
      });
    }
    if field.is_transient {
      debug!("Skipping transient field {}.{}", owner.name, field.name);
      return Ok(false);
    }
    if field.visibility == Visibility::Private {
      return Err(GenError::UnsupportedField {
        owner: owner.name.clone(),
        field: field.name.clone(),
        reason: "field must not be private",
      });
    }
    if !is_identifier(&field.name) {
      return Err(GenError::InvalidFieldName { owner: owner.name.clone(), field: field.name.clone() });
    }
    Ok(true)
  }
}

pub fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn check_wire_names(type_name: &str, fields: &[FieldDescriptor]) -> Result<(), GenError> {
  let mut by_wire: HashMap<&str, &FieldDescriptor> = HashMap::new();
  for field in fields {
    if let Some(first) = by_wire.insert(field.wire_name.as_str(), field) {
      return Err(GenError::DuplicateWireName {
        owner: type_name.to_string(),
        wire_name: field.wire_name.clone(),
        first: format!("{}.{}", first.owner, first.declared_name),
        second: format!("{}.{}", field.owner, field.declared_name),
      });
    }
  }
  Ok(())
}

/* Ancestor fields that share a declared name with a nearer field get a
binding qualified by their owner */
fn assign_bindings(fields: &mut [FieldDescriptor]) {
  let mut taken: HashSet<String> = HashSet::new();
  for field in fields.iter_mut() {
    if !taken.insert(field.binding.clone()) {
      let owner = field.owner.rsplit('.').next().unwrap_or(&field.owner).to_lowercase();
      field.binding = format!("{}_{}", field.declared_name, owner);
      taken.insert(field.binding.clone());
    }
  }
}
