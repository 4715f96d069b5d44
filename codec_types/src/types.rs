use crate::type_ref::TypeRef;
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DeclKind {
    #[default]
    Class,
    Enum,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    #[default]
    Public,
    Package,
    Protected,
    Private,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: TypeRef,
    /// Key used on the wire; the declared name is used when absent or empty.
    #[serde(default)]
    pub wire_name: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "transient")]
    pub is_transient: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, field_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            field_type,
            wire_name: None,
            visibility: Visibility::Public,
            is_final: false,
            is_static: false,
            is_transient: false,
        }
    }

    pub fn with_wire_name(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = Some(wire_name.into());
        self
    }

    pub fn wire_name(&self) -> &str {
        match &self.wire_name {
            Some(wire) if !wire.is_empty() => wire,
            _ => &self.name,
        }
    }
}

/// A candidate type declaration supplied by the host.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub kind: DeclKind,
    /// Explicitly selected for codec generation.
    #[serde(default)]
    pub marked: bool,
    #[serde(default)]
    pub extends: Option<TypeRef>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

impl TypeDecl {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            kind: DeclKind::Class,
            marked: false,
            extends: None,
            fields: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: &[&str]) -> Self {
        self.type_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn marked(mut self) -> Self {
        self.marked = true;
        self
    }

    pub fn extends(mut self, parent: TypeRef) -> Self {
        self.extends = Some(parent);
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// The declaration as a type reference, with its own parameters as variables.
    pub fn self_type(&self) -> TypeRef {
        TypeRef::generic(self.name.clone(), self.type_params.iter().map(TypeRef::var).collect())
    }

    /// Converts references to this declaration's parameters into [`TypeRef::Var`].
    pub fn normalize(mut self) -> Self {
        let params = self.type_params.clone();
        self.extends = self.extends.map(|parent| parent.bind_params(&params));
        for field in &mut self.fields {
            field.field_type = field.field_type.bind_params(&params);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_declaration_normalizes_parameters() {
        let yaml = r#"
name: com.example.Pair
type-params: [T, K]
marked: true
fields:
  - name: first
    type: T
  - name: second
    type: List<K>
    wire-name: second_items
  - name: label
    type: string
    visibility: private
"#;
        let decl: TypeDecl = serde_yml::from_str(yaml).unwrap();
        let decl = decl.normalize();

        assert!(decl.marked);
        assert_eq!(decl.fields[0].field_type, TypeRef::var("T"));
        assert_eq!(decl.fields[1].field_type, TypeRef::generic("List", vec![TypeRef::var("K")]));
        assert_eq!(decl.fields[1].wire_name(), "second_items");
        assert_eq!(decl.fields[2].visibility, Visibility::Private);
        assert_eq!(decl.self_type().to_string(), "com.example.Pair<T, K>");
    }

    #[test]
    fn empty_wire_name_falls_back_to_declared_name() {
        let field = FieldDecl::new("count", TypeRef::named("int")).with_wire_name("");
        assert_eq!(field.wire_name(), "count");
    }
}
