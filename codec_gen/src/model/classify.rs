use crate::codegen::ir::TokenKind;
use crate::model::universe::TypeUniverse;
use codec_types::{DeclKind, TypeDecl, TypeRef};
use serde_derive::{Deserialize, Serialize};

const COLLECTION_NAMES: &[&str] = &["List", "ArrayList", "Vec"];
const MAP_NAMES: &[&str] = &["Map", "HashMap", "LinkedHashMap"];

/// Scalar kinds with a direct token representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveKind {
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Text,
}

impl PrimitiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" | "integer" | "i32" => Some(PrimitiveKind::Int),
            "long" | "i64" => Some(PrimitiveKind::Long),
            "float" | "f32" => Some(PrimitiveKind::Float),
            "double" | "f64" => Some(PrimitiveKind::Double),
            "boolean" | "bool" => Some(PrimitiveKind::Boolean),
            "string" | "String" => Some(PrimitiveKind::Text),
            _ => None,
        }
    }

    /// The token a value of this kind is read from.
    pub fn token(self) -> TokenKind {
        match self {
            PrimitiveKind::Int | PrimitiveKind::Long | PrimitiveKind::Float | PrimitiveKind::Double => TokenKind::Number,
            PrimitiveKind::Boolean => TokenKind::Boolean,
            PrimitiveKind::Text => TokenKind::String,
        }
    }

    /// Text is the only primitive without a zero value; it defaults to absent.
    pub fn has_zero(self) -> bool {
        self != PrimitiveKind::Text
    }
}

pub fn is_collection_name(name: &str) -> bool {
    COLLECTION_NAMES.contains(&name)
}

pub fn is_map_name(name: &str) -> bool {
    MAP_NAMES.contains(&name)
}

pub fn is_builtin_name(name: &str) -> bool {
    PrimitiveKind::from_name(name).is_some() || is_collection_name(name) || is_map_name(name)
}

/// How the generator treats a type reference.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeClass<'a> {
    Primitive(PrimitiveKind),
    Collection { element: &'a TypeRef },
    Map { key: &'a TypeRef, value: &'a TypeRef },
    Declared { decl: &'a TypeDecl, args: &'a [TypeRef] },
    Enumeration { decl: &'a TypeDecl },
    /// Known only by name; handled by the generic fallback codec.
    Opaque,
    Variable,
}

#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    universe: &'a TypeUniverse,
}

impl<'a> Classifier<'a> {
    pub fn new(universe: &'a TypeUniverse) -> Self {
        Self { universe }
    }

    pub fn classify<'t>(&self, type_ref: &'t TypeRef) -> TypeClass<'t>
    where
        'a: 't,
    {
        let (name, args) = match type_ref {
            TypeRef::Var(_) => return TypeClass::Variable,
            TypeRef::Named { name, args } => (name.as_str(), args.as_slice()),
        };

        if let Some(decl) = self.universe.get(name) {
            return match decl.kind {
                DeclKind::Enum => TypeClass::Enumeration { decl },
                DeclKind::Class => TypeClass::Declared { decl, args },
            };
        }

        match (PrimitiveKind::from_name(name), args) {
            (Some(kind), []) => return TypeClass::Primitive(kind),
            (Some(_), _) => return TypeClass::Opaque,
            (None, _) => {}
        }

        if is_collection_name(name) {
            if let [element] = args {
                return TypeClass::Collection { element };
            }
        } else if is_map_name(name) {
            if let [key, value] = args {
                return TypeClass::Map { key, value };
            }
        }
        TypeClass::Opaque
    }

    /// A reference is concrete when it has no free variables and every
    /// declared or builtin generic is applied to the right number of arguments.
    pub fn is_concrete(&self, type_ref: &TypeRef) -> bool {
        match type_ref {
            TypeRef::Var(_) => false,
            TypeRef::Named { name, args } => {
                if !args.iter().all(|arg| self.is_concrete(arg)) {
                    return false;
                }
                if let Some(decl) = self.universe.get(name) {
                    return decl.type_params.len() == args.len();
                }
                if PrimitiveKind::from_name(name).is_some() {
                    return args.is_empty();
                }
                if is_collection_name(name) {
                    return args.len() == 1;
                }
                if is_map_name(name) {
                    return args.len() == 2;
                }
                true
            }
        }
    }

    /// Maps with text keys get a dedicated helper; other maps go through the fallback.
    pub fn has_text_keys(&self, key: &TypeRef) -> bool {
        matches!(key, TypeRef::Named { name, args } if args.is_empty() && PrimitiveKind::from_name(name) == Some(PrimitiveKind::Text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec_types::FieldDecl;

    fn universe() -> TypeUniverse {
        let mut color = TypeDecl::class("a.Color");
        color.kind = DeclKind::Enum;
        TypeUniverse::from_decls(vec![
            TypeDecl::class("a.Pair")
                .with_params(&["A", "B"])
                .field(FieldDecl::new("first", TypeRef::named("A"))),
            color,
        ])
    }

    #[test]
    fn classifies_builtins_and_declarations() {
        let universe = universe();
        let classifier = Classifier::new(&universe);

        let int = TypeRef::named("int");
        assert_eq!(classifier.classify(&int), TypeClass::Primitive(PrimitiveKind::Int));

        let list: TypeRef = "ArrayList<string>".parse().unwrap();
        assert!(matches!(classifier.classify(&list), TypeClass::Collection { .. }));

        let pair: TypeRef = "a.Pair<int, string>".parse().unwrap();
        assert!(matches!(classifier.classify(&pair), TypeClass::Declared { args, .. } if args.len() == 2));

        let color = TypeRef::named("a.Color");
        assert!(matches!(classifier.classify(&color), TypeClass::Enumeration { .. }));

        let date = TypeRef::named("java.util.Date");
        assert_eq!(classifier.classify(&date), TypeClass::Opaque);

        let bad_list: TypeRef = "List<int, int>".parse().unwrap();
        assert_eq!(classifier.classify(&bad_list), TypeClass::Opaque);
    }

    #[test]
    fn concrete_requires_full_arity() {
        let universe = universe();
        let classifier = Classifier::new(&universe);
        assert!(classifier.is_concrete(&"a.Pair<int, string>".parse().unwrap()));
        assert!(!classifier.is_concrete(&"a.Pair<int>".parse().unwrap()));
        assert!(!classifier.is_concrete(&TypeRef::generic("List", vec![TypeRef::var("T")])));
        assert!(classifier.is_concrete(&"java.util.Date".parse().unwrap()));
    }
}
