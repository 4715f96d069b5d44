use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structural reference to a type in the declaration universe.
///
/// Two references are equal iff they name the same type with the same
/// arguments, regardless of where they were parsed from. The canonical textual
/// form (see [`fmt::Display`]) is the identity string used in manifests and
/// dispatch tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    /// A free type variable, only meaningful inside the declaration that binds it.
    Var(String),
    /// A primitive, builtin container or declared type, possibly parameterized.
    Named { name: String, args: Vec<TypeRef> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeRefParseError {
    #[error("empty type expression")]
    Empty,
    #[error("unexpected character '{found}' at offset {offset} in '{input}'")]
    UnexpectedChar { input: String, offset: usize, found: char },
    #[error("unexpected end of type expression '{input}'")]
    UnexpectedEnd { input: String },
    #[error("type '{name}' has an empty argument list in '{input}'")]
    EmptyArguments { input: String, name: String },
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named { name: name.into(), args: Vec::new() }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Named { name: name.into(), args }
    }

    pub fn var(name: impl Into<String>) -> Self {
        TypeRef::Var(name.into())
    }

    /// Raw name without type arguments (the variable name for [`TypeRef::Var`]).
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Var(name) => name,
            TypeRef::Named { name, .. } => name,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Var(_) => &[],
            TypeRef::Named { args, .. } => args,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, TypeRef::Var(_))
    }

    /// Last segment of the qualified name (`com.example.Pair` -> `Pair`).
    pub fn simple_name(&self) -> &str {
        let name = self.name();
        name.rsplit('.').next().unwrap_or(name)
    }

    /// True when a type variable appears anywhere in this reference.
    pub fn has_free_vars(&self) -> bool {
        match self {
            TypeRef::Var(_) => true,
            TypeRef::Named { args, .. } => args.iter().any(TypeRef::has_free_vars),
        }
    }

    /// Replaces bound variables; unbound variables are left in place.
    pub fn substitute(&self, bindings: &BTreeMap<String, TypeRef>) -> TypeRef {
        match self {
            TypeRef::Var(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            TypeRef::Named { name, args } => TypeRef::Named {
                name: name.clone(),
                args: args.iter().map(|arg| arg.substitute(bindings)).collect(),
            },
        }
    }

    /// Turns bare references to the given parameter names into variables.
    ///
    /// The parser cannot tell `T` from a type named `T`; declarations call this
    /// with their own parameter list once parsing is done.
    pub fn bind_params(&self, params: &[String]) -> TypeRef {
        match self {
            TypeRef::Var(_) => self.clone(),
            TypeRef::Named { name, args } if args.is_empty() && params.iter().any(|p| p == name) => {
                TypeRef::Var(name.clone())
            }
            TypeRef::Named { name, args } => TypeRef::Named {
                name: name.clone(),
                args: args.iter().map(|arg| arg.bind_params(params)).collect(),
            },
        }
    }

    /// Rewrites every named component through `rename` (used for package qualification).
    pub fn map_names(&self, rename: &dyn Fn(&str) -> Option<String>) -> TypeRef {
        match self {
            TypeRef::Var(_) => self.clone(),
            TypeRef::Named { name, args } => TypeRef::Named {
                name: rename(name).unwrap_or_else(|| name.clone()),
                args: args.iter().map(|arg| arg.map_names(rename)).collect(),
            },
        }
    }

    /// Visits every named component, outermost first.
    pub fn for_each_name(&self, visit: &mut dyn FnMut(&str)) {
        if let TypeRef::Named { name, args } = self {
            visit(name);
            for arg in args {
                arg.for_each_name(visit);
            }
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Var(name) => f.write_str(name),
            TypeRef::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (idx, arg) in args.iter().enumerate() {
                        if idx > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for TypeRef {
    type Err = TypeRefParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.trim().is_empty() {
            return Err(TypeRefParseError::Empty);
        }
        let mut parser = TypeRefParser { input, chars: input.char_indices().collect(), pos: 0 };
        let parsed = parser.parse_type()?;
        parser.skip_ws();
        if let Some((offset, found)) = parser.peek() {
            return Err(TypeRefParseError::UnexpectedChar { input: input.to_string(), offset, found });
        }
        Ok(parsed)
    }
}

struct TypeRefParser<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> TypeRefParser<'a> {
    fn peek(&self) -> Option<(usize, char)> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some((_, c)) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> TypeRefParseError {
        match self.peek() {
            Some((offset, found)) => TypeRefParseError::UnexpectedChar { input: self.input.to_string(), offset, found },
            None => TypeRefParseError::UnexpectedEnd { input: self.input.to_string() },
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeRefParseError> {
        self.skip_ws();
        let mut name = String::new();
        while let Some((_, c)) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' || c == '$' {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.unexpected());
        }

        self.skip_ws();
        let mut args = Vec::new();
        if let Some((_, '<')) = self.peek() {
            self.pos += 1;
            self.skip_ws();
            if let Some((_, '>')) = self.peek() {
                return Err(TypeRefParseError::EmptyArguments { input: self.input.to_string(), name });
            }
            loop {
                args.push(self.parse_type()?);
                self.skip_ws();
                match self.peek() {
                    Some((_, ',')) => self.pos += 1,
                    Some((_, '>')) => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.unexpected()),
                }
            }
        }
        Ok(TypeRef::Named { name, args })
    }
}

impl serde::Serialize for TypeRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for TypeRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text: String = serde::Deserialize::deserialize(deserializer)?;
        text.parse().map_err(DeError::custom)
    }
}
