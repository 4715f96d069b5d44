/* Decoded values - the dynamic form the interpreter reads into and writes from */

use codec_gen::model::PrimitiveKind;
use codec_types::TypeRef;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as Json};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /* Null on the wire, or never set */
    #[default]
    Absent,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Text(String),
    List(Vec<Value>),
    /* Text-keyed map in document order */
    Map(IndexMap<String, Value>),
    Object(ObjectValue),
    /* Produced and consumed by the generic fallback codec */
    Raw(Json),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub type_ref: TypeRef,
    /* Keyed by field binding, in declaration order */
    pub fields: IndexMap<String, Value>,
}

impl ObjectValue {
    pub fn new(type_ref: TypeRef) -> Self {
        Self { type_ref, fields: IndexMap::new() }
    }
}

impl Value {
    pub fn object(type_ref: TypeRef) -> Self {
        Value::Object(ObjectValue::new(type_ref))
    }

    /// Builder-style field setter; a no-op on non-objects.
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        if let Value::Object(object) = &mut self {
            object.fields.insert(name.to_string(), value);
        }
        self
    }

    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn zero(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Int => Value::Int(0),
            PrimitiveKind::Long => Value::Long(0),
            PrimitiveKind::Float => Value::Float(0.0),
            PrimitiveKind::Double => Value::Double(0.0),
            PrimitiveKind::Boolean => Value::Bool(false),
            PrimitiveKind::Text => Value::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(object) => object.fields.get(name),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::Int(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short description used in mismatch errors.
    pub fn describe(&self) -> String {
        match self {
            Value::Absent => "absent".into(),
            Value::Int(v) => format!("int {}", v),
            Value::Long(v) => format!("long {}", v),
            Value::Float(v) => format!("float {}", v),
            Value::Double(v) => format!("double {}", v),
            Value::Bool(v) => format!("boolean {}", v),
            Value::Text(_) => "string".into(),
            Value::List(items) => format!("list of {}", items.len()),
            Value::Map(entries) => format!("map of {}", entries.len()),
            Value::Object(object) => format!("object {}", object.type_ref),
            Value::Raw(_) => "raw JSON".into(),
        }
    }

    /// Plain JSON view; objects lose their type and absent becomes null.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Absent => Json::Null,
            Value::Int(v) => Json::Number(Number::from(*v)),
            Value::Long(v) => Json::Number(Number::from(*v)),
            Value::Float(v) => Number::from_f64(f64::from(*v)).map(Json::Number).unwrap_or(Json::Null),
            Value::Double(v) => Number::from_f64(*v).map(Json::Number).unwrap_or(Json::Null),
            Value::Bool(v) => Json::Bool(*v),
            Value::Text(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => Json::Object(entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect::<Map<_, _>>()),
            Value::Object(object) => {
                Json::Object(object.fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect::<Map<_, _>>())
            }
            Value::Raw(json) => json.clone(),
        }
    }
}
