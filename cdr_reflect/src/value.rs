/* Dynamic values mirroring the native representation of every type variant */

use serde::{Deserialize, Serialize};

/* Enum representing all possible values */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Value {
    Bool(bool),

    /* Single byte character */
    Char(char),

    /* Signed integers */
    Int(i64),

    /* Octets and unsigned integers */
    UInt(u64),

    /* float and double */
    Float(f64),

    /* Enumerator name */
    Enum(String),

    String(String),

    /* Fixed-size array; one nesting level per extent */
    Array(Vec<Value>),

    Sequence(Vec<Value>),

    /* Declarator name and value, in declaration order */
    Struct(Vec<(String, Value)>),

    Union(UnionValue),
}

/* Union value - the discriminant and, when one is selected, the active member */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionValue {
    pub discriminant: i64,
    pub active: Option<(String, Box<Value>)>,
}

impl UnionValue {
    pub fn new(discriminant: i64, member: impl Into<String>, value: Value) -> Self {
        Self {
            discriminant,
            active: Some((member.into(), Box::new(value))),
        }
    }

    /// A discriminant that selects no member.
    pub fn empty(discriminant: i64) -> Self {
        Self {
            discriminant,
            active: None,
        }
    }
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Enum(_) => "enum",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Sequence(_) => "sequence",
            Value::Struct(_) => "struct",
            Value::Union(_) => "union",
        }
    }

    /// Field of a struct value by declarator name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        match self {
            Value::Struct(fields) => fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn structure<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Value::Struct(fields.into_iter().map(|(n, v)| (n.to_string(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let mut point = Value::structure([("x", Value::Int(5)), ("y", Value::Int(-3))]);
        assert_eq!(point.field("y"), Some(&Value::Int(-3)));
        assert_eq!(point.field("z"), None);
        if let Some(x) = point.field_mut("x") {
            *x = Value::Int(6);
        }
        assert_eq!(point.field("x"), Some(&Value::Int(6)));
        assert_eq!(Value::Int(1).field("x"), None);
    }

    #[test]
    fn test_yaml_round_trip() {
        let value = Value::structure([
            ("name", Value::String("sensor".into())),
            ("msg", Value::Union(UnionValue::new(1, "ping", Value::Int(42)))),
            ("none", Value::Union(UnionValue::empty(99))),
            ("vals", Value::Array(vec![Value::UInt(1), Value::UInt(2)])),
        ]);
        let yaml = serde_yml::to_string(&value).unwrap();
        assert!(yaml.contains("kind: struct"));
        let back: Value = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(back, value);
    }
}
