//! Generic value type crossing the native/script boundary
//!
//! Every native type the bridge hands to scripts maps to exactly one [`Value`]
//! shape. The other direction is partial: a script value may not have a
//! [`Value`] representation at all (function pointers, foreign custom types),
//! in which case [`Value::from_dynamic`] returns `None`. The vector and color
//! classes become maps.

use crate::core::entity::EntityId;
use crate::core::math::{Rgba, Vector2, Vector3};
use indexmap::IndexMap;
use rhai::Dynamic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered string-keyed mapping of values
pub type ValueMap = IndexMap<String, Value>;

/// A dynamically-typed value owned by the native side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Explicit null. Distinct from "no entry".
    #[default]
    Null,
    Bool(bool),
    /// All numbers are double precision
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
    /// Opaque reference to a native entity
    Handle(EntityId),
}

impl Value {
    /// Convert to a Rhai value for script access
    pub fn to_dynamic(&self) -> Dynamic {
        match self {
            Value::Null => Dynamic::UNIT,
            Value::Bool(v) => Dynamic::from(*v),
            Value::Number(v) => Dynamic::from_float(*v),
            Value::String(v) => Dynamic::from(v.clone()),
            Value::List(items) => {
                let array: rhai::Array = items.iter().map(Value::to_dynamic).collect();
                Dynamic::from_array(array)
            }
            Value::Map(entries) => {
                let mut map = rhai::Map::new();
                for (key, value) in entries {
                    map.insert(key.as_str().into(), value.to_dynamic());
                }
                Dynamic::from_map(map)
            }
            Value::Handle(id) => Dynamic::from(*id),
        }
    }

    /// Try to create a value from a Rhai Dynamic
    ///
    /// Returns `None` when the script value (or anything nested inside it)
    /// has no generic representation.
    pub fn from_dynamic(value: &Dynamic) -> Option<Self> {
        let value = value.flatten_clone();

        if value.is_unit() {
            return Some(Value::Null);
        }
        if let Ok(v) = value.as_bool() {
            return Some(Value::Bool(v));
        }
        if let Ok(v) = value.as_int() {
            return Some(Value::Number(v as f64));
        }
        if let Ok(v) = value.as_float() {
            return Some(Value::Number(v));
        }
        if let Ok(v) = value.as_char() {
            return Some(Value::String(v.to_string()));
        }
        if value.is_string() {
            return value.into_string().ok().map(Value::String);
        }
        if value.is_array() {
            let array = value.into_array().ok()?;
            return array
                .iter()
                .map(Value::from_dynamic)
                .collect::<Option<Vec<_>>>()
                .map(Value::List);
        }
        if value.is_map() {
            let map = value.try_cast::<rhai::Map>()?;
            let mut entries = ValueMap::with_capacity(map.len());
            for (key, item) in &map {
                entries.insert(key.to_string(), Value::from_dynamic(item)?);
            }
            return Some(Value::Map(entries));
        }
        if let Some(v) = value.read_lock::<Vector3>() {
            return Some((*v).into());
        }
        if let Some(v) = value.read_lock::<Vector2>() {
            return Some((*v).into());
        }
        if let Some(c) = value.read_lock::<Rgba>() {
            return Some((*c).into());
        }
        if let Some(id) = value.try_cast::<EntityId>() {
            return Some(Value::Handle(id));
        }

        None
    }

    /// Name of this value's shape, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Handle(_) => "handle",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a field when this value is a map
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(key),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                write!(f, "}}")
            }
            Value::Handle(id) => write!(f, "{id}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<EntityId> for Value {
    fn from(v: EntityId) -> Self {
        Value::Handle(v)
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion from a generic value into the type a caller asked for
///
/// This is the typed half of a late-bound call: the callee returns a
/// [`Value`], the call site states what it needs, and a shape mismatch is
/// reported as `None`.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(n as i64),
            _ => None,
        }
    }
}

impl FromValue for EntityId {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Handle(id) => Some(id),
            _ => None,
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl FromValue for () {
    fn from_value(_value: Value) -> Option<Self> {
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_to_dynamic() {
        let dynamic = Value::Number(3.5).to_dynamic();
        assert!((dynamic.as_float().unwrap() - 3.5).abs() < f64::EPSILON);

        assert!(Value::Null.to_dynamic().is_unit());
        assert!(Value::Bool(true).to_dynamic().as_bool().unwrap());
        assert_eq!(
            Value::from("hello").to_dynamic().into_string().unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_nested_value_to_dynamic() {
        let mut entries = ValueMap::new();
        entries.insert("x".into(), Value::Number(1.0));
        entries.insert("tags".into(), Value::from(vec!["a", "b"]));
        let dynamic = Value::Map(entries).to_dynamic();

        let map = dynamic.read_lock::<rhai::Map>().unwrap();
        assert_eq!(map.get("x").unwrap().as_float().unwrap(), 1.0);
        let tags = map.get("tags").unwrap().clone().into_array().unwrap();
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_from_dynamic_integers_become_numbers() {
        let value = Value::from_dynamic(&Dynamic::from(42_i64));
        assert_eq!(value, Some(Value::Number(42.0)));
    }

    #[test]
    fn test_from_dynamic_char_becomes_string() {
        let value = Value::from_dynamic(&Dynamic::from('z'));
        assert_eq!(value, Some(Value::from("z")));
    }

    #[test]
    fn test_from_dynamic_handle() {
        let value = Value::from_dynamic(&Dynamic::from(EntityId(9)));
        assert_eq!(value, Some(Value::Handle(EntityId(9))));
    }

    #[test]
    fn test_from_dynamic_classes_become_maps() {
        let value = Value::from_dynamic(&Dynamic::from(Vector3::new(1.0, 2.0, 3.0))).unwrap();
        assert_eq!(value.get("z"), Some(&Value::Number(3.0)));

        let value = Value::from_dynamic(&Dynamic::from(Rgba::new(1, 2, 3, 4))).unwrap();
        assert_eq!(value.get("a"), Some(&Value::Number(4.0)));
    }

    #[test]
    fn test_from_dynamic_rejects_function_pointers() {
        let fn_ptr = rhai::FnPtr::new("callback").unwrap();
        assert_eq!(Value::from_dynamic(&Dynamic::from(fn_ptr)), None);
    }

    #[test]
    fn test_from_dynamic_rejects_unknown_custom_types() {
        #[derive(Clone)]
        struct Opaque;
        assert_eq!(Value::from_dynamic(&Dynamic::from(Opaque)), None);
    }

    #[test]
    fn test_from_dynamic_rejects_array_with_bad_element() {
        #[derive(Clone)]
        struct Opaque;
        let array: rhai::Array = vec![Dynamic::from(1_i64), Dynamic::from(Opaque)];
        assert_eq!(Value::from_dynamic(&Dynamic::from_array(array)), None);
    }

    #[test]
    fn test_from_dynamic_map() {
        let mut map = rhai::Map::new();
        map.insert("alive".into(), Dynamic::from(true));
        map.insert("nothing".into(), Dynamic::UNIT);
        let value = Value::from_dynamic(&Dynamic::from_map(map)).unwrap();

        assert_eq!(value.get("alive"), Some(&Value::Bool(true)));
        assert_eq!(value.get("nothing"), Some(&Value::Null));
        assert_eq!(value.get("missing"), None);
    }

    #[test]
    fn test_native_conversions_are_total() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(2_i32)), Value::Number(2.0));
        assert_eq!(Value::from(EntityId(3)), Value::Handle(EntityId(3)));
        assert_eq!(
            Value::from(vec![1_i64, 2]),
            Value::List(vec![Value::Number(1.0), Value::Number(2.0)])
        );
    }

    #[test]
    fn test_typed_extraction() {
        assert_eq!(String::from_value(Value::from("x")), Some("x".to_string()));
        assert_eq!(String::from_value(Value::Number(1.0)), None);
        assert_eq!(bool::from_value(Value::Bool(false)), Some(false));
        assert_eq!(i64::from_value(Value::Number(4.0)), Some(4));
        assert_eq!(i64::from_value(Value::Number(4.5)), None);
    }

    #[test]
    fn test_value_serialization() {
        let value = Value::List(vec![Value::Null, Value::Number(5.0)]);
        let json = serde_json::to_string(&value).unwrap();
        let decoded: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, value);
    }
}
