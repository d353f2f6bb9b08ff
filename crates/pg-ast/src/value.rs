//! Persistent tree value for PostgreSQL parse trees.
//!
//! The parser hands trees over in libpg_query's JSON encoding: every AST
//! position is an object with exactly one field named after the node kind
//! (`{"SelectStmt": {...}}`), whose value is that kind's attribute record.
//! [`Value`] mirrors that encoding, but keeps lists and objects behind [`Arc`]
//! so cloning is a pointer copy. Rewrites rebuild only the path from the root
//! to a changed node; every other subtree stays shared and can be observed
//! with [`Value::ptr_eq`].
//!
//! # Examples
//!
//! ```
//! use pg_ast::value::Value;
//!
//! let node = Value::from(serde_json::json!({
//!     "RangeVar": { "relname": "users", "inh": true, "relpersistence": "p" }
//! }));
//!
//! let (kind, attrs) = node.as_tagged().unwrap();
//! assert_eq!(kind, "RangeVar");
//! assert_eq!(attrs.get("relname").and_then(Value::as_str), Some("users"));
//! ```

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;
use std::fmt;
use std::sync::Arc;

/// Returns `true` if `name` follows the node-kind naming convention.
///
/// Kind names start with an ASCII uppercase letter followed by ASCII
/// alphanumerics or underscores (`SelectStmt`, `A_Expr`, `String`). Attribute
/// names in libpg_query's encoding always start lowercase, which is what makes
/// a tagged node recognizable by shape alone.
pub fn is_kind_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_uppercase() && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Ordered field map of an object value.
///
/// Keeps fields in insertion order so trees round-trip in the order the parser
/// emitted them. Replacing an existing key keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or replace a field. Replaced fields keep their position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub(crate) fn set_at(&mut self, position: usize, value: Value) {
        if let Some(entry) = self.entries.get_mut(position) {
            entry.1 = value;
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

/// A JSON-shaped, structurally shared tree value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    List(Arc<Vec<Value>>),
    Object(Arc<Fields>),
}

impl Value {
    /// Build an object value from `(field, value)` pairs.
    pub fn object<I, K>(pairs: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(Arc::new(pairs.into_iter().collect()))
    }

    /// An object with no fields (`{}`).
    pub fn empty_object() -> Value {
        Value::Object(Arc::new(Fields::new()))
    }

    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Value {
        Value::List(Arc::new(items.into_iter().collect()))
    }

    /// Wrap an attribute record in its kind tag: `{kind: attrs}`.
    pub fn tagged(kind: &str, attrs: Value) -> Value {
        Value::object([(kind, attrs)])
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Field lookup. Non-objects and missing fields both yield `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// List elements, or an empty slice for anything that is not a list.
    pub fn items(&self) -> &[Value] {
        self.as_list().unwrap_or(&[])
    }

    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Split a tagged node into its kind name and attribute record.
    ///
    /// A value is a tagged node when it is an object with exactly one field and
    /// that field's name satisfies [`is_kind_name`].
    pub fn as_tagged(&self) -> Option<(&str, &Value)> {
        let fields = self.as_object()?;
        if fields.len() != 1 {
            return None;
        }
        let (key, attrs) = fields.iter().next()?;
        is_kind_name(key).then_some((key, attrs))
    }

    /// The node kind, if this value is a tagged node.
    pub fn kind(&self) -> Option<&str> {
        self.as_tagged().map(|(kind, _)| kind)
    }

    /// The attribute record, if this value is a tagged node.
    pub fn attrs(&self) -> Option<&Value> {
        self.as_tagged().map(|(_, attrs)| attrs)
    }

    /// A copy of this object with `key` set to `value`.
    ///
    /// Only the top-level field list is copied; field values are shared. A
    /// non-object receiver is treated as an empty object.
    pub fn with(&self, key: impl Into<String>, value: Value) -> Value {
        let mut fields = self.as_object().cloned().unwrap_or_default();
        fields.insert(key, value);
        Value::Object(Arc::new(fields))
    }

    /// A copy of this object without `key`. Returns the receiver itself when the
    /// field is absent.
    pub fn without(&self, key: &str) -> Value {
        match self {
            Value::Object(fields) if fields.contains_key(key) => {
                let mut fields = (**fields).clone();
                fields.remove(key);
                Value::Object(Arc::new(fields))
            }
            _ => self.clone(),
        }
    }

    /// Shallow merge: every pair overwrites (or adds) one top-level field.
    pub fn merged<I, K>(&self, pairs: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut fields = self.as_object().cloned().unwrap_or_default();
        for (key, value) in pairs {
            fields.insert(key, value);
        }
        Value::Object(Arc::new(fields))
    }

    /// Identity comparison.
    ///
    /// Lists and objects compare by allocation, scalars by value. Two
    /// independently built but equal objects are *not* `ptr_eq`.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::List(x), Value::List(y)) => Arc::ptr_eq(x, y),
            (Value::Object(x), Value::Object(y)) => Arc::ptr_eq(x, y),
            (Value::String(x), Value::String(y)) => x == y,
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            _ => false,
        }
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Value> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}

impl From<Fields> for Value {
    fn from(fields: Fields) -> Self {
        Value::Object(Arc::new(fields))
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::list(items.into_iter().map(Value::from))
            }
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Number::from_f64(v).map_or(Value::Null, Value::Number))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::from(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut fields = Fields::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            fields.insert(key, value);
        }
        Ok(Value::from(fields))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}
