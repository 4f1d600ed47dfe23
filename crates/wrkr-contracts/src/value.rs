//! Open key/value payloads carried by records and transitions.
//!
//! Record `event` and `metadata` fields are extensible, but not arbitrary:
//! a `Value` is a string, number, boolean, ordered map, or list of the same.
//! Maps are `BTreeMap`s so serialization order is always sorted by key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An ordered key/value payload.
pub type Payload = BTreeMap<String, Value>;

/// One payload value. `null` is not representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    Map(Payload),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Payload> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// A `{"old": .., "new": ..}` pair, the shape used in transition diffs.
    pub fn change(old: impl Into<Value>, new: impl Into<Value>) -> Self {
        let mut m = Payload::new();
        m.insert("old".to_string(), old.into());
        m.insert("new".to_string(), new.into());
        Value::Map(m)
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

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Number(v.into())
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Number((v as u64).into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON number form; they are kept as strings.
    fn from(v: f64) -> Self {
        match serde_json::Number::from_f64(v) {
            Some(n) => Value::Number(n),
            None => Value::String(v.to_string()),
        }
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::List(v.into_iter().map(Value::String).collect())
    }
}

impl From<Payload> for Value {
    fn from(v: Payload) -> Self {
        Value::Map(v)
    }
}

/// Build a payload from `(key, value)` pairs.
pub fn payload<K, V, I>(entries: I) -> Payload
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
