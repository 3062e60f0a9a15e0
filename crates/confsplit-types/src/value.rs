//! Configuration value trees.
//!
//! A document is a tree of [`ConfigValue`] nodes: scalar leaves, ordered
//! mappings, and sequences. The tree deliberately carries less than a full
//! JSON model: mapping order is significant (see [`Mapping`]), integers and
//! floats stay distinct, and numbers outside the `i64` range are rejected at
//! the boundary instead of being silently widened.

use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::mapping::Mapping;

// ---- scalars ----

/// A leaf value in a configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Short name of the scalar kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Float(x) => serializer.serialize_f64(*x),
            Scalar::String(s) => serializer.serialize_str(s),
        }
    }
}

// ---- value trees ----

/// A node in a configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Scalar(Scalar),
    Mapping(Mapping),
    Sequence(Vec<ConfigValue>),
}

impl ConfigValue {
    /// The null scalar.
    pub const fn null() -> Self {
        ConfigValue::Scalar(Scalar::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Scalar(Scalar::Null))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, ConfigValue::Scalar(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, ConfigValue::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, ConfigValue::Sequence(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            ConfigValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            ConfigValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            ConfigValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<ConfigValue>> {
        match self {
            ConfigValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the node kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Scalar(s) => s.kind(),
            ConfigValue::Mapping(_) => "mapping",
            ConfigValue::Sequence(_) => "sequence",
        }
    }

    /// Converts a `serde_json` value into a configuration tree.
    ///
    /// Mapping order follows the iteration order of the input object, which
    /// for `serde_json::Value` is sorted by key. Integers beyond the `i64`
    /// range are rejected rather than truncated.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, TypeError> {
        match value {
            serde_json::Value::Null => Ok(ConfigValue::null()),
            serde_json::Value::Bool(b) => Ok(ConfigValue::Scalar(Scalar::Bool(*b))),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ConfigValue::Scalar(Scalar::Int(i)))
                } else if n.is_u64() {
                    Err(TypeError::UnrepresentableNumber(n.to_string()))
                } else if let Some(x) = n.as_f64() {
                    Ok(ConfigValue::Scalar(Scalar::Float(x)))
                } else {
                    Err(TypeError::UnrepresentableNumber(n.to_string()))
                }
            }
            serde_json::Value::String(s) => Ok(ConfigValue::Scalar(Scalar::String(s.clone()))),
            serde_json::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(Self::from_json(item)?);
                }
                Ok(ConfigValue::Sequence(out))
            }
            serde_json::Value::Object(fields) => {
                let mut out = Mapping::with_capacity(fields.len());
                for (key, field) in fields {
                    out.insert(key.clone(), Self::from_json(field)?);
                }
                Ok(ConfigValue::Mapping(out))
            }
        }
    }

    /// Converts the tree into a `serde_json` value.
    ///
    /// `serde_json::Value` keeps object keys sorted, so mapping order is not
    /// preserved by this conversion; serialize the [`ConfigValue`] directly
    /// when order matters. Non-finite floats become JSON null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::Scalar(Scalar::Null) => serde_json::Value::Null,
            ConfigValue::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
            ConfigValue::Scalar(Scalar::Int(i)) => serde_json::Value::from(*i),
            ConfigValue::Scalar(Scalar::Float(x)) => serde_json::Number::from_f64(*x)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            ConfigValue::Scalar(Scalar::String(s)) => serde_json::Value::String(s.clone()),
            ConfigValue::Mapping(m) => {
                let mut fields = serde_json::Map::new();
                for (key, value) in m.iter() {
                    fields.insert(key.to_string(), value.to_json());
                }
                serde_json::Value::Object(fields)
            }
            ConfigValue::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
        }
    }
}

impl Default for ConfigValue {
    fn default() -> Self {
        ConfigValue::null()
    }
}

impl From<Scalar> for ConfigValue {
    fn from(s: Scalar) -> Self {
        ConfigValue::Scalar(s)
    }
}

impl From<Mapping> for ConfigValue {
    fn from(m: Mapping) -> Self {
        ConfigValue::Mapping(m)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::Sequence(items)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Scalar(Scalar::Int(i))
    }
}

impl From<f64> for ConfigValue {
    fn from(x: f64) -> Self {
        ConfigValue::Scalar(Scalar::Float(x))
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Scalar(Scalar::String(s.to_owned()))
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Scalar(Scalar::String(s))
    }
}

// ---- serde ----

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Scalar(s) => s.serialize(serializer),
            ConfigValue::Mapping(m) => m.serialize(serializer),
            ConfigValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = ConfigValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a configuration value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
        Ok(ConfigValue::Scalar(Scalar::Bool(v)))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
        Ok(ConfigValue::Scalar(Scalar::Int(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(|i| ConfigValue::Scalar(Scalar::Int(i)))
            .map_err(|_| E::custom(format_args!("integer {v} does not fit in i64")))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
        Ok(ConfigValue::Scalar(Scalar::Float(v)))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ConfigValue::Scalar(Scalar::String(v.to_owned())))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
        Ok(ConfigValue::Scalar(Scalar::String(v)))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(ConfigValue::null())
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(ConfigValue::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        ConfigValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(item) = access.next_element()? {
            items.push(item);
        }
        Ok(ConfigValue::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut out = Mapping::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, ConfigValue>()? {
            out.insert(key, value);
        }
        Ok(ConfigValue::Mapping(out))
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

// ---- tests ----

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ConfigValue {
        serde_json::from_str(json).unwrap()
    }

    // ---- parsing ----

    #[test]
    fn parses_scalars() {
        assert_eq!(parse("null"), ConfigValue::null());
        assert_eq!(parse("true"), ConfigValue::from(true));
        assert_eq!(parse("-7"), ConfigValue::from(-7i64));
        assert_eq!(parse("2.5"), ConfigValue::from(2.5));
        assert_eq!(parse("\"hi\""), ConfigValue::from("hi"));
    }

    #[test]
    fn parsing_preserves_mapping_order() {
        let value = parse(r#"{"zebra": 1, "apple": {"y": true, "x": false}}"#);
        let mapping = value.as_mapping().unwrap();
        let keys: Vec<&str> = mapping.keys().collect();
        assert_eq!(keys, ["zebra", "apple"]);

        let inner = mapping.get("apple").unwrap().as_mapping().unwrap();
        let inner_keys: Vec<&str> = inner.keys().collect();
        assert_eq!(inner_keys, ["y", "x"]);
    }

    #[test]
    fn serialization_round_trips_in_order() {
        let text = r#"{"z":26,"a":[1,null,{"k":true}]}"#;
        let value = parse(text);
        assert_eq!(serde_json::to_string(&value).unwrap(), text);
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let value = parse(r#"{"k": 1, "k": 2}"#);
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("k"), Some(&ConfigValue::from(2i64)));
    }

    #[test]
    fn rejects_integers_beyond_i64() {
        let text = format!("{}", u64::MAX);
        assert!(serde_json::from_str::<ConfigValue>(&text).is_err());

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            ConfigValue::from_json(&json),
            Err(TypeError::UnrepresentableNumber(text))
        );
    }

    #[test]
    fn u64_within_range_becomes_int() {
        let json = serde_json::json!(42u64);
        assert_eq!(
            ConfigValue::from_json(&json).unwrap(),
            ConfigValue::from(42i64)
        );
    }

    // ---- json conversions ----

    #[test]
    fn from_json_builds_trees() {
        let json = serde_json::json!({
            "name": "edge",
            "ports": [80, 443],
            "tls": {"enabled": true}
        });
        let value = ConfigValue::from_json(&json).unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(
            mapping.get("ports").unwrap().as_sequence().unwrap().len(),
            2
        );
    }

    #[test]
    fn to_json_round_trips_content() {
        // Keys already sorted: to_json sorts them, so order survives here.
        let value = parse(r#"{"a": [false, "s"], "b": {"n": 1.5}}"#);
        let json = value.to_json();
        assert_eq!(ConfigValue::from_json(&json).unwrap(), value);
    }

    // ---- accessors ----

    #[test]
    fn accessors_match_variants() {
        let value = parse(r#"{"seq": [1], "map": {}, "s": "x"}"#);
        let mapping = value.as_mapping().unwrap();

        assert!(mapping.get("seq").unwrap().is_sequence());
        assert!(mapping.get("map").unwrap().is_mapping());
        assert!(mapping.get("s").unwrap().is_scalar());
        assert!(mapping.get("seq").unwrap().as_mapping().is_none());
        assert_eq!(mapping.get("s").unwrap().kind(), "string");
        assert_eq!(value.kind(), "mapping");
    }

    #[test]
    fn mutable_accessors_edit_in_place() {
        let mut value = parse(r#"{"items": [1]}"#);
        value
            .as_mapping_mut()
            .unwrap()
            .get_mut("items")
            .unwrap()
            .as_sequence_mut()
            .unwrap()
            .push(ConfigValue::from(2i64));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"items":[1,2]}"#);
    }
}
