use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;

use crate::JsonValue;
use crate::hash::HashMap;

// -----------------------------------------------------------------------------
// Value

/// The generic output map, keyed by serialized names.
pub type ValueMap = HashMap<String, Value>;

/// A dynamically typed value stored in the output [`ValueMap`].
///
/// Two sources produce values:
///
/// - Generic decoding of raw input ([`Value::from_json`]) only yields
///   [`Null`], [`Bool`], [`F64`], [`String`], [`Seq`] and [`Map`].
///   Every JSON number becomes an `F64`.
/// - Known fields mirror their typed result, keeping the width of the
///   field: an `i8` field mirrors as [`I8`], a `u64` as [`U64`].
///
/// [`Null`]: Value::Null
/// [`Bool`]: Value::Bool
/// [`F64`]: Value::F64
/// [`String`]: Value::String
/// [`Seq`]: Value::Seq
/// [`Map`]: Value::Map
/// [`I8`]: Value::I8
/// [`U64`]: Value::U64
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Seq(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    /// Decodes a raw value without a target type.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_decode::Value;
    ///
    /// let raw = serde_json::json!({ "n": 2, "tags": ["a", null] });
    /// let Value::Map(map) = Value::from_json(&raw) else { unreachable!() };
    ///
    /// assert_eq!(map["n"], Value::F64(2.0));
    /// assert_eq!(map["tags"], Value::Seq(vec![Value::from("a"), Value::Null]));
    /// ```
    pub fn from_json(raw: &JsonValue) -> Self {
        match raw {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::F64(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::Seq(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(object) => Value::Map(
                object
                    .iter()
                    .map(|(key, raw)| (key.clone(), Value::from_json(raw)))
                    .collect(),
            ),
        }
    }

    /// Converts back into the raw representation.
    ///
    /// Non-finite floats become `null`, as JSON cannot hold them.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::I8(v) => JsonValue::from(*v),
            Value::I16(v) => JsonValue::from(*v),
            Value::I32(v) => JsonValue::from(*v),
            Value::I64(v) => JsonValue::from(*v),
            Value::U8(v) => JsonValue::from(*v),
            Value::U16(v) => JsonValue::from(*v),
            Value::U32(v) => JsonValue::from(*v),
            Value::U64(v) => JsonValue::from(*v),
            Value::F32(v) => Number::from_f64(f64::from(*v)).map_or(JsonValue::Null, JsonValue::Number),
            Value::F64(v) => Number::from_f64(*v).map_or(JsonValue::Null, JsonValue::Number),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Seq(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns any numeric variant widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        Some(match *self {
            Value::I8(v) => v.into(),
            Value::I16(v) => v.into(),
            Value::I32(v) => v.into(),
            Value::I64(v) => v as f64,
            Value::U8(v) => v.into(),
            Value::U16(v) => v.into(),
            Value::U32(v) => v.into(),
            Value::U64(v) => v as f64,
            Value::F32(v) => v.into(),
            Value::F64(v) => v,
            _ => return None,
        })
    }

    #[inline]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` if this is a [`Value::Map`].
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    /// Formats as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_json(), f)
    }
}

// -----------------------------------------------------------------------------
// Conversions

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    ValueMap => Map,
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl From<&JsonValue> for Value {
    #[inline]
    fn from(raw: &JsonValue) -> Self {
        Value::from_json(raw)
    }
}

impl From<&Value> for JsonValue {
    #[inline]
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

// -----------------------------------------------------------------------------
// Serialize

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::I8(v) => serializer.serialize_i8(*v),
            Value::I16(v) => serializer.serialize_i16(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U8(v) => serializer.serialize_u8(*v),
            Value::U16(v) => serializer.serialize_u16(*v),
            Value::U32(v) => serializer.serialize_u32(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F32(v) => serializer.serialize_f32(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut ser = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    ser.serialize_entry(key, value)?;
                }
                ser.end()
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
