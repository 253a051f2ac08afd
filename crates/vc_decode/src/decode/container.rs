use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};
use core::str::FromStr;

use super::{Decode, DecodeContext, decode_element, decode_value};
use crate::error::{FieldError, FieldErrorKind, PathSegment};
use crate::kind::FieldKind;
use crate::{JsonMap, JsonValue, Value, ValueMap};

// -----------------------------------------------------------------------------
// Pointers

impl<T: Decode> Decode for Option<T> {
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Pointer(Box::new(T::kind()))
    }

    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        if input.is_null() {
            *self = None;
            return Ok(Value::Null);
        }
        decode_value(self.get_or_insert_with(T::default), input, cx)
    }
}

impl<T: Decode> Decode for Box<T> {
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Pointer(Box::new(T::kind()))
    }

    #[inline]
    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        decode_value(&mut **self, input, cx)
    }
}

// -----------------------------------------------------------------------------
// Sequences

impl<T: Decode> Decode for Vec<T> {
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Slice(Box::new(T::kind()))
    }

    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        let JsonValue::Array(items) = input else {
            return Err(cx.mismatch("array", input));
        };
        self.clear();
        self.reserve(items.len());
        let mut mirror = Vec::with_capacity(items.len());
        for (index, raw) in items.iter().enumerate() {
            let mut element = T::default();
            mirror.push(decode_element(&mut element, raw, PathSegment::Index(index), cx)?);
            self.push(element);
        }
        Ok(Value::Seq(mirror))
    }
}

/// Elements beyond `N` are ignored; missing ones are left at their zero
/// value. The mirror holds the decoded elements only.
impl<T: Decode, const N: usize> Decode for [T; N]
where
    [T; N]: Default,
{
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Array(N, Box::new(T::kind()))
    }

    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        let JsonValue::Array(items) = input else {
            return Err(cx.mismatch("array", input));
        };
        *self = Default::default();
        let mut mirror = Vec::with_capacity(N.min(items.len()));
        for (index, (slot, raw)) in self.iter_mut().zip(items).enumerate() {
            mirror.push(decode_element(slot, raw, PathSegment::Index(index), cx)?);
        }
        Ok(Value::Seq(mirror))
    }
}

// -----------------------------------------------------------------------------
// Maps

/// A map key parsed from a JSON object key.
pub trait MapKey: Sized + 'static {
    /// Name used in error messages.
    const EXPECTED: &'static str;

    fn parse_key(key: &str) -> Option<Self>;
}

impl MapKey for String {
    const EXPECTED: &'static str = "string";

    #[inline]
    fn parse_key(key: &str) -> Option<Self> {
        Some(String::from(key))
    }
}

macro_rules! impl_int_key {
    ($($ty:ident)*) => {$(
        impl MapKey for $ty {
            const EXPECTED: &'static str = stringify!($ty);

            #[inline]
            fn parse_key(key: &str) -> Option<Self> {
                <$ty as FromStr>::from_str(key).ok()
            }
        }
    )*};
}

impl_int_key!(i8 i16 i32 i64 isize u8 u16 u32 u64 usize);

/// Decodes every entry of `object`, handing each key and value to `insert`.
fn decode_entries<K: MapKey, V: Decode>(
    object: &JsonMap,
    cx: &mut DecodeContext<'_>,
    mut insert: impl FnMut(K, V),
) -> Result<Value, FieldError> {
    let mut mirror = ValueMap::with_capacity_and_hasher(object.len(), Default::default());
    for (key, raw) in object {
        let segment = PathSegment::Key(key.clone());
        let Some(parsed) = K::parse_key(key) else {
            return Err(cx.scoped(segment, |cx| {
                cx.error(FieldErrorKind::InvalidKey {
                    expected: K::EXPECTED,
                    key: key.clone(),
                })
            }));
        };
        let mut value = V::default();
        mirror.insert(key.clone(), decode_element(&mut value, raw, segment, cx)?);
        insert(parsed, value);
    }
    Ok(Value::Map(mirror))
}

impl<K, V, S> Decode for std::collections::HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default + 'static,
{
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Map(Box::new(V::kind()))
    }

    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        let JsonValue::Object(object) = input else {
            return Err(cx.mismatch("object", input));
        };
        self.clear();
        decode_entries(object, cx, |key, value| {
            self.insert(key, value);
        })
    }
}

impl<K, V, S> Decode for hashbrown::HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default + 'static,
{
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Map(Box::new(V::kind()))
    }

    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        let JsonValue::Object(object) = input else {
            return Err(cx.mismatch("object", input));
        };
        self.clear();
        decode_entries(object, cx, |key, value| {
            self.insert(key, value);
        })
    }
}

impl<K: MapKey + Ord, V: Decode> Decode for BTreeMap<K, V> {
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Map(Box::new(V::kind()))
    }

    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        let JsonValue::Object(object) = input else {
            return Err(cx.mismatch("object", input));
        };
        self.clear();
        decode_entries(object, cx, |key, value| {
            self.insert(key, value);
        })
    }
}

// -----------------------------------------------------------------------------
// Dynamic

impl Decode for Value {
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Dynamic
    }

    fn decode(&mut self, input: &JsonValue, _cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        *self = Value::from_json(input);
        Ok(self.clone())
    }
}

impl Decode for JsonValue {
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Dynamic
    }

    fn decode(&mut self, input: &JsonValue, _cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        self.clone_from(input);
        Ok(Value::from_json(input))
    }
}
