use alloc::string::String;

use serde_json::Number;

use super::{Decode, DecodeContext};
use crate::error::FieldError;
use crate::kind::{FieldKind, PrimitiveKind};
use crate::{JsonValue, Value};

// -----------------------------------------------------------------------------
// bool & String

impl Decode for bool {
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Primitive(PrimitiveKind::Bool)
    }

    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        match input {
            JsonValue::Bool(b) => {
                *self = *b;
                Ok(Value::Bool(*b))
            }
            _ => Err(cx.mismatch("bool", input)),
        }
    }
}

impl Decode for String {
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Primitive(PrimitiveKind::String)
    }

    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        match input {
            JsonValue::String(s) => {
                self.clone_from(s);
                Ok(Value::String(s.clone()))
            }
            _ => Err(cx.mismatch("string", input)),
        }
    }
}

// -----------------------------------------------------------------------------
// Integers

/// Reads an integer of type `T`.
///
/// Integral floats such as `3.0` are accepted when they fit.
fn int_from_json<T>(input: &JsonValue, expected: &'static str, cx: &DecodeContext<'_>) -> Result<T, FieldError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let JsonValue::Number(n) = input else {
        return Err(cx.mismatch(expected, input));
    };
    int_from_number(n).ok_or_else(|| cx.out_of_range(expected, n))
}

fn int_from_number<T: TryFrom<i64> + TryFrom<u64>>(n: &Number) -> Option<T> {
    if let Some(v) = n.as_i64() {
        return T::try_from(v).ok();
    }
    if let Some(v) = n.as_u64() {
        return T::try_from(v).ok();
    }
    let f = n.as_f64()?;
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    // 2^63 and 2^64 are exact in f64.
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    const U64_END: f64 = 18_446_744_073_709_551_616.0;
    if (-I64_END..I64_END).contains(&f) {
        T::try_from(f as i64).ok()
    } else if (0.0..U64_END).contains(&f) {
        T::try_from(f as u64).ok()
    } else {
        None
    }
}

macro_rules! impl_int {
    ($($ty:ident => $variant:ident($wide:ty), $signed:literal;)*) => {$(
        impl Decode for $ty {
            #[inline]
            fn kind() -> FieldKind {
                FieldKind::Primitive(PrimitiveKind::Int {
                    signed: $signed,
                    bits: <$ty>::BITS as u8,
                })
            }

            fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
                *self = int_from_json(input, stringify!($ty), cx)?;
                Ok(Value::$variant(*self as $wide))
            }
        }
    )*};
}

impl_int! {
    i8 => I8(i8), true;
    i16 => I16(i16), true;
    i32 => I32(i32), true;
    i64 => I64(i64), true;
    isize => I64(i64), true;
    u8 => U8(u8), false;
    u16 => U16(u16), false;
    u32 => U32(u32), false;
    u64 => U64(u64), false;
    usize => U64(u64), false;
}

// -----------------------------------------------------------------------------
// Floats

impl Decode for f64 {
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Primitive(PrimitiveKind::Float { bits: 64 })
    }

    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        let JsonValue::Number(n) = input else {
            return Err(cx.mismatch("f64", input));
        };
        *self = n.as_f64().ok_or_else(|| cx.out_of_range("f64", n))?;
        Ok(Value::F64(*self))
    }
}

impl Decode for f32 {
    #[inline]
    fn kind() -> FieldKind {
        FieldKind::Primitive(PrimitiveKind::Float { bits: 32 })
    }

    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError> {
        let JsonValue::Number(n) = input else {
            return Err(cx.mismatch("f32", input));
        };
        let wide = n
            .as_f64()
            .filter(|f| f.abs() <= f64::from(f32::MAX))
            .ok_or_else(|| cx.out_of_range("f32", n))?;
        *self = wide as f32;
        Ok(Value::F32(*self))
    }
}
