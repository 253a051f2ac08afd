//! Optional per-type hooks and the thunks stored in descriptors.
//!
//! A type opts into a hook by implementing the trait and marking itself
//! with `#[record(extra_sink)]` or `#[record(custom)]`. The derive then
//! registers a thunk on the descriptor, so capability detection happens
//! once per type, not per value.

use alloc::format;
use core::any::{Any, type_name};

use crate::error::HookError;
use crate::{JsonValue, Record, Value, ValueMap};

// -----------------------------------------------------------------------------
// Traits

/// A type that decodes itself, bypassing the default strategies.
///
/// The returned [`Value`] is stored in the generic map in place of the
/// raw input.
///
/// # Examples
///
/// ```
/// use vc_decode::{CustomDecode, HookError, JsonValue, Value};
///
/// /// `"HH:MM"` stored as minutes.
/// #[derive(Default)]
/// struct Clock(u16);
///
/// impl CustomDecode for Clock {
///     fn decode_custom(&mut self, raw: &JsonValue) -> Result<Value, HookError> {
///         let text = raw.as_str().ok_or_else(|| HookError::new("expected a string"))?;
///         let (h, m) = text.split_once(':').ok_or_else(|| HookError::new("missing `:`"))?;
///         let h: u16 = h.parse().map_err(HookError::from_source)?;
///         let m: u16 = m.parse().map_err(HookError::from_source)?;
///         self.0 = h * 60 + m;
///         Ok(Value::U16(self.0))
///     }
/// }
///
/// let mut clock = Clock::default();
/// let mirror = clock.decode_custom(&JsonValue::from("01:30")).unwrap();
/// assert_eq!(mirror, Value::U16(90));
/// ```
pub trait CustomDecode {
    fn decode_custom(&mut self, raw: &JsonValue) -> Result<Value, HookError>;
}

/// A record collecting the keys of its level that match no field.
///
/// Called once per decoded level, after every key of that level has been
/// processed, with the generic decode of the unknown keys. It is called
/// even when there were none.
///
/// With [`skip_populate`](crate::DecodeOptions::skip_populate) the walk
/// runs on a scratch record the caller never sees, and so does the sink:
/// side effects of the hook are lost for those calls.
pub trait ExtraDataSink {
    fn accept_extra(&mut self, extra: ValueMap) -> Result<(), HookError>;
}

// -----------------------------------------------------------------------------
// Thunks

pub(crate) fn custom_slot<F: CustomDecode + Any>(
    slot: &mut dyn Any,
    raw: &JsonValue,
) -> Result<Value, HookError> {
    match slot.downcast_mut::<F>() {
        Some(value) => value.decode_custom(raw),
        None => Err(slot_mismatch::<F>()),
    }
}

pub(crate) fn extra_sink<T: ExtraDataSink + Record>(
    record: &mut dyn Record,
    extra: ValueMap,
) -> Result<(), HookError> {
    match record.as_any_mut().downcast_mut::<T>() {
        Some(record) => record.accept_extra(extra),
        None => Err(slot_mismatch::<T>()),
    }
}

pub(crate) fn custom_record<T: CustomDecode + Record>(
    record: &mut dyn Record,
    raw: &JsonValue,
) -> Result<Value, HookError> {
    match record.as_any_mut().downcast_mut::<T>() {
        Some(record) => record.decode_custom(raw),
        None => Err(slot_mismatch::<T>()),
    }
}

#[cold]
fn slot_mismatch<T>() -> HookError {
    HookError::new(format!("hook target is not a `{}`", type_name::<T>()))
}
