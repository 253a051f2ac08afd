//! Per-kind decode strategies and the per-level walk.
//!
//! Every field type implements [`Decode`]. The descriptor stores a
//! monomorphized [`decode_slot`] for each field, so the strategy is picked
//! once per type instead of once per value.
//!
//! The null rule lives in [`decode_value`]: a JSON `null` resets the slot
//! to `T::default()` and mirrors as [`Value::Null`], whatever the kind.

// -----------------------------------------------------------------------------
// Modules

mod container;
mod primitive;
pub(crate) mod walk;

pub use container::MapKey;

// -----------------------------------------------------------------------------
// Imports

use alloc::string::ToString;
use alloc::sync::Arc;
use core::any::{Any, type_name};
use core::fmt::Display;

use crate::cache::{DescriptorStore, descriptor_of};
use crate::descriptor::TypeDescriptor;
use crate::error::{FieldError, FieldErrorKind, FieldPath, PathSegment, json_type_name};
use crate::kind::FieldKind;
use crate::policy::ErrorPolicy;
use crate::{DecodeOptions, Described, JsonValue, Value};

// -----------------------------------------------------------------------------
// Decode

/// A field type the engine can decode in place.
///
/// Implemented for primitives, `String`, `Option`, `Box`, `Vec`, arrays,
/// maps, [`Value`] and [`JsonValue`]. Records get it from
/// [`#[derive(Record)]`](crate::derive::Record).
///
/// `decode` is never handed `null` by the engine; see [`decode_value`].
pub trait Decode: Default + 'static {
    /// The kind stored in field descriptors.
    fn kind() -> FieldKind;

    /// Decodes `input` into `self` and returns the value mirrored into the
    /// generic map.
    fn decode(&mut self, input: &JsonValue, cx: &mut DecodeContext<'_>) -> Result<Value, FieldError>;
}

/// Applies the null rule, then `T`'s strategy.
///
/// Container impls call this for each element, so `null` elements reset
/// to their zero value as well.
#[inline]
pub fn decode_value<T: Decode>(
    slot: &mut T,
    input: &JsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<Value, FieldError> {
    if input.is_null() {
        *slot = T::default();
        return Ok(Value::Null);
    }
    slot.decode(input, cx)
}

/// [`decode_value`] one path segment down.
#[inline]
pub(crate) fn decode_element<T: Decode>(
    slot: &mut T,
    input: &JsonValue,
    segment: PathSegment,
    cx: &mut DecodeContext<'_>,
) -> Result<Value, FieldError> {
    cx.scoped(segment, |cx| decode_value(slot, input, cx))
}

pub(crate) fn decode_slot<T: Decode>(
    slot: &mut dyn Any,
    input: &JsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<Value, FieldError> {
    match slot.downcast_mut::<T>() {
        Some(slot) => decode_value(slot, input, cx),
        None => Err(cx.error(FieldErrorKind::Unresolvable(type_name::<T>()))),
    }
}

pub(crate) fn reset_slot<T: Default + 'static>(slot: &mut dyn Any) {
    if let Some(slot) = slot.downcast_mut::<T>() {
        *slot = T::default();
    }
}

// -----------------------------------------------------------------------------
// DecodeContext

/// State shared by every field of one decode call.
///
/// Tracks the path from the document root, so errors raised deep inside
/// containers carry their full location, and the error policy of the call.
pub struct DecodeContext<'a> {
    store: &'a dyn DescriptorStore,
    options: &'a DecodeOptions,
    pub(crate) policy: ErrorPolicy,
    pub(crate) path: FieldPath,
    depth: usize,
}

impl<'a> DecodeContext<'a> {
    pub(crate) fn new(store: &'a dyn DescriptorStore, options: &'a DecodeOptions) -> Self {
        Self {
            store,
            options,
            policy: ErrorPolicy::new(options.mode),
            path: FieldPath::new(),
            depth: 0,
        }
    }

    #[inline]
    pub fn options(&self) -> &DecodeOptions {
        self.options
    }

    /// Location of the value being decoded.
    #[inline]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Number of record levels entered below the top level.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the descriptor of `T` from the call's store.
    #[inline]
    pub fn descriptor<T: Described>(&self) -> Arc<TypeDescriptor> {
        descriptor_of::<T>(self.store)
    }

    /// An error at the current path.
    #[inline]
    pub fn error(&self, kind: FieldErrorKind) -> FieldError {
        FieldError::new(self.path.clone(), kind)
    }

    #[cold]
    pub fn mismatch(&self, expected: &'static str, found: &JsonValue) -> FieldError {
        self.error(FieldErrorKind::Mismatch {
            expected,
            found: json_type_name(found),
        })
    }

    #[cold]
    pub fn out_of_range(&self, expected: &'static str, value: impl Display) -> FieldError {
        self.error(FieldErrorKind::OutOfRange {
            expected,
            value: value.to_string(),
        })
    }

    /// Runs `f` with `segment` appended to the path.
    pub(crate) fn scoped<R>(&mut self, segment: PathSegment, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.path.depth();
        self.path.push(segment);
        let result = f(self);
        self.path.truncate(depth);
        result
    }

    /// Enters a nested record level.
    pub(crate) fn enter(&mut self) -> Result<(), FieldError> {
        if self.depth >= self.options.max_depth {
            return Err(self.error(FieldErrorKind::DepthExceeded(self.options.max_depth)));
        }
        self.depth += 1;
        Ok(())
    }

    #[inline]
    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }

    #[inline]
    pub(crate) fn into_policy(self) -> ErrorPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::{DecodeContext, decode_element, decode_value};
    use crate::cache::NoCache;
    use crate::error::{FieldErrorKind, PathSegment};
    use crate::{DecodeOptions, JsonValue, Value};

    #[test]
    fn null_resets_any_kind() {
        let options = DecodeOptions::default();
        let mut cx = DecodeContext::new(&NoCache, &options);

        let mut text = String::from("old");
        assert_eq!(decode_value(&mut text, &JsonValue::Null, &mut cx).unwrap(), Value::Null);
        assert!(text.is_empty());

        let mut items = vec![1_u8, 2];
        assert_eq!(decode_value(&mut items, &JsonValue::Null, &mut cx).unwrap(), Value::Null);
        assert!(items.is_empty());

        let mut ptr = Some(Box::new(3_i16));
        assert_eq!(decode_value(&mut ptr, &JsonValue::Null, &mut cx).unwrap(), Value::Null);
        assert!(ptr.is_none());
    }

    #[test]
    fn element_errors_carry_their_segment() {
        let options = DecodeOptions::default();
        let mut cx = DecodeContext::new(&NoCache, &options);
        cx.path.push(PathSegment::Field("xs".into()));

        let mut slot = 0_u32;
        let err = decode_element(&mut slot, &JsonValue::from(-1), PathSegment::Index(4), &mut cx)
            .unwrap_err();

        assert_eq!(err.path().to_string(), "xs[4]");
        assert!(matches!(err.kind(), FieldErrorKind::OutOfRange { expected: "u32", .. }));
        // The segment is popped again.
        assert_eq!(cx.path().to_string(), "xs");
    }

    #[test]
    fn depth_limit() {
        let options = DecodeOptions::default().max_depth(1);
        let mut cx = DecodeContext::new(&NoCache, &options);

        cx.enter().unwrap();
        let err = cx.enter().unwrap_err();
        assert!(matches!(err.kind(), FieldErrorKind::DepthExceeded(1)));
        cx.leave();
        assert_eq!(cx.depth(), 0);
    }
}
