//! Items used by the code generated by `#[derive(Record)]`. Not public API.

use core::any::type_name;

pub use crate::cache::DescriptorStore;
pub use crate::descriptor::{DescriptorBuilder, TypeDescriptor};
pub use crate::kind::FieldKind;

use crate::error::{FieldError, FieldErrorKind};
use crate::{CustomDecode, DecodeContext, Described, JsonValue, Value};

#[inline]
pub fn record_kind<T: Described>() -> FieldKind {
    FieldKind::Record(type_name::<T>())
}

#[inline]
pub fn custom_kind<T: CustomDecode>() -> FieldKind {
    FieldKind::Custom(type_name::<T>())
}

/// `Decode::decode` of a derived record.
#[inline]
pub fn decode_record<T: Described>(
    record: &mut T,
    input: &JsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<Value, FieldError> {
    crate::decode::walk::decode_nested(record, input, cx)
}

/// `Decode::decode` of a derived `#[record(custom)]` record.
#[inline]
pub fn decode_custom<T: CustomDecode>(
    record: &mut T,
    input: &JsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<Value, FieldError> {
    record
        .decode_custom(input)
        .map_err(|e| cx.error(FieldErrorKind::Hook(e)))
}

#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    use crate::Described;
    use crate::cache::{TypeCache, descriptor_of};

    /// A registration submitted by `#[record(auto_register)]`.
    pub struct __AutoRegisterFunc(pub fn(&TypeCache));

    inventory::collect!(__AutoRegisterFunc);

    pub trait __RegisterType {
        fn __register(cache: &TypeCache);
    }

    impl<T: Described> __RegisterType for T {
        #[inline]
        fn __register(cache: &TypeCache) {
            descriptor_of::<T>(cache);
        }
    }

    pub(crate) fn register_types(cache: &TypeCache) -> usize {
        let mut count = 0;
        for func in inventory::iter::<__AutoRegisterFunc> {
            (func.0)(cache);
            count += 1;
        }
        log::debug!("auto registration ran {count} record type(s)");
        count
    }
}
