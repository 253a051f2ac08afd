use alloc::boxed::Box;
use core::any::Any;

use crate::cache::DescriptorStore;
use crate::descriptor::TypeDescriptor;

// -----------------------------------------------------------------------------
// Record

/// Mutable access to a record's fields by declaration index.
///
/// This is the only runtime reflection the engine needs: descriptors store
/// index paths, and [`Record::field_mut`] walks one step of such a path.
///
/// Implemented by [`#[derive(Record)]`](crate::derive::Record); manual
/// implementations must agree with the indices used in
/// [`Described::build_descriptor`].
pub trait Record: Any + 'static {
    /// Returns the field at `index`, or `None` if no such field takes part
    /// in decoding.
    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn record_type_name(&self) -> &'static str;
}

/// One field of a record, as returned by [`Record::field_mut`].
pub enum FieldMut<'a> {
    /// A leaf slot decoded by the field's strategy.
    Value(&'a mut dyn Any),
    /// An embedded record stored inline or in a `Box`.
    Record(&'a mut dyn Record),
    /// An embedded record behind `Option<Box<T>>`, allocated on first use.
    Optional(&'a mut dyn RecordPtr),
}

/// An optional, heap-allocated embedded record.
pub trait RecordPtr {
    /// Returns the pointee, allocating a default value if absent.
    fn get_or_alloc(&mut self) -> &mut dyn Record;

    fn is_allocated(&self) -> bool;
}

impl<T: Described> RecordPtr for Option<Box<T>> {
    #[inline]
    fn get_or_alloc(&mut self) -> &mut dyn Record {
        self.get_or_insert_with(Box::default).as_mut()
    }

    #[inline]
    fn is_allocated(&self) -> bool {
        self.is_some()
    }
}

// -----------------------------------------------------------------------------
// Described

/// A record type able to describe its own field table.
///
/// The descriptor is built at most once per store, see
/// [`descriptor_of`](crate::cache::descriptor_of).
pub trait Described: Record + Default {
    /// Builds the descriptor. `store` resolves the descriptors of
    /// flattened records.
    fn build_descriptor(store: &dyn DescriptorStore) -> TypeDescriptor;
}
