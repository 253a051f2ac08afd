//! Turns an [`AccessPath`] into a settable slot.

use core::any::Any;

use crate::descriptor::AccessPath;
use crate::{FieldMut, Record};

/// Walks `path` from `record` down to its leaf slot.
///
/// Embedded `Option<Box<T>>` records crossed on the way are allocated
/// with `T::default()` if absent. Returns `None` if the path does not
/// match the record's layout.
pub(crate) fn resolve<'r>(record: &'r mut dyn Record, path: &AccessPath) -> Option<&'r mut dyn Any> {
    let (leaf, embedded) = path.steps().split_last()?;

    let mut current = record;
    for step in embedded {
        current = match current.field_mut(step.index)? {
            FieldMut::Record(inner) => inner,
            FieldMut::Optional(ptr) => ptr.get_or_alloc(),
            FieldMut::Value(_) => return None,
        };
    }

    match current.field_mut(leaf.index)? {
        FieldMut::Value(slot) => Some(slot),
        FieldMut::Record(_) | FieldMut::Optional(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;

    use super::resolve;
    use crate::cache::{NoCache, descriptor_of};
    use crate::{Record, RecordPtr};

    #[derive(Record, Default)]
    struct Inner {
        tag: String,
    }

    #[derive(Record, Default)]
    struct Middle {
        #[record(flatten)]
        inner: Option<Box<Inner>>,
        count: u32,
    }

    #[derive(Record, Default)]
    struct Outer {
        #[record(flatten)]
        middle: Middle,
    }

    #[test]
    fn direct_slot() {
        let desc = descriptor_of::<Middle>(&NoCache);
        let mut record = Middle::default();

        let slot = resolve(&mut record, desc.field("count").unwrap().access_path()).unwrap();
        *slot.downcast_mut::<u32>().unwrap() = 5;
        assert_eq!(record.count, 5);
        assert!(!record.inner.is_allocated());
    }

    #[test]
    fn allocates_through_embedded_pointer() {
        let desc = descriptor_of::<Outer>(&NoCache);
        let mut record = Outer::default();
        let tag = desc.field("tag").unwrap();
        assert_eq!(tag.access_path().steps().len(), 3);

        let slot = resolve(&mut record, tag.access_path()).unwrap();
        *slot.downcast_mut::<String>().unwrap() = String::from("x");

        let inner = record.middle.inner.as_ref().unwrap();
        assert_eq!(inner.tag, "x");
    }

    #[test]
    fn mismatched_path_is_none() {
        let desc = descriptor_of::<Outer>(&NoCache);
        let mut other = Inner::default();
        // `Inner` has a single field, the three-step path cannot resolve.
        assert!(resolve(&mut other, desc.field("tag").unwrap().access_path()).is_none());
    }
}
