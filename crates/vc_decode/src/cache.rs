//! Storage for built [`TypeDescriptor`]s.
//!
//! Building a descriptor is done outside of any lock. Two threads meeting
//! a type for the first time may both build it; [`DescriptorStore::set`]
//! keeps the first entry and hands it back to both, so every caller
//! observes the same descriptor.
//!
//! ## Stores
//!
//! - [`TypeCache`]: a map behind a [`RwLock`]. Decoders usually own one,
//!   [`TypeCache::global`] is shared by the free functions.
//! - [`NoCache`]: keeps nothing, every lookup rebuilds.
//!
//! ## Recursive flattening
//!
//! A record may flatten itself or an enclosing record through
//! `Option<Box<_>>`. Promotion stops at a type whose descriptor is already
//! being built on this thread. Descriptors built inside such a cycle only
//! hold part of their fields, so they are returned without being stored.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};
use core::cell::RefCell;
use std::sync::{PoisonError, RwLock};

use crate::Described;
use crate::descriptor::TypeDescriptor;
use crate::hash::{TypeIdHashState, TypeIdMap};

// -----------------------------------------------------------------------------
// DescriptorStore

/// Where descriptors are kept between calls.
pub trait DescriptorStore: Send + Sync {
    fn get(&self, type_id: TypeId) -> Option<Arc<TypeDescriptor>>;

    /// Stores `descriptor` unless an entry already exists, and returns the
    /// entry that is now current.
    fn set(&self, type_id: TypeId, descriptor: Arc<TypeDescriptor>) -> Arc<TypeDescriptor>;
}

impl<S: DescriptorStore + ?Sized> DescriptorStore for &S {
    #[inline]
    fn get(&self, type_id: TypeId) -> Option<Arc<TypeDescriptor>> {
        (**self).get(type_id)
    }

    #[inline]
    fn set(&self, type_id: TypeId, descriptor: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        (**self).set(type_id, descriptor)
    }
}

impl<S: DescriptorStore + ?Sized> DescriptorStore for Arc<S> {
    #[inline]
    fn get(&self, type_id: TypeId) -> Option<Arc<TypeDescriptor>> {
        (**self).get(type_id)
    }

    #[inline]
    fn set(&self, type_id: TypeId, descriptor: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        (**self).set(type_id, descriptor)
    }
}

/// Returns the descriptor of `T`, building and storing it on first use.
///
/// # Examples
///
/// ```
/// use vc_decode::Record;
/// use vc_decode::cache::{TypeCache, descriptor_of};
///
/// #[derive(Record, Default)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// let cache = TypeCache::new();
/// let first = descriptor_of::<Point>(&cache);
/// let again = descriptor_of::<Point>(&cache);
///
/// assert!(std::sync::Arc::ptr_eq(&first, &again));
/// assert_eq!(first.len(), 2);
/// ```
pub fn descriptor_of<T: Described>(store: &dyn DescriptorStore) -> Arc<TypeDescriptor> {
    let type_id = TypeId::of::<T>();
    if let Some(descriptor) = store.get(type_id) {
        return descriptor;
    }

    log::debug!("building type descriptor for `{}`", type_name::<T>());
    BUILDING.with_borrow_mut(|stack| stack.push(Building { type_id, partial: false }));
    let built = Arc::new(T::build_descriptor(store));
    let partial = BUILDING
        .with_borrow_mut(Vec::pop)
        .is_some_and(|frame| frame.partial);

    if partial {
        log::debug!("`{}` was built inside a flatten cycle, not stored", type_name::<T>());
        return built;
    }
    store.set(type_id, built)
}

struct Building {
    type_id: TypeId,
    partial: bool,
}

std::thread_local! {
    // Descriptors under construction on this thread, outermost first.
    static BUILDING: RefCell<Vec<Building>> = const { RefCell::new(Vec::new()) };
}

/// Returns `true` if the descriptor of `type_id` is being built on this
/// thread, so flattening it again would never end.
///
/// Every build nested inside that one is marked partial.
pub(crate) fn is_building(type_id: TypeId) -> bool {
    BUILDING.with_borrow_mut(|stack| {
        let Some(pos) = stack.iter().position(|frame| frame.type_id == type_id) else {
            return false;
        };
        for frame in &mut stack[pos + 1..] {
            frame.partial = true;
        }
        true
    })
}

// -----------------------------------------------------------------------------
// TypeCache

/// A thread-safe descriptor cache.
pub struct TypeCache(RwLock<TypeIdMap<Arc<TypeDescriptor>>>);

impl TypeCache {
    /// Creates an empty cache.
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::with_hasher(TypeIdHashState)))
    }

    /// The process-wide cache used by [`decode_into`](crate::decode_into)
    /// and [`decode_from_map`](crate::decode_from_map).
    #[inline]
    pub fn global() -> &'static TypeCache {
        static GLOBAL: TypeCache = TypeCache::new();
        &GLOBAL
    }

    /// Number of cached descriptors.
    pub fn len(&self) -> usize {
        self.0.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.get(type_id).is_some()
    }

    /// Drops every cached descriptor. Descriptors held elsewhere stay valid.
    pub fn clear(&self) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Builds the descriptors of all types marked `#[record(auto_register)]`.
    ///
    /// Returns the number of registrations that ran. Repeated calls are
    /// cheap: already cached types are not rebuilt.
    ///
    /// Without the `auto_register` feature this does nothing and returns `0`.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&self) -> usize {
        #[cfg(feature = "auto_register")]
        {
            crate::__macro_exports::auto_register::register_types(self)
        }
        #[cfg(not(feature = "auto_register"))]
        {
            0
        }
    }
}

impl Default for TypeCache {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorStore for TypeCache {
    fn get(&self, type_id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned()
    }

    fn set(&self, type_id: TypeId, descriptor: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(type_id)
            .or_insert(descriptor)
            .clone()
    }
}

impl core::fmt::Debug for TypeCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeCache").field("len", &self.len()).finish()
    }
}

// -----------------------------------------------------------------------------
// NoCache

/// A store that never keeps anything: caching disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl DescriptorStore for NoCache {
    #[inline]
    fn get(&self, _type_id: TypeId) -> Option<Arc<TypeDescriptor>> {
        None
    }

    #[inline]
    fn set(&self, _type_id: TypeId, descriptor: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        descriptor
    }
}
