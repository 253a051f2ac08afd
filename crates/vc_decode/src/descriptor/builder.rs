use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId, type_name};
use core::marker::PhantomData;

use super::{AccessPath, FieldDescriptor, FieldStrategy, Hooks, PathStep, TypeDescriptor};
use crate::cache::{DescriptorStore, descriptor_of, is_building};
use crate::decode::{decode_slot, reset_slot};
use crate::hash::HashMap;
use crate::hooks::{custom_record, custom_slot, extra_sink};
use crate::kind::FieldKind;
use crate::{CustomDecode, Decode, Described, ExtraDataSink, Record};

/// Assembles the [`TypeDescriptor`] of record type `T`.
///
/// Used by the code generated by [`#[derive(Record)]`](crate::derive::Record):
///
/// ```ignore
/// DescriptorBuilder::<Self>::new(store)
///     .field::<String>(0, "foo")
///     .flatten::<Base>(1, false)
///     .custom::<Timestamp>(2, "when")
///     .extra_sink()
///     .build()
/// ```
///
/// `flatten` promotes the fields of an embedded record into `T`. When
/// several fields end up with the same name, the least nested one wins;
/// if there is a tie at that depth, every field with that name is dropped.
pub struct DescriptorBuilder<'s, T> {
    store: &'s dyn DescriptorStore,
    fields: Vec<FieldDescriptor>,
    hooks: Hooks,
    _marker: PhantomData<fn() -> T>,
}

impl<'s, T: Described> DescriptorBuilder<'s, T> {
    #[inline]
    pub fn new(store: &'s dyn DescriptorStore) -> Self {
        Self {
            store,
            fields: Vec::new(),
            hooks: Hooks::default(),
            _marker: PhantomData,
        }
    }

    /// Adds a field decoded through `F`'s [`Decode`] impl.
    pub fn field<F: Decode>(mut self, index: usize, name: &str) -> Self {
        self.fields.push(FieldDescriptor::new(
            name.into(),
            AccessPath::leaf(index),
            F::kind(),
            FieldStrategy::Default(decode_slot::<F>),
            reset_slot::<F>,
        ));
        self
    }

    /// Adds a field decoded entirely by `F`'s [`CustomDecode`] impl.
    pub fn custom<F: CustomDecode + Default + Any>(mut self, index: usize, name: &str) -> Self {
        self.fields.push(FieldDescriptor::new(
            name.into(),
            AccessPath::leaf(index),
            FieldKind::Custom(type_name::<F>()),
            FieldStrategy::Custom(custom_slot::<F>),
            reset_slot::<F>,
        ));
        self
    }

    /// Promotes the fields of the embedded record `R` stored at `index`.
    ///
    /// `alloc` marks an `Option<Box<R>>` field.
    ///
    /// Nothing is promoted when `R` is `T` itself or a record already
    /// being flattened into `T`.
    pub fn flatten<R: Described>(mut self, index: usize, alloc: bool) -> Self {
        if is_building(TypeId::of::<R>()) {
            log::debug!(
                "`{}`: not flattening `{}` at field {index}, recursive embedding",
                type_name::<T>(),
                type_name::<R>(),
            );
            return self;
        }
        let inner = descriptor_of::<R>(self.store);
        let step = PathStep { index, alloc };
        self.fields
            .extend(inner.fields().iter().map(|field| field.promoted(step)));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        let fields = resolve_promotions(self.fields, type_name::<T>());

        let mut index = HashMap::with_capacity_and_hasher(fields.len(), Default::default());
        for (i, field) in fields.iter().enumerate() {
            index.insert(field.name.clone(), i);
        }

        TypeDescriptor {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            fields: fields.into_boxed_slice(),
            index,
            hooks: self.hooks,
            scratch: scratch::<T>,
            downcast: downcast::<T>,
        }
    }
}

impl<T: Described + ExtraDataSink> DescriptorBuilder<'_, T> {
    /// Delivers each level's unknown keys to `T`'s [`ExtraDataSink`] impl.
    #[inline]
    pub fn extra_sink(mut self) -> Self {
        self.hooks.extra_sink = Some(extra_sink::<T>);
        self
    }
}

impl<T: Described + CustomDecode> DescriptorBuilder<'_, T> {
    /// Decodes `T` entirely through its [`CustomDecode`] impl.
    #[inline]
    pub fn custom_decodable(mut self) -> Self {
        self.hooks.custom = Some(custom_record::<T>);
        self
    }
}

// Keeps, for every name, the single least nested field.
fn resolve_promotions(fields: Vec<FieldDescriptor>, owner: &str) -> Vec<FieldDescriptor> {
    let keep: Vec<bool> = {
        // name -> (min depth, fields at that depth)
        let mut best: HashMap<&str, (usize, usize)> = HashMap::default();
        for field in &fields {
            best.entry(&*field.name)
                .and_modify(|(depth, count)| {
                    if field.depth < *depth {
                        *depth = field.depth;
                        *count = 1;
                    } else if field.depth == *depth {
                        *count += 1;
                    }
                })
                .or_insert((field.depth, 1));
        }
        fields
            .iter()
            .map(|field| best[&*field.name] == (field.depth, 1))
            .collect()
    };

    fields
        .into_iter()
        .zip(keep)
        .filter_map(|(field, keep)| {
            if !keep {
                log::debug!(
                    "`{owner}`: dropping field `{}` at promotion depth {}, shadowed or ambiguous",
                    field.name,
                    field.depth,
                );
            }
            keep.then_some(field)
        })
        .collect()
}

fn scratch<T: Described>() -> Box<dyn Record> {
    Box::new(T::default())
}

fn downcast<T: Described>(target: &mut dyn Any) -> Option<&mut dyn Record> {
    target
        .downcast_mut::<T>()
        .map(|record| record as &mut dyn Record)
}
