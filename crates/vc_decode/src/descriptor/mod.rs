//! Per-type field tables.
//!
//! A [`TypeDescriptor`] is built once per record type, see
//! [`descriptor_of`](crate::cache::descriptor_of), and never changes
//! afterwards. Flattened records are already merged into it, so looking
//! a key up is a single map access.

// -----------------------------------------------------------------------------
// Modules

mod builder;

pub use builder::DescriptorBuilder;

// -----------------------------------------------------------------------------
// Imports

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use crate::error::{FieldError, HookError};
use crate::hash::HashMap;
use crate::kind::FieldKind;
use crate::{DecodeContext, JsonValue, Record, Value, ValueMap};

// -----------------------------------------------------------------------------
// Function pointers

/// Decodes a leaf slot in place and returns its mirror value.
pub(crate) type DecodeFn =
    fn(&mut dyn Any, &JsonValue, &mut DecodeContext<'_>) -> Result<Value, FieldError>;

/// Hands a leaf slot to its [`CustomDecode`](crate::CustomDecode) impl.
pub(crate) type CustomFn = fn(&mut dyn Any, &JsonValue) -> Result<Value, HookError>;

/// Resets a leaf slot to its zero value.
pub(crate) type ResetFn = fn(&mut dyn Any);

pub(crate) type ExtraSinkFn = fn(&mut dyn Record, ValueMap) -> Result<(), HookError>;

pub(crate) type CustomRecordFn = fn(&mut dyn Record, &JsonValue) -> Result<Value, HookError>;

// -----------------------------------------------------------------------------
// AccessPath

/// One step of an [`AccessPath`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathStep {
    /// Declaration index passed to [`Record::field_mut`].
    pub index: usize,
    /// The step crosses an `Option<Box<T>>` that is allocated on first use.
    pub alloc: bool,
}

/// Field indices leading from a record to a leaf slot.
///
/// All steps but the last cross embedded records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessPath(Vec<PathStep>);

impl AccessPath {
    #[inline]
    pub(crate) fn leaf(index: usize) -> Self {
        Self(alloc::vec![PathStep { index, alloc: false }])
    }

    /// Returns this path as seen from the record embedding its owner.
    pub(crate) fn prefixed(&self, step: PathStep) -> Self {
        let mut steps = Vec::with_capacity(self.0.len() + 1);
        steps.push(step);
        steps.extend_from_slice(&self.0);
        Self(steps)
    }

    #[inline]
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Returns `true` if resolving this path may allocate.
    #[inline]
    pub fn allocates(&self) -> bool {
        self.0.iter().any(|step| step.alloc)
    }
}

// -----------------------------------------------------------------------------
// FieldDescriptor

#[derive(Clone, Copy)]
pub(crate) enum FieldStrategy {
    Default(DecodeFn),
    Custom(CustomFn),
}

/// One decodable field: serialized name, location and kind.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: Box<str>,
    path: AccessPath,
    kind: FieldKind,
    strategy: FieldStrategy,
    reset: ResetFn,
    // Number of flattened records crossed to reach the field.
    depth: usize,
}

impl FieldDescriptor {
    #[inline]
    pub(crate) fn new(
        name: Box<str>,
        path: AccessPath,
        kind: FieldKind,
        strategy: FieldStrategy,
        reset: ResetFn,
    ) -> Self {
        Self {
            name,
            path,
            kind,
            strategy,
            reset,
            depth: 0,
        }
    }

    /// Returns the serialized name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn access_path(&self) -> &AccessPath {
        &self.path
    }

    #[inline]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Returns `true` if the field bypasses the default strategies.
    #[inline]
    pub fn has_custom_decoder(&self) -> bool {
        matches!(self.strategy, FieldStrategy::Custom(_)) || self.kind.is_custom()
    }

    /// Number of flattened records between the owner and this field.
    #[inline]
    pub fn promotion_depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub(crate) fn strategy(&self) -> FieldStrategy {
        self.strategy
    }

    #[inline]
    pub(crate) fn reset(&self, slot: &mut dyn Any) {
        (self.reset)(slot);
    }

    #[inline]
    pub(crate) fn promoted(&self, step: PathStep) -> Self {
        Self {
            path: self.path.prefixed(step),
            depth: self.depth + 1,
            ..self.clone()
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("custom", &self.has_custom_decoder())
            .field("depth", &self.depth)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Hooks

/// Optional per-type hooks, detected when the descriptor is built.
#[derive(Clone, Copy, Default)]
pub struct Hooks {
    pub(crate) extra_sink: Option<ExtraSinkFn>,
    pub(crate) custom: Option<CustomRecordFn>,
}

impl Hooks {
    /// The type implements [`ExtraDataSink`](crate::ExtraDataSink).
    #[inline]
    pub fn has_extra_sink(&self) -> bool {
        self.extra_sink.is_some()
    }

    /// The type decodes itself through [`CustomDecode`](crate::CustomDecode).
    #[inline]
    pub fn is_custom_decodable(&self) -> bool {
        self.custom.is_some()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("extra_sink", &self.has_extra_sink())
            .field("custom", &self.is_custom_decodable())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// The field table and hooks of one record type.
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    fields: Box<[FieldDescriptor]>,
    index: HashMap<Box<str>, usize>,
    hooks: Hooks,
    scratch: fn() -> Box<dyn Record>,
    downcast: fn(&mut dyn Any) -> Option<&mut dyn Record>,
}

impl TypeDescriptor {
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in declaration order, flattened fields in place of their
    /// embedding field.
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Finds a field by exact serialized name.
    #[inline]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Finds a field ignoring ASCII case; an exact match wins.
    pub fn field_ignore_case(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field(name).or_else(|| {
            self.fields
                .iter()
                .find(|field| field.name.eq_ignore_ascii_case(name))
        })
    }

    /// A fresh default instance, used when the caller's record must stay untouched.
    #[inline]
    pub(crate) fn new_scratch(&self) -> Box<dyn Record> {
        (self.scratch)()
    }

    /// Views `target` as this descriptor's record type.
    #[inline]
    pub(crate) fn downcast<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Record> {
        (self.downcast)(target)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("hooks", &self.hooks)
            .finish()
    }
}
