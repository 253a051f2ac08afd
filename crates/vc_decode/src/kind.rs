//! The closed set of field kinds a descriptor can hold.
//!
//! Each field's kind is computed once, from [`Decode::kind`], when its
//! [`TypeDescriptor`] is built. Decoding never re-derives it per value.
//!
//! [`Decode::kind`]: crate::Decode::kind
//! [`TypeDescriptor`]: crate::descriptor::TypeDescriptor

use alloc::boxed::Box;
use core::fmt;

// -----------------------------------------------------------------------------
// PrimitiveKind

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    /// An integer of `bits` width.
    Int { signed: bool, bits: u8 },
    /// `f32` or `f64`.
    Float { bits: u8 },
    String,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PrimitiveKind::Bool => f.write_str("bool"),
            PrimitiveKind::Int { signed: true, bits } => write!(f, "i{bits}"),
            PrimitiveKind::Int { signed: false, bits } => write!(f, "u{bits}"),
            PrimitiveKind::Float { bits } => write!(f, "f{bits}"),
            PrimitiveKind::String => f.write_str("string"),
        }
    }
}

// -----------------------------------------------------------------------------
// FieldKind

/// What a field holds, as far as decoding is concerned.
///
/// # Examples
///
/// ```
/// use vc_decode::Decode;
/// use vc_decode::kind::{FieldKind, PrimitiveKind};
///
/// let kind = <Vec<Option<u16>>>::kind();
/// assert_eq!(kind.to_string(), "[]*u16");
///
/// let FieldKind::Slice(elem) = kind else { unreachable!() };
/// assert!(matches!(*elem, FieldKind::Pointer(_)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Primitive(PrimitiveKind),
    /// `Option<T>` or `Box<T>`; allocated when a non-null value arrives.
    Pointer(Box<FieldKind>),
    /// A growable sequence, `Vec<T>`.
    Slice(Box<FieldKind>),
    /// A fixed-length sequence, `[T; N]`.
    Array(usize, Box<FieldKind>),
    /// String-keyed map with the given value kind.
    Map(Box<FieldKind>),
    /// A nested record, decoded one level down through its own descriptor.
    Record(&'static str),
    /// A type that decodes itself through [`CustomDecode`](crate::CustomDecode).
    Custom(&'static str),
    /// Holds whatever the document contains, decoded generically.
    Dynamic,
}

impl FieldKind {
    #[inline]
    pub fn is_record(&self) -> bool {
        matches!(self, FieldKind::Record(_))
    }

    #[inline]
    pub fn is_custom(&self) -> bool {
        matches!(self, FieldKind::Custom(_))
    }

    /// Follows pointers down to the pointee kind.
    pub fn pointee(&self) -> &FieldKind {
        let mut kind = self;
        while let FieldKind::Pointer(inner) = kind {
            kind = inner;
        }
        kind
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Primitive(p) => fmt::Display::fmt(p, f),
            FieldKind::Pointer(inner) => write!(f, "*{inner}"),
            FieldKind::Slice(inner) => write!(f, "[]{inner}"),
            FieldKind::Array(len, inner) => write!(f, "[{len}]{inner}"),
            FieldKind::Map(inner) => write!(f, "map[string]{inner}"),
            FieldKind::Record(name) | FieldKind::Custom(name) => f.write_str(name),
            FieldKind::Dynamic => f.write_str("any"),
        }
    }
}
