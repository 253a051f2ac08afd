//! See [`Record`].
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static RECORD_ATTRIBUTE_NAME: &str = "record";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Record Derivation
///
/// `#[derive(Record)]` implements `Record`, `Described` and `Decode` for a
/// struct with named fields, so it can be a decode target or a field of
/// another record. The type must also implement `Default`.
///
/// Each field is decoded through its type's `Decode` impl under its own
/// name, unless an attribute says otherwise.
///
/// ## Field Attributes
///
/// - `rename = "..."`: the serialized name.
/// - `skip`: the field is never decoded; its key is treated as unknown.
/// - `flatten`: the fields of an embedded record are promoted into this
///   one. Allowed on `T`, `Box<T>` and `Option<Box<T>>` where `T` is a
///   record; the `Option` is allocated on first use. A direct field wins
///   over a promoted field with the same name.
/// - `custom`: the field type implements `CustomDecode` and decodes itself.
///
/// ```rust, ignore
/// #[derive(Record, Default)]
/// struct Event {
///     #[record(rename = "type")]
///     kind: String,
///     #[record(flatten)]
///     meta: Meta,
///     #[record(custom)]
///     at: Timestamp,
///     #[record(skip)]
///     cached: Option<usize>,
/// }
/// ```
///
/// Two direct fields with the same serialized name are rejected.
///
/// ## Type Attributes
///
/// - `extra_sink`: the type implements `ExtraDataSink` and receives the
///   unknown keys of each level it is decoded at.
/// - `custom`: the type implements `CustomDecode` and decodes itself
///   entirely, wherever it appears.
/// - `auto_register`: submit the type for `TypeCache::auto_register`.
///   Ignored for generic types and when the `auto_register` feature is
///   disabled.
///
/// ```rust, ignore
/// #[derive(Record, Default)]
/// #[record(extra_sink, auto_register)]
/// struct Plugin {
///     name: String,
///     #[record(skip)]
///     rest: ValueMap,
/// }
///
/// impl ExtraDataSink for Plugin {
///     fn accept_extra(&mut self, extra: ValueMap) -> Result<(), HookError> {
///         self.rest = extra;
///         Ok(())
///     }
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match derive_data::RecordData::parse(&ast) {
        Ok(data) => impls::impl_record(&data).into(),
        Err(err) => err.into_compile_error().into(),
    }
}
