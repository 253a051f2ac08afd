//! Decode a JSON object into a typed record and a generic map at once.
//!
//! A single walk over the document fills both outputs:
//!
//! - the typed record, through the field table generated by
//!   [`#[derive(Record)]`](derive::Record);
//! - a [`ValueMap`] holding every key of the document. Known fields are
//!   mirrored from their typed value, unknown keys are decoded generically.
//!
//! ```
//! use vc_decode::{Record, Value, decode_into, DecodeOptions};
//!
//! #[derive(Record, Default, Debug)]
//! struct Config {
//!     foo: String,
//!     boo: Vec<i32>,
//! }
//!
//! let mut config = Config::default();
//! let raw = br#"{"foo":"bar","boo":[1,2,3],"goo":"untyped"}"#;
//! let map = decode_into(raw, &mut config, &DecodeOptions::default()).unwrap();
//!
//! assert_eq!(config.foo, "bar");
//! assert_eq!(config.boo, [1, 2, 3]);
//! assert_eq!(map["foo"], Value::from("bar"));
//! assert_eq!(map["goo"], Value::from("untyped"));
//! ```
//!
//! How field-level failures propagate is chosen per call with
//! [`DecodeMode`], see [`DecodeOptions`].
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code refers to `::vc_decode`, which must also resolve inside
// this crate for the derive-based tests.
extern crate self as vc_decode;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod assemble;
mod decoder;
mod error;
mod hash;
mod hooks;
mod options;
mod policy;
mod record;
mod resolve;
mod value;

pub mod cache;
pub mod decode;
pub mod descriptor;
pub mod kind;

// -----------------------------------------------------------------------------
// Top-Level exports

pub mod __macro_exports;

pub use decode::{Decode, DecodeContext, MapKey};
pub use decoder::{Decoder, decode_from_map, decode_into};
pub use error::{DecodeError, ErrorAggregate, FieldError, FieldErrorKind, FieldPath};
pub use hash::FixedHashState;
pub use error::{HookError, InputError, PartialDecode, PathSegment, ValueError};
pub use hooks::{CustomDecode, ExtraDataSink};
pub use options::{DecodeMode, DecodeOptions};
pub use record::{Described, FieldMut, Record, RecordPtr};
pub use value::{Value, ValueMap};

pub use serde_json;
/// The raw document representation produced by the tokenizer.
pub use serde_json::Value as JsonValue;
/// One level of a raw document.
pub type JsonMap = serde_json::Map<alloc::string::String, serde_json::Value>;

pub use vc_decode_derive as derive;
pub use vc_decode_derive::Record;
