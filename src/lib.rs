#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use vc_decode as decode;

pub use vc_decode::{DecodeError, DecodeMode, DecodeOptions, Decoder, Record, Value, ValueMap};
pub use vc_decode::{decode_from_map, decode_into};
