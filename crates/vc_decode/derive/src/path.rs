//! Paths used by the generated code.
//!
//! Everything goes through `vc_decode::__macro_exports` or the crate root,
//! so only this module changes when `vc_decode` is reorganized.

use proc_macro2::TokenStream;
use quote::quote;

/// Get the access path to the `vc_decode` crate.
///
/// 1. For crates that depend on `vc_decode`, `::vc_decode` is returned.
/// 2. For crates that depend on `vc_twin`, `::vc_twin::decode` is returned.
/// 3. For other situations, `::vc_decode` is returned, but this may be incorrect.
///
/// Reading the manifest is costly; call once per derive and pass it along.
pub(crate) fn vc_decode() -> syn::Path {
    vc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("vc_decode"))
}

#[inline(always)]
pub(crate) fn macro_exports_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::__macro_exports
    }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::__macro_exports::auto_register
    }
}

#[inline(always)]
pub(crate) fn record_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::Record
    }
}

#[inline(always)]
pub(crate) fn described_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::Described
    }
}

#[inline(always)]
pub(crate) fn decode_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::Decode
    }
}

#[inline(always)]
pub(crate) fn custom_decode_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::CustomDecode
    }
}

#[inline(always)]
pub(crate) fn extra_data_sink_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::ExtraDataSink
    }
}

#[inline(always)]
pub(crate) fn field_mut_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::FieldMut
    }
}

#[inline(always)]
pub(crate) fn decode_context_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::DecodeContext
    }
}

#[inline(always)]
pub(crate) fn field_error_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::FieldError
    }
}

#[inline(always)]
pub(crate) fn value_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::Value
    }
}

#[inline(always)]
pub(crate) fn json_value_(vc_decode_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_decode_path::JsonValue
    }
}
