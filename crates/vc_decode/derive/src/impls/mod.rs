//! Code generation for `#[derive(Record)]`.

mod auto_register;
mod trait_decode;
mod trait_described;
mod trait_record;

use proc_macro2::TokenStream;
use quote::quote;
use syn::WherePredicate;

use crate::derive_data::{FieldShape, RecordData};

pub(crate) fn impl_record(data: &RecordData) -> TokenStream {
    let record = trait_record::impl_trait_record(data);
    let described = trait_described::impl_trait_described(data);
    let decode = trait_decode::impl_trait_decode(data);
    let auto_register = auto_register::get_auto_register_impl(data);

    quote! {
        const _: () = {
            #record
            #described
            #decode
        };

        #auto_register
    }
}

/// `where` predicates shared by the generated impls.
///
/// Non-generic types need none: their field types are checked where
/// they are used. Generic types get one bound per field type.
pub(crate) fn where_predicates(data: &RecordData) -> Vec<WherePredicate> {
    if !data.impl_with_generic() {
        return Vec::new();
    }

    let vc_decode_path = data.vc_decode_path();
    let decode_ = crate::path::decode_(vc_decode_path);
    let described_ = crate::path::described_(vc_decode_path);
    let custom_decode_ = crate::path::custom_decode_(vc_decode_path);

    let mut predicates: Vec<WherePredicate> = data
        .generics
        .type_params()
        .map(|param| {
            let ident = &param.ident;
            syn::parse_quote!(#ident: 'static)
        })
        .collect();
    predicates.push(syn::parse_quote!(Self: ::core::default::Default));

    for field in &data.fields {
        let ty = &field.ty;
        let predicate: WherePredicate = match &field.shape {
            FieldShape::Value { .. } => syn::parse_quote!(#ty: #decode_),
            FieldShape::Custom { .. } => syn::parse_quote!(
                #ty: #custom_decode_ + ::core::default::Default + 'static
            ),
            FieldShape::Flatten { inner }
            | FieldShape::FlattenBoxed { inner }
            | FieldShape::FlattenOptional { inner } => syn::parse_quote!(#inner: #described_),
        };
        predicates.push(predicate);
    }
    predicates
}

/// The impl header pieces with `extra` appended to the where clause.
pub(crate) fn where_clause_with(
    data: &RecordData,
    extra: impl IntoIterator<Item = WherePredicate>,
) -> TokenStream {
    let mut predicates: Vec<WherePredicate> = data
        .generics
        .where_clause
        .iter()
        .flat_map(|clause| clause.predicates.iter().cloned())
        .collect();
    predicates.extend(where_predicates(data));
    predicates.extend(extra);

    if predicates.is_empty() {
        TokenStream::new()
    } else {
        quote! { where #(#predicates,)* }
    }
}
