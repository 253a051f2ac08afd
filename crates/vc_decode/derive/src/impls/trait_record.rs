use quote::quote;

use crate::derive_data::{FieldShape, RecordData};

/// Generates the `Record` impl: index-based field access.
pub(crate) fn impl_trait_record(data: &RecordData) -> proc_macro2::TokenStream {
    let vc_decode_path = data.vc_decode_path();
    let record_ = crate::path::record_(vc_decode_path);
    let field_mut_ = crate::path::field_mut_(vc_decode_path);

    let ident = data.ident;
    let (impl_generics, ty_generics, _) = data.generics.split_for_impl();
    let where_clause = super::where_clause_with(data, []);

    let arms = data.fields.iter().map(|field| {
        let index = field.index;
        let member = &field.ident;
        let access = match &field.shape {
            FieldShape::Value { .. } | FieldShape::Custom { .. } => {
                quote! { #field_mut_::Value(&mut self.#member) }
            }
            FieldShape::Flatten { .. } => quote! { #field_mut_::Record(&mut self.#member) },
            FieldShape::FlattenBoxed { .. } => quote! { #field_mut_::Record(&mut *self.#member) },
            FieldShape::FlattenOptional { .. } => {
                quote! { #field_mut_::Optional(&mut self.#member) }
            }
        };
        quote! { #index => ::core::option::Option::Some(#access), }
    });

    quote! {
        impl #impl_generics #record_ for #ident #ty_generics #where_clause {
            fn field_mut(&mut self, index: usize) -> ::core::option::Option<#field_mut_<'_>> {
                match index {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #[inline]
            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            #[inline]
            fn record_type_name(&self) -> &'static str {
                ::core::any::type_name::<Self>()
            }
        }
    }
}
