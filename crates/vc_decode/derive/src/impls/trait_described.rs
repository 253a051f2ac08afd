use quote::quote;

use crate::derive_data::{FieldShape, RecordData};

/// Generates the `Described` impl: the descriptor builder chain.
pub(crate) fn impl_trait_described(data: &RecordData) -> proc_macro2::TokenStream {
    let vc_decode_path = data.vc_decode_path();
    let described_ = crate::path::described_(vc_decode_path);
    let macro_exports_ = crate::path::macro_exports_(vc_decode_path);

    let ident = data.ident;
    let (impl_generics, ty_generics, _) = data.generics.split_for_impl();

    let mut extra: Vec<syn::WherePredicate> = Vec::new();
    if data.attrs.extra_sink.is_some() {
        let extra_data_sink_ = crate::path::extra_data_sink_(vc_decode_path);
        extra.push(syn::parse_quote!(Self: #extra_data_sink_));
    }
    if data.attrs.custom.is_some() {
        let custom_decode_ = crate::path::custom_decode_(vc_decode_path);
        extra.push(syn::parse_quote!(Self: #custom_decode_));
    }
    let where_clause = super::where_clause_with(data, extra);

    let steps = data.fields.iter().map(|field| {
        let index = field.index;
        let ty = &field.ty;
        match &field.shape {
            FieldShape::Value { name } => quote! { .field::<#ty>(#index, #name) },
            FieldShape::Custom { name } => quote! { .custom::<#ty>(#index, #name) },
            FieldShape::Flatten { inner } | FieldShape::FlattenBoxed { inner } => {
                quote! { .flatten::<#inner>(#index, false) }
            }
            FieldShape::FlattenOptional { inner } => quote! { .flatten::<#inner>(#index, true) },
        }
    });

    let extra_sink = data.attrs.extra_sink.map(|_| quote! { .extra_sink() });
    let custom = data.attrs.custom.map(|_| quote! { .custom_decodable() });

    quote! {
        impl #impl_generics #described_ for #ident #ty_generics #where_clause {
            fn build_descriptor(
                store: &dyn #macro_exports_::DescriptorStore,
            ) -> #macro_exports_::TypeDescriptor {
                #macro_exports_::DescriptorBuilder::<Self>::new(store)
                    #(#steps)*
                    #extra_sink
                    #custom
                    .build()
            }
        }
    }
}
