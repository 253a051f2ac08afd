use quote::quote;

use crate::derive_data::RecordData;

/// Generates the `Decode` impl, so the record can be a field of another one.
///
/// A `#[record(custom)]` type decodes through its hook wherever it appears.
pub(crate) fn impl_trait_decode(data: &RecordData) -> proc_macro2::TokenStream {
    let vc_decode_path = data.vc_decode_path();
    let decode_ = crate::path::decode_(vc_decode_path);
    let macro_exports_ = crate::path::macro_exports_(vc_decode_path);
    let decode_context_ = crate::path::decode_context_(vc_decode_path);
    let field_error_ = crate::path::field_error_(vc_decode_path);
    let value_ = crate::path::value_(vc_decode_path);
    let json_value_ = crate::path::json_value_(vc_decode_path);

    let ident = data.ident;
    let (impl_generics, ty_generics, _) = data.generics.split_for_impl();

    let (kind, decode, extra): (_, _, Vec<syn::WherePredicate>) = if data.attrs.custom.is_some() {
        let custom_decode_ = crate::path::custom_decode_(vc_decode_path);
        (
            quote! { #macro_exports_::custom_kind::<Self>() },
            quote! { #macro_exports_::decode_custom(self, input, cx) },
            vec![syn::parse_quote!(Self: #custom_decode_)],
        )
    } else {
        (
            quote! { #macro_exports_::record_kind::<Self>() },
            quote! { #macro_exports_::decode_record(self, input, cx) },
            Vec::new(),
        )
    };
    let where_clause = super::where_clause_with(data, extra);

    quote! {
        impl #impl_generics #decode_ for #ident #ty_generics #where_clause {
            #[inline]
            fn kind() -> #macro_exports_::FieldKind {
                #kind
            }

            #[inline]
            fn decode(
                &mut self,
                input: &#json_value_,
                cx: &mut #decode_context_<'_>,
            ) -> ::core::result::Result<#value_, #field_error_> {
                #decode
            }
        }
    }
}
