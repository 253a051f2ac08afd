use crate::derive_data::RecordData;

/// Generate `auto_register` implementation
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(data: &RecordData) -> proc_macro2::TokenStream {
    use quote::quote_spanned;

    let Some(span) = data.attrs.auto_register else {
        return proc_macro2::TokenStream::new();
    };
    // Invalid for generic types.
    if data.impl_with_generic() {
        return proc_macro2::TokenStream::new();
    }

    let auto_register_ = crate::path::auto_register_(data.vc_decode_path());
    let ident = data.ident;

    quote_spanned! { span =>
        #auto_register_::inventory::submit!{
            #auto_register_::__AutoRegisterFunc(
                <#ident as #auto_register_::__RegisterType>::__register
            )
        }
    }
}

/// Generate `auto_register` implementation
#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(_: &RecordData) -> proc_macro2::TokenStream {
    proc_macro2::TokenStream::new()
}
