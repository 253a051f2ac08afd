use proc_macro2::Span;
use syn::{Attribute, LitStr};

use crate::RECORD_ATTRIBUTE_NAME;

// -----------------------------------------------------------------------------
// TypeAttributes

/// Parsed `#[record(...)]` attributes of the type.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    pub extra_sink: Option<Span>,
    pub custom: Option<Span>,
    pub auto_register: Option<Span>,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident(RECORD_ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                let span = meta.path.span_of_ident();
                let flag = if meta.path.is_ident("extra_sink") {
                    &mut this.extra_sink
                } else if meta.path.is_ident("custom") {
                    &mut this.custom
                } else if meta.path.is_ident("auto_register") {
                    &mut this.auto_register
                } else {
                    return Err(meta.error(
                        "unknown type attribute; supported: extra_sink, custom, auto_register",
                    ));
                };
                if flag.replace(span).is_some() {
                    return Err(meta.error("duplicate attribute"));
                }
                Ok(())
            })?;
        }
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub rename: Option<LitStr>,
    pub skip: Option<Span>,
    pub flatten: Option<Span>,
    pub custom: Option<Span>,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident(RECORD_ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let name: LitStr = meta.value()?.parse()?;
                    if name.value().is_empty() {
                        return Err(syn::Error::new(name.span(), "serialized name is empty"));
                    }
                    if this.rename.replace(name).is_some() {
                        return Err(meta.error("duplicate `rename`"));
                    }
                    return Ok(());
                }
                let span = meta.path.span_of_ident();
                let flag = if meta.path.is_ident("skip") {
                    &mut this.skip
                } else if meta.path.is_ident("flatten") {
                    &mut this.flatten
                } else if meta.path.is_ident("custom") {
                    &mut this.custom
                } else {
                    return Err(meta.error(
                        "unknown field attribute; supported: rename, skip, flatten, custom",
                    ));
                };
                if flag.replace(span).is_some() {
                    return Err(meta.error("duplicate attribute"));
                }
                Ok(())
            })?;
        }
        this.validity()?;
        Ok(this)
    }

    fn validity(&self) -> syn::Result<()> {
        let conflict = |span: Option<Span>, message: &str| match span {
            Some(span) => Err(syn::Error::new(span, message)),
            None => Ok(()),
        };
        if self.skip.is_some() {
            conflict(self.flatten, "`flatten` has no effect on a skipped field")?;
            conflict(self.custom, "`custom` has no effect on a skipped field")?;
            conflict(self.rename.as_ref().map(LitStr::span), "`rename` has no effect on a skipped field")?;
        }
        if self.flatten.is_some() {
            conflict(self.custom, "a flattened field cannot be `custom`")?;
            conflict(self.rename.as_ref().map(LitStr::span), "a flattened field has no name of its own")?;
        }
        Ok(())
    }
}

trait SpanOfIdent {
    fn span_of_ident(&self) -> Span;
}

impl SpanOfIdent for syn::Path {
    #[inline]
    fn span_of_ident(&self) -> Span {
        self.get_ident().map_or_else(Span::call_site, syn::Ident::span)
    }
}
