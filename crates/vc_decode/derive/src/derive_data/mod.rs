//! Parsing of the derive input into [`RecordData`].

mod attributes;

pub(crate) use attributes::{FieldAttributes, TypeAttributes};

use std::collections::BTreeMap;

use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, GenericArgument, Generics, Ident, PathArguments, Type};

// -----------------------------------------------------------------------------
// FieldShape

/// How a field takes part in decoding.
pub(crate) enum FieldShape {
    /// Decoded through `Decode` under `name`.
    Value { name: String },
    /// Decoded through `CustomDecode` under `name`.
    Custom { name: String },
    /// An embedded record stored inline.
    Flatten { inner: Type },
    /// An embedded record stored in a `Box`.
    FlattenBoxed { inner: Type },
    /// An embedded record stored in an `Option<Box<_>>`.
    FlattenOptional { inner: Type },
}

pub(crate) struct RecordField {
    pub ident: Ident,
    pub ty: Type,
    /// Declaration index among the fields taking part in decoding.
    pub index: usize,
    pub shape: FieldShape,
}

// -----------------------------------------------------------------------------
// RecordData

pub(crate) struct RecordData<'a> {
    pub ident: &'a Ident,
    pub generics: &'a Generics,
    pub attrs: TypeAttributes,
    pub fields: Vec<RecordField>,
    pub vc_decode_path: syn::Path,
}

impl<'a> RecordData<'a> {
    pub fn parse(ast: &'a DeriveInput) -> syn::Result<Self> {
        let Data::Struct(data) = &ast.data else {
            return Err(syn::Error::new(
                ast.ident.span(),
                "`Record` can only be derived for structs",
            ));
        };
        let Fields::Named(named) = &data.fields else {
            return Err(syn::Error::new(
                data.fields.span(),
                "`Record` requires named fields",
            ));
        };

        let attrs = TypeAttributes::parse_attrs(&ast.attrs)?;

        let mut fields = Vec::with_capacity(named.named.len());
        let mut names: BTreeMap<String, Span> = BTreeMap::new();
        for field in &named.named {
            let field_attrs = FieldAttributes::parse_attrs(&field.attrs)?;
            if field_attrs.skip.is_some() {
                continue;
            }
            // Named fields always have an ident.
            let Some(ident) = field.ident.clone() else {
                continue;
            };

            let shape = if field_attrs.flatten.is_some() {
                flatten_shape(&field.ty)?
            } else {
                let (name, span) = match &field_attrs.rename {
                    Some(lit) => (lit.value(), lit.span()),
                    None => (ident.unraw().to_string(), ident.span()),
                };
                if names.insert(name.clone(), span).is_some() {
                    return Err(syn::Error::new(
                        span,
                        format!("duplicate serialized name `{name}`"),
                    ));
                }
                if field_attrs.custom.is_some() {
                    FieldShape::Custom { name }
                } else {
                    FieldShape::Value { name }
                }
            };

            fields.push(RecordField {
                ident,
                ty: field.ty.clone(),
                index: fields.len(),
                shape,
            });
        }

        Ok(Self {
            ident: &ast.ident,
            generics: &ast.generics,
            attrs,
            fields,
            vc_decode_path: crate::path::vc_decode(),
        })
    }

    #[inline]
    pub fn vc_decode_path(&self) -> &syn::Path {
        &self.vc_decode_path
    }

    /// Whether the type has type or const parameters.
    #[inline]
    pub fn impl_with_generic(&self) -> bool {
        self.generics.type_params().next().is_some() || self.generics.const_params().next().is_some()
    }
}

// -----------------------------------------------------------------------------
// Type inspection

/// Returns the single generic argument of `ty` if its last segment is `wrapper`.
fn unwrap_generic<'t>(ty: &'t Type, wrapper: &str) -> Option<&'t Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    match (types.next(), types.next()) {
        (Some(inner), None) => Some(inner),
        _ => None,
    }
}

fn flatten_shape(ty: &Type) -> syn::Result<FieldShape> {
    if let Some(boxed) = unwrap_generic(ty, "Box") {
        return Ok(FieldShape::FlattenBoxed { inner: boxed.clone() });
    }
    if let Some(optional) = unwrap_generic(ty, "Option") {
        return match unwrap_generic(optional, "Box") {
            Some(inner) => Ok(FieldShape::FlattenOptional { inner: inner.clone() }),
            None => Err(syn::Error::new(
                ty.span(),
                "an optional flattened record must be stored as `Option<Box<T>>`",
            )),
        };
    }
    Ok(FieldShape::Flatten { inner: ty.clone() })
}
