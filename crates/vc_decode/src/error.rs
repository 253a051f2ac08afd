use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;
use core::error::Error as StdError;
use core::fmt;

use thiserror::Error;

use crate::ValueMap;

// -----------------------------------------------------------------------------
// FieldPath

/// One step from a record down to the failing value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// A record field, by serialized name.
    Field(Box<str>),
    /// An entry of a map field.
    Key(String),
    /// An element of a slice or array field.
    Index(usize),
}

/// Location of a failing value, from the document root.
///
/// Formatted as `outer.inner["key"][2]`; the empty path is `<root>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    #[inline]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub(crate) fn truncate(&mut self, depth: usize) {
        self.0.truncate(depth);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Key(key) => write!(f, "[{key:?}]")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// HookError

/// Failure reported by a [`CustomDecode`] or [`ExtraDataSink`] hook.
///
/// [`CustomDecode`]: crate::CustomDecode
/// [`ExtraDataSink`]: crate::ExtraDataSink
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying error, taking its message.
    pub fn from_source(source: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// -----------------------------------------------------------------------------
// FieldError

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FieldErrorKind {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("number {value} is out of range for {expected}")]
    OutOfRange { expected: &'static str, value: String },

    #[error("map key {key:?} cannot be parsed as {expected}")]
    InvalidKey { expected: &'static str, key: String },

    #[error("custom decoder failed: {0}")]
    Hook(#[source] HookError),

    #[error("extra-data sink rejected the unknown fields: {0}")]
    Sink(#[source] HookError),

    #[error("nested records exceed the depth limit of {0}")]
    DepthExceeded(usize),

    #[error("no settable location for this field on `{0}`")]
    Unresolvable(&'static str),
}

/// A single field that could not be decoded.
///
/// Whether it aborts the call is decided by the [`DecodeMode`](crate::DecodeMode).
#[derive(Debug, Error)]
#[error("field `{path}`: {kind}")]
pub struct FieldError {
    path: FieldPath,
    #[source]
    kind: FieldErrorKind,
}

impl FieldError {
    #[inline]
    pub fn new(path: FieldPath, kind: FieldErrorKind) -> Self {
        Self { path, kind }
    }

    #[inline]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    #[inline]
    pub fn kind(&self) -> &FieldErrorKind {
        &self.kind
    }

    /// Returns `true` if the failure came from a hook.
    #[inline]
    pub fn is_hook(&self) -> bool {
        matches!(self.kind, FieldErrorKind::Hook(_) | FieldErrorKind::Sink(_))
    }
}

// -----------------------------------------------------------------------------
// ErrorAggregate

/// Every field error of one call, in the order they were met.
#[derive(Debug, Default)]
pub struct ErrorAggregate(Vec<FieldError>);

impl ErrorAggregate {
    #[inline]
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    #[inline]
    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ErrorAggregate {
    type Item = &'a FieldError;
    type IntoIter = core::slice::Iter<'a, FieldError>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ErrorAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) failed to decode", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

impl StdError for ErrorAggregate {}

/// Outputs of a call that collected field errors instead of aborting.
///
/// The typed record holds every field that decoded; failed fields are at
/// their zero value.
#[derive(Debug, Error)]
#[error("{errors}")]
pub struct PartialDecode {
    pub map: ValueMap,
    pub errors: ErrorAggregate,
}

// -----------------------------------------------------------------------------
// Top-level errors

/// The top-level document cannot be decoded as a record.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InputError {
    #[error("malformed JSON input: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected a JSON object at the top level, found {found}")]
    NotAnObject { found: &'static str },
}

/// The target cannot receive a decoded record.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValueError {
    #[error("target type {type_id:?} has no registered record descriptor")]
    Unregistered { type_id: TypeId },
}

/// Failure of a whole decode call.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Value(#[from] ValueError),

    /// The first field error, under [`DecodeMode::FailFast`](crate::DecodeMode::FailFast).
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Field errors collected under the other modes, with the partial map.
    #[error(transparent)]
    Partial(PartialDecode),
}

impl DecodeError {
    /// All field errors carried by this error, in order.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            DecodeError::Field(error) => core::slice::from_ref(error),
            DecodeError::Partial(partial) => &partial.errors.0,
            DecodeError::Input(_) | DecodeError::Value(_) => &[],
        }
    }

    /// The partial map, if the call produced one.
    pub fn partial_map(&self) -> Option<&ValueMap> {
        match self {
            DecodeError::Partial(partial) => Some(&partial.map),
            _ => None,
        }
    }
}

/// Name of a raw value's JSON type.
pub(crate) fn json_type_name(raw: &crate::JsonValue) -> &'static str {
    use crate::JsonValue;
    match raw {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldError, FieldErrorKind, FieldPath, PathSegment};
    use alloc::string::ToString;

    #[test]
    fn path_display() {
        let mut path = FieldPath::new();
        assert_eq!(path.to_string(), "<root>");

        path.push(PathSegment::Field("outer".into()));
        path.push(PathSegment::Field("items".into()));
        path.push(PathSegment::Index(2));
        path.push(PathSegment::Key("k".into()));
        assert_eq!(path.to_string(), r#"outer.items[2]["k"]"#);
    }

    #[test]
    fn field_error_display() {
        let mut path = FieldPath::new();
        path.push(PathSegment::Field("foo".into()));
        let error = FieldError::new(
            path,
            FieldErrorKind::Mismatch {
                expected: "string",
                found: "number",
            },
        );
        assert_eq!(error.to_string(), "field `foo`: expected string, found number");
    }
}
