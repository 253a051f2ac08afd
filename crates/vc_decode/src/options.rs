use serde::Deserialize;

// -----------------------------------------------------------------------------
// DecodeMode

/// How field-level errors propagate during one call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// The first field error aborts the call; no outputs are returned.
    #[default]
    FailFast,
    /// Failed fields are left at zero and omitted from the map; all
    /// errors are returned together with the partial map.
    MultiError,
    /// Like [`MultiError`](Self::MultiError), but the map keeps the
    /// generic decode of each failed field's original value.
    FailoverOriginal,
}

// -----------------------------------------------------------------------------
// DecodeOptions

/// Per-call configuration.
///
/// Options can be built in code or read from a configuration document:
///
/// ```
/// use vc_decode::{DecodeMode, DecodeOptions};
///
/// let options: DecodeOptions =
///     serde_json::from_str(r#"{ "mode": "multi_error", "exclude_known_fields": true }"#).unwrap();
///
/// assert_eq!(
///     options,
///     DecodeOptions::new().mode(DecodeMode::MultiError).exclude_known_fields(true),
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeOptions {
    pub mode: DecodeMode,
    /// Return only the unknown keys in the map.
    pub exclude_known_fields: bool,
    /// Fill only the map; the target record is left untouched.
    pub skip_populate: bool,
    /// Retry unmatched keys against field names ignoring ASCII case.
    pub case_insensitive: bool,
    /// Maximum number of nested record levels below the top level.
    pub max_depth: usize,
}

impl DecodeOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 128;

    #[inline]
    pub const fn new() -> Self {
        Self {
            mode: DecodeMode::FailFast,
            exclude_known_fields: false,
            skip_populate: false,
            case_insensitive: false,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    #[inline]
    pub const fn mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    pub const fn exclude_known_fields(mut self, yes: bool) -> Self {
        self.exclude_known_fields = yes;
        self
    }

    #[inline]
    pub const fn skip_populate(mut self, yes: bool) -> Self {
        self.skip_populate = yes;
        self
    }

    #[inline]
    pub const fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    #[inline]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Default for DecodeOptions {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
