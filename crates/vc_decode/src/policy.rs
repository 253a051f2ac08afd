//! Applies the selected [`DecodeMode`] to every field error of one call.

use alloc::vec::Vec;

use crate::error::{DecodeError, ErrorAggregate, FieldError, PartialDecode};
use crate::{DecodeMode, ValueMap};

/// What to do with a field after its error has been recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Recovery {
    /// Leave the field out of the map.
    Omit,
    /// Put the generic decode of the original value in the map.
    Failover,
}

#[derive(Debug)]
pub(crate) struct ErrorPolicy {
    mode: DecodeMode,
    errors: Vec<FieldError>,
}

impl ErrorPolicy {
    #[inline]
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    /// Routes one field error.
    ///
    /// Returns the error back under [`DecodeMode::FailFast`] so the caller
    /// can unwind with `?`; otherwise records it and tells the caller how
    /// to fill the map.
    pub fn handle(&mut self, error: FieldError) -> Result<Recovery, FieldError> {
        let recovery = match self.mode {
            DecodeMode::FailFast => return Err(error),
            DecodeMode::MultiError => Recovery::Omit,
            DecodeMode::FailoverOriginal => Recovery::Failover,
        };
        log::debug!("recorded field error ({:?}): {error}", self.mode);
        self.errors.push(error);
        Ok(recovery)
    }

    /// Number of errors recorded so far.
    #[inline]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Produces the call result from the finished map.
    pub fn finish(self, map: ValueMap) -> Result<ValueMap, DecodeError> {
        if self.errors.is_empty() {
            Ok(map)
        } else {
            Err(DecodeError::Partial(PartialDecode {
                map,
                errors: ErrorAggregate::new(self.errors),
            }))
        }
    }
}
