//! Builds the generic output map alongside the typed walk.

use alloc::string::String;

use crate::{JsonValue, Value, ValueMap};

/// Output map of one record level.
///
/// Known fields are stored as their typed mirror, never re-decoded from
/// the input. Unknown keys are decoded generically and, if the level has
/// an extra-data sink, also collected for it.
pub(crate) struct MapAssembler {
    map: ValueMap,
    extra: Option<ValueMap>,
    exclude_known: bool,
}

impl MapAssembler {
    pub fn new(capacity: usize, exclude_known: bool, collect_extra: bool) -> Self {
        Self {
            map: ValueMap::with_capacity_and_hasher(capacity, Default::default()),
            extra: collect_extra.then(ValueMap::default),
            exclude_known,
        }
    }

    /// A known field decoded successfully.
    #[inline]
    pub fn known(&mut self, name: &str, mirror: Value) {
        if !self.exclude_known {
            self.map.insert(String::from(name), mirror);
        }
    }

    /// A known field that failed, kept as the generic decode of its input.
    #[inline]
    pub fn failover(&mut self, name: &str, raw: &JsonValue) {
        if !self.exclude_known {
            self.map.insert(String::from(name), Value::from_json(raw));
        }
    }

    pub fn unknown(&mut self, key: &str, raw: &JsonValue) {
        let value = Value::from_json(raw);
        if let Some(extra) = &mut self.extra {
            extra.insert(String::from(key), value.clone());
        }
        self.map.insert(String::from(key), value);
    }

    /// Returns the level map and, if collected, the unknown keys.
    #[inline]
    pub fn finish(self) -> (ValueMap, Option<ValueMap>) {
        (self.map, self.extra)
    }
}
