//! Decodes one JSON object level into a record and its mirror map.

use alloc::boxed::Box;

use super::DecodeContext;
use crate::assemble::MapAssembler;
use crate::descriptor::{FieldDescriptor, FieldStrategy, TypeDescriptor};
use crate::error::{FieldError, FieldErrorKind, PathSegment};
use crate::policy::Recovery;
use crate::resolve::resolve;
use crate::{Described, JsonMap, JsonValue, Record, Value, ValueMap};

/// Decodes every key of `object` into `record`.
///
/// Field errors go through the call's policy; under fail-fast the first
/// one is returned. Yields the level map and, when the type has an
/// extra-data sink, the unknown keys for it.
pub(crate) fn walk_level(
    record: &mut dyn Record,
    desc: &TypeDescriptor,
    object: &JsonMap,
    exclude_known: bool,
    cx: &mut DecodeContext<'_>,
) -> Result<(ValueMap, Option<ValueMap>), FieldError> {
    let case_insensitive = cx.options().case_insensitive;
    let mut assembler = MapAssembler::new(object.len(), exclude_known, desc.hooks().has_extra_sink());

    for (key, raw) in object {
        let field = if case_insensitive {
            desc.field_ignore_case(key)
        } else {
            desc.field(key)
        };
        let Some(field) = field else {
            log::trace!("`{}`: unknown key `{key}` kept as a generic value", desc.type_name());
            assembler.unknown(key, raw);
            continue;
        };

        let result = cx.scoped(PathSegment::Field(Box::from(field.name())), |cx| {
            decode_field(record, desc, field, raw, cx)
        });
        match result {
            Ok(mirror) => assembler.known(field.name(), mirror),
            Err(error) => {
                // The slot may hold a partial value.
                if let Some(slot) = resolve(record, field.access_path()) {
                    field.reset(slot);
                }
                match cx.policy.handle(error)? {
                    Recovery::Omit => {}
                    Recovery::Failover => assembler.failover(field.name(), raw),
                }
            }
        }
    }

    Ok(assembler.finish())
}

fn decode_field(
    record: &mut dyn Record,
    desc: &TypeDescriptor,
    field: &FieldDescriptor,
    raw: &JsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<Value, FieldError> {
    let Some(slot) = resolve(record, field.access_path()) else {
        return Err(cx.error(FieldErrorKind::Unresolvable(desc.type_name())));
    };
    if raw.is_null() {
        field.reset(slot);
        return Ok(Value::Null);
    }
    match field.strategy() {
        FieldStrategy::Default(decode) => decode(slot, raw, cx),
        FieldStrategy::Custom(hook) => hook(slot, raw).map_err(|e| cx.error(FieldErrorKind::Hook(e))),
    }
}

/// Decodes a record nested in a field, one level down.
///
/// The extra-data sink of the record, if any, runs after the whole level;
/// its failure fails the owning field.
pub(crate) fn decode_nested<T: Described>(
    record: &mut T,
    input: &JsonValue,
    cx: &mut DecodeContext<'_>,
) -> Result<Value, FieldError> {
    let JsonValue::Object(object) = input else {
        return Err(cx.mismatch("object", input));
    };
    let desc = cx.descriptor::<T>();

    cx.enter()?;
    let result = walk_level(record, &desc, object, false, cx);
    cx.leave();

    let (map, extra) = result?;
    if let (Some(sink), Some(extra)) = (desc.hooks().extra_sink, extra) {
        sink(record, extra).map_err(|e| cx.error(FieldErrorKind::Sink(e)))?;
    }
    Ok(Value::Map(map))
}
