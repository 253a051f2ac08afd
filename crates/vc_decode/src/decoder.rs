//! Entry points: [`Decoder`] and the free functions using the global cache.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use crate::cache::{DescriptorStore, NoCache, TypeCache, descriptor_of};
use crate::decode::DecodeContext;
use crate::decode::walk::walk_level;
use crate::descriptor::{CustomRecordFn, TypeDescriptor};
use crate::error::{DecodeError, FieldError, FieldErrorKind, FieldPath, InputError, ValueError, json_type_name};
use crate::policy::Recovery;
use crate::{DecodeOptions, Described, JsonMap, JsonValue, Record, Value, ValueMap};

// -----------------------------------------------------------------------------
// Decoder

/// A reusable decoder: a descriptor store plus default options.
///
/// Cloning is cheap and clones share the store.
///
/// # Examples
///
/// ```
/// use vc_decode::{DecodeError, DecodeMode, DecodeOptions, Decoder, Record, Value};
///
/// #[derive(Record, Default)]
/// struct Config {
///     foo: String,
///     boo: Vec<i32>,
/// }
///
/// let decoder = Decoder::new()
///     .with_options(DecodeOptions::new().mode(DecodeMode::FailoverOriginal));
///
/// let mut config = Config::default();
/// let err = decoder
///     .decode_into(br#"{"foo":2,"boo":[1,2,3]}"#, &mut config)
///     .unwrap_err();
///
/// let DecodeError::Partial(partial) = err else { unreachable!() };
/// assert_eq!(partial.errors.len(), 1);
/// assert_eq!(partial.map["foo"], Value::F64(2.0));
/// assert_eq!(config.foo, "");
/// assert_eq!(config.boo, [1, 2, 3]);
/// ```
#[derive(Clone)]
pub struct Decoder {
    store: Arc<dyn DescriptorStore>,
    options: DecodeOptions,
}

impl Decoder {
    /// A decoder with its own, initially empty, [`TypeCache`].
    #[inline]
    pub fn new() -> Self {
        Self::with_store(TypeCache::new())
    }

    /// A decoder sharing [`TypeCache::global`].
    #[inline]
    pub fn global() -> Self {
        Self::with_store(TypeCache::global())
    }

    /// A decoder that rebuilds descriptors on every call.
    #[inline]
    pub fn uncached() -> Self {
        Self::with_store(NoCache)
    }

    pub fn with_store(store: impl DescriptorStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
            options: DecodeOptions::new(),
        }
    }

    #[inline]
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    #[inline]
    pub fn store(&self) -> &dyn DescriptorStore {
        &*self.store
    }

    /// Builds and stores the descriptor of `T` ahead of time.
    ///
    /// Needed before `T` can be decoded through [`decode_any`](Self::decode_any).
    #[inline]
    pub fn register<T: Described>(&self) -> &Self {
        descriptor_of::<T>(&*self.store);
        self
    }

    /// Returns the descriptor of `T`, building it if needed.
    #[inline]
    pub fn descriptor<T: Described>(&self) -> Arc<TypeDescriptor> {
        descriptor_of::<T>(&*self.store)
    }

    /// Parses `raw` and decodes it into `target`.
    ///
    /// Returns the generic map of the document. See [`DecodeError`] for
    /// what each [`DecodeMode`](crate::DecodeMode) returns on field errors.
    pub fn decode_into<T: Described>(&self, raw: &[u8], target: &mut T) -> Result<ValueMap, DecodeError> {
        let document = parse(raw)?;
        let object = top_level(&document)?;
        self.run(target, &self.descriptor::<T>(), object)
    }

    /// Decodes an already parsed document into `target`.
    pub fn decode_from_map<T: Described>(
        &self,
        input: &JsonMap,
        target: &mut T,
    ) -> Result<ValueMap, DecodeError> {
        self.run(target, &self.descriptor::<T>(), input)
    }

    /// [`decode_into`](Self::decode_into) for a target known only at runtime.
    ///
    /// The target's type must already be in the store, see
    /// [`register`](Self::register) and [`TypeCache::auto_register`];
    /// otherwise a [`ValueError`] is returned before the input is read.
    pub fn decode_any(&self, raw: &[u8], target: &mut dyn Any) -> Result<ValueMap, DecodeError> {
        let (desc, record) = self.lookup(target)?;
        let document = parse(raw)?;
        let object = top_level(&document)?;
        self.run(record, &desc, object)
    }

    /// [`decode_from_map`](Self::decode_from_map) for a target known only at runtime.
    pub fn decode_any_from_map(
        &self,
        input: &JsonMap,
        target: &mut dyn Any,
    ) -> Result<ValueMap, DecodeError> {
        let (desc, record) = self.lookup(target)?;
        self.run(record, &desc, input)
    }

    fn lookup<'t>(
        &self,
        target: &'t mut dyn Any,
    ) -> Result<(Arc<TypeDescriptor>, &'t mut dyn Record), ValueError> {
        let type_id = (*target).type_id();
        let unregistered = ValueError::Unregistered { type_id };
        let Some(desc) = self.store.get(type_id) else {
            return Err(unregistered);
        };
        match desc.downcast(target) {
            Some(record) => Ok((desc, record)),
            None => Err(unregistered),
        }
    }

    fn run(
        &self,
        target: &mut dyn Record,
        desc: &TypeDescriptor,
        input: &JsonMap,
    ) -> Result<ValueMap, DecodeError> {
        let mut cx = DecodeContext::new(&*self.store, &self.options);

        let mut scratch: Box<dyn Record>;
        let record = if self.options.skip_populate {
            scratch = desc.new_scratch();
            &mut *scratch
        } else {
            target
        };

        let map = match desc.hooks().custom {
            Some(custom) => populate_custom(record, custom, input, &mut cx)?,
            None => populate(record, desc, input, &mut cx)?,
        };
        let policy = cx.into_policy();
        if policy.error_count() > 0 {
            log::debug!("`{}`: {} field error(s)", desc.type_name(), policy.error_count());
        }
        policy.finish(map)
    }
}

impl Default for Decoder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Decoder")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Free functions

/// Decodes `raw` into `target` using the global descriptor cache.
///
/// See the [crate documentation](crate) for an example.
pub fn decode_into<T: Described>(
    raw: &[u8],
    target: &mut T,
    options: &DecodeOptions,
) -> Result<ValueMap, DecodeError> {
    global_with(options).decode_into(raw, target)
}

/// Decodes a parsed document into `target` using the global descriptor cache.
pub fn decode_from_map<T: Described>(
    input: &JsonMap,
    target: &mut T,
    options: &DecodeOptions,
) -> Result<ValueMap, DecodeError> {
    global_with(options).decode_from_map(input, target)
}

#[inline]
fn global_with(options: &DecodeOptions) -> Decoder {
    Decoder::global().with_options(*options)
}

// -----------------------------------------------------------------------------
// Top level

fn parse(raw: &[u8]) -> Result<JsonValue, InputError> {
    Ok(serde_json::from_slice(raw)?)
}

fn top_level(document: &JsonValue) -> Result<&JsonMap, InputError> {
    match document {
        JsonValue::Object(object) => Ok(object),
        other => Err(InputError::NotAnObject {
            found: json_type_name(other),
        }),
    }
}

fn populate(
    record: &mut dyn Record,
    desc: &TypeDescriptor,
    input: &JsonMap,
    cx: &mut DecodeContext<'_>,
) -> Result<ValueMap, FieldError> {
    let exclude_known = cx.options().exclude_known_fields;
    let (map, extra) = walk_level(record, desc, input, exclude_known, cx)?;

    if let (Some(sink), Some(extra)) = (desc.hooks().extra_sink, extra)
        && let Err(e) = sink(record, extra)
    {
        cx.policy
            .handle(FieldError::new(FieldPath::new(), FieldErrorKind::Sink(e)))?;
    }
    Ok(map)
}

/// A top-level record decoding itself: a map mirror is the result, any
/// other mirror is replaced by the generic decode of the input.
fn populate_custom(
    record: &mut dyn Record,
    custom: CustomRecordFn,
    input: &JsonMap,
    cx: &mut DecodeContext<'_>,
) -> Result<ValueMap, FieldError> {
    let raw = JsonValue::Object(input.clone());
    let generic = || match Value::from_json(&raw) {
        Value::Map(map) => map,
        _ => ValueMap::default(),
    };

    match custom(record, &raw) {
        Ok(Value::Map(map)) => Ok(map),
        Ok(_) => Ok(generic()),
        Err(e) => {
            let error = FieldError::new(FieldPath::new(), FieldErrorKind::Hook(e));
            match cx.policy.handle(error)? {
                Recovery::Omit => Ok(ValueMap::default()),
                Recovery::Failover => Ok(generic()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::collections::BTreeMap;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;
    use core::any::Any;

    use serde::Serialize;
    use serde_json::json;

    use super::Decoder;
    use crate::cache::{NoCache, TypeCache};
    use crate::error::{FieldErrorKind, PathSegment};
    use crate::{
        CustomDecode, DecodeError, DecodeMode, DecodeOptions, ExtraDataSink, HookError, InputError,
        JsonMap, JsonValue, Record, Value, ValueError, ValueMap,
    };

    #[derive(Record, Default, Debug, PartialEq)]
    struct Config {
        foo: String,
        boo: Vec<i32>,
    }

    fn decoder(mode: DecodeMode) -> Decoder {
        Decoder::new().with_options(DecodeOptions::new().mode(mode))
    }

    fn object(value: JsonValue) -> JsonMap {
        match value {
            JsonValue::Object(object) => object,
            other => panic!("not an object: {other}"),
        }
    }

    fn ints(items: &[i32]) -> Value {
        Value::Seq(items.iter().copied().map(Value::I32).collect())
    }

    // -------------------------------------------------------------------------
    // Modes

    #[test]
    fn known_and_unknown_keys() {
        let mut config = Config::default();
        let map = decoder(DecodeMode::FailFast)
            .decode_into(br#"{"foo":"bar","boo":[1,2,3],"goo":"untyped"}"#, &mut config)
            .unwrap();

        assert_eq!(config, Config { foo: "bar".into(), boo: vec![1, 2, 3] });
        assert_eq!(map.len(), 3);
        assert_eq!(map["foo"], Value::from("bar"));
        assert_eq!(map["boo"], ints(&[1, 2, 3]));
        assert_eq!(map["goo"], Value::from("untyped"));
    }

    #[test]
    fn fail_fast_returns_single_error() {
        let mut config = Config::default();
        let err = decoder(DecodeMode::FailFast)
            .decode_into(br#"{"foo":2,"boo":[1,2,3]}"#, &mut config)
            .unwrap_err();

        let DecodeError::Field(error) = &err else {
            panic!("expected a field error, got {err}");
        };
        assert_eq!(error.path().segments(), [PathSegment::Field("foo".into())]);
        assert!(matches!(
            error.kind(),
            FieldErrorKind::Mismatch { expected: "string", found: "number" }
        ));
        assert_eq!(err.field_errors().len(), 1);
        assert!(err.partial_map().is_none());
    }

    #[test]
    fn multi_error_omits_failed_fields() {
        let mut config = Config::default();
        let err = decoder(DecodeMode::MultiError)
            .decode_into(br#"{"foo":2,"boo":[1,2,3]}"#, &mut config)
            .unwrap_err();

        let DecodeError::Partial(partial) = err else {
            panic!("expected a partial result");
        };
        assert_eq!(partial.errors.len(), 1);
        assert_eq!(partial.map.len(), 1);
        assert_eq!(partial.map["boo"], ints(&[1, 2, 3]));
        assert_eq!(config, Config { foo: String::new(), boo: vec![1, 2, 3] });
    }

    #[test]
    fn failover_keeps_original_value() {
        let mut config = Config { foo: "stale".into(), boo: Vec::new() };
        let err = decoder(DecodeMode::FailoverOriginal)
            .decode_into(br#"{"foo":2,"boo":[1,2,3]}"#, &mut config)
            .unwrap_err();

        let DecodeError::Partial(partial) = err else {
            panic!("expected a partial result");
        };
        assert_eq!(partial.errors.len(), 1);
        assert_eq!(partial.map["foo"], Value::F64(2.0));
        assert_eq!(partial.map["boo"], ints(&[1, 2, 3]));
        assert_eq!(config.foo, "");
    }

    #[test]
    fn errors_are_collected_in_document_order() {
        #[derive(Record, Default)]
        struct Many {
            a: u8,
            b: bool,
            c: String,
            d: Vec<u16>,
        }

        let mut many = Many::default();
        let err = decoder(DecodeMode::MultiError)
            .decode_into(br#"{"a":300,"b":true,"c":[],"d":[1,-2]}"#, &mut many)
            .unwrap_err();

        let paths: Vec<String> = err.field_errors().iter().map(|e| e.path().to_string()).collect();
        assert_eq!(paths, ["a", "c", "d[1]"]);
        assert!(many.b);
        assert!(many.d.is_empty());
        assert_eq!(err.partial_map().unwrap().len(), 1);
    }

    // -------------------------------------------------------------------------
    // Primitives

    #[derive(Record, Default, Debug, PartialEq, Serialize)]
    struct Primitives {
        b: bool,
        i8: i8,
        i16: i16,
        i32: i32,
        i64: i64,
        u8: u8,
        u16: u16,
        u32: u32,
        u64: u64,
        f32: f32,
        f64: f64,
        s: String,
        pb: Option<bool>,
        pi8: Option<i8>,
        pi16: Option<i16>,
        pi32: Option<i32>,
        pi64: Option<i64>,
        pu8: Option<u8>,
        pu16: Option<u16>,
        pu32: Option<u32>,
        pu64: Option<u64>,
        pf32: Option<f32>,
        pf64: Option<f64>,
        ps: Option<String>,
    }

    fn sample() -> Primitives {
        Primitives {
            b: true,
            i8: i8::MIN,
            i16: i16::MIN,
            i32: i32::MIN,
            i64: i64::MIN,
            u8: u8::MAX,
            u16: u16::MAX,
            u32: u32::MAX,
            u64: u64::MAX,
            f32: 1.5,
            f64: -0.125,
            s: "text".into(),
            pb: Some(false),
            pi8: Some(-1),
            pi16: Some(-2),
            pi32: Some(-3),
            pi64: Some(-4),
            pu8: Some(1),
            pu16: Some(2),
            pu32: Some(3),
            pu64: Some(4),
            pf32: Some(0.5),
            pf64: Some(0.25),
            ps: Some("p".into()),
        }
    }

    #[test]
    fn primitive_struct_and_map_agree() {
        let expected = sample();
        let raw = serde_json::to_vec(&expected).unwrap();

        let mut decoded = Primitives::default();
        let map = Decoder::new().decode_into(&raw, &mut decoded).unwrap();

        assert_eq!(decoded, expected);
        assert_eq!(map["b"], Value::Bool(true));
        assert_eq!(map["i8"], Value::I8(i8::MIN));
        assert_eq!(map["i16"], Value::I16(i16::MIN));
        assert_eq!(map["i32"], Value::I32(i32::MIN));
        assert_eq!(map["i64"], Value::I64(i64::MIN));
        assert_eq!(map["u8"], Value::U8(u8::MAX));
        assert_eq!(map["u16"], Value::U16(u16::MAX));
        assert_eq!(map["u32"], Value::U32(u32::MAX));
        assert_eq!(map["u64"], Value::U64(u64::MAX));
        assert_eq!(map["f32"], Value::F32(1.5));
        assert_eq!(map["f64"], Value::F64(-0.125));
        assert_eq!(map["s"], Value::from("text"));
        assert_eq!(map["pb"], Value::Bool(false));
        assert_eq!(map["pi8"], Value::I8(-1));
        assert_eq!(map["pu64"], Value::U64(4));
        assert_eq!(map["pf32"], Value::F32(0.5));
        assert_eq!(map["ps"], Value::from("p"));
        assert_eq!(map.len(), 24);
    }

    #[test]
    fn null_is_zero_in_every_mode() {
        let nulls: JsonMap = object(serde_json::to_value(sample()).unwrap())
            .into_iter()
            .map(|(key, _)| (key, JsonValue::Null))
            .collect();

        for mode in [DecodeMode::FailFast, DecodeMode::MultiError, DecodeMode::FailoverOriginal] {
            let mut decoded = sample();
            let map = decoder(mode).decode_from_map(&nulls, &mut decoded).unwrap();

            assert_eq!(decoded, Primitives::default(), "{mode:?}");
            assert_eq!(map.len(), 24);
            assert!(map.values().all(Value::is_null), "{mode:?}");
        }
    }

    #[test]
    fn round_trip_nested_and_containers() {
        #[derive(Record, Default, Debug, PartialEq, Serialize)]
        struct Leaf {
            id: u32,
            tags: Vec<String>,
        }

        #[derive(Record, Default, Debug, PartialEq, Serialize)]
        struct Tree {
            name: String,
            leaf: Leaf,
            boxed: Box<Leaf>,
            maybe: Option<Leaf>,
            leaves: Vec<Leaf>,
            grid: [[u8; 2]; 2],
            by_name: BTreeMap<String, Leaf>,
            by_id: BTreeMap<u32, bool>,
            anything: Value,
        }

        let tree = Tree {
            name: "root".into(),
            leaf: Leaf { id: 1, tags: vec!["a".into()] },
            boxed: Box::new(Leaf { id: 2, tags: Vec::new() }),
            maybe: Some(Leaf { id: 3, tags: vec!["b".into(), "c".into()] }),
            leaves: vec![Leaf { id: 4, tags: Vec::new() }, Leaf { id: 5, tags: Vec::new() }],
            grid: [[1, 2], [3, 4]],
            by_name: BTreeMap::from([("x".to_string(), Leaf { id: 6, tags: Vec::new() })]),
            by_id: BTreeMap::from([(7, true), (8, false)]),
            anything: Value::Seq(vec![Value::F64(1.0), Value::from("two")]),
        };
        let raw = serde_json::to_vec(&tree).unwrap();

        let mut decoded = Tree::default();
        let map = Decoder::new().decode_into(&raw, &mut decoded).unwrap();
        assert_eq!(decoded, tree);

        // Nested records mirror as maps.
        let leaf = map["leaf"].as_map().unwrap();
        assert_eq!(leaf["id"], Value::U32(1));
        assert_eq!(map["by_id"].get("7"), Some(&Value::Bool(true)));
        assert_eq!(map["anything"], tree.anything);
    }

    // -------------------------------------------------------------------------
    // Options

    #[test]
    fn exclude_known_fields() {
        let mut config = Config::default();
        let map = Decoder::new()
            .with_options(DecodeOptions::new().exclude_known_fields(true))
            .decode_into(br#"{"foo":"bar","boo":[1],"goo":1}"#, &mut config)
            .unwrap();

        assert_eq!(config.foo, "bar");
        assert_eq!(map.len(), 1);
        assert_eq!(map["goo"], Value::F64(1.0));
    }

    #[test]
    fn skip_populate_leaves_target_untouched() {
        let mut config = Config { foo: "keep".into(), boo: vec![9] };
        let map = Decoder::new()
            .with_options(DecodeOptions::new().skip_populate(true))
            .decode_into(br#"{"foo":"bar","boo":[1]}"#, &mut config)
            .unwrap();

        assert_eq!(config, Config { foo: "keep".into(), boo: vec![9] });
        assert_eq!(map["foo"], Value::from("bar"));
        assert_eq!(map["boo"], ints(&[1]));
    }

    #[test]
    fn case_insensitive_matching() {
        let raw = br#"{"FOO":"bar","Boo":[1],"goo":true}"#;

        let mut strict = Config::default();
        let map = Decoder::new().decode_into(raw, &mut strict).unwrap();
        assert_eq!(strict, Config::default());
        assert_eq!(map.len(), 3);

        let mut relaxed = Config::default();
        let map = Decoder::new()
            .with_options(DecodeOptions::new().case_insensitive(true))
            .decode_into(raw, &mut relaxed)
            .unwrap();
        assert_eq!(relaxed, Config { foo: "bar".into(), boo: vec![1] });
        // Known fields are keyed by their serialized name.
        assert_eq!(map["foo"], Value::from("bar"));
        assert!(map.contains_key("goo"));
        assert!(!map.contains_key("FOO"));
    }

    #[test]
    fn depth_limit() {
        #[derive(Record, Default)]
        struct Node {
            next: Option<Box<Node>>,
        }

        let raw = br#"{"next":{"next":{"next":{}}}}"#;
        let mut node = Node::default();
        Decoder::new().decode_into(raw, &mut node).unwrap();
        assert!(node.next.as_ref().unwrap().next.as_ref().unwrap().next.is_some());

        let err = Decoder::new()
            .with_options(DecodeOptions::new().max_depth(2))
            .decode_into(raw, &mut node)
            .unwrap_err();
        let DecodeError::Field(error) = err else {
            panic!("expected a field error");
        };
        assert_eq!(error.path().to_string(), "next.next.next");
        assert!(matches!(error.kind(), FieldErrorKind::DepthExceeded(2)));
    }

    // -------------------------------------------------------------------------
    // Flattening

    #[derive(Record, Default, Debug)]
    struct Meta {
        id: u32,
        name: String,
    }

    #[derive(Record, Default, Debug)]
    struct Item {
        #[record(rename = "name")]
        title: String,
        #[record(flatten)]
        meta: Option<Box<Meta>>,
    }

    #[test]
    fn flattened_fields_read_from_parent_level() {
        let mut item = Item::default();
        let map = Decoder::new()
            .decode_into(br#"{"name":"outer","id":7}"#, &mut item)
            .unwrap();

        assert_eq!(item.title, "outer");
        let meta = item.meta.unwrap();
        assert_eq!(meta.id, 7);
        // `name` belongs to the outer field.
        assert_eq!(meta.name, "");
        assert_eq!(map["id"], Value::U32(7));
    }

    #[test]
    fn flattened_pointer_stays_empty_without_keys() {
        let mut item = Item::default();
        Decoder::new().decode_into(br#"{"name":"x"}"#, &mut item).unwrap();
        assert!(item.meta.is_none());
    }

    #[derive(Record, Default, Debug)]
    struct Ring {
        v: i32,
        #[record(flatten)]
        next: Option<Box<RingLink>>,
    }

    #[derive(Record, Default, Debug)]
    struct RingLink {
        w: i32,
        #[record(flatten)]
        back: Option<Box<Ring>>,
    }

    #[test]
    fn recursive_flatten_decodes_first_level() {
        let mut ring = Ring::default();
        let map = Decoder::new()
            .decode_into(br#"{"v":1,"w":2}"#, &mut ring)
            .unwrap();

        assert_eq!(ring.v, 1);
        let next = ring.next.unwrap();
        assert_eq!(next.w, 2);
        assert!(next.back.is_none());
        assert_eq!(map["v"], Value::I32(1));
        assert_eq!(map["w"], Value::I32(2));
    }

    // -------------------------------------------------------------------------
    // Hooks

    #[derive(Default, Debug, PartialEq)]
    struct Minutes(u32);

    impl CustomDecode for Minutes {
        fn decode_custom(&mut self, raw: &JsonValue) -> Result<Value, HookError> {
            let text = raw.as_str().ok_or_else(|| HookError::new("expected \"HH:MM\""))?;
            let (h, m) = text.split_once(':').ok_or_else(|| HookError::new("missing `:`"))?;
            let h: u32 = h.parse().map_err(HookError::from_source)?;
            let m: u32 = m.parse().map_err(HookError::from_source)?;
            self.0 = h * 60 + m;
            Ok(Value::U32(self.0))
        }
    }

    #[derive(Record, Default, Debug)]
    struct Shift {
        #[record(custom)]
        start: Minutes,
        who: String,
    }

    #[test]
    fn custom_field_decoder() {
        let mut shift = Shift::default();
        let map = Decoder::new()
            .decode_into(br#"{"start":"08:30","who":"ann"}"#, &mut shift)
            .unwrap();
        assert_eq!(shift.start, Minutes(510));
        assert_eq!(map["start"], Value::U32(510));

        let err = decoder(DecodeMode::FailoverOriginal)
            .decode_into(br#"{"start":"late","who":"bob"}"#, &mut shift)
            .unwrap_err();
        let errors = err.field_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_hook());
        assert_eq!(shift.start, Minutes(0));
        assert_eq!(err.partial_map().unwrap()["start"], Value::from("late"));
    }

    #[derive(Record, Default, Debug)]
    #[record(extra_sink)]
    struct Plugin {
        name: String,
        #[record(skip)]
        rest: ValueMap,
        #[record(skip)]
        calls: usize,
    }

    impl ExtraDataSink for Plugin {
        fn accept_extra(&mut self, extra: ValueMap) -> Result<(), HookError> {
            self.calls += 1;
            if extra.contains_key("forbidden") {
                return Err(HookError::new("forbidden key"));
            }
            self.rest = extra;
            Ok(())
        }
    }

    #[derive(Record, Default, Debug)]
    #[record(extra_sink)]
    struct Host {
        plugin: Plugin,
        plugins: Vec<Plugin>,
        port: u16,
        #[record(skip)]
        rest: ValueMap,
    }

    impl ExtraDataSink for Host {
        fn accept_extra(&mut self, extra: ValueMap) -> Result<(), HookError> {
            self.rest = extra;
            Ok(())
        }
    }

    #[test]
    fn extra_sink_gets_unknown_keys_per_level() {
        let raw = br#"{
            "plugin": {"name": "a", "x": 1, "y": [true]},
            "plugins": [{"name": "b"}, {"name": "c", "z": null}],
            "port": 80,
            "top": "level"
        }"#;
        let mut host = Host::default();
        let map = Decoder::new().decode_into(raw, &mut host).unwrap();

        assert_eq!(host.plugin.calls, 1);
        assert_eq!(host.plugin.rest.len(), 2);
        assert_eq!(host.plugin.rest["y"], Value::Seq(vec![Value::Bool(true)]));
        assert!(host.plugins[0].rest.is_empty());
        assert_eq!(host.plugins[0].calls, 1);
        assert_eq!(host.plugins[1].rest["z"], Value::Null);
        assert_eq!(host.rest.len(), 1);
        assert_eq!(host.rest["top"], Value::from("level"));

        // The mirror of a nested record still holds its unknown keys.
        assert_eq!(map["plugin"].get("x"), Some(&Value::F64(1.0)));
    }

    #[test]
    fn nested_sink_failure_fails_owning_field() {
        let raw = br#"{"plugin": {"name": "a", "forbidden": 1}, "port": 80}"#;

        let mut host = Host::default();
        let err = decoder(DecodeMode::MultiError).decode_into(raw, &mut host).unwrap_err();
        let errors = err.field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path().to_string(), "plugin");
        assert!(matches!(errors[0].kind(), FieldErrorKind::Sink(_)));
        // The owning field is reset, its siblings decode.
        assert_eq!(host.plugin.name, "");
        assert_eq!(host.port, 80);
        assert!(!err.partial_map().unwrap().contains_key("plugin"));

        let mut host = Host::default();
        let err = decoder(DecodeMode::FailFast).decode_into(raw, &mut host).unwrap_err();
        assert!(matches!(err, DecodeError::Field(_)));
    }

    #[test]
    fn sink_runs_despite_failed_sibling() {
        let raw = br#"{"plugin": {"name": 5, "extra": "kept"}, "port": "x", "more": 1}"#;

        for mode in [DecodeMode::MultiError, DecodeMode::FailoverOriginal] {
            let mut host = Host::default();
            let err = decoder(mode).decode_into(raw, &mut host).unwrap_err();

            let paths: Vec<String> = err.field_errors().iter().map(|e| e.path().to_string()).collect();
            assert_eq!(paths, ["plugin.name", "port"], "{mode:?}");
            // Nested and top-level sinks both fired once.
            assert_eq!(host.plugin.calls, 1, "{mode:?}");
            assert_eq!(host.plugin.rest["extra"], Value::from("kept"));
            assert_eq!(host.rest["more"], Value::F64(1.0));
        }

        let mut host = Host::default();
        decoder(DecodeMode::FailFast).decode_into(raw, &mut host).unwrap_err();
        assert_eq!(host.plugin.calls, 0);
        assert!(host.rest.is_empty());
    }

    #[test]
    fn top_level_sink_failure_has_root_path() {
        let mut plugin = Plugin::default();
        let err = decoder(DecodeMode::MultiError)
            .decode_into(br#"{"name":"p","forbidden":true}"#, &mut plugin)
            .unwrap_err();

        let errors = err.field_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].path().is_root());
        assert_eq!(plugin.name, "p");
        assert_eq!(err.partial_map().unwrap().len(), 2);
    }

    #[test]
    fn skip_populate_runs_sink_on_scratch() {
        let options = DecodeOptions::new().mode(DecodeMode::MultiError).skip_populate(true);

        let mut plugin = Plugin::default();
        let map = Decoder::new()
            .with_options(options)
            .decode_into(br#"{"name":"p","x":1}"#, &mut plugin)
            .unwrap();
        assert_eq!(map["x"], Value::F64(1.0));
        assert_eq!(plugin.calls, 0);
        assert!(plugin.rest.is_empty());

        // A failing sink is still reported.
        let err = Decoder::new()
            .with_options(options)
            .decode_into(br#"{"forbidden":true}"#, &mut plugin)
            .unwrap_err();
        assert!(matches!(err.field_errors()[0].kind(), FieldErrorKind::Sink(_)));
        assert_eq!(plugin.calls, 0);
    }

    #[derive(Record, Default, Debug)]
    #[record(custom)]
    struct Version {
        #[record(skip)]
        parts: Vec<u32>,
    }

    impl CustomDecode for Version {
        fn decode_custom(&mut self, raw: &JsonValue) -> Result<Value, HookError> {
            match raw {
                JsonValue::String(text) => {
                    self.parts = text
                        .split('.')
                        .map(str::parse)
                        .collect::<Result<_, _>>()
                        .map_err(HookError::from_source)?;
                    Ok(Value::from(text.as_str()))
                }
                JsonValue::Object(object) => {
                    let mut map = ValueMap::default();
                    map.insert("count".into(), Value::U64(object.len() as u64));
                    Ok(Value::Map(map))
                }
                _ => Err(HookError::new("unsupported version format")),
            }
        }
    }

    #[test]
    fn custom_decodable_records() {
        #[derive(Record, Default, Debug)]
        struct Package {
            version: Version,
        }

        let mut package = Package::default();
        let map = Decoder::new()
            .decode_into(br#"{"version":"1.20.3"}"#, &mut package)
            .unwrap();
        assert_eq!(package.version.parts, [1, 20, 3]);
        assert_eq!(map["version"], Value::from("1.20.3"));

        // At the top level, a map mirror becomes the result.
        let mut version = Version::default();
        let map = Decoder::new()
            .decode_into(br#"{"a":1,"b":2}"#, &mut version)
            .unwrap();
        assert_eq!(map["count"], Value::U64(2));

        let err = Decoder::new()
            .decode_into(br#"{"version":true}"#, &mut package)
            .unwrap_err();
        assert!(err.field_errors()[0].is_hook());
    }

    // -------------------------------------------------------------------------
    // Fatal errors

    #[test]
    fn input_errors_ignore_mode() {
        for mode in [DecodeMode::FailFast, DecodeMode::MultiError, DecodeMode::FailoverOriginal] {
            let mut config = Config::default();

            let err = decoder(mode).decode_into(b"[1,2]", &mut config).unwrap_err();
            assert!(matches!(err, DecodeError::Input(InputError::NotAnObject { found: "array" })));

            let err = decoder(mode).decode_into(b"{\"foo\":", &mut config).unwrap_err();
            assert!(matches!(err, DecodeError::Input(InputError::Malformed(_))));
        }
    }

    #[test]
    fn dynamic_target_needs_registration() {
        let decoder = Decoder::new();
        let mut config = Config::default();

        let err = decoder
            .decode_any(br#"{"foo":"bar"}"#, &mut config as &mut dyn Any)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Value(ValueError::Unregistered { .. })));

        decoder.register::<Config>();
        let map = decoder
            .decode_any(br#"{"foo":"bar"}"#, &mut config as &mut dyn Any)
            .unwrap();
        assert_eq!(config.foo, "bar");
        assert_eq!(map.len(), 1);

        // Not a record at all.
        let mut number = 5_u32;
        let err = decoder
            .decode_any_from_map(&JsonMap::new(), &mut number as &mut dyn Any)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Value(_)));
    }

    // -------------------------------------------------------------------------
    // Stores

    #[test]
    fn uncached_and_shared_stores() {
        let raw = br#"{"foo":"x"}"#;

        let mut config = Config::default();
        Decoder::uncached().decode_into(raw, &mut config).unwrap();
        assert_eq!(config.foo, "x");

        let cache = alloc::sync::Arc::new(TypeCache::new());
        let a = Decoder::with_store(cache.clone());
        let b = Decoder::with_store(cache.clone());
        a.register::<Config>();
        assert!(alloc::sync::Arc::ptr_eq(&a.descriptor::<Config>(), &b.descriptor::<Config>()));
        assert_eq!(cache.len(), 1);

        let _ = Decoder::with_store(NoCache).descriptor::<Config>();
    }

    #[test]
    fn free_functions_use_global_cache() {
        let mut config = Config::default();
        let map = crate::decode_into(br#"{"foo":"g"}"#, &mut config, &DecodeOptions::default()).unwrap();
        assert_eq!(map["foo"], Value::from("g"));
        assert!(TypeCache::global().contains(core::any::TypeId::of::<Config>()));

        let input = object(json!({ "boo": [4] }));
        crate::decode_from_map(&input, &mut config, &DecodeOptions::default()).unwrap();
        assert_eq!(config.boo, [4]);
    }
}
