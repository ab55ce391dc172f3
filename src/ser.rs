//! Zipson encoding.
//!
//! This module provides the [`Encoder`], which writes a [`Value`] tree to a
//! [`Sink`], and [`ValueSerializer`], which turns any `Serialize` type into a
//! [`Value`] first.
//!
//! ## Overview
//!
//! The encoder applies every space saving the format offers:
//!
//! - **Base-62 numbers**: integers and floats use a dense digit alphabet
//! - **Back-references**: repeated strings, numbers and dates become short ids
//! - **Templates**: runs of mappings with the same keys write their keys once
//! - **Run-length**: identical consecutive sequence elements collapse to `^` / `~n`
//!
//! ## Direct Encoder Usage
//!
//! ```rust
//! use serde_zipson::{zipson, CompressOptions, Encoder};
//!
//! let mut out = String::new();
//! Encoder::new(&mut out, CompressOptions::default())
//!     .encode(&zipson!([1, 1, "one", "one"]))
//!     .unwrap();
//! assert_eq!(out, "|Ê^¨one¨þ0÷");
//! ```
//!
//! Encoding never fails on well-formed values; errors come from the sink or
//! from an internal invariant being broken.

use crate::format::*;
use crate::number::{encode_float, encode_integer};
use crate::sink::Sink;
use crate::tables::{RefTable, ReferenceTables};
use crate::template::{Field, Template};
use crate::{CompressOptions, Error, Map, Result, Value};
use chrono::{DateTime, Utc};
use serde::{ser, Serialize};
use std::hash::Hash;
use tracing::debug;

/// Token triple of a back-referenceable kind.
struct KindTokens {
    first: char,
    reference: char,
    unreferenced: char,
}

const INTEGER_TOKENS: KindTokens = KindTokens {
    first: INTEGER_TOKEN,
    reference: REF_INTEGER_TOKEN,
    unreferenced: UNREFERENCED_INTEGER_TOKEN,
};

const FLOAT_TOKENS: KindTokens = KindTokens {
    first: FLOAT_TOKEN,
    reference: REF_FLOAT_TOKEN,
    unreferenced: UNREFERENCED_FLOAT_TOKEN,
};

const DATE_TOKENS: KindTokens = KindTokens {
    first: DATE_TOKEN,
    reference: REF_DATE_TOKEN,
    unreferenced: UNREFERENCED_DATE_TOKEN,
};

const LP_DATE_TOKENS: KindTokens = KindTokens {
    first: LP_DATE_TOKEN,
    reference: REF_LP_DATE_TOKEN,
    unreferenced: UNREFERENCED_LP_DATE_TOKEN,
};

static MISSING: Value = Value::Missing;

/// Where a fragment goes: the sink, or the scratch buffer of a sequence level.
#[derive(Clone, Copy, Debug)]
enum Out {
    Sink,
    Scratch(usize),
}

/// Writes one value to a sink with a fresh set of reference tables.
///
/// Created via [`Encoder::new`] and consumed by [`Encoder::encode`], so tables
/// never leak from one document into another.
pub struct Encoder<'a, S: Sink + ?Sized> {
    sink: &'a mut S,
    options: CompressOptions,
    tables: ReferenceTables,
    /// Element buffers indexed by sequence depth, reused across elements.
    scratch: Vec<String>,
    depth: usize,
}

impl<'a, S: Sink + ?Sized> Encoder<'a, S> {
    pub fn new(sink: &'a mut S, options: CompressOptions) -> Self {
        Encoder {
            sink,
            options,
            tables: ReferenceTables::new(),
            scratch: Vec::new(),
            depth: 0,
        }
    }

    /// Encodes `value` and ends the sink.
    pub fn encode(mut self, value: &Value) -> Result<()> {
        self.write_value(Out::Sink, value)?;
        self.sink.end()
    }

    fn write(&mut self, out: Out, fragment: &str) -> Result<()> {
        match out {
            Out::Sink => self.sink.write(fragment),
            Out::Scratch(level) => {
                self.scratch[level].push_str(fragment);
                Ok(())
            }
        }
    }

    #[inline]
    fn write_char(&mut self, out: Out, token: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.write(out, token.encode_utf8(&mut buf))
    }

    fn write_value(&mut self, out: Out, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.write_char(out, NULL_TOKEN),
            Value::Missing => self.write_char(out, UNDEFINED_TOKEN),
            Value::Bool(true) => self.write_char(out, BOOLEAN_TRUE_TOKEN),
            Value::Bool(false) => self.write_char(out, BOOLEAN_FALSE_TOKEN),
            Value::Integer(n) => self.write_integer(out, *n),
            Value::Float(f) => self.write_float(out, *f),
            Value::String(s) => self.write_string(out, s, self.options.detect_utc_timestamps),
            Value::Date(dt) => self.write_date(out, dt.timestamp_millis()),
            Value::Sequence(items) => self.write_sequence(out, items),
            Value::Mapping(map) => self.write_mapping(out, map),
        }
    }

    fn write_integer(&mut self, out: Out, number: i64) -> Result<()> {
        if is_small_integer(number) {
            return self.write_char(out, small_integer_token(number)?);
        }
        let fragment = referenced(
            &mut self.tables.integers,
            number,
            &encode_integer(number),
            &INTEGER_TOKENS,
        );
        self.write(out, &fragment)
    }

    fn write_float(&mut self, out: Out, float: f64) -> Result<()> {
        if !float.is_finite() {
            return self.write_char(out, NULL_TOKEN);
        }
        let compressed = encode_float(float, self.options.full_precision_floats);
        let fragment = referenced(
            &mut self.tables.floats,
            compressed.clone(),
            &compressed,
            &FLOAT_TOKENS,
        );
        self.write(out, &fragment)
    }

    fn write_date(&mut self, out: Out, millis: i64) -> Result<()> {
        let fragment = if millis % DATE_LOW_PRECISION == 0 {
            let units = millis / DATE_LOW_PRECISION;
            referenced(
                &mut self.tables.lp_dates,
                units,
                &encode_integer(units),
                &LP_DATE_TOKENS,
            )
        } else {
            referenced(
                &mut self.tables.dates,
                millis,
                &encode_integer(millis),
                &DATE_TOKENS,
            )
        };
        self.write(out, &fragment)
    }

    fn write_string(&mut self, out: Out, text: &str, sniff_dates: bool) -> Result<()> {
        if sniff_dates {
            if let Some(date) = sniff_utc_timestamp(text) {
                return self.write_date(out, date.timestamp_millis());
            }
        }

        if let Some(id) = self.tables.strings.lookup(text) {
            let fragment = format!("{}{}", REF_STRING_TOKEN, id);
            return self.write(out, &fragment);
        }

        let first = delimited(text, STRING_TOKEN);
        if self
            .tables
            .strings
            .try_register(text.to_string(), first.chars().count())
        {
            self.write(out, &first)
        } else {
            self.write(out, &delimited(text, UNREFERENCED_STRING_TOKEN))
        }
    }

    fn write_sequence(&mut self, out: Out, items: &[Value]) -> Result<()> {
        let level = self.depth;
        self.depth += 1;
        if self.scratch.len() <= level {
            self.scratch.push(String::new());
        }
        let item_out = Out::Scratch(level);

        self.write_char(out, ARRAY_START_TOKEN)?;

        let mut template = match items {
            [a, b, ..] => Template::detect(a, b, &self.options),
            _ => None,
        };
        if let Some(template) = &template {
            self.write_template_header(out, template.fields())?;
        }

        let mut previous = String::new();
        let mut has_previous = false;
        let mut repeated = 0usize;
        let mut repeat_many = 0i64;

        for (i, item) in items.iter().enumerate() {
            self.scratch[level].clear();

            if i > 1 && template.as_ref().is_some_and(|t| !t.conforms(item)) {
                debug!(index = i, "sequence template run ended");
                if repeat_many > 0 {
                    self.write(out, &encode_integer(repeat_many))?;
                    repeat_many = 0;
                }
                self.write_char(out, TEMPLATE_OBJECT_FINAL)?;
                template = None;
                has_previous = false;
                repeated = 0;
            }

            match &template {
                Some(template) => self.write_template_row(item_out, template.fields(), item)?,
                None if item.is_missing() => self.write_char(item_out, NULL_TOKEN)?,
                None => self.write_value(item_out, item)?,
            }

            let fragment = std::mem::take(&mut self.scratch[level]);
            if has_previous && fragment == previous {
                repeated += 1;
                if repeated >= ARRAY_REPEAT_COUNT_THRESHOLD {
                    if repeat_many == 0 {
                        self.write_char(out, ARRAY_REPEAT_MANY_TOKEN)?;
                    }
                    repeat_many += 1;
                } else {
                    self.write_char(out, ARRAY_REPEAT_TOKEN)?;
                }
                self.scratch[level] = fragment;
            } else {
                repeated = 0;
                if repeat_many > 0 {
                    self.write(out, &encode_integer(repeat_many))?;
                    repeat_many = 0;
                }
                self.write(out, &fragment)?;
                self.scratch[level] = std::mem::replace(&mut previous, fragment);
                has_previous = true;
            }
        }

        if repeat_many > 0 {
            self.write(out, &encode_integer(repeat_many))?;
        }
        if template.is_some() {
            self.write_char(out, TEMPLATE_OBJECT_FINAL)?;
        }
        self.write_char(out, ARRAY_END_TOKEN)?;

        self.depth -= 1;
        Ok(())
    }

    fn write_mapping(&mut self, out: Out, map: &Map) -> Result<()> {
        self.write_char(out, OBJECT_START_TOKEN)?;

        let mut values = map.values();
        let mut template = match (values.next(), values.next()) {
            (Some(a), Some(b)) => Template::detect(a, b, &self.options),
            _ => None,
        };
        if let Some(template) = &template {
            self.write_template_header(out, template.fields())?;
        }

        for (i, (key, value)) in map.iter().enumerate() {
            if i > 1 && template.as_ref().is_some_and(|t| !t.conforms(value)) {
                debug!(index = i, "mapping template run ended");
                self.write_char(out, TEMPLATE_OBJECT_FINAL)?;
                template = None;
            }

            match &template {
                Some(template) => {
                    self.write_string(out, key, false)?;
                    self.write_template_row(out, template.fields(), value)?;
                }
                None if value.is_missing() => {}
                None => {
                    self.write_string(out, key, false)?;
                    self.write_value(out, value)?;
                }
            }
        }

        if template.is_some() {
            self.write_char(out, TEMPLATE_OBJECT_FINAL)?;
        }
        self.write_char(out, OBJECT_END_TOKEN)
    }

    fn write_template_header(&mut self, out: Out, fields: &[Field]) -> Result<()> {
        self.write_char(out, TEMPLATE_OBJECT_START)?;
        for field in fields {
            self.write_string(out, &field.key, false)?;
            if let Some(nested) = field.expanded() {
                self.write_template_header(out, nested)?;
            }
        }
        self.write_char(out, TEMPLATE_OBJECT_END)
    }

    fn write_template_row(&mut self, out: Out, fields: &[Field], value: &Value) -> Result<()> {
        let Value::Mapping(map) = value else {
            return Err(Error::template(&format!(
                "expected a mapping row, found {}",
                value.kind()
            )));
        };
        for field in fields {
            let leaf = map.get(&field.key).unwrap_or(&MISSING);
            match field.expanded() {
                Some(nested) => self.write_template_row(out, nested, leaf)?,
                None => self.write_value(out, leaf)?,
            }
        }
        Ok(())
    }
}

/// Reference, first occurrence or unreferenced form of a table-backed value.
fn referenced<K: Eq + Hash>(
    table: &mut RefTable<K>,
    key: K,
    payload: &str,
    tokens: &KindTokens,
) -> String {
    if let Some(id) = table.lookup(&key) {
        return format!("{}{}", tokens.reference, id);
    }
    let first = format!("{}{}", tokens.first, payload);
    if table.try_register(key, first.chars().count()) {
        first
    } else {
        format!("{}{}", tokens.unreferenced, payload)
    }
}

/// Wraps `text` in `delimiter`, escaping the delimiter and the escape character.
fn delimited(text: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    out.push(delimiter);
    for ch in text.chars() {
        if ch == ESCAPE_CHARACTER || ch == delimiter {
            out.push(ESCAPE_CHARACTER);
        }
        out.push(ch);
    }
    out.push(delimiter);
    out
}

/// Parses `YYYY-MM-DDTHH:MM:SS[.f{1,3}]Z` strings.
fn sniff_utc_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let bytes = text.as_bytes();
    if bytes.len() < 20 || bytes[bytes.len() - 1] != b'Z' {
        return None;
    }
    let shaped = bytes[..19].iter().enumerate().all(|(i, &b)| match i {
        4 | 7 => b == b'-',
        10 => b == b'T',
        13 | 16 => b == b':',
        _ => b.is_ascii_digit(),
    });
    if !shaped {
        return None;
    }
    match &bytes[19..bytes.len() - 1] {
        [] => {}
        [b'.', digits @ ..] if (1..=3).contains(&digits.len()) => {
            if !digits.iter().all(u8::is_ascii_digit) {
                return None;
            }
        }
        _ => return None,
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Serializer producing a [`Value`] tree.
///
/// Enum variants other than unit variants become single-key mappings from the
/// variant name to the content.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: Map,
    current_key: Option<String>,
    variant: Option<&'static str>,
}

fn tagged(variant: &'static str, content: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(variant.to_string(), content);
    Value::Mapping(map)
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        match i64::try_from(v) {
            Ok(i) => Ok(Value::Integer(i)),
            Err(_) => Ok(Value::Float(v as f64)),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Sequence(
            v.iter().map(|&b| Value::Integer(i64::from(b))).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(variant)))
    }
}

impl SerializeVec {
    fn new(len: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(len),
            variant,
        }
    }

    fn finish(self) -> Value {
        let items = Value::Sequence(self.vec);
        match self.variant {
            Some(variant) => tagged(variant, items),
            None => items,
        }
    }
}

impl SerializeMap {
    fn new(variant: Option<&'static str>) -> Self {
        SerializeMap {
            map: Map::new(),
            current_key: None,
            variant,
        }
    }

    fn finish(self) -> Value {
        let fields = Value::Mapping(self.map);
        match self.variant {
            Some(variant) => tagged(variant, fields),
            None => fields,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_value(key)? {
            Value::String(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            Value::Integer(i) => {
                self.current_key = Some(i.to_string());
                Ok(())
            }
            _ => Err(Error::custom("Map keys must be strings")),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

/// Converts any `Serialize` type into a [`Value`].
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use serde_zipson::{to_value, zipson};
///
/// #[derive(Serialize)]
/// enum Shape {
///     Circle { r: u32 },
/// }
///
/// assert_eq!(to_value(&Shape::Circle { r: 2 }).unwrap(), zipson!({ "Circle": { "r": 2 } }));
/// ```
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zipson;

    fn encode(value: &Value) -> String {
        encode_with(value, CompressOptions::default())
    }

    fn encode_with(value: &Value, options: CompressOptions) -> String {
        let mut out = String::new();
        Encoder::new(&mut out, options).encode(value).unwrap();
        out
    }

    #[test]
    fn test_scalars() {
        assert_eq!(encode(&Value::Null), "§");
        assert_eq!(encode(&Value::Missing), "µ");
        assert_eq!(encode(&Value::Bool(true)), "»");
        assert_eq!(encode(&Value::Bool(false)), "«");
        assert_eq!(encode(&Value::Integer(0)), "É");
        assert_eq!(encode(&Value::Integer(-9)), "À");
        assert_eq!(encode(&Value::Integer(74)), "¢1C");
        assert_eq!(encode(&Value::Float(f64::NAN)), "§");
        assert_eq!(encode(&Value::Float(f64::INFINITY)), "§");
    }

    #[test]
    fn test_integer_references() {
        assert_eq!(encode(&zipson!([1000, 1000, 2000])), "|¢G8º0¢WG÷");
        // `10` is two characters as a first occurrence, too short to pay off
        assert_eq!(encode(&zipson!([10, 20, 10])), "|¤A¤K¤A÷");
    }

    #[test]
    fn test_float_references() {
        assert_eq!(encode(&zipson!([1.5, 2.5, 1.5])), "|£1.84£2.84Ý0÷");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(encode(&Value::from("a¨b")), "¨a\\¨b¨");
        assert_eq!(encode(&Value::from("a\\b")), "¨a\\\\b¨");
        assert_eq!(encode(&Value::from("")), "´´");
    }

    #[test]
    fn test_string_references() {
        assert_eq!(encode(&zipson!(["ab", "cd", "ab"])), "|¨ab¨¨cd¨þ0÷");
        assert_eq!(encode(&zipson!(["a", "a"])), "|¨a¨þ0÷");
    }

    #[test]
    fn test_dates() {
        let lp = DateTime::from_timestamp_millis(1_500_000_000_000).unwrap();
        let precise = DateTime::from_timestamp_millis(1_500_000_000_123).unwrap();
        let lp_units = encode_integer(15_000_000);
        let ms = encode_integer(1_500_000_000_123);
        assert_eq!(encode(&Value::Date(lp)), format!("±{}", lp_units));
        assert_eq!(encode(&Value::Date(precise)), format!("Ø{}", ms));
        assert_eq!(
            encode(&Value::Sequence(vec![
                Value::Date(precise),
                Value::Integer(1),
                Value::Date(precise)
            ])),
            format!("|Ø{}Ê×0÷", ms)
        );
    }

    #[test]
    fn test_utc_sniffing() {
        let text = Value::from("2017-07-14T02:40:00.123Z");
        let sniffing = CompressOptions::new().with_detect_utc_timestamps(true);
        assert!(encode_with(&text, sniffing.clone()).starts_with('Ø'));
        assert!(encode(&text).starts_with('¨'));

        assert!(sniff_utc_timestamp("2017-07-14T02:40:00Z").is_some());
        assert!(sniff_utc_timestamp("2017-07-14T02:40:00.123456Z").is_none());
        assert!(sniff_utc_timestamp("2017-07-14 02:40:00Z").is_none());
        assert!(sniff_utc_timestamp("2017-13-14T02:40:00Z").is_none());

        // keys are never sniffed
        let mut map = Map::new();
        map.insert("2017-07-14T02:40:00Z".to_string(), Value::Null);
        assert!(encode_with(&Value::Mapping(map), sniffing).starts_with("{¨"));
    }

    #[test]
    fn test_run_length() {
        assert_eq!(encode(&zipson!([1, 1, 1, 1, 1])), "|Ê^^^^÷");
        assert_eq!(encode(&zipson!([1, 1, 1, 1, 1, 1, 1, 2])), "|Ê^^^^~2Ë÷");
        let fifty = Value::Sequence(vec![Value::Integer(1); 50]);
        assert_eq!(encode(&fifty), "|Ê^^^^~j÷");
    }

    #[test]
    fn test_repeats_are_per_level() {
        assert_eq!(encode(&zipson!([[1, 1], [1, 1]])), "||Ê^÷^÷");
    }

    #[test]
    fn test_missing_in_containers() {
        let seq = Value::Sequence(vec![Value::Missing, Value::Integer(1)]);
        assert_eq!(encode(&seq), "|§Ê÷");
        let map = zipson!({ "a": (Value::Missing), "b": 1 });
        assert_eq!(encode(&map), "{¨b¨Ê}");
    }

    #[test]
    fn test_sequence_template() {
        let value = zipson!([
            { "a": 1, "b": "x" },
            { "a": 2, "b": "y" },
            { "a": 3, "b": "y" }
        ]);
        assert_eq!(encode(&value), "|¯¨a¨¨b¨¬Ê¨x¨Ë¨y¨Ìþ3¦÷");
    }

    #[test]
    fn test_template_ends_on_divergence() {
        let value = zipson!([{ "a": 1 }, { "a": 2 }, { "b": 3 }]);
        assert_eq!(encode(&value), "|¯¨a¨¬ÊË¦{¨b¨Ì}÷");
    }

    #[test]
    fn test_template_rows_repeat() {
        let value = zipson!([{ "a": 1 }, { "a": 1 }, { "a": 1 }]);
        assert_eq!(encode(&value), "|¯¨a¨¬Ê^^¦÷");
    }

    #[test]
    fn test_repeat_state_resets_after_template() {
        let value = zipson!([{ "a": 1 }, { "a": 1 }, 1]);
        assert_eq!(encode(&value), "|¯¨a¨¬Ê^¦Ê÷");
    }

    #[test]
    fn test_nested_template_header() {
        let value = zipson!([
            { "id": 1, "pos": { "x": 1, "y": 2 } },
            { "id": 2, "pos": { "x": 3, "y": 4 } }
        ]);
        assert_eq!(encode(&value), "|¯¨id¨¨pos¨¯¨x¨¨y¨¬¬ÊÊËËÌÍ¦÷");
    }

    #[test]
    fn test_mapping_template() {
        let value = zipson!({
            "u1": { "n": 1 },
            "u2": { "n": 2 },
            "u3": 3
        });
        assert_eq!(encode(&value), "{¯¨n¨¬¨u1¨Ê¨u2¨Ë¦¨u3¨Ì}");
    }

    #[test]
    fn test_value_serializer_enums() {
        #[derive(Serialize)]
        enum E {
            Unit,
            New(u8),
            Tuple(u8, u8),
        }
        assert_eq!(to_value(&E::Unit).unwrap(), zipson!("Unit"));
        assert_eq!(to_value(&E::New(1)).unwrap(), zipson!({ "New": 1 }));
        assert_eq!(to_value(&E::Tuple(1, 2)).unwrap(), zipson!({ "Tuple": [1, 2] }));
        assert_eq!(to_value(&u64::MAX).unwrap(), Value::Float(u64::MAX as f64));
    }
}
