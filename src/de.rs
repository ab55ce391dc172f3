//! Zipson decoding.
//!
//! This module provides the one-shot [`decode`] entry point, the incremental
//! [`Decoder`], and [`ValueDeserializer`], which turns a decoded [`Value`] into
//! any `Deserialize` type.
//!
//! ## Overview
//!
//! Decoding is a single left-to-right walk over the text. Nesting is tracked with
//! an explicit stack of targets instead of recursion:
//!
//! - **Containers**: open tokens push a target, close tokens pop it and feed the
//!   finished value into the target below
//! - **Templates**: a header target collects key paths, then a body target
//!   rebuilds one mapping per row of values
//! - **Suspension**: a value whose payload may continue past the end of the
//!   buffered text is left unread until more text arrives
//!
//! ## Incremental Decoding
//!
//! ```rust
//! use serde_zipson::{zipson, Decoder};
//!
//! let mut decoder = Decoder::new();
//! assert_eq!(decoder.feed(Some("|¨al")).unwrap(), None);
//! assert_eq!(decoder.feed(Some("pha¨þ0")).unwrap(), None);
//! assert_eq!(decoder.feed(Some("÷")).unwrap(), None);
//! let value = decoder.feed(None).unwrap();
//! assert_eq!(value, Some(zipson!(["alpha", "alpha"])));
//! ```

use crate::format::*;
use crate::number::{decode_float, decode_integer};
use crate::tables::OrderedTables;
use crate::{Error, Map, Result, Value};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, DeserializeOwned};
use serde::forward_to_deserialize_any;
use tracing::{debug, trace};

/// Replays a template's key paths against incoming row values.
#[derive(Debug)]
struct Rows {
    paths: Vec<Vec<String>>,
    /// Next path to fill; zero between rows.
    index: usize,
    current: Map,
}

impl Rows {
    fn new(paths: Vec<Vec<String>>) -> Self {
        Rows {
            paths,
            index: 0,
            current: Map::new(),
        }
    }

    /// Places the next value, returning the row once its last path is filled.
    fn put(&mut self, value: Value, token: char, position: usize) -> Result<Option<Map>> {
        insert_path(&mut self.current, &self.paths[self.index], value, token, position)?;
        self.index += 1;
        if self.index < self.paths.len() {
            return Ok(None);
        }
        self.index = 0;
        Ok(Some(std::mem::take(&mut self.current)))
    }
}

fn insert_path(
    map: &mut Map,
    path: &[String],
    value: Value,
    token: char,
    position: usize,
) -> Result<()> {
    let Some((leaf, parents)) = path.split_last() else {
        return Err(Error::unexpected_token(position, token, "empty template path"));
    };
    let mut node = map;
    for segment in parents {
        let slot = node
            .entry(segment.clone())
            .or_insert_with(|| Value::Mapping(Map::new()));
        node = match slot {
            Value::Mapping(inner) => inner,
            _ => {
                return Err(Error::unexpected_token(
                    position,
                    token,
                    "template path crosses a non-mapping value",
                ))
            }
        };
    }
    if !value.is_missing() {
        node.insert(leaf.clone(), value);
    }
    Ok(())
}

/// What the decoder is currently filling.
#[derive(Debug)]
enum Target {
    /// Bottom of the stack, holding the finished document.
    Root(Option<Value>),
    Sequence(Vec<Value>),
    Mapping {
        entries: Map,
        key: Option<String>,
    },
    TemplateHeader {
        paths: Vec<Vec<String>>,
        route: Vec<String>,
        tokens: Vec<String>,
        level: usize,
    },
    TemplateSequence {
        items: Vec<Value>,
        rows: Rows,
    },
    TemplateMapping {
        entries: Map,
        key: Option<String>,
        rows: Rows,
    },
}

/// Resumable decode state: a target stack plus a position in the buffered text.
#[derive(Debug)]
struct Cursor {
    /// Byte index of the next unread token in the current buffer.
    index: usize,
    /// Bytes already dropped from the front of the buffer.
    consumed: usize,
    stack: Vec<Target>,
    /// No more text will arrive; truncation is an error instead of a pause.
    drain: bool,
}

impl Cursor {
    fn new(drain: bool) -> Self {
        Cursor {
            index: 0,
            consumed: 0,
            stack: vec![Target::Root(None)],
            drain,
        }
    }

    /// Reads tokens from `data` until it is exhausted or a value needs more text.
    fn run(&mut self, data: &str, tables: &mut OrderedTables) -> Result<()> {
        while let Some(token) = data[self.index..].chars().next() {
            let start = self.index;
            let position = self.consumed + start;
            let after = start + token.len_utf8();

            match token {
                ARRAY_START_TOKEN => self.stack.push(Target::Sequence(Vec::new())),
                OBJECT_START_TOKEN => self.stack.push(Target::Mapping {
                    entries: Map::new(),
                    key: None,
                }),
                ARRAY_END_TOKEN | OBJECT_END_TOKEN => self.close(token, position)?,
                ARRAY_REPEAT_TOKEN => self.repeat(1, token, position)?,
                ARRAY_REPEAT_MANY_TOKEN => {
                    self.repeat_target(token, position)?;
                    let Some(end) = payload_end(data, after, self.drain) else {
                        trace!(position, "repeat count may continue, waiting for input");
                        return Ok(());
                    };
                    let payload_position = self.consumed + after;
                    if end == data.len() && end == after {
                        return Err(Error::unexpected_eof(payload_position, "repeat count"));
                    }
                    let count = decode_integer(&data[after..end])
                        .map_err(|e| e.at_offset(payload_position))?;
                    let count = match usize::try_from(count) {
                        Ok(0) => {
                            return Err(Error::invalid_number(payload_position, "zero repeat count"))
                        }
                        Ok(count) => count,
                        Err(_) => {
                            return Err(Error::invalid_number(
                                payload_position,
                                "negative repeat count",
                            ))
                        }
                    };
                    self.repeat(count, token, position)?;
                    self.index = end;
                    continue;
                }
                TEMPLATE_OBJECT_START => self.open_template(position)?,
                TEMPLATE_OBJECT_END => self.close_template_level(position)?,
                TEMPLATE_OBJECT_FINAL => self.finalize_template(position)?,
                _ => {
                    let decoded = decode_scalar(token, data, start, self.drain, tables)
                        .map_err(|e| e.at_offset(self.consumed))?;
                    let Some((value, end)) = decoded else {
                        trace!(position, token = %token, "value may continue, waiting for input");
                        return Ok(());
                    };
                    self.feed_value(value, token, position)?;
                    self.index = end;
                    continue;
                }
            }
            self.index = after;
        }
        Ok(())
    }

    fn position(&self) -> usize {
        self.consumed + self.index
    }

    fn repeat_target(&mut self, token: char, position: usize) -> Result<&mut Vec<Value>> {
        match self.stack.last_mut() {
            Some(Target::Sequence(items)) => Ok(items),
            Some(Target::TemplateSequence { items, rows }) if rows.index == 0 => Ok(items),
            _ => Err(Error::unexpected_token(
                position,
                token,
                "repeat outside of a sequence",
            )),
        }
    }

    fn repeat(&mut self, count: usize, token: char, position: usize) -> Result<()> {
        let items = self.repeat_target(token, position)?;
        let Some(last) = items.last().cloned() else {
            return Err(Error::unexpected_token(
                position,
                token,
                "repeat without a previous element",
            ));
        };
        if items.try_reserve(count).is_err() {
            return Err(Error::invalid_number(position, "repeat count too large"));
        }
        items.resize(items.len() + count, last);
        Ok(())
    }

    fn close(&mut self, token: char, position: usize) -> Result<()> {
        let closed = match self.stack.pop() {
            Some(Target::Sequence(items)) if token == ARRAY_END_TOKEN => Value::Sequence(items),
            Some(Target::Mapping { entries, key: None }) if token == OBJECT_END_TOKEN => {
                Value::Mapping(entries)
            }
            Some(target) => {
                let context = match target {
                    Target::Root(_) => "close token without an open container",
                    Target::Mapping { key: Some(_), .. } if token == OBJECT_END_TOKEN => {
                        "mapping closed with a pending key"
                    }
                    Target::TemplateHeader { .. }
                    | Target::TemplateSequence { .. }
                    | Target::TemplateMapping { .. } => "container closed inside a template",
                    _ => "close token does not match the open container",
                };
                return Err(Error::unexpected_token(position, token, context));
            }
            None => {
                return Err(Error::unexpected_token(position, token, "no active target"));
            }
        };
        self.feed_value(closed, token, position)
    }

    fn open_template(&mut self, position: usize) -> Result<()> {
        if let Some(Target::TemplateHeader {
            paths,
            route,
            tokens,
            level,
        }) = self.stack.last_mut()
        {
            let Some(parent) = tokens.pop() else {
                return Err(Error::unexpected_token(
                    position,
                    TEMPLATE_OBJECT_START,
                    "nested template header without a key",
                ));
            };
            flush_tokens(paths, route, tokens);
            route.push(parent);
            *level += 1;
            return Ok(());
        }

        let opens = match self.stack.last() {
            Some(Target::Sequence(items)) => items.is_empty(),
            Some(Target::Mapping { entries, key }) => entries.is_empty() && key.is_none(),
            _ => false,
        };
        if !opens {
            return Err(Error::unexpected_token(
                position,
                TEMPLATE_OBJECT_START,
                "template header outside of an empty container",
            ));
        }
        self.stack.push(Target::TemplateHeader {
            paths: Vec::new(),
            route: Vec::new(),
            tokens: Vec::new(),
            level: 0,
        });
        Ok(())
    }

    fn close_template_level(&mut self, position: usize) -> Result<()> {
        let paths = match self.stack.last_mut() {
            Some(Target::TemplateHeader {
                paths,
                route,
                tokens,
                level,
            }) => {
                flush_tokens(paths, route, tokens);
                if *level > 0 {
                    route.pop();
                    *level -= 1;
                    return Ok(());
                }
                std::mem::take(paths)
            }
            _ => {
                return Err(Error::unexpected_token(
                    position,
                    TEMPLATE_OBJECT_END,
                    "template end outside of a header",
                ))
            }
        };
        self.stack.pop();

        if paths.is_empty() {
            return Err(Error::unexpected_token(
                position,
                TEMPLATE_OBJECT_END,
                "template header without fields",
            ));
        }
        let path_count = paths.len();
        let rows = Rows::new(paths);
        let body = match self.stack.pop() {
            Some(Target::Sequence(items)) => Target::TemplateSequence { items, rows },
            Some(Target::Mapping { entries, key: None }) => Target::TemplateMapping {
                entries,
                key: None,
                rows,
            },
            _ => {
                return Err(Error::unexpected_token(
                    position,
                    TEMPLATE_OBJECT_END,
                    "template header without a container",
                ))
            }
        };
        let kind = if matches!(body, Target::TemplateSequence { .. }) {
            "sequence"
        } else {
            "mapping"
        };
        debug!(paths = path_count, body = kind, "template header complete");
        self.stack.push(body);
        Ok(())
    }

    fn finalize_template(&mut self, position: usize) -> Result<()> {
        let restored = match self.stack.pop() {
            Some(Target::TemplateHeader { .. }) => return Ok(()),
            Some(Target::TemplateSequence { items, rows }) if rows.index == 0 => {
                Target::Sequence(items)
            }
            Some(Target::TemplateMapping {
                entries,
                key: None,
                rows,
            }) if rows.index == 0 => Target::Mapping { entries, key: None },
            Some(Target::TemplateSequence { .. } | Target::TemplateMapping { .. }) => {
                return Err(Error::unexpected_token(
                    position,
                    TEMPLATE_OBJECT_FINAL,
                    "template finalized in the middle of a row",
                ))
            }
            _ => {
                return Err(Error::unexpected_token(
                    position,
                    TEMPLATE_OBJECT_FINAL,
                    "template finalize outside of a template",
                ))
            }
        };
        self.stack.push(restored);
        Ok(())
    }

    fn feed_value(&mut self, value: Value, token: char, position: usize) -> Result<()> {
        let Some(top) = self.stack.last_mut() else {
            return Err(Error::unexpected_token(position, token, "no active target"));
        };
        match top {
            Target::Root(slot) => {
                if slot.is_some() {
                    return Err(Error::TrailingValue { position });
                }
                *slot = Some(value);
            }
            Target::Sequence(items) => {
                items.push(if value.is_missing() { Value::Null } else { value });
            }
            Target::Mapping { entries, key } => match key.take() {
                Some(key) => {
                    if !value.is_missing() {
                        entries.insert(key, value);
                    }
                }
                None => *key = Some(mapping_key(value, token, position)?),
            },
            Target::TemplateHeader { tokens, .. } => {
                tokens.push(mapping_key(value, token, position)?);
            }
            Target::TemplateSequence { items, rows } => {
                if let Some(row) = rows.put(value, token, position)? {
                    items.push(Value::Mapping(row));
                }
            }
            Target::TemplateMapping { entries, key, rows } => {
                if key.is_none() {
                    *key = Some(mapping_key(value, token, position)?);
                } else if let Some(row) = rows.put(value, token, position)? {
                    if let Some(key) = key.take() {
                        entries.insert(key, Value::Mapping(row));
                    }
                }
            }
        }
        Ok(())
    }

    /// Takes the root value once the input is known to be complete.
    fn finish(&mut self) -> Result<Value> {
        let position = self.position();
        if self.stack.len() > 1 {
            return Err(Error::unexpected_eof(position, "close of an open container"));
        }
        match self.stack.pop() {
            Some(Target::Root(Some(value))) => Ok(value),
            _ => Err(Error::unexpected_eof(position, "a value")),
        }
    }
}

fn flush_tokens(paths: &mut Vec<Vec<String>>, route: &[String], tokens: &mut Vec<String>) {
    for token in tokens.drain(..) {
        let mut path = route.to_vec();
        path.push(token);
        paths.push(path);
    }
}

fn mapping_key(value: Value, token: char, position: usize) -> Result<String> {
    match value {
        Value::String(key) => Ok(key),
        other => Err(Error::unexpected_token(
            position,
            token,
            &format!("expected a string key, found {}", other.kind()),
        )),
    }
}

/// End of the payload run starting at `from`, or `None` when the run reaches
/// the end of the buffer and more text may follow.
fn payload_end(data: &str, from: usize, drain: bool) -> Option<usize> {
    let run = data.as_bytes()[from..]
        .iter()
        .take_while(|&&byte| is_payload_byte(byte))
        .count();
    let end = from + run;
    if end == data.len() && !drain {
        None
    } else {
        Some(end)
    }
}

/// Unescaped text of a delimited string and the index past its closing delimiter.
fn scan_string(data: &str, from: usize, delimiter: char) -> Option<(String, usize)> {
    let mut text = String::new();
    let mut chars = data[from..].char_indices();
    while let Some((i, ch)) = chars.next() {
        if ch == ESCAPE_CHARACTER {
            let (_, escaped) = chars.next()?;
            text.push(escaped);
        } else if ch == delimiter {
            return Some((text, from + i + ch.len_utf8()));
        } else {
            text.push(ch);
        }
    }
    None
}

fn is_payload_token(token: char) -> bool {
    matches!(
        token,
        INTEGER_TOKEN
            | REF_INTEGER_TOKEN
            | UNREFERENCED_INTEGER_TOKEN
            | FLOAT_TOKEN
            | REF_FLOAT_TOKEN
            | UNREFERENCED_FLOAT_TOKEN
            | DATE_TOKEN
            | REF_DATE_TOKEN
            | UNREFERENCED_DATE_TOKEN
            | LP_DATE_TOKEN
            | REF_LP_DATE_TOKEN
            | UNREFERENCED_LP_DATE_TOKEN
            | REF_STRING_TOKEN
    )
}

/// Decodes the value starting with `token` at byte `start` of `data`.
///
/// Returns the value and the index just past it, or `None` when the value may
/// continue beyond the buffered text. Ordered tables are only appended to once
/// a first-occurrence value is complete, so a `None` leaves them untouched.
fn decode_scalar(
    token: char,
    data: &str,
    start: usize,
    drain: bool,
    tables: &mut OrderedTables,
) -> Result<Option<(Value, usize)>> {
    let after = start + token.len_utf8();
    if let Some(number) = small_integer_value(token) {
        return Ok(Some((Value::Integer(number), after)));
    }

    let value = match token {
        BOOLEAN_TRUE_TOKEN => Value::Bool(true),
        BOOLEAN_FALSE_TOKEN => Value::Bool(false),
        NULL_TOKEN => Value::Null,
        UNDEFINED_TOKEN => Value::Missing,
        STRING_TOKEN | UNREFERENCED_STRING_TOKEN => {
            let Some((text, end)) = scan_string(data, after, token) else {
                if drain {
                    return Err(Error::unexpected_eof(data.len(), "closing string delimiter"));
                }
                return Ok(None);
            };
            if token == STRING_TOKEN {
                tables.strings.push(text.clone());
            }
            return Ok(Some((Value::String(text), end)));
        }
        _ if is_payload_token(token) => {
            let Some(end) = payload_end(data, after, drain) else {
                return Ok(None);
            };
            if end == data.len() && end == after {
                return Err(Error::unexpected_eof(end, "value payload"));
            }
            let value = decode_payload(token, &data[after..end], after, tables)?;
            return Ok(Some((value, end)));
        }
        _ => return Err(Error::unexpected_token(start, token, "unknown token")),
    };
    Ok(Some((value, after)))
}

fn decode_payload(
    token: char,
    payload: &str,
    position: usize,
    tables: &mut OrderedTables,
) -> Result<Value> {
    let integer = || decode_integer(payload).map_err(|e| e.at_offset(position));

    let value = match token {
        INTEGER_TOKEN => {
            let number = integer()?;
            tables.integers.push(number);
            Value::Integer(number)
        }
        UNREFERENCED_INTEGER_TOKEN => Value::Integer(integer()?),
        REF_INTEGER_TOKEN => Value::Integer(*resolve(&tables.integers, payload, position, "integer")?),

        FLOAT_TOKEN => {
            let float = decode_float(payload).map_err(|e| e.at_offset(position))?;
            tables.floats.push(float);
            Value::Float(float)
        }
        UNREFERENCED_FLOAT_TOKEN => {
            Value::Float(decode_float(payload).map_err(|e| e.at_offset(position))?)
        }
        REF_FLOAT_TOKEN => Value::Float(*resolve(&tables.floats, payload, position, "float")?),

        DATE_TOKEN => {
            let date = date_from_millis(integer()?, position)?;
            tables.dates.push(date);
            Value::Date(date)
        }
        UNREFERENCED_DATE_TOKEN => Value::Date(date_from_millis(integer()?, position)?),
        REF_DATE_TOKEN => Value::Date(*resolve(&tables.dates, payload, position, "date")?),

        LP_DATE_TOKEN => {
            let date = date_from_units(integer()?, position)?;
            tables.lp_dates.push(date);
            Value::Date(date)
        }
        UNREFERENCED_LP_DATE_TOKEN => Value::Date(date_from_units(integer()?, position)?),
        REF_LP_DATE_TOKEN => Value::Date(*resolve(&tables.lp_dates, payload, position, "date")?),

        REF_STRING_TOKEN => Value::String(resolve(&tables.strings, payload, position, "string")?.clone()),
        _ => return Err(Error::unexpected_token(position, token, "unknown token")),
    };
    Ok(value)
}

fn resolve<'t, T>(table: &'t [T], payload: &str, position: usize, kind: &'static str) -> Result<&'t T> {
    let id = decode_integer(payload).map_err(|e| e.at_offset(position))?;
    usize::try_from(id)
        .ok()
        .and_then(|id| table.get(id))
        .ok_or_else(|| Error::invalid_reference(position, kind, payload))
}

fn date_from_millis(millis: i64, position: usize) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::invalid_number(position, "date out of range"))
}

fn date_from_units(units: i64, position: usize) -> Result<DateTime<Utc>> {
    let millis = units
        .checked_mul(DATE_LOW_PRECISION)
        .ok_or_else(|| Error::invalid_number(position, "date out of range"))?;
    date_from_millis(millis, position)
}

/// Decodes a complete zipson document.
///
/// # Errors
///
/// Fails on any malformed token, on truncated input, and on text left over
/// after the root value.
pub fn decode(text: &str) -> Result<Value> {
    let mut cursor = Cursor::new(true);
    let mut tables = OrderedTables::new();
    cursor.run(text, &mut tables)?;
    cursor.finish()
}

/// Incremental decoder fed with chunks of one document.
///
/// Chunks may be cut anywhere, including in the middle of a token. The value is
/// returned once the end signal (`None`) is fed, and equals what [`decode`]
/// returns for the concatenated text.
///
/// ```rust
/// use serde_zipson::{Decoder, Value};
///
/// let mut decoder = Decoder::new();
/// decoder.push("¢G").unwrap();
/// decoder.push("8").unwrap();
/// assert_eq!(decoder.finish().unwrap(), Value::Integer(1000));
/// ```
#[derive(Debug)]
pub struct Decoder {
    cursor: Cursor,
    tables: OrderedTables,
    /// Text not yet consumed by the cursor.
    buffer: String,
    finished: bool,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            cursor: Cursor::new(false),
            tables: OrderedTables::new(),
            buffer: String::new(),
            finished: false,
        }
    }

    /// Feeds the next chunk, or the end signal when `chunk` is `None`.
    ///
    /// Returns `Some(value)` only in response to the end signal. After the end
    /// signal or an error, every further call fails.
    pub fn feed(&mut self, chunk: Option<&str>) -> Result<Option<Value>> {
        if self.finished {
            return Err(Error::custom("decoder already finished"));
        }
        match chunk {
            Some("") => return Ok(None),
            Some(chunk) => self.buffer.push_str(chunk),
            None => {
                debug!(position = self.cursor.position(), "end of input");
                self.finished = true;
                self.cursor.drain = true;
            }
        }

        let result = self.cursor.run(&self.buffer, &mut self.tables);
        self.buffer.drain(..self.cursor.index);
        self.cursor.consumed += self.cursor.index;
        self.cursor.index = 0;

        if let Err(err) = result {
            self.finished = true;
            return Err(err);
        }
        if self.cursor.drain {
            self.cursor.finish().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Feeds a chunk of text.
    pub fn push(&mut self, chunk: &str) -> Result<()> {
        self.feed(Some(chunk)).map(|_| ())
    }

    /// Feeds the end signal and returns the decoded value.
    pub fn finish(mut self) -> Result<Value> {
        let position = self.cursor.position();
        self.feed(None)?
            .ok_or_else(|| Error::unexpected_eof(position, "a value"))
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(items: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: items.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: Map) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        for (key, value) in self.iter.by_ref() {
            if value.is_missing() {
                continue;
            }
            self.value = Some(value);
            return seed
                .deserialize(ValueDeserializer::new(Value::String(key)))
                .map(Some);
        }
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Null | Value::Missing) | None => Ok(()),
            Some(other) => Err(Error::custom(format!(
                "expected unit variant, found {}",
                other.kind()
            ))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Sequence(items)) => visitor.visit_seq(SeqDeserializer::new(items)),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Mapping(map)) => visitor.visit_map(MapDeserializer::new(map)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

/// Deserializer reading from a decoded [`Value`].
///
/// Dates are presented as RFC 3339 strings with millisecond precision, and
/// `Missing` behaves like `Null`.
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null | Value::Missing => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Integer(n) => visitor.visit_i64(n),
            Value::Float(f) => visitor.visit_f64(f),
            Value::String(s) => visitor.visit_string(s),
            Value::Date(date) => {
                visitor.visit_string(date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Sequence(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Mapping(map) => visitor.visit_map(MapDeserializer::new(map)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null | Value::Missing => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Mapping(map) if map.len() == 1 => {
                let mut entries = map.into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    None => Err(Error::custom("expected a single-key mapping for enum")),
                }
            }
            other => Err(Error::custom(format!(
                "expected a string or single-key mapping for enum, found {}",
                other.kind()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

/// Converts a [`Value`] into any `Deserialize` type.
///
/// ```rust
/// use serde_zipson::{from_value, zipson};
///
/// let point: (i32, i32) = from_value(zipson!([3, 4])).unwrap();
/// assert_eq!(point, (3, 4));
/// ```
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(ValueDeserializer::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zipson;
    use serde::Deserialize;

    fn chunked(text: &str, cuts: &[usize]) -> Result<Value> {
        let mut decoder = Decoder::new();
        let mut from = 0;
        for &cut in cuts {
            decoder.push(&text[from..cut])?;
            from = cut;
        }
        decoder.push(&text[from..])?;
        decoder.finish()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(decode("»").unwrap(), Value::Bool(true));
        assert_eq!(decode("«").unwrap(), Value::Bool(false));
        assert_eq!(decode("§").unwrap(), Value::Null);
        assert_eq!(decode("µ").unwrap(), Value::Missing);
        assert_eq!(decode("Ê").unwrap(), Value::Integer(1));
        assert_eq!(decode("À").unwrap(), Value::Integer(-9));
        assert_eq!(decode("¢G8").unwrap(), Value::Integer(1000));
        assert_eq!(decode("¤-G8").unwrap(), Value::Integer(-1000));
        assert_eq!(decode("£1.84").unwrap(), Value::Float(1.5));
        assert_eq!(decode("£0,1").unwrap(), Value::Float(0.1));
        assert_eq!(decode("¨hi¨").unwrap(), Value::String("hi".to_string()));
        assert_eq!(decode("´hi´").unwrap(), Value::String("hi".to_string()));
    }

    #[test]
    fn test_escaped_strings() {
        assert_eq!(
            decode(r"¨a\¨b\\c¨").unwrap(),
            Value::String(r"a¨b\c".to_string())
        );
        assert_eq!(decode(r"´\´´").unwrap(), Value::String("´".to_string()));
    }

    #[test]
    fn test_dates() {
        let date = DateTime::from_timestamp_millis(1_500_000_000_123).unwrap();
        let encoded = format!("Ø{}", crate::number::encode_integer(1_500_000_000_123));
        assert_eq!(decode(&encoded).unwrap(), Value::Date(date));

        let low = DateTime::from_timestamp_millis(1_500_000_000_000).unwrap();
        let encoded = format!("±{}", crate::number::encode_integer(15_000_000));
        assert_eq!(decode(&encoded).unwrap(), Value::Date(low));
    }

    #[test]
    fn test_references() {
        assert_eq!(
            decode("|¢G8º0¢WG÷").unwrap(),
            zipson!([1000, 1000, 2000])
        );
        assert_eq!(decode("|£1.84£2.84Ý0÷").unwrap(), zipson!([1.5, 2.5, 1.5]));
        assert_eq!(decode("|¨ab¨¨cd¨þ0÷").unwrap(), zipson!(["ab", "cd", "ab"]));
        assert_eq!(decode("|¤A¤K¤A÷").unwrap(), zipson!([10, 20, 10]));
    }

    #[test]
    fn test_repeats() {
        assert_eq!(decode("|Ê^^^^÷").unwrap(), zipson!([1, 1, 1, 1, 1]));
        let fifty = decode("|Ê^^^^~j÷").unwrap();
        assert_eq!(fifty, Value::Sequence(vec![Value::Integer(1); 50]));
        assert_eq!(decode("||Ê^÷^÷").unwrap(), zipson!([[1, 1], [1, 1]]));
    }

    #[test]
    fn test_missing_handling() {
        assert_eq!(decode("|µÊ÷").unwrap(), zipson!([null, 1]));
        assert_eq!(decode("{¨a¨µ¨b¨Ê}").unwrap(), zipson!({ "b": 1 }));
    }

    #[test]
    fn test_templates() {
        assert_eq!(
            decode("|¯¨a¨¨b¨¬Ê¨x¨Ë¨y¨Ìþ3¦÷").unwrap(),
            zipson!([{ "a": 1, "b": "x" }, { "a": 2, "b": "y" }, { "a": 3, "b": "y" }])
        );
        assert_eq!(
            decode("|¯¨a¨¬ÊË¦{¨b¨Ì}÷").unwrap(),
            zipson!([{ "a": 1 }, { "a": 2 }, { "b": 3 }])
        );
        assert_eq!(
            decode("|¯¨a¨¬Ê^^¦÷").unwrap(),
            zipson!([{ "a": 1 }, { "a": 1 }, { "a": 1 }])
        );
        assert_eq!(
            decode("|¯¨id¨¨pos¨¯¨x¨¨y¨¬¬ÊÊËËÌÍ¦÷").unwrap(),
            zipson!([
                { "id": 1, "pos": { "x": 1, "y": 2 } },
                { "id": 2, "pos": { "x": 3, "y": 4 } }
            ])
        );
        assert_eq!(
            decode("{¯¨n¨¬¨u1¨Ê¨u2¨Ë¦¨u3¨Ì}").unwrap(),
            zipson!({ "u1": { "n": 1 }, "u2": { "n": 2 }, "u3": 3 })
        );
    }

    #[test]
    fn test_template_key_after_nested_header() {
        assert_eq!(
            decode("|¯¨a¨¯¨x¨¬¨b¨¬ÊËÌÍ¦÷").unwrap(),
            zipson!([{ "a": { "x": 1 }, "b": 2 }, { "a": { "x": 3 }, "b": 4 }])
        );
    }

    #[test]
    fn test_finalize_ends_header_early() {
        assert_eq!(decode("|¯¨a¨¦Ê÷").unwrap(), zipson!([1]));
        assert_eq!(decode("|¯¨a¨¬¦Ê÷").unwrap(), zipson!([1]));
    }

    #[test]
    fn test_strictness() {
        assert!(matches!(decode("^"), Err(Error::UnexpectedToken { position: 0, .. })));
        assert!(matches!(decode("|^÷"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(decode("{^}"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(decode("|Ê}"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(decode("{¨a¨}"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(decode("{ÊË}"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(decode("÷"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(decode("¬"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(decode("|Ê¯÷"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(decode("|¯¨a¨¬Ê÷"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(decode("|¯¬÷"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(decode("x"), Err(Error::UnexpectedToken { .. })));
        assert_eq!(decode("ÊË"), Err(Error::TrailingValue { position: 2 }));

        assert!(matches!(
            decode("|Ê~zzzzzzzzzz÷"),
            Err(Error::InvalidNumber { position: 3, .. })
        ));
        assert!(matches!(
            decode("|Ê~0÷"),
            Err(Error::InvalidNumber { position: 4, .. })
        ));
    }

    #[test]
    fn test_truncation_in_drain_mode() {
        assert!(matches!(decode(""), Err(Error::UnexpectedEof { .. })));
        assert!(matches!(decode("|Ê"), Err(Error::UnexpectedEof { .. })));
        assert!(matches!(decode("¨abc"), Err(Error::UnexpectedEof { .. })));
        assert_eq!(decode("¢"), Err(Error::unexpected_eof(2, "value payload")));
        assert_eq!(decode("|¢"), Err(Error::unexpected_eof(3, "value payload")));
        assert_eq!(decode("|Ê~"), Err(Error::unexpected_eof(4, "repeat count")));
        assert!(matches!(decode("|¢÷"), Err(Error::InvalidNumber { .. })));
    }

    #[test]
    fn test_invalid_references() {
        assert_eq!(
            decode("þ0"),
            Err(Error::invalid_reference(2, "string", "0"))
        );
        assert!(matches!(
            decode("|¢G8º1÷"),
            Err(Error::InvalidReference { kind: "integer", .. })
        ));
    }

    #[test]
    fn test_incremental_mid_token() {
        let text = "|¨alpha¨þ0¢G8º0÷";
        let expected = decode(text).unwrap();
        let boundaries: Vec<usize> = (0..=text.len())
            .filter(|&i| text.is_char_boundary(i))
            .collect();
        for &cut in &boundaries {
            assert_eq!(chunked(text, &[cut]).unwrap(), expected, "cut at {}", cut);
        }
    }

    #[test]
    fn test_incremental_counted_repeat() {
        assert_eq!(
            chunked("|Ê^^^^~j÷", &[9]).unwrap(),
            Value::Sequence(vec![Value::Integer(1); 50])
        );
    }

    #[test]
    fn test_incremental_positions_span_chunks() {
        let mut decoder = Decoder::new();
        decoder.push("|ÊË").unwrap();
        let err = decoder.feed(Some("}")).unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { position: 5, .. }));
        assert!(decoder.feed(None).is_err());
    }

    #[test]
    fn test_decoder_lifecycle() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.feed(Some("")).unwrap(), None);
        assert_eq!(decoder.feed(Some("¢G")).unwrap(), None);
        assert_eq!(decoder.feed(Some("8")).unwrap(), None);
        assert_eq!(decoder.feed(None).unwrap(), Some(Value::Integer(1000)));
        assert!(decoder.feed(Some("Ê")).is_err());
        assert!(decoder.feed(None).is_err());

        assert!(matches!(
            Decoder::new().finish(),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u32,
        name: String,
        email: Option<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum Shape {
        Empty,
        Circle(f64),
        Rect { w: i64, h: i64 },
    }

    #[test]
    fn test_value_deserializer() {
        let user: User = from_value(zipson!({ "id": 7, "name": "ana", "email": null })).unwrap();
        assert_eq!(
            user,
            User {
                id: 7,
                name: "ana".to_string(),
                email: None,
            }
        );

        let shapes: Vec<Shape> = from_value(zipson!([
            "Empty",
            { "Circle": 1.5 },
            { "Rect": { "w": 2, "h": 3 } }
        ]))
        .unwrap();
        assert_eq!(
            shapes,
            vec![Shape::Empty, Shape::Circle(1.5), Shape::Rect { w: 2, h: 3 }]
        );
    }

    #[test]
    fn test_dates_deserialize_as_strings() {
        let date = DateTime::from_timestamp_millis(0).unwrap();
        let text: String = from_value(Value::Date(date)).unwrap();
        assert_eq!(text, "1970-01-01T00:00:00.000Z");
    }
}
