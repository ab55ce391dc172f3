//! # serde_zipson
//!
//! A compact, reversible text codec for JSON-like values, with a Serde bridge.
//!
//! ## What is zipson?
//!
//! Zipson writes a value tree as a single line of text that is considerably
//! shorter than the equivalent JSON, and reads it back exactly. It gets there by
//!
//! - writing numbers and dates in base 62,
//! - replacing repeated strings, numbers and dates with short back-references,
//! - writing the key layout of a run of similar mappings once (templates),
//! - collapsing runs of identical sequence elements.
//!
//! The decoder can be fed the text in arbitrary chunks and produces the same
//! value as a one-shot decode. See [`format`] for the wire format.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! serde_zipson = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ### Serde Types
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_zipson::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let text = to_string(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(text, "{¨x¨Ê¨y¨Ë}");
//!
//! let back: Point = from_str(&text).unwrap();
//! assert_eq!(back, Point { x: 1, y: 2 });
//! ```
//!
//! ### Dynamic Values
//!
//! ```rust
//! use serde_zipson::{decode, encode, zipson};
//!
//! let value = zipson!([
//!     { "a": 1, "b": "x" },
//!     { "a": 2, "b": "y" },
//!     { "a": 3, "b": "y" }
//! ]);
//! let text = encode(&value).unwrap();
//! assert_eq!(text, "|¯¨a¨¨b¨¬Ê¨x¨Ë¨y¨Ìþ3¦÷");
//! assert_eq!(decode(&text).unwrap(), value);
//! ```
//!
//! ### Incremental Decoding
//!
//! ```rust
//! use serde_zipson::{encode, zipson, Decoder};
//!
//! let text = encode(&zipson!({ "name": "zipson", "tags": ["a", "a", "a"] })).unwrap();
//! let (head, tail) = text.split_at(5);
//!
//! let mut decoder = Decoder::new();
//! decoder.push(head).unwrap();
//! decoder.push(tail).unwrap();
//! let value = decoder.finish().unwrap();
//! assert_eq!(value, zipson!({ "name": "zipson", "tags": ["a", "a", "a"] }));
//! ```
//!
//! ## Logging
//!
//! The codec emits `tracing` events (template runs, decoder suspension, end of
//! input) at `debug` and `trace` level. No subscriber is installed.
//!
//! ## Demos
//!
//! The `demos/` directory holds runnable programs:
//!
//! - **`simple.rs`** - encoding and decoding Serde types
//! - **`incremental.rs`** - feeding a decoder in chunks
//! - **`templates.rs`** - how templates and back-references shrink output
//!
//! Run one with: `cargo run --example <name>`

#[macro_use]
mod macros;

pub mod de;
pub mod error;
pub mod format;
pub mod map;
pub mod number;
pub mod options;
pub mod ser;
pub mod sink;
pub mod tables;
pub mod template;
pub mod value;

pub use de::{decode, from_value, Decoder, ValueDeserializer};
pub use error::{Error, Result};
pub use map::Map;
pub use options::CompressOptions;
pub use ser::{to_value, Encoder, ValueSerializer};
pub use sink::{IoSink, Sink};
pub use value::Value;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Encodes a [`Value`] with default options.
///
/// # Examples
///
/// ```rust
/// use serde_zipson::{encode, zipson};
///
/// assert_eq!(encode(&zipson!([1, 1, 1])).unwrap(), "|Ê^^÷");
/// ```
///
/// # Errors
///
/// Fails only when an internal invariant is broken.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode(value: &Value) -> Result<String> {
    encode_with_options(value, CompressOptions::default())
}

/// Encodes a [`Value`] with custom options.
///
/// # Errors
///
/// Fails only when an internal invariant is broken.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_with_options(value: &Value, options: CompressOptions) -> Result<String> {
    let mut out = String::new();
    encode_to(value, &mut out, options)?;
    Ok(out)
}

/// Streams the encoding of `value` into `sink`, then ends the sink.
///
/// # Examples
///
/// ```rust
/// use serde_zipson::{encode_to, zipson, CompressOptions};
///
/// let mut out = String::new();
/// encode_to(&zipson!({ "k": null }), &mut out, CompressOptions::default()).unwrap();
/// assert_eq!(out, "{¨k¨§}");
/// ```
///
/// # Errors
///
/// Returns the first error reported by the sink.
pub fn encode_to<S>(value: &Value, sink: &mut S, options: CompressOptions) -> Result<()>
where
    S: Sink + ?Sized,
{
    Encoder::new(sink, options).encode(value)
}

/// Serialize any `T: Serialize` to a zipson string.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a [`Value`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, CompressOptions::default())
}

/// Serialize any `T: Serialize` to a zipson string with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_zipson::{to_string_with_options, CompressOptions};
///
/// let options = CompressOptions::new().with_full_precision_floats(true);
/// let text = to_string_with_options(&vec![0.125f64], options).unwrap();
/// assert_eq!(text, "|£0,125÷");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a [`Value`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: CompressOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    encode_with_options(&to_value(value)?, options)
}

/// Serialize any `T: Serialize` to a writer in zipson format.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, CompressOptions::default())
}

/// Serialize any `T: Serialize` to a writer in zipson format with custom options.
///
/// Fragments are written as they are produced and the writer is flushed at
/// the end.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(writer: W, value: &T, options: CompressOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let value = to_value(value)?;
    let mut sink = IoSink::new(writer);
    encode_to(&value, &mut sink, options)
}

/// Deserialize an instance of type `T` from zipson text.
///
/// # Examples
///
/// ```rust
/// use serde_zipson::from_str;
///
/// let words: Vec<String> = from_str("|¨hi¨þ0÷").unwrap();
/// assert_eq!(words, vec!["hi", "hi"]);
/// ```
///
/// # Errors
///
/// Returns an error if the text is not valid zipson or does not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(decode(s)?)
}

/// Deserialize an instance of type `T` from bytes of zipson text.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, not valid zipson,
/// or cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}

/// Deserialize an instance of type `T` from an I/O stream of zipson text.
///
/// # Examples
///
/// ```rust
/// use serde_zipson::from_reader;
/// use std::io::Cursor;
///
/// let cursor = Cursor::new("|Ê^Ë÷".as_bytes());
/// let numbers: Vec<u8> = from_reader(cursor).unwrap();
/// assert_eq!(numbers, vec![1, 1, 2]);
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, the input is not valid zipson,
/// or the data cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut string = String::new();
    reader.read_to_string(&mut string)?;
    from_str(&string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
    }

    fn users() -> Vec<User> {
        (0..4)
            .map(|id| User {
                id: id * 1000,
                name: format!("user{}", id % 2),
                active: id % 2 == 0,
                tags: vec!["admin".to_string(), "user".to_string()],
            })
            .collect()
    }

    #[test]
    fn test_serialize_deserialize_point() {
        let point = Point { x: 1, y: 2 };
        let text = to_string(&point).unwrap();
        let point_back: Point = from_str(&text).unwrap();
        assert_eq!(point, point_back);
    }

    #[test]
    fn test_serialize_deserialize_users() {
        let users = users();
        let text = to_string(&users).unwrap();
        assert!(text.starts_with("|¯"), "expected a template: {}", text);
        let users_back: Vec<User> = from_str(&text).unwrap();
        assert_eq!(users, users_back);
    }

    #[test]
    fn test_to_value() {
        let value = to_value(&Point { x: 1, y: 2 }).unwrap();
        let map = value.as_mapping().unwrap();
        assert_eq!(map.get("x"), Some(&Value::Integer(1)));
        assert_eq!(map.get("y"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_writer_and_reader() {
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &users()).unwrap();
        let back: Vec<User> = from_reader(buffer.as_slice()).unwrap();
        assert_eq!(back, users());

        let back: Vec<User> = from_slice(&buffer).unwrap();
        assert_eq!(back, users());
        assert!(from_slice::<Point>(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_custom_options() {
        let options = CompressOptions::new()
            .with_full_precision_floats(true)
            .with_template_max_keys(2);
        let values = vec![0.1f64, 2.000_5, -7.25];
        let text = to_string_with_options(&values, options).unwrap();
        let back: Vec<f64> = from_str(&text).unwrap();
        assert_eq!(back, values);
    }
}
