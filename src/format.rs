//! Zipson wire format.
//!
//! This module documents the text format produced by [`Encoder`](crate::Encoder) and
//! consumed by [`Decoder`](crate::Decoder), and defines the token alphabet both sides share.
//!
//! # Overview
//!
//! A zipson document is a single line of text. Every value starts with one token
//! character that names its kind; numbers, ids and counts follow as a run of
//! *payload* characters (`0-9`, `A-Z`, `a-z`, `-`, `.`, `,`). Token characters are
//! never payload characters, so a payload run ends at the next token.
//!
//! ## Scalars
//!
//! | Value | Form | Example |
//! |-------|------|---------|
//! | `true` / `false` | `»` / `«` | `»` |
//! | null / missing | `§` / `µ` | `§` |
//! | integer in -9..=9 | one of `À`..`Ò` | `Ê` is 1 |
//! | integer | `¢` + base-62 | `¢1C` is 74 |
//! | float (reduced) | `£` + base-62 integer `.` base-62 thousandths | `£3.2G` is 3.14 |
//! | float (full) | `£` + base-62 integer `,` decimal fraction | `£3,14159` |
//! | date | `Ø` + base-62 milliseconds since the epoch | |
//! | low-precision date | `±` + base-62 multiples of 100 000 ms | |
//! | string | `¨` text `¨` | `¨name¨` |
//!
//! Inside strings the escape character `\` is doubled and the string's own
//! delimiter is written as `\` followed by the delimiter.
//!
//! ## Back-references
//!
//! Integers, floats, dates, low-precision dates and strings each own a reference
//! table. The first occurrence of a value is written in its normal form and
//! registers the next id of its table; later occurrences write the reference
//! token followed by the base-62 id (`º`, `Ý`, `×`, `ß`, `þ`). Values that would
//! not get shorter by referencing are written with an *unreferenced* token instead
//! (`¤`, `¥`, `Ü`, `Þ`, or the `´…´` string delimiter) and never enter a table.
//!
//! ```text
//! |¨alpha¨þ0÷        ["alpha", "alpha"]
//! ```
//!
//! ## Containers
//!
//! Sequences are wrapped in `|` … `÷`, mappings in `{` … `}` with keys and values
//! alternating. A mapping entry whose value is missing is omitted.
//!
//! ## Run-length encoding
//!
//! Inside a sequence, an element whose encoding is identical to the previous
//! element's is written as `^`. Once a run reaches [`ARRAY_REPEAT_COUNT_THRESHOLD`]
//! repeats, the remainder of the run is written as a single `~` followed by the
//! base-62 count.
//!
//! ```text
//! |Ê^^^^~j÷          fifty copies of 1
//! ```
//!
//! ## Templates
//!
//! When the first two elements of a sequence (or the first two values of a
//! mapping) are mappings with the same key structure, the structure is written
//! once as a header and the elements that follow carry only their values:
//!
//! ```text
//! |¯¨a¨¨b¨¬Ê¨x¨Ë¨y¨Ìþ3¦÷
//! ```
//!
//! is `[{"a":1,"b":"x"},{"a":2,"b":"y"},{"a":3,"b":"y"}]`. Nested mappings open a
//! nested header (`¯` … `¬`) right after their key. The finalize token `¦` ends
//! the templated run; elements after it are encoded normally. In a templated
//! mapping each row is preceded by the entry's key.

/// Digits of the positional base used for every integer payload.
pub const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const ARRAY_START_TOKEN: char = '|';
pub const ARRAY_END_TOKEN: char = '÷';
pub const OBJECT_START_TOKEN: char = '{';
pub const OBJECT_END_TOKEN: char = '}';

pub const TEMPLATE_OBJECT_START: char = '¯';
pub const TEMPLATE_OBJECT_END: char = '¬';
pub const TEMPLATE_OBJECT_FINAL: char = '¦';

pub const ARRAY_REPEAT_TOKEN: char = '^';
pub const ARRAY_REPEAT_MANY_TOKEN: char = '~';
/// Repeats written one token at a time before switching to a counted run.
pub const ARRAY_REPEAT_COUNT_THRESHOLD: usize = 5;

pub const BOOLEAN_TRUE_TOKEN: char = '»';
pub const BOOLEAN_FALSE_TOKEN: char = '«';
pub const NULL_TOKEN: char = '§';
pub const UNDEFINED_TOKEN: char = 'µ';

pub const STRING_TOKEN: char = '¨';
pub const UNREFERENCED_STRING_TOKEN: char = '´';
pub const REF_STRING_TOKEN: char = 'þ';
pub const ESCAPE_CHARACTER: char = '\\';

pub const INTEGER_TOKEN: char = '¢';
pub const REF_INTEGER_TOKEN: char = 'º';
pub const UNREFERENCED_INTEGER_TOKEN: char = '¤';

pub const FLOAT_TOKEN: char = '£';
pub const REF_FLOAT_TOKEN: char = 'Ý';
pub const UNREFERENCED_FLOAT_TOKEN: char = '¥';

pub const DATE_TOKEN: char = 'Ø';
pub const REF_DATE_TOKEN: char = '×';
pub const UNREFERENCED_DATE_TOKEN: char = 'Ü';

pub const LP_DATE_TOKEN: char = '±';
pub const REF_LP_DATE_TOKEN: char = 'ß';
pub const UNREFERENCED_LP_DATE_TOKEN: char = 'Þ';

/// Length of a reference token's kind marker.
pub const REFERENCE_HEADER_LENGTH: usize = 1;

/// Milliseconds per low-precision date unit.
pub const DATE_LOW_PRECISION: i64 = 100_000;

pub const FLOAT_FULL_PRECISION_DELIMITER: char = ',';
pub const FLOAT_REDUCED_PRECISION_DELIMITER: char = '.';
/// Scale of the fractional part of reduced-precision floats.
pub const FLOAT_COMPRESSION_PRECISION: f64 = 1000.0;

pub const INTEGER_SMALL_EXCLUSIVE_BOUND_LOWER: i64 = -10;
pub const INTEGER_SMALL_EXCLUSIVE_BOUND_UPPER: i64 = 10;
const INTEGER_SMALL_TOKEN_BASE: u32 = 0xC0;
const INTEGER_SMALL_TOKEN_ELEMENT_OFFSET: i64 = 9;

/// Returns `true` for characters that can appear inside a numeric payload run.
#[inline]
pub fn is_payload_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || byte == b'-'
        || byte == FLOAT_FULL_PRECISION_DELIMITER as u8
        || byte == FLOAT_REDUCED_PRECISION_DELIMITER as u8
}

/// Returns `true` when `value` is written as a single small-integer token.
#[inline]
pub fn is_small_integer(value: i64) -> bool {
    value > INTEGER_SMALL_EXCLUSIVE_BOUND_LOWER && value < INTEGER_SMALL_EXCLUSIVE_BOUND_UPPER
}

/// Token for an integer strictly between the small-integer bounds.
pub fn small_integer_token(value: i64) -> crate::Result<char> {
    if !is_small_integer(value) {
        return Err(crate::Error::SmallIntegerRange(value));
    }
    let code = INTEGER_SMALL_TOKEN_BASE + (value + INTEGER_SMALL_TOKEN_ELEMENT_OFFSET) as u32;
    char::from_u32(code).ok_or(crate::Error::SmallIntegerRange(value))
}

/// Inverse of [`small_integer_token`]; `None` for any other character.
pub fn small_integer_value(token: char) -> Option<i64> {
    let code = token as u32;
    let span = (INTEGER_SMALL_EXCLUSIVE_BOUND_UPPER - INTEGER_SMALL_EXCLUSIVE_BOUND_LOWER - 1) as u32;
    if (INTEGER_SMALL_TOKEN_BASE..INTEGER_SMALL_TOKEN_BASE + span).contains(&code) {
        Some(i64::from(code - INTEGER_SMALL_TOKEN_BASE) - INTEGER_SMALL_TOKEN_ELEMENT_OFFSET)
    } else {
        None
    }
}
