//! Base-62 integer and float codec.
//!
//! Integers are written most-significant digit first using
//! [`BASE62_ALPHABET`](crate::format::BASE62_ALPHABET), with a leading `-` for
//! negative values. Floats are split into an integer part and a fraction:
//!
//! - **Reduced precision** (default): `int.frac` where both halves are base-62 and
//!   `frac` is the fraction scaled by 1000 and rounded, so three decimal digits
//!   survive the round trip.
//! - **Full precision**: `int,digits` where `int` is base-62 and `digits` is the
//!   literal decimal fraction of the shortest round-trip representation.
//!
//! ```rust
//! use serde_zipson::number::{decode_float, decode_integer, encode_float, encode_integer};
//!
//! assert_eq!(encode_integer(74), "1C");
//! assert_eq!(decode_integer("-1C").unwrap(), -74);
//!
//! let reduced = encode_float(3.14159, false);
//! assert_eq!(reduced, "3.2I");
//! assert!((decode_float(&reduced).unwrap() - 3.142).abs() < 1e-9);
//!
//! let full = encode_float(3.14159, true);
//! assert_eq!(full, "3,14159");
//! assert_eq!(decode_float(&full).unwrap(), 3.14159);
//! ```

use crate::format::{
    BASE62_ALPHABET, FLOAT_COMPRESSION_PRECISION, FLOAT_FULL_PRECISION_DELIMITER,
    FLOAT_REDUCED_PRECISION_DELIMITER,
};
use crate::{Error, Result};
use num_bigint::BigUint;

const BASE: u64 = 62;

/// Smallest magnitude whose integer part no longer fits an `i64`.
const I64_FLOAT_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Encodes a signed integer as base-62 digits; zero is `"0"`.
pub fn encode_integer(number: i64) -> String {
    let mut digits = encode_magnitude_u64(number.unsigned_abs());
    if number < 0 {
        digits.insert(0, '-');
    }
    digits
}

fn encode_magnitude_u64(mut carry: u64) -> String {
    if carry == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(11);
    while carry > 0 {
        digits.push(BASE62_ALPHABET[(carry % BASE) as usize]);
        carry /= BASE;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

#[inline]
fn digit_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'Z' => Some(byte - b'A' + 10),
        b'a'..=b'z' => Some(byte - b'a' + 36),
        _ => None,
    }
}

/// Decodes base-62 digits produced by [`encode_integer`].
///
/// # Errors
///
/// Returns [`Error::InvalidNumber`] for an empty payload, a character outside the
/// alphabet, or a value that does not fit an `i64`. Positions are relative to the
/// start of `encoded`.
pub fn decode_integer(encoded: &str) -> Result<i64> {
    let (negative, digits) = match encoded.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, encoded),
    };
    if digits.is_empty() {
        return Err(Error::invalid_number(0, "empty integer payload"));
    }
    let sign_len = encoded.len() - digits.len();

    let mut value: u64 = 0;
    for (i, byte) in digits.bytes().enumerate() {
        let digit = digit_value(byte)
            .ok_or_else(|| Error::invalid_number(sign_len + i, "character outside the base-62 alphabet"))?;
        value = value
            .checked_mul(BASE)
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or_else(|| Error::invalid_number(0, "integer overflows 64 bits"))?;
    }

    if negative {
        if value == i64::MIN.unsigned_abs() {
            Ok(i64::MIN)
        } else {
            i64::try_from(value)
                .map(|v| -v)
                .map_err(|_| Error::invalid_number(0, "integer overflows 64 bits"))
        }
    } else {
        i64::try_from(value).map_err(|_| Error::invalid_number(0, "integer overflows 64 bits"))
    }
}

fn encode_magnitude(magnitude: &BigUint) -> String {
    magnitude
        .to_radix_be(BASE as u32)
        .into_iter()
        .map(|digit| char::from(BASE62_ALPHABET[digit as usize]))
        .collect()
}

fn decode_magnitude(digits: &str) -> Result<BigUint> {
    let values = digits
        .bytes()
        .enumerate()
        .map(|(i, byte)| {
            digit_value(byte)
                .ok_or_else(|| Error::invalid_number(i, "character outside the base-62 alphabet"))
        })
        .collect::<Result<Vec<u8>>>()?;
    BigUint::from_radix_be(&values, BASE as u32)
        .ok_or_else(|| Error::invalid_number(0, "invalid base-62 magnitude"))
}

/// Rounds half toward positive infinity.
#[inline]
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Encodes a finite float in reduced or full precision mode.
///
/// Reduced precision keeps three fractional digits. Values whose integer part
/// does not fit an `i64` are always written in full precision.
pub fn encode_float(float: f64, full_precision: bool) -> String {
    let integer = float.trunc();
    if full_precision || integer.abs() >= I64_FLOAT_BOUND {
        return encode_float_full(float);
    }

    let fraction = round_half_up(FLOAT_COMPRESSION_PRECISION * (float % 1.0)) as i64;
    let mut encoded = encode_integer(integer as i64);
    encoded.push(FLOAT_REDUCED_PRECISION_DELIMITER);
    encoded.push_str(&encode_integer(fraction));
    encoded
}

fn encode_float_full(float: f64) -> String {
    let text = float.to_string();
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let (negative, magnitude) = match integer.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, integer),
    };

    let mut encoded = String::with_capacity(text.len());
    if negative {
        encoded.push('-');
    }
    match magnitude.parse::<u64>() {
        Ok(small) => encoded.push_str(&encode_magnitude_u64(small)),
        Err(_) => {
            let big: BigUint = magnitude.parse().unwrap_or_default();
            encoded.push_str(&encode_magnitude(&big));
        }
    }
    encoded.push(FLOAT_FULL_PRECISION_DELIMITER);
    encoded.push_str(fraction);
    encoded
}

/// Decodes a float written by [`encode_float`] in either mode.
///
/// # Errors
///
/// Returns [`Error::InvalidNumber`] when either half is malformed.
pub fn decode_float(encoded: &str) -> Result<f64> {
    if let Some((integer, fraction)) = encoded.split_once(FLOAT_FULL_PRECISION_DELIMITER) {
        return decode_float_full(integer, fraction);
    }

    let (integer, fraction) = encoded
        .split_once(FLOAT_REDUCED_PRECISION_DELIMITER)
        .unwrap_or((encoded, "0"));
    let integer = decode_integer(integer)?;
    let fraction = decode_integer(fraction)
        .map_err(|e| e.at_offset(encoded.len() - fraction.len()))?;
    Ok(integer as f64 + fraction as f64 / FLOAT_COMPRESSION_PRECISION)
}

fn decode_float_full(integer: &str, fraction: &str) -> Result<f64> {
    let (negative, digits) = match integer.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, integer),
    };
    if digits.is_empty() {
        return Err(Error::invalid_number(0, "empty float integer part"));
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_number(
            integer.len() + 1,
            "full precision fraction must be decimal digits",
        ));
    }

    let magnitude = decode_magnitude(digits)?;
    let text = if fraction.is_empty() {
        magnitude.to_string()
    } else {
        format!("{}.{}", magnitude, fraction)
    };
    let value: f64 = text
        .parse()
        .map_err(|_| Error::invalid_number(0, "unparseable float"))?;
    Ok(if negative { -value } else { value })
}
