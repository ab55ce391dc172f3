//! Error types for zipson encoding and decoding.
//!
//! ## Error Categories
//!
//! - **Token errors**: a token appeared where the current decode target cannot accept it
//! - **Truncation**: the input ended mid-token or with open containers while draining
//! - **Numeric errors**: malformed or overflowing base-62 payloads
//! - **Reference errors**: a back-reference to a value that was never registered
//! - **Encoder invariants**: bound mismatches that indicate a bug, never bad input
//! - **I/O errors**: sink or reader failures
//!
//! Every decode error carries the byte offset into the full encoded stream, counted
//! across all chunks fed to an incremental [`Decoder`](crate::Decoder).
//!
//! ## Examples
//!
//! ```rust
//! use serde_zipson::{decode, Error};
//!
//! let result = decode("|Ê");
//! assert!(matches!(result, Err(Error::UnexpectedEof { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while encoding or decoding zipson text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error while writing to a sink or reading input
    #[error("IO error: {0}")]
    Io(String),

    /// A token the active decode target cannot accept
    #[error("Unexpected token '{token}' at position {position}: {context}")]
    UnexpectedToken {
        position: usize,
        token: char,
        context: String,
    },

    /// Input ended before a complete value was read
    #[error("Unexpected end of input at position {position}, expected {expected}")]
    UnexpectedEof { position: usize, expected: String },

    /// Malformed base-62 or float payload
    #[error("Invalid number at position {position}: {msg}")]
    InvalidNumber { position: usize, msg: String },

    /// Reference to an id that has no entry in the ordered table
    #[error("Invalid {kind} reference '{id}' at position {position}")]
    InvalidReference {
        position: usize,
        kind: &'static str,
        id: String,
    },

    /// A second value arrived after the root value was complete
    #[error("Trailing value at position {position}")]
    TrailingValue { position: usize },

    /// Integer routed to the single-token fast path outside its range
    #[error("No small integer token for {0}")]
    SmallIntegerRange(i64),

    /// Template structure and value disagree during encoding
    #[error("Template error: {0}")]
    Template(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an unexpected-token error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_zipson::Error;
    ///
    /// let err = Error::unexpected_token(4, '^', "repeat outside of a sequence");
    /// assert!(err.to_string().contains("position 4"));
    /// ```
    pub fn unexpected_token(position: usize, token: char, context: &str) -> Self {
        Error::UnexpectedToken {
            position,
            token,
            context: context.to_string(),
        }
    }

    /// Creates an unexpected end-of-input error.
    pub fn unexpected_eof(position: usize, expected: &str) -> Self {
        Error::UnexpectedEof {
            position,
            expected: expected.to_string(),
        }
    }

    /// Creates an invalid number error.
    pub fn invalid_number(position: usize, msg: &str) -> Self {
        Error::InvalidNumber {
            position,
            msg: msg.to_string(),
        }
    }

    /// Creates an invalid reference error for the given table kind.
    pub fn invalid_reference(position: usize, kind: &'static str, id: &str) -> Self {
        Error::InvalidReference {
            position,
            kind,
            id: id.to_string(),
        }
    }

    /// Creates an encoder-side template invariant error.
    pub fn template(msg: &str) -> Self {
        Error::Template(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_zipson::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Moves a position-carrying error by `offset` bytes.
    ///
    /// Payload decoders report offsets relative to the start of their token;
    /// the cursor rebases them onto the whole stream.
    pub(crate) fn at_offset(self, offset: usize) -> Self {
        match self {
            Error::UnexpectedToken {
                position,
                token,
                context,
            } => Error::UnexpectedToken {
                position: position + offset,
                token,
                context,
            },
            Error::UnexpectedEof { position, expected } => Error::UnexpectedEof {
                position: position + offset,
                expected,
            },
            Error::InvalidNumber { position, msg } => Error::InvalidNumber {
                position: position + offset,
                msg,
            },
            Error::InvalidReference { position, kind, id } => Error::InvalidReference {
                position: position + offset,
                kind,
                id,
            },
            Error::TrailingValue { position } => Error::TrailingValue {
                position: position + offset,
            },
            other => other,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_rebases_positions() {
        let err = Error::invalid_number(2, "empty payload").at_offset(10);
        assert_eq!(err, Error::invalid_number(12, "empty payload"));

        let err = Error::template("missing field").at_offset(10);
        assert_eq!(err, Error::template("missing field"));
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::unexpected_token(7, '÷', "mapping closed by sequence end");
        let msg = err.to_string();
        assert!(msg.contains("position 7"));
        assert!(msg.contains("mapping closed"));
    }
}
