//! # Error Types
//!
//! This module defines all error types for the karaoke compiler.
//!
//! Parse errors carry the line/column where the grammar gave up, so a user can
//! find the offending token in their `.abc` file. Field errors name the header
//! or body field whose value could not be used.
//!
//! ## Error Types
//! - `Parse` - Header or body text does not match its grammar
//! - `InvalidFieldValue` - A field matched the grammar but its value is unusable
//! - `Io` - Source file, MIDI file, or stdin could not be read/written
//! - `Config` - Playback configuration YAML is malformed
//! - `Playback` - The playback sink refused to start
//!
//! ## Usage
//! ```rust
//! use karaoke::{parse, KaraokeError};
//!
//! match parse("X:1\nT:Oops\nC D E\n") {
//!     Ok(_) => unreachable!(),
//!     Err(KaraokeError::Parse { line, column, expected }) => {
//!         eprintln!("Parse error at {}:{}: expected {}", line, column, expected);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KaraokeError {
    /// Parse error with location information.
    ///
    /// Reported at the furthest position the parser reached, which is almost
    /// always where the offending character sits.
    ///
    /// # Example
    /// ```
    /// # use karaoke::KaraokeError;
    /// let err = KaraokeError::Parse {
    ///     line: 3,
    ///     column: 1,
    ///     expected: "K: field".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Parse error at line 3, column 1: expected K: field");
    /// ```
    #[error("Parse error at line {line}, column {column}: expected {expected}")]
    Parse {
        line: usize,
        column: usize,
        expected: String,
    },

    /// A field value that the grammar accepted but that cannot be interpreted.
    ///
    /// # Example
    /// ```
    /// # use karaoke::KaraokeError;
    /// let err = KaraokeError::InvalidFieldValue {
    ///     field: "L".to_string(),
    ///     value: "1/0".to_string(),
    ///     reason: "denominator must be non-zero".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Invalid value '1/0' for field L: denominator must be non-zero");
    /// ```
    #[error("Invalid value '{value}' for field {field}: {reason}")]
    InvalidFieldValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Playback error: {0}")]
    Playback(String),
}

impl KaraokeError {
    pub(crate) fn invalid_field(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        KaraokeError::InvalidFieldValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
