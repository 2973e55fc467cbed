//! Error types for decoding SmartBowl payloads.

use thiserror::Error;

/// Errors that can occur when decoding a sample report.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The report contained no data at all.
    #[error("Empty sample report")]
    Empty,

    /// A field could not be decoded as a number.
    #[error("Invalid value for {field}: '{value}'")]
    InvalidNumber {
        /// Name of the offending field.
        field: &'static str,
        /// The raw text that failed to decode.
        value: String,
    },
}

/// Result type alias using smartbowl-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
