//! # Error Types — Core Error Hierarchy
//!
//! Base error type for the foundational crate. The lifecycle, escrow, and
//! dispute crates define their own richer enums and convert from this one.
//!
//! ## Design
//!
//! - Business-rule violations are typed variants the HTTP layer maps to
//!   status codes; nothing here panics.
//! - Parsing/validation errors carry the offending input verbatim.

use thiserror::Error;

/// Errors from foundational type construction and validation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A timestamp string failed validation.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A coordinate pair was out of range.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
