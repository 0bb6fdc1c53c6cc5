//! Error types for the Yari library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`YariError`] enum.
//!
//! # Examples
//!
//! ```
//! use yari::error::{Result, YariError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(YariError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use anyhow;
use thiserror::Error;

/// The main error type for Yari operations.
///
/// Uses the `thiserror` crate for automatic `Error` trait implementation and
/// provides convenient constructor methods for the common error kinds.
#[derive(Error, Debug)]
pub enum YariError {
    /// Query-related errors (invalid composites, unresolvable clauses, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Field-related errors
    #[error("Field error: {0}")]
    Field(String),

    /// Invalid argument passed to a constructor or builder
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),

    /// Errors propagated unmodified from an underlying occurrence stream
    #[error("Postings error: {0}")]
    Postings(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with YariError.
pub type Result<T> = std::result::Result<T, YariError>;

impl YariError {
    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        YariError::Query(msg.into())
    }

    /// Create a new field error.
    pub fn field<S: Into<String>>(msg: S) -> Self {
        YariError::Field(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        YariError::InvalidArgument(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        YariError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = YariError::query("Test query error");
        assert_eq!(error.to_string(), "Query error: Test query error");

        let error = YariError::field("Test field error");
        assert_eq!(error.to_string(), "Field error: Test field error");

        let error = YariError::invalid_argument("Test argument error");
        assert_eq!(error.to_string(), "Invalid argument: Test argument error");
    }

    #[test]
    fn test_anyhow_error_conversion() {
        let source = anyhow::anyhow!("decode failed");
        let error = YariError::from(source);

        match error {
            YariError::Postings(_) => {}
            _ => panic!("Expected postings error variant"),
        }
    }
}
