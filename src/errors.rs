//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`TrellisError`] covers the few genuinely fatal
//! failure modes of the core:
//! - Document finalization misuse
//! - Oversized non-binary documents
//! - Singular matrix inversion
//!
//! Malformed importer input (zero-vertex meshes, inconsistent face arity,
//! empty texture buffers) is deliberately *not* an error: those conditions
//! are logged as warnings and construction proceeds with best-effort data.
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, TrellisError>`.

use thiserror::Error;

/// The main error type for the trellis core.
#[derive(Error, Debug)]
pub enum TrellisError {
    // ========================================================================
    // Document Errors
    // ========================================================================
    /// A [`DocumentBuilder`](crate::document::DocumentBuilder) was used after
    /// finalization (built twice, or appended to after `build`).
    #[error("Invalid document operation: {0}")]
    InvalidDocument(String),

    /// A document whose fields cannot be externalized (no binary payloads)
    /// exceeded the configured maximum encoded size.
    #[error("Document exceeds maximum encoded size: {size} bytes (limit {limit})")]
    DocumentTooLarge {
        /// Encoded size of the offending document
        size: usize,
        /// The configured ceiling
        limit: usize,
    },

    /// A required field was missing or had an unexpected type when reading
    /// a document back.
    #[error("Missing or mistyped document field: {0}")]
    MissingField(String),

    // ========================================================================
    // Math Errors
    // ========================================================================
    /// Attempted to invert a matrix with determinant zero.
    #[error("Cannot invert a singular matrix (determinant = 0)")]
    SingularMatrix,
}

/// Alias for `Result<T, TrellisError>`.
pub type Result<T> = std::result::Result<T, TrellisError>;
