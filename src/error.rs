//! Error types for the ShelfScout engine
//!
//! The recommendation pass itself never fails outward: it degrades to an empty
//! list. These errors cover the edges around it:
//! - Configuration loading and validation
//! - Fixture I/O and JSON decoding for the catalog and library
//! - Library contract violations (bad ratings, unknown books)
//! - Catalog availability during a recommendation pass

use std::borrow::Cow;
use thiserror::Error;

/// Result type alias for ShelfScout operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ShelfScout engine
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        key: &'static str,
        message: Cow<'static, str>,
    },

    // ========================================================================
    // Fixture Errors
    // ========================================================================
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Library Errors
    // ========================================================================
    #[error("Invalid interaction for {isbn}: {message}")]
    InvalidInteraction {
        isbn: String,
        message: Cow<'static, str>,
    },

    #[error("Book not found in library: {isbn}")]
    BookNotFound { isbn: String },

    // ========================================================================
    // Recommendation Errors
    // ========================================================================
    #[error("Catalog unavailable: {message}")]
    CatalogUnavailable { message: Cow<'static, str> },

    #[error("Recommendation engine error: {message}")]
    Recommendation { message: Cow<'static, str> },
}

impl Error {
    /// Create an I/O error tagged with the offending path
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_interaction(
        isbn: impl Into<String>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidInteraction {
            isbn: isbn.into(),
            message: message.into(),
        }
    }

    pub fn catalog_unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::CatalogUnavailable {
            message: message.into(),
        }
    }

    pub fn recommendation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Recommendation {
            message: message.into(),
        }
    }

    // ========================================================================
    // Error Classification
    // ========================================================================

    /// Returns true if this error should be logged at error level
    pub fn is_error_level(&self) -> bool {
        matches!(
            self,
            Error::Io { .. }
                | Error::Json(_)
                | Error::CatalogUnavailable { .. }
                | Error::Recommendation { .. }
        )
    }

    /// Stable error code for structured logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidConfig { .. } => "CONFIG_ERROR",
            Error::Io { .. } => "IO_ERROR",
            Error::Json(_) => "SERIALIZATION_ERROR",
            Error::InvalidInteraction { .. } => "INVALID_INTERACTION",
            Error::BookNotFound { .. } => "NOT_FOUND",
            Error::CatalogUnavailable { .. } => "CATALOG_UNAVAILABLE",
            Error::Recommendation { .. } => "RECOMMENDATION_ERROR",
        }
    }
}
