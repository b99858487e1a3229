//! ShelfScout library crate
//!
//! Re-exports core modules for integration tests and external use.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod library;
pub mod recommendation;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogProvider};
pub use config::Config;
pub use error::{Error, Result};
pub use library::{Interaction, LibrarySnapshot, LibraryStore};
pub use recommendation::{
    CatalogBook, InteractedBook, Reason, ReasonKind, RecommendationEngine, RecommendationSession,
    RecommendationSet, ScoredBook, SessionState,
};
