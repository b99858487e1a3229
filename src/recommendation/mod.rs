//! Recommendation Module
//!
//! Turns a user's library (saved, favorited, rated, reviewed books) into a
//! ranked, diversified list of catalog books they have not touched yet.
//!
//! ## Architecture
//!
//! 1. **Scorer** - Weighted genre/author/tag matching against every valid library entry
//! 2. **Ranker** - Excludes library books, drops weak matches, sorts by score
//! 3. **Diversity** - Three relevance tiers, shuffled independently, blended tier-major
//! 4. **Session** - Watches library snapshots and republishes on material change
//!
//! ## Scoring Overview
//!
//! Each library entry weighs in by engagement:
//! - Reviewed (2.0): the user wrote something
//! - Rated (0.3 - 2.5): linear in stars around a 2-star pivot
//! - Favorited (1.5)
//! - Saved (1.0)
//!
//! A candidate earns `2x` that weight per genre match, `1x` per author match and
//! `2x` per shared tag. Anything scoring under the threshold (1.0) is noise.

pub mod book;
pub mod diversity;
pub mod engine;
pub mod metrics;
pub mod ranker;
pub mod scorer;
pub mod session;

// Re-export the types that are actually used externally
pub use book::{CatalogBook, InteractedBook, Reason, ReasonKind, ScoredBook};
pub use engine::RecommendationEngine;
pub use session::{RecommendationSession, RecommendationSet, SessionState};
