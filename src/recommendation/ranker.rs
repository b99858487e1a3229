//! Candidate Filtering and Ranking
//!
//! Drops books already in the library, scores the rest, discards anything
//! under the relevance threshold and sorts by score. The sort is stable: equal
//! scores keep catalog order.

use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

use super::book::{normalize_isbn, CatalogBook, InteractedBook, ScoredBook};
use super::metrics::PerformanceTimer;
use super::scorer::{InteractionProfile, ScoringWeights, Similarity};
use crate::config::{DEFAULT_MIN_SCORE, DEFAULT_PARALLEL_THRESHOLD};

/// Output of a ranking pass plus the funnel counts behind it
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    pub books: Vec<ScoredBook>,
    pub considered: usize,
    pub excluded: usize,
    pub duplicates: usize,
}

/// Scores and orders candidates against an [`InteractionProfile`]
#[derive(Debug, Clone)]
pub struct CandidateRanker {
    min_score: f64,
    parallel_threshold: usize,
}

impl Default for CandidateRanker {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl CandidateRanker {
    pub fn new(min_score: f64, parallel_threshold: usize) -> Self {
        Self {
            min_score,
            parallel_threshold,
        }
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// Rank `candidates` for the user described by `profile`
    pub fn rank(&self, profile: &InteractionProfile, candidates: &[CatalogBook]) -> Ranking {
        let mut ranking = Ranking {
            considered: candidates.len(),
            ..Default::default()
        };

        if profile.is_empty() || candidates.is_empty() {
            return ranking;
        }

        // First occurrence of each normalized ISBN wins
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut fresh: Vec<&CatalogBook> = Vec::with_capacity(candidates.len());
        for book in candidates {
            let isbn = normalize_isbn(&book.isbn);
            if isbn.is_empty() {
                continue;
            }
            if profile.excludes(&isbn) {
                ranking.excluded += 1;
                continue;
            }
            if !seen.insert(isbn) {
                ranking.duplicates += 1;
                continue;
            }
            fresh.push(book);
        }

        let similarities: Vec<Similarity> = if fresh.len() >= self.parallel_threshold {
            let _timer = PerformanceTimer::new("parallel_scoring");
            // Indexed collect keeps catalog order, so the stable sort below
            // behaves exactly like the sequential path
            fresh.par_iter().map(|book| profile.score(book)).collect()
        } else {
            fresh.iter().map(|book| profile.score(book)).collect()
        };

        ranking.books = fresh
            .into_iter()
            .zip(similarities)
            .filter(|(_, similarity)| similarity.score > 0.0 && similarity.score >= self.min_score)
            .map(|(book, similarity)| ScoredBook {
                book: book.clone(),
                score: similarity.score,
                reasons: similarity.reasons,
            })
            .collect();

        ranking
            .books
            .sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            "Ranked {} of {} candidates ({} excluded, {} duplicates)",
            ranking.books.len(),
            ranking.considered,
            ranking.excluded,
            ranking.duplicates
        );

        ranking
    }
}

/// Rank candidates for a library with the default weights.
///
/// Returns an empty list when the library holds no valid interaction or the
/// catalog is empty; there is no popularity fallback.
pub fn rank(
    interacted: &[InteractedBook],
    candidates: &[CatalogBook],
    min_score: f64,
) -> Vec<ScoredBook> {
    let profile = InteractionProfile::new(interacted, ScoringWeights::default());
    CandidateRanker::new(min_score, DEFAULT_PARALLEL_THRESHOLD)
        .rank(&profile, candidates)
        .books
}
