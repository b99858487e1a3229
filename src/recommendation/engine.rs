//! Recommendation Engine
//!
//! One synchronous pass: profile the library, rank the catalog, then pick a
//! diversified batch. Pure apart from the shuffle RNG.

use rand::Rng;
use std::time::Instant;
use tracing::debug;

use super::book::{CatalogBook, InteractedBook, ScoredBook};
use super::diversity;
use super::metrics::{PerformanceTimer, RecommendationMetrics};
use super::ranker::CandidateRanker;
use super::scorer::{InteractionProfile, ScoringWeights};
use crate::config::RecommendationConfig;

/// Result of one recommendation pass
#[derive(Debug, Clone)]
pub struct RecommendationPass {
    pub books: Vec<ScoredBook>,
    pub metrics: RecommendationMetrics,
}

/// Main recommendation engine
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    config: RecommendationConfig,
    weights: ScoringWeights,
    ranker: CandidateRanker,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(RecommendationConfig::default())
    }
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig) -> Self {
        Self::with_weights(config, ScoringWeights::default())
    }

    pub fn with_weights(config: RecommendationConfig, weights: ScoringWeights) -> Self {
        let ranker = CandidateRanker::new(config.min_score, config.parallel_threshold);
        Self {
            config,
            weights,
            ranker,
        }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    /// Build the scoring profile for a library
    pub fn profile<'a, I>(&self, library: I) -> InteractionProfile
    where
        I: IntoIterator<Item = &'a InteractedBook>,
    {
        InteractionProfile::new(library, self.weights.clone())
    }

    /// Recommend books for a library using the thread RNG
    pub fn recommend(&self, library: &[InteractedBook], catalog: &[CatalogBook]) -> Vec<ScoredBook> {
        let profile = self.profile(library);
        self.run_pass(&profile, catalog, &mut rand::thread_rng()).books
    }

    /// Full pass against a prepared profile
    pub fn run_pass<R: Rng + ?Sized>(
        &self,
        profile: &InteractionProfile,
        catalog: &[CatalogBook],
        rng: &mut R,
    ) -> RecommendationPass {
        let timer = PerformanceTimer::new("recommendation_pass");
        let mut metrics = RecommendationMetrics {
            signals: profile.signal_count(),
            ..Default::default()
        };

        let scoring_started = Instant::now();
        let ranking = self.ranker.rank(profile, catalog);
        metrics.scoring_duration_ms = scoring_started.elapsed().as_millis() as u64;
        metrics.candidates_considered = ranking.considered;
        metrics.candidates_excluded = ranking.excluded;
        metrics.duplicates_skipped = ranking.duplicates;
        metrics.relevant_candidates = ranking.books.len();

        let books = diversity::select_with_rng(ranking.books, self.config.batch_size, rng);
        metrics.observe_output(&books);
        metrics.total_duration_ms = timer.elapsed_ms();
        timer.log_if_slow(self.config.slow_pass);

        debug!(
            "Selected {} of {} relevant candidates from {} signals",
            books.len(),
            metrics.relevant_candidates,
            metrics.signals
        );

        RecommendationPass { books, metrics }
    }
}
