//! Recommendation Metrics and Performance Monitoring
//!
//! Per-pass metrics for recommendation quality and performance. Passes emit
//! through the `metrics` facade; with no recorder installed those calls are
//! no-ops.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::book::{normalize_attribute, ReasonKind, ScoredBook};

/// Metrics for a single recommendation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationMetrics {
    pub pass_id: String,
    pub timestamp: i64,
    pub interaction_hash: String,

    // Performance metrics
    pub total_duration_ms: u64,
    pub scoring_duration_ms: u64,

    // Funnel
    pub signals: usize,
    pub candidates_considered: usize,
    pub candidates_excluded: usize,
    pub duplicates_skipped: usize,
    pub relevant_candidates: usize,
    pub recommendations_returned: usize,
    pub avg_score: f64,

    // Diversity metrics
    pub unique_genres: usize,
    pub unique_authors: usize,
    pub genre_reason_count: usize,
    pub author_reason_count: usize,
    pub unexplained_count: usize,
}

impl Default for RecommendationMetrics {
    fn default() -> Self {
        Self {
            pass_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            interaction_hash: String::new(),
            total_duration_ms: 0,
            scoring_duration_ms: 0,
            signals: 0,
            candidates_considered: 0,
            candidates_excluded: 0,
            duplicates_skipped: 0,
            relevant_candidates: 0,
            recommendations_returned: 0,
            avg_score: 0.0,
            unique_genres: 0,
            unique_authors: 0,
            genre_reason_count: 0,
            author_reason_count: 0,
            unexplained_count: 0,
        }
    }
}

impl RecommendationMetrics {
    /// Fill the output-side fields from a published batch
    pub fn observe_output(&mut self, books: &[ScoredBook]) {
        self.recommendations_returned = books.len();
        self.avg_score = if books.is_empty() {
            0.0
        } else {
            books.iter().map(|b| b.score).sum::<f64>() / books.len() as f64
        };

        let mut genres = HashSet::new();
        let mut authors = HashSet::new();
        self.genre_reason_count = 0;
        self.author_reason_count = 0;
        self.unexplained_count = 0;

        for scored in books {
            if let Some(g) = normalize_attribute(scored.book.genre.as_deref()) {
                genres.insert(g);
            }
            if let Some(a) = normalize_attribute(scored.book.author.as_deref()) {
                authors.insert(a);
            }
            if scored.reasons.is_empty() {
                self.unexplained_count += 1;
            }
            for reason in &scored.reasons {
                match reason.kind {
                    ReasonKind::Genre => self.genre_reason_count += 1,
                    ReasonKind::Author => self.author_reason_count += 1,
                }
            }
        }

        self.unique_genres = genres.len();
        self.unique_authors = authors.len();
    }

    /// Emit counters and histograms for this pass
    pub fn record(&self) {
        metrics::counter!("shelfscout_recommendation_passes_total").increment(1);
        metrics::histogram!("shelfscout_recommendation_duration_ms")
            .record(self.total_duration_ms as f64);
        metrics::histogram!("shelfscout_recommendation_returned")
            .record(self.recommendations_returned as f64);
        metrics::gauge!("shelfscout_recommendation_relevant_candidates")
            .set(self.relevant_candidates as f64);
    }
}

/// Performance timer for tracking operation duration
pub struct PerformanceTimer {
    start: Instant,
    label: String,
}

impl PerformanceTimer {
    pub fn new(label: &str) -> Self {
        Self {
            start: Instant::now(),
            label: label.to_string(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn log_if_slow(&self, threshold: Duration) {
        let elapsed = self.elapsed_ms();
        let threshold_ms = threshold.as_millis() as u64;
        if elapsed > threshold_ms {
            tracing::warn!(
                "⚠️ Slow operation: {} took {}ms (threshold: {}ms)",
                self.label,
                elapsed,
                threshold_ms
            );
        }
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed_ms();
        tracing::debug!("⏱️ {} completed in {}ms", self.label, elapsed);
    }
}

/// Recommendation quality analyzer
pub struct QualityAnalyzer;

impl QualityAnalyzer {
    /// Calculate diversity score (0-1, higher is better)
    pub fn diversity_score(unique_genres: usize, unique_authors: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }

        let author_diversity = (unique_authors as f64 / total as f64).min(1.0);
        // A handful of genres is healthy even for large batches
        let genre_diversity = (unique_genres as f64 / (total as f64).sqrt()).min(1.0);

        // Weighted average: authors matter more than genres
        author_diversity * 0.6 + genre_diversity * 0.4
    }

    /// Share of returned books carrying at least one reason (0-1)
    pub fn personalization_score(unexplained: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        1.0 - (unexplained.min(total) as f64 / total as f64)
    }

    /// Detect potential issues with recommendation quality
    pub fn detect_issues(metrics: &RecommendationMetrics, slow_threshold: Duration) -> Vec<String> {
        let mut issues = Vec::new();

        if metrics.recommendations_returned == 0 {
            return issues;
        }

        let diversity = Self::diversity_score(
            metrics.unique_genres,
            metrics.unique_authors,
            metrics.recommendations_returned,
        );
        if diversity < 0.3 {
            issues.push(format!("Low diversity: {:.2}", diversity));
        }

        if metrics.total_duration_ms > slow_threshold.as_millis() as u64 {
            issues.push(format!("Slow pass: {}ms", metrics.total_duration_ms));
        }

        let personalization = Self::personalization_score(
            metrics.unexplained_count,
            metrics.recommendations_returned,
        );
        if personalization < 1.0 {
            issues.push(format!(
                "Unexplained recommendations: {:.2}%",
                (1.0 - personalization) * 100.0
            ));
        }

        issues
    }
}
