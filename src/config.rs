//! Configuration management for the ShelfScout engine
//!
//! Provides strongly-typed configuration with validation, environment variable parsing,
//! and sensible defaults.
//!
//! # Example
//! ```no_run
//! use shelfscout::Config;
//! let config = Config::from_env().expect("failed to load config");
//! println!("Batch size: {}", config.recommendation.batch_size);
//! ```

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Default number of books returned per published batch
pub const DEFAULT_BATCH_SIZE: usize = 750;

/// Below this score a match is considered noise
pub const DEFAULT_MIN_SCORE: f64 = 1.0;

/// Catalogs at or above this size are scored on the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2000;

/// Passes slower than this many milliseconds are logged at warn
pub const DEFAULT_SLOW_PASS_MS: u64 = 50;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Recommendation engine configuration
    pub recommendation: RecommendationConfig,
    /// Fixture locations for the catalog and library
    pub fixtures: FixtureConfig,
}

/// Recommendation engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationConfig {
    /// Maximum books in one published batch
    pub batch_size: usize,
    /// Minimum score threshold
    pub min_score: f64,
    /// Catalog size at which scoring switches to rayon
    pub parallel_threshold: usize,
    /// Passes slower than this are logged at warn
    pub slow_pass: Duration,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            min_score: DEFAULT_MIN_SCORE,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            slow_pass: Duration::from_millis(DEFAULT_SLOW_PASS_MS),
        }
    }
}

/// JSON fixture locations
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Catalog of candidate books
    pub catalog_path: PathBuf,
    /// User library seed
    pub library_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Try to load .env file (ignore if not found)
        dotenvy::dotenv().ok();

        let config = Self {
            recommendation: RecommendationConfig::from_env()?,
            fixtures: FixtureConfig::from_env()?,
        };

        config.validate()?;
        config.log_summary();

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        self.recommendation.validate()
    }

    /// Log configuration summary
    fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  Recommendation:");
        info!("    Batch Size: {}", self.recommendation.batch_size);
        info!("    Min Score: {}", self.recommendation.min_score);
        info!(
            "    Parallel Threshold: {}",
            self.recommendation.parallel_threshold
        );
        info!("    Slow Pass: {:?}", self.recommendation.slow_pass);
        info!("  Fixtures:");
        info!("    Catalog: {}", self.fixtures.catalog_path.display());
        info!("    Library: {}", self.fixtures.library_path.display());
    }
}

impl RecommendationConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            batch_size: get_env_parsed_or("SHELFSCOUT_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            min_score: get_env_parsed_or("SHELFSCOUT_MIN_SCORE", DEFAULT_MIN_SCORE)?,
            parallel_threshold: get_env_parsed_or(
                "SHELFSCOUT_PARALLEL_THRESHOLD",
                DEFAULT_PARALLEL_THRESHOLD,
            )?,
            slow_pass: Duration::from_millis(get_env_parsed_or(
                "SHELFSCOUT_SLOW_PASS_MS",
                DEFAULT_SLOW_PASS_MS,
            )?),
        })
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig {
                key: "SHELFSCOUT_BATCH_SIZE",
                message: "batch size must be greater than zero".into(),
            });
        }

        if !self.min_score.is_finite() || self.min_score < 0.0 {
            return Err(Error::InvalidConfig {
                key: "SHELFSCOUT_MIN_SCORE",
                message: format!("min score must be a non-negative number, got {}", self.min_score)
                    .into(),
            });
        }

        Ok(())
    }
}

impl FixtureConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            catalog_path: PathBuf::from(get_env_or(
                "SHELFSCOUT_CATALOG_PATH",
                "fixtures/catalog.json",
            )),
            library_path: PathBuf::from(get_env_or(
                "SHELFSCOUT_LIBRARY_PATH",
                "fixtures/library.json",
            )),
        })
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get environment variable with default
fn get_env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset
fn get_env_parsed_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| Error::InvalidConfig {
            key,
            message: format!("Invalid value '{}': {}", value, e).into(),
        }),
        Err(_) => Ok(default),
    }
}
