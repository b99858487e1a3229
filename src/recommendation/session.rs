//! Recommendation Session Controller
//!
//! Watches library snapshots and republishes the recommendation list whenever
//! the library changes materially.
//!
//! ## State machine
//!
//! `Idle` (no valid interactions) → `Computing` → `Published`, re-entering
//! `Computing` on every library change. Any failure during a pass (for example
//! the catalog being unavailable) publishes an empty list instead of keeping
//! stale reasons around.
//!
//! ## Change detection
//!
//! The authoritative trigger is the full serialized library snapshot. The
//! interaction hash is a best-effort digest kept for logs and consumers.
//!
//! Inside [`RecommendationSession::run`] each pass runs on the blocking pool,
//! since large catalogs are scored on rayon.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::book::{InteractedBook, ScoredBook};
use super::engine::RecommendationEngine;
use super::metrics::QualityAnalyzer;
use super::scorer::InteractionProfile;
use crate::catalog::CatalogProvider;
use crate::error::{Error, Result};
use crate::library::LibrarySnapshot;

/// Lifecycle of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Computing,
    Published,
}

/// One published batch of recommendations. Read-only once published.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationSet {
    pub id: Uuid,
    pub books: Vec<ScoredBook>,
    pub interaction_hash: String,
    pub computed_at: DateTime<Utc>,
}

impl RecommendationSet {
    pub fn empty(interaction_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            books: Vec::new(),
            interaction_hash: interaction_hash.into(),
            computed_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// Best-effort digest of the valid interactions in a library.
///
/// Sorted, comma-joined `isbn:` tokens with `s` for saved, `f` for favorite,
/// the rating to one decimal when rated, and `v` for reviewed.
pub fn interaction_hash<'a, I>(books: I) -> String
where
    I: IntoIterator<Item = &'a InteractedBook>,
{
    let mut tokens: Vec<String> = books
        .into_iter()
        .filter(|book| book.is_valid_interaction())
        .map(|book| {
            let mut token = format!("{}:", book.isbn);
            if book.saved {
                token.push('s');
            }
            if book.favorite {
                token.push('f');
            }
            if let Some(rating) = book.rating.filter(|_| book.rated) {
                token.push_str(&format!("{:.1}", rating));
            }
            if book.reviewed {
                token.push('v');
            }
            token
        })
        .collect();
    tokens.sort_unstable();
    tokens.join(",")
}

/// Controller-owned cache; lives from the first trigger until the library changes
struct SessionCache {
    snapshot: String,
    hash: String,
    profile: Arc<InteractionProfile>,
}

/// What a library change asks the controller to do next
enum Step {
    Unchanged,
    Published,
    Compute(PassJob),
}

/// One recommendation pass, detached from the session so it can run off the
/// async worker
struct PassJob {
    engine: Arc<RecommendationEngine>,
    catalog: Arc<dyn CatalogProvider>,
    profile: Arc<InteractionProfile>,
    hash: String,
}

impl PassJob {
    fn run(self) -> Result<RecommendationSet> {
        let catalog = self.catalog.books()?;
        if catalog.is_empty() {
            warn!("Catalog is empty, publishing empty recommendations");
            return Ok(RecommendationSet::empty(self.hash));
        }

        let mut pass = self
            .engine
            .run_pass(&self.profile, &catalog, &mut rand::thread_rng());
        pass.metrics.interaction_hash = self.hash.clone();
        pass.metrics.record();

        for issue in QualityAnalyzer::detect_issues(&pass.metrics, self.engine.config().slow_pass) {
            warn!("Recommendation quality: {}", issue);
        }

        Ok(RecommendationSet {
            id: Uuid::new_v4(),
            books: pass.books,
            interaction_hash: self.hash,
            computed_at: Utc::now(),
        })
    }
}

/// Keeps the published recommendation list in step with the library
pub struct RecommendationSession {
    engine: Arc<RecommendationEngine>,
    catalog: Arc<dyn CatalogProvider>,
    state: SessionState,
    cache: Option<SessionCache>,
    published: watch::Sender<Arc<RecommendationSet>>,
}

impl RecommendationSession {
    /// Start a session with no cached state and an empty published list
    pub fn new(engine: RecommendationEngine, catalog: Arc<dyn CatalogProvider>) -> Self {
        let (published, _rx) = watch::channel(Arc::new(RecommendationSet::empty("")));
        debug!("Recommendation session started with a cleared cache");
        Self {
            engine: Arc::new(engine),
            catalog,
            state: SessionState::Idle,
            cache: None,
            published,
        }
    }

    /// Receive every newly published set
    pub fn subscribe(&self) -> watch::Receiver<Arc<RecommendationSet>> {
        self.published.subscribe()
    }

    /// Currently published set
    pub fn current(&self) -> Arc<RecommendationSet> {
        Arc::clone(&self.published.borrow())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Digest of the library the current set was computed from
    pub fn interaction_hash(&self) -> Option<&str> {
        self.cache.as_ref().map(|c| c.hash.as_str())
    }

    /// Drop cached state so the next trigger recomputes unconditionally
    pub fn invalidate(&mut self) {
        if self.cache.take().is_some() {
            debug!("Recommendation cache invalidated");
        }
    }

    /// Recompute regardless of whether the library changed.
    ///
    /// When `snapshot` matches the cache the cached profile is reused, so only
    /// the catalog read, ranking and shuffle run again.
    pub fn refresh(&mut self, snapshot: &LibrarySnapshot) {
        let step = match self.cached_job(snapshot) {
            Some(job) => {
                self.state = SessionState::Computing;
                Step::Compute(job)
            }
            None => {
                self.invalidate();
                self.prepare(snapshot)
            }
        };
        self.execute(step);
    }

    /// React to a library snapshot. Returns true if a new set was published.
    pub fn on_library_change(&mut self, snapshot: &LibrarySnapshot) -> bool {
        let step = self.prepare(snapshot);
        self.execute(step)
    }

    fn execute(&mut self, step: Step) -> bool {
        match step {
            Step::Unchanged => false,
            Step::Published => true,
            Step::Compute(job) => {
                let hash = job.hash.clone();
                let result = job.run();
                self.finish(&hash, result);
                true
            }
        }
    }

    /// Pass over the cached profile if `snapshot` is the one it was built from
    fn cached_job(&self, snapshot: &LibrarySnapshot) -> Option<PassJob> {
        let cache = self.cache.as_ref()?;
        let serialized = snapshot.serialized().ok()?;
        if cache.snapshot != serialized || cache.profile.is_empty() {
            return None;
        }
        debug!("Reusing cached profile (hash {})", cache.hash);
        Some(self.job(Arc::clone(&cache.profile), cache.hash.clone()))
    }

    fn job(&self, profile: Arc<InteractionProfile>, hash: String) -> PassJob {
        PassJob {
            engine: Arc::clone(&self.engine),
            catalog: Arc::clone(&self.catalog),
            profile,
            hash,
        }
    }

    /// Update the cache for `snapshot` and decide whether a pass is needed
    fn prepare(&mut self, snapshot: &LibrarySnapshot) -> Step {
        let serialized = match snapshot.serialized() {
            Ok(serialized) => serialized,
            Err(e) => {
                error!(code = e.error_code(), "Failed to serialize library snapshot: {}", e);
                self.cache = None;
                self.publish(RecommendationSet::empty(""));
                self.state = SessionState::Published;
                return Step::Published;
            }
        };

        if let Some(cache) = &self.cache {
            if cache.snapshot == serialized {
                debug!("Library unchanged (hash {}), keeping recommendations", cache.hash);
                return Step::Unchanged;
            }
        }

        self.state = SessionState::Computing;

        let hash = interaction_hash(snapshot.iter());
        let previous = self.cache.as_ref().map(|c| c.hash.clone());
        if previous.as_deref() == Some(hash.as_str()) {
            debug!("Library snapshot changed without touching valid interactions");
        }

        let profile = Arc::new(self.engine.profile(snapshot.iter()));
        self.cache = Some(SessionCache {
            snapshot: serialized,
            hash: hash.clone(),
            profile: Arc::clone(&profile),
        });

        if profile.is_empty() {
            info!("No valid interactions in library, publishing empty recommendations");
            self.publish(RecommendationSet::empty(hash));
            self.state = SessionState::Idle;
            return Step::Published;
        }

        Step::Compute(self.job(profile, hash))
    }

    fn finish(&mut self, hash: &str, result: Result<RecommendationSet>) {
        match result {
            Ok(set) => {
                info!(
                    "✅ Published {} recommendations from {} library signals",
                    set.len(),
                    self.cache.as_ref().map_or(0, |c| c.profile.signal_count())
                );
                self.publish(set);
            }
            Err(e) => {
                error!(
                    code = e.error_code(),
                    "Recommendation pass failed, clearing published list: {}", e
                );
                self.publish(RecommendationSet::empty(hash));
            }
        }
        self.state = SessionState::Published;
    }

    fn publish(&self, set: RecommendationSet) {
        self.published.send_replace(Arc::new(set));
    }

    /// Apply a snapshot, running any pass on the blocking pool
    async fn apply(&mut self, snapshot: &LibrarySnapshot) {
        let Step::Compute(job) = self.prepare(snapshot) else {
            return;
        };
        let hash = job.hash.clone();
        let result = match tokio::task::spawn_blocking(move || job.run()).await {
            Ok(result) => result,
            Err(e) => Err(Error::recommendation(format!("pass task failed: {}", e))),
        };
        self.finish(&hash, result);
    }

    /// Follow library snapshots until the store goes away or shutdown fires
    pub async fn run(
        mut self,
        mut library: watch::Receiver<LibrarySnapshot>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let initial = library.borrow_and_update().clone();
        self.apply(&initial).await;

        loop {
            tokio::select! {
                changed = library.changed() => {
                    if changed.is_err() {
                        info!("Library store closed, stopping recommendation session");
                        break;
                    }
                    let snapshot = library.borrow_and_update().clone();
                    self.apply(&snapshot).await;
                }
                _ = shutdown.recv() => {
                    info!("Recommendation session shutting down");
                    break;
                }
            }
        }

        self.close();
    }

    /// End the session: dispose cached state and clear the published list
    pub fn close(mut self) {
        self.invalidate();
        self.publish(RecommendationSet::empty(""));
        self.state = SessionState::Idle;
        debug!("Recommendation session closed");
    }
}
