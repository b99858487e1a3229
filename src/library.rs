//! User Library Store
//!
//! Tracks the user's relationship to books (saved, favorite, rated, reviewed)
//! and publishes every change as an immutable snapshot on a `watch` channel.
//! The recommendation session subscribes to those snapshots; it never writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::error::{Error, Result};
use crate::fixtures;
use crate::recommendation::book::{normalize_isbn, CatalogBook, InteractedBook};

/// Highest accepted star rating
pub const MAX_RATING: f64 = 5.0;

/// Library mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Interaction {
    Save,
    Unsave,
    Favorite,
    Unfavorite,
    Rate(f64),
    ClearRating,
    Review(String),
    ClearReview,
}

impl std::fmt::Display for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interaction::Save => write!(f, "save"),
            Interaction::Unsave => write!(f, "unsave"),
            Interaction::Favorite => write!(f, "favorite"),
            Interaction::Unfavorite => write!(f, "unfavorite"),
            Interaction::Rate(r) => write!(f, "rate({})", r),
            Interaction::ClearRating => write!(f, "clear_rating"),
            Interaction::Review(_) => write!(f, "review"),
            Interaction::ClearReview => write!(f, "clear_review"),
        }
    }
}

/// Immutable view of the library at one point in time, keyed by normalized ISBN
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibrarySnapshot {
    books: Arc<BTreeMap<String, InteractedBook>>,
}

impl LibrarySnapshot {
    pub fn new(books: impl IntoIterator<Item = InteractedBook>) -> Self {
        let books = books
            .into_iter()
            .map(InteractedBook::sanitized)
            .filter_map(|mut book| {
                let key = normalize_isbn(&book.isbn);
                if key.is_empty() {
                    return None;
                }
                book.isbn = book.isbn.trim().to_string();
                Some((key, book))
            })
            .collect();
        Self {
            books: Arc::new(books),
        }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Look an entry up by ISBN, ignoring dashes and case
    pub fn get(&self, isbn: &str) -> Option<&InteractedBook> {
        self.books.get(&normalize_isbn(isbn))
    }

    /// Entries in ISBN order
    pub fn iter(&self) -> impl Iterator<Item = &InteractedBook> {
        self.books.values()
    }

    /// Entries that pass the validity predicate
    pub fn valid_interactions(&self) -> impl Iterator<Item = &InteractedBook> {
        self.iter().filter(|book| book.is_valid_interaction())
    }

    /// Canonical JSON form, used for change detection
    pub fn serialized(&self) -> Result<String> {
        Ok(serde_json::to_string(&*self.books)?)
    }

    /// Apply one interaction. Returns whether the library changed.
    fn apply(&mut self, book: &CatalogBook, interaction: &Interaction) -> Result<bool> {
        let isbn = book.isbn.trim();
        let key = normalize_isbn(isbn);
        if key.is_empty() {
            return Err(Error::invalid_interaction(
                book.title.clone(),
                "book has no ISBN",
            ));
        }

        let interaction = validate(isbn, interaction)?;

        let current = self.books.get(&key).cloned();
        let mut entry = current
            .clone()
            .unwrap_or_else(|| InteractedBook::from_catalog(book));

        match interaction {
            Interaction::Save => entry.saved = true,
            Interaction::Unsave => entry.saved = false,
            Interaction::Favorite => entry.favorite = true,
            Interaction::Unfavorite => entry.favorite = false,
            Interaction::Rate(rating) => {
                entry.rated = true;
                entry.rating = Some(rating);
            }
            Interaction::ClearRating => {
                entry.rated = false;
                entry.rating = None;
            }
            Interaction::Review(text) => {
                entry.reviewed = true;
                entry.review = Some(text);
            }
            Interaction::ClearReview => {
                entry.reviewed = false;
                entry.review = None;
            }
        }

        let next = entry.has_any_flag().then_some(entry);
        if next == current {
            return Ok(false);
        }

        let books = Arc::make_mut(&mut self.books);
        match next {
            Some(entry) => {
                books.insert(key, entry);
            }
            None => {
                books.remove(&key);
            }
        }
        Ok(true)
    }
}

/// Check an interaction against the library contract, trimming review text
fn validate(isbn: &str, interaction: &Interaction) -> Result<Interaction> {
    match interaction {
        Interaction::Rate(rating) if !rating.is_finite() || !(0.0..=MAX_RATING).contains(rating) => {
            Err(Error::invalid_interaction(
                isbn,
                format!("rating must be between 0 and {}, got {}", MAX_RATING, rating),
            ))
        }
        Interaction::Review(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(Error::invalid_interaction(isbn, "review text is empty"));
            }
            Ok(Interaction::Review(text.to_string()))
        }
        other => Ok(other.clone()),
    }
}

/// In-memory library that notifies subscribers on every change
#[derive(Debug)]
pub struct LibraryStore {
    tx: watch::Sender<LibrarySnapshot>,
}

impl Default for LibraryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::with_books(Vec::new())
    }

    pub fn with_books(books: impl IntoIterator<Item = InteractedBook>) -> Self {
        let (tx, _rx) = watch::channel(LibrarySnapshot::new(books));
        Self { tx }
    }

    /// Seed a library from a JSON array fixture
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let books: Vec<InteractedBook> = fixtures::read_entries(path, "library")?;
        let store = Self::with_books(books);
        info!(
            "📖 Loaded {} library entries from {}",
            store.snapshot().len(),
            path.display()
        );
        Ok(store)
    }

    /// Receive a new snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<LibrarySnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> LibrarySnapshot {
        self.tx.borrow().clone()
    }

    /// Record an interaction with `book`.
    ///
    /// An entry whose flags all end up false leaves the library. Subscribers
    /// are only notified when something actually changed.
    pub fn record(&self, book: &CatalogBook, interaction: Interaction) -> Result<()> {
        let mut outcome = Ok(());
        let changed = self.tx.send_if_modified(|snapshot| {
            match snapshot.apply(book, &interaction) {
                Ok(changed) => changed,
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });

        if changed {
            info!("📊 Recorded {} interaction: isbn={}", interaction, book.isbn.trim());
        }
        outcome
    }

    /// Remove a book from the library entirely
    pub fn remove(&self, isbn: &str) -> Result<InteractedBook> {
        let key = normalize_isbn(isbn);
        let mut removed = None;
        self.tx.send_if_modified(|snapshot| {
            if !snapshot.books.contains_key(&key) {
                return false;
            }
            removed = Arc::make_mut(&mut snapshot.books).remove(&key);
            removed.is_some()
        });

        removed.ok_or_else(|| Error::BookNotFound {
            isbn: isbn.trim().to_string(),
        })
    }
}
