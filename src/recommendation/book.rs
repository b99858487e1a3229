//! Book Records
//!
//! Catalog entries, library entries annotated with the user's interactions,
//! and the scored records produced by a recommendation pass.

use serde::{Deserialize, Serialize};

/// A catalog entry the user may not have touched yet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogBook {
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
}

impl CatalogBook {
    pub fn new(isbn: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = Some(genres.into_iter().map(Into::into).collect());
        self
    }

    /// True when the entry carries a usable identity
    pub fn has_isbn(&self) -> bool {
        !self.isbn.trim().is_empty()
    }
}

/// A library entry: a book plus the user's relationship to it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractedBook {
    pub isbn: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,

    #[serde(default)]
    pub saved: bool,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub reviewed: bool,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review: Option<String>,
}

impl InteractedBook {
    /// Start a library entry from a catalog book with no interaction flags set
    pub fn from_catalog(book: &CatalogBook) -> Self {
        Self {
            isbn: book.isbn.trim().to_string(),
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            genres: book.genres.clone(),
            ..Default::default()
        }
    }

    /// Rating that counts as a signal: present, finite and positive
    pub fn effective_rating(&self) -> Option<f64> {
        if !self.rated {
            return None;
        }
        self.rating.filter(|r| r.is_finite() && *r > 0.0)
    }

    /// Review text that counts as a signal: non-empty after trimming
    pub fn effective_review(&self) -> Option<&str> {
        if !self.reviewed {
            return None;
        }
        self.review
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Saved, favorited, meaningfully rated, or meaningfully reviewed
    pub fn is_valid_interaction(&self) -> bool {
        self.saved
            || self.favorite
            || self.effective_rating().is_some()
            || self.effective_review().is_some()
    }

    /// At least one of genre or author is present
    pub fn has_matchable_attribute(&self) -> bool {
        normalize_attribute(self.genre.as_deref()).is_some()
            || normalize_attribute(self.author.as_deref()).is_some()
    }

    /// Any interaction flag is set
    pub fn has_any_flag(&self) -> bool {
        self.saved || self.favorite || self.rated || self.reviewed
    }

    /// Drop rating/review payloads whose flag is off
    pub fn sanitized(mut self) -> Self {
        if !self.rated {
            self.rating = None;
        }
        if !self.reviewed {
            self.review = None;
        }
        self
    }
}

/// Kind of match behind a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    Genre,
    Author,
}

/// Human-readable explanation attached to a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    #[serde(rename = "type")]
    pub kind: ReasonKind,
    pub value: String,
    pub message: String,
}

/// A candidate with its score and reasons for one recommendation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredBook {
    #[serde(flatten)]
    pub book: CatalogBook,
    pub score: f64,
    pub reasons: Vec<Reason>,
}

/// Strip dashes and whitespace, lowercase
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Trim and lowercase a genre or author; empty values become `None`
pub fn normalize_attribute(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}
