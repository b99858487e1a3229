//! Similarity Scoring
//!
//! Scores one catalog book against everything the user has interacted with.
//! Each interacted book contributes through an engagement multiplier:
//! - Reviewed with text: 2.0 (strongest signal)
//! - Rated: `max(0.3, (rating - 2.0) * 0.5 + 1.0)`
//! - Favorited: 1.5
//! - Saved: 1.0
//!
//! Matches are additive: genre `2x`, author `1x`, each shared tag from the
//! multi-genre list `2x`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::book::{normalize_attribute, normalize_isbn, CatalogBook, InteractedBook, Reason, ReasonKind};

/// Scoring weights (can be tuned)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub genre_match: f64,
    pub author_match: f64,
    pub genre_overlap: f64,
    pub reviewed: f64,
    pub favorite: f64,
    pub saved: f64,
    pub rating_pivot: f64,
    pub rating_slope: f64,
    pub rating_floor: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            genre_match: 2.0,
            author_match: 1.0,
            genre_overlap: 2.0,
            reviewed: 2.0,
            favorite: 1.5,
            saved: 1.0,
            rating_pivot: 2.0, // a 2-star rating weighs the same as a save
            rating_slope: 0.5,
            rating_floor: 0.3,
        }
    }
}

impl ScoringWeights {
    /// Engagement multiplier for one library entry, `None` if it carries no signal
    pub fn engagement_multiplier(&self, book: &InteractedBook) -> Option<f64> {
        if book.effective_review().is_some() {
            Some(self.reviewed)
        } else if let Some(rating) = book.effective_rating() {
            Some(
                ((rating - self.rating_pivot) * self.rating_slope + 1.0).max(self.rating_floor),
            )
        } else if book.favorite {
            Some(self.favorite)
        } else if book.saved {
            Some(self.saved)
        } else {
            None
        }
    }
}

/// Score and reasons for one candidate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Similarity {
    pub score: f64,
    pub reasons: Vec<Reason>,
}

/// One interacted book, normalized once and ready to match against candidates
#[derive(Debug, Clone)]
struct Signal {
    multiplier: f64,
    reviewed: bool,
    title: String,
    genre: Option<String>,
    genre_label: String,
    author: Option<String>,
    genres: Option<Vec<String>>,
}

/// Everything scoring needs to know about a user's library
#[derive(Debug, Clone)]
pub struct InteractionProfile {
    weights: ScoringWeights,
    signals: Vec<Signal>,
    genre_set: HashSet<String>,
    excluded_isbns: HashSet<String>,
}

impl InteractionProfile {
    /// Build a profile from library entries.
    ///
    /// Every entry feeds the exclusion set. Only entries that pass the validity
    /// predicate and carry a genre or author become scoring signals.
    pub fn new<'a, I>(books: I, weights: ScoringWeights) -> Self
    where
        I: IntoIterator<Item = &'a InteractedBook>,
    {
        let mut signals = Vec::new();
        let mut genre_set = HashSet::new();
        let mut excluded_isbns = HashSet::new();

        for book in books {
            let isbn = normalize_isbn(&book.isbn);
            if !isbn.is_empty() {
                excluded_isbns.insert(isbn);
            }

            if !book.has_matchable_attribute() {
                continue;
            }
            let Some(multiplier) = weights.engagement_multiplier(book) else {
                continue;
            };

            let genre = normalize_attribute(book.genre.as_deref());
            if let Some(g) = &genre {
                genre_set.insert(g.clone());
            }

            let genres = book.genres.as_ref().map(|list| {
                let mut seen = HashSet::new();
                list.iter()
                    .filter(|g| seen.insert(g.to_string()))
                    .cloned()
                    .collect::<Vec<_>>()
            });

            signals.push(Signal {
                multiplier,
                reviewed: book.effective_review().is_some(),
                title: book.title.clone(),
                genre_label: book.genre.as_deref().unwrap_or_default().trim().to_string(),
                genre,
                author: normalize_attribute(book.author.as_deref()),
                genres,
            });
        }

        Self {
            weights,
            signals,
            genre_set,
            excluded_isbns,
        }
    }

    /// No valid interactions to score against
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Number of library entries that act as scoring signals
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Whether a candidate is already in the user's library
    pub fn excludes(&self, isbn: &str) -> bool {
        self.excluded_isbns.contains(&normalize_isbn(isbn))
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one candidate. Deterministic for identical inputs.
    pub fn score(&self, candidate: &CatalogBook) -> Similarity {
        if self.signals.is_empty() || !candidate.has_isbn() {
            return Similarity::default();
        }

        let candidate_genre = normalize_attribute(candidate.genre.as_deref());
        let candidate_author = normalize_attribute(candidate.author.as_deref());

        let mut reasons = ReasonSet::default();
        let mut score = 0.0;

        for signal in &self.signals {
            if let (Some(genre), Some(wanted)) = (&signal.genre, &candidate_genre) {
                if genre == wanted && self.genre_set.contains(genre) {
                    score += self.weights.genre_match * signal.multiplier;
                    reasons.push(
                        ReasonKind::Genre,
                        genre,
                        format!("Similar to your {} books", signal.genre_label),
                        signal.reviewed,
                    );
                }
            }

            if let (Some(author), Some(wanted)) = (&signal.author, &candidate_author) {
                if author == wanted {
                    score += self.weights.author_match * signal.multiplier;
                    reasons.push(
                        ReasonKind::Author,
                        author,
                        format!("Same author as \"{}\"", signal.title),
                        signal.reviewed,
                    );
                }
            }

            if let (Some(mine), Some(theirs)) = (&signal.genres, &candidate.genres) {
                for shared in mine.iter().filter(|g| theirs.contains(*g)) {
                    score += self.weights.genre_overlap * signal.multiplier;
                    let value = normalize_attribute(Some(shared.as_str())).unwrap_or_default();
                    reasons.push(
                        ReasonKind::Genre,
                        &value,
                        format!("Similar to your {} books", shared.trim()),
                        signal.reviewed,
                    );
                }
            }
        }

        Similarity {
            score,
            reasons: reasons.into_vec(),
        }
    }
}

/// Score a candidate with the default weights.
///
/// Builds a throwaway profile; use [`InteractionProfile`] directly when
/// scoring many candidates against the same library.
pub fn score(interacted: &[InteractedBook], candidate: &CatalogBook) -> Similarity {
    if interacted.is_empty() {
        return Similarity::default();
    }
    InteractionProfile::new(interacted, ScoringWeights::default()).score(candidate)
}

/// Reasons deduplicated by `(kind, value)`, first one wins
#[derive(Default)]
struct ReasonSet {
    seen: HashSet<(ReasonKind, String)>,
    reasons: Vec<Reason>,
}

impl ReasonSet {
    fn push(&mut self, kind: ReasonKind, value: &str, message: String, reviewed: bool) {
        if value.is_empty() || !self.seen.insert((kind, value.to_string())) {
            return;
        }
        let message = if reviewed {
            format!("{} (reviewed)", message)
        } else {
            message
        };
        self.reasons.push(Reason {
            kind,
            value: value.to_string(),
            message,
        });
    }

    fn into_vec(self) -> Vec<Reason> {
        self.reasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn favorite_tolkien() -> InteractedBook {
        InteractedBook {
            isbn: "A".to_string(),
            title: "The Hobbit".to_string(),
            genre: Some("fantasy".to_string()),
            author: Some("Tolkien".to_string()),
            favorite: true,
            ..Default::default()
        }
    }

    fn rated(rating: f64) -> InteractedBook {
        InteractedBook {
            rated: true,
            rating: Some(rating),
            favorite: false,
            ..favorite_tolkien()
        }
    }

    #[test]
    fn test_engagement_multiplier() {
        let weights = ScoringWeights::default();
        assert_eq!(weights.engagement_multiplier(&favorite_tolkien()), Some(1.5));
        assert_eq!(weights.engagement_multiplier(&rated(5.0)), Some(2.5));
        assert_eq!(weights.engagement_multiplier(&rated(2.0)), Some(1.0));
        assert_eq!(weights.engagement_multiplier(&rated(0.5)), Some(0.3));
        assert_eq!(weights.engagement_multiplier(&rated(0.0)), None);

        let reviewed = InteractedBook {
            reviewed: true,
            review: Some("A classic".to_string()),
            ..rated(5.0)
        };
        assert_eq!(weights.engagement_multiplier(&reviewed), Some(2.0));

        let saved = InteractedBook {
            favorite: false,
            saved: true,
            ..favorite_tolkien()
        };
        assert_eq!(weights.engagement_multiplier(&saved), Some(1.0));
    }

    #[test]
    fn test_genre_only_match() {
        let candidate = CatalogBook::new("B", "A Game of Thrones")
            .with_genre("fantasy")
            .with_author("Martin");
        let result = score(&[favorite_tolkien()], &candidate);
        assert_eq!(result.score, 3.0);
        assert_eq!(result.reasons.len(), 1);
        assert_eq!(result.reasons[0].message, "Similar to your fantasy books");
    }

    #[test]
    fn test_genre_and_author_match() {
        let candidate = CatalogBook::new("D", "The Silmarillion")
            .with_genre("Fantasy ")
            .with_author("tolkien");
        let result = score(&[favorite_tolkien()], &candidate);
        assert_eq!(result.score, 4.5);
        assert_eq!(result.reasons.len(), 2);
        assert_eq!(result.reasons[1].kind, ReasonKind::Author);
        assert_eq!(result.reasons[1].message, "Same author as \"The Hobbit\"");
    }

    #[test]
    fn test_no_match_scores_zero() {
        let candidate = CatalogBook::new("C", "Emma")
            .with_genre("romance")
            .with_author("Austen");
        let result = score(&[favorite_tolkien()], &candidate);
        assert_eq!(result, Similarity::default());
    }

    #[test]
    fn test_missing_isbn_or_empty_library_scores_zero() {
        let nameless = CatalogBook::new("  ", "Untitled").with_genre("fantasy");
        assert_eq!(score(&[favorite_tolkien()], &nameless).score, 0.0);

        let candidate = CatalogBook::new("B", "x").with_genre("fantasy");
        assert_eq!(score(&[], &candidate).score, 0.0);
    }

    #[test]
    fn test_invalid_interactions_are_ignored() {
        let untouched = InteractedBook {
            favorite: false,
            ..favorite_tolkien()
        };
        let candidate = CatalogBook::new("B", "x").with_genre("fantasy");
        assert_eq!(score(&[untouched, rated(0.0)], &candidate).score, 0.0);
    }

    #[test]
    fn test_reasons_deduplicated_across_library() {
        let second = InteractedBook {
            isbn: "E".to_string(),
            title: "The Two Towers".to_string(),
            ..favorite_tolkien()
        };
        let candidate = CatalogBook::new("D", "x")
            .with_genre("fantasy")
            .with_author("Tolkien");
        let result = score(&[favorite_tolkien(), second], &candidate);
        assert_eq!(result.score, 9.0);
        assert_eq!(result.reasons.len(), 2);
        assert_eq!(result.reasons[1].message, "Same author as \"The Hobbit\"");
    }

    #[test]
    fn test_reviewed_suffix() {
        let reviewed = InteractedBook {
            favorite: false,
            reviewed: true,
            review: Some("Second breakfast!".to_string()),
            ..favorite_tolkien()
        };
        let candidate = CatalogBook::new("B", "x").with_genre("fantasy");
        let result = score(&[reviewed], &candidate);
        assert_eq!(result.score, 4.0);
        assert_eq!(
            result.reasons[0].message,
            "Similar to your fantasy books (reviewed)"
        );
    }

    #[test]
    fn test_multi_genre_overlap() {
        let tagged = InteractedBook {
            genres: Some(vec![
                "epic".to_string(),
                "quest".to_string(),
                "epic".to_string(),
            ]),
            ..favorite_tolkien()
        };
        let candidate = CatalogBook::new("F", "x")
            .with_genre("science fiction")
            .with_genres(["epic", "quest", "space"]);
        let result = score(&[tagged], &candidate);
        assert_eq!(result.score, 2.0 * 1.5 * 2.0);
        let values: Vec<_> = result.reasons.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["epic", "quest"]);
    }

    #[test]
    fn test_book_without_attributes_contributes_nothing() {
        let bare = InteractedBook {
            isbn: "Z".to_string(),
            saved: true,
            genres: Some(vec!["epic".to_string()]),
            ..Default::default()
        };
        let profile = InteractionProfile::new([&bare], ScoringWeights::default());
        assert!(profile.is_empty());
        assert!(profile.excludes("z"));
    }

    #[test]
    fn test_higher_rating_never_scores_lower() {
        let candidate = CatalogBook::new("D", "x")
            .with_genre("fantasy")
            .with_author("Tolkien");
        let mut previous = 0.0;
        for rating in [2.0, 2.5, 3.0, 4.0, 4.5, 5.0] {
            let current = score(&[rated(rating)], &candidate).score;
            assert!(current >= previous, "rating {} scored {}", rating, current);
            previous = current;
        }
    }
}
