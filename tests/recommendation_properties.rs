use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use shelfscout::config::RecommendationConfig;
use shelfscout::recommendation::ranker;
use shelfscout::{CatalogBook, InteractedBook, ReasonKind, RecommendationEngine};

fn tolkien_fan() -> Vec<InteractedBook> {
    vec![InteractedBook {
        isbn: "A".to_string(),
        title: "The Hobbit".to_string(),
        genre: Some("fantasy".to_string()),
        author: Some("Tolkien".to_string()),
        favorite: true,
        ..Default::default()
    }]
}

fn catalog() -> Vec<CatalogBook> {
    vec![
        CatalogBook::new("A", "The Hobbit")
            .with_genre("fantasy")
            .with_author("Tolkien"),
        CatalogBook::new("B", "A Game of Thrones")
            .with_genre("fantasy")
            .with_author("Martin"),
        CatalogBook::new("C", "Emma")
            .with_genre("romance")
            .with_author("Austen"),
        CatalogBook::new("D", "The Silmarillion")
            .with_genre("fantasy")
            .with_author("Tolkien"),
    ]
}

#[test]
fn genre_match_scores_three_with_one_reason() {
    let ranked = ranker::rank(&tolkien_fan(), &catalog(), 1.0);
    let b = ranked.iter().find(|s| s.book.isbn == "B").unwrap();
    assert_eq!(b.score, 3.0);
    assert_eq!(b.reasons.len(), 1);
    assert_eq!(b.reasons[0].kind, ReasonKind::Genre);
    assert_eq!(b.reasons[0].message, "Similar to your fantasy books");
}

#[test]
fn genre_and_author_match_scores_four_and_a_half() {
    let ranked = ranker::rank(&tolkien_fan(), &catalog(), 1.0);
    assert_eq!(ranked[0].book.isbn, "D");
    assert_eq!(ranked[0].score, 4.5);
    let kinds: Vec<_> = ranked[0].reasons.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![ReasonKind::Genre, ReasonKind::Author]);
}

#[test]
fn unrelated_and_interacted_books_are_excluded() {
    let ranked = ranker::rank(&tolkien_fan(), &catalog(), 1.0);
    let isbns: Vec<_> = ranked.iter().map(|s| s.book.isbn.as_str()).collect();
    assert_eq!(isbns, vec!["D", "B"]);
}

#[test]
fn interacted_isbn_excluded_across_formatting() {
    let library = vec![InteractedBook {
        isbn: "978-0-261-10221-7".to_string(),
        genre: Some("fantasy".to_string()),
        saved: true,
        ..Default::default()
    }];
    let candidates = vec![
        CatalogBook::new("9780261102217", "The Hobbit").with_genre("fantasy"),
        CatalogBook::new("978-0-261-10320-7", "The Silmarillion").with_genre("fantasy"),
    ];
    let ranked = ranker::rank(&library, &candidates, 1.0);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].book.isbn, "978-0-261-10320-7");
}

#[test]
fn empty_library_recommends_nothing() {
    let engine = RecommendationEngine::default();
    assert!(engine.recommend(&[], &catalog()).is_empty());
}

#[test]
fn invalid_interactions_recommend_nothing() {
    let library = vec![InteractedBook {
        isbn: "A".to_string(),
        genre: Some("fantasy".to_string()),
        rated: true,
        rating: Some(0.0),
        reviewed: true,
        review: Some("   ".to_string()),
        ..Default::default()
    }];
    let engine = RecommendationEngine::default();
    assert!(engine.recommend(&library, &catalog()).is_empty());
}

#[test]
fn higher_ratings_never_score_lower() {
    let candidate = CatalogBook::new("B", "A Game of Thrones").with_genre("fantasy");
    let mut previous = 0.0;
    for rating in [0.5, 1.0, 2.0, 3.0, 4.0, 4.5, 5.0] {
        let library = vec![InteractedBook {
            isbn: "A".to_string(),
            genre: Some("fantasy".to_string()),
            rated: true,
            rating: Some(rating),
            ..Default::default()
        }];
        let ranked = ranker::rank(&library, std::slice::from_ref(&candidate), 0.0);
        let score = ranked.first().map(|s| s.score).unwrap_or(0.0);
        assert!(score >= previous, "rating {} scored {} < {}", rating, score, previous);
        previous = score;
    }
}

#[test]
fn reviewed_books_outweigh_saved_ones() {
    let candidate = CatalogBook::new("B", "A Game of Thrones").with_genre("fantasy");
    let saved = vec![InteractedBook {
        isbn: "A".to_string(),
        genre: Some("fantasy".to_string()),
        saved: true,
        ..Default::default()
    }];
    let reviewed = vec![InteractedBook {
        reviewed: true,
        review: Some("Loved it".to_string()),
        ..saved[0].clone()
    }];
    let saved_score = ranker::rank(&saved, std::slice::from_ref(&candidate), 0.0)[0].score;
    let reviewed_score = ranker::rank(&reviewed, std::slice::from_ref(&candidate), 0.0)[0].score;
    assert!(reviewed_score > saved_score);
}

#[test]
fn min_score_threshold_drops_weak_candidates() {
    let library = vec![InteractedBook {
        isbn: "A".to_string(),
        author: Some("Tolkien".to_string()),
        saved: true,
        ..Default::default()
    }];
    let candidates = vec![CatalogBook::new("D", "The Silmarillion").with_author("Tolkien")];
    assert_eq!(ranker::rank(&library, &candidates, 1.0).len(), 1);
    assert!(ranker::rank(&library, &candidates, 1.5).is_empty());
}

#[test]
fn reasons_are_unique_per_recommendation() {
    let library: Vec<InteractedBook> = (0..5)
        .map(|i| InteractedBook {
            isbn: format!("lib-{}", i),
            title: format!("Fantasy {}", i),
            genre: Some(if i % 2 == 0 { "Fantasy" } else { " fantasy " }.to_string()),
            author: Some("Tolkien".to_string()),
            saved: true,
            ..Default::default()
        })
        .collect();
    let ranked = ranker::rank(&library, &catalog(), 1.0);
    assert!(!ranked.is_empty());
    for scored in &ranked {
        let keys: HashSet<_> = scored
            .reasons
            .iter()
            .map(|r| (r.kind, r.value.clone()))
            .collect();
        assert_eq!(keys.len(), scored.reasons.len());
    }
}

#[test]
fn batch_is_bounded_and_drawn_from_ranked_set() {
    let library = tolkien_fan();
    let candidates: Vec<CatalogBook> = (0..100)
        .map(|i| CatalogBook::new(format!("cand-{}", i), format!("Book {}", i)).with_genre("fantasy"))
        .collect();
    let config = RecommendationConfig {
        batch_size: 12,
        ..Default::default()
    };
    let engine = RecommendationEngine::new(config);
    let profile = engine.profile(&library);
    let pass = engine.run_pass(&profile, &candidates, &mut StdRng::seed_from_u64(3));

    assert_eq!(pass.books.len(), 12);
    let unique: HashSet<_> = pass.books.iter().map(|s| s.book.isbn.clone()).collect();
    assert_eq!(unique.len(), 12);
    assert!(pass.books.iter().all(|s| s.score >= 1.0));
    assert_eq!(pass.metrics.recommendations_returned, 12);
    assert_eq!(pass.metrics.relevant_candidates, 100);
}

#[test]
fn small_ranked_sets_are_returned_whole() {
    let engine = RecommendationEngine::default();
    let picks = engine.recommend(&tolkien_fan(), &catalog());
    let mut isbns: Vec<_> = picks.iter().map(|s| s.book.isbn.clone()).collect();
    isbns.sort();
    assert_eq!(isbns, vec!["B".to_string(), "D".to_string()]);
}
