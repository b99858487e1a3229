//! Candidate catalog
//!
//! The catalog is the superset of books recommendations are drawn from. It is
//! immutable once loaded and shared by `Arc` across recommendation passes.

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::fixtures;
use crate::recommendation::book::{normalize_isbn, CatalogBook};

/// Source of candidate books for a recommendation pass
pub trait CatalogProvider: Send + Sync {
    /// Current catalog snapshot. An error means the catalog is unavailable.
    fn books(&self) -> Result<Arc<[CatalogBook]>>;
}

/// In-memory catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    books: Arc<[CatalogBook]>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Catalog {
    pub fn new(books: Vec<CatalogBook>) -> Self {
        Self {
            books: books.into(),
        }
    }

    /// Load a catalog from a JSON array fixture
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let books: Vec<CatalogBook> = fixtures::read_entries(path, "catalog")?;
        info!("📚 Loaded {} catalog books from {}", books.len(), path.display());
        Ok(Self::new(books))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(Self::new(fixtures::decode_entries(raw, "catalog")?))
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Look a book up by ISBN, ignoring dashes and case
    pub fn find(&self, isbn: &str) -> Option<&CatalogBook> {
        let wanted = normalize_isbn(isbn);
        self.books
            .iter()
            .find(|book| normalize_isbn(&book.isbn) == wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogBook> {
        self.books.iter()
    }
}

impl CatalogProvider for Catalog {
    fn books(&self) -> Result<Arc<[CatalogBook]>> {
        Ok(Arc::clone(&self.books))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = r#"[
        {"isbn": "978-0-553-10354-0", "title": "A Game of Thrones", "author": "George R. R. Martin", "genre": "fantasy"},
        {"isbn": "9780141439518", "title": "Pride and Prejudice", "author": "Jane Austen", "genre": "romance", "genres": ["classic", "romance"]},
        {"isbn": 42}
    ]"#;

    #[test]
    fn test_from_json_str_skips_bad_entries() {
        let catalog = Catalog::from_json_str(FIXTURE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.find("9780553103540").map(|b| b.title.as_str()),
            Some("A Game of Thrones")
        );
        assert!(catalog.find("0000").is_none());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let catalog = Catalog::from_json_file(file.path()).unwrap();
        let books = catalog.books().unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(
            books[1].genres.as_deref(),
            Some(&["classic".to_string(), "romance".to_string()][..])
        );
    }

    #[test]
    fn test_provider_shares_storage() {
        let catalog = Catalog::new(vec![CatalogBook::new("a", "A")]);
        let first = catalog.books().unwrap();
        let second = catalog.books().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
