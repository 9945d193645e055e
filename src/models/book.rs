//! Book model and search query types

use serde::{Deserialize, Serialize};

use crate::search::{contains_ci, FieldMatcher};

/// A book in the catalogue
///
/// The id is assigned by the catalogue and never changes; everything else
/// is mutable in place. The struct doubles as its own persistence
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub book_id: u32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: String,
    pub location: String,
    pub description: String,
    pub availability: bool,
}

/// Multi-field book search specification
///
/// `query` selects free-text mode and makes every other field irrelevant;
/// otherwise each supplied field contributes one predicate to a structured
/// AND. A default (all-`None`) query matches nothing.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// Free-text needle matched against title, author, or isbn
    pub query: Option<String>,
    /// Exact book id match
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Restrict to books currently on the shelf
    pub available_only: bool,
}

impl BookQuery {
    /// Free-text query over title, author, and isbn
    pub fn free_text(needle: impl Into<String>) -> Self {
        Self {
            query: Some(needle.into()),
            ..Self::default()
        }
    }
}

impl Book {
    /// Whether this book matches the given search specification
    pub fn matches(&self, q: &BookQuery) -> bool {
        if let Some(ref needle) = q.query {
            // Free-text mode ignores every structured field. Title and
            // author match case-insensitively, the ISBN as a plain
            // substring.
            return contains_ci(&self.title, needle)
                || contains_ci(&self.author, needle)
                || self.isbn.contains(needle.as_str());
        }

        FieldMatcher::new()
            .exact(q.id.as_deref(), &self.book_id.to_string())
            .contains(q.title.as_deref(), &self.title)
            .contains(q.author.as_deref(), &self.author)
            .contains_exact(q.isbn.as_deref(), &self.isbn)
            .contains(q.genre.as_deref(), &self.genre)
            .contains(q.location.as_deref(), &self.location)
            .contains(q.description.as_deref(), &self.description)
            .flag(q.available_only, self.availability)
            .matches()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        Book {
            book_id: 1,
            title: "The Hobbit".to_string(),
            author: "J.R.R. Tolkien".to_string(),
            isbn: "9780261103344".to_string(),
            genre: "Fantasy".to_string(),
            location: "Shelf 3".to_string(),
            description: "There and back again".to_string(),
            availability: true,
        }
    }

    #[test]
    fn test_free_text_matches_title_author_isbn() {
        assert!(book().matches(&BookQuery::free_text("hobbit")));
        assert!(book().matches(&BookQuery::free_text("tolkien")));
        assert!(book().matches(&BookQuery::free_text("9780261")));
        assert!(!book().matches(&BookQuery::free_text("austen")));
    }

    #[test]
    fn test_empty_free_text_matches_everything() {
        assert!(book().matches(&BookQuery::free_text("")));
    }

    #[test]
    fn test_empty_structured_query_matches_nothing() {
        assert!(!book().matches(&BookQuery::default()));
    }

    #[test]
    fn test_structured_and_semantics() {
        let q = BookQuery {
            title: Some("hobbit".to_string()),
            genre: Some("fantasy".to_string()),
            ..BookQuery::default()
        };
        assert!(book().matches(&q));

        let q = BookQuery {
            title: Some("hobbit".to_string()),
            genre: Some("romance".to_string()),
            ..BookQuery::default()
        };
        assert!(!book().matches(&q));
    }

    #[test]
    fn test_id_is_exact_match() {
        let q = BookQuery {
            id: Some("1".to_string()),
            ..BookQuery::default()
        };
        assert!(book().matches(&q));

        let q = BookQuery {
            id: Some("11".to_string()),
            ..BookQuery::default()
        };
        assert!(!book().matches(&q));
    }

    #[test]
    fn test_available_only_excludes_borrowed() {
        let mut b = book();
        b.availability = false;
        let q = BookQuery {
            title: Some("hobbit".to_string()),
            available_only: true,
            ..BookQuery::default()
        };
        assert!(!b.matches(&q));
        b.availability = true;
        assert!(b.matches(&q));
    }

    #[test]
    fn test_free_text_overrides_structured_fields() {
        // A supplied query makes conflicting structured fields irrelevant
        let q = BookQuery {
            query: Some("hobbit".to_string()),
            genre: Some("romance".to_string()),
            ..BookQuery::default()
        };
        assert!(book().matches(&q));
    }
}
