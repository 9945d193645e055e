//! Catalogue: the owned, ordered collection of books

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::book::{Book, BookQuery};

/// Fields of a new catalogue entry; the id is assigned by the catalogue
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    pub isbn: String,
    #[serde(default = "default_genre")]
    pub genre: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub description: String,
    // seed datasets call this field "available"
    #[serde(default = "default_availability", alias = "available")]
    pub availability: bool,
}

fn default_genre() -> String {
    "undefined".to_string()
}

fn default_location() -> String {
    "Library".to_string()
}

fn default_availability() -> bool {
    true
}

/// Replacement fields for an existing book; the id cannot change
#[derive(Debug, Clone)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: String,
    pub location: String,
    pub description: String,
    pub availability: bool,
}

/// The catalogue owns its books and the book-id counter. Ids increase
/// monotonically per catalogue instance and restart at zero when the
/// catalogue is cleared (a new instance replaces the old one).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Catalogue {
    books: Vec<Book>,
    next_book_id: u32,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a book, allocating the next id
    pub fn add(&mut self, new: NewBook) -> &Book {
        let book = Book {
            book_id: self.next_book_id,
            title: new.title,
            author: new.author,
            isbn: new.isbn,
            genre: new.genre,
            location: new.location,
            description: new.description,
            availability: new.availability,
        };
        self.next_book_id += 1;
        self.books.push(book);
        self.books.last().expect("book was just pushed")
    }

    /// Re-insert a persisted book keeping its stored id, bumping the
    /// counter past it so a reload never reuses an id
    pub fn restore(&mut self, book: Book) {
        self.next_book_id = self.next_book_id.max(book.book_id + 1);
        self.books.push(book);
    }

    /// Replace the mutable fields of the book with the given id
    pub fn update(&mut self, book_id: u32, fields: BookUpdate) -> bool {
        match self.get_mut(book_id) {
            Some(book) => {
                book.title = fields.title;
                book.author = fields.author;
                book.isbn = fields.isbn;
                book.genre = fields.genre;
                book.location = fields.location;
                book.description = fields.description;
                book.availability = fields.availability;
                true
            }
            None => false,
        }
    }

    /// Delete the book with the given id; a no-op when absent
    pub fn delete(&mut self, book_id: u32) {
        self.books.retain(|book| book.book_id != book_id);
    }

    pub fn get(&self, book_id: u32) -> Option<&Book> {
        self.books.iter().find(|book| book.book_id == book_id)
    }

    pub fn get_mut(&mut self, book_id: u32) -> Option<&mut Book> {
        self.books.iter_mut().find(|book| book.book_id == book_id)
    }

    /// All books matching the specification, in insertion order
    pub fn search(&self, query: &BookQuery) -> Vec<Book> {
        self.books
            .iter()
            .filter(|book| book.matches(query))
            .cloned()
            .collect()
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
