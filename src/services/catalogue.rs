//! Catalogue management service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookQuery, BookUpdate, Catalogue, NewBook},
    session::Session,
    storage::{DatasetSource, RecordKind, Storage},
};

/// Owns catalogue mutation: id assignment, CRUD, search, seed imports.
/// Every mutation persists the book collection as a side effect.
#[derive(Clone)]
pub struct CatalogueService {
    storage: Storage,
    dataset: Arc<dyn DatasetSource>,
}

impl CatalogueService {
    pub fn new(storage: Storage, dataset: Arc<dyn DatasetSource>) -> Self {
        Self { storage, dataset }
    }

    /// Add a book to the catalogue
    pub fn add_book(&self, session: &mut Session, new: NewBook) -> AppResult<Book> {
        new.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let book = session.catalogue.add(new).clone();
        tracing::debug!(book_id = book.book_id, title = %book.title, "Book added");
        self.persist(session);
        Ok(book)
    }

    /// Replace the mutable fields of an existing book
    pub fn update_book(
        &self,
        session: &mut Session,
        book_id: u32,
        fields: BookUpdate,
    ) -> AppResult<()> {
        if !session.catalogue.update(book_id, fields) {
            return Err(AppError::NotFound(format!(
                "Book with id {} not found",
                book_id
            )));
        }
        self.persist(session);
        Ok(())
    }

    /// Remove a book; removing an absent id is a no-op, matching the
    /// probe-then-delete habits of calling code
    pub fn remove_book(&self, session: &mut Session, book_id: u32) {
        session.catalogue.delete(book_id);
        self.persist(session);
    }

    /// Books matching the specification, in catalogue insertion order
    pub fn search_books(&self, session: &Session, query: &BookQuery) -> Vec<Book> {
        session.catalogue.search(query)
    }

    /// All books in insertion order
    pub fn list_books<'a>(&self, session: &'a Session) -> &'a [Book] {
        session.catalogue.books()
    }

    /// Replace the catalogue with an empty one. Irreversible; the book-id
    /// counter starts over from zero.
    pub fn clear_all(&self, session: &mut Session) {
        session.catalogue = Catalogue::new();
        self.persist(session);
    }

    /// Rehydrate the catalogue from persisted snapshots, keeping stored
    /// ids and re-deriving the counter
    pub fn load_from_storage(&self, session: &mut Session) -> AppResult<usize> {
        let books: Vec<Book> = self.storage.load(RecordKind::Books)?;
        let count = books.len();
        for book in books {
            session.catalogue.restore(book);
        }
        tracing::info!(count, "Catalogue rehydrated");
        Ok(count)
    }

    /// Replace the catalogue with the seed dataset, assigning fresh ids.
    /// A missing dataset imports zero books and leaves the existing
    /// catalogue untouched.
    pub fn reset_from_dataset(&self, session: &mut Session) -> usize {
        let values = self.dataset.fetch("books");
        if values.is_empty() {
            return 0;
        }
        session.catalogue = Catalogue::new();
        let mut imported = 0;
        for value in values {
            match serde_json::from_value::<NewBook>(value) {
                Ok(new) => {
                    session.catalogue.add(new);
                    imported += 1;
                }
                Err(e) => tracing::warn!("Skipping undecodable dataset book: {}", e),
            }
        }
        tracing::info!(imported, "Catalogue reset from dataset");
        self.persist(session);
        imported
    }

    fn persist(&self, session: &Session) {
        self.storage
            .save(RecordKind::Books, session.catalogue.books());
    }
}
