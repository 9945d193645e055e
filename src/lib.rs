//! Libris: a library-management domain core
//!
//! The crate models a lending library: a catalogue of books, a registry
//! of librarians and members, the borrowing lifecycle with overdue
//! detection and notifications, and a predicate-based search engine.
//! State lives in a single [`Session`] aggregate that services mutate
//! through `&mut`; persistence and notification delivery go through the
//! collaborator traits in [`storage`].

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod services;
pub mod session;
pub mod storage;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use session::Session;
