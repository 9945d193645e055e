//! Domain entities for the Libris core

pub mod book;
pub mod catalogue;
pub mod notification;
pub mod record;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookQuery};
pub use catalogue::{BookUpdate, Catalogue, NewBook};
pub use notification::{Notification, NotificationStatus};
pub use record::{BorrowingRecord, LoanStatus};
pub use user::{NewUser, Role, User, UserKind, UserRecord, UserUpdate};
