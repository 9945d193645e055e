//! User model: librarians and members

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth;
use crate::search::free_text;

/// Role discriminant shared by both user variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Librarian,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Librarian => "Librarian",
            Role::Member => "Member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "librarian" => Ok(Role::Librarian),
            "member" => Ok(Role::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Variant payload: a librarian carries nothing extra, a member carries
/// its public membership id and the set of book ids currently on loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKind {
    Librarian,
    Member {
        membership_id: String,
        borrowed_books: BTreeSet<u32>,
    },
}

/// A user of the library system
///
/// The password field is an opaque argon2 hash; see [`crate::auth`].
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: u32,
    pub name: String,
    pub email: String,
    pub password: String,
    pub kind: UserKind,
}

impl User {
    pub fn new_librarian(user_id: u32, name: &str, email: &str, password_hash: &str) -> Self {
        Self {
            user_id,
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            kind: UserKind::Librarian,
        }
    }

    pub fn new_member(
        user_id: u32,
        name: &str,
        email: &str,
        password_hash: &str,
        membership_id: &str,
        borrowed_books: BTreeSet<u32>,
    ) -> Self {
        Self {
            user_id,
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            kind: UserKind::Member {
                membership_id: membership_id.to_string(),
                borrowed_books,
            },
        }
    }

    pub fn role(&self) -> Role {
        match self.kind {
            UserKind::Librarian => Role::Librarian,
            UserKind::Member { .. } => Role::Member,
        }
    }

    pub fn is_librarian(&self) -> bool {
        self.role() == Role::Librarian
    }

    /// The member's public identifier, `None` for librarians
    pub fn membership_id(&self) -> Option<&str> {
        match &self.kind {
            UserKind::Member { membership_id, .. } => Some(membership_id),
            UserKind::Librarian => None,
        }
    }

    /// Book ids currently on loan to this member, `None` for librarians
    pub fn borrowed_books(&self) -> Option<&BTreeSet<u32>> {
        match &self.kind {
            UserKind::Member { borrowed_books, .. } => Some(borrowed_books),
            UserKind::Librarian => None,
        }
    }

    /// Record that the member took the book out. No-op for librarians.
    pub fn borrow_book(&mut self, book_id: u32) {
        if let UserKind::Member { borrowed_books, .. } = &mut self.kind {
            borrowed_books.insert(book_id);
        }
    }

    /// Record that the member brought the book back, removing it from the
    /// active-loan set
    pub fn return_book(&mut self, book_id: u32) {
        if let UserKind::Member { borrowed_books, .. } = &mut self.kind {
            borrowed_books.remove(&book_id);
        }
    }

    /// Boolean credential check over email and plaintext secret
    pub fn check_credentials(&self, email: &str, password: &str) -> bool {
        self.email == email && auth::verify_password(&self.password, password)
    }

    /// Free-text match over name, email, user id, and (for members) the
    /// membership id
    pub fn matches_query(&self, query: &str) -> bool {
        let user_id = self.user_id.to_string();
        let mut fields = vec![self.name.as_str(), self.email.as_str(), user_id.as_str()];
        if let Some(membership_id) = self.membership_id() {
            fields.push(membership_id);
        }
        free_text(query, &fields)
    }
}

/// Registration request, also the shape of seed-dataset user entries
///
/// The password is plaintext here and hashed on the way into the
/// registry. `user_id` and `membership_id` are normally left to the
/// registry to assign; bulk loads supply them explicitly.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub user_id: Option<u32>,
    #[serde(default)]
    pub membership_id: Option<String>,
    #[serde(default)]
    pub borrowed_books: Option<Vec<u32>>,
}

/// Update request for an existing user
///
/// `password: None` (or an empty string) leaves the stored credential
/// unchanged; `membership_id` is only meaningful for members.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub membership_id: Option<String>,
}

/// Persistence snapshot of a user; member-only fields are omitted for
/// librarians
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: u32,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Stored argon2 hash, opaque to the snapshot
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrowed_books: Option<Vec<u32>>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        UserRecord {
            user_id: user.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role(),
            password: user.password.clone(),
            membership_id: user.membership_id().map(str::to_string),
            borrowed_books: user
                .borrowed_books()
                .map(|books| books.iter().copied().collect()),
        }
    }
}
