//! Identity and membership service
//!
//! Owns the user collection: registration with email uniqueness, updates
//! with conflict checks, the self-deletion guard, librarian login, and the
//! bulk-load paths that reconcile the privileged seed identity.

use std::collections::BTreeSet;
use std::sync::Arc;

use validator::Validate;

use crate::{
    auth,
    error::{AppError, AppResult},
    models::{NewUser, Role, User, UserKind, UserRecord, UserUpdate},
    session::{Session, SEED_USER_ID},
    storage::{DatasetSource, RecordKind, Storage},
};

#[derive(Clone)]
pub struct UsersService {
    storage: Storage,
    dataset: Arc<dyn DatasetSource>,
}

impl UsersService {
    pub fn new(storage: Storage, dataset: Arc<dyn DatasetSource>) -> Self {
        Self { storage, dataset }
    }

    /// Register a user
    ///
    /// Fails with `Conflict` and no mutation when the email is taken. An
    /// omitted user id is allocated from the counter; an explicit id that
    /// is already in use is replaced by a fresh one, which is what lets
    /// bulk loads supply seeded ids without colliding. A member without a
    /// membership id gets the user id as its public identifier.
    pub fn add_user(&self, session: &mut Session, new: NewUser) -> AppResult<u32> {
        new.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if session.users.iter().any(|user| user.email == new.email) {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                new.email
            )));
        }
        let password_hash = auth::hash_password(&new.password)?;
        let user_id = self.insert(session, &new, &password_hash);
        tracing::debug!(user_id, role = %new.role, "User registered");
        self.persist(session);
        Ok(user_id)
    }

    fn insert(&self, session: &mut Session, new: &NewUser, password_hash: &str) -> u32 {
        let user_id = match new.user_id {
            Some(id) if session.user_by_id(id).is_none() => id,
            _ => session.allocate_user_id(),
        };
        let user = match new.role {
            Role::Librarian => User::new_librarian(user_id, &new.name, &new.email, password_hash),
            Role::Member => {
                let membership_id = new
                    .membership_id
                    .clone()
                    .unwrap_or_else(|| user_id.to_string());
                let borrowed: BTreeSet<u32> = new
                    .borrowed_books
                    .clone()
                    .unwrap_or_default()
                    .into_iter()
                    .collect();
                User::new_member(
                    user_id,
                    &new.name,
                    &new.email,
                    password_hash,
                    &membership_id,
                    borrowed,
                )
            }
        };
        session.users.push(user);
        user_id
    }

    /// Update name, email, credential, and (for members) membership id
    ///
    /// The email may only move to an address no *other* user holds, and a
    /// membership id to one no *other* member holds. The authenticated
    /// user stays consistent across its own update because the session
    /// tracks users by id.
    pub fn update_user(
        &self,
        session: &mut Session,
        user_id: u32,
        update: UserUpdate,
    ) -> AppResult<User> {
        update
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let current_email = session
            .user_by_id(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?
            .email
            .clone();

        if update.email != current_email
            && session
                .users
                .iter()
                .any(|user| user.user_id != user_id && user.email == update.email)
        {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                update.email
            )));
        }
        if let Some(ref new_membership) = update.membership_id {
            let taken = session.users.iter().any(|user| {
                user.user_id != user_id
                    && matches!(&user.kind, UserKind::Member { membership_id, .. }
                        if membership_id == new_membership)
            });
            if taken {
                return Err(AppError::Conflict(format!(
                    "Membership id {} is already in use",
                    new_membership
                )));
            }
        }

        let password_hash = match update.password.as_deref() {
            Some(password) if !password.is_empty() => Some(auth::hash_password(password)?),
            _ => None,
        };

        let user = session
            .user_by_id_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;
        user.name = update.name;
        user.email = update.email;
        if let Some(hash) = password_hash {
            user.password = hash;
        }
        if let (Some(new_membership), UserKind::Member { membership_id, .. }) =
            (update.membership_id, &mut user.kind)
        {
            *membership_id = new_membership;
        }
        let updated = user.clone();
        self.persist(session);
        Ok(updated)
    }

    /// Remove a user. The currently authenticated user cannot remove
    /// itself.
    pub fn remove_user(&self, session: &mut Session, user_id: u32) -> AppResult<()> {
        if session.user_by_id(user_id).is_none() {
            return Err(AppError::NotFound(format!(
                "User with id {} not found",
                user_id
            )));
        }
        if session.logged_in_user == Some(user_id) {
            return Err(AppError::Conflict(
                "The authenticated user cannot remove itself".to_string(),
            ));
        }
        session.users.retain(|user| user.user_id != user_id);
        self.persist(session);
        Ok(())
    }

    /// Free-text search over name, email, user id, and membership id
    pub fn search_users(&self, session: &Session, query: &str) -> Vec<User> {
        session
            .users
            .iter()
            .filter(|user| user.matches_query(query))
            .cloned()
            .collect()
    }

    /// Authenticate a librarian by email and plaintext secret
    ///
    /// Members cannot open a session; the credential check is the argon2
    /// verification behind [`User::check_credentials`].
    pub fn login(&self, session: &mut Session, email: &str, password: &str) -> AppResult<()> {
        let user = session
            .user_by_email(email)
            .filter(|user| user.is_librarian())
            .filter(|user| user.check_credentials(email, password))
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;
        let user_id = user.user_id;
        session.logged_in_user = Some(user_id);
        tracing::info!(user_id, "Librarian logged in");
        Ok(())
    }

    pub fn logout(&self, session: &mut Session) {
        if let Some(user_id) = session.logged_in_user.take() {
            tracing::info!(user_id, "User logged out");
        }
    }

    /// Insert the privileged seed librarian into an empty registry
    ///
    /// In memory only: persisting here would clobber a stored registry
    /// that has not been reloaded yet. The seed reaches storage with the
    /// first persisted mutation.
    pub fn ensure_seed_user(&self, session: &mut Session) -> AppResult<()> {
        if !session.users.is_empty() {
            return Ok(());
        }
        let password_hash = auth::hash_password("admin")?;
        session.users.push(User::new_librarian(
            SEED_USER_ID,
            "admin",
            "admin@admin",
            &password_hash,
        ));
        Ok(())
    }

    /// Rehydrate users from persisted snapshots
    ///
    /// Stored passwords are already hashes and are taken as-is. The seed
    /// identity (id 1) is updated in place rather than re-inserted so
    /// repeated imports never produce a second privileged account; other
    /// snapshots whose email is already present are skipped.
    pub fn load_from_storage(&self, session: &mut Session) -> AppResult<usize> {
        let records: Vec<UserRecord> = self.storage.load(RecordKind::Users)?;
        let mut loaded = 0;
        for record in records {
            session.note_user_id(record.user_id);
            if self.admit(session, record) {
                loaded += 1;
            }
        }
        tracing::info!(loaded, "User registry rehydrated");
        Ok(loaded)
    }

    /// Admit one snapshot into the registry, reconciling the seed
    /// identity; returns whether the registry changed
    fn admit(&self, session: &mut Session, record: UserRecord) -> bool {
        if record.user_id == SEED_USER_ID {
            if let Some(seed) = session.user_by_id_mut(SEED_USER_ID) {
                seed.name = record.name;
                seed.email = record.email;
                seed.password = record.password;
                return true;
            }
        }
        if session.users.iter().any(|user| user.email == record.email) {
            return false;
        }
        let new = NewUser {
            name: record.name,
            email: record.email,
            password: String::new(), // hash passed through below
            role: record.role,
            user_id: Some(record.user_id),
            membership_id: record.membership_id,
            borrowed_books: record.borrowed_books,
        };
        self.insert(session, &new, &record.password);
        true
    }

    /// Drop every user except the authenticated one and reset the
    /// counter. Irreversible.
    pub fn clear_all_users(&self, session: &mut Session) {
        let keep = session.logged_in_user;
        session.users.retain(|user| Some(user.user_id) == keep);
        session.reset_user_counter();
    }

    /// Replace the registry with the seed dataset
    ///
    /// Dataset entries carry plaintext passwords and go through the
    /// normal registration path; a missing dataset imports zero users
    /// and leaves the registry untouched.
    pub fn reset_from_dataset(&self, session: &mut Session) -> usize {
        let values = self.dataset.fetch("users");
        if values.is_empty() {
            return 0;
        }
        self.clear_all_users(session);
        let mut imported = 0;
        for value in values {
            let new = match serde_json::from_value::<NewUser>(value) {
                Ok(new) => new,
                Err(e) => {
                    tracing::warn!("Skipping undecodable dataset user: {}", e);
                    continue;
                }
            };
            // the seed identity is refreshed in place, never duplicated
            if new.user_id == Some(SEED_USER_ID) && session.user_by_id(SEED_USER_ID).is_some() {
                let update = UserUpdate {
                    name: new.name.clone(),
                    email: new.email.clone(),
                    password: Some(new.password.clone()),
                    membership_id: None,
                };
                if self.update_user(session, SEED_USER_ID, update).is_ok() {
                    imported += 1;
                }
                continue;
            }
            if self.add_user(session, new).is_ok() {
                imported += 1;
            }
        }
        tracing::info!(imported, "User registry reset from dataset");
        imported
    }

    fn persist(&self, session: &Session) {
        let records: Vec<UserRecord> = session.users.iter().map(UserRecord::from).collect();
        self.storage.save(RecordKind::Users, &records);
    }
}
