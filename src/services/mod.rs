//! Business logic services
//!
//! Services carry the persistence and delivery collaborators; the
//! [`Session`] they operate on is passed in explicitly by the caller.

pub mod catalogue;
pub mod loans;
pub mod users;

use std::sync::Arc;

use crate::{
    config::LoansConfig,
    error::AppResult,
    session::Session,
    storage::{DatasetSource, NotificationSender, Storage},
};

/// Container for all services
pub struct Services {
    pub catalogue: catalogue::CatalogueService,
    pub users: users::UsersService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services with the given collaborators
    pub fn new(
        storage: Storage,
        dataset: Arc<dyn DatasetSource>,
        notifier: Arc<dyn NotificationSender>,
        loans_config: &LoansConfig,
    ) -> Self {
        Self {
            catalogue: catalogue::CatalogueService::new(storage.clone(), dataset.clone()),
            users: users::UsersService::new(storage.clone(), dataset),
            loans: loans::LoansService::new(storage, notifier, loans_config.loan_days),
        }
    }

    /// Rehydrate a fresh session from persisted snapshots
    ///
    /// Users come first (loan records resolve their borrower against
    /// them), then the catalogue, then the loan records.
    pub fn rehydrate(&self, session: &mut Session) -> AppResult<()> {
        self.users.ensure_seed_user(session)?;
        self.users.load_from_storage(session)?;
        self.catalogue.load_from_storage(session)?;
        self.loans.load_from_storage(session)?;
        Ok(())
    }
}
