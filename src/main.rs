//! Libris - Library Management Core
//!
//! Rehydrates the session from the JSON snapshot store, reports the
//! loaded state, and runs an overdue sweep across the open loan records.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libris::{
    config::AppConfig,
    services::Services,
    storage::{JsonDatasetSource, JsonFileStorage, LogNotificationSender, Storage},
    Session,
};

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("libris={}", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Libris v{}", env!("CARGO_PKG_VERSION"));

    // Wire the collaborators and rehydrate the session
    let storage = Storage::new(Arc::new(JsonFileStorage::new(&config.storage.data_dir)));
    let dataset = Arc::new(JsonDatasetSource::new(&config.storage.dataset_dir));
    let notifier = Arc::new(LogNotificationSender);
    let services = Services::new(storage, dataset, notifier, &config.loans);

    let mut session = Session::new();
    services.rehydrate(&mut session)?;

    // First run: nothing persisted yet, fall back to the seed datasets
    if session.catalogue.is_empty() {
        let imported = services.catalogue.reset_from_dataset(&mut session);
        tracing::info!(imported, "Catalogue seeded from dataset");
    }
    if session.users.len() <= 1 {
        let imported = services.users.reset_from_dataset(&mut session);
        tracing::info!(imported, "User registry seeded from dataset");
    }

    tracing::info!(
        books = session.catalogue.len(),
        users = session.users.len(),
        records = session.records.len(),
        "Session rehydrated"
    );

    // Sweep every open record for overdue state
    let record_ids: Vec<u32> = session
        .records
        .iter()
        .filter(|r| r.is_active())
        .map(|r| r.record_id)
        .collect();
    let mut overdue = 0;
    for record_id in record_ids {
        if services.loans.check_overdue(&mut session, record_id)? {
            overdue += 1;
        }
    }
    tracing::info!(overdue, "Overdue sweep completed");

    Ok(())
}
