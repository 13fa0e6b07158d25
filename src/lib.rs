pub mod calendar;
pub mod commands;
pub mod db;
pub mod error;
pub mod settings;
pub mod store;

use anyhow::{Context, Result};
use env_logger::Env;
use log::info;

pub use calendar::{CalendarController, DateRange, Interaction, MonthView, YearMonth};
pub use db::{Booking, BookingSource, Database, Reservation, Room, Stay};
pub use error::CalendarError;
pub use settings::{CalendarSettings, SettingsStore};
pub use store::{BookingStore, InMemoryStore, StoreError};

/// Initialize logging (reads RUST_LOG, defaults to info).
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
}

/// Open the SQLite store described by `settings` and register its rooms.
pub async fn open_database(settings: &CalendarSettings) -> Result<Option<Database>> {
    let Some(path) = settings.database_path.clone() else {
        return Ok(None);
    };

    let database = Database::new(path)?;
    database
        .sync_rooms(settings.rooms.clone())
        .await
        .context("failed to register configured rooms")?;
    info!("Registered {} room(s)", settings.rooms.len());
    Ok(Some(database))
}

/// The session store used when no database is configured.
pub fn memory_store(settings: &CalendarSettings) -> InMemoryStore {
    if settings.seed_sample {
        InMemoryStore::new_with_sample()
    } else {
        InMemoryStore::new(settings.rooms.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_database_path_means_no_database() {
        let settings = CalendarSettings::default();
        assert!(open_database(&settings).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn configured_database_knows_the_rooms() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CalendarSettings {
            database_path: Some(dir.path().join("calendar.sqlite3")),
            ..CalendarSettings::default()
        };
        let db = open_database(&settings).await.unwrap().unwrap();
        assert_eq!(db.rooms().await.unwrap(), settings.rooms);
    }

    #[tokio::test]
    async fn memory_store_seeding_follows_settings() {
        let june: YearMonth = "2024-06".parse().unwrap();
        let seeded = memory_store(&CalendarSettings::default());
        assert_eq!(seeded.fetch("B516", june).await.unwrap().len(), 4);

        let empty = memory_store(&CalendarSettings {
            seed_sample: false,
            ..CalendarSettings::default()
        });
        assert!(empty.fetch("B516", june).await.unwrap().is_empty());
    }
}
