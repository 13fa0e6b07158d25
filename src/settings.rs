use std::{
    collections::HashSet,
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::db::models::{default_rooms, Room};

const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_STAY_NIGHTS: usize = 90;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalendarSettings {
    pub rooms: Vec<Room>,
    /// SQLite file; `None` keeps bookings in memory for the session.
    pub database_path: Option<PathBuf>,
    pub fetch_timeout_ms: u64,
    /// Longest selection, in nights, that can be booked at once.
    pub max_stay_nights: usize,
    /// Load the demo bookings into an in-memory store.
    pub seed_sample: bool,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            rooms: default_rooms(),
            database_path: None,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            max_stay_nights: DEFAULT_MAX_STAY_NIGHTS,
            seed_sample: true,
        }
    }
}

impl CalendarSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == room_id)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rooms.is_empty() {
            bail!("at least one room must be configured");
        }
        let mut seen = HashSet::new();
        for room in &self.rooms {
            if room.id.trim().is_empty() {
                bail!("room ids must not be blank");
            }
            if !seen.insert(room.id.as_str()) {
                bail!("room {} is configured twice", room.id);
            }
        }
        if self.fetch_timeout_ms == 0 {
            bail!("fetch_timeout_ms must be greater than zero");
        }
        if self.max_stay_nights == 0 {
            bail!("max_stay_nights must be greater than zero");
        }
        Ok(())
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CalendarSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<CalendarSettings>(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!(
                        "Ignoring unreadable settings file {}: {err}",
                        path.display()
                    );
                    CalendarSettings::default()
                }
            }
        } else {
            CalendarSettings::default()
        };

        data.validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn calendar(&self) -> CalendarSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_calendar(&self, settings: CalendarSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: CalendarSettings = serde_json::from_str(&contents)?;
        data.validate()?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &CalendarSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.calendar();
        assert_eq!(settings.rooms.len(), 3);
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(5));
        assert!(settings.room("B517").is_some());
        assert_eq!(settings.max_stay_nights, 90);
    }

    #[test]
    fn partial_file_is_filled_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"fetch_timeout_ms": 250}"#).unwrap();
        let settings = SettingsStore::new(path).unwrap().calendar();
        assert_eq!(settings.fetch_timeout_ms, 250);
        assert_eq!(settings.rooms, default_rooms());
    }

    #[test]
    fn empty_room_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"rooms": []}"#).unwrap();
        assert!(SettingsStore::new(path).is_err());
    }

    #[test]
    fn duplicate_rooms_are_rejected() {
        let settings = CalendarSettings {
            rooms: vec![Room::new("A1", "One"), Room::new("A1", "Again")],
            ..CalendarSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_length_stay_cap_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"max_stay_nights": 0}"#).unwrap();
        assert!(SettingsStore::new(path).is_err());
    }

    #[test]
    fn updates_are_persisted_and_reloadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.calendar();
        settings.rooms.push(Room::new("C101", "Phòng C101"));
        settings.seed_sample = false;
        store.update_calendar(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.calendar(), settings);
        reopened.reload().unwrap();
        assert_eq!(reopened.calendar().rooms.len(), 4);
    }
}
