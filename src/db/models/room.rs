use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub name: String,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Rooms shown by the calendar page when no settings file overrides them.
pub fn default_rooms() -> Vec<Room> {
    vec![
        Room::new("B516", "Phòng B516"),
        Room::new("B517", "Phòng B517"),
        Room::new("B518", "Phòng B518"),
    ]
}
