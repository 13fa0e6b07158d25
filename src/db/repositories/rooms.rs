use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::db::{connection::Database, models::Room};

impl Database {
    /// Mirror the configured room list into the `rooms` table. Existing rooms
    /// keep their bookings; names are refreshed.
    pub async fn sync_rooms(&self, rooms: Vec<Room>) -> Result<()> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            for room in &rooms {
                tx.execute(
                    "INSERT INTO rooms (id, name) VALUES (?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET name = excluded.name",
                    params![room.id, room.name],
                )
                .with_context(|| format!("failed to upsert room {}", room.id))?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM rooms ORDER BY id ASC")?;
            let mut rows = stmt.query([])?;
            let mut rooms = Vec::new();
            while let Some(row) = rows.next()? {
                rooms.push(Room {
                    id: row.get("id")?,
                    name: row.get("name")?,
                });
            }
            Ok(rooms)
        })
        .await
    }

    pub async fn get_room(&self, room_id: &str) -> Result<Option<Room>> {
        let room_id = room_id.to_string();
        self.execute(move |conn| {
            let room = conn
                .query_row(
                    "SELECT id, name FROM rooms WHERE id = ?1",
                    params![room_id],
                    |row| {
                        Ok(Room {
                            id: row.get(0)?,
                            name: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(room)
        })
        .await
    }
}
