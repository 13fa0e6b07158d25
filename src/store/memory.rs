use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use log::info;
use uuid::Uuid;

use super::{BookingStore, StoreError};
use crate::{
    calendar::YearMonth,
    db::{models::default_rooms, Booking, BookingSource, Reservation, Room},
};

#[derive(Default)]
struct InMemoryState {
    rooms: Vec<Room>,
    /// Keyed by `(room_id, night)`, which is what makes double-booking
    /// impossible here.
    bookings: BTreeMap<(String, NaiveDate), Booking>,
}

/// Session-local booking store. Clones share the same bookings.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryStore {
    pub fn new(rooms: Vec<Room>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState {
                rooms,
                bookings: BTreeMap::new(),
            })),
        }
    }

    /// The default rooms with the June 2024 bookings the calendar page was
    /// demonstrated with.
    pub fn new_with_sample() -> Self {
        let store = Self::new(default_rooms());
        let sample = [
            ("1", "2024-06-03", "B516", "Nguyễn Văn A", BookingSource::Booking),
            ("2", "2024-06-05", "B516", "Lê Văn B", BookingSource::Website),
            ("3", "2024-06-07", "B516", "Trần Thị C", BookingSource::Agoda),
            ("4", "2024-06-10", "B517", "Phạm Văn D", BookingSource::Booking),
            ("5", "2024-06-15", "B518", "Hoàng Thị E", BookingSource::Airbnb),
            ("6", "2024-06-18", "B517", "Lương Văn F", BookingSource::Agoda),
            ("7", "2024-06-22", "B518", "Vũ Minh G", BookingSource::Website),
            ("8", "2024-06-25", "B516", "Phan Thị H", BookingSource::Airbnb),
        ];

        if let Ok(mut state) = store.state.lock() {
            let created_at = Utc::now();
            for (id, night, room_id, guest, source) in sample {
                let Ok(date) = NaiveDate::parse_from_str(night, "%Y-%m-%d") else {
                    continue;
                };
                state.bookings.insert(
                    (room_id.to_string(), date),
                    Booking {
                        id: id.to_string(),
                        reservation_id: id.to_string(),
                        room_id: room_id.to_string(),
                        date,
                        booked_by: guest.to_string(),
                        source,
                        created_at,
                    },
                );
            }
        }

        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend(anyhow!("in-memory store lock poisoned")))
    }
}

impl BookingStore for InMemoryStore {
    async fn rooms(&self) -> Result<Vec<Room>, StoreError> {
        Ok(self.lock()?.rooms.clone())
    }

    async fn fetch(&self, room_id: &str, month: YearMonth) -> Result<Vec<Booking>, StoreError> {
        let state = self.lock()?;
        let from = (room_id.to_string(), month.first_day());
        let to = (room_id.to_string(), month.end());
        Ok(state
            .bookings
            .range(from..to)
            .map(|(_, booking)| booking.clone())
            .collect())
    }

    async fn create(&self, reservation: Reservation) -> Result<Vec<Booking>, StoreError> {
        let mut state = self.lock()?;

        if !state.rooms.iter().any(|room| room.id == reservation.room_id) {
            return Err(StoreError::UnknownRoom(reservation.room_id));
        }

        // Check every night before touching the map so a conflict writes nothing.
        let conflict = reservation
            .range
            .nights()
            .find(|night| state.bookings.contains_key(&(reservation.room_id.clone(), *night)));
        if let Some(date) = conflict {
            return Err(StoreError::Conflict {
                room_id: reservation.room_id,
                date,
            });
        }

        let reservation_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let bookings: Vec<Booking> = reservation
            .range
            .nights()
            .map(|date| Booking {
                id: Uuid::new_v4().to_string(),
                reservation_id: reservation_id.clone(),
                room_id: reservation.room_id.clone(),
                date,
                booked_by: reservation.booked_by.clone(),
                source: reservation.source,
                created_at,
            })
            .collect();

        for booking in &bookings {
            state
                .bookings
                .insert((booking.room_id.clone(), booking.date), booking.clone());
        }

        info!(
            "Reserved room {} for {} ({} night(s))",
            reservation.room_id,
            reservation.range.describe(),
            bookings.len()
        );

        Ok(bookings)
    }
}
