//! Data access for the availability calendar.
//!
//! The calendar only talks to a [`BookingStore`]; the in-memory store and
//! the SQLite [`Database`](crate::db::Database) both implement it. Either
//! store is the authority on the one-booking-per-room-per-night rule: a
//! `create` that would double-book fails with [`StoreError::Conflict`]
//! regardless of what the caller validated beforehand.

mod memory;
mod sqlite;

use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    calendar::YearMonth,
    db::{models::group_stays, Booking, Reservation, Room, Stay},
};

pub use memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room {room_id} is already booked on {date}")]
    Conflict { room_id: String, date: NaiveDate },
    #[error("unknown room {0}")]
    UnknownRoom(String),
    #[error(transparent)]
    Backend(anyhow::Error),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StoreError>() {
            Ok(store_err) => store_err,
            Err(other) => StoreError::Backend(other),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait BookingStore {
    async fn rooms(&self) -> Result<Vec<Room>, StoreError>;

    /// Bookings of `room_id` in `month`, ordered by date. Unknown rooms and
    /// empty months yield an empty list.
    async fn fetch(&self, room_id: &str, month: YearMonth) -> Result<Vec<Booking>, StoreError>;

    /// Record every night of `reservation`, or none of them.
    async fn create(&self, reservation: Reservation) -> Result<Vec<Booking>, StoreError>;

    async fn stays(&self, room_id: &str, month: YearMonth) -> Result<Vec<Stay>, StoreError> {
        let bookings = self.fetch(room_id, month).await?;
        Ok(group_stays(&bookings))
    }
}
