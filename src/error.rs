use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    calendar::{Rejection, YearMonth},
    store::StoreError,
};

#[derive(Debug, Error)]
pub enum CalendarError {
    /// The selection itself is not bookable; nothing was written.
    #[error("selection rejected: {0}")]
    Rejected(#[from] Rejection),
    /// Someone else took the night between the check and the write.
    #[error("room {room_id} was booked on {date} in the meantime, re-check availability")]
    Conflict { room_id: String, date: NaiveDate },
    #[error("unknown room {0}")]
    UnknownRoom(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidState(&'static str),
    #[error("booking store did not answer within {0:?}")]
    Timeout(Duration),
    /// The loaded month could not be read, so free days are not known.
    #[error("could not verify availability of room {room_id} in {month}: {reason}")]
    Unverified {
        room_id: String,
        month: YearMonth,
        reason: String,
    },
    /// The write was sent but its outcome never came back. It may still have
    /// been committed.
    #[error("booking of room {room_id} for {range} was not confirmed in time, re-check availability before booking again")]
    WriteUnconfirmed { room_id: String, range: String },
    #[error(transparent)]
    Store(anyhow::Error),
}

impl CalendarError {
    /// Whether repeating the same action may succeed without the user
    /// changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CalendarError::Timeout(_) | CalendarError::Store(_) | CalendarError::Unverified { .. }
        )
    }
}

impl From<StoreError> for CalendarError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { room_id, date } => CalendarError::Conflict { room_id, date },
            StoreError::UnknownRoom(room_id) => CalendarError::UnknownRoom(room_id),
            StoreError::Backend(inner) => CalendarError::Store(inner),
        }
    }
}
