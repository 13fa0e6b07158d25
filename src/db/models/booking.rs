//! Booking data models.
//!
//! A booking occupies one room for one night. A multi-night selection is
//! stored as one booking per night sharing a `reservation_id`.

use std::{fmt, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::DateRange;

/// Channel a booking came through. `Website` is direct, the rest are OTAs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingSource {
    Website,
    Booking,
    Agoda,
    Airbnb,
}

impl BookingSource {
    pub const ALL: [BookingSource; 4] = [
        BookingSource::Website,
        BookingSource::Booking,
        BookingSource::Agoda,
        BookingSource::Airbnb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingSource::Website => "website",
            BookingSource::Booking => "booking",
            BookingSource::Agoda => "agoda",
            BookingSource::Airbnb => "airbnb",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingSource::Website => "Website",
            BookingSource::Booking => "Booking.com",
            BookingSource::Agoda => "Agoda",
            BookingSource::Airbnb => "Airbnb",
        }
    }

    pub fn is_ota(&self) -> bool {
        !matches!(self, BookingSource::Website)
    }
}

impl Default for BookingSource {
    fn default() -> Self {
        BookingSource::ALL[0]
    }
}

impl fmt::Display for BookingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingSource {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        BookingSource::ALL
            .into_iter()
            .find(|source| source.as_str() == value)
            .ok_or_else(|| anyhow!("unknown booking source '{value}'"))
    }
}

/// One occupied night.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub reservation_id: String,
    pub room_id: String,
    pub date: NaiveDate,
    pub booked_by: String,
    pub source: BookingSource,
    pub created_at: DateTime<Utc>,
}

/// Write request produced by a confirmed range selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub room_id: String,
    pub range: DateRange,
    pub booked_by: String,
    pub source: BookingSource,
}

/// Nights of one reservation folded back into check-in/check-out form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stay {
    pub reservation_id: String,
    pub room_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub booked_by: String,
    pub source: BookingSource,
}

impl Stay {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

/// Fold date-ordered bookings into stays. Nights of one reservation that are
/// not contiguous (e.g. split by a month boundary filter) become separate stays.
pub fn group_stays(bookings: &[Booking]) -> Vec<Stay> {
    let mut stays: Vec<Stay> = Vec::new();
    for booking in bookings {
        if let Some(last) = stays.last_mut() {
            if last.reservation_id == booking.reservation_id && last.check_out == booking.date {
                last.check_out = booking.date + Duration::days(1);
                continue;
            }
        }
        stays.push(Stay {
            reservation_id: booking.reservation_id.clone(),
            room_id: booking.room_id.clone(),
            check_in: booking.date,
            check_out: booking.date + Duration::days(1),
            booked_by: booking.booked_by.clone(),
            source: booking.source,
        });
    }
    stays
}
