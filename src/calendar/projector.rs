use chrono::NaiveDate;
use serde::Serialize;

use super::YearMonth;
use crate::db::{Booking, BookingSource};

pub const BOOKED_LABEL: &str = "Booked";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum DayState {
    Available,
    Booked { booking: Booking },
    /// Before today. A past booking is kept so it can still be inspected.
    Past { booking: Option<Booking> },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub state: DayState,
}

impl DayCell {
    pub fn selectable(&self) -> bool {
        matches!(self.state, DayState::Available)
    }

    pub fn booking(&self) -> Option<&Booking> {
        match &self.state {
            DayState::Booked { booking } => Some(booking),
            DayState::Past { booking } => booking.as_ref(),
            DayState::Available => None,
        }
    }

    /// Tooltip text for an occupied cell.
    pub fn tooltip(&self) -> Option<String> {
        self.booking()
            .map(|booking| format!("{BOOKED_LABEL} by: {}", booking.booked_by))
    }
}

/// Whether the bookings behind a view could actually be loaded.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum Availability {
    Verified,
    Unverified { reason: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthView {
    pub room_id: String,
    pub month: YearMonth,
    pub availability: Availability,
    pub days: Vec<DayCell>,
}

impl MonthView {
    pub fn is_verified(&self) -> bool {
        self.availability == Availability::Verified
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayCell> {
        self.days.iter().find(|cell| cell.date == date)
    }

    pub fn booked_days(&self) -> impl Iterator<Item = &DayCell> {
        self.days
            .iter()
            .filter(|cell| matches!(cell.state, DayState::Booked { .. }))
    }

    pub fn selectable_days(&self) -> impl Iterator<Item = &DayCell> {
        self.days.iter().filter(|cell| cell.selectable())
    }
}

/// What the info panel shows for a clicked booking.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingInfo {
    pub room_id: String,
    pub date: NaiveDate,
    pub booked_by: String,
    pub source: BookingSource,
    pub source_label: &'static str,
}

impl From<&Booking> for BookingInfo {
    fn from(booking: &Booking) -> Self {
        Self {
            room_id: booking.room_id.clone(),
            date: booking.date,
            booked_by: booking.booked_by.clone(),
            source: booking.source,
            source_label: booking.source.label(),
        }
    }
}

pub fn project_month(
    room_id: &str,
    month: YearMonth,
    bookings: &[Booking],
    today: NaiveDate,
    availability: Availability,
) -> MonthView {
    let days = month
        .days()
        .map(|date| {
            let booking = bookings
                .iter()
                .find(|booking| booking.room_id == room_id && booking.date == date)
                .cloned();
            let state = if date < today {
                DayState::Past { booking }
            } else {
                match booking {
                    Some(booking) => DayState::Booked { booking },
                    None => DayState::Available,
                }
            };
            DayCell { date, state }
        })
        .collect();

    MonthView {
        room_id: room_id.to_string(),
        month,
        availability,
        days,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn booking(room: &str, d: u32, guest: &str) -> Booking {
        Booking {
            id: format!("{room}-{d}"),
            reservation_id: format!("{room}-{d}"),
            room_id: room.into(),
            date: day(d),
            booked_by: guest.into(),
            source: BookingSource::Booking,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn projects_booked_past_and_available_days() {
        let june: YearMonth = "2024-06".parse().unwrap();
        let bookings = vec![
            booking("B516", 3, "Nguyễn Văn A"),
            booking("B516", 10, "Lê Văn B"),
            booking("B517", 12, "Other room"),
        ];
        let view = project_month("B516", june, &bookings, day(5), Availability::Verified);

        assert_eq!(view.days.len(), 30);
        assert!(view.is_verified());

        let third = view.day(day(3)).unwrap();
        assert!(matches!(third.state, DayState::Past { booking: Some(_) }));
        assert!(!third.selectable());
        assert_eq!(third.tooltip().as_deref(), Some("Booked by: Nguyễn Văn A"));

        assert!(matches!(view.day(day(4)).unwrap().state, DayState::Past { booking: None }));
        assert!(view.day(day(5)).unwrap().selectable());
        assert!(!view.day(day(10)).unwrap().selectable());
        // Bookings of other rooms are ignored.
        assert!(view.day(day(12)).unwrap().selectable());

        assert_eq!(view.booked_days().count(), 1);
        assert_eq!(view.selectable_days().count(), 25);
    }

    #[test]
    fn booking_info_carries_channel_label() {
        let info = BookingInfo::from(&booking("B516", 3, "Nguyễn Văn A"));
        assert_eq!(info.room_id, "B516");
        assert_eq!(info.date, day(3));
        assert_eq!(info.source_label, "Booking.com");
    }

    #[test]
    fn unverified_views_are_flagged() {
        let june: YearMonth = "2024-06".parse().unwrap();
        let view = project_month(
            "B516",
            june,
            &[],
            day(1),
            Availability::Unverified {
                reason: "timed out".into(),
            },
        );
        assert!(!view.is_verified());
        assert_eq!(view.selectable_days().count(), 30);
    }
}
