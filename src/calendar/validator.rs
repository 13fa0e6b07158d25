use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::DateRange;
use crate::db::Booking;

/// Why a proposed range cannot be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum Rejection {
    #[error("the selection contains no nights")]
    EmptyRange,
    #[error("check-out {end} is before check-in {start}")]
    Inverted { start: NaiveDate, end: NaiveDate },
    #[error("{date} is in the past")]
    Past { date: NaiveDate },
    #[error("{date} is already booked")]
    Booked { date: NaiveDate },
    #[error("{nights} nights exceed the longest allowed stay of {max}")]
    TooLong { nights: usize, max: usize },
}

fn is_booked(date: NaiveDate, bookings: &[Booking]) -> bool {
    bookings.iter().any(|booking| booking.date == date)
}

/// A day can be picked when nobody holds it and it is not before `today`.
pub fn is_day_selectable(date: NaiveDate, bookings: &[Booking], today: NaiveDate) -> bool {
    date >= today && !is_booked(date, bookings)
}

/// Decide whether `range` can be booked given the room's known bookings.
///
/// `bookings` must already be filtered to the room in question. Nights are
/// checked in ascending order and the first offending night is reported.
pub fn validate_range(
    range: &DateRange,
    bookings: &[Booking],
    today: NaiveDate,
) -> Result<(), Rejection> {
    if range.is_empty() {
        return Err(Rejection::EmptyRange);
    }

    for date in range.nights() {
        if date < today {
            return Err(Rejection::Past { date });
        }
        if is_booked(date, bookings) {
            return Err(Rejection::Booked { date });
        }
    }

    Ok(())
}

/// Cap on the number of nights one selection may cover.
pub fn validate_stay_length(range: &DateRange, max_nights: usize) -> Result<(), Rejection> {
    let nights = range.len();
    if nights > max_nights {
        return Err(Rejection::TooLong {
            nights,
            max: max_nights,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::db::BookingSource;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end).unwrap()
    }

    fn booked(date: NaiveDate, guest: &str, source: BookingSource) -> Booking {
        Booking {
            id: date.to_string(),
            reservation_id: date.to_string(),
            room_id: "B516".into(),
            date,
            booked_by: guest.into(),
            source,
            created_at: Utc::now(),
        }
    }

    fn june_bookings() -> Vec<Booking> {
        vec![
            booked(day(2024, 6, 3), "Nguyễn Văn A", BookingSource::Booking),
            booked(day(2024, 6, 5), "Lê Văn B", BookingSource::Website),
        ]
    }

    #[test]
    fn single_free_night_before_a_booking_is_accepted() {
        let bookings = june_bookings();
        let today = day(2024, 6, 1);
        assert_eq!(
            validate_range(&range(day(2024, 6, 2), day(2024, 6, 3)), &bookings, today),
            Ok(())
        );
    }

    #[test]
    fn booked_night_is_rejected() {
        let bookings = june_bookings();
        let today = day(2024, 6, 1);
        assert_eq!(
            validate_range(&range(day(2024, 6, 3), day(2024, 6, 4)), &bookings, today),
            Err(Rejection::Booked { date: day(2024, 6, 3) })
        );
        // Any range spanning a booked night fails too.
        assert_eq!(
            validate_range(&range(day(2024, 6, 1), day(2024, 6, 10)), &bookings, today),
            Err(Rejection::Booked { date: day(2024, 6, 3) })
        );
    }

    #[test]
    fn range_avoiding_bookings_is_accepted() {
        let bookings = june_bookings();
        let today = day(2024, 6, 1);
        assert!(validate_range(&range(day(2024, 6, 6), day(2024, 6, 9)), &bookings, today).is_ok());
        // Checking out on a booked day is fine: the end night is not occupied.
        assert!(validate_range(&range(day(2024, 6, 4), day(2024, 6, 5)), &bookings, today).is_ok());
    }

    #[test]
    fn past_nights_are_rejected_regardless_of_bookings() {
        let today = day(2024, 6, 10);
        assert_eq!(
            validate_range(&range(day(2024, 6, 8), day(2024, 6, 12)), &[], today),
            Err(Rejection::Past { date: day(2024, 6, 8) })
        );
        // Past wins over booked for the same night.
        assert_eq!(
            validate_range(&range(day(2024, 6, 3), day(2024, 6, 4)), &june_bookings(), today),
            Err(Rejection::Past { date: day(2024, 6, 3) })
        );
        // Today itself is bookable.
        assert!(validate_range(&range(today, day(2024, 6, 11)), &[], today).is_ok());
    }

    #[test]
    fn empty_range_is_rejected() {
        let today = day(2024, 6, 1);
        let empty = range(day(2024, 6, 6), day(2024, 6, 6));
        assert_eq!(validate_range(&empty, &[], today), Err(Rejection::EmptyRange));
    }

    #[test]
    fn validation_is_repeatable() {
        let bookings = june_bookings();
        let today = day(2024, 6, 1);
        let candidate = range(day(2024, 6, 4), day(2024, 6, 6));
        let first = validate_range(&candidate, &bookings, today);
        let second = validate_range(&candidate, &bookings, today);
        assert_eq!(first, second);
        assert_eq!(bookings.len(), 2);
    }

    #[test]
    fn day_selectability() {
        let bookings = june_bookings();
        let today = day(2024, 6, 4);
        assert!(!is_day_selectable(day(2024, 6, 3), &bookings, today));
        assert!(is_day_selectable(day(2024, 6, 4), &bookings, today));
        assert!(!is_day_selectable(day(2024, 6, 5), &bookings, today));
        assert!(is_day_selectable(day(2024, 6, 6), &bookings, today));
    }

    #[test]
    fn stays_longer_than_the_cap_are_rejected() {
        let month = range(day(2024, 6, 1), day(2024, 7, 1));
        assert!(validate_stay_length(&month, 30).is_ok());
        assert_eq!(
            validate_stay_length(&month, 14),
            Err(Rejection::TooLong { nights: 30, max: 14 })
        );

        let forever = range(day(2024, 1, 1), day(9999, 12, 31));
        assert!(matches!(
            validate_stay_length(&forever, 90),
            Err(Rejection::TooLong { max: 90, .. })
        ));
    }
}
