use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::{
    calendar::YearMonth,
    db::{
        connection::Database,
        helpers::{format_date, is_constraint_violation, parse_date, parse_datetime, parse_source},
        models::{Booking, Reservation},
    },
    store::StoreError,
};

const BOOKING_COLUMNS: &str =
    "id, reservation_id, room_id, night, booked_by, source, created_at";

fn row_to_booking(row: &Row) -> Result<Booking> {
    let night: String = row.get("night")?;
    let source: String = row.get("source")?;
    let created_at: String = row.get("created_at")?;

    Ok(Booking {
        id: row.get("id")?,
        reservation_id: row.get("reservation_id")?,
        room_id: row.get("room_id")?,
        date: parse_date(&night, "night")?,
        booked_by: row.get("booked_by")?,
        source: parse_source(&source)?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Bookings of `room_id` whose night falls in `month`, oldest first.
    pub async fn bookings_for_month(&self, room_id: &str, month: YearMonth) -> Result<Vec<Booking>> {
        let room_id = room_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLUMNS}
                 FROM bookings
                 WHERE room_id = ?1 AND night >= ?2 AND night < ?3
                 ORDER BY night ASC"
            ))?;

            let mut rows = stmt.query(params![
                room_id,
                format_date(month.first_day()),
                format_date(month.end()),
            ])?;
            let mut bookings = Vec::new();
            while let Some(row) = rows.next()? {
                bookings.push(row_to_booking(row)?);
            }

            Ok(bookings)
        })
        .await
    }

    pub async fn booking_on(&self, room_id: &str, date: NaiveDate) -> Result<Option<Booking>> {
        let room_id = room_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE room_id = ?1 AND night = ?2"
            ))?;
            let mut rows = stmt.query(params![room_id, format_date(date)])?;
            let booking = match rows.next()? {
                Some(row) => Some(row_to_booking(row)?),
                None => None,
            };
            Ok(booking)
        })
        .await
    }

    /// Insert one booking per night of the reservation, all or nothing.
    ///
    /// Fails with [`StoreError::UnknownRoom`] or [`StoreError::Conflict`]
    /// (wrapped in `anyhow`) when the room is missing or a night is taken.
    pub async fn insert_reservation(&self, reservation: Reservation) -> Result<Vec<Booking>> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            let room_known = tx
                .query_row(
                    "SELECT 1 FROM rooms WHERE id = ?1",
                    params![reservation.room_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !room_known {
                return Err(StoreError::UnknownRoom(reservation.room_id).into());
            }

            let reservation_id = Uuid::new_v4().to_string();
            let created_at = Utc::now();
            let mut bookings = Vec::with_capacity(reservation.range.len());

            for night in reservation.range.nights() {
                let booking = Booking {
                    id: Uuid::new_v4().to_string(),
                    reservation_id: reservation_id.clone(),
                    room_id: reservation.room_id.clone(),
                    date: night,
                    booked_by: reservation.booked_by.clone(),
                    source: reservation.source,
                    created_at,
                };

                let inserted = tx.execute(
                    "INSERT INTO bookings (id, reservation_id, room_id, night, booked_by, source, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        booking.id,
                        booking.reservation_id,
                        booking.room_id,
                        format_date(booking.date),
                        booking.booked_by,
                        booking.source.as_str(),
                        booking.created_at.to_rfc3339(),
                    ],
                );

                match inserted {
                    Ok(_) => bookings.push(booking),
                    // Dropping `tx` rolls back the nights inserted so far.
                    Err(err) if is_constraint_violation(&err) => {
                        return Err(StoreError::Conflict {
                            room_id: booking.room_id,
                            date: night,
                        }
                        .into());
                    }
                    Err(err) => {
                        return Err(anyhow::Error::new(err).context("failed to insert booking"));
                    }
                }
            }

            tx.commit().context("failed to commit reservation")?;
            Ok(bookings)
        })
        .await
    }
}
