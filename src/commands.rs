//! Subcommands of the `room-calendar` binary.

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;

use crate::{
    calendar::{Availability, BookingInfo, Clock, DayState, SystemClock},
    BookingSource, BookingStore, CalendarController, CalendarError, CalendarSettings, MonthView,
    YearMonth,
};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List configured rooms
    Rooms,
    /// List booking channels
    Sources,
    /// Show one room's month
    Month {
        #[arg(short, long)]
        room: Option<String>,
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<YearMonth>,
    },
    /// Book the nights [start, end) for a room
    Book {
        #[arg(short, long)]
        room: String,
        /// First night (YYYY-MM-DD)
        #[arg(short, long)]
        start: NaiveDate,
        /// Check-out day, not booked itself (YYYY-MM-DD)
        #[arg(short, long)]
        end: NaiveDate,
        /// Guest name
        #[arg(short, long)]
        guest: String,
        /// website, booking, agoda or airbnb
        #[arg(long, default_value = "website")]
        source: BookingSource,
    },
    /// Show who holds a night
    Info {
        #[arg(short, long)]
        room: String,
        #[arg(long)]
        date: NaiveDate,
    },
    /// List stays (check-in/check-out) for a room's month
    Stays {
        #[arg(short, long)]
        room: String,
        #[arg(short, long)]
        month: YearMonth,
    },
}

/// Result of one command, printable as JSON or as text.
#[derive(Debug)]
pub struct Report {
    pub json: serde_json::Value,
    pub text: String,
}

impl Report {
    fn new<T: Serialize>(value: &T, text: String) -> Result<Self> {
        Ok(Self {
            json: serde_json::to_value(value)?,
            text,
        })
    }

    pub fn render(&self, json: bool) -> Result<String> {
        if json {
            Ok(serde_json::to_string_pretty(&self.json)?)
        } else {
            Ok(self.text.clone())
        }
    }
}

#[derive(Serialize)]
struct SourceRow {
    value: &'static str,
    label: &'static str,
}

/// Run `command` against `store`. `persistent` tells whether bookings made
/// here outlive the process; `book` refuses to run when they would not.
pub async fn execute<S: BookingStore>(
    store: S,
    settings: &CalendarSettings,
    command: &Command,
    persistent: bool,
) -> Result<Report> {
    match command {
        Command::Rooms => {
            let rooms = store.rooms().await?;
            let text = rooms
                .iter()
                .map(|room| format!("{}\t{}", room.id, room.name))
                .collect::<Vec<_>>()
                .join("\n");
            Report::new(&rooms, text)
        }
        Command::Sources => {
            let sources: Vec<_> = BookingSource::ALL
                .iter()
                .map(|source| SourceRow {
                    value: source.as_str(),
                    label: source.label(),
                })
                .collect();
            let text = sources
                .iter()
                .map(|row| format!("{}\t{}", row.value, row.label))
                .collect::<Vec<_>>()
                .join("\n");
            Report::new(&sources, text)
        }
        Command::Month { room, month } => {
            let controller = CalendarController::open(store, settings).await?;
            if let Some(room) = room {
                controller.select_room(room).await?;
            }
            let month = match month {
                Some(month) => *month,
                None => YearMonth::of(SystemClock.today()),
            };
            let view = controller.select_month(month).await;
            Report::new(&view, render_month(&view))
        }
        Command::Book {
            room,
            start,
            end,
            guest,
            source,
        } => {
            if !persistent {
                bail!(
                    "no database configured, a booking made now would be lost when the command exits; \
                     pass --database or set database_path in the settings file"
                );
            }
            let controller = CalendarController::open(store, settings).await?;
            controller.select_room(room).await?;
            controller.select_month(YearMonth::of(*start)).await;
            let range = controller.select_range(*start, *end).await?;
            let bookings = controller.confirm_booking(guest, *source).await?;
            let text = format!(
                "Booked room {room} for {} ({} night(s)) via {}",
                range.describe(),
                bookings.len(),
                source.label()
            );
            Report::new(&bookings, text)
        }
        Command::Info { room, date } => {
            let controller = CalendarController::open(store, settings).await?;
            controller.select_room(room).await?;
            let view = controller.select_month(YearMonth::of(*date)).await;
            if let Availability::Unverified { reason } = &view.availability {
                return Err(CalendarError::Unverified {
                    room_id: view.room_id.clone(),
                    month: view.month,
                    reason: reason.clone(),
                }
                .into());
            }
            let cell = view
                .day(*date)
                .ok_or_else(|| anyhow!("{date} is not in the loaded month"))?;
            let booking = cell
                .booking()
                .ok_or_else(|| anyhow!("room {room} is free on {date}"))?;
            let info = BookingInfo::from(booking);
            let text = format!(
                "Room:    {}\nDate:    {}\nGuest:   {}\nChannel: {}",
                info.room_id, info.date, info.booked_by, info.source_label
            );
            Report::new(&info, text)
        }
        Command::Stays { room, month } => {
            let stays = store.stays(room, *month).await?;
            let text = stays
                .iter()
                .map(|stay| {
                    format!(
                        "{} -> {}\t{} night(s)\t{}\t{}",
                        stay.check_in,
                        stay.check_out,
                        stay.nights(),
                        stay.booked_by,
                        stay.source.label()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            Report::new(&stays, text)
        }
    }
}

fn render_month(view: &MonthView) -> String {
    let mut lines = vec![format!("Room {} - {}", view.room_id, view.month)];
    if !view.is_verified() {
        lines.push("WARNING: could not verify availability, bookings may be missing".into());
    }
    for cell in &view.days {
        let status = match &cell.state {
            DayState::Available => "available".to_string(),
            DayState::Booked { booking } => {
                format!("booked\t{} ({})", booking.booked_by, booking.source.label())
            }
            DayState::Past { booking: Some(booking) } => {
                format!("past\t{} ({})", booking.booked_by, booking.source.label())
            }
            DayState::Past { booking: None } => "past".to_string(),
        };
        lines.push(format!("{}\t{}", cell.date, status));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{Booking, Reservation, Room},
        memory_store, open_database, Database, StoreError,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book(start: NaiveDate, end: NaiveDate) -> Command {
        Command::Book {
            room: "B517".into(),
            start,
            end,
            guest: "Lê Thị C".into(),
            source: BookingSource::Agoda,
        }
    }

    #[tokio::test]
    async fn booking_without_a_database_is_refused() {
        let settings = CalendarSettings::default();
        let store = memory_store(&settings);
        let command = book(date(2099, 6, 20), date(2099, 6, 22));

        let err = execute(store.clone(), &settings, &command, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--database"));

        let june: YearMonth = "2099-06".parse().unwrap();
        assert!(store.fetch("B517", june).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn booking_survives_into_the_next_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CalendarSettings {
            database_path: Some(dir.path().join("calendar.sqlite3")),
            ..CalendarSettings::default()
        };

        let database = open_database(&settings).await.unwrap().unwrap();
        let command = book(date(2099, 6, 20), date(2099, 6, 22));
        let report = execute(database, &settings, &command, true).await.unwrap();
        assert_eq!(
            report.text,
            "Booked room B517 for 2099-06-20 to 2099-06-21 (2 night(s)) via Agoda"
        );
        assert_eq!(report.json.as_array().unwrap().len(), 2);

        let reopened = open_database(&settings).await.unwrap().unwrap();
        let month = Command::Month {
            room: Some("B517".into()),
            month: Some("2099-06".parse().unwrap()),
        };
        let report = execute(reopened.clone(), &settings, &month, true).await.unwrap();
        assert!(report.text.contains("2099-06-20\tbooked\tLê Thị C (Agoda)"));
        assert!(report.text.contains("2099-06-21\tbooked\tLê Thị C (Agoda)"));
        assert!(report.text.contains("2099-06-22\tavailable"));

        let info = Command::Info {
            room: "B517".into(),
            date: date(2099, 6, 21),
        };
        let report = execute(reopened.clone(), &settings, &info, true).await.unwrap();
        assert_eq!(report.json["sourceLabel"], "Agoda");

        let free = Command::Info {
            room: "B517".into(),
            date: date(2099, 6, 22),
        };
        let err = execute(reopened, &settings, &free, true).await.unwrap_err();
        assert!(err.to_string().contains("is free on 2099-06-22"));
    }

    #[tokio::test]
    async fn over_long_booking_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CalendarSettings {
            database_path: Some(dir.path().join("calendar.sqlite3")),
            ..CalendarSettings::default()
        };
        let database: Database = open_database(&settings).await.unwrap().unwrap();

        let command = book(date(2099, 1, 1), date(9999, 12, 31));
        let err = execute(database.clone(), &settings, &command, true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("longest allowed stay"));

        let january: YearMonth = "2099-01".parse().unwrap();
        assert!(database.fetch("B517", january).await.unwrap().is_empty());
    }

    struct OfflineStore;

    impl BookingStore for OfflineStore {
        async fn rooms(&self) -> Result<Vec<Room>, StoreError> {
            Err(StoreError::Backend(anyhow!("backend offline")))
        }

        async fn fetch(&self, _room_id: &str, _month: YearMonth) -> Result<Vec<Booking>, StoreError> {
            Err(StoreError::Backend(anyhow!("backend offline")))
        }

        async fn create(&self, _reservation: Reservation) -> Result<Vec<Booking>, StoreError> {
            Err(StoreError::Backend(anyhow!("backend offline")))
        }
    }

    #[tokio::test]
    async fn info_on_an_unreadable_month_does_not_claim_the_night_is_free() {
        let settings = CalendarSettings::default();
        let info = Command::Info {
            room: "B516".into(),
            date: date(2024, 6, 3),
        };
        let err = execute(OfflineStore, &settings, &info, true).await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("could not verify availability of room B516 in 2024-06"));
        assert!(!err.to_string().contains("free"));

        let month = Command::Month {
            room: None,
            month: Some("2024-06".parse().unwrap()),
        };
        let report = execute(OfflineStore, &settings, &month, true).await.unwrap();
        assert!(report.text.contains("WARNING: could not verify availability"));
        assert_eq!(report.json["availability"]["status"], "unverified");
    }

    #[tokio::test]
    async fn sources_render_as_text_and_json() {
        let settings = CalendarSettings::default();
        let report = execute(memory_store(&settings), &settings, &Command::Sources, false)
            .await
            .unwrap();
        assert!(report.render(false).unwrap().contains("booking\tBooking.com"));
        assert_eq!(report.json[3]["label"], "Airbnb");
    }
}
