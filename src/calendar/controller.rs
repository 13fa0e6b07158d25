use std::{future::Future, sync::Arc, time::Duration};

use chrono::{Duration as Days, NaiveDate};
use log::{info, warn};
use serde::Serialize;
use tokio::{sync::Mutex, time};

use super::{
    project_month, validate_range, validate_stay_length, Availability, BookingInfo, Clock, DateRange, MonthView,
    Rejection, SystemClock, YearMonth,
};
use crate::{
    db::{Booking, BookingSource, Reservation, Room},
    error::CalendarError,
    settings::CalendarSettings,
    store::{BookingStore, StoreError},
};

/// Transient UI state of the calendar page. Never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum Interaction {
    Idle,
    RangeSelected { range: DateRange },
    /// `range` is absent when the input could not form a range at all.
    Rejected {
        #[serde(skip_serializing_if = "Option::is_none")]
        range: Option<DateRange>,
        rejection: Rejection,
    },
    InfoShown { info: BookingInfo },
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::Idle
    }
}

#[derive(Debug, Clone)]
struct CalendarState {
    room_id: String,
    month: YearMonth,
    bookings: Vec<Booking>,
    availability: Availability,
    interaction: Interaction,
}

/// Drives the availability calendar for one staff session: which room and
/// month are shown, what is selected, and booking through the store.
#[derive(Clone)]
pub struct CalendarController<S, C = SystemClock> {
    store: S,
    clock: C,
    rooms: Arc<Vec<Room>>,
    fetch_timeout: Duration,
    max_stay_nights: usize,
    state: Arc<Mutex<CalendarState>>,
}

impl<S: BookingStore> CalendarController<S, SystemClock> {
    pub async fn open(store: S, settings: &CalendarSettings) -> Result<Self, CalendarError> {
        Self::with_clock(store, SystemClock, settings).await
    }
}

impl<S: BookingStore, C: Clock> CalendarController<S, C> {
    /// Show the first configured room at the current month.
    pub async fn with_clock(
        store: S,
        clock: C,
        settings: &CalendarSettings,
    ) -> Result<Self, CalendarError> {
        let first_room = settings
            .rooms
            .first()
            .ok_or_else(|| CalendarError::InvalidInput("no rooms configured".into()))?;

        let month = YearMonth::of(clock.today());
        let controller = Self {
            state: Arc::new(Mutex::new(CalendarState {
                room_id: first_room.id.clone(),
                month,
                bookings: Vec::new(),
                availability: Availability::Verified,
                interaction: Interaction::Idle,
            })),
            store,
            clock,
            rooms: Arc::new(settings.rooms.clone()),
            fetch_timeout: settings.fetch_timeout(),
            max_stay_nights: settings.max_stay_nights,
        };

        controller.reload().await;
        Ok(controller)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn sources(&self) -> &'static [BookingSource] {
        &BookingSource::ALL
    }

    pub async fn room_id(&self) -> String {
        self.state.lock().await.room_id.clone()
    }

    pub async fn month(&self) -> YearMonth {
        self.state.lock().await.month
    }

    pub async fn interaction(&self) -> Interaction {
        self.state.lock().await.interaction.clone()
    }

    pub async fn view(&self) -> MonthView {
        let state = self.state.lock().await;
        project_month(
            &state.room_id,
            state.month,
            &state.bookings,
            self.clock.today(),
            state.availability.clone(),
        )
    }

    pub async fn select_room(&self, room_id: &str) -> Result<MonthView, CalendarError> {
        if !self.rooms.iter().any(|room| room.id == room_id) {
            return Err(CalendarError::UnknownRoom(room_id.to_string()));
        }
        self.state.lock().await.room_id = room_id.to_string();
        self.reload().await;
        Ok(self.view().await)
    }

    pub async fn select_month(&self, month: YearMonth) -> MonthView {
        self.state.lock().await.month = month;
        self.reload().await;
        self.view().await
    }

    pub async fn next_month(&self) -> MonthView {
        let month = self.month().await.next();
        self.select_month(month).await
    }

    pub async fn prev_month(&self) -> MonthView {
        let month = self.month().await.prev();
        self.select_month(month).await
    }

    /// Re-read the shown room/month. A failed read leaves the month without
    /// known bookings and marks the view as unverified.
    pub async fn reload(&self) {
        let (room_id, month) = {
            let state = self.state.lock().await;
            (state.room_id.clone(), state.month)
        };

        let (bookings, availability) = match self
            .guarded(self.store.fetch(&room_id, month))
            .await
        {
            Ok(bookings) => (bookings, Availability::Verified),
            Err(err) => {
                warn!("Could not load bookings for room {room_id} in {month}: {err}");
                (
                    Vec::new(),
                    Availability::Unverified {
                        reason: err.to_string(),
                    },
                )
            }
        };

        let mut state = self.state.lock().await;
        // The user may have switched room or month while we were waiting.
        if state.room_id == room_id && state.month == month {
            state.bookings = bookings;
            state.availability = availability;
            state.interaction = Interaction::Idle;
        }
    }

    /// Handle a drag selection over `[start, end)`.
    pub async fn select_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRange, CalendarError> {
        {
            let state = self.state.lock().await;
            if matches!(
                state.interaction,
                Interaction::RangeSelected { .. } | Interaction::InfoShown { .. }
            ) {
                return Err(CalendarError::InvalidState(
                    "close the open panel before selecting another range",
                ));
            }
        }

        let range = match DateRange::new(start, end) {
            Ok(range) => range,
            Err(rejection) => return Err(self.reject(None, rejection).await),
        };
        if let Err(rejection) = validate_stay_length(&range, self.max_stay_nights) {
            return Err(self.reject(Some(range), rejection).await);
        }

        {
            let state = self.state.lock().await;
            if range.months().contains(&state.month) {
                unverified(&state)?;
            }
        }

        let bookings = self.bookings_for(&range, true).await?;
        if let Err(rejection) = validate_range(&range, &bookings, self.clock.today()) {
            return Err(self.reject(Some(range), rejection).await);
        }

        self.state.lock().await.interaction = Interaction::RangeSelected { range };
        Ok(range)
    }

    /// Handle a click on one day: show the booking if there is one, otherwise
    /// treat it as a one-night selection. Refused while the shown month is
    /// unverified, since a free-looking day may be booked.
    pub async fn click_day(&self, date: NaiveDate) -> Result<Interaction, CalendarError> {
        let booking = {
            let state = self.state.lock().await;
            unverified(&state)?;
            state.bookings.iter().find(|b| b.date == date).cloned()
        };

        if let Some(booking) = booking {
            let interaction = Interaction::InfoShown {
                info: BookingInfo::from(&booking),
            };
            self.state.lock().await.interaction = interaction.clone();
            return Ok(interaction);
        }

        self.select_range(date, date + Days::days(1)).await?;
        Ok(self.interaction().await)
    }

    /// Book the selected range. The range is checked again against fresh
    /// data first; the store still has the final word on conflicts.
    pub async fn confirm_booking(
        &self,
        booked_by: &str,
        source: BookingSource,
    ) -> Result<Vec<Booking>, CalendarError> {
        let booked_by = booked_by.trim();
        if booked_by.is_empty() {
            return Err(CalendarError::InvalidInput("guest name is required".into()));
        }

        let (room_id, range) = {
            let state = self.state.lock().await;
            match &state.interaction {
                Interaction::RangeSelected { range } => (state.room_id.clone(), *range),
                _ => return Err(CalendarError::InvalidState("no range is selected")),
            }
        };

        let fresh = self.bookings_for(&range, false).await?;
        if let Err(rejection) = validate_range(&range, &fresh, self.clock.today()) {
            return Err(self.reject(Some(range), rejection).await);
        }

        let reservation = Reservation {
            room_id: room_id.clone(),
            range,
            booked_by: booked_by.to_string(),
            source,
        };

        match self.guarded(self.store.create(reservation)).await {
            Ok(bookings) => {
                info!(
                    "Booked room {room_id} for {} via {}",
                    range.describe(),
                    source.label()
                );
                self.reload().await;
                Ok(bookings)
            }
            Err(CalendarError::Conflict { room_id, date }) => {
                warn!("Conflict booking room {room_id} on {date}");
                self.reload().await;
                Err(CalendarError::Conflict { room_id, date })
            }
            Err(CalendarError::Timeout(waited)) => {
                warn!(
                    "No answer after {waited:?} while booking room {room_id} for {}",
                    range.describe()
                );
                self.settle_unconfirmed(&room_id, range, booked_by, source).await
            }
            Err(err) => Err(err),
        }
    }

    /// Drop the current selection or rejection. Booking details are closed
    /// with `dismiss`.
    pub async fn cancel(&self) -> Result<(), CalendarError> {
        let mut state = self.state.lock().await;
        if matches!(state.interaction, Interaction::InfoShown { .. }) {
            return Err(CalendarError::InvalidState(
                "nothing to cancel, close the booking details",
            ));
        }
        state.interaction = Interaction::Idle;
        Ok(())
    }

    /// Close whatever panel is open.
    pub async fn dismiss(&self) {
        self.state.lock().await.interaction = Interaction::Idle;
    }

    async fn reject(&self, range: Option<DateRange>, rejection: Rejection) -> CalendarError {
        self.state.lock().await.interaction = Interaction::Rejected { range, rejection };
        CalendarError::Rejected(rejection)
    }

    /// A write timed out, so it may or may not have been committed. The
    /// booking only counts as made when every night of `range` now belongs to
    /// one reservation for this guest and channel.
    async fn settle_unconfirmed(
        &self,
        room_id: &str,
        range: DateRange,
        booked_by: &str,
        source: BookingSource,
    ) -> Result<Vec<Booking>, CalendarError> {
        let unconfirmed = || CalendarError::WriteUnconfirmed {
            room_id: room_id.to_string(),
            range: range.describe(),
        };

        let fresh = match self.bookings_for(&range, false).await {
            Ok(fresh) => fresh,
            Err(err) => {
                warn!("Could not check the unconfirmed booking of room {room_id}: {err}");
                self.reload().await;
                return Err(unconfirmed());
            }
        };

        let mut held: Vec<Booking> = fresh
            .into_iter()
            .filter(|booking| range.contains(booking.date))
            .collect();
        held.sort_by_key(|booking| booking.date);
        let ours = held.len() == range.len()
            && held.first().is_some_and(|first| {
                held.iter().all(|booking| {
                    booking.reservation_id == first.reservation_id
                        && booking.booked_by == booked_by
                        && booking.source == source
                })
            });

        self.reload().await;
        if ours {
            info!(
                "Booking of room {room_id} for {} was committed after all",
                range.describe()
            );
            Ok(held)
        } else {
            Err(unconfirmed())
        }
    }

    /// Bookings of the current room for every month the range touches. With
    /// `use_loaded`, the already-loaded month is taken from memory.
    async fn bookings_for(
        &self,
        range: &DateRange,
        use_loaded: bool,
    ) -> Result<Vec<Booking>, CalendarError> {
        let (room_id, loaded_month, loaded) = {
            let state = self.state.lock().await;
            (state.room_id.clone(), state.month, state.bookings.clone())
        };

        let mut bookings = Vec::new();
        for month in range.months() {
            if use_loaded && month == loaded_month {
                bookings.extend(loaded.iter().cloned());
            } else {
                bookings.extend(self.guarded(self.store.fetch(&room_id, month)).await?);
            }
        }
        Ok(bookings)
    }

    async fn guarded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, CalendarError> {
        match time::timeout(self.fetch_timeout, call).await {
            Ok(result) => result.map_err(CalendarError::from),
            Err(_) => Err(CalendarError::Timeout(self.fetch_timeout)),
        }
    }
}

fn unverified(state: &CalendarState) -> Result<(), CalendarError> {
    match &state.availability {
        Availability::Verified => Ok(()),
        Availability::Unverified { reason } => Err(CalendarError::Unverified {
            room_id: state.room_id.clone(),
            month: state.month,
            reason: reason.clone(),
        }),
    }
}
