use super::{BookingStore, StoreError};
use crate::{
    calendar::YearMonth,
    db::{Booking, Database, Reservation, Room},
};

impl BookingStore for Database {
    async fn rooms(&self) -> Result<Vec<Room>, StoreError> {
        Ok(self.list_rooms().await?)
    }

    async fn fetch(&self, room_id: &str, month: YearMonth) -> Result<Vec<Booking>, StoreError> {
        Ok(self.bookings_for_month(room_id, month).await?)
    }

    async fn create(&self, reservation: Reservation) -> Result<Vec<Booking>, StoreError> {
        Ok(self.insert_reservation(reservation).await?)
    }
}
