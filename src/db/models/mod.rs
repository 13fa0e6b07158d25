pub mod booking;
pub mod room;

pub use booking::{group_stays, Booking, BookingSource, Reservation, Stay};
pub use room::{default_rooms, Room};
