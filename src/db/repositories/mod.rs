mod bookings;
mod rooms;
