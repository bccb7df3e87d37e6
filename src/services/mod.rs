pub mod availability;
pub mod bookings;
pub mod calendar;
pub mod conflict;
pub mod stats;
