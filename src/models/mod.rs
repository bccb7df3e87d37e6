pub mod booking;
pub mod business;
pub mod customer;
pub mod service;
pub mod slot;
pub mod staff;

pub use booking::{Booking, BookingStatus};
pub use business::Business;
pub use customer::Customer;
pub use service::Service;
pub use slot::{DayAvailability, TimeSlot};
pub use staff::{DayHours, Staff, WorkingHours};

/// Storage format for all persisted timestamps (business-local civil time).
pub const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
