//! Booking domain entities.

pub mod model;
pub mod status;

pub use model::{Booking, BookingWithSession};
pub use status::BookingStatus;
