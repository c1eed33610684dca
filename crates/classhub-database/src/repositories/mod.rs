//! Repository implementations for all ClassHub entities.

pub mod booking;
pub mod class;
pub mod session;

pub use booking::BookingRepository;
pub use class::ClassRepository;
pub use session::SessionRepository;
