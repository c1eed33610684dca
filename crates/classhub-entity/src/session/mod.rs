//! Class session domain entities.

pub mod model;

pub use model::{BookableSession, ClassSession, CreateClassSession, LockedSession};
