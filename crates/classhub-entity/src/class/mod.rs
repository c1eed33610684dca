//! Gym class domain entities.

pub mod model;

pub use model::{CreateGymClass, GymClass};
