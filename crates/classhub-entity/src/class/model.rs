//! Gym class entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A class offered by the gym (the bookable resource definition).
///
/// A class is a recurring offering; individual bookable occurrences are
/// [`crate::session::ClassSession`] rows referencing it. The class carries
/// the default capacity that applies to every session without an override.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GymClass {
    /// Unique class identifier.
    pub id: Uuid,
    /// Display name of the class.
    pub name: String,
    /// Default maximum number of members per session.
    pub default_capacity: i32,
    /// Whether the class is open for booking.
    pub is_active: bool,
    /// When the class was created.
    pub created_at: DateTime<Utc>,
    /// When the class was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new gym class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGymClass {
    /// Display name of the class.
    pub name: String,
    /// Default maximum number of members per session.
    pub default_capacity: i32,
}
