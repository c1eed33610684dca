//! Gym class repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::result::AppResult;
use classhub_entity::class::{CreateGymClass, GymClass};

/// Repository for gym class records.
///
/// Classes are written by the staff-side catalog; the reservation core
/// only reads them (via the session join) but test fixtures and seeding
/// go through this repository.
#[derive(Debug, Clone)]
pub struct ClassRepository {
    pool: PgPool,
}

impl ClassRepository {
    /// Create a new class repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a class by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<GymClass>> {
        sqlx::query_as::<_, GymClass>("SELECT * FROM gym_classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find class", e))
    }

    /// List active classes ordered by name.
    pub async fn find_active(&self) -> AppResult<Vec<GymClass>> {
        sqlx::query_as::<_, GymClass>("SELECT * FROM gym_classes WHERE is_active ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list active classes", e)
            })
    }

    /// Create a new class.
    pub async fn create(&self, data: &CreateGymClass) -> AppResult<GymClass> {
        sqlx::query_as::<_, GymClass>(
            "INSERT INTO gym_classes (name, default_capacity) VALUES ($1, $2) RETURNING *",
        )
        .bind(&data.name)
        .bind(data.default_capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create class", e))
    }

    /// Deactivate a class, closing all of its sessions to new bookings.
    pub async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE gym_classes SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to deactivate class", e)
                })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Class {id} not found")));
        }
        Ok(())
    }
}
