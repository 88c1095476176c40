/// Task model (tenant database)
///
/// Tasks belong to a project; tenant scoping is enforced by checking the
/// parent project before any task query.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     duration INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Unit of work inside a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub name: String,

    /// Estimated effort (integer units chosen by the tenant)
    pub duration: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; `None` leaves a column unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub duration: Option<i32>,
}

impl Task {
    /// Creates a task under `project_id`
    pub async fn create(
        pool: &PgPool,
        project_id: i64,
        name: &str,
        duration: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, name, duration)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, name, duration, created_at, updated_at
            "#,
        )
        .bind(project_id)
        .bind(name)
        .bind(duration)
        .fetch_one(pool)
        .await
    }

    /// Finds a task within a project
    pub async fn find(pool: &PgPool, project_id: i64, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, name, duration, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND project_id = $2
            "#,
        )
        .bind(id)
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a project's tasks, oldest first
    pub async fn list_for_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, name, duration, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY id
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Applies a partial update
    pub async fn update(
        pool: &PgPool,
        project_id: i64,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET name = COALESCE($3, name),
                duration = COALESCE($4, duration),
                updated_at = NOW()
            WHERE id = $1 AND project_id = $2
            RETURNING id, project_id, name, duration, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(project_id)
        .bind(data.name)
        .bind(data.duration)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, project_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
