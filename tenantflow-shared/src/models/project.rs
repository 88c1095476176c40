/// Project model (tenant database)
///
/// Projects group tasks. Deleting a project deletes its tasks through
/// `ON DELETE CASCADE` on `tasks.project_id`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     tenant_id BIGINT NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Project owned by a tenant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a project
    pub async fn create(pool: &PgPool, tenant_id: i64, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (tenant_id, name)
            VALUES ($1, $2)
            RETURNING id, tenant_id, name, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_one(pool)
        .await
    }

    /// Finds a project belonging to `tenant_id`
    pub async fn find(pool: &PgPool, tenant_id: i64, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, tenant_id, name, created_at, updated_at
            FROM projects
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a tenant's projects, oldest first
    pub async fn list(pool: &PgPool, tenant_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, tenant_id, name, created_at, updated_at
            FROM projects
            WHERE tenant_id = $1
            ORDER BY id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    /// Renames a project
    pub async fn rename(
        pool: &PgPool,
        tenant_id: i64,
        id: i64,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING id, tenant_id, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a project and, by cascade, its tasks
    pub async fn delete(pool: &PgPool, tenant_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
