/// Tenant model and database operations (landlord database)
///
/// A tenant is a registered company. Its `domain` is the short code chosen at
/// registration and doubles as the email domain members log in with
/// (`alice@acme.com` resolves to domain `acme`). `database_name` names the
/// isolated Postgres database holding the tenant's members, projects, tasks
/// and tokens.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tenants (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     domain VARCHAR(63) NOT NULL,
///     database_name VARCHAR(63) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     user_id BIGINT NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tenants_domain_key UNIQUE (domain),
///     CONSTRAINT tenants_database_name_key UNIQUE (database_name)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tenantflow_shared::models::tenant::Tenant;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// if let Some(tenant) = Tenant::find_by_domain(&pool, "acme").await? {
///     println!("acme lives in {}", tenant.database_name);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Prefix of every tenant database name
pub const DATABASE_PREFIX: &str = "db_";

/// Registered company
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: i64,

    /// Company display name
    pub name: String,

    /// Lowercase short code, unique across tenants
    pub domain: String,

    /// Name of the tenant's database on the landlord server
    pub database_name: String,

    /// Inactive tenants cannot log in
    pub is_active: bool,

    /// Owning user
    pub user_id: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new tenant
#[derive(Debug, Clone)]
pub struct CreateTenant {
    pub name: String,
    pub domain: String,
    pub database_name: String,
    pub user_id: i64,
    pub is_active: bool,
}

impl CreateTenant {
    /// Tenant for `short_code`, stored in database `db_<short_code>`
    ///
    /// The row starts inactive; registration activates it once the tenant
    /// database is provisioned.
    pub fn for_short_code(name: String, short_code: &str, user_id: i64) -> Self {
        let domain = short_code.to_lowercase();
        Self {
            name,
            database_name: format!("{}{}", DATABASE_PREFIX, domain),
            domain,
            user_id,
            is_active: false,
        }
    }
}

impl Tenant {
    /// Creates a new tenant
    ///
    /// # Errors
    ///
    /// Returns an error if the domain or database name is taken
    /// (`tenants_domain_key`, `tenants_database_name_key`) or the owning user
    /// does not exist.
    pub async fn create<'e, E>(executor: E, data: CreateTenant) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, domain, database_name, user_id, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, domain, database_name, is_active, user_id,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.domain)
        .bind(data.database_name)
        .bind(data.user_id)
        .bind(data.is_active)
        .fetch_one(executor)
        .await
    }

    /// Finds a tenant by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, domain, database_name, is_active, user_id,
                   created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a tenant by its lowercase domain
    pub async fn find_by_domain(pool: &PgPool, domain: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, domain, database_name, is_active, user_id,
                   created_at, updated_at
            FROM tenants
            WHERE domain = $1
            "#,
        )
        .bind(domain)
        .fetch_optional(pool)
        .await
    }

    /// Finds the tenant owned by a user
    ///
    /// Users own at most one tenant; the oldest wins if data says otherwise.
    pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, domain, database_name, is_active, user_id,
                   created_at, updated_at
            FROM tenants
            WHERE user_id = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Activates or deactivates a tenant
    ///
    /// Returns the updated tenant, or `None` if it does not exist.
    pub async fn set_active(
        pool: &PgPool,
        id: i64,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, domain, database_name, is_active, user_id,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a tenant row
    ///
    /// Only used to undo a registration whose database could not be
    /// provisioned. Returns true if a row was deleted.
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists every tenant, oldest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, domain, database_name, is_active, user_id,
                   created_at, updated_at
            FROM tenants
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
