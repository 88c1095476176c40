/// Member model and database operations (tenant database)
///
/// Members are the people who log in to a tenant. Each tenant database has its
/// own `members` table, so the same email may exist in several tenants without
/// conflict. `tenant_id` is denormalized onto every row and re-checked during
/// token validation.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('admin', 'member');
///
/// CREATE TABLE members (
///     id BIGSERIAL PRIMARY KEY,
///     tenant_id BIGINT NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role member_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT members_email_key UNIQUE (email)
/// );
/// ```
///
/// # Roles
///
/// - **admin**: Manage members, projects and tasks
/// - **member**: Read projects and tasks, edit own profile
///
/// # Example
///
/// ```no_run
/// use tenantflow_shared::models::member::{CreateMember, Member, MemberRole};
/// # use sqlx::PgPool;
///
/// # async fn example(tenant_pool: PgPool) -> Result<(), sqlx::Error> {
/// let member = Member::create(&tenant_pool, CreateMember {
///     tenant_id: 1,
///     name: "Bob".to_string(),
///     email: "bob@acme.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: MemberRole::Member,
/// }).await?;
///
/// assert!(!member.role.can_manage_members());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Roles within a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Full control over the tenant's members, projects and tasks
    Admin,

    /// Read access plus editing their own profile
    Member,
}

impl MemberRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }

    /// Can create, update and delete other members
    pub fn can_manage_members(&self) -> bool {
        matches!(self, MemberRole::Admin)
    }

    /// Can create, update and delete projects and tasks
    pub fn can_manage_projects(&self) -> bool {
        matches!(self, MemberRole::Admin)
    }

    /// Can change email addresses and roles
    pub fn can_change_identity(&self) -> bool {
        matches!(self, MemberRole::Admin)
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant member
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: i64,

    /// Owning tenant (landlord `tenants.id`)
    pub tenant_id: i64,

    pub name: String,

    /// Login email, unique within the tenant
    pub email: String,

    /// Argon2id PHC string; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: MemberRole,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }
}

/// Input for creating a member
#[derive(Debug, Clone)]
pub struct CreateMember {
    pub tenant_id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: MemberRole,
}

/// Partial update; `None` leaves a column unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateMember {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<MemberRole>,
}

impl Member {
    /// Creates a member
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (`members_email_key`).
    pub async fn create(pool: &PgPool, data: CreateMember) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (tenant_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, tenant_id, name, email, password_hash, role,
                      created_at, updated_at
            "#,
        )
        .bind(data.tenant_id)
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await
    }

    /// Creates a member unless one with the same email exists
    ///
    /// Returns the stored row either way, so seeding can be repeated safely
    /// and two concurrent seeders end up with the same member.
    pub async fn create_if_absent(pool: &PgPool, data: CreateMember) -> Result<Self, sqlx::Error> {
        let email = data.email.clone();

        sqlx::query(
            r#"
            INSERT INTO members (tenant_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(data.tenant_id)
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .execute(pool)
        .await?;

        Self::find_by_email(pool, &email)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds a member by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT id, tenant_id, name, email, password_hash, role,
                   created_at, updated_at
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a member by email (exact match)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT id, tenant_id, name, email, password_hash, role,
                   created_at, updated_at
            FROM members
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Lists members of a tenant, oldest first
    pub async fn list(pool: &PgPool, tenant_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT id, tenant_id, name, email, password_hash, role,
                   created_at, updated_at
            FROM members
            WHERE tenant_id = $1
            ORDER BY id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    /// Applies a partial update
    ///
    /// Returns the updated member, or `None` if it does not exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateMember,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, tenant_id, name, email, password_hash, role,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a member
    ///
    /// Returns true if a row was deleted. Tokens are not touched; callers
    /// revoke them with `AccessToken::delete_for_principal`.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
