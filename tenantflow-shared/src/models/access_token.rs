/// Access token model (tenant database)
///
/// Tokens live in the tenant database of the principal they authenticate.
/// Only the SHA-256 of the full composite token is stored (see
/// [`crate::auth::token`]); the plaintext is returned once at issue time.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE principal_type AS ENUM ('member');
///
/// CREATE TABLE access_tokens (
///     id BIGSERIAL PRIMARY KEY,
///     principal_type principal_type NOT NULL,
///     principal_id BIGINT NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     token_hash VARCHAR(64) NOT NULL,
///     abilities TEXT[] NOT NULL DEFAULT ARRAY['*'],
///     last_used_at TIMESTAMPTZ,
///     expires_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT access_tokens_token_hash_key UNIQUE (token_hash)
/// );
/// ```
///
/// # Lifecycle
///
/// Issued → Active → (Expired and reaped on next use | Revoked by logout)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Kind of principal a token authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "principal_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Member,
}

/// Stored bearer token
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessToken {
    pub id: i64,

    pub principal_type: PrincipalKind,

    pub principal_id: i64,

    /// Label given at issue time (e.g. "auth_token")
    pub name: String,

    /// SHA-256 hex of the full composite token
    #[serde(skip_serializing)]
    pub token_hash: String,

    pub abilities: Vec<String>,

    pub last_used_at: Option<DateTime<Utc>>,

    /// `None` never expires
    pub expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Input for storing a newly issued token
#[derive(Debug, Clone)]
pub struct CreateAccessToken {
    pub principal_type: PrincipalKind,
    pub principal_id: i64,
    pub name: String,
    pub token_hash: String,
    pub abilities: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Checks if the token is expired as of `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Checks if the token is expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Stores a token hash
    ///
    /// # Errors
    ///
    /// Returns an error if the hash already exists (`access_tokens_token_hash_key`).
    pub async fn create(pool: &PgPool, data: CreateAccessToken) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AccessToken>(
            r#"
            INSERT INTO access_tokens
                (principal_type, principal_id, name, token_hash, abilities, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, principal_type, principal_id, name, token_hash, abilities,
                      last_used_at, expires_at, created_at
            "#,
        )
        .bind(data.principal_type)
        .bind(data.principal_id)
        .bind(data.name)
        .bind(data.token_hash)
        .bind(data.abilities)
        .bind(data.expires_at)
        .fetch_one(pool)
        .await
    }

    /// Finds a token by hash, requiring it to belong to the given principal
    ///
    /// Matching on the principal as well as the hash means a token whose
    /// id fields were edited is rejected even if the secret is intact.
    pub async fn find_for_principal(
        pool: &PgPool,
        token_hash: &str,
        principal_type: PrincipalKind,
        principal_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AccessToken>(
            r#"
            SELECT id, principal_type, principal_id, name, token_hash, abilities,
                   last_used_at, expires_at, created_at
            FROM access_tokens
            WHERE token_hash = $1 AND principal_type = $2 AND principal_id = $3
            "#,
        )
        .bind(token_hash)
        .bind(principal_type)
        .bind(principal_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a principal's tokens, newest first
    pub async fn list_for_principal(
        pool: &PgPool,
        principal_type: PrincipalKind,
        principal_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AccessToken>(
            r#"
            SELECT id, principal_type, principal_id, name, token_hash, abilities,
                   last_used_at, expires_at, created_at
            FROM access_tokens
            WHERE principal_type = $1 AND principal_id = $2
            ORDER BY id DESC
            "#,
        )
        .bind(principal_type)
        .bind(principal_id)
        .fetch_all(pool)
        .await
    }

    /// Records use of a token
    pub async fn touch(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE access_tokens SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a token by ID
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a token by hash (logout)
    pub async fn delete_by_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every token of a principal
    ///
    /// Returns the number of tokens deleted.
    pub async fn delete_for_principal(
        pool: &PgPool,
        principal_type: PrincipalKind,
        principal_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM access_tokens WHERE principal_type = $1 AND principal_id = $2",
        )
        .bind(principal_type)
        .bind(principal_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
