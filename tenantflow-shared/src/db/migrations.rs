/// Schema management for the landlord and tenant databases
///
/// Two embedded migration sets live at the workspace root:
///
/// - `migrations/central/` - users and tenants (landlord database)
/// - `migrations/tenant/` - members, projects, tasks and access tokens
///   (applied to every tenant database by the provisioner)
///
/// Both are run through sqlx's migrator, which records applied versions in
/// `_sqlx_migrations` and serializes concurrent runners with an advisory lock,
/// so applying a set twice is a no-op.
///
/// Database creation and removal go through the landlord pool. Postgres has no
/// `CREATE DATABASE IF NOT EXISTS`, so [`ensure_database_exists`] checks
/// `pg_database` first and treats a lost creation race as success.

use sqlx::{migrate::Migrator, postgres::PgPool, Executor};
use tracing::{debug, info, warn};

use super::router::validate_database_name;

/// Landlord schema (users, tenants)
static CENTRAL_MIGRATOR: Migrator = sqlx::migrate!("../migrations/central");

/// Per-tenant schema (members, projects, tasks, access_tokens)
static TENANT_MIGRATOR: Migrator = sqlx::migrate!("../migrations/tenant");

/// SQLSTATE for `duplicate_database`
const DUPLICATE_DATABASE: &str = "42P04";

/// SQLSTATE for `unique_violation` (raised on `pg_database` when two creators race)
const UNIQUE_VIOLATION: &str = "23505";

/// Applies pending landlord migrations
///
/// # Errors
///
/// Returns an error if a migration fails or the database is unreachable.
pub async fn run_central_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Applying landlord migrations");
    CENTRAL_MIGRATOR.run(pool).await.map_err(|e| {
        warn!(error = %e, "Landlord migration failed");
        e
    })
}

/// Applies pending tenant migrations to one tenant database
///
/// # Errors
///
/// Returns an error if a migration fails or the database is unreachable.
pub async fn run_tenant_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    TENANT_MIGRATOR.run(pool).await
}

/// Returns the newest tenant migration version embedded in this build
pub fn latest_tenant_schema_version() -> Option<i64> {
    TENANT_MIGRATOR.iter().map(|m| m.version).max()
}

/// Returns the newest successfully applied migration version, if any
///
/// # Errors
///
/// Returns an error if the migrations table cannot be queried.
pub async fn applied_schema_version(pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(None);
    }

    let version: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await?;

    Ok(version)
}

/// Creates `database` on the landlord server unless it already exists
///
/// Returns `true` when this call created the database and `false` when it was
/// already present, including when a concurrent caller created it first.
///
/// # Errors
///
/// Returns an error if the name is not a valid database identifier or the
/// server refuses the statement for any reason other than a duplicate.
pub async fn ensure_database_exists(central: &PgPool, database: &str) -> Result<bool, sqlx::Error> {
    validate_database_name(database).map_err(|e| sqlx::Error::Configuration(Box::new(e)))?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(database)
            .fetch_one(central)
            .await?;

    if exists {
        debug!(database, "Tenant database already exists");
        return Ok(false);
    }

    // Simple-query protocol: CREATE DATABASE cannot run inside a transaction block.
    let statement = format!("CREATE DATABASE \"{}\"", database);
    match central.execute(statement.as_str()).await {
        Ok(_) => {
            info!(database, "Tenant database created");
            Ok(true)
        }
        Err(sqlx::Error::Database(db_err))
            if matches!(db_err.code().as_deref(), Some(DUPLICATE_DATABASE | UNIQUE_VIOLATION)) =>
        {
            debug!(database, "Tenant database created concurrently by another request");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Drops `database` if it exists, terminating open sessions
///
/// Used to undo a failed provisioning attempt and by test cleanup. Callers
/// must evict the database from the connection router first.
///
/// # Errors
///
/// Returns an error if the name is invalid or the server refuses the drop.
pub async fn drop_database(central: &PgPool, database: &str) -> Result<(), sqlx::Error> {
    validate_database_name(database).map_err(|e| sqlx::Error::Configuration(Box::new(e)))?;

    warn!(database, "Dropping tenant database");
    let statement = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", database);
    central.execute(statement.as_str()).await?;

    Ok(())
}
