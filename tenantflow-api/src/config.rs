/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, or `*` (default: `*`)
/// - `DATABASE_URL`: Landlord PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Landlord pool size (default: 10)
/// - `TENANT_MAX_CONNECTIONS`: Pool size per tenant database (default: 5)
/// - `TENANT_ACQUIRE_TIMEOUT_SECONDS`: Wait for a tenant connection (default: 5)
/// - `TENANT_STATEMENT_TIMEOUT_MS`: `statement_timeout` for tenant sessions (default: 5000)
/// - `TENANT_IDLE_TIMEOUT_SECONDS`: Idle tenant connections are closed after this (default: 300)
/// - `TENANT_MIGRATE_ON_STARTUP`: Re-apply the tenant schema to every tenant at boot (default: false)
/// - `TENANT_SEED_DEMO_ON_STARTUP`: Add demo members, projects and tasks to every active tenant at boot (default: false, development only)
/// - `ARGON2_MEMORY_KIB` / `ARGON2_ITERATIONS` / `ARGON2_PARALLELISM`: Hashing cost (default: 65536 / 3 / 4)
/// - `RUST_LOG`: Log filter
/// - `LOG_FORMAT`: `json` for structured logs (read by the binary)
///
/// # Example
///
/// ```no_run
/// use tenantflow_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;

use tenantflow_shared::auth::password::HasherConfig;
use tenantflow_shared::db::pool::DatabaseConfig;
use tenantflow_shared::db::router::TenantPoolConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Landlord database pool
    pub database: DatabaseConfig,

    /// Per-tenant pools
    pub tenant_pool: TenantPoolConfig,

    /// Credential hashing cost
    pub hasher: HasherConfig,

    /// Re-apply tenant migrations to every tenant at startup
    pub migrate_tenants_on_startup: bool,

    /// Seed demo data into every active tenant at startup
    pub seed_demo_on_startup: bool,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing
    /// - A numeric or boolean variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let idle = env_or("TENANT_IDLE_TIMEOUT_SECONDS", 300u64)?;

        Ok(Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("API_PORT", 8080u16)?,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10u32)?,
                ..Default::default()
            },
            tenant_pool: TenantPoolConfig {
                max_connections: env_or("TENANT_MAX_CONNECTIONS", 5u32)?,
                acquire_timeout_seconds: env_or("TENANT_ACQUIRE_TIMEOUT_SECONDS", 5u64)?,
                statement_timeout_ms: env_or("TENANT_STATEMENT_TIMEOUT_MS", 5_000u64)?,
                idle_timeout_seconds: (idle > 0).then_some(idle),
            },
            hasher: HasherConfig {
                memory_kib: env_or("ARGON2_MEMORY_KIB", 65536u32)?,
                iterations: env_or("ARGON2_ITERATIONS", 3u32)?,
                parallelism: env_or("ARGON2_PARALLELISM", 4u32)?,
            },
            migrate_tenants_on_startup: env_or("TENANT_MIGRATE_ON_STARTUP", false)?,
            seed_demo_on_startup: env_or("TENANT_SEED_DEMO_ON_STARTUP", false)?,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Reads and parses `key`, falling back to `default` when unset
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

/// `*` (or nothing) allows any origin
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(str::to_string)
        .collect()
}
