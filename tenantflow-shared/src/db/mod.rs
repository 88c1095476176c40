/// Database layer for TenantFlow
///
/// TenantFlow runs one landlord database (users, tenants) plus one database
/// per tenant (members, projects, tasks, access tokens), all on the same
/// Postgres server.
///
/// # Modules
///
/// - `pool`: Landlord connection pool and shared health checks
/// - `router`: Per-tenant pool registry handing out request-scoped handles
/// - `migrations`: Embedded landlord/tenant schemas and database creation
///
/// # Example
///
/// ```no_run
/// use tenantflow_shared::db::pool::{connect_central, DatabaseConfig};
/// use tenantflow_shared::db::router::{TenantConnections, TenantPoolConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let central = connect_central(&config).await?;
///     tenantflow_shared::db::migrations::run_central_migrations(&central).await?;
///
///     let connections = TenantConnections::from_url(&config.url, TenantPoolConfig::default())?;
///     let acme = connections.connect("db_acme").await?;
///     println!("routed to {}", acme.database());
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
pub mod router;
