/// Database models for TenantFlow
///
/// # Landlord database
///
/// - `user`: People who registered a company
/// - `tenant`: Registered companies and the database each one owns
///
/// # Tenant databases
///
/// - `member`: People who log in to a tenant, with roles
/// - `project`: Projects owned by the tenant
/// - `task`: Tasks within a project
/// - `access_token`: Hashed bearer tokens
///
/// Tenant-database models take the pool from a routed
/// [`TenantDb`](crate::db::router::TenantDb), never the landlord pool.
///
/// # Example
///
/// ```no_run
/// use tenantflow_shared::models::{member::Member, tenant::Tenant};
/// use tenantflow_shared::db::router::TenantConnections;
/// # use sqlx::PgPool;
///
/// # async fn example(central: PgPool, connections: TenantConnections) -> Result<(), Box<dyn std::error::Error>> {
/// let tenant = Tenant::find_by_domain(&central, "acme").await?.ok_or("no such tenant")?;
/// let db = connections.connect(&tenant.database_name).await?;
///
/// let members = Member::list(db.pool(), tenant.id).await?;
/// println!("{} has {} members", tenant.name, members.len());
/// # Ok(())
/// # }
/// ```

pub mod access_token;
pub mod member;
pub mod project;
pub mod task;
pub mod tenant;
pub mod user;
