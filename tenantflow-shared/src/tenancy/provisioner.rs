/// Tenant database provisioning
///
/// Provisioning is an explicit step of company registration, never a side
/// effect of inserting a tenant row. It runs three idempotent stages:
///
/// 1. Create the tenant database unless it exists
/// 2. Apply the embedded tenant migrations (advisory-locked by sqlx)
/// 3. Seed the admin member unless one with that email exists
///
/// Repeating [`Provisioner::provision`] for the same tenant, sequentially or
/// concurrently, leaves exactly one database with one schema and one admin.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tenantflow_shared::db::router::TenantConnections;
/// use tenantflow_shared::models::tenant::Tenant;
/// use tenantflow_shared::tenancy::provisioner::{AdminSeed, Provisioner};
/// # use sqlx::PgPool;
///
/// # async fn example(central: PgPool, connections: Arc<TenantConnections>, tenant: Tenant) -> Result<(), Box<dyn std::error::Error>> {
/// let provisioner = Provisioner::new(central, connections);
///
/// let admin = provisioner.provision(&tenant, &AdminSeed {
///     name: "Alice".to_string(),
///     email: "alice@acme.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// assert!(admin.is_admin());
/// # Ok(())
/// # }
/// ```

use sqlx::{migrate::MigrateError, PgPool};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::migrations::{drop_database, ensure_database_exists, run_tenant_migrations};
use crate::db::router::{ConnectionError, TenantConnections, TenantDb};
use crate::models::member::{CreateMember, Member, MemberRole};
use crate::models::tenant::Tenant;
use crate::tenancy::demo::{seed_demo_data, DemoSummary};

/// Failure while provisioning a tenant database
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("failed to create tenant database {database}: {source}")]
    CreateDatabase {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("failed to migrate tenant database {database}: {source}")]
    Schema {
        database: String,
        #[source]
        source: MigrateError,
    },

    #[error("failed to seed {database}: {source}")]
    Seed {
        database: String,
        #[source]
        source: sqlx::Error,
    },
}

/// First admin member of a new tenant
///
/// Copied from the registering user, so the same credentials work for both.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Outcome of [`Provisioner::reconcile_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Tenants whose schema is now current
    pub migrated: usize,

    /// Database names that could not be brought up to date
    pub failed: Vec<String>,
}

/// Outcome of [`Provisioner::seed_demo_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Tenants that now carry demo data
    pub seeded: usize,

    /// Database names that could not be seeded
    pub failed: Vec<String>,
}

/// Creates and migrates tenant databases
#[derive(Debug, Clone)]
pub struct Provisioner {
    central: PgPool,
    connections: Arc<TenantConnections>,
}

impl Provisioner {
    pub fn new(central: PgPool, connections: Arc<TenantConnections>) -> Self {
        Self {
            central,
            connections,
        }
    }

    /// Provisions the tenant database and returns the admin member
    ///
    /// If this call created the database and a later stage fails, the
    /// database is dropped again (best-effort) so a retried registration
    /// starts clean.
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisioningError`] naming the stage that failed.
    pub async fn provision(
        &self,
        tenant: &Tenant,
        admin: &AdminSeed,
    ) -> Result<Member, ProvisioningError> {
        let database = tenant.database_name.as_str();
        let created = self.create_database(database).await?;

        let result = match self.migrate(database).await {
            Ok(db) => self.seed_admin(&db, tenant.id, admin).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(member) => {
                info!(
                    tenant_id = tenant.id,
                    database,
                    created,
                    admin_id = member.id,
                    "Tenant provisioned"
                );
                Ok(member)
            }
            Err(e) => {
                error!(tenant_id = tenant.id, database, error = %e, "Tenant provisioning failed");
                if created {
                    self.discard(database).await;
                }
                Err(e)
            }
        }
    }

    /// Brings every registered tenant's schema up to date
    ///
    /// Failures are logged per tenant and reported; they do not stop the run.
    ///
    /// # Errors
    ///
    /// Returns an error only if the tenant list cannot be read.
    pub async fn reconcile_all(&self) -> Result<ReconcileReport, sqlx::Error> {
        let tenants = Tenant::list(&self.central).await?;
        let mut report = ReconcileReport::default();

        for tenant in &tenants {
            let database = tenant.database_name.as_str();
            let outcome = match self.create_database(database).await {
                Ok(_) => self.migrate(database).await.map(|_| ()),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => report.migrated += 1,
                Err(e) => {
                    error!(tenant_id = tenant.id, database, error = %e, "Tenant schema reconcile failed");
                    report.failed.push(tenant.database_name.clone());
                }
            }
        }

        info!(
            total = tenants.len(),
            migrated = report.migrated,
            failed = report.failed.len(),
            "Tenant schemas reconciled"
        );
        Ok(report)
    }

    /// Seeds demo data into every active tenant
    ///
    /// Intended for development installs. Inactive tenants are skipped, as are
    /// tenants whose database is missing or behind; run
    /// [`Provisioner::reconcile_all`] first.
    ///
    /// # Errors
    ///
    /// Returns an error only if the tenant list cannot be read.
    pub async fn seed_demo_all(&self, password_hash: &str) -> Result<SeedReport, sqlx::Error> {
        let tenants = Tenant::list(&self.central).await?;
        let mut report = SeedReport::default();

        for tenant in tenants.iter().filter(|tenant| tenant.is_active) {
            match self.seed_demo(tenant, password_hash).await {
                Ok(_) => report.seeded += 1,
                Err(e) => {
                    error!(
                        tenant_id = tenant.id,
                        database = %tenant.database_name,
                        error = %e,
                        "Demo seeding failed"
                    );
                    report.failed.push(tenant.database_name.clone());
                }
            }
        }

        info!(
            seeded = report.seeded,
            failed = report.failed.len(),
            "Demo data seeding finished"
        );
        Ok(report)
    }

    /// Seeds demo data into one provisioned tenant
    ///
    /// # Errors
    ///
    /// `Connection` if the tenant database cannot be reached, `Seed` if a
    /// write fails.
    pub async fn seed_demo(
        &self,
        tenant: &Tenant,
        password_hash: &str,
    ) -> Result<DemoSummary, ProvisioningError> {
        let db = self.connections.connect(&tenant.database_name).await?;

        seed_demo_data(&db, tenant, password_hash)
            .await
            .map_err(|source| ProvisioningError::Seed {
                database: tenant.database_name.clone(),
                source,
            })
    }

    /// Evicts and drops a tenant database, logging failures
    pub async fn discard(&self, database: &str) {
        self.connections.evict(database).await;
        if let Err(e) = drop_database(&self.central, database).await {
            warn!(database, error = %e, "Failed to drop tenant database");
        }
    }

    async fn create_database(&self, database: &str) -> Result<bool, ProvisioningError> {
        ensure_database_exists(&self.central, database)
            .await
            .map_err(|source| ProvisioningError::CreateDatabase {
                database: database.to_string(),
                source,
            })
    }

    async fn migrate(&self, database: &str) -> Result<TenantDb, ProvisioningError> {
        let db = self.connections.connect(database).await?;

        run_tenant_migrations(db.pool())
            .await
            .map_err(|source| ProvisioningError::Schema {
                database: database.to_string(),
                source,
            })?;

        Ok(db)
    }

    async fn seed_admin(
        &self,
        db: &TenantDb,
        tenant_id: i64,
        admin: &AdminSeed,
    ) -> Result<Member, ProvisioningError> {
        Member::create_if_absent(
            db.pool(),
            CreateMember {
                tenant_id,
                name: admin.name.clone(),
                email: admin.email.clone(),
                password_hash: admin.password_hash.clone(),
                role: MemberRole::Admin,
            },
        )
        .await
        .map_err(|source| ProvisioningError::Seed {
            database: db.database().to_string(),
            source,
        })
    }
}
