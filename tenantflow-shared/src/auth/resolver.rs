/// Tenant-aware authentication
///
/// [`AuthResolver`] ties the landlord registry, the connection router and the
/// token codec together:
///
/// - **login**: email domain → tenant → tenant database → member → new token
/// - **authenticate**: bearer token → tenant → tenant database → stored token
///   → member, producing a [`TenantContext`] for the request
/// - **revoke / revoke_all**: logout
/// - **register_company**: user + tenant + provisioned database + admin token
///
/// Nothing here falls back to a default tenant or principal. Every failure is
/// an [`AuthError`] variant the API maps to a stable status and message.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tenantflow_shared::auth::password::{Argon2Hasher, HasherConfig};
/// use tenantflow_shared::auth::resolver::AuthResolver;
/// use tenantflow_shared::db::router::{TenantConnections, TenantPoolConfig};
/// # use sqlx::PgPool;
///
/// # async fn example(central: PgPool, url: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let connections = Arc::new(TenantConnections::from_url(url, TenantPoolConfig::default())?);
/// let hasher = Arc::new(Argon2Hasher::new(HasherConfig::default())?);
/// let resolver = AuthResolver::new(central, connections, hasher);
///
/// let login = resolver.login("alice@acme.com", "password123").await?;
/// let ctx = resolver.authenticate(Some(&login.token)).await?;
/// assert_eq!(ctx.member.id, login.member.id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::password::{CredentialHasher, PasswordError};
use super::token::{CompositeToken, WILDCARD_ABILITY};
use crate::db::router::{ConnectionError, TenantConnections, TenantDb};
use crate::models::access_token::{AccessToken, CreateAccessToken, PrincipalKind};
use crate::models::member::{Member, MemberRole};
use crate::models::tenant::{CreateTenant, Tenant};
use crate::models::user::{CreateUser, User};
use crate::tenancy::provisioner::{AdminSeed, Provisioner, ProvisioningError};

/// Lifetime of tokens issued at login and registration
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Name recorded on issued tokens
pub const TOKEN_NAME: &str = "auth_token";

/// SQLSTATE for `query_canceled` (raised when `statement_timeout` fires)
const QUERY_CANCELED: &str = "57014";

/// Authentication failure
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid email format")]
    InvalidEmailFormat,

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error("invalid tenant")]
    InvalidTenant,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("company is inactive")]
    TenantInactive,

    #[error("user has no tenant associated")]
    NoTenantAssociated,

    /// Missing bearer or missing principal; the message is returned to clients
    #[error("{0}")]
    Unauthorized(&'static str),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("tenant query timed out")]
    QueryTimeout,

    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // Pool acquisition after routing and server-side cancellation both
            // mean the tenant database is overloaded.
            sqlx::Error::PoolTimedOut => Self::QueryTimeout,
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some(QUERY_CANCELED) => {
                Self::QueryTimeout
            }
            other => Self::Database(other),
        }
    }
}

/// Authenticated request scope
///
/// Built once per request by [`AuthResolver::authenticate`]; handlers query
/// the tenant database only through `db`.
#[derive(Debug, Clone)]
pub struct TenantContext {
    /// Authenticated member
    pub member: Member,

    /// Tenant named by the token
    pub tenant_id: i64,

    /// Routed tenant database
    pub db: TenantDb,

    /// ID of the access token used for this request
    pub token_id: i64,

    token_hash: String,
}

impl TenantContext {
    /// Name of the tenant database serving this request
    pub fn database(&self) -> &str {
        self.db.database()
    }

    pub fn is_admin(&self) -> bool {
        self.member.is_admin()
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Plaintext bearer token, shown once
    pub token: String,

    pub role: MemberRole,

    /// Tenant database name
    pub database: String,

    pub member: Member,
}

/// Input for [`AuthResolver::register_company`]
#[derive(Debug, Clone)]
pub struct RegisterCompany {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company_name: String,
    pub company_short_code: String,
}

/// Result of a successful registration
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    /// Plaintext bearer token for the admin member, shown once
    pub token: String,

    pub tenant: Tenant,

    /// Admin member seeded into the new tenant database
    pub member: Member,
}

/// Derives the tenant domain from an email address
///
/// The domain is the part after `@` and before the first `.`, lowercased:
/// `Alice@ACME.com` → `acme`.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmailFormat` if the email contains no `@`.
pub fn derive_domain(email: &str) -> Result<String, AuthError> {
    let (_, host) = email.split_once('@').ok_or(AuthError::InvalidEmailFormat)?;
    let domain = host.split('.').next().unwrap_or_default();
    Ok(domain.to_lowercase())
}

/// Canonical form of an email address: trimmed and lowercased
///
/// Users and members are stored and looked up in this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Resolves credentials and bearer tokens to tenant-scoped principals
#[derive(Clone)]
pub struct AuthResolver {
    central: PgPool,
    connections: Arc<TenantConnections>,
    hasher: Arc<dyn CredentialHasher>,
    provisioner: Provisioner,
}

impl std::fmt::Debug for AuthResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResolver").finish_non_exhaustive()
    }
}

impl AuthResolver {
    pub fn new(
        central: PgPool,
        connections: Arc<TenantConnections>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        let provisioner = Provisioner::new(central.clone(), connections.clone());
        Self {
            central,
            connections,
            hasher,
            provisioner,
        }
    }

    /// Landlord pool
    pub fn central(&self) -> &PgPool {
        &self.central
    }

    /// Tenant connection router
    pub fn connections(&self) -> &Arc<TenantConnections> {
        &self.connections
    }

    pub fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }

    pub fn hasher(&self) -> &Arc<dyn CredentialHasher> {
        &self.hasher
    }

    /// Logs a member in by email and password
    ///
    /// The tenant is found from the email domain; failing that, from the
    /// landlord user with that email.
    ///
    /// # Errors
    ///
    /// - `InvalidEmailFormat` if the email has no `@`
    /// - `InvalidCredentials` for unknown users/members or wrong passwords
    /// - `NoTenantAssociated` if the landlord user owns no tenant
    /// - `TenantInactive` if the tenant is deactivated
    /// - `Connection` if the tenant database cannot be reached
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = normalize_email(email);
        let email = email.as_str();
        let domain = derive_domain(email)?;

        let tenant = match Tenant::find_by_domain(&self.central, &domain).await? {
            Some(tenant) => tenant,
            None => {
                debug!(domain = %domain, "No tenant for email domain, trying landlord user");
                let user = User::find_by_email(&self.central, email)
                    .await?
                    .ok_or(AuthError::InvalidCredentials)?;

                if !self.hasher.verify(password, &user.password_hash)? {
                    return Err(AuthError::InvalidCredentials);
                }

                Tenant::find_by_user(&self.central, user.id)
                    .await?
                    .ok_or(AuthError::NoTenantAssociated)?
            }
        };

        if !tenant.is_active {
            return Err(AuthError::TenantInactive);
        }

        let db = self.route(&tenant).await?;

        let member = Member::find_by_email(db.pool(), email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(password, &member.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&db, tenant.id, member.id).await?;

        info!(
            tenant_id = tenant.id,
            member_id = member.id,
            database = db.database(),
            "Member logged in"
        );

        Ok(LoginOutcome {
            token: token.to_string(),
            role: member.role,
            database: tenant.database_name,
            member,
        })
    }

    /// Validates a bearer token and builds the request's [`TenantContext`]
    ///
    /// `bearer` is the raw token without the `Bearer ` prefix. Expired tokens
    /// are deleted as they are encountered.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if no token was sent or the member no longer exists
    /// - `InvalidTokenFormat` if the token does not decode
    /// - `InvalidTenant` if the tenant does not exist
    /// - `InvalidToken` if no stored token matches hash and principal
    /// - `TokenExpired` if the token is past `expires_at`
    /// - `Connection` / `QueryTimeout` if the tenant database misbehaves
    pub async fn authenticate(&self, bearer: Option<&str>) -> Result<TenantContext, AuthError> {
        let raw = bearer
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(AuthError::Unauthorized("Unauthorized - No token provided"))?;

        let token = CompositeToken::decode(raw).map_err(|_| AuthError::InvalidTokenFormat)?;

        let tenant = Tenant::find_by_id(&self.central, token.tenant_id)
            .await?
            .ok_or(AuthError::InvalidTenant)?;

        let db = self.route(&tenant).await?;

        let token_hash = token.hash();
        let stored = AccessToken::find_for_principal(
            db.pool(),
            &token_hash,
            PrincipalKind::Member,
            token.principal_id,
        )
        .await?
        .ok_or(AuthError::InvalidToken)?;

        if stored.is_expired() {
            AccessToken::delete(db.pool(), stored.id).await?;
            debug!(token_id = stored.id, tenant_id = tenant.id, "Reaped expired token");
            return Err(AuthError::TokenExpired);
        }

        if let Err(e) = AccessToken::touch(db.pool(), stored.id).await {
            warn!(token_id = stored.id, error = %e, "Failed to record token use");
        }

        let member = Member::find_by_id(db.pool(), token.principal_id)
            .await?
            .ok_or(AuthError::Unauthorized("Member not found"))?;

        if member.tenant_id != tenant.id {
            warn!(
                member_id = member.id,
                member_tenant_id = member.tenant_id,
                token_tenant_id = tenant.id,
                "Member belongs to a different tenant"
            );
            return Err(AuthError::Unauthorized("Member not found"));
        }

        Ok(TenantContext {
            member,
            tenant_id: tenant.id,
            db,
            token_id: stored.id,
            token_hash,
        })
    }

    /// Revokes the token used for the current request
    ///
    /// Returns true if the token still existed.
    pub async fn revoke(&self, ctx: &TenantContext) -> Result<bool, AuthError> {
        let revoked = AccessToken::delete_by_hash(ctx.db.pool(), &ctx.token_hash).await?;
        info!(member_id = ctx.member.id, tenant_id = ctx.tenant_id, "Token revoked");
        Ok(revoked)
    }

    /// Revokes every token of the current member
    ///
    /// Returns the number of tokens deleted.
    pub async fn revoke_all(&self, ctx: &TenantContext) -> Result<u64, AuthError> {
        let count =
            AccessToken::delete_for_principal(ctx.db.pool(), PrincipalKind::Member, ctx.member.id)
                .await?;
        info!(
            member_id = ctx.member.id,
            tenant_id = ctx.tenant_id,
            count,
            "All member tokens revoked"
        );
        Ok(count)
    }

    /// Registers a company: landlord user, tenant, tenant database, admin member
    ///
    /// The user and tenant rows are committed first with the tenant inactive,
    /// so no landlord connection is held while the database is provisioned.
    /// The tenant is activated once its admin exists. If provisioning or
    /// activation fails, both rows are deleted again and a database created
    /// by this call is dropped.
    ///
    /// # Errors
    ///
    /// - `Database` with a unique violation if the email or short code is taken
    /// - `Provisioning` if the tenant database could not be set up
    pub async fn register_company(
        &self,
        input: RegisterCompany,
    ) -> Result<RegistrationOutcome, AuthError> {
        let email = normalize_email(&input.email);
        let password_hash = self.hasher.hash(&input.password)?;

        let (user, tenant) = {
            let mut tx = self.central.begin().await?;

            let user = User::create(
                &mut *tx,
                CreateUser {
                    name: input.name.clone(),
                    email: email.clone(),
                    password_hash: password_hash.clone(),
                },
            )
            .await?;

            let tenant = Tenant::create(
                &mut *tx,
                CreateTenant::for_short_code(input.company_name, &input.company_short_code, user.id),
            )
            .await?;

            tx.commit().await?;
            (user, tenant)
        };

        let seed = AdminSeed {
            name: input.name,
            email,
            password_hash,
        };

        let member = match self.provisioner.provision(&tenant, &seed).await {
            Ok(member) => member,
            Err(e) => {
                self.forget_registration(&user, &tenant).await;
                return Err(e.into());
            }
        };

        let tenant = match Tenant::set_active(&self.central, tenant.id, true).await {
            Ok(Some(active)) => active,
            Ok(None) => return Err(AuthError::InvalidTenant),
            Err(e) => {
                error!(tenant_id = tenant.id, error = %e, "Failed to activate tenant");
                self.provisioner.discard(&tenant.database_name).await;
                self.forget_registration(&user, &tenant).await;
                return Err(e.into());
            }
        };

        let db = self.route(&tenant).await?;
        let token = self.issue_token(&db, tenant.id, member.id).await?;

        info!(
            tenant_id = tenant.id,
            domain = %tenant.domain,
            admin_id = member.id,
            "Company registered"
        );

        Ok(RegistrationOutcome {
            token: token.to_string(),
            tenant,
            member,
        })
    }

    /// Deletes the landlord rows of a registration that did not complete
    async fn forget_registration(&self, user: &User, tenant: &Tenant) {
        match self.delete_registration_rows(user.id, tenant.id).await {
            Ok(()) => warn!(tenant_id = tenant.id, user_id = user.id, "Registration rolled back"),
            Err(e) => error!(
                tenant_id = tenant.id,
                user_id = user.id,
                error = %e,
                "Failed to remove rows of an incomplete registration"
            ),
        }
    }

    async fn delete_registration_rows(&self, user_id: i64, tenant_id: i64) -> Result<(), sqlx::Error> {
        let mut tx = self.central.begin().await?;
        Tenant::delete(&mut *tx, tenant_id).await?;
        User::delete(&mut *tx, user_id).await?;
        tx.commit().await
    }

    async fn route(&self, tenant: &Tenant) -> Result<TenantDb, AuthError> {
        self.connections
            .connect(&tenant.database_name)
            .await
            .map_err(|e| {
                error!(
                    tenant_id = tenant.id,
                    database = %tenant.database_name,
                    error = %e,
                    "Failed to route to tenant database"
                );
                AuthError::Connection(e)
            })
    }

    async fn issue_token(
        &self,
        db: &TenantDb,
        tenant_id: i64,
        member_id: i64,
    ) -> Result<CompositeToken, AuthError> {
        let token = CompositeToken::issue(tenant_id, member_id);

        AccessToken::create(
            db.pool(),
            CreateAccessToken {
                principal_type: PrincipalKind::Member,
                principal_id: member_id,
                name: TOKEN_NAME.to_string(),
                token_hash: token.hash(),
                abilities: vec![WILDCARD_ABILITY.to_string()],
                expires_at: Some(Utc::now() + Duration::days(TOKEN_TTL_DAYS)),
            },
        )
        .await?;

        Ok(token)
    }
}
