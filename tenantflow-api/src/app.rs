/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use tenantflow_api::{app::{build_router, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::connect(config).await?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::tenant_auth::tenant_auth, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tenantflow_shared::{
    auth::{
        password::{Argon2Hasher, CredentialHasher},
        resolver::AuthResolver,
    },
    db::{
        migrations::run_central_migrations,
        pool::connect_central,
        router::TenantConnections,
    },
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Landlord database pool
    pub db: PgPool,

    /// Login, token validation and registration
    pub resolver: Arc<AuthResolver>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state around an open landlord pool
    pub fn new(
        db: PgPool,
        connections: Arc<TenantConnections>,
        hasher: Arc<dyn CredentialHasher>,
        config: Config,
    ) -> Self {
        let resolver = AuthResolver::new(db.clone(), connections, hasher);
        Self {
            db,
            resolver: Arc::new(resolver),
            config: Arc::new(config),
        }
    }

    /// Opens the landlord pool, applies landlord migrations and builds the
    /// tenant router and hasher from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the landlord database is unreachable, a migration
    /// fails or the hashing parameters are invalid.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let db = connect_central(&config.database).await?;
        run_central_migrations(&db).await?;

        let connections = Arc::new(TenantConnections::from_url(
            &config.database.url,
            config.tenant_pool.clone(),
        )?);
        let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new(config.hasher)?);

        Ok(Self::new(db, connections, hasher, config))
    }

    /// Tenant connection router
    pub fn connections(&self) -> &Arc<TenantConnections> {
        self.resolver.connections()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                       # Health check (public)
/// ├── POST /register                     # Register company + admin (public)
/// ├── POST /login                        # Member login (public)
/// └── (bearer token required)
///     ├── POST /logout
///     ├── POST /logout/all
///     ├── GET|POST          /members
///     ├── GET|PUT|DELETE    /members/:id
///     ├── GET|POST          /projects
///     ├── GET|PUT|DELETE    /projects/:id
///     ├── POST              /projects/:project_id/tasks
///     └── GET|PUT|DELETE    /projects/:project_id/tasks/:id
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Tenant authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let tenant_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/logout/all", post(routes::auth::logout_all))
        .route(
            "/members",
            get(routes::members::list_members).post(routes::members::create_member),
        )
        .route(
            "/members/:id",
            get(routes::members::show_member)
                .put(routes::members::update_member)
                .delete(routes::members::delete_member),
        )
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::show_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/projects/:project_id/tasks", post(routes::tasks::create_task))
        .route(
            "/projects/:project_id/tasks/:id",
            get(routes::tasks::show_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(state.clone(), tenant_auth));

    Router::new()
        .merge(public_routes)
        .merge(tenant_routes)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.is_empty() {
        // Development mode: any origin, no credentials
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([
            crate::middleware::tenant_auth::X_TENANT_ID,
            crate::middleware::tenant_auth::X_MEMBER_ID,
            crate::middleware::tenant_auth::X_DB_NAME,
        ])
        .max_age(std::time::Duration::from_secs(3600))
}
