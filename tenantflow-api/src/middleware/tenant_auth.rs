/// Tenant authentication middleware
///
/// Extracts the bearer token from the `Authorization` header, resolves it with
/// [`AuthResolver::authenticate`](tenantflow_shared::auth::resolver::AuthResolver::authenticate)
/// and inserts the resulting [`TenantContext`] into request extensions.
/// Handlers read it with `Extension<TenantContext>` and query only its `db`.
///
/// Successful responses carry diagnostic headers naming the tenant, the
/// member and the tenant database that served the request.
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Extension, Router};
/// use tenantflow_api::{app::AppState, middleware::tenant_auth::tenant_auth};
/// use tenantflow_shared::auth::resolver::TenantContext;
///
/// async fn whoami(Extension(ctx): Extension<TenantContext>) -> String {
///     format!("member {} of tenant {}", ctx.member.id, ctx.tenant_id)
/// }
///
/// # fn example(state: AppState) -> Router {
/// Router::new()
///     .route("/whoami", get(whoami))
///     .layer(axum::middleware::from_fn_with_state(state.clone(), tenant_auth))
///     .with_state(state)
/// # }
/// ```

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tenantflow_shared::auth::resolver::TenantContext;

use crate::{app::AppState, error::ApiError};

pub const X_TENANT_ID: HeaderName = HeaderName::from_static("x-tenant-id");
pub const X_MEMBER_ID: HeaderName = HeaderName::from_static("x-member-id");
pub const X_DB_NAME: HeaderName = HeaderName::from_static("x-db-name");

/// Returns the token from `Authorization: Bearer <token>`, if any
pub fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Authenticates the request against its tenant database
pub async fn tenant_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: TenantContext = state.resolver.authenticate(bearer_token(&req)).await?;

    let tenant_id = HeaderValue::from(ctx.tenant_id);
    let member_id = HeaderValue::from(ctx.member.id);
    let database = HeaderValue::from_str(ctx.database()).ok();

    tracing::debug!(
        tenant_id = ctx.tenant_id,
        member_id = ctx.member.id,
        database = ctx.database(),
        "Request authenticated"
    );

    req.extensions_mut().insert(ctx);
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert(X_TENANT_ID, tenant_id);
    headers.insert(X_MEMBER_ID, member_id);
    if let Some(database) = database {
        headers.insert(X_DB_NAME, database);
    }

    Ok(response)
}
