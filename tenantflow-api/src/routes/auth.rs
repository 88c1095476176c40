/// Authentication endpoints
///
/// This module provides company registration, member login and logout:
///
/// - `POST /register` - Register a company and its admin (public)
/// - `POST /login` - Log a member in and issue a bearer token (public)
/// - `POST /logout` - Revoke the token used for the request
/// - `POST /logout/all` - Revoke every token of the calling member
///
/// Bearer tokens have the form `{tenant_id}|{member_id}|{secret}` and are
/// valid for 30 days.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tenantflow_shared::{
    auth::resolver::{RegisterCompany, TenantContext},
    models::member::MemberRole,
};
use validator::Validate;

/// Shortest accepted company short code
const SHORT_CODE_MIN: usize = 2;

/// Longest accepted company short code (keeps `db_<code>` well under 63 bytes)
const SHORT_CODE_MAX: usize = 32;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Admin display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Admin email, also the landlord account email
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Company display name
    #[validate(length(min = 1, max = 255, message = "Company name must be 1-255 characters"))]
    pub company_name: String,

    /// Becomes the tenant domain and names its database (`db_<code>`)
    pub company_short_code: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,

    /// Bearer token for the new admin
    pub access_token: String,

    /// Tenant domain
    pub domain: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub role: MemberRole,

    /// Tenant database that served the login
    pub database: String,
}

/// Logout response
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,

    /// Number of tokens revoked (`/logout/all` only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<u64>,
}

/// Lowercases and checks a company short code
///
/// Accepts 2-32 characters from `[a-z0-9_]` after lowercasing.
fn normalize_short_code(raw: &str) -> Result<String, ApiError> {
    let code = raw.trim().to_lowercase();
    let valid = (SHORT_CODE_MIN..=SHORT_CODE_MAX).contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');

    if valid {
        Ok(code)
    } else {
        Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "company_short_code".to_string(),
            message: format!(
                "Short code must be {}-{} characters of a-z, 0-9 or _",
                SHORT_CODE_MIN, SHORT_CODE_MAX
            ),
        }]))
    }
}

/// Register a company
///
/// Creates the landlord user and tenant, provisions the tenant database and
/// seeds its first admin member.
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// {
///   "name": "Alice",
///   "email": "admin@acme.com",
///   "password": "password123",
///   "company_name": "Acme Inc",
///   "company_short_code": "acme"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "Company and Admin registered successfully.",
///   "access_token": "1|1|Xc9kq1bZ...",
///   "domain": "acme"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email or short code already taken
/// - `422 Unprocessable Entity`: Validation failed
/// - `500 Internal Server Error`: Provisioning failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;
    let company_short_code = normalize_short_code(&req.company_short_code)?;

    let outcome = state
        .resolver
        .register_company(RegisterCompany {
            name: req.name,
            email: req.email,
            password: req.password,
            company_name: req.company_name,
            company_short_code,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Company and Admin registered successfully.".to_string(),
            access_token: outcome.token,
            domain: outcome.tenant.domain,
        }),
    ))
}

/// Login
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// { "email": "admin@acme.com", "password": "password123" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
/// - `404 Not Found`: Company inactive, or user owns no company
/// - `422 Unprocessable Entity`: Email has no `@`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state.resolver.login(&req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        access_token: outcome.token,
        role: outcome.role,
        database: outcome.database,
    }))
}

/// Revoke the current token
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<LogoutResponse>> {
    state.resolver.revoke(&ctx).await?;

    Ok(Json(LogoutResponse {
        message: "Logged out successfully.".to_string(),
        revoked: None,
    }))
}

/// Revoke every token of the current member
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<LogoutResponse>> {
    let revoked = state.resolver.revoke_all(&ctx).await?;

    Ok(Json(LogoutResponse {
        message: "Logged out from all devices.".to_string(),
        revoked: Some(revoked),
    }))
}
