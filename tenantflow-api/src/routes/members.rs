/// Member management endpoints (tenant database)
///
/// - `GET /members` - List members (any member)
/// - `POST /members` - Create a member (admin)
/// - `GET /members/:id` - Show a member (admin or self)
/// - `PUT /members/:id` - Update a member (admin or self; only admins change email or role)
/// - `DELETE /members/:id` - Delete a member and revoke their tokens (admin)
///
/// Member emails always live under the tenant's domain: the local part of
/// the submitted address is kept and the host becomes `<domain>.com`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tenantflow_shared::{
    auth::resolver::{derive_domain, TenantContext},
    models::{
        access_token::{AccessToken, PrincipalKind},
        member::{CreateMember, Member, MemberRole, UpdateMember},
        tenant::Tenant,
    },
};
use validator::Validate;

/// Create member request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Full address or bare local part; the host is replaced by the tenant's
    #[validate(length(min = 1, max = 255, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Defaults to `member`
    pub role: Option<MemberRole>,
}

/// Update member request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Email must not be empty"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    pub role: Option<MemberRole>,
}

/// Member list response
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberListResponse {
    pub members: Vec<Member>,
}

/// Delete member response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteMemberResponse {
    pub message: String,

    /// Tokens revoked along with the member
    pub revoked_tokens: u64,
}

fn forbidden() -> ApiError {
    ApiError::Forbidden("Unauthorized".to_string())
}

fn member_not_found() -> ApiError {
    ApiError::NotFound("Member not found".to_string())
}

/// Rewrites `email` to `<local part>@<domain>.com`
fn tenant_email(email: &str, domain: &str) -> Result<String, ApiError> {
    let local = email.split('@').next().unwrap_or_default().trim();
    if local.is_empty() {
        return Err(ApiError::Unprocessable("Invalid email format".to_string()));
    }
    Ok(format!("{}@{}.com", local.to_lowercase(), domain))
}

/// Domain of the caller's tenant, falling back to the caller's own email
async fn tenant_domain(state: &AppState, ctx: &TenantContext) -> ApiResult<String> {
    match Tenant::find_by_id(state.resolver.central(), ctx.tenant_id).await? {
        Some(tenant) => Ok(tenant.domain),
        None => Ok(derive_domain(&ctx.member.email)?),
    }
}

/// Loads a member of the caller's tenant
async fn find_member(ctx: &TenantContext, id: i64) -> ApiResult<Member> {
    Member::find_by_id(ctx.db.pool(), id)
        .await?
        .filter(|member| member.tenant_id == ctx.tenant_id)
        .ok_or_else(member_not_found)
}

/// List members
pub async fn list_members(
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<MemberListResponse>> {
    let members = Member::list(ctx.db.pool(), ctx.tenant_id).await?;
    Ok(Json(MemberListResponse { members }))
}

/// Create a member
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<CreateMemberRequest>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    if !ctx.member.role.can_manage_members() {
        return Err(forbidden());
    }
    req.validate()?;

    let domain = tenant_domain(&state, &ctx).await?;
    let email = tenant_email(&req.email, &domain)?;
    let password_hash = state.resolver.hasher().hash(&req.password)?;

    let member = Member::create(
        ctx.db.pool(),
        CreateMember {
            tenant_id: ctx.tenant_id,
            name: req.name,
            email,
            password_hash,
            role: req.role.unwrap_or(MemberRole::Member),
        },
    )
    .await?;

    tracing::info!(
        tenant_id = ctx.tenant_id,
        member_id = member.id,
        created_by = ctx.member.id,
        "Member created"
    );

    Ok((StatusCode::CREATED, Json(member)))
}

/// Show a member
pub async fn show_member(
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Member>> {
    if !ctx.is_admin() && ctx.member.id != id {
        return Err(forbidden());
    }
    Ok(Json(find_member(&ctx, id).await?))
}

/// Update a member
///
/// Members may change their own name and password. Email and role changes
/// require an admin.
pub async fn update_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMemberRequest>,
) -> ApiResult<Json<Member>> {
    let is_admin = ctx.member.role.can_change_identity();
    if !is_admin && ctx.member.id != id {
        return Err(forbidden());
    }
    if !is_admin && (req.email.is_some() || req.role.is_some()) {
        return Err(forbidden());
    }
    req.validate()?;

    find_member(&ctx, id).await?;

    let email = match req.email {
        Some(email) => {
            let domain = tenant_domain(&state, &ctx).await?;
            Some(tenant_email(&email, &domain)?)
        }
        None => None,
    };
    let password_hash = match req.password {
        Some(password) => Some(state.resolver.hasher().hash(&password)?),
        None => None,
    };

    let member = Member::update(
        ctx.db.pool(),
        id,
        UpdateMember {
            name: req.name,
            email,
            password_hash,
            role: req.role,
        },
    )
    .await?
    .ok_or_else(member_not_found)?;

    Ok(Json(member))
}

/// Delete a member and revoke all of their tokens
pub async fn delete_member(
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteMemberResponse>> {
    if !ctx.member.role.can_manage_members() {
        return Err(forbidden());
    }

    find_member(&ctx, id).await?;

    let revoked_tokens =
        AccessToken::delete_for_principal(ctx.db.pool(), PrincipalKind::Member, id).await?;
    if !Member::delete(ctx.db.pool(), id).await? {
        return Err(member_not_found());
    }

    tracing::info!(
        tenant_id = ctx.tenant_id,
        member_id = id,
        deleted_by = ctx.member.id,
        revoked_tokens,
        "Member deleted"
    );

    Ok(Json(DeleteMemberResponse {
        message: "Member deleted successfully.".to_string(),
        revoked_tokens,
    }))
}
