/// Project endpoints (tenant database)
///
/// - `GET /projects` - List projects
/// - `POST /projects` - Create a project (admin)
/// - `GET /projects/:id` - Show a project with its tasks
/// - `PUT /projects/:id` - Rename a project (admin)
/// - `DELETE /projects/:id` - Delete a project and its tasks (admin)

use crate::error::{ApiError, ApiResult};
use axum::{extract::Path, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tenantflow_shared::{
    auth::resolver::TenantContext,
    models::{project::Project, task::Task},
};
use validator::Validate;

/// Create or rename request
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
}

/// Project with its tasks
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn require_admin(ctx: &TenantContext) -> ApiResult<()> {
    if ctx.member.role.can_manage_projects() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Unauthorized".to_string()))
    }
}

/// Loads a project of the caller's tenant or fails with 404
pub(crate) async fn find_project(ctx: &TenantContext, id: i64) -> ApiResult<Project> {
    Project::find(ctx.db.pool(), ctx.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

pub async fn list_projects(
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<ProjectListResponse>> {
    let projects = Project::list(ctx.db.pool(), ctx.tenant_id).await?;
    Ok(Json(ProjectListResponse { projects }))
}

pub async fn create_project(
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    require_admin(&ctx)?;
    req.validate()?;

    let project = Project::create(ctx.db.pool(), ctx.tenant_id, req.name.trim()).await?;
    tracing::info!(tenant_id = ctx.tenant_id, project_id = project.id, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn show_project(
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProjectDetail>> {
    let project = find_project(&ctx, id).await?;
    let tasks = Task::list_for_project(ctx.db.pool(), project.id).await?;

    Ok(Json(ProjectDetail { project, tasks }))
}

pub async fn update_project(
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<Json<Project>> {
    require_admin(&ctx)?;
    req.validate()?;

    let project = Project::rename(ctx.db.pool(), ctx.tenant_id, id, req.name.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Deletes the project; its tasks go with it
pub async fn delete_project(
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    require_admin(&ctx)?;

    if !Project::delete(ctx.db.pool(), ctx.tenant_id, id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }
    tracing::info!(tenant_id = ctx.tenant_id, project_id = id, "Project deleted");

    Ok(Json(MessageResponse {
        message: "Project deleted successfully.".to_string(),
    }))
}
