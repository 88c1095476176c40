/// Task endpoints (tenant database)
///
/// Every route is nested under a project, which must belong to the caller's
/// tenant before any task query runs.
///
/// - `POST /projects/:project_id/tasks` - Create a task (admin)
/// - `GET /projects/:project_id/tasks/:id` - Show a task
/// - `PUT /projects/:project_id/tasks/:id` - Update a task (admin)
/// - `DELETE /projects/:project_id/tasks/:id` - Delete a task (admin)

use super::projects::{find_project, require_admin, MessageResponse};
use crate::error::{ApiError, ApiResult};
use axum::{extract::Path, http::StatusCode, Extension, Json};
use serde::Deserialize;
use tenantflow_shared::{
    auth::resolver::TenantContext,
    models::task::{Task, UpdateTask},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Estimated duration; defaults to 0
    #[validate(range(min = 0, message = "Duration must not be negative"))]
    pub duration: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 0, message = "Duration must not be negative"))]
    pub duration: Option<i32>,
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

pub async fn create_task(
    Extension(ctx): Extension<TenantContext>,
    Path(project_id): Path<i64>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    require_admin(&ctx)?;
    req.validate()?;

    let project = find_project(&ctx, project_id).await?;
    let task = Task::create(
        ctx.db.pool(),
        project.id,
        req.name.trim(),
        req.duration.unwrap_or(0),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn show_task(
    Extension(ctx): Extension<TenantContext>,
    Path((project_id, id)): Path<(i64, i64)>,
) -> ApiResult<Json<Task>> {
    let project = find_project(&ctx, project_id).await?;
    let task = Task::find(ctx.db.pool(), project.id, id)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task))
}

pub async fn update_task(
    Extension(ctx): Extension<TenantContext>,
    Path((project_id, id)): Path<(i64, i64)>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    require_admin(&ctx)?;
    req.validate()?;

    let project = find_project(&ctx, project_id).await?;
    let task = Task::update(
        ctx.db.pool(),
        project.id,
        id,
        UpdateTask {
            name: req.name.map(|name| name.trim().to_string()),
            duration: req.duration,
        },
    )
    .await?
    .ok_or_else(task_not_found)?;

    Ok(Json(task))
}

pub async fn delete_task(
    Extension(ctx): Extension<TenantContext>,
    Path((project_id, id)): Path<(i64, i64)>,
) -> ApiResult<Json<MessageResponse>> {
    require_admin(&ctx)?;

    let project = find_project(&ctx, project_id).await?;
    if !Task::delete(ctx.db.pool(), project.id, id).await? {
        return Err(task_not_found());
    }

    Ok(Json(MessageResponse {
        message: "Task deleted successfully.".to_string(),
    }))
}
