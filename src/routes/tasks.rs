use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, UpdateOutcome},
    services::TaskService,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Lists every task.
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks, possibly empty.
/// - `401 Unauthorized`: missing or invalid session cookie.
#[get("")]
pub async fn get_tasks(tasks: web::Data<TaskService>) -> Result<impl Responder, AppError> {
    let all = tasks.fetch_all().await?;
    Ok(HttpResponse::Ok().json(all))
}

/// Fetches one task by id.
///
/// ## Responses:
/// - `200 OK`: the task.
/// - `400 Bad Request`: malformed id.
/// - `404 Not Found`: no task with that id.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = tasks.fetch_by_id(&path).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Creates a task (admin only).
///
/// ## Responses:
/// - `201 Created`: the stored task with its new id.
/// - `400 Bad Request`: invalid body, unknown status or a due date in the past.
#[post("/tasks")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    body: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let task = tasks.create(body.into_inner()).await?;
    log::debug!("task {} created by {}", task.id, user.username);
    Ok(HttpResponse::Created().json(task))
}

/// Replaces every field of a task (admin only).
///
/// Replacing a task with the values it already has still succeeds, with a
/// `"no changes were made"` message wrapped around the task.
#[put("/tasks/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let id = path.into_inner();
    let response = match tasks.update(&id, body.into_inner()).await? {
        UpdateOutcome::Modified(task) => HttpResponse::Ok().json(task),
        UpdateOutcome::Unchanged(task) => HttpResponse::Ok().json(json!({
            "message": "no changes were made",
            "data": task,
        })),
    };
    log::debug!("task {} replaced by {}", id, user.username);
    Ok(response)
}

/// Deletes a task (admin only).
#[delete("/tasks/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    tasks.delete(&path).await?;
    log::debug!("task {} deleted by {}", path.as_str(), user.username);
    Ok(HttpResponse::Ok().json(json!({ "message": "task deleted successfully" })))
}
