use actix_web::{get, patch, web, HttpResponse, Responder};
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::services::UserService;

/// Lists every user (admin only). Password hashes are never serialized.
#[get("/users")]
pub async fn get_users(users: web::Data<UserService>) -> Result<impl Responder, AppError> {
    let all = users.fetch_all().await?;
    Ok(HttpResponse::Ok().json(all))
}

#[get("/users/{id}")]
pub async fn get_user(
    users: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let user = users.fetch_by_id(&path).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Grants admin rights to an existing user (admin only).
#[patch("/promote/{id}")]
pub async fn promote_user(
    users: web::Data<UserService>,
    admin: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    users.promote(&path).await?;
    log::debug!("user {} promoted by {}", path.as_str(), admin.username);
    Ok(HttpResponse::Ok().json(json!({ "message": "user promoted successfully" })))
}
