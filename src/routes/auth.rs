use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

use crate::auth::session_cookie;
use crate::error::{AppError, DomainError};
use crate::models::Credentials;
use crate::services::UserService;

/// Register a new user
///
/// The first account ever registered is an admin. Responds with
/// `201 {"message": ..., "data": user}`.
#[post("/register")]
pub async fn register(
    users: web::Data<UserService>,
    body: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let user = users.register(&body.username, &body.password).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "user created successfully",
        "data": user,
    })))
}

/// Login user
///
/// Responds with the user and sets the `Authentication` session cookie.
#[post("/login")]
pub async fn login(
    users: web::Data<UserService>,
    body: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let outcome = users
        .login(&body.username, &body.password)
        .await
        .map_err(|err| match err {
            DomainError::UserNotFound => AppError::BadRequest("user does not exist".into()),
            other => AppError::from(other),
        })?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(outcome.token))
        .json(outcome.user))
}
