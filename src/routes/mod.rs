//! HTTP surface.
//!
//! Three tiers share one `ServiceConfig`:
//!
//! * public: `POST /login`, `POST /register`
//! * authenticated: `GET /tasks`, `GET /tasks/{id}`
//! * admin: task mutations, user listing and `PATCH /promote/{id}`
//!
//! The admin tier is an empty-prefix scope registered last, so it also
//! answers unknown paths, with a 401 for anonymous callers.

pub mod auth;
pub mod tasks;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{error::JsonPayloadError, guard, web, HttpRequest};

use crate::auth::{Authentication, PasswordHasher, RequireAdmin, TokenService};
use crate::error::AppError;
use crate::repository::{TaskRepository, UserRepository};
use crate::services::{TaskService, UserService};

/// Everything the handlers and middleware need, built once in `main`.
#[derive(Clone)]
pub struct AppServices {
    pub tasks: TaskService,
    pub users: UserService,
    pub tokens: TokenService,
}

impl AppServices {
    pub fn new(
        task_repository: Arc<dyn TaskRepository>,
        user_repository: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
        timeout: Duration,
    ) -> Self {
        Self {
            tasks: TaskService::new(task_repository, timeout),
            users: UserService::new(user_repository, hasher, tokens.clone(), timeout),
            tokens,
        }
    }

    /// Registers app data and every route.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.tasks.clone()))
            .app_data(web::Data::new(self.users.clone()))
            .app_data(web::Data::new(self.tokens.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler));
        routes(cfg);
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::register)
        .service(
            web::scope("/tasks")
                .guard(guard::Get())
                .wrap(Authentication)
                .service(tasks::get_tasks)
                .service(tasks::get_task),
        )
        .service(
            web::scope("")
                .wrap(RequireAdmin)
                .wrap(Authentication)
                .service(tasks::create_task)
                .service(tasks::update_task)
                .service(tasks::delete_task)
                .service(users::get_users)
                .service(users::get_user)
                .service(users::promote_user),
        );
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::debug!("rejected body for {}: {}", req.path(), err);
    AppError::BadRequest(format!("invalid request body: {}", err)).into()
}
