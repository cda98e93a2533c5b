use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use super::AuthenticatedUser;
use crate::error::AppError;

/// Extracts the identity that `Authentication` stored in the request extensions.
///
/// A missing identity means the handler was mounted without the middleware,
/// which is a wiring bug rather than a client error.
impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                log::error!("no authenticated user in request extensions for {}", req.path());
                let err = AppError::InternalServerError("missing user in context".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
