use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use super::{AuthenticatedUser, AUTH_COOKIE};
use crate::auth::token::TokenService;
use crate::error::{AppError, DomainError};
use crate::services::UserService;

/// Admits only requests carrying a valid session cookie whose user still
/// exists. The verified identity is stored in the request extensions.
///
/// Needs `web::Data<TokenService>` and `web::Data<UserService>` in the app data.
pub struct Authentication;

/// Admits only users that are admins at the time of the request.
///
/// Must be wrapped inside `Authentication`, i.e. registered before it with
/// `.wrap(RequireAdmin).wrap(Authentication)`.
pub struct RequireAdmin;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthenticationMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthenticationMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let outcome = authenticate(&req).await;
            match outcome {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAdmin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireAdminMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAdminMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireAdminMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireAdminMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let outcome = authorize_admin(&req).await;
            match outcome {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

async fn authenticate(req: &ServiceRequest) -> Result<AuthenticatedUser, AppError> {
    let tokens = app_service::<TokenService>(req)?;
    let users = app_service::<UserService>(req)?;

    let cookie = req.cookie(AUTH_COOKIE).ok_or_else(|| {
        log::warn!("rejected {}: no session cookie", req.path());
        AppError::Unauthorized("missing authentication token".into())
    })?;

    let claims = tokens.verify(cookie.value()).map_err(|err| {
        log::warn!("rejected {}: {}", req.path(), err);
        AppError::from(err)
    })?;

    if claims.sub.is_empty() || claims.username.is_empty() {
        log::warn!("rejected {}: token without subject", req.path());
        return Err(AppError::Unauthorized("invalid token claims".into()));
    }

    let user = users
        .fetch_by_id(&claims.sub)
        .await
        .map_err(identity_error)?;

    Ok(AuthenticatedUser {
        id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    })
}

async fn authorize_admin(req: &ServiceRequest) -> Result<AuthenticatedUser, AppError> {
    let users = app_service::<UserService>(req)?;

    let identity = req
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| {
            log::error!("admin check on {} without an authenticated user", req.path());
            AppError::InternalServerError("missing user in context".into())
        })?;

    // The admin flag may have changed since the token was issued.
    let user = users
        .fetch_by_id(&identity.id)
        .await
        .map_err(identity_error)?;

    if !user.is_admin {
        log::warn!("user {} denied admin access to {}", user.id, req.path());
        return Err(AppError::Forbidden("user must be admin".into()));
    }

    Ok(AuthenticatedUser {
        id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    })
}

fn app_service<T: 'static>(req: &ServiceRequest) -> Result<web::Data<T>, AppError> {
    req.app_data::<web::Data<T>>().cloned().ok_or_else(|| {
        log::error!(
            "{} is not registered as app data",
            std::any::type_name::<T>()
        );
        AppError::InternalServerError("internal server error".into())
    })
}

/// A token whose user can no longer be found is treated like a bad token.
fn identity_error(err: DomainError) -> AppError {
    match err {
        DomainError::UserNotFound | DomainError::InvalidUserId => {
            AppError::Unauthorized("user does not exist".into())
        }
        other => AppError::from(other),
    }
}
