//! Cookie-based token authentication.
//!
//! `token` signs and verifies the session tokens, `password` hashes the stored
//! passwords, `middleware` guards the protected scopes and `extractors` hands
//! the verified identity to the handlers.

pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use serde::Serialize;

pub use middleware::{Authentication, RequireAdmin};
pub use password::{BcryptHasher, PasswordHasher};
pub use token::{Claims, TokenError, TokenService};

/// Name of the cookie that carries the session token.
pub const AUTH_COOKIE: &str = "Authentication";

/// The identity attached to a request once its token has been verified and
/// its user re-read from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
}

/// Builds the session cookie handed out on login.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, token)
        .path("/")
        .max_age(CookieDuration::seconds(token::TOKEN_TTL_SECS))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .finish()
}
