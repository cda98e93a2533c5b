#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{test, App};
use serde_json::{json, Value};

use taskkeeper::auth::{BcryptHasher, TokenService, AUTH_COOKIE};
use taskkeeper::repository::{MemoryTaskStore, MemoryUserStore};
use taskkeeper::AppServices;

pub const SECRET: &str = "integration-test-secret";

/// Services over in-memory stores. The user store handle is kept so tests can
/// change admin flags behind the service's back.
pub struct TestEnv {
    pub services: AppServices,
    pub user_store: Arc<MemoryUserStore>,
}

pub fn test_env() -> TestEnv {
    let user_store = Arc::new(MemoryUserStore::new());
    let services = AppServices::new(
        Arc::new(MemoryTaskStore::new()),
        user_store.clone(),
        Arc::new(BcryptHasher::new(4)),
        TokenService::new(SECRET),
        Duration::from_secs(5),
    );
    TestEnv {
        services,
        user_store,
    }
}

/// The full application as `main` serves it, minus CORS.
pub async fn init_app(
    services: AppServices,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| services.configure(cfg)),
    )
    .await
}

/// Sends `req` and returns the status with the body parsed as JSON
/// (`Value::Null` for an empty or non-JSON body).
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn register<S, B>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    send(app, req).await
}

/// Logs in and returns the status, the body and the session token if a
/// cookie was set.
pub async fn login<S, B>(
    app: &S,
    username: &str,
    password: &str,
) -> (StatusCode, Value, Option<String>)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let token = resp
        .response()
        .cookies()
        .find(|c| c.name() == AUTH_COOKIE)
        .map(|c| c.value().to_string());
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json, token)
}

pub fn session(token: &str) -> Cookie<'static> {
    Cookie::new(AUTH_COOKIE, token.to_string())
}

/// Registers and logs in `username`, returning its id and session token.
pub async fn signed_in<S, B>(app: &S, username: &str, password: &str) -> (String, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = register(app, username, password).await;
    assert_eq!(status, StatusCode::CREATED, "register {}: {}", username, body);
    let (status, body, token) = login(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "login {}: {}", username, body);

    let id = body["id"].as_str().unwrap_or_default().to_string();
    (id, token.unwrap_or_default())
}
