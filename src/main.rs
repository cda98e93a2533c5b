use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use taskkeeper::auth::{BcryptHasher, TokenService};
use taskkeeper::repository::{PgTaskStore, PgUserStore};
use taskkeeper::{AppServices, Config};

fn startup_error<E: std::fmt::Display>(context: &str, err: E) -> io::Error {
    log::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.request_timeout)
        .connect(&config.database_url)
        .await
        .map_err(|e| startup_error("failed to connect to the database", e))?;

    let task_store = PgTaskStore::new(pool.clone(), &config.task_collection);
    let user_store = PgUserStore::new(pool, &config.user_collection);
    task_store
        .ensure_schema()
        .await
        .map_err(|e| startup_error("failed to prepare task collection", e))?;
    user_store
        .ensure_schema()
        .await
        .map_err(|e| startup_error("failed to prepare user collection", e))?;

    let services = AppServices::new(
        Arc::new(task_store),
        Arc::new(user_store),
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        TokenService::new(&config.jwt_secret),
        config.request_timeout,
    );

    log::info!("starting server at {}", config.server_url());

    HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .supports_credentials()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(move |cfg| services.configure(cfg))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
