#![doc = "The `taskkeeper` library crate."]
#![doc = ""]
#![doc = "Domain models, store gateways, use-case services, cookie-based token"]
#![doc = "authentication, routing configuration and error handling for the"]
#![doc = "task keeper service. The binary (`main.rs`) loads the configuration,"]
#![doc = "connects the Postgres gateways and serves `routes::AppServices`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod security;
pub mod services;

pub use crate::config::Config;
pub use crate::error::{AppError, DomainError};
pub use crate::routes::AppServices;
