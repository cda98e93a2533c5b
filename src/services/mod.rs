//! Use cases: business rules on top of the store gateways.
//!
//! Every store call is bounded by the configured per-call timeout; an elapsed
//! deadline surfaces as `DomainError::Timeout`.

pub mod tasks;
pub mod users;

use std::future::Future;
use std::time::Duration;

use crate::error::DomainError;

pub use tasks::TaskService;
pub use users::{LoginOutcome, UserService};

/// Default upper bound on a single store call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| DomainError::Timeout)?
}
