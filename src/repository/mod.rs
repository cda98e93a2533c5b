//! Store gateways.
//!
//! The services only see the two traits below. `postgres` is the production
//! gateway; `memory` keeps everything in process and backs the test suites.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::DomainError;
use crate::models::{NewTask, NewUser, Task, User};

pub use memory::{MemoryTaskStore, MemoryUserStore};
pub use postgres::{PgTaskStore, PgUserStore};

/// Counts reported by a full-replace update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCounts {
    /// Documents whose id matched (0 or 1).
    pub matched: u64,
    /// Documents whose content actually changed (0 or 1).
    pub modified: u64,
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts `task` under a freshly generated id and returns the stored task.
    async fn create(&self, task: NewTask) -> Result<Task, DomainError>;

    /// Fails with `TaskNotFound` if no task has this id.
    async fn fetch_by_id(&self, id: &str) -> Result<Task, DomainError>;

    async fn fetch_all(&self) -> Result<Vec<Task>, DomainError>;

    /// Replaces every field of the task with id `task.id`.
    async fn replace(&self, task: &Task) -> Result<UpdateCounts, DomainError>;

    /// Returns the number of deleted tasks.
    async fn delete(&self, id: &str) -> Result<u64, DomainError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts `user` under a freshly generated id.
    ///
    /// Fails with `UserAlreadyExists` when the username is taken. The admin
    /// flag is only stored as requested if no user exists at insert time.
    async fn create(&self, user: NewUser) -> Result<User, DomainError>;

    /// Fails with `UserNotFound` if no user has this id.
    async fn fetch_by_id(&self, id: &str) -> Result<User, DomainError>;

    /// Fails with `UserNotFound` if no user has this username.
    async fn fetch_by_username(&self, username: &str) -> Result<User, DomainError>;

    async fn fetch_all(&self) -> Result<Vec<User>, DomainError>;

    /// Sets the admin flag and returns the number of matched users.
    async fn promote(&self, id: &str) -> Result<u64, DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;

    async fn username_exists(&self, username: &str) -> Result<bool, DomainError>;
}
