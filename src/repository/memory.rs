//! In-process gateways.
//!
//! Documents live in insertion order behind a `tokio::sync::RwLock`, so every
//! operation is atomic with respect to the others, like a single-document
//! write in a real store. Ids follow the same UUID format as the Postgres
//! gateway, so malformed ids are rejected the same way.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TaskRepository, UpdateCounts, UserRepository};
use crate::error::DomainError;
use crate::models::{NewTask, NewUser, Task, User};

fn parse_task_id(id: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(id).map_err(|_| DomainError::InvalidTaskId)
}

fn parse_user_id(id: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(id).map_err(|_| DomainError::InvalidUserId)
}

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<(Uuid, Task)>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskStore {
    async fn create(&self, task: NewTask) -> Result<Task, DomainError> {
        let id = Uuid::new_v4();
        let task = task.into_task(id.to_string());
        self.tasks.write().await.push((id, task.clone()));
        Ok(task)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Task, DomainError> {
        let id = parse_task_id(id)?;
        self.tasks
            .read()
            .await
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, task)| task.clone())
            .ok_or(DomainError::TaskNotFound)
    }

    async fn fetch_all(&self) -> Result<Vec<Task>, DomainError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .map(|(_, task)| task.clone())
            .collect())
    }

    async fn replace(&self, task: &Task) -> Result<UpdateCounts, DomainError> {
        let id = parse_task_id(&task.id)?;
        let mut tasks = self.tasks.write().await;

        let Some((_, stored)) = tasks.iter_mut().find(|(key, _)| *key == id) else {
            return Ok(UpdateCounts { matched: 0, modified: 0 });
        };
        if stored.same_content(task) {
            return Ok(UpdateCounts { matched: 1, modified: 0 });
        }

        *stored = Task {
            id: stored.id.clone(),
            ..task.clone()
        };
        Ok(UpdateCounts { matched: 1, modified: 1 })
    }

    async fn delete(&self, id: &str) -> Result<u64, DomainError> {
        let id = parse_task_id(id)?;
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|(key, _)| *key != id);
        Ok((before - tasks.len()) as u64)
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<(Uuid, User)>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the admin flag of a stored user.
    ///
    /// The HTTP surface can only promote; this is how tests revoke the
    /// privilege behind the back of an already issued token.
    pub async fn set_admin(&self, id: &str, is_admin: bool) -> Result<(), DomainError> {
        let id = parse_user_id(id)?;
        let mut users = self.users.write().await;
        let (_, user) = users
            .iter_mut()
            .find(|(key, _)| *key == id)
            .ok_or(DomainError::UserNotFound)?;
        user.is_admin = is_admin;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if users.iter().any(|(_, u)| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists);
        }

        let id = Uuid::new_v4();
        let stored = User {
            id: id.to_string(),
            username: user.username,
            password_hash: user.password_hash,
            is_admin: user.is_admin && users.is_empty(),
        };
        users.push((id, stored.clone()));
        Ok(stored)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<User, DomainError> {
        let id = parse_user_id(id)?;
        self.users
            .read()
            .await
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, user)| user.clone())
            .ok_or(DomainError::UserNotFound)
    }

    async fn fetch_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .read()
            .await
            .iter()
            .find(|(_, user)| user.username == username)
            .map(|(_, user)| user.clone())
            .ok_or(DomainError::UserNotFound)
    }

    async fn fetch_all(&self) -> Result<Vec<User>, DomainError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .map(|(_, user)| user.clone())
            .collect())
    }

    async fn promote(&self, id: &str) -> Result<u64, DomainError> {
        let id = parse_user_id(id)?;
        let mut users = self.users.write().await;
        match users.iter_mut().find(|(key, _)| *key == id) {
            Some((_, user)) => {
                user.is_admin = true;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.users.read().await.len() as u64)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, DomainError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .any(|(_, user)| user.username == username))
    }
}
