//! Postgres gateways.
//!
//! Each configured collection is one table. Table names are spliced into the
//! statements as quoted identifiers, which is why `Config` only accepts plain
//! identifiers for them; every value is bound as a parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{TaskRepository, UpdateCounts, UserRepository};
use crate::error::DomainError;
use crate::security::quote_identifier;
use crate::models::{NewTask, NewUser, Task, TaskStatus, User};

fn store_error(error: sqlx::Error) -> DomainError {
    DomainError::Store(error.to_string())
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    due_date: DateTime<Utc>,
    status: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status: TaskStatus = row
            .status
            .parse()
            .map_err(|_| DomainError::Store(format!("task {} has status {:?}", row.id, row.status)))?;
        Ok(Task {
            id: row.id.to_string(),
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            status,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password: String,
    is_admin: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id.to_string(),
            username: row.username,
            password_hash: row.password,
            is_admin: row.is_admin,
        }
    }
}

#[derive(Debug, FromRow)]
struct UpdateRow {
    matched: i64,
    modified: i64,
}

#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
    table: String,
}

impl PgTaskStore {
    pub fn new(pool: PgPool, table: &str) -> Self {
        Self {
            pool,
            table: quote_identifier(table),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {t} (
                id UUID PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                due_date TIMESTAMPTZ NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('pending', 'completed', 'missed'))
            )",
            t = self.table
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

fn parse_task_id(id: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(id).map_err(|_| DomainError::InvalidTaskId)
}

#[async_trait]
impl TaskRepository for PgTaskStore {
    async fn create(&self, task: NewTask) -> Result<Task, DomainError> {
        let sql = format!(
            "INSERT INTO {} (id, title, description, due_date, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, title, description, due_date, status",
            self.table
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.due_date)
            .bind(task.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?
            .try_into()
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Task, DomainError> {
        let id = parse_task_id(id)?;
        let sql = format!(
            "SELECT id, title, description, due_date, status FROM {} WHERE id = $1",
            self.table
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or(DomainError::TaskNotFound)?
            .try_into()
    }

    async fn fetch_all(&self) -> Result<Vec<Task>, DomainError> {
        let sql = format!(
            "SELECT id, title, description, due_date, status FROM {} ORDER BY due_date, id",
            self.table
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Task::try_from)
            .collect()
    }

    async fn replace(&self, task: &Task) -> Result<UpdateCounts, DomainError> {
        let id = parse_task_id(&task.id)?;
        // Matched and modified are counted in one statement so the answer is
        // consistent with the write itself.
        let sql = format!(
            "WITH target AS (
                SELECT id FROM {t} WHERE id = $1
             ), updated AS (
                UPDATE {t}
                SET title = $2, description = $3, due_date = $4, status = $5
                WHERE id = $1
                  AND (title, description, due_date, status)
                      IS DISTINCT FROM ($2::TEXT, $3::TEXT, $4::TIMESTAMPTZ, $5::TEXT)
                RETURNING id
             )
             SELECT (SELECT COUNT(*) FROM target) AS matched,
                    (SELECT COUNT(*) FROM updated) AS modified",
            t = self.table
        );
        let row = sqlx::query_as::<_, UpdateRow>(&sql)
            .bind(id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.due_date)
            .bind(task.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(UpdateCounts {
            matched: row.matched.max(0) as u64,
            modified: row.modified.max(0) as u64,
        })
    }

    async fn delete(&self, id: &str) -> Result<u64, DomainError> {
        let id = parse_task_id(id)?;
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    table: String,
}

impl PgUserStore {
    pub fn new(pool: PgPool, table: &str) -> Self {
        Self {
            pool,
            table: quote_identifier(table),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {t} (
                id UUID PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                is_admin BOOLEAN NOT NULL DEFAULT FALSE
            )",
            t = self.table
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

fn parse_user_id(id: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(id).map_err(|_| DomainError::InvalidUserId)
}

#[async_trait]
impl UserRepository for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        // The lock serializes concurrent inserts, so the emptiness check in the
        // insert sees every user committed before it.
        let mut tx = self.pool.begin().await.map_err(store_error)?;
        sqlx::query(&format!(
            "LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE",
            self.table
        ))
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        let sql = format!(
            "INSERT INTO {t} (id, username, password, is_admin)
             SELECT $1, $2, $3, $4 AND NOT EXISTS (SELECT 1 FROM {t})
             RETURNING id, username, password, is_admin",
            t = self.table
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.is_admin)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DomainError::UserAlreadyExists
                }
                _ => store_error(e),
            })?;

        tx.commit().await.map_err(store_error)?;
        Ok(row.into())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<User, DomainError> {
        let id = parse_user_id(id)?;
        let sql = format!(
            "SELECT id, username, password, is_admin FROM {} WHERE id = $1",
            self.table
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(User::from)
            .ok_or(DomainError::UserNotFound)
    }

    async fn fetch_by_username(&self, username: &str) -> Result<User, DomainError> {
        let sql = format!(
            "SELECT id, username, password, is_admin FROM {} WHERE username = $1",
            self.table
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(User::from)
            .ok_or(DomainError::UserNotFound)
    }

    async fn fetch_all(&self) -> Result<Vec<User>, DomainError> {
        let sql = format!(
            "SELECT id, username, password, is_admin FROM {} ORDER BY username",
            self.table
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn promote(&self, id: &str) -> Result<u64, DomainError> {
        let id = parse_user_id(id)?;
        let sql = format!("UPDATE {} SET is_admin = TRUE WHERE id = $1", self.table);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let (count,): (i64,) = sqlx::query_as(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(count.max(0) as u64)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, DomainError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE username = $1)",
            self.table
        );
        let (exists,): (bool,) = sqlx::query_as(&sql)
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(exists)
    }
}
