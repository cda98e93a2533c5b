use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::bounded;
use crate::error::DomainError;
use crate::models::{NewTask, Task, TaskInput, TaskStatus, UpdateOutcome};
use crate::repository::TaskRepository;

#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
    timeout: Duration,
}

impl TaskService {
    pub fn new(repository: Arc<dyn TaskRepository>, timeout: Duration) -> Self {
        Self {
            repository,
            timeout,
        }
    }

    /// Stores a new task. The due date may not lie in the past.
    pub async fn create(&self, input: TaskInput) -> Result<Task, DomainError> {
        if input.due_date < Utc::now() {
            return Err(DomainError::InvalidDueDate);
        }
        let task = NewTask {
            status: input.status.parse::<TaskStatus>()?,
            title: input.title,
            description: input.description,
            due_date: input.due_date,
        };

        let created = bounded(self.timeout, self.repository.create(task)).await?;
        log::info!("task {} created", created.id);
        Ok(created)
    }

    /// Replaces every field of task `id`.
    ///
    /// Replacing a task with identical values is not an error; it is reported
    /// as `UpdateOutcome::Unchanged`.
    pub async fn update(&self, id: &str, input: TaskInput) -> Result<UpdateOutcome, DomainError> {
        let status: TaskStatus = input.status.parse()?;
        if input.due_date < Utc::now() {
            return Err(DomainError::InvalidDueDate);
        }
        let task = Task {
            id: id.to_string(),
            title: input.title,
            description: input.description,
            due_date: input.due_date,
            status,
        };

        let counts = bounded(self.timeout, self.repository.replace(&task)).await?;
        if counts.matched == 0 {
            return Err(DomainError::TaskNotFound);
        }
        if counts.modified == 0 {
            log::debug!("task {} replaced with identical values", task.id);
            return Ok(UpdateOutcome::Unchanged(task));
        }
        log::info!("task {} updated", task.id);
        Ok(UpdateOutcome::Modified(task))
    }

    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let deleted = bounded(self.timeout, self.repository.delete(id)).await?;
        if deleted == 0 {
            return Err(DomainError::TaskNotFound);
        }
        log::info!("task {} deleted", id);
        Ok(())
    }

    pub async fn fetch_by_id(&self, id: &str) -> Result<Task, DomainError> {
        bounded(self.timeout, self.repository.fetch_by_id(id)).await
    }

    pub async fn fetch_all(&self) -> Result<Vec<Task>, DomainError> {
        bounded(self.timeout, self.repository.fetch_all()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTask;
    use crate::repository::{MemoryTaskStore, UpdateCounts};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration};
    use pretty_assertions::assert_eq;

    fn service() -> TaskService {
        TaskService::new(Arc::new(MemoryTaskStore::new()), Duration::from_secs(5))
    }

    fn input(status: &str, due_date: DateTime<Utc>) -> TaskInput {
        TaskInput {
            title: "Write report".to_string(),
            description: Some("quarterly numbers".to_string()),
            due_date,
            status: status.to_string(),
        }
    }

    fn tomorrow() -> DateTime<Utc> {
        Utc::now() + ChronoDuration::days(1)
    }

    #[actix_rt::test]
    async fn test_create_rejects_past_due_date() {
        let tasks = service();
        let past = Utc::now() - ChronoDuration::minutes(1);

        assert!(matches!(
            tasks.create(input("pending", past)).await,
            Err(DomainError::InvalidDueDate)
        ));
        assert!(tasks.fetch_all().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_create_accepts_future_due_date() {
        let tasks = service();
        let created = tasks.create(input(" Pending ", tomorrow())).await.unwrap();

        assert_eq!(created.status, TaskStatus::Pending);
        assert_eq!(tasks.fetch_by_id(&created.id).await.unwrap(), created);
    }

    #[actix_rt::test]
    async fn test_update_normalizes_status() {
        let tasks = service();
        let created = tasks.create(input("pending", tomorrow())).await.unwrap();

        let outcome = tasks
            .update(&created.id, input("  COMPLETED\t", created.due_date))
            .await
            .unwrap();

        match outcome {
            UpdateOutcome::Modified(task) => assert_eq!(task.status, TaskStatus::Completed),
            other => panic!("expected a modification, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_update_rejects_unknown_status_and_past_due_date() {
        let tasks = service();
        let created = tasks.create(input("pending", tomorrow())).await.unwrap();

        assert!(matches!(
            tasks.update(&created.id, input("done", tomorrow())).await,
            Err(DomainError::InvalidStatus(_))
        ));
        assert!(matches!(
            tasks
                .update(&created.id, input("missed", Utc::now() - ChronoDuration::hours(1)))
                .await,
            Err(DomainError::InvalidDueDate)
        ));
    }

    #[actix_rt::test]
    async fn test_update_without_changes_is_reported() {
        let tasks = service();
        let created = tasks.create(input("pending", tomorrow())).await.unwrap();

        let outcome = tasks
            .update(&created.id, input("pending", created.due_date))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged(created));
    }

    #[actix_rt::test]
    async fn test_update_and_delete_of_unknown_task() {
        let tasks = service();
        let unknown = uuid::Uuid::new_v4().to_string();

        assert!(matches!(
            tasks.update(&unknown, input("pending", tomorrow())).await,
            Err(DomainError::TaskNotFound)
        ));
        assert!(matches!(
            tasks.delete(&unknown).await,
            Err(DomainError::TaskNotFound)
        ));
        assert!(matches!(
            tasks.fetch_by_id(&unknown).await,
            Err(DomainError::TaskNotFound)
        ));
    }

    #[actix_rt::test]
    async fn test_delete_removes_task() {
        let tasks = service();
        let created = tasks.create(input("pending", tomorrow())).await.unwrap();

        tasks.delete(&created.id).await.unwrap();
        assert!(tasks.fetch_all().await.unwrap().is_empty());
    }

    struct StalledStore;

    #[async_trait]
    impl TaskRepository for StalledStore {
        async fn create(&self, _task: NewTask) -> Result<Task, DomainError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(DomainError::Store("unreachable".into()))
        }
        async fn fetch_by_id(&self, _id: &str) -> Result<Task, DomainError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(DomainError::TaskNotFound)
        }
        async fn fetch_all(&self) -> Result<Vec<Task>, DomainError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
        async fn replace(&self, _task: &Task) -> Result<UpdateCounts, DomainError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(UpdateCounts { matched: 0, modified: 0 })
        }
        async fn delete(&self, _id: &str) -> Result<u64, DomainError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(0)
        }
    }

    #[actix_rt::test]
    async fn test_store_calls_are_bounded() {
        let tasks = TaskService::new(Arc::new(StalledStore), Duration::from_millis(20));

        assert!(matches!(tasks.fetch_all().await, Err(DomainError::Timeout)));
        assert!(matches!(
            tasks.create(input("pending", tomorrow())).await,
            Err(DomainError::Timeout)
        ));
        assert!(matches!(
            tasks.delete("00000000-0000-0000-0000-000000000000").await,
            Err(DomainError::Timeout)
        ));
    }
}
