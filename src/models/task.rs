use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::DomainError;

/// Represents the status of a task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is still open.
    Pending,
    /// Task is done.
    Completed,
    /// Task passed its due date without being completed.
    Missed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Missed => "missed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a status leniently: surrounding whitespace and case are ignored.
impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "missed" => Ok(TaskStatus::Missed),
            _ => Err(DomainError::InvalidStatus(raw.to_string())),
        }
    }
}

/// Request body for creating or replacing a task.
///
/// `status` is kept as free text here; the task service normalizes it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub due_date: DateTime<Utc>,

    #[validate(length(min = 1, max = 50))]
    pub status: String,
}

/// A validated task that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
}

impl NewTask {
    pub fn into_task(self, id: String) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            status: self.status,
        }
    }
}

/// Represents a task as stored and as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identifier assigned by the task store.
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
}

impl Task {
    /// Whether the user-editable fields of `self` and `other` are identical.
    pub fn same_content(&self, other: &Task) -> bool {
        self.title == other.title
            && self.description == other.description
            && self.due_date == other.due_date
            && self.status == other.status
    }
}

/// Result of a full-replace update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// At least one field changed.
    Modified(Task),
    /// The stored task already had exactly these values.
    Unchanged(Task),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn input(title: &str) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: Some("Test Description".to_string()),
            due_date: Utc::now() + Duration::days(1),
            status: "pending".to_string(),
        }
    }

    #[test]
    fn test_status_parsing_normalizes() {
        assert_eq!("pending".parse::<TaskStatus>().unwrap(), TaskStatus::Pending);
        assert_eq!("  Completed ".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert_eq!("MISSED".parse::<TaskStatus>().unwrap(), TaskStatus::Missed);
    }

    #[test]
    fn test_status_parsing_rejects_unknown_values() {
        for raw in ["done", "", "in progress", "pending!"] {
            assert!(matches!(
                raw.parse::<TaskStatus>(),
                Err(DomainError::InvalidStatus(_))
            ));
        }
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn test_task_input_validation() {
        assert!(input("Valid Task").validate().is_ok());
        assert!(input("").validate().is_err());
        assert!(input(&"a".repeat(201)).validate().is_err());

        let mut long_description = input("Valid title");
        long_description.description = Some("b".repeat(1001));
        assert!(long_description.validate().is_err());

        let mut no_status = input("Valid title");
        no_status.status = String::new();
        assert!(no_status.validate().is_err());
    }

    #[test]
    fn test_task_json_shape() {
        let task = NewTask {
            title: "Write report".into(),
            description: None,
            due_date: "2030-01-02T03:04:05Z".parse().unwrap(),
            status: TaskStatus::Pending,
        }
        .into_task("abc".into());

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["title"], "Write report");
        assert_eq!(json["due_date"], "2030-01-02T03:04:05Z");
        assert_eq!(json["status"], "pending");
        assert!(json["description"].is_null());
    }
}
