use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::UserId;

pub type TaskId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(AppError::Validation(format!(
                "priority must be one of low, medium, high (got {:?})",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub completed: bool,
    pub priority: Priority,
    pub is_outdoor: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub city: Option<String>,
    pub important: bool,
    /// Last weather snapshot for the task's city. Not authoritative.
    pub weather: Option<serde_json::Value>,
}

/// Caller-supplied fields for a new task, as received on the wire.
///
/// Anything else in the body (`completed`, `weather`, `userId`, ...) is
/// ignored; the store decides those.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    #[serde(default)]
    pub title: String,
    pub priority: Option<String>,
    pub is_outdoor: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
    pub city: Option<String>,
    pub important: Option<bool>,
}

/// A `NewTaskRequest` that passed validation, with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub priority: Priority,
    pub is_outdoor: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub city: Option<String>,
    pub important: bool,
}

impl NewTaskRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(self) -> Result<TaskDraft, AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }

        let priority = match self.priority.as_deref() {
            Some(raw) => raw.parse::<Priority>()?,
            None => Priority::default(),
        };

        Ok(TaskDraft {
            title: self.title,
            priority,
            is_outdoor: self.is_outdoor.unwrap_or(false),
            due_date: self.due_date,
            city: self.city,
            important: self.important.unwrap_or(false),
        })
    }
}

impl TaskDraft {
    /// Builds the stored record. `completed` and `weather` always start empty.
    pub fn into_task(self, id: TaskId, user_id: UserId) -> Task {
        Task {
            id,
            user_id,
            title: self.title,
            completed: false,
            priority: self.priority,
            is_outdoor: self.is_outdoor,
            due_date: self.due_date,
            city: self.city,
            important: self.important,
            weather: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_fields_take_defaults() {
        let draft = NewTaskRequest::new("Buy milk").validate().unwrap();
        assert_eq!(draft.priority, Priority::Medium);
        assert!(!draft.is_outdoor);
        assert!(!draft.important);
        assert_eq!(draft.due_date, None);
        assert_eq!(draft.city, None);
    }

    #[test]
    fn blank_title_is_rejected() {
        for title in ["", "   "] {
            let err = NewTaskRequest::new(title).validate().unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let req = NewTaskRequest {
            priority: Some("urgent".to_string()),
            ..NewTaskRequest::new("x")
        };
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("urgent")));
    }

    #[test]
    fn body_ignores_server_owned_fields() {
        let req: NewTaskRequest = serde_json::from_value(serde_json::json!({
            "title": "Run 5k",
            "priority": "high",
            "isOutdoor": true,
            "city": "London",
            "completed": true,
            "weather": { "temp": 3 }
        }))
        .unwrap();
        let task = req.validate().unwrap().into_task(7, 1);

        assert!(!task.completed);
        assert_eq!(task.weather, None);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.city.as_deref(), Some("London"));
    }

    #[test]
    fn task_serializes_camel_case() {
        let task = NewTaskRequest::new("Walk").validate().unwrap().into_task(1, 2);
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["userId"], 2);
        assert_eq!(json["isOutdoor"], false);
        assert_eq!(json["priority"], "medium");
        assert!(json["dueDate"].is_null());
        assert!(json["weather"].is_null());
    }
}
