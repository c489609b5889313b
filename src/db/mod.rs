//! Persistence ports for users and tasks, plus the two backends.
//!
//! Every task operation takes the caller's user id and only ever sees rows
//! owned by that id. A task that exists but belongs to someone else is
//! reported exactly like a task that does not exist.

pub mod memory;
pub mod repository;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewTaskRequest, Task, TaskId, User, UserId};

pub use memory::MemoryStore;
pub use repository::SqliteStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, AppError>;

    /// Case-sensitive exact match. `None` is the normal answer for an unknown name.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Fails with [`AppError::Conflict`] when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks owned by `user_id`, in ascending id order.
    async fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>, AppError>;

    /// Fails with [`AppError::Validation`] for a blank title or unknown priority.
    async fn create_task(&self, user_id: UserId, req: NewTaskRequest) -> Result<Task, AppError>;

    /// `None` when no task with `task_id` is owned by `user_id`.
    async fn toggle_completed(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> Result<Option<Task>, AppError>;

    /// `None` when no task with `task_id` is owned by `user_id`.
    async fn toggle_important(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> Result<Option<Task>, AppError>;

    /// Idempotent; absent or foreign tasks are left alone without error.
    async fn delete_task(&self, user_id: UserId, task_id: TaskId) -> Result<(), AppError>;
}
