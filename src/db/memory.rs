use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, error};

use crate::db::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewTaskRequest, Task, TaskId, User, UserId};

/// Process-lifetime store. One lock covers both collections and both id
/// counters, so every operation is a single atomic step.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    tasks: BTreeMap<TaskId, Task>,
    last_user_id: UserId,
    last_task_id: TaskId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, AppError> {
        self.state.lock().map_err(|e| {
            error!("memory store lock poisoned: {}", e);
            AppError::InternalServerError
        })
    }
}

impl MemoryState {
    fn owned_task_mut(&mut self, user_id: UserId, task_id: TaskId) -> Option<&mut Task> {
        self.tasks
            .get_mut(&task_id)
            .filter(|task| task.user_id == user_id)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let state = self.lock()?;
        Ok(state
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let mut state = self.lock()?;
        if state.users.values().any(|user| user.username == username) {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        state.users.insert(user.id, user.clone());
        debug!(user_id = user.id, "user stored");
        Ok(user)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>, AppError> {
        let state = self.lock()?;
        Ok(state
            .tasks
            .values()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_task(&self, user_id: UserId, req: NewTaskRequest) -> Result<Task, AppError> {
        let draft = req.validate()?;

        let mut state = self.lock()?;
        if !state.users.contains_key(&user_id) {
            return Err(AppError::Validation(format!("user {} does not exist", user_id)));
        }

        state.last_task_id += 1;
        let task = draft.into_task(state.last_task_id, user_id);
        state.tasks.insert(task.id, task.clone());
        debug!(user_id, task_id = task.id, "task stored");
        Ok(task)
    }

    async fn toggle_completed(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> Result<Option<Task>, AppError> {
        let mut state = self.lock()?;
        Ok(state.owned_task_mut(user_id, task_id).map(|task| {
            task.completed = !task.completed;
            task.clone()
        }))
    }

    async fn toggle_important(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> Result<Option<Task>, AppError> {
        let mut state = self.lock()?;
        Ok(state.owned_task_mut(user_id, task_id).map(|task| {
            task.important = !task.important;
            task.clone()
        }))
    }

    async fn delete_task(&self, user_id: UserId, task_id: TaskId) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if state.owned_task_mut(user_id, task_id).is_some() {
            state.tasks.remove(&task_id);
            debug!(user_id, task_id, "task deleted");
        }
        Ok(())
    }
}
