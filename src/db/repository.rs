use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, error, info};

use crate::db::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewTaskRequest, Priority, Task, TaskId, User, UserId};

const TASK_COLUMNS: &str =
    "id, user_id, title, completed, priority, is_outdoor, due_date, city, important, weather";

/// SQLite-backed store. `AUTOINCREMENT` keeps ids from ever being reused
/// and the `UNIQUE` constraint on `users.username` makes registration atomic.
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    user_id: i64,
    title: String,
    completed: bool,
    priority: String,
    is_outdoor: bool,
    due_date: Option<DateTime<Utc>>,
    city: Option<String>,
    important: bool,
    weather: Option<String>,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let priority = Priority::from_str(&row.priority).map_err(|_| {
            error!(task_id = row.id, priority = %row.priority, "stored task has unknown priority");
            AppError::InternalServerError
        })?;
        let weather = row
            .weather
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| {
                error!(task_id = row.id, "stored weather payload is not JSON: {}", e);
                AppError::InternalServerError
            })?;

        Ok(Task {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            completed: row.completed,
            priority,
            is_outdoor: row.is_outdoor,
            due_date: row.due_date,
            city: row.city,
            important: row.important,
            weather,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
        }
    }
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and applies migrations.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database lives and dies with its connection.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Database(sqlx::Error::Migrate(Box::new(e))))?;

        info!("sqlite store ready");
        Ok(Self { db: pool })
    }

    async fn toggle_column(
        &self,
        column: &str,
        user_id: UserId,
        task_id: TaskId,
    ) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "UPDATE tasks SET {column} = NOT {column} \
             WHERE id = ?1 AND user_id = ?2 RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(Task::try_from).transpose()
    }
}

fn map_constraint_error(e: sqlx::Error, username: Option<&str>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(name) = username {
                debug!(username = %name, "username already taken");
            }
            return AppError::Conflict("Username already exists".to_string());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::Validation("task owner does not exist".to_string());
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        // `=` on TEXT is case-sensitive under SQLite's default BINARY collation.
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES (?1, ?2)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_constraint_error(e, Some(username)))?;

        debug!(user_id = row.id, "user stored");
        Ok(row.into())
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>, AppError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY id");
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn create_task(&self, user_id: UserId, req: NewTaskRequest) -> Result<Task, AppError> {
        let draft = req.validate()?;

        let sql = format!(
            r#"
            INSERT INTO tasks
                (user_id, title, completed, priority, is_outdoor,
                 due_date, city, important, weather)
            VALUES (?1, ?2, 0, ?3, ?4, ?5, ?6, ?7, NULL)
            RETURNING {TASK_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .bind(&draft.title)
            .bind(draft.priority.as_str())
            .bind(draft.is_outdoor)
            .bind(draft.due_date)
            .bind(&draft.city)
            .bind(draft.important)
            .fetch_one(&self.db)
            .await
            .map_err(|e| map_constraint_error(e, None))?;

        debug!(user_id, task_id = row.id, "task stored");
        Task::try_from(row)
    }

    async fn toggle_completed(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> Result<Option<Task>, AppError> {
        self.toggle_column("completed", user_id, task_id).await
    }

    async fn toggle_important(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> Result<Option<Task>, AppError> {
        self.toggle_column("important", user_id, task_id).await
    }

    async fn delete_task(&self, user_id: UserId, task_id: TaskId) -> Result<(), AppError> {
        let affected = sqlx::query("DELETE FROM tasks WHERE id = ?1 AND user_id = ?2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.db)
            .await?
            .rows_affected();

        if affected > 0 {
            debug!(user_id, task_id, "task deleted");
        }
        Ok(())
    }
}
