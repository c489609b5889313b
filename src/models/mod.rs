pub mod task;
pub mod user;
pub mod weather;

pub use task::{NewTaskRequest, Priority, Task, TaskDraft, TaskId};
pub use user::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, User, UserId};
pub use weather::{Condition, Location, WeatherReport};
