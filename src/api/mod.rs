use std::time::Duration;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::{Request, Response};
use axum::routing::{delete, patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Span, info, instrument, warn};

use crate::auth::{self, AuthUser};
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;
use crate::weather::WeatherQuery;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/user", get(current_user))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", delete(delete_task))
        .route("/api/tasks/{id}/toggle", patch(toggle_task))
        .route("/api/tasks/{id}/important", patch(toggle_important))
        .route("/api/weather", get(weather))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(|res: &Response<_>, latency: Duration, span: &Span| {
                    let status = res.status();
                    span.record("status", tracing::field::display(status));
                    if status.is_server_error() {
                        tracing::error!(%status, ?latency, "response");
                    } else {
                        tracing::info!(%status, ?latency, "response");
                    }
                }),
        )
}

async fn health() -> StatusCode {
    StatusCode::OK
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

// A path segment that is not a task id cannot name a task the caller owns.
fn task_id(path: Result<Path<TaskId>, PathRejection>) -> Result<TaskId, AppError> {
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound)
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let req = json_body(payload)?;
    let username = auth::validate_credentials(&req.username, &req.password)?;

    if state.users.get_user_by_username(&username).await?.is_some() {
        warn!(username = %username, "username already registered");
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let hash = auth::hash_password(&req.password)?;
    let user = state.users.create_user(&username, &hash).await?;
    let token = state.keys.sign(user.id)?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { token, user: user.into() }),
    ))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let req = json_body(payload)?;
    let username = req.username.trim();
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let Some(user) = state.users.get_user_by_username(username).await? else {
        warn!(username = %username, "login for unknown username");
        return Err(invalid());
    };

    if !auth::verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "login with invalid password");
        return Err(invalid());
    }

    let token = state.keys.sign(user.id)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse { token, user: user.into() }))
}

/// Tokens are stateless; the client discards its copy.
async fn logout() -> StatusCode {
    StatusCode::OK
}

#[instrument(skip(state))]
async fn current_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = state.tasks.list_tasks(user_id).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state, payload))]
async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<NewTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let req = json_body(payload)?;
    let task = state.tasks.create_task(user_id, req).await?;
    info!(user_id, task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state, path))]
async fn toggle_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<TaskId>, PathRejection>,
) -> Result<Json<Task>, AppError> {
    let id = task_id(path)?;
    let task = state
        .tasks
        .toggle_completed(user_id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

#[instrument(skip(state, path))]
async fn toggle_important(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<TaskId>, PathRejection>,
) -> Result<Json<Task>, AppError> {
    let id = task_id(path)?;
    let task = state
        .tasks
        .toggle_important(user_id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

#[instrument(skip(state, path))]
async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<TaskId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    // Deleting something that is not there is still a success.
    if let Ok(id) = task_id(path) {
        state.tasks.delete_task(user_id, id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, query))]
async fn weather(
    State(state): State<AppState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Json<WeatherReport>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let location = query.into_location()?;
    let report = state.weather.current(&location).await?;
    Ok(Json(report))
}
