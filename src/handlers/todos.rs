// handlers/todos.rs - /api/todos/ resource
//
// Every handler runs behind jwt_auth_middleware and works only on the
// caller's visible set (own, not soft-deleted).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::{json_body, parse_todo_payload, PayloadMode};
use crate::database::models::{NewTodo, Todo, TodoChanges};
use crate::database::TodoRepository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

const TODO_NOT_FOUND: &str = "Todo not found";

/// GET /api/todos/
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Todo>> {
    let todos = state.store.visible_todos(user.user_id).await?;
    Ok(ApiResponse::success(todos))
}

/// POST /api/todos/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Todo> {
    let body = json_body(payload)?;
    let changes = parse_todo_payload(&body, PayloadMode::Create)?;

    let (Some(title), Some(description)) = (changes.title, changes.description) else {
        return Err(ApiError::validation_error("Invalid input", None));
    };

    let todo = state
        .store
        .insert_todo(NewTodo {
            owner: user.user_id,
            title,
            description,
        })
        .await?;

    info!(id = %todo.id, user = %user, "created todo");
    Ok(ApiResponse::created(todo))
}

/// GET /api/todos/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Todo> {
    let id = parse_id(&id)?;
    let todo = state
        .store
        .visible_todo(user.user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(TODO_NOT_FOUND))?;
    Ok(ApiResponse::success(todo))
}

/// PUT /api/todos/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Todo> {
    let id = parse_id(&id)?;
    let body = json_body(payload)?;
    let changes = parse_todo_payload(&body, PayloadMode::Replace)?;
    apply_changes(&state, &user, id, changes).await
}

/// PATCH /api/todos/:id/
pub async fn partial_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Todo> {
    let id = parse_id(&id)?;
    let body = json_body(payload)?;
    let changes = parse_todo_payload(&body, PayloadMode::Partial)?;
    apply_changes(&state, &user, id, changes).await
}

/// DELETE /api/todos/:id/ - soft delete
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    let todo = state
        .store
        .update_visible_todo(user.user_id, id, TodoChanges::soft_delete(), user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(TODO_NOT_FOUND))?;

    info!(id = %todo.id, user = %user, "soft deleted todo");
    Ok(ApiResponse::no_content())
}

/// PATCH /api/todos/:id/mark_done/
///
/// Responds with a status payload rather than the record.
pub async fn mark_done(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let not_found = || (StatusCode::NOT_FOUND, Json(json!({ "error": TODO_NOT_FOUND }))).into_response();

    let Ok(id) = Uuid::parse_str(&id) else {
        return Ok(not_found());
    };

    let updated = state
        .store
        .update_visible_todo(user.user_id, id, TodoChanges::mark_done(), user.user_id)
        .await?;

    match updated {
        Some(todo) => {
            info!(id = %todo.id, user = %user, "marked todo done");
            Ok((StatusCode::OK, Json(json!({ "status": "Task marked as done" }))).into_response())
        }
        None => Ok(not_found()),
    }
}

async fn apply_changes(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    changes: TodoChanges,
) -> ApiResult<Todo> {
    let todo = state
        .store
        .update_visible_todo(user.user_id, id, changes, user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(TODO_NOT_FOUND))?;

    info!(id = %todo.id, user = %user, "updated todo");
    Ok(ApiResponse::success(todo))
}

/// Malformed ids cannot be in anyone's visible set.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(TODO_NOT_FOUND))
}
