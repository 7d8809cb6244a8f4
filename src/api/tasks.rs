use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::{self, repository};
use crate::error::AppError;
use crate::models::{
    DEFAULT_STATUS, DEFAULT_TIMEZONE, MessageResponse, NewTaskRequest, PinResponse, StatusChange,
    Subtask, Task, TaskPatch,
};
use crate::state::AppState;

pub(super) async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(board_id): Path<String>,
) -> Result<Json<Vec<Task>>, AppError> {
    repository::find_board(&state.db, &user.user_id, &board_id)
        .await?
        .ok_or_else(|| AppError::not_found("Board"))?;

    let tasks = repository::fetch_tasks(&state.db, &user.user_id, &board_id).await?;
    Ok(Json(tasks))
}

pub(super) async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Title is required".to_string()))?;
    let board_id = req
        .board
        .as_deref()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::BadRequest("Board ID is required".to_string()))?;

    repository::find_board(&state.db, &user.user_id, board_id)
        .await?
        .ok_or_else(|| AppError::not_found("Board"))?;

    let status = req
        .status
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STATUS.to_string());
    let mut subtasks = req.subtasks.clone();
    Subtask::assign_ids(&mut subtasks);
    let now = db::now();

    let task = Task {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: req.description.clone().unwrap_or_default(),
        board_id: board_id.to_string(),
        user_id: user.user_id.clone(),
        history: vec![StatusChange {
            from: "created".to_string(),
            to: status.clone(),
            timestamp: now.clone(),
            timezone: req
                .timezone
                .clone()
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        }],
        status,
        pinned: false,
        completed: false,
        due_at: req.date.clone().filter(|d| !d.is_empty()),
        position: repository::next_leading_position(&state.db, board_id).await?,
        subtasks,
        created_at: now.clone(),
        updated_at: now,
    };

    repository::insert_task(&state.db, &task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub(super) async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, AppError> {
    let id = parse_task_id(&id)?;
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    if patch.status.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(AppError::BadRequest("Status cannot be empty".to_string()));
    }

    let mut task = repository::find_task(&state.db, &user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;

    task.apply_patch(patch, &db::now());
    repository::save_task(&state.db, &task).await?;
    Ok(Json(task))
}

pub(super) async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_task_id(&id)?;
    if !repository::delete_task(&state.db, &user.user_id, &id).await? {
        return Err(AppError::not_found("Task"));
    }
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

pub(super) async fn toggle_pin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PinResponse>, AppError> {
    let id = parse_task_id(&id)?;
    let mut task = repository::find_task(&state.db, &user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;

    task.pinned = !task.pinned;
    task.updated_at = db::now();
    repository::save_task(&state.db, &task).await?;

    let message = if task.pinned { "Task pinned" } else { "Task unpinned" };
    Ok(Json(PinResponse {
        pinned: task.pinned,
        message: message.to_string(),
    }))
}

fn parse_task_id(id: &str) -> Result<String, AppError> {
    Uuid::parse_str(id)
        .map(|uuid| uuid.to_string())
        .map_err(|_| AppError::BadRequest("Invalid task ID".to_string()))
}
