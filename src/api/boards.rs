use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use crate::auth::AuthUser;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Board, DeleteColumnResponse, MessageResponse, NewBoardRequest, is_builtin_status};
use crate::state::AppState;

pub(super) async fn list_boards(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Board>>, AppError> {
    let boards = repository::fetch_boards(&state.db, &user.user_id).await?;
    Ok(Json(boards))
}

pub(super) async fn create_board(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewBoardRequest>,
) -> Result<(StatusCode, Json<Board>), AppError> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Board name is required".to_string()))?;

    let board = repository::insert_board(&state.db, &user.user_id, name).await?;
    info!(board_id = %board.id, "created board");
    Ok((StatusCode::CREATED, Json(board)))
}

pub(super) async fn archive_board(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Board>, AppError> {
    let board = repository::set_board_archived(&state.db, &user.user_id, &id, true)
        .await?
        .ok_or_else(|| AppError::not_found("Board"))?;
    Ok(Json(board))
}

pub(super) async fn restore_board(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Board>, AppError> {
    let board = repository::set_board_archived(&state.db, &user.user_id, &id, false)
        .await?
        .ok_or_else(|| AppError::not_found("Board"))?;
    Ok(Json(board))
}

pub(super) async fn delete_board(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !repository::delete_board(&state.db, &user.user_id, &id).await? {
        return Err(AppError::not_found("Board"));
    }
    info!(board_id = %id, "deleted board");
    Ok(Json(MessageResponse::new("Board deleted successfully")))
}

/// Deletes every task whose status is the given custom column.
pub(super) async fn delete_custom_column(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, column)): Path<(String, String)>,
) -> Result<Json<DeleteColumnResponse>, AppError> {
    if is_builtin_status(&column) {
        return Err(AppError::BadRequest("Cannot delete built-in columns".to_string()));
    }
    repository::find_board(&state.db, &user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Board"))?;

    let deleted_tasks =
        repository::delete_tasks_with_status(&state.db, &user.user_id, &id, &column).await?;

    Ok(Json(DeleteColumnResponse {
        message: format!("Custom column \"{column}\" deleted successfully"),
        deleted_tasks,
    }))
}
