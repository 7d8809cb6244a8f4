use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Board, Task, TaskRow};

const TASK_COLUMNS: &str = "id, board_id, user_id, title, description, status, pinned, completed, \
     due_at, position, subtasks, history, created_at, updated_at";

pub async fn fetch_boards(db: &SqlitePool, user_id: &str) -> Result<Vec<Board>, sqlx::Error> {
    sqlx::query_as::<_, Board>(
        r#"
        SELECT id, name, user_id, archived, created_at
        FROM boards
        WHERE user_id = ?1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn find_board(
    db: &SqlitePool,
    user_id: &str,
    board_id: &str,
) -> Result<Option<Board>, sqlx::Error> {
    sqlx::query_as::<_, Board>(
        "SELECT id, name, user_id, archived, created_at FROM boards WHERE id = ?1 AND user_id = ?2",
    )
    .bind(board_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_board(db: &SqlitePool, user_id: &str, name: &str) -> Result<Board, sqlx::Error> {
    let board = Board {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        user_id: user_id.to_string(),
        archived: false,
        created_at: super::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO boards (id, user_id, name, archived, created_at)
        VALUES (?1, ?2, ?3, 0, ?4)
        "#,
    )
    .bind(&board.id)
    .bind(&board.user_id)
    .bind(&board.name)
    .bind(&board.created_at)
    .execute(db)
    .await?;

    Ok(board)
}

pub async fn set_board_archived(
    db: &SqlitePool,
    user_id: &str,
    board_id: &str,
    archived: bool,
) -> Result<Option<Board>, sqlx::Error> {
    let result = sqlx::query("UPDATE boards SET archived = ?1 WHERE id = ?2 AND user_id = ?3")
        .bind(archived)
        .bind(board_id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

    if result == 0 {
        return Ok(None);
    }
    find_board(db, user_id, board_id).await
}

/// Removes the board and every task on it.
pub async fn delete_board(db: &SqlitePool, user_id: &str, board_id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;

    let deleted = sqlx::query("DELETE FROM boards WHERE id = ?1 AND user_id = ?2")
        .bind(board_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted > 0 {
        sqlx::query("DELETE FROM tasks WHERE board_id = ?1")
            .bind(board_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(deleted > 0)
}

pub async fn delete_tasks_with_status(
    db: &SqlitePool,
    user_id: &str,
    board_id: &str,
    status: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE board_id = ?1 AND user_id = ?2 AND status = ?3")
        .bind(board_id)
        .bind(user_id)
        .bind(status)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Pinned first, then by rank; ties resolve newest first.
pub async fn fetch_tasks(db: &SqlitePool, user_id: &str, board_id: &str) -> Result<Vec<Task>, AppError> {
    let rows = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks \
         WHERE board_id = ?1 AND user_id = ?2 \
         ORDER BY pinned DESC, position ASC, created_at DESC"
    ))
    .bind(board_id)
    .bind(user_id)
    .fetch_all(db)
    .await?;

    rows.into_iter()
        .map(|row| Task::try_from(row).map_err(AppError::from))
        .collect()
}

pub async fn find_task(db: &SqlitePool, user_id: &str, task_id: &str) -> Result<Option<Task>, AppError> {
    let row = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2"
    ))
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row.map(Task::try_from).transpose()?)
}

/// Rank for a new task: ahead of everything already on the board.
pub async fn next_leading_position(db: &SqlitePool, board_id: &str) -> Result<f64, sqlx::Error> {
    let lowest: Option<f64> = sqlx::query_scalar("SELECT MIN(position) FROM tasks WHERE board_id = ?1")
        .bind(board_id)
        .fetch_one(db)
        .await?;
    Ok(lowest.map(|p| p - 1.0).unwrap_or(0.0))
}

pub async fn insert_task(db: &SqlitePool, task: &Task) -> Result<(), AppError> {
    sqlx::query(&format!(
        "INSERT INTO tasks ({TASK_COLUMNS}) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
    ))
    .bind(&task.id)
    .bind(&task.board_id)
    .bind(&task.user_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.status)
    .bind(task.pinned)
    .bind(task.completed)
    .bind(&task.due_at)
    .bind(task.position)
    .bind(serde_json::to_string(&task.subtasks)?)
    .bind(serde_json::to_string(&task.history)?)
    .bind(&task.created_at)
    .bind(&task.updated_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn save_task(db: &SqlitePool, task: &Task) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?1,
            description = ?2,
            status = ?3,
            pinned = ?4,
            completed = ?5,
            due_at = ?6,
            position = ?7,
            subtasks = ?8,
            history = ?9,
            updated_at = ?10
        WHERE id = ?11 AND user_id = ?12
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.status)
    .bind(task.pinned)
    .bind(task.completed)
    .bind(&task.due_at)
    .bind(task.position)
    .bind(serde_json::to_string(&task.subtasks)?)
    .bind(serde_json::to_string(&task.history)?)
    .bind(&task.updated_at)
    .bind(&task.id)
    .bind(&task.user_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete_task(db: &SqlitePool, user_id: &str, task_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?1 AND user_id = ?2")
        .bind(task_id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result > 0)
}
