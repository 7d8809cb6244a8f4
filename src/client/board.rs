//! One interactive session against a task gateway.
//!
//! Local column state is a cache of the gateway. Moves are applied locally
//! before they are persisted and rolled back by a refetch when persisting
//! fails; every other mutation only touches local state after the gateway
//! has accepted it.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::assistant::GatewayDraftProvider;
use super::gateway::{GatewayError, TaskGateway};
use super::http::HttpGateway;
use super::lists::{FilteredColumn, ListError, MoveOutcome, TaskFilter, TaskLists};
use super::settings::ClientSettings;
use crate::config::ClientConfig;
use crate::draft::{
    DraftPipeline, DraftProvider, DraftReport, ModelDraftProvider, TaskDraft, TextInferenceGenerator,
};
use crate::models::{
    Board, CustomStatus, DEFAULT_TIMEZONE, NewTaskRequest, Subtask, Task, TaskPatch,
    is_builtin_status,
};

/// Work that may be awaiting the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    LoadBoards,
    LoadTasks,
    SaveBoard,
    AddTask,
    SaveTask,
    Reorder,
    Pin,
    DeleteTask,
    DeleteColumn,
    Generate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A short message meant for the person using the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("no board is selected")]
    NoActiveBoard,

    #[error("task {0} is not loaded")]
    UnknownTask(String),

    #[error(transparent)]
    List(#[from] ListError),

    #[error("{0:?} is already in progress")]
    Busy(Operation),

    #[error("session expired, sign in again")]
    SessionExpired,

    #[error(transparent)]
    Gateway(GatewayError),
}

pub struct TaskBoard<G> {
    gateway: Arc<G>,
    settings: ClientSettings,
    drafts: DraftPipeline,
    timezone: String,
    boards: Vec<Board>,
    active_board: Option<String>,
    lists: HashMap<String, TaskLists>,
    archived_tasks: HashMap<String, Vec<Task>>,
    in_flight: BTreeSet<Operation>,
    notices: Vec<Notice>,
    session_expired: bool,
}

impl TaskBoard<HttpGateway> {
    /// HTTP session, with the text model as a second drafting source when configured.
    pub fn connect(config: &ClientConfig, settings: ClientSettings) -> Result<Self, ClientError> {
        let gateway = Arc::new(HttpGateway::new(config).map_err(ClientError::Gateway)?);
        let mut board = TaskBoard::new(gateway, settings);

        if let Some(text_model) = config.text_model.clone() {
            let generator = TextInferenceGenerator::new(text_model)
                .map_err(|e| ClientError::Gateway(GatewayError::Transport(e.to_string())))?;
            board = board.with_draft_provider(ModelDraftProvider::new("text-model", generator));
        }
        Ok(board)
    }
}

impl<G: TaskGateway + 'static> TaskBoard<G> {
    pub fn new(gateway: Arc<G>, settings: ClientSettings) -> Self {
        let drafts = DraftPipeline::new().with_provider(GatewayDraftProvider::new(gateway.clone()));

        Self {
            gateway,
            settings,
            drafts,
            timezone: DEFAULT_TIMEZONE.to_string(),
            boards: Vec::new(),
            active_board: None,
            lists: HashMap::new(),
            archived_tasks: HashMap::new(),
            in_flight: BTreeSet::new(),
            notices: Vec::new(),
            session_expired: false,
        }
    }

    /// Adds a drafting source tried after the ones already registered.
    pub fn with_draft_provider(mut self, provider: impl DraftProvider + 'static) -> Self {
        self.drafts = std::mem::take(&mut self.drafts).with_provider(provider);
        self
    }

    /// IANA zone recorded in status history entries.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ClientSettings {
        &mut self.settings
    }

    /// Ends the session, handing back the settings to save.
    pub fn into_settings(self) -> ClientSettings {
        self.settings
    }

    pub fn boards(&self) -> Vec<&Board> {
        self.boards.iter().filter(|b| !b.archived).collect()
    }

    pub fn archived_boards(&self) -> Vec<&Board> {
        self.boards.iter().filter(|b| b.archived).collect()
    }

    pub fn active_board(&self) -> Option<&str> {
        self.active_board.as_deref()
    }

    /// Column state of the active board.
    pub fn lists(&self) -> Option<&TaskLists> {
        self.active_board.as_ref().and_then(|id| self.lists.get(id))
    }

    pub fn lists_for(&self, board_id: &str) -> Option<&TaskLists> {
        self.lists.get(board_id)
    }

    pub fn archived_tasks(&self) -> &[Task] {
        self.active_board
            .as_ref()
            .and_then(|id| self.archived_tasks.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn is_busy(&self, operation: Operation) -> bool {
        self.in_flight.contains(&operation)
    }

    pub fn session_expired(&self) -> bool {
        self.session_expired
    }

    /// Call after signing in again.
    pub fn resume_session(&mut self) {
        self.session_expired = false;
    }

    pub async fn load_boards(&mut self) -> Result<(), ClientError> {
        self.begin(Operation::LoadBoards)?;
        let result = self.gateway.list_boards().await;
        self.finish(Operation::LoadBoards);

        let boards = result.map_err(|e| self.fail("Failed to load boards", e))?;
        self.boards = boards;
        self.reselect_if_inactive();
        debug!(boards = self.boards.len(), "boards loaded");
        Ok(())
    }

    pub async fn select_board(&mut self, board_id: &str) -> Result<(), ClientError> {
        if !self.boards.iter().any(|b| b.id == board_id && !b.archived) {
            return Err(ClientError::Validation(format!("Unknown board {board_id}")));
        }
        self.active_board = Some(board_id.to_string());
        self.refresh_tasks().await
    }

    /// Replaces the active board's columns with the gateway's current view.
    pub async fn refresh_tasks(&mut self) -> Result<(), ClientError> {
        let board_id = self.require_board()?;

        self.begin(Operation::LoadTasks)?;
        let result = self.gateway.list_tasks(&board_id).await;
        self.finish(Operation::LoadTasks);

        let tasks = result.map_err(|e| self.fail("Failed to load tasks", e))?;
        let columns = self.settings.column_ids(&board_id);
        self.lists.insert(board_id, TaskLists::from_tasks(columns, tasks));
        Ok(())
    }

    pub async fn create_board(&mut self, name: &str) -> Result<Board, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.invalid("Please enter a valid board name"));
        }

        self.begin(Operation::SaveBoard)?;
        let result = self.gateway.create_board(name).await;
        self.finish(Operation::SaveBoard);

        let board = result.map_err(|e| self.fail("Failed to create board", e))?;
        let columns = self.settings.column_ids(&board.id);
        self.lists.insert(board.id.clone(), TaskLists::new(columns));
        self.boards.insert(0, board.clone());
        if self.active_board.is_none() {
            self.active_board = Some(board.id.clone());
        }

        self.notify(NoticeLevel::Success, "Board created successfully");
        Ok(board)
    }

    pub async fn archive_board(&mut self, board_id: &str) -> Result<(), ClientError> {
        self.begin(Operation::SaveBoard)?;
        let result = self.gateway.archive_board(board_id).await;
        self.finish(Operation::SaveBoard);

        let board = result.map_err(|e| self.fail("Failed to archive board", e))?;
        self.store_board(board);
        self.reselect_if_inactive();
        self.notify(NoticeLevel::Success, "Board archived");
        Ok(())
    }

    pub async fn restore_board(&mut self, board_id: &str) -> Result<(), ClientError> {
        self.begin(Operation::SaveBoard)?;
        let result = self.gateway.restore_board(board_id).await;
        self.finish(Operation::SaveBoard);

        let board = result.map_err(|e| self.fail("Failed to restore board", e))?;
        self.store_board(board);
        self.reselect_if_inactive();
        self.notify(NoticeLevel::Success, "Board restored");
        Ok(())
    }

    pub async fn delete_board(&mut self, board_id: &str) -> Result<(), ClientError> {
        self.begin(Operation::SaveBoard)?;
        let result = self.gateway.delete_board(board_id).await;
        self.finish(Operation::SaveBoard);

        result.map_err(|e| self.fail("Failed to delete board", e))?;
        self.boards.retain(|b| b.id != board_id);
        self.lists.remove(board_id);
        self.archived_tasks.remove(board_id);
        self.settings.remove_board(board_id);
        self.reselect_if_inactive();

        self.notify(NoticeLevel::Success, "Board deleted successfully");
        Ok(())
    }

    /// Adds a board-local column. Nothing is sent to the gateway.
    pub fn add_custom_status(&mut self, name: &str, icon: &str) -> Result<(), ClientError> {
        let board_id = self.require_board()?;
        if let Err(e) = self
            .settings
            .add_custom_status(&board_id, CustomStatus::new(name, icon))
        {
            return Err(self.invalid(&e.to_string()));
        }
        self.lists_mut(&board_id).ensure_column(name.trim());
        Ok(())
    }

    /// Deletes a custom column and, on the gateway, every task in it.
    pub async fn delete_custom_column(&mut self, name: &str) -> Result<u64, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.invalid("Column name is required"));
        }
        if is_builtin_status(name) {
            return Err(self.invalid("Cannot delete built-in columns"));
        }
        let board_id = self.require_board()?;

        self.begin(Operation::DeleteColumn)?;
        let result = self.gateway.delete_custom_column(&board_id, name).await;
        self.finish(Operation::DeleteColumn);

        let deleted = result.map_err(|e| self.fail("Failed to delete column", e))?;
        self.lists_mut(&board_id).remove_column(name);
        self.settings.remove_custom_status(&board_id, name);

        self.notify(
            NoticeLevel::Success,
            &format!("Column \"{name}\" deleted along with {deleted} tasks"),
        );
        Ok(deleted)
    }

    /// Moves a task locally, then persists its new column and rank.
    ///
    /// A failed persist throws the local state away in favour of a fresh
    /// fetch; if that fetch also fails the pre-move state is restored.
    pub async fn move_task(
        &mut self,
        source_column: &str,
        source_index: usize,
        dest_column: &str,
        dest_index: usize,
    ) -> Result<(), ClientError> {
        let board_id = self.require_board()?;
        if self.session_expired {
            return Err(ClientError::SessionExpired);
        }
        if self.is_busy(Operation::Reorder) {
            return Err(ClientError::Busy(Operation::Reorder));
        }

        let lists = self.lists_mut(&board_id);
        let snapshot = lists.clone();
        let Some(outcome) = lists.move_task(source_column, source_index, dest_column, dest_index)? else {
            return Ok(());
        };
        debug!(task = %outcome.task_id, from = %outcome.from, to = %outcome.to, "moved task locally");

        self.begin(Operation::Reorder)?;
        let result = self.persist_move(&outcome).await;
        self.finish(Operation::Reorder);

        match result {
            Ok(task) => {
                if let Some(lists) = self.lists.get_mut(&board_id) {
                    if !lists.merge(task) {
                        debug!(task = %outcome.task_id, "ignoring stale move response");
                    }
                }
                Ok(())
            }
            Err(err) => {
                let error = self.fail("Failed to update task position", err);
                if self.refresh_tasks().await.is_err() {
                    warn!("refetch after failed move failed, restoring previous order");
                    self.lists.insert(board_id, snapshot);
                }
                Err(error)
            }
        }
    }

    async fn persist_move(&self, outcome: &MoveOutcome) -> Result<Task, GatewayError> {
        let mut moved = None;
        for rank in &outcome.ranks {
            if rank.task_id == outcome.task_id {
                let patch = TaskPatch {
                    timezone: Some(self.timezone.clone()),
                    ..TaskPatch::status(outcome.to.clone()).position(rank.position)
                };
                moved = Some(self.gateway.update_task(&rank.task_id, &patch).await?);
            } else {
                let patch = TaskPatch::default().position(rank.position);
                self.gateway.update_task(&rank.task_id, &patch).await?;
            }
        }
        moved.ok_or_else(|| GatewayError::Decode("move produced no update for the task".to_string()))
    }

    /// Creates a task in `column` of the active board. Local state changes
    /// only once the gateway has returned the stored task.
    pub async fn add_task(&mut self, column: &str, mut form: NewTaskRequest) -> Result<Task, ClientError> {
        let board_id = self.require_board()?;
        if form.title.as_deref().map(str::trim).unwrap_or_default().is_empty() {
            return Err(self.invalid("Title is required"));
        }
        form.board = Some(board_id.clone());
        form.status = Some(column.to_string());
        form.timezone.get_or_insert_with(|| self.timezone.clone());

        self.begin(Operation::AddTask)?;
        let result = self.gateway.create_task(&form).await;
        self.finish(Operation::AddTask);

        let task = result.map_err(|e| self.fail("Failed to add task", e))?;
        self.lists_mut(&board_id).push(task.clone());
        self.settings.board_mut(&board_id).draft_subtasks.clear();

        self.notify(NoticeLevel::Success, "Task added successfully!");
        Ok(task)
    }

    pub async fn update_task(&mut self, task_id: &str, mut patch: TaskPatch) -> Result<Task, ClientError> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(self.invalid("Title is required"));
        }
        if patch.status.is_some() {
            patch.timezone.get_or_insert_with(|| self.timezone.clone());
        }

        self.begin(Operation::SaveTask)?;
        let result = self.gateway.update_task(task_id, &patch).await;
        self.finish(Operation::SaveTask);

        match result {
            Ok(task) => {
                for lists in self.lists.values_mut() {
                    if lists.replace(task.clone()) {
                        break;
                    }
                }
                self.notify(NoticeLevel::Success, "Task updated successfully");
                Ok(task)
            }
            Err(GatewayError::NotFound(message)) => {
                let error = self.fail("Task no longer exists", GatewayError::NotFound(message));
                // the stale copy goes away with the refetch; its failure is already reported
                let _ = self.refresh_tasks().await;
                Err(error)
            }
            Err(e) => Err(self.fail("Failed to update task", e)),
        }
    }

    pub async fn toggle_complete(&mut self, task_id: &str) -> Result<bool, ClientError> {
        let completed = !self.find_task(task_id)?.completed;

        self.begin(Operation::SaveTask)?;
        let result = self
            .gateway
            .update_task(task_id, &TaskPatch::completed(completed))
            .await;
        self.finish(Operation::SaveTask);

        let task = result.map_err(|e| self.fail("Failed to update task", e))?;
        for lists in self.lists.values_mut() {
            lists.set_completed(task_id, task.completed);
        }
        Ok(task.completed)
    }

    pub async fn toggle_pin(&mut self, task_id: &str) -> Result<bool, ClientError> {
        self.find_task(task_id)?;

        self.begin(Operation::Pin)?;
        let result = self.gateway.toggle_pin(task_id).await;
        self.finish(Operation::Pin);

        let pinned = result.map_err(|e| self.fail("Failed to update pin", e))?;
        for lists in self.lists.values_mut() {
            lists.set_pinned(task_id, pinned);
        }

        let message = if pinned { "Task pinned" } else { "Task unpinned" };
        self.notify(NoticeLevel::Success, message);
        Ok(pinned)
    }

    /// Removes the task from every board this session has loaded.
    pub async fn delete_task(&mut self, task_id: &str) -> Result<(), ClientError> {
        self.begin(Operation::DeleteTask)?;
        let result = self.gateway.delete_task(task_id).await;
        self.finish(Operation::DeleteTask);

        result.map_err(|e| self.fail("Failed to delete task", e))?;
        for lists in self.lists.values_mut() {
            lists.remove(task_id);
        }
        for archived in self.archived_tasks.values_mut() {
            archived.retain(|t| t.id != task_id);
        }

        self.notify(NoticeLevel::Success, "Task deleted successfully");
        Ok(())
    }

    /// Hides a task for the rest of this session. Nothing is persisted.
    pub fn archive_task(&mut self, task_id: &str) -> Result<(), ClientError> {
        let (board_id, task) = self
            .lists
            .iter_mut()
            .find_map(|(board_id, lists)| lists.remove(task_id).map(|task| (board_id.clone(), task)))
            .ok_or_else(|| ClientError::UnknownTask(task_id.to_string()))?;

        self.archived_tasks.entry(board_id).or_default().push(task);
        self.notify(NoticeLevel::Info, "Task archived");
        Ok(())
    }

    pub fn restore_archived_task(&mut self, task_id: &str) -> Result<(), ClientError> {
        let (board_id, task) = self
            .archived_tasks
            .iter_mut()
            .find_map(|(board_id, tasks)| {
                let index = tasks.iter().position(|t| t.id == task_id)?;
                Some((board_id.clone(), tasks.remove(index)))
            })
            .ok_or_else(|| ClientError::UnknownTask(task_id.to_string()))?;

        self.lists_mut(&board_id).push(task);
        self.notify(NoticeLevel::Info, "Task restored");
        Ok(())
    }

    /// Search and status filter over the active board. Display only.
    pub fn filtered_view(&self, filter: &TaskFilter) -> Vec<FilteredColumn<'_>> {
        self.lists()
            .map(|lists| lists.filtered(filter))
            .unwrap_or_default()
    }

    /// Always yields a draft; failing sources only add a notice.
    pub async fn draft_task(&mut self, prompt: &str) -> Result<DraftReport, ClientError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(self.invalid("Please enter a prompt"));
        }

        self.begin(Operation::Generate)?;
        let report = self.drafts.draft(prompt).await;
        self.finish(Operation::Generate);

        if report.primary_failed {
            info!(source = %report.source, "assistant unavailable, draft came from a fallback");
            self.notify(NoticeLevel::Error, "Could not reach the assistant");
        }
        Ok(report)
    }

    /// Turns a confirmed draft into create-task fields. Its subtasks are kept
    /// as the board's work in progress until the task is saved.
    pub fn accept_draft(&mut self, draft: TaskDraft, column: &str) -> NewTaskRequest {
        let mut form = draft.into_form(column, Utc::now());
        form.timezone = Some(self.timezone.clone());
        if let Some(board_id) = self.active_board.clone() {
            self.settings.board_mut(&board_id).draft_subtasks = form.subtasks.clone();
        }
        form
    }

    pub fn draft_subtasks(&self) -> &[Subtask] {
        self.active_board
            .as_ref()
            .and_then(|id| self.settings.board(id))
            .map(|b| b.draft_subtasks.as_slice())
            .unwrap_or(&[])
    }

    fn find_task(&self, task_id: &str) -> Result<&Task, ClientError> {
        self.lists
            .values()
            .find_map(|lists| lists.task(task_id))
            .ok_or_else(|| ClientError::UnknownTask(task_id.to_string()))
    }

    fn lists_mut(&mut self, board_id: &str) -> &mut TaskLists {
        let columns = self.settings.column_ids(board_id);
        self.lists
            .entry(board_id.to_string())
            .or_insert_with(|| TaskLists::new(columns))
    }

    fn store_board(&mut self, board: Board) {
        match self.boards.iter_mut().find(|b| b.id == board.id) {
            Some(existing) => *existing = board,
            None => self.boards.push(board),
        }
    }

    fn reselect_if_inactive(&mut self) {
        let active_is_live = self
            .active_board
            .as_deref()
            .is_some_and(|id| self.boards.iter().any(|b| b.id == id && !b.archived));
        if !active_is_live {
            self.active_board = self.boards.iter().find(|b| !b.archived).map(|b| b.id.clone());
        }
    }

    fn require_board(&self) -> Result<String, ClientError> {
        self.active_board.clone().ok_or(ClientError::NoActiveBoard)
    }

    fn begin(&mut self, operation: Operation) -> Result<(), ClientError> {
        if self.session_expired {
            return Err(ClientError::SessionExpired);
        }
        if !self.in_flight.insert(operation) {
            return Err(ClientError::Busy(operation));
        }
        Ok(())
    }

    fn finish(&mut self, operation: Operation) {
        self.in_flight.remove(&operation);
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.notices.push(Notice {
            level,
            message: message.to_string(),
        });
    }

    fn invalid(&mut self, message: &str) -> ClientError {
        self.notify(NoticeLevel::Error, message);
        ClientError::Validation(message.to_string())
    }

    /// Logs the detail, shows the summary.
    fn fail(&mut self, summary: &str, err: GatewayError) -> ClientError {
        warn!(error = %err, "{}", summary);
        if err == GatewayError::Unauthorized {
            self.session_expired = true;
            self.notify(NoticeLevel::Error, "Your session has expired. Please sign in again.");
            return ClientError::SessionExpired;
        }
        self.notify(NoticeLevel::Error, summary);
        ClientError::Gateway(err)
    }
}
