//! Column state for one board: ordered task sequences keyed by status.
//!
//! Every column keeps its pinned tasks ahead of unpinned ones with relative
//! order preserved inside each group. Tasks that arrive or change group are
//! slotted by rank (`position`), the order the gateway lists them in, and
//! moves report the rank changes that must be persisted, so a reload
//! reproduces the same order.

use std::cmp::Ordering;

use thiserror::Error;

use crate::models::Task;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ListError {
    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("no task at index {index} of column {column:?} ({len} tasks)")]
    IndexOutOfRange {
        column: String,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: String,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankUpdate {
    pub task_id: String,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub task_id: String,
    pub from: String,
    pub to: String,
    /// The moved task comes first, followed by any neighbours that were renumbered.
    pub ranks: Vec<RankUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskLists {
    columns: Vec<Column>,
}

impl TaskLists {
    pub fn new<I, S>(column_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lists = Self::default();
        for id in column_ids {
            lists.ensure_column(&id.into());
        }
        lists
    }

    /// Groups tasks by status, keeping the given order within each column.
    /// Statuses with no matching column get one appended.
    pub fn from_tasks<I, S>(column_ids: I, tasks: Vec<Task>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lists = Self::new(column_ids);
        for task in tasks {
            let column = lists.ensure_column(&task.status);
            lists.columns[column].tasks.push(task);
        }
        for column in &mut lists.columns {
            pinned_first(&mut column.tasks);
        }
        lists
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&[Task]> {
        self.columns
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.tasks.as_slice())
    }

    pub fn column_ids(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the column, created empty at the end when missing.
    pub fn ensure_column(&mut self, id: &str) -> usize {
        match self.column_index(id) {
            Some(index) => index,
            None => {
                self.columns.push(Column {
                    id: id.to_string(),
                    tasks: Vec::new(),
                });
                self.columns.len() - 1
            }
        }
    }

    /// Drops the column and hands back the tasks it held.
    pub fn remove_column(&mut self, id: &str) -> Vec<Task> {
        match self.column_index(id) {
            Some(index) => self.columns.remove(index).tasks,
            None => Vec::new(),
        }
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.locate(task_id)
            .map(|(column, index)| &self.columns[column].tasks[index])
    }

    /// `(column index, task index)` of a task.
    pub fn locate(&self, task_id: &str) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(c, column)| {
            column
                .tasks
                .iter()
                .position(|t| t.id == task_id)
                .map(|i| (c, i))
        })
    }

    /// Moves one task and re-ranks it. `Ok(None)` means nothing changed.
    pub fn move_task(
        &mut self,
        source_column: &str,
        source_index: usize,
        dest_column: &str,
        dest_index: usize,
    ) -> Result<Option<MoveOutcome>, ListError> {
        if source_column == dest_column && source_index == dest_index {
            return Ok(None);
        }

        let src = self
            .column_index(source_column)
            .ok_or_else(|| ListError::UnknownColumn(source_column.to_string()))?;
        let dst = self
            .column_index(dest_column)
            .ok_or_else(|| ListError::UnknownColumn(dest_column.to_string()))?;

        let len = self.columns[src].tasks.len();
        if source_index >= len {
            return Err(ListError::IndexOutOfRange {
                column: source_column.to_string(),
                index: source_index,
                len,
            });
        }

        let mut task = self.columns[src].tasks.remove(source_index);
        let task_id = task.id.clone();
        task.status = dest_column.to_string();

        let dest = &mut self.columns[dst].tasks;
        let at = dest_index.min(dest.len());
        dest.insert(at, task);
        pinned_first(dest);
        let ranks = rerank(dest, &task_id);

        Ok(Some(MoveOutcome {
            task_id,
            from: source_column.to_string(),
            to: dest_column.to_string(),
            ranks,
        }))
    }

    /// Adds to the column named by the task's status, at its ranked slot.
    pub fn push(&mut self, task: Task) {
        let column = self.ensure_column(&task.status);
        insert_ranked(&mut self.columns[column].tasks, task);
    }

    /// Swaps in a fresh copy of a task. A changed status, pin or rank moves it
    /// to its ranked slot. Returns false when the task is not loaded.
    pub fn replace(&mut self, task: Task) -> bool {
        let Some((column, index)) = self.locate(&task.id) else {
            return false;
        };

        let slot = &self.columns[column].tasks[index];
        let same_slot = self.columns[column].id == task.status
            && slot.pinned == task.pinned
            && slot.position == task.position;
        if same_slot {
            self.columns[column].tasks[index] = task;
        } else {
            self.columns[column].tasks.remove(index);
            self.push(task);
        }
        true
    }

    /// Applies a server copy only if the task still sits in the column the
    /// copy names. Local order is kept.
    pub fn merge(&mut self, task: Task) -> bool {
        match self.locate(&task.id) {
            Some((column, index)) if self.columns[column].id == task.status => {
                let slot = &mut self.columns[column].tasks[index];
                let position = slot.position;
                let pinned = slot.pinned;
                *slot = Task {
                    position,
                    pinned,
                    ..task
                };
                true
            }
            _ => false,
        }
    }

    pub fn set_pinned(&mut self, task_id: &str, pinned: bool) -> bool {
        let Some((column, index)) = self.locate(task_id) else {
            return false;
        };
        let tasks = &mut self.columns[column].tasks;
        if tasks[index].pinned != pinned {
            let mut task = tasks.remove(index);
            task.pinned = pinned;
            insert_ranked(tasks, task);
        }
        true
    }

    pub fn set_completed(&mut self, task_id: &str, completed: bool) -> bool {
        let Some((column, index)) = self.locate(task_id) else {
            return false;
        };
        self.columns[column].tasks[index].completed = completed;
        true
    }

    pub fn remove(&mut self, task_id: &str) -> Option<Task> {
        let (column, index) = self.locate(task_id)?;
        Some(self.columns[column].tasks.remove(index))
    }

    /// Read-only view for display; the underlying state is untouched.
    pub fn filtered(&self, filter: &TaskFilter) -> Vec<FilteredColumn<'_>> {
        self.columns
            .iter()
            .filter(|column| filter.shows_column(&column.id))
            .map(|column| {
                let mut tasks: Vec<&Task> =
                    column.tasks.iter().filter(|t| filter.matches(t)).collect();
                tasks.sort_by_key(|t| !t.pinned);
                FilteredColumn {
                    id: &column.id,
                    tasks,
                }
            })
            .collect()
    }

    fn column_index(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }
}

/// Stable: relative order inside each group survives.
fn pinned_first(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| !t.pinned);
}

/// Gateway listing order: pinned first, then ascending rank, newest first
/// on equal ranks.
fn rank_order(a: &Task, b: &Task) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then(a.position.total_cmp(&b.position))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Inserts ahead of the first task that lists after it. The rest of the
/// column keeps its order.
fn insert_ranked(tasks: &mut Vec<Task>, task: Task) {
    let at = tasks
        .iter()
        .position(|t| rank_order(t, &task) == Ordering::Greater)
        .unwrap_or(tasks.len());
    tasks.insert(at, task);
}

/// Gives the moved task a rank between its neighbours in the same pin group.
/// Falls back to renumbering the group when the existing ranks are out of
/// order or no gap is left.
fn rerank(tasks: &mut [Task], moved_id: &str) -> Vec<RankUpdate> {
    let Some(index) = tasks.iter().position(|t| t.id == moved_id) else {
        return Vec::new();
    };
    let pinned = tasks[index].pinned;

    let group_sorted = tasks
        .iter()
        .filter(|t| t.pinned == pinned && t.id != moved_id)
        .map(|t| t.position)
        .collect::<Vec<_>>()
        .windows(2)
        .all(|pair| pair[0] < pair[1]);

    if group_sorted {
        let prev = index
            .checked_sub(1)
            .map(|i| &tasks[i])
            .filter(|t| t.pinned == pinned)
            .map(|t| t.position);
        let next = tasks
            .get(index + 1)
            .filter(|t| t.pinned == pinned)
            .map(|t| t.position);

        if let Some(position) = rank_between(prev, next) {
            tasks[index].position = position;
            return vec![RankUpdate {
                task_id: moved_id.to_string(),
                position,
            }];
        }
    }

    let mut moved = None;
    let mut others = Vec::new();
    let mut rank = 0.0;
    for task in tasks.iter_mut().filter(|t| t.pinned == pinned) {
        let changed = task.position != rank;
        task.position = rank;
        if task.id == moved_id {
            moved = Some(RankUpdate {
                task_id: task.id.clone(),
                position: rank,
            });
        } else if changed {
            others.push(RankUpdate {
                task_id: task.id.clone(),
                position: rank,
            });
        }
        rank += 1.0;
    }

    moved.into_iter().chain(others).collect()
}

fn rank_between(prev: Option<f64>, next: Option<f64>) -> Option<f64> {
    let rank = match (prev, next) {
        (None, None) => 0.0,
        (Some(prev), None) => prev + 1.0,
        (None, Some(next)) => next - 1.0,
        (Some(prev), Some(next)) => {
            let mid = prev + (next - prev) / 2.0;
            if !(prev < mid && mid < next) {
                return None;
            }
            mid
        }
    };
    rank.is_finite().then_some(rank)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(String),
}

/// Case-insensitive text search plus an optional status restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: String,
    pub status: StatusFilter,
}

impl TaskFilter {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: text.into(),
            status: StatusFilter::All,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = StatusFilter::Only(status.into());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        let needle = self.search.trim().to_lowercase();
        let text_matches = needle.is_empty()
            || task.title.to_lowercase().contains(&needle)
            || task.description.to_lowercase().contains(&needle);

        text_matches && self.shows_column(&task.status)
    }

    fn shows_column(&self, id: &str) -> bool {
        match &self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => status == id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilteredColumn<'a> {
    pub id: &'a str,
    pub tasks: Vec<&'a Task>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: &str, position: f64, pinned: bool) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: String::new(),
            board_id: "b1".to_string(),
            user_id: "u1".to_string(),
            status: status.to_string(),
            pinned,
            completed: false,
            due_at: None,
            position,
            subtasks: Vec::new(),
            history: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn ids(lists: &TaskLists, column: &str) -> Vec<String> {
        lists
            .column(column)
            .unwrap()
            .iter()
            .map(|t| t.id.clone())
            .collect()
    }

    fn board() -> TaskLists {
        TaskLists::from_tasks(
            ["todo", "inprogress", "done"],
            vec![
                task("a", "todo", 0.0, false),
                task("b", "todo", 1.0, false),
                task("c", "todo", 2.0, false),
                task("d", "inprogress", 0.0, false),
            ],
        )
    }

    #[test]
    fn from_tasks_puts_pinned_first_and_adds_unknown_columns() {
        let lists = TaskLists::from_tasks(
            ["todo", "inprogress", "done"],
            vec![
                task("a", "todo", 0.0, false),
                task("b", "todo", 1.0, true),
                task("c", "review", 0.0, false),
            ],
        );

        assert_eq!(ids(&lists, "todo"), ["b", "a"]);
        assert_eq!(lists.column_ids(), ["todo", "inprogress", "done", "review"]);
    }

    #[test]
    fn move_within_column_is_permutation() {
        let mut lists = board();
        let outcome = lists.move_task("todo", 0, "todo", 2).unwrap().unwrap();

        assert_eq!(ids(&lists, "todo"), ["b", "c", "a"]);
        assert_eq!(outcome.ranks, vec![RankUpdate { task_id: "a".into(), position: 3.0 }]);
        assert_eq!(lists.len(), 4);
    }

    #[test]
    fn move_across_columns_updates_status() {
        let mut lists = board();
        let outcome = lists.move_task("todo", 1, "inprogress", 0).unwrap().unwrap();

        assert_eq!(ids(&lists, "todo"), ["a", "c"]);
        assert_eq!(ids(&lists, "inprogress"), ["b", "d"]);
        assert_eq!(lists.task("b").unwrap().status, "inprogress");
        assert_eq!(outcome.from, "todo");
        assert_eq!(outcome.to, "inprogress");
        assert_eq!(outcome.ranks[0].position, -1.0);
    }

    #[test]
    fn same_slot_is_a_no_op() {
        let mut lists = board();
        let before = lists.clone();
        assert_eq!(lists.move_task("todo", 1, "todo", 1).unwrap(), None);
        assert_eq!(lists, before);
    }

    #[test]
    fn midpoint_between_neighbours() {
        let mut lists = board();
        let outcome = lists.move_task("todo", 2, "todo", 1).unwrap().unwrap();

        assert_eq!(ids(&lists, "todo"), ["a", "c", "b"]);
        assert_eq!(outcome.ranks, vec![RankUpdate { task_id: "c".into(), position: 0.5 }]);
    }

    #[test]
    fn out_of_order_ranks_are_renumbered() {
        // locally appended task carries a rank lower than its neighbours
        let mut lists = TaskLists::from_tasks(
            ["todo"],
            vec![
                task("a", "todo", 0.0, false),
                task("b", "todo", 1.0, false),
                task("n", "todo", -1.0, false),
            ],
        );
        let outcome = lists.move_task("todo", 0, "todo", 3).unwrap().unwrap();

        assert_eq!(ids(&lists, "todo"), ["b", "n", "a"]);
        let positions: Vec<f64> = lists.column("todo").unwrap().iter().map(|t| t.position).collect();
        assert_eq!(positions, [0.0, 1.0, 2.0]);
        assert_eq!(outcome.ranks[0].task_id, "a");
        assert_eq!(outcome.ranks.len(), 3);
    }

    #[test]
    fn unpinned_task_cannot_jump_pinned_group() {
        let mut lists = TaskLists::from_tasks(
            ["todo"],
            vec![
                task("p", "todo", 0.0, true),
                task("a", "todo", 0.0, false),
                task("b", "todo", 1.0, false),
            ],
        );
        lists.move_task("todo", 2, "todo", 0).unwrap();

        assert_eq!(ids(&lists, "todo"), ["p", "b", "a"]);
    }

    #[test]
    fn invalid_moves_are_rejected() {
        let mut lists = board();
        assert_eq!(
            lists.move_task("nope", 0, "todo", 0),
            Err(ListError::UnknownColumn("nope".into()))
        );
        assert!(matches!(
            lists.move_task("done", 0, "todo", 0),
            Err(ListError::IndexOutOfRange { len: 0, .. })
        ));
        assert_eq!(lists, board());
    }

    #[test]
    fn pin_toggle_slots_task_by_rank() {
        let mut lists = board();
        lists.set_pinned("c", true);
        assert_eq!(ids(&lists, "todo"), ["c", "a", "b"]);
        lists.set_pinned("c", false);
        assert_eq!(ids(&lists, "todo"), ["a", "b", "c"]);
    }

    #[test]
    fn pinned_group_follows_rank_not_pin_order() {
        // newest-first column as the gateway lists it
        let mut lists = TaskLists::from_tasks(
            ["todo"],
            vec![
                task("c", "todo", -2.0, false),
                task("b", "todo", -1.0, false),
                task("a", "todo", 0.0, false),
            ],
        );
        lists.set_pinned("a", true);
        assert_eq!(ids(&lists, "todo"), ["a", "c", "b"]);
        lists.set_pinned("c", true);
        assert_eq!(ids(&lists, "todo"), ["c", "a", "b"]);
    }

    #[test]
    fn pushed_task_lands_at_its_rank() {
        let mut lists = board();
        lists.push(task("n", "todo", -1.0, false));
        assert_eq!(ids(&lists, "todo"), ["n", "a", "b", "c"]);

        lists.push(task("z", "todo", 5.0, false));
        assert_eq!(ids(&lists, "todo"), ["n", "a", "b", "c", "z"]);

        let mut older = task("o", "todo", -1.0, false);
        older.created_at = "2025-01-01T00:00:00.000000Z".into();
        let mut newer = task("m", "todo", -1.0, false);
        newer.created_at = "2026-01-01T00:00:00.000000Z".into();
        lists.push(older);
        lists.push(newer);
        assert_eq!(ids(&lists, "todo")[..4], ["m", "o", "n", "a"]);
    }

    #[test]
    fn replace_relocates_on_status_change() {
        let mut lists = board();
        let mut moved = lists.task("a").unwrap().clone();
        moved.status = "done".into();

        assert!(lists.replace(moved));
        assert_eq!(ids(&lists, "todo"), ["b", "c"]);
        assert_eq!(ids(&lists, "done"), ["a"]);
    }

    #[test]
    fn merge_skips_tasks_that_moved_on() {
        let mut lists = board();
        let mut stale = lists.task("a").unwrap().clone();
        stale.status = "inprogress".into();
        stale.title = "stale".into();

        assert!(!lists.merge(stale));
        assert_eq!(lists.task("a").unwrap().title, "Task a");

        let mut fresh = lists.task("b").unwrap().clone();
        fresh.title = "renamed".into();
        fresh.position = 99.0;
        assert!(lists.merge(fresh));
        assert_eq!(lists.task("b").unwrap().title, "renamed");
        assert_eq!(lists.task("b").unwrap().position, 1.0);
    }

    #[test]
    fn filter_matches_text_and_status() {
        let mut lists = board();
        lists.set_pinned("c", true);

        let view = lists.filtered(&TaskFilter::search("TASK"));
        assert_eq!(view.len(), 3);
        assert_eq!(view[0].tasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["c", "a", "b"]);

        let view = lists.filtered(&TaskFilter::search("task d").with_status("inprogress"));
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].tasks.len(), 1);

        assert!(lists.filtered(&TaskFilter::search("zzz")).iter().all(|c| c.tasks.is_empty()));
    }
}
