use chrono::{Local, NaiveDate};

use crate::error::StoreError;
use crate::store::TaskStore;
use crate::task::Task;
use crate::validate::{self, RawTaskInput, TaskDraft};

/// The form a rejected draft belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftFor {
    New,
    Edit(String),
}

/// State behind the terminal front-end: every action goes through the
/// validator and the store, then the list is reloaded in display order.
#[derive(Debug)]
pub struct App {
    store: TaskStore,
    pub tasks: Vec<Task>,
    pub selected: usize,
    pub status: Option<String>,
    /// Values from the last rejected form, offered again on the same form.
    pub draft: Option<(DraftFor, TaskDraft)>,
}

impl App {
    pub fn new(store: TaskStore) -> Self {
        let mut app = Self {
            store,
            tasks: Vec::new(),
            selected: 0,
            status: None,
            draft: None,
        };
        app.refresh();
        app
    }

    pub fn refresh(&mut self) {
        self.tasks = self.store.list_sorted();
        self.selected = self.selected.min(self.tasks.len().saturating_sub(1));
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.tasks.get(self.selected)
    }

    /// The rejected values for `target`, if the last rejected form was that one.
    pub fn draft_for(&self, target: &DraftFor) -> Option<&TaskDraft> {
        match &self.draft {
            Some((origin, draft)) if origin == target => Some(draft),
            _ => None,
        }
    }

    pub fn move_selection(&mut self, direction: isize) {
        if self.tasks.is_empty() {
            return;
        }
        self.selected = (self.selected as isize + direction)
            .clamp(0, self.tasks.len() as isize - 1) as usize;
    }

    pub fn add_task(&mut self, raw: &RawTaskInput) {
        let fields = match validate::validate(raw) {
            Ok(fields) => fields,
            Err(err) => {
                self.status = Some(err.errors.join("; "));
                self.draft = Some((DraftFor::New, err.values));
                return;
            }
        };
        match self.store.create(fields) {
            Ok(task) => {
                self.draft = None;
                self.finish("Task created");
                self.select(&task.id);
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn edit_selected(&mut self, raw: &RawTaskInput) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let id = task.id.clone();
        let today = edit_reference_day(task.due_date, raw);

        let fields = match validate::validate_on(raw, today) {
            Ok(fields) => fields,
            Err(err) => {
                self.status = Some(err.errors.join("; "));
                self.draft = Some((DraftFor::Edit(id), err.values));
                return;
            }
        };
        match self.store.update(&id, fields) {
            Ok(_) => {
                self.draft = None;
                self.finish("Task updated");
                self.select(&id);
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            return;
        };
        match self.store.toggle_done(&id) {
            Ok(task) => {
                self.finish(if task.done { "Task completed" } else { "Task reopened" });
                self.select(&id);
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            return;
        };
        match self.store.delete(&id) {
            Ok(_) => self.finish("Task deleted"),
            Err(err) => self.fail(err),
        }
    }

    fn select(&mut self, id: &str) {
        if let Some(idx) = self.tasks.iter().position(|t| t.id == id) {
            self.selected = idx;
        }
    }

    fn finish(&mut self, message: &str) {
        self.status = Some(message.to_string());
        self.refresh();
    }

    fn fail(&mut self, err: StoreError) {
        self.status = Some(match &err {
            StoreError::NotFound(_) => "Task not found".to_string(),
            StoreError::InvalidId(_) => "Invalid id format".to_string(),
            _ => {
                tracing::error!(error = %err, "store operation failed");
                err.to_string()
            }
        });
        self.refresh();
    }
}

// An edit that leaves an already-passed due date untouched is not a new
// past date, so the check runs against that date instead of today.
fn edit_reference_day(current: Option<NaiveDate>, raw: &RawTaskInput) -> NaiveDate {
    let today = Local::now().date_naive();
    match current {
        Some(due) if raw.due_date.as_deref().map(str::trim) == Some(due.to_string().as_str()) => {
            today.min(due)
        }
        _ => today,
    }
}
