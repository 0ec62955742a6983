//! The todo list view: a single-owner state container driven by user
//! actions, with every mutation followed by a full reload from the server.
//!
//! Network failures are logged and reported through the outcome values. They
//! never escape as errors, so the view stays usable (if stale) after any
//! failure.

use crate::api::TaskApi;
use crate::error::AppError;
use time::OffsetDateTime;
use tracing::{debug, error, info};

mod state;

pub use state::{RowView, ViewState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    Failed(AppError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveRejection {
    NotEditing,
    EmptyName,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was sent.
    Rejected(SaveRejection),
    Saved { reload: LoadOutcome },
    Failed(AppError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { reload: LoadOutcome },
    Failed(AppError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Unsupported,
}

impl LoadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

impl DeleteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }
}

pub struct TodoListView<A> {
    api: A,
    state: ViewState,
}

impl<A: TaskApi> TodoListView<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: ViewState::default(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn rows(&self) -> Vec<RowView> {
        self.state.rows()
    }

    /// First load when the view is shown.
    pub fn mount(&mut self) -> LoadOutcome {
        debug!("mounting todo list view");
        self.load_tasks()
    }

    pub fn load_tasks(&mut self) -> LoadOutcome {
        match self.api.list_tasks() {
            Ok(tasks) => {
                let count = tasks.len();
                self.state.replace_tasks(tasks, OffsetDateTime::now_utc());
                debug!(count, "tasks loaded");
                LoadOutcome::Loaded(count)
            }
            Err(err) => {
                error!(error = %err, "failed to load tasks");
                LoadOutcome::Failed(err)
            }
        }
    }

    pub fn begin_edit(&mut self, task_id: i64, new_text: &str) {
        self.state.begin_edit(task_id, new_text);
    }

    pub fn cancel_edit(&mut self) {
        if let Some(task_id) = self.state.editing_task_id {
            debug!(task_id, "edit cancelled");
        }
        self.state.finish_edit();
    }

    pub fn save_edit(&mut self, task_id: i64) -> SaveOutcome {
        if let Some(rejection) = self.save_rejection(task_id) {
            debug!(task_id, ?rejection, "save skipped");
            return SaveOutcome::Rejected(rejection);
        }

        let name = self.state.edited_task_name.clone();
        match self.api.update_task(task_id, &name) {
            Ok(_) => {
                info!(task_id, "task renamed");
                let reload = self.load_tasks();
                self.state.finish_edit();
                SaveOutcome::Saved { reload }
            }
            Err(err) => {
                error!(task_id, error = %err, "failed to save task");
                SaveOutcome::Failed(err)
            }
        }
    }

    pub fn delete_task(&mut self, task_id: i64) -> DeleteOutcome {
        match self.api.delete_task(task_id) {
            Ok(()) => {
                info!(task_id, "task deleted");
                let reload = self.load_tasks();
                DeleteOutcome::Deleted { reload }
            }
            Err(err) => {
                error!(task_id, error = %err, "failed to delete task");
                DeleteOutcome::Failed(err)
            }
        }
    }

    /// The "add task" control has no behaviour yet.
    pub fn add_task(&mut self) -> AddOutcome {
        debug!("add task is not supported");
        AddOutcome::Unsupported
    }

    fn save_rejection(&self, task_id: i64) -> Option<SaveRejection> {
        if self.state.edited_task_name.is_empty() {
            Some(SaveRejection::EmptyName)
        } else if !self.state.is_editing(task_id) {
            Some(SaveRejection::NotEditing)
        } else if self.state.save_disabled {
            Some(SaveRejection::Unchanged)
        } else {
            None
        }
    }
}
