use crate::model::Task;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Everything the list view knows. Only `TodoListView` mutates it; the
/// update functions here never touch the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub tasks: Vec<Task>,
    pub editing_task_id: Option<i64>,
    pub edited_task_name: String,
    pub save_disabled: bool,
    pub last_loaded_at: Option<OffsetDateTime>,
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub id: i64,
    pub text: String,
    pub editing: bool,
    pub save_enabled: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            editing_task_id: None,
            edited_task_name: String::new(),
            save_disabled: true,
            last_loaded_at: None,
        }
    }
}

impl ViewState {
    pub fn replace_tasks(&mut self, tasks: Vec<Task>, loaded_at: OffsetDateTime) {
        self.tasks = tasks;
        self.last_loaded_at = Some(loaded_at);
    }

    pub fn original_name(&self, task_id: i64) -> Option<&str> {
        self.tasks
            .iter()
            .find(|task| task.id == task_id)
            .map(|task| task.name.as_str())
    }

    /// A keystroke in a row's field. Switching rows overwrites the buffer, so
    /// no text carries over from the previously edited row.
    pub fn begin_edit(&mut self, task_id: i64, new_text: &str) {
        self.save_disabled =
            new_text.is_empty() || self.original_name(task_id) == Some(new_text);
        self.edited_task_name = new_text.to_string();
        self.editing_task_id = Some(task_id);
    }

    pub fn is_editing(&self, task_id: i64) -> bool {
        self.editing_task_id == Some(task_id)
    }

    pub fn can_save(&self, task_id: i64) -> bool {
        self.is_editing(task_id) && !self.save_disabled && !self.edited_task_name.is_empty()
    }

    pub fn finish_edit(&mut self) {
        self.editing_task_id = None;
        self.edited_task_name.clear();
        self.save_disabled = true;
    }

    pub fn rows(&self) -> Vec<RowView> {
        self.tasks
            .iter()
            .map(|task| {
                let editing = self.is_editing(task.id);
                let text = if editing {
                    self.edited_task_name.clone()
                } else {
                    task.name.clone()
                };
                RowView {
                    id: task.id,
                    text,
                    editing,
                    save_enabled: self.can_save(task.id),
                }
            })
            .collect()
    }

    pub fn last_loaded_label(&self) -> Option<String> {
        self.last_loaded_at
            .and_then(|loaded_at| loaded_at.format(&Rfc3339).ok())
    }
}
