use crate::error::AppError;
use crate::model::Task;

mod http;

pub use http::HttpTaskApi;

pub const TASKS_PATH: &str = "tasks";

/// Client side of the task REST API.
///
/// Transport failures and non-success statuses both come back as `Err`; the
/// caller decides whether they are fatal.
pub trait TaskApi {
    /// `GET /tasks`
    fn list_tasks(&self) -> Result<Vec<Task>, AppError>;

    /// `PUT /tasks/{id}` with `{ "name": .. }`. Returns the updated task when
    /// the server sends one back.
    fn update_task(&self, id: i64, name: &str) -> Result<Option<Task>, AppError>;

    /// `DELETE /tasks/{id}`
    fn delete_task(&self, id: i64) -> Result<(), AppError>;
}

impl<T: TaskApi + ?Sized> TaskApi for &T {
    fn list_tasks(&self) -> Result<Vec<Task>, AppError> {
        (**self).list_tasks()
    }

    fn update_task(&self, id: i64, name: &str) -> Result<Option<Task>, AppError> {
        (**self).update_task(id, name)
    }

    fn delete_task(&self, id: i64) -> Result<(), AppError> {
        (**self).delete_task(id)
    }
}

pub fn task_path(id: i64) -> String {
    format!("{TASKS_PATH}/{id}")
}
