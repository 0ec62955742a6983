use crate::api::{TASKS_PATH, TaskApi, task_path};
use crate::error::AppError;
use crate::model::{Task, TaskUpdate};
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// `TaskApi` over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: Url,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::transport(err.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        Ok(self.base_url.join(path)?)
    }
}

impl TaskApi for HttpTaskApi {
    fn list_tasks(&self) -> Result<Vec<Task>, AppError> {
        let url = self.endpoint(TASKS_PATH)?;
        let response = self.client.get(url).send()?;
        let response = check_status(response, "GET /tasks")?;
        Ok(response.json()?)
    }

    fn update_task(&self, id: i64, name: &str) -> Result<Option<Task>, AppError> {
        let url = self.endpoint(&task_path(id))?;
        let body = TaskUpdate {
            name: name.to_string(),
        };
        let response = self.client.put(url).json(&body).send()?;
        let response = check_status(response, &format!("PUT /{}", task_path(id)))?;

        let content = response.text()?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<Task>(&content) {
            Ok(task) => Ok(Some(task)),
            Err(err) => {
                debug!(id, error = %err, "update response carried no task");
                Ok(None)
            }
        }
    }

    fn delete_task(&self, id: i64) -> Result<(), AppError> {
        let url = self.endpoint(&task_path(id))?;
        let response = self.client.delete(url).send()?;
        check_status(response, &format!("DELETE /{}", task_path(id)))?;
        Ok(())
    }
}

fn check_status(response: Response, action: &str) -> Result<Response, AppError> {
    let status = response.status();
    debug!(action, status = status.as_u16(), "task api response");

    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::status(action, status.as_u16()))
    }
}

/// Parse the configured base URL and make sure relative joins keep any path
/// prefix (`http://host/api` must resolve `tasks` to `/api/tasks`).
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("API URL is required"));
    }

    let mut value = trimmed.to_string();
    if !value.ends_with('/') {
        value.push('/');
    }

    let url = Url::parse(&value)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::invalid_input(format!(
            "unsupported API URL scheme '{other}'"
        ))),
    }
}
