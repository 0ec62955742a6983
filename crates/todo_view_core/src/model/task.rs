use serde::{Deserialize, Serialize};

/// A server-owned task. Extra fields in the payload are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
}

/// Body of `PUT /tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub name: String,
}

impl Task {
    pub fn new<N: Into<String>>(id: i64, name: N) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
