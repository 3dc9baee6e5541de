use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Task {
    pub id: RecordId,
    pub project: RecordId,
    pub title: String, // ! & (len = 200)
    pub description: Option<String>,
    pub created_by: RecordId,
    pub assigned_to: Option<RecordId>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<String>,
    pub labels: Vec<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateTask {
    pub project: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub created_by: RecordId,
    pub assigned_to: Option<RecordId>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<String>,
    pub labels: Vec<String>,
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Subtask {
    pub id: RecordId,
    pub task: RecordId,
    pub project: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub created_by: RecordId,
    pub assigned_to: Option<RecordId>,
    pub status: TaskStatus,
    pub position: i64, // ! monotonic within the parent task
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateSubtask {
    pub task: RecordId,
    pub project: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub created_by: RecordId,
    pub assigned_to: Option<RecordId>,
    pub status: TaskStatus,
    pub position: i64,
    pub created_at: String,
}
