use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Note {
    pub id: RecordId,
    pub project: RecordId,
    pub title: String, // ! & (len = 200)
    pub content: String,
    pub created_by: RecordId,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateNote {
    pub project: RecordId,
    pub title: String,
    pub content: String,
    pub created_by: RecordId,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub created_at: String,
}
