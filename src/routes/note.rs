use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    consts::db_const::{NOTE_TABLE, PROJECT_TABLE},
    errors::{Error, Result},
    middleware::Actor,
    models::{
        note::{CreateNote, Note},
        role::Role,
    },
    state::AppState,
    utils::{
        guard::{ProjectContext, create_context},
        record_id::record_id_from_path,
        time::time_now,
        validated_form::ValidatedJson,
    },
};

async fn note_in_project(state: &AppState, ctx: &ProjectContext, note_id: &str) -> Result<Note> {
    let note_id = record_id_from_path(NOTE_TABLE, note_id)?;
    let note: Note = state
        .sdb
        .select(note_id)
        .await?
        .ok_or(Error::NotFound("Note"))?;
    if note.project != ctx.project.id {
        return Err(Error::NotFound("Note"));
    }
    Ok(note)
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Validate)]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
}

pub async fn create_note(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(project_id): Path<String>,
    ValidatedJson(input): ValidatedJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>)> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id.clone(), user_id.clone()).await?;
    ctx.require_role_at_least(Role::ProjectAdmin)?;

    let note = state
        .sdb
        .create::<Option<Note>>(NOTE_TABLE)
        .content(CreateNote {
            project: project_id,
            title: input.title,
            content: input.content,
            created_by: user_id,
            tags: input
                .tags
                .unwrap_or_default()
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
            is_pinned: input.is_pinned.unwrap_or(false),
            created_at: time_now(),
        })
        .await?
        .ok_or(Error::NotFound("Note"))?;

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list_notes(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Note>>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id.clone(), user_id).await?;
    ctx.require_membership()?;

    let notes: Vec<Note> = state
        .sdb
        .query(
            "SELECT * FROM type::table($table) WHERE project = $project \
             ORDER BY is_pinned DESC, created_at DESC;",
        )
        .bind(("table", NOTE_TABLE))
        .bind(("project", project_id))
        .await?
        .take(0)?;
    Ok(Json(notes))
}

pub async fn get_note(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, note_id)): Path<(String, String)>,
) -> Result<Json<Note>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;
    ctx.require_membership()?;

    Ok(Json(note_in_project(&state, &ctx, &note_id).await?))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Validate)]
pub struct UpdateNoteRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
}

pub async fn update_note(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, note_id)): Path<(String, String)>,
    ValidatedJson(input): ValidatedJson<UpdateNoteRequest>,
) -> Result<Json<Note>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;
    ctx.require_role_at_least(Role::ProjectAdmin)?;

    let mut note = note_in_project(&state, &ctx, &note_id).await?;
    if let Some(title) = input.title {
        note.title = title;
    }
    if let Some(content) = input.content {
        note.content = content;
    }
    if let Some(tags) = input.tags {
        note.tags = tags.into_iter().map(|t| t.trim().to_lowercase()).collect();
    }
    if let Some(is_pinned) = input.is_pinned {
        note.is_pinned = is_pinned;
    }
    note.updated_at = Some(time_now());

    let note = state
        .sdb
        .update::<Option<Note>>(note.id.clone())
        .content(note)
        .await?
        .ok_or(Error::NotFound("Note"))?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, note_id)): Path<(String, String)>,
) -> Result<(StatusCode, String)> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;
    ctx.require_exact(Role::Admin)?;

    let note = note_in_project(&state, &ctx, &note_id).await?;
    let _: Option<Note> = state.sdb.delete(note.id).await?;

    Ok((StatusCode::OK, "Note deleted successfully".to_string()))
}
