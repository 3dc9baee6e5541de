use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    consts::db_const::{NOTE_TABLE, PROJECT_TABLE, TASK_TABLE},
    errors::{Error, Result},
    middleware::Actor,
    models::{
        note::Note,
        project::{CreateProject, Project, ProjectStatus},
        role::Role,
        task::{Task, TaskStatus},
    },
    state::AppState,
    utils::{
        guard::create_context, record_id::record_id_from_path, time::time_now,
        validated_form::ValidatedJson,
    },
};

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

pub async fn create_project(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    ValidatedJson(input): ValidatedJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>)> {
    let project = state
        .sdb
        .create::<Option<Project>>(PROJECT_TABLE)
        .content(CreateProject::init(input.name, input.description, user_id))
        .await?
        .ok_or(Error::NotFound("Project"))?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Actor(user_id): Actor,
) -> Result<Json<Vec<Project>>> {
    let projects: Vec<Project> = state
        .sdb
        .query(
            "SELECT * FROM type::table($table) \
             WHERE $user INSIDE members.user ORDER BY created_at DESC;",
        )
        .bind(("table", PROJECT_TABLE))
        .bind(("user", user_id))
        .await?
        .take(0)?;
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(project_id): Path<String>,
) -> Result<Json<Project>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;
    ctx.require_membership()?;
    Ok(Json(ctx.project))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub color: Option<String>,
}

impl UpdateProjectRequest {
    fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = Some(description.clone());
        }
        if let Some(status) = &self.status {
            project.status = status.clone();
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
        project.updated_at = Some(time_now());
    }
}

pub async fn update_project(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(project_id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateProjectRequest>,
) -> Result<Json<Project>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id.clone(), user_id).await?;
    ctx.require_exact(Role::Admin)?;

    let mut project = ctx.project;
    input.apply_to(&mut project);
    let project = state
        .sdb
        .update::<Option<Project>>(project_id)
        .content(project)
        .await?
        .ok_or(Error::NotFound("Project"))?;

    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(project_id): Path<String>,
) -> Result<(StatusCode, String)> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id.clone(), user_id).await?;
    ctx.require_exact(Role::Admin)?;

    let _: Option<Project> = state.sdb.delete(project_id).await?;
    Ok((StatusCode::OK, "Project deleted successfully".to_string()))
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct ProjectStats {
    pub task_count: usize,
    pub completed_tasks: usize,
    pub note_count: usize,
    pub member_count: usize,
}

pub async fn get_project_stats(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectStats>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id.clone(), user_id).await?;
    ctx.require_membership()?;

    let tasks: Vec<Task> = state
        .sdb
        .query("SELECT * FROM type::table($table) WHERE project = $project;")
        .bind(("table", TASK_TABLE))
        .bind(("project", project_id.clone()))
        .await?
        .take(0)?;
    let notes: Vec<Note> = state
        .sdb
        .query("SELECT * FROM type::table($table) WHERE project = $project;")
        .bind(("table", NOTE_TABLE))
        .bind(("project", project_id))
        .await?
        .take(0)?;

    Ok(Json(ProjectStats {
        task_count: tasks.len(),
        completed_tasks: tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .count(),
        note_count: notes.len(),
        member_count: ctx.project.members.len(),
    }))
}
