use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use surrealdb::RecordId;
use validator::Validate;

use crate::{
    consts::db_const::{PROJECT_TABLE, SUBTASK_TABLE, TASK_TABLE, USER_TABLE},
    errors::{Error, Result},
    middleware::Actor,
    models::{
        role::Role,
        task::{CreateSubtask, CreateTask, Subtask, Task, TaskPriority, TaskStatus},
    },
    state::AppState,
    utils::{
        guard::{ProjectContext, create_context},
        record_id::record_id_from_path,
        time::time_now,
        validated_form::ValidatedJson,
    },
};

async fn task_in_project(
    state: &AppState,
    ctx: &ProjectContext,
    task_id: &str,
) -> Result<Task> {
    let task_id = record_id_from_path(TASK_TABLE, task_id)?;
    let task: Task = state
        .sdb
        .select(task_id)
        .await?
        .ok_or(Error::NotFound("Task"))?;
    if task.project != ctx.project.id {
        return Err(Error::NotFound("Task"));
    }
    Ok(task)
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<String>,
    pub labels: Option<Vec<String>>,
}

pub async fn create_task(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(project_id): Path<String>,
    ValidatedJson(input): ValidatedJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>)> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id.clone(), user_id.clone()).await?;
    ctx.require_role_at_least(Role::ProjectAdmin)?;

    let assigned_to = input
        .assigned_to
        .map(|raw| record_id_from_path(USER_TABLE, &raw))
        .transpose()?;

    let task = state
        .sdb
        .create::<Option<Task>>(TASK_TABLE)
        .content(CreateTask {
            project: project_id,
            title: input.title,
            description: input.description,
            created_by: user_id,
            assigned_to,
            status: TaskStatus::Todo,
            priority: input.priority.unwrap_or(TaskPriority::Medium),
            due_date: input.due_date,
            labels: input
                .labels
                .unwrap_or_default()
                .into_iter()
                .map(|l| l.trim().to_lowercase())
                .collect(),
            created_at: time_now(),
        })
        .await?
        .ok_or(Error::NotFound("Task"))?;

    Ok((StatusCode::CREATED, Json(task)))
}

#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<String>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(project_id): Path<String>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<Task>>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id.clone(), user_id).await?;
    ctx.require_membership()?;

    let mut tasks: Vec<Task> = state
        .sdb
        .query(
            "SELECT * FROM type::table($table) \
             WHERE project = $project ORDER BY created_at DESC;",
        )
        .bind(("table", TASK_TABLE))
        .bind(("project", project_id))
        .await?
        .take(0)?;

    if let Some(status) = filter.status {
        tasks.retain(|t| t.status == status);
    }
    if let Some(assigned) = filter.assigned_to {
        let assigned = record_id_from_path(USER_TABLE, &assigned)?;
        tasks.retain(|t| t.assigned_to.as_ref() == Some(&assigned));
    }
    Ok(Json(tasks))
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct TaskDetails {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Subtask>,
}

pub async fn get_task(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, task_id)): Path<(String, String)>,
) -> Result<Json<TaskDetails>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;
    ctx.require_membership()?;

    let task = task_in_project(&state, &ctx, &task_id).await?;
    let subtasks = subtasks_of(&state, &task.id).await?;
    Ok(Json(TaskDetails { task, subtasks }))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<String>,
    pub labels: Option<Vec<String>>,
}

impl UpdateTaskRequest {
    fn apply_to(&self, task: &mut Task, assigned_to: Option<RecordId>) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if assigned_to.is_some() {
            task.assigned_to = assigned_to;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = Some(due_date.clone());
        }
        if let Some(labels) = &self.labels {
            task.labels = labels.iter().map(|l| l.trim().to_lowercase()).collect();
        }
        if let Some(status) = self.status {
            set_status(task, status);
        }
        task.updated_at = Some(time_now());
    }
}

fn set_status(task: &mut Task, status: TaskStatus) {
    task.status = status;
    task.completed_at = match status {
        TaskStatus::Done => Some(time_now()),
        _ => None,
    };
}

pub async fn update_task(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, task_id)): Path<(String, String)>,
    ValidatedJson(input): ValidatedJson<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;
    ctx.require_role_at_least(Role::ProjectAdmin)?;

    let mut task = task_in_project(&state, &ctx, &task_id).await?;
    let assigned_to = input
        .assigned_to
        .as_ref()
        .map(|raw| record_id_from_path(USER_TABLE, raw))
        .transpose()?;
    input.apply_to(&mut task, assigned_to);

    let task = state
        .sdb
        .update::<Option<Task>>(task.id.clone())
        .content(task)
        .await?
        .ok_or(Error::NotFound("Task"))?;
    Ok(Json(task))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

/// Any member may move a task through the board.
pub async fn update_task_status(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, task_id)): Path<(String, String)>,
    Json(input): Json<UpdateStatusRequest>,
) -> Result<Json<Task>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;
    ctx.require_membership()?;

    let mut task = task_in_project(&state, &ctx, &task_id).await?;
    set_status(&mut task, input.status);
    task.updated_at = Some(time_now());

    let task = state
        .sdb
        .update::<Option<Task>>(task.id.clone())
        .content(task)
        .await?
        .ok_or(Error::NotFound("Task"))?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, task_id)): Path<(String, String)>,
) -> Result<(StatusCode, String)> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;
    ctx.require_exact(Role::Admin)?;

    let task = task_in_project(&state, &ctx, &task_id).await?;
    let _: Vec<Subtask> = state
        .sdb
        .query("DELETE FROM type::table($table) WHERE task = $task RETURN BEFORE;")
        .bind(("table", SUBTASK_TABLE))
        .bind(("task", task.id.clone()))
        .await?
        .take(0)?;
    let _: Option<Task> = state.sdb.delete(task.id).await?;

    Ok((StatusCode::OK, "Task deleted successfully".to_string()))
}

// ? Subtasks

async fn subtasks_of(state: &AppState, task: &RecordId) -> Result<Vec<Subtask>> {
    let subtasks: Vec<Subtask> = state
        .sdb
        .query(
            "SELECT * FROM type::table($table) \
             WHERE task = $task ORDER BY position ASC;",
        )
        .bind(("table", SUBTASK_TABLE))
        .bind(("task", task.clone()))
        .await?
        .take(0)?;
    Ok(subtasks)
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Validate)]
pub struct CreateSubtaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
}

pub async fn create_subtask(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, task_id)): Path<(String, String)>,
    ValidatedJson(input): ValidatedJson<CreateSubtaskRequest>,
) -> Result<(StatusCode, Json<Subtask>)> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id.clone(), user_id.clone()).await?;
    ctx.require_role_at_least(Role::ProjectAdmin)?;

    let task = task_in_project(&state, &ctx, &task_id).await?;
    let assigned_to = input
        .assigned_to
        .map(|raw| record_id_from_path(USER_TABLE, &raw))
        .transpose()?;

    let position = subtasks_of(&state, &task.id)
        .await?
        .last()
        .map(|s| s.position + 1)
        .unwrap_or(1);

    let subtask = state
        .sdb
        .create::<Option<Subtask>>(SUBTASK_TABLE)
        .content(CreateSubtask {
            task: task.id,
            project: project_id,
            title: input.title,
            description: input.description,
            created_by: user_id,
            assigned_to,
            status: TaskStatus::Todo,
            position,
            created_at: time_now(),
        })
        .await?
        .ok_or(Error::NotFound("Subtask"))?;

    Ok((StatusCode::CREATED, Json(subtask)))
}

pub async fn list_subtasks(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, task_id)): Path<(String, String)>,
) -> Result<Json<Vec<Subtask>>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;
    ctx.require_membership()?;

    let task = task_in_project(&state, &ctx, &task_id).await?;
    Ok(Json(subtasks_of(&state, &task.id).await?))
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Validate)]
pub struct UpdateSubtaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

pub async fn update_subtask(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, subtask_id)): Path<(String, String)>,
    ValidatedJson(input): ValidatedJson<UpdateSubtaskRequest>,
) -> Result<Json<Subtask>> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;

    // members may toggle status; structural edits need project_admin
    if input.title.is_some() || input.description.is_some() {
        ctx.require_role_at_least(Role::ProjectAdmin)?;
    } else {
        ctx.require_membership()?;
    }

    let subtask_id = record_id_from_path(SUBTASK_TABLE, &subtask_id)?;
    let mut subtask: Subtask = state
        .sdb
        .select(subtask_id)
        .await?
        .ok_or(Error::NotFound("Subtask"))?;
    if subtask.project != ctx.project.id {
        return Err(Error::NotFound("Subtask"));
    }

    if let Some(title) = input.title {
        subtask.title = title;
    }
    if let Some(description) = input.description {
        subtask.description = Some(description);
    }
    if let Some(status) = input.status {
        subtask.status = status;
        subtask.completed_at = match status {
            TaskStatus::Done => Some(time_now()),
            _ => None,
        };
    }
    subtask.updated_at = Some(time_now());

    let subtask = state
        .sdb
        .update::<Option<Subtask>>(subtask.id.clone())
        .content(subtask)
        .await?
        .ok_or(Error::NotFound("Subtask"))?;
    Ok(Json(subtask))
}

pub async fn delete_subtask(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path((project_id, subtask_id)): Path<(String, String)>,
) -> Result<(StatusCode, String)> {
    let project_id = record_id_from_path(PROJECT_TABLE, &project_id)?;
    let ctx = create_context(&state.sdb, project_id, user_id).await?;
    ctx.require_exact(Role::Admin)?;

    let subtask_id = record_id_from_path(SUBTASK_TABLE, &subtask_id)?;
    let subtask: Subtask = state
        .sdb
        .select(subtask_id.clone())
        .await?
        .ok_or(Error::NotFound("Subtask"))?;
    if subtask.project != ctx.project.id {
        return Err(Error::NotFound("Subtask"));
    }
    let _: Option<Subtask> = state.sdb.delete(subtask_id).await?;

    Ok((StatusCode::OK, "Subtask deleted successfully".to_string()))
}
