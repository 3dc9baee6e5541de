use axum::{
    Router, middleware,
    routing::{delete, get, patch, post, put},
};

use crate::{
    middleware::auth_jwt_middleware,
    routes::{
        auth::{current_user, login, register, verify_email},
        member::{
            accept_invitation, add_project_member, remove_project_member, update_member_role,
        },
        note::{create_note, delete_note, get_note, list_notes, update_note},
        project::{
            create_project, delete_project, get_project, get_project_stats, list_projects,
            update_project,
        },
        task::{
            create_subtask, create_task, delete_subtask, delete_task, get_task, list_subtasks,
            list_tasks, update_subtask, update_task, update_task_status,
        },
    },
    state::AppState,
};

pub mod auth;
pub mod member;
pub mod note;
pub mod project;
pub mod task;

pub fn api_router(config: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(config.clone()))
        .nest("/projects", project_routes(config.clone()))
        .with_state(config)
}

fn auth_routes(config: AppState) -> Router<AppState> {
    let unprotected = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify/{token}", get(verify_email))
        .with_state(config.clone());
    let protected = Router::new()
        .route("/me", get(current_user))
        .layer(middleware::from_fn(auth_jwt_middleware))
        .with_state(config.clone());
    Router::new()
        .merge(unprotected)
        .merge(protected)
        .with_state(config)
}

fn project_routes(config: AppState) -> Router<AppState> {
    // acceptance is deliberately unauthenticated: the invitee may not have an
    // account yet
    let unprotected = Router::new()
        .route(
            "/{project_id}/invitations/accept/{token}",
            post(accept_invitation),
        )
        .with_state(config.clone());

    let protected = Router::new()
        .route("/", get(list_projects))
        .route("/", post(create_project))
        .route("/{project_id}", get(get_project))
        .route("/{project_id}", put(update_project))
        .route("/{project_id}", delete(delete_project))
        .route("/{project_id}/stats", get(get_project_stats))
        // ! membership
        .route("/{project_id}/members", post(add_project_member))
        .route("/{project_id}/members/{member_id}", put(update_member_role))
        .route(
            "/{project_id}/members/{member_id}",
            delete(remove_project_member),
        )
        // ! tasks
        .route("/{project_id}/tasks", get(list_tasks))
        .route("/{project_id}/tasks", post(create_task))
        .route("/{project_id}/tasks/{task_id}", get(get_task))
        .route("/{project_id}/tasks/{task_id}", put(update_task))
        .route("/{project_id}/tasks/{task_id}", delete(delete_task))
        .route(
            "/{project_id}/tasks/{task_id}/status",
            patch(update_task_status),
        )
        // ! subtasks
        .route("/{project_id}/tasks/{task_id}/subtasks", get(list_subtasks))
        .route(
            "/{project_id}/tasks/{task_id}/subtasks",
            post(create_subtask),
        )
        .route("/{project_id}/subtasks/{subtask_id}", put(update_subtask))
        .route(
            "/{project_id}/subtasks/{subtask_id}",
            delete(delete_subtask),
        )
        // ! notes
        .route("/{project_id}/notes", get(list_notes))
        .route("/{project_id}/notes", post(create_note))
        .route("/{project_id}/notes/{note_id}", get(get_note))
        .route("/{project_id}/notes/{note_id}", put(update_note))
        .route("/{project_id}/notes/{note_id}", delete(delete_note))
        .layer(middleware::from_fn(auth_jwt_middleware))
        .with_state(config.clone());

    Router::new()
        .merge(unprotected)
        .merge(protected)
        .with_state(config)
}
