use axum::Router;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use crate::{errors::Result, routes::api_router, state::AppState};

pub mod consts;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    tracing::subscriber::set_global_default(FmtSubscriber::default())
        .expect("setting tracing subscriber failed");
    let state = AppState::init().await?;

    let bind = std::env::var("TASKCAMP_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Serving taskcamp at http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_router(state.clone()))
        .with_state(state)
}
