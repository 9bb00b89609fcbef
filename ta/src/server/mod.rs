//! HTTP and WebSocket front end over [`TaskService`]

mod error;
mod routes;
mod ws;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::events::ListenerHub;
use crate::service::TaskService;

pub use error::ApiError;

/// Shared handler state
///
/// The hub must be the same one the service notifies through.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TaskService>,
    pub hub: Arc<ListenerHub>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/tasks", post(routes::create_task).get(routes::list_tasks))
        .route("/api/v1/tasks/", post(routes::create_task).get(routes::list_tasks))
        .route("/api/v1/tasks/steps/{step_id}", patch(routes::update_step))
        .route("/api/v1/tasks/{task_id}", get(routes::get_task).patch(routes::update_task))
        .route("/api/v1/tasks/{task_id}/complete", post(routes::complete_task))
        .route("/api/v1/summary/today", get(routes::summary_today))
        .route("/api/v1/summary/{date}", get(routes::summary_for_day))
        .route("/api/v1/achievements", get(routes::list_achievements))
        .route("/api/v1/achievements/", get(routes::list_achievements))
        .route("/api/v1/achievements/{id}", get(routes::get_achievement))
        .route("/ws/progress", get(ws::progress))
        .with_state(state)
}

/// Serve on an already bound listener until ctrl-c
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr().context("failed to resolve listen address")?;
    info!(%addr, "serve: listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server exited unexpectedly")?;
    info!("serve: stopped");
    Ok(())
}

/// Bind `addr` and serve
pub async fn run(addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    serve(listener, state).await
}
