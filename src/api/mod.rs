pub mod auth;
pub mod entries;
pub mod error;
pub mod tasks;

pub use error::ApiError;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{middleware, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::models::Principal;
use crate::store::{PlannerStore, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlannerStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub session_cookie: Arc<str>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PlannerStore>,
        sessions: Arc<dyn SessionStore>,
        session_cookie: &str,
    ) -> Self {
        Self {
            store,
            sessions,
            session_cookie: Arc::from(session_cookie),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/user", get(auth::current_user))
        .route("/api/logout", post(auth::logout))
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/:id",
            delete(tasks::delete_task).put(tasks::update_task),
        )
        .route("/api/rules", get(entries::list_rules).post(entries::create_rule))
        .route("/api/rules/:id", delete(entries::delete_rule))
        .route(
            "/api/notes/:date",
            get(entries::get_note).post(entries::upsert_note),
        )
        .route(
            "/api/month-goals/:month",
            get(entries::get_month_goal).post(entries::upsert_month_goal),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/api/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the listener fails or ctrl-c arrives.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "planner API listening");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run store work on the blocking pool. Store calls wait on SQLite and a
/// std mutex, so they stay off the async workers.
pub(crate) async fn run_blocking<S, T, F>(store: &Arc<S>, work: F) -> Result<T, ApiError>
where
    S: ?Sized + Send + Sync + 'static,
    T: Send + 'static,
    F: FnOnce(&S) -> Result<T, ApiError> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || work(&*store)).await?
}

/// Path ids that are not integers are reported as missing rows.
pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::NotFound("Invalid ID"))
}

pub(crate) fn ensure_owner(owner: &str, principal: &Principal) -> Result<(), ApiError> {
    if owner != principal.id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}
