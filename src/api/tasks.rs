use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use super::error::ApiError;
use super::{ensure_owner, parse_id, run_blocking, AppState};
use crate::models::{Principal, Task, TaskFilter};
use crate::schema::{parse_body, validate_date, validate_new_task, validate_task_patch};

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeQuery {
    /// Empty values count as absent. Present bounds must be real dates.
    fn into_filter(self) -> Result<TaskFilter, ApiError> {
        let start = self.start.filter(|s| !s.is_empty());
        let end = self.end.filter(|s| !s.is_empty());
        if let Some(start) = &start {
            validate_date("start", start)?;
        }
        if let Some(end) = &end {
            validate_date("end", end)?;
        }
        Ok(TaskFilter { start, end })
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let tasks = run_blocking(&state.store, move |store| {
        Ok(store.list_tasks(&principal.id, &filter)?)
    })
    .await?;
    Ok(Json(tasks))
}

/// Always inserts a new row; edits go through `PUT /api/tasks/:id`.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> Result<Json<Task>, ApiError> {
    let input = validate_new_task(&parse_body(&body)?)?;
    let task = run_blocking(&state.store, move |store| {
        Ok(store.create_task(&principal.id, &input)?)
    })
    .await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    raw_id: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Result<Json<Task>, ApiError> {
    let Path(raw_id) = raw_id?;
    let id = parse_id(&raw_id)?;
    let task = run_blocking(&state.store, move |store| {
        let existing = store.get_task(id)?;
        ensure_owner(&existing.user_id, &principal)?;

        let patch = validate_task_patch(&parse_body(&body)?)?;
        Ok(store.update_task(id, &principal.id, &patch)?)
    })
    .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(raw_id) = raw_id?;
    let id = parse_id(&raw_id)?;
    run_blocking(&state.store, move |store| {
        let task = store.get_task(id)?;
        ensure_owner(&task.user_id, &principal)?;
        Ok(store.delete_task(id, &principal.id)?)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
