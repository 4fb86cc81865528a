//! Rules, day notes and month goals.

use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use super::error::ApiError;
use super::{ensure_owner, parse_id, run_blocking, AppState};
use crate::models::{MonthGoal, Note, Principal, Rule};
use crate::schema::{parse_body, validate_content_body, validate_date, validate_month};

pub async fn list_rules(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Rule>>, ApiError> {
    let rules = run_blocking(&state.store, move |store| {
        Ok(store.list_rules(&principal.id)?)
    })
    .await?;
    Ok(Json(rules))
}

pub async fn create_rule(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> Result<(StatusCode, Json<Rule>), ApiError> {
    let input = validate_content_body(&parse_body(&body)?)?;
    let rule = run_blocking(&state.store, move |store| {
        Ok(store.create_rule(&principal.id, &input.content)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(raw_id) = raw_id?;
    let id = parse_id(&raw_id)?;
    run_blocking(&state.store, move |store| {
        let rule = store.get_rule(id)?;
        ensure_owner(&rule.user_id, &principal)?;
        Ok(store.delete_rule(id, &principal.id)?)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `null` when the day has no note yet.
pub async fn get_note(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    date: Result<Path<String>, PathRejection>,
) -> Result<Json<Option<Note>>, ApiError> {
    let Path(date) = date?;
    validate_date("date", &date)?;
    let note = run_blocking(&state.store, move |store| {
        Ok(store.get_note(&principal.id, &date)?)
    })
    .await?;
    Ok(Json(note))
}

pub async fn upsert_note(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    date: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Result<Json<Note>, ApiError> {
    let Path(date) = date?;
    validate_date("date", &date)?;
    let input = validate_content_body(&parse_body(&body)?)?;
    let note = run_blocking(&state.store, move |store| {
        Ok(store.upsert_note(&principal.id, &date, &input.content)?)
    })
    .await?;
    Ok(Json(note))
}

pub async fn get_month_goal(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    month: Result<Path<String>, PathRejection>,
) -> Result<Json<Option<MonthGoal>>, ApiError> {
    let Path(month) = month?;
    validate_month("month", &month)?;
    let goal = run_blocking(&state.store, move |store| {
        Ok(store.get_month_goal(&principal.id, &month)?)
    })
    .await?;
    Ok(Json(goal))
}

pub async fn upsert_month_goal(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    month: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Result<Json<MonthGoal>, ApiError> {
    let Path(month) = month?;
    validate_month("month", &month)?;
    let input = validate_content_body(&parse_body(&body)?)?;
    let goal = run_blocking(&state.store, move |store| {
        Ok(store.upsert_month_goal(&principal.id, &month, &input.content)?)
    })
    .await?;
    Ok(Json(goal))
}
