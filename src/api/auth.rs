//! Session gate in front of every protected route.
//!
//! The identity provider is external; all this layer does is turn the token
//! it issued (cookie or bearer header) into a [`Principal`].

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use super::error::ApiError;
use super::{run_blocking, AppState};
use crate::models::Principal;

/// Raw token of the session that authenticated the request.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Session cookie first, then `Authorization: Bearer`.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string());
    if let Some(token) = from_cookie.filter(|t| !t.is_empty()) {
        return Some(token);
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token(request.headers(), &state.session_cookie) else {
        return ApiError::Unauthenticated.into_response();
    };

    let lookup = token.clone();
    let resolved = run_blocking(&state.sessions, move |sessions| {
        Ok(sessions.resolve_session(&lookup)?)
    })
    .await;
    match resolved {
        Ok(Some(principal)) => {
            request.extensions_mut().insert(principal);
            request.extensions_mut().insert(SessionToken(token));
            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!(path = %request.uri().path(), "rejected unknown or expired session");
            ApiError::Unauthenticated.into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn current_user(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<StatusCode, ApiError> {
    run_blocking(&state.sessions, move |sessions| {
        Ok(sessions.revoke_session(&token)?)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
