//! /internal 接口：凭证读写与引擎的合并状态查询

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};

use super::error::ApiError;
use super::AuthorityState;
use crate::core::ValidationError;
use crate::protocol::{InternalStatusQuery, InternalStatusResponse, SetTokenRequest, TokenResponse};
use crate::state::{CallPath, Module, Token};

/// GET /internal/token
pub async fn get_token(State(state): State<Arc<AuthorityState>>) -> Result<Json<TokenResponse>, ApiError> {
    state
        .store
        .get_credential()
        .map(|t| Json(TokenResponse::from(t)))
        .ok_or_else(|| ApiError::NotFound("No user logged in".to_string()))
}

/// POST /internal/token：写入凭证（代替 OAuth 回调）
pub async fn set_token(
    State(state): State<Arc<AuthorityState>>,
    payload: Result<Json<SetTokenRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let parsed = payload
        .map_err(|e| ValidationError::MalformedBody(e.body_text()))
        .and_then(|Json(req)| {
            let token = req
                .token
                .filter(|t| !t.trim().is_empty())
                .ok_or(ValidationError::MissingField("token"))?;
            Ok(match req.expires_in {
                Some(secs) => Token::expiring_in(token, secs)?,
                None => Token::new(token),
            })
        });

    match parsed {
        Ok(token) => {
            state.store.set_credential(token);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            state
                .store
                .set_error(CallPath::Credential, 400, "Token retrieval error", e.to_string());
            Err(e.into())
        }
    }
}

/// DELETE /internal/token：登出
pub async fn clear_token(State(state): State<Arc<AuthorityState>>) -> StatusCode {
    state.store.clear_credential();
    StatusCode::NO_CONTENT
}

/// GET /internal/status?module=
///
/// 一次调用同时给出开关与凭证；不带 module 时看整体开关。没有凭证时 404。
pub async fn internal_status(
    State(state): State<Arc<AuthorityState>>,
    Query(query): Query<InternalStatusQuery>,
) -> Result<(StatusCode, Json<InternalStatusResponse>), ApiError> {
    let active = match query.module.as_deref() {
        Some(name) => state.store.is_active(name.parse::<Module>()?),
        None => state.store.system_active(),
    };

    let response = match state.store.get_credential() {
        Some(token) if active => (
            StatusCode::OK,
            InternalStatusResponse {
                active: true,
                token: Some(token.access_token),
                reason: None,
            },
        ),
        Some(_) => (
            StatusCode::OK,
            InternalStatusResponse {
                active: false,
                token: None,
                reason: Some("paused_by_user".to_string()),
            },
        ),
        None => (
            StatusCode::NOT_FOUND,
            InternalStatusResponse {
                active: false,
                token: None,
                reason: Some("no_token".to_string()),
            },
        ),
    };
    Ok((response.0, Json(response.1)))
}
