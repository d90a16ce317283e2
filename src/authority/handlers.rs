//! 面向前端与引擎的 /api 接口

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use super::error::ApiError;
use super::AuthorityState;
use crate::core::ValidationError;
use crate::protocol::{
    ErrorReport, ErrorStateResponse, HeartbeatAck, HeartbeatRequest, StatusResponse, ToggleRequest,
    ToggleResponse,
};
use crate::state::{CallPath, Module};

/// GET /api/status
pub async fn status(State(state): State<Arc<AuthorityState>>) -> Json<StatusResponse> {
    Json(StatusResponse::from(&state.store.snapshot()))
}

/// POST /api/toggle
///
/// 校验失败时返回 400，并把原因写入 `Toggle` 路径的错误槽供前端展示。
pub async fn toggle(
    State(state): State<Arc<AuthorityState>>,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let (module, active) = parse_toggle(payload).map_err(|e| {
        state.store.set_error(
            CallPath::Toggle,
            400,
            "System error: failed to parse toggle request",
            format!(
                "{}\nExpected JSON format: {{ \"module\": \"voice\"|\"hand\", \"active\": true|false }}",
                e
            ),
        );
        ApiError::Validation(e)
    })?;

    state.store.update_active(module, active);
    state.persist().await;

    let snapshot = state.store.snapshot();
    Ok(Json(ToggleResponse {
        status: "success".to_string(),
        voice_active: snapshot.active.voice,
        hand_active: snapshot.active.hand,
    }))
}

fn parse_toggle(payload: Result<Json<ToggleRequest>, JsonRejection>) -> Result<(Module, bool), ValidationError> {
    let Json(req) = payload.map_err(|e| ValidationError::MalformedBody(e.body_text()))?;
    let module = req
        .module
        .as_deref()
        .ok_or(ValidationError::MissingField("module"))?
        .parse::<Module>()?;
    let active = req.active.ok_or(ValidationError::MissingField("active"))?;
    Ok((module, active))
}

/// POST /api/engine/status（心跳）；校验失败不写错误槽
pub async fn engine_status(
    State(state): State<Arc<AuthorityState>>,
    payload: Result<Json<HeartbeatRequest>, JsonRejection>,
) -> Result<Json<HeartbeatAck>, ApiError> {
    let Json(req) = payload.map_err(|e| ValidationError::MalformedBody(e.body_text()))?;
    let module = req
        .module
        .as_deref()
        .ok_or(ValidationError::MissingField("module"))?
        .parse::<Module>()?;
    let ready = req.ready.ok_or(ValidationError::MissingField("ready"))?;

    state.store.update_ready(module, ready);
    Ok(Json(HeartbeatAck {
        status: "ok".to_string(),
        module,
        ready,
    }))
}

/// POST /api/engine/error：引擎上报派发失败
pub async fn report_engine_error(
    State(state): State<Arc<AuthorityState>>,
    payload: Result<Json<ErrorReport>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(report) = payload.map_err(|e| ValidationError::MalformedBody(e.body_text()))?;
    state
        .store
        .set_error(CallPath::Dispatch, report.code, report.message, report.dev_info);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/engine/error：引擎派发成功
pub async fn clear_engine_error(State(state): State<Arc<AuthorityState>>) -> StatusCode {
    if state.store.clear_error_for(CallPath::Dispatch) {
        tracing::info!("Dispatch error cleared by engine");
    }
    StatusCode::NO_CONTENT
}

/// GET /api/error
pub async fn error_state(State(state): State<Arc<AuthorityState>>) -> Json<ErrorStateResponse> {
    Json(ErrorStateResponse::from(state.store.error()))
}
