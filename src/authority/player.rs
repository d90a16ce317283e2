//! /api/player/*：前端播放控制与播放状态查询
//!
//! 指令经授权服务自己的派发器转发给媒体服务；查询直接读提供方。两者都要求已登录，
//! 没有凭证时写入 401 错误并拒绝。

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::error::ApiError;
use super::AuthorityState;
use crate::core::{UpstreamError, ValidationError};
use crate::engine::PlaybackCommand;
use crate::protocol::{DeviceList, PlaybackState, PlayerResponse};
use crate::provider::{PlayerQuery, ProviderResponse};
use crate::state::{CallPath, Token};

/// POST /api/player/{command}
pub async fn relay(
    State(state): State<Arc<AuthorityState>>,
    Path(command): Path<String>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let command: PlaybackCommand = command
        .parse()
        .map_err(ValidationError::MalformedBody)?;

    let token = state.store.get_credential();
    match state.dispatcher.dispatch(command, token.as_ref()).await {
        Ok(()) => Ok(Json(PlayerResponse {
            status: "success".to_string(),
            action: command.action_label().to_string(),
        })),
        Err(UpstreamError::NoCredential) => Err(ApiError::Unauthorized(format!(
            "Failed to {}: User not logged in.",
            command.action_label()
        ))),
        Err(e) => Err(ApiError::Upstream(e)),
    }
}

/// GET /api/player/state；没有播放（204）或当前不是曲目时返回 null
pub async fn playback_state(
    State(state): State<Arc<AuthorityState>>,
) -> Result<Json<Option<PlaybackState>>, ApiError> {
    let response = query_provider(&state, PlayerQuery::State).await?;
    match response.status {
        204 => Ok(Json(None)),
        200 => {
            let parsed: PlaybackState = parse_body(&response)?;
            Ok(Json(parsed.item.is_some().then_some(parsed)))
        }
        status => Err(ApiError::Upstream(UpstreamError::Status {
            status,
            body: response.body,
        })),
    }
}

/// GET /api/player/devices
pub async fn devices(
    State(state): State<Arc<AuthorityState>>,
) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    let response = query_provider(&state, PlayerQuery::Devices).await?;
    match response.status {
        200 => {
            let list: DeviceList = parse_body(&response)?;
            Ok(Json(list.devices))
        }
        status => Err(ApiError::Upstream(UpstreamError::Status {
            status,
            body: response.body,
        })),
    }
}

async fn query_provider(state: &AuthorityState, query: PlayerQuery) -> Result<ProviderResponse, ApiError> {
    let token = require_token(state, query.action_label())?;
    state
        .provider
        .query(query, &token)
        .await
        .map_err(ApiError::Upstream)
}

fn require_token(state: &AuthorityState, action: &str) -> Result<Token, ApiError> {
    state.store.get_credential().ok_or_else(|| {
        let message = format!("Failed to {}: User not logged in.", action);
        state.store.set_error(
            CallPath::Dispatch,
            401,
            message.clone(),
            format!("No credential available. Action: {}", action),
        );
        ApiError::Unauthorized(message)
    })
}

fn parse_body<T: serde::de::DeserializeOwned>(response: &ProviderResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Upstream(UpstreamError::Payload(e.to_string())))
}
