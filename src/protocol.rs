//! 授权服务与引擎 / 前端之间的 JSON 消息
//!
//! 服务端（authority）与客户端（engine::client）共用同一套结构，避免两边字段漂移。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{ControlState, ErrorRecord, Module, Token};

/// GET /api/status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub voice_active: bool,
    pub hand_active: bool,
    #[serde(default)]
    pub voice_ready: bool,
    #[serde(default)]
    pub hand_ready: bool,
    #[serde(default)]
    pub system_active: bool,
    #[serde(default)]
    pub logged_in: bool,
}

impl StatusResponse {
    pub fn active_for(&self, module: Module) -> bool {
        match module {
            Module::Voice => self.voice_active,
            Module::Hand => self.hand_active,
        }
    }
}

impl From<&ControlState> for StatusResponse {
    fn from(state: &ControlState) -> Self {
        Self {
            voice_active: state.active.voice,
            hand_active: state.active.hand,
            voice_ready: state.ready.voice,
            hand_ready: state.ready.hand,
            system_active: state.system_active(),
            logged_in: state.logged_in(),
        }
    }
}

/// POST /api/toggle；字段都可缺省，由 handler 做校验
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub module: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub status: String,
    pub voice_active: bool,
    pub hand_active: bool,
}

/// POST /api/engine/status（心跳）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub module: Option<String>,
    pub ready: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatAck {
    pub status: String,
    pub module: Module,
    pub ready: bool,
}

/// POST /api/engine/error（引擎上报派发失败）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub dev_info: String,
}

impl From<&ErrorRecord> for ErrorReport {
    fn from(record: &ErrorRecord) -> Self {
        Self {
            code: record.code,
            message: record.message.clone(),
            dev_info: record.dev_info.clone(),
        }
    }
}

/// GET /api/error；错误槽为空时所有字段为 null
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorStateResponse {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub dev_info: Option<String>,
}

impl From<Option<ErrorRecord>> for ErrorStateResponse {
    fn from(record: Option<ErrorRecord>) -> Self {
        match record {
            Some(r) => Self {
                code: Some(r.code),
                message: Some(r.message),
                dev_info: Some(r.dev_info),
            },
            None => Self::default(),
        }
    }
}

/// GET /internal/token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Token> for TokenResponse {
    fn from(token: Token) -> Self {
        Self {
            token: token.access_token,
            expires_at: token.expires_at,
        }
    }
}

impl From<TokenResponse> for Token {
    fn from(resp: TokenResponse) -> Self {
        Token {
            access_token: resp.token,
            expires_at: resp.expires_at,
        }
    }
}

/// POST /internal/token（代替 OAuth 回调写入凭证）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetTokenRequest {
    pub token: Option<String>,
    /// 秒
    pub expires_in: Option<i64>,
}

/// GET /internal/status?module=
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InternalStatusQuery {
    pub module: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalStatusResponse {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// POST /api/player/{command}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResponse {
    pub status: String,
    pub action: String,
}

/// GET /api/player/state
///
/// 直接从提供方的 now-playing 响应反序列化，只保留前端要用的字段；`item` 为 null（广告、无曲目）时整个结果为 null。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub item: Option<TrackSummary>,
    #[serde(default)]
    pub device: DeviceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<ArtistName>,
    #[serde(default)]
    pub album: AlbumArt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistName {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumArt {
    /// 第一张通常是 640×640
    #[serde(default)]
    pub images: Vec<AlbumImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub volume_percent: Option<u8>,
}

/// 提供方 GET me/player/devices 的响应；设备条目原样透传
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<serde_json::Value>,
}

/// 通用错误体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
