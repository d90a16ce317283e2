//! 媒体服务边界
//!
//! 所有后端（HTTP / Mock）实现 MediaControl：把一条播放指令或只读查询发给提供方，返回原始状态码与响应体。
//! 成功与否的判定、错误上报在调用方（engine::dispatch、authority::player）里做，这一层只负责「发出去」。

pub mod http;
pub mod mock;

use async_trait::async_trait;

use crate::core::UpstreamError;
use crate::engine::PlaybackCommand;
use crate::state::Token;

pub use http::HttpMediaProvider;
pub use mock::MockMediaProvider;

/// 提供方原始响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

impl ProviderResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// HTTP 方法：play / pause 是幂等的「设置状态」，next / previous 是「触发」
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMethod {
    Put,
    Post,
}

/// 指令到提供方端点的映射；Noop 没有端点
pub fn route_for(command: PlaybackCommand) -> Option<(ProviderMethod, &'static str)> {
    match command {
        PlaybackCommand::Play => Some((ProviderMethod::Put, "me/player/play")),
        PlaybackCommand::Pause => Some((ProviderMethod::Put, "me/player/pause")),
        PlaybackCommand::Next => Some((ProviderMethod::Post, "me/player/next")),
        PlaybackCommand::Previous => Some((ProviderMethod::Post, "me/player/previous")),
        PlaybackCommand::Noop => None,
    }
}

/// 前端用的只读查询
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerQuery {
    /// 当前播放
    State,
    /// 可用设备
    Devices,
}

impl PlayerQuery {
    pub fn path(&self) -> &'static str {
        match self {
            PlayerQuery::State => "me/player",
            PlayerQuery::Devices => "me/player/devices",
        }
    }

    /// 错误消息里的动作描述
    pub fn action_label(&self) -> &'static str {
        match self {
            PlayerQuery::State => "fetch state",
            PlayerQuery::Devices => "fetch devices",
        }
    }
}

#[async_trait]
pub trait MediaControl: Send + Sync {
    /// 后端名称（日志用）
    fn name(&self) -> &str;

    /// 发送指令；只有拿不到响应时才返回 `UpstreamError::Transport`
    async fn send(&self, command: PlaybackCommand, token: &Token) -> Result<ProviderResponse, UpstreamError>;

    /// GET 查询；错误语义同 `send`
    async fn query(&self, query: PlayerQuery, token: &Token) -> Result<ProviderResponse, UpstreamError>;
}
