//! Mock 媒体服务（用于测试，无需网络）
//!
//! 指令与查询共用一份脚本，按顺序返回，脚本用完后一律 204；
//! 分别记录收到的指令（连同凭证）与查询。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{MediaControl, PlayerQuery, ProviderResponse};
use crate::core::UpstreamError;
use crate::engine::PlaybackCommand;
use crate::state::Token;

#[derive(Debug, Default)]
pub struct MockMediaProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, UpstreamError>>>,
    calls: Mutex<Vec<(PlaybackCommand, String)>>,
    queries: Mutex<Vec<PlayerQuery>>,
}

impl MockMediaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个脚本响应
    pub fn push_response(&self, status: u16, body: &str) {
        self.lock_script().push_back(Ok(ProviderResponse::new(status, body)));
    }

    /// 追加一次传输失败
    pub fn push_transport_error(&self, reason: &str) {
        self.lock_script()
            .push_back(Err(UpstreamError::Transport(reason.to_string())));
    }

    pub fn calls(&self) -> Vec<(PlaybackCommand, String)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn queries(&self) -> Vec<PlayerQuery> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn commands(&self) -> Vec<PlaybackCommand> {
        self.calls().into_iter().map(|(c, _)| c).collect()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<ProviderResponse, UpstreamError>>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_response(&self) -> Result<ProviderResponse, UpstreamError> {
        self.lock_script()
            .pop_front()
            .unwrap_or_else(|| Ok(ProviderResponse::new(204, "")))
    }
}

#[async_trait]
impl MediaControl for MockMediaProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, command: PlaybackCommand, token: &Token) -> Result<ProviderResponse, UpstreamError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((command, token.as_str().to_string()));
        self.next_response()
    }

    async fn query(&self, query: PlayerQuery, _token: &Token) -> Result<ProviderResponse, UpstreamError> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query);
        self.next_response()
    }
}
