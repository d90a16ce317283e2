//! 指令派发
//!
//! 把放行的指令发给媒体服务，并把结果写入错误槽：成功清除 `Dispatch` 路径的错误，失败覆盖错误槽。
//! 不重试。错误上报经 `ErrorReporter`：授权服务里直接写 `ControlStore`，引擎里走授权服务的 HTTP 接口。

use std::sync::Arc;

use async_trait::async_trait;

use super::command::PlaybackCommand;
use crate::core::UpstreamError;
use crate::provider::MediaControl;
use crate::state::{CallPath, ControlStore, ErrorRecord, Token};

/// 派发失败即媒体服务调用失败
pub type DispatchError = UpstreamError;

/// 媒体服务的成功状态码
pub const SUCCESS_STATUSES: [u16; 3] = [200, 201, 204];

/// 拿不到任何响应时写入错误槽的合成状态码
pub const NETWORK_FAILURE_STATUS: u16 = 599;

/// 错误槽的写入方
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn report(&self, record: ErrorRecord);

    /// 某调用路径成功后清除它留下的错误
    async fn clear(&self, path: CallPath);
}

#[async_trait]
impl ErrorReporter for ControlStore {
    async fn report(&self, record: ErrorRecord) {
        self.set_error(record.path, record.code, record.message, record.dev_info);
    }

    async fn clear(&self, path: CallPath) {
        self.clear_error_for(path);
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn MediaControl>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn MediaControl>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { provider, reporter }
    }

    pub async fn dispatch(&self, command: PlaybackCommand, token: Option<&Token>) -> Result<(), DispatchError> {
        if command.is_noop() {
            return Ok(());
        }

        let Some(token) = token else {
            self.reporter
                .report(ErrorRecord::new(
                    CallPath::Dispatch,
                    401,
                    format!("Failed to {}: User not logged in.", command.action_label()),
                    "No credential available",
                ))
                .await;
            return Err(UpstreamError::NoCredential);
        };

        let outcome = match self.provider.send(command, token).await {
            Ok(resp) if SUCCESS_STATUSES.contains(&resp.status) => Ok(()),
            Ok(resp) => Err(UpstreamError::Status {
                status: resp.status,
                body: resp.body,
            }),
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(()) => {
                tracing::info!(provider = self.provider.name(), %command, "Command dispatched");
                self.reporter.clear(CallPath::Dispatch).await;
            }
            Err(e) => {
                let (status, details) = match e {
                    UpstreamError::Status { status, body } => (*status, body.clone()),
                    other => (NETWORK_FAILURE_STATUS, other.to_string()),
                };
                tracing::warn!(provider = self.provider.name(), %command, status, "Dispatch failed");
                self.reporter
                    .report(ErrorRecord::new(
                        CallPath::Dispatch,
                        status,
                        format!("Provider error: failed to {}", command.action_label()),
                        format!("Status: {status}\nResponse: {details}"),
                    ))
                    .await;
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::provider::MockMediaProvider;
    use std::time::Duration;

    fn setup() -> (Dispatcher, Arc<MockMediaProvider>, Arc<ControlStore>) {
        let provider = Arc::new(MockMediaProvider::new());
        let store = Arc::new(ControlStore::new(
            Arc::new(ManualClock::new()),
            Duration::from_secs(1),
        ));
        let dispatcher = Dispatcher::new(provider.clone(), store.clone());
        (dispatcher, provider, store)
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_success_clears_it() {
        let (dispatcher, provider, store) = setup();
        let token = Token::new("t");

        provider.push_response(403, "premium required");
        let result = dispatcher.dispatch(PlaybackCommand::Pause, Some(&token)).await;
        assert!(matches!(result, Err(UpstreamError::Status { status: 403, .. })));

        let err = store.error().unwrap();
        assert_eq!(err.code, 403);
        assert_eq!(err.path, CallPath::Dispatch);
        assert_eq!(err.message, "Provider error: failed to pause playback");
        assert_eq!(err.dev_info, "Status: 403\nResponse: premium required");

        dispatcher.dispatch(PlaybackCommand::Pause, Some(&token)).await.unwrap();
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_all_success_statuses_accepted() {
        let (dispatcher, provider, store) = setup();
        let token = Token::new("t");
        for status in SUCCESS_STATUSES {
            provider.push_response(status, "");
            assert!(dispatcher.dispatch(PlaybackCommand::Next, Some(&token)).await.is_ok());
        }
        assert!(store.error().is_none());
        assert_eq!(provider.commands().len(), 3);
    }

    #[tokio::test]
    async fn test_transport_failure_uses_synthetic_status() {
        let (dispatcher, provider, store) = setup();
        provider.push_transport_error("connection refused");
        let result = dispatcher.dispatch(PlaybackCommand::Play, Some(&Token::new("t"))).await;
        assert!(matches!(result, Err(UpstreamError::Transport(_))));
        assert_eq!(store.error().unwrap().code, NETWORK_FAILURE_STATUS);
    }

    #[tokio::test]
    async fn test_missing_token_is_401_without_provider_call() {
        let (dispatcher, provider, store) = setup();
        let result = dispatcher.dispatch(PlaybackCommand::Previous, None).await;
        assert_eq!(result, Err(UpstreamError::NoCredential));
        assert!(provider.calls().is_empty());

        let err = store.error().unwrap();
        assert_eq!(err.code, 401);
        assert!(err.message.contains("not logged in"));
    }

    #[tokio::test]
    async fn test_success_keeps_errors_from_other_paths() {
        let (dispatcher, _provider, store) = setup();
        store.set_error(CallPath::Toggle, 400, "bad toggle", "");
        dispatcher.dispatch(PlaybackCommand::Play, Some(&Token::new("t"))).await.unwrap();
        assert_eq!(store.error().map(|e| e.path), Some(CallPath::Toggle));
    }

    #[tokio::test]
    async fn test_noop_is_not_sent() {
        let (dispatcher, provider, _store) = setup();
        dispatcher.dispatch(PlaybackCommand::Noop, None).await.unwrap();
        assert!(provider.calls().is_empty());
    }
}
