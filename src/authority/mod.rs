//! 授权服务：持有凭证与模块开关，聚合引擎心跳，转发前端播放指令
//!
//! 唯一的 `ControlStore` 以 `Arc` 注入到所有 handler；后台清扫任务把心跳超时的引擎标为离线。

mod error;
mod handlers;
mod internal;
mod player;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub use error::ApiError;

use crate::engine::Dispatcher;
use crate::provider::MediaControl;
use crate::state::{ControlStore, StateFile};

/// handler 共享状态
pub struct AuthorityState {
    pub store: Arc<ControlStore>,
    pub dispatcher: Dispatcher,
    /// 只读查询直接走提供方，不经派发器
    pub provider: Arc<dyn MediaControl>,
    pub state_file: Option<StateFile>,
}

impl AuthorityState {
    /// 前端播放指令的错误直接写入 store
    pub fn new(store: Arc<ControlStore>, provider: Arc<dyn MediaControl>) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&provider), store.clone());
        Self {
            store,
            dispatcher,
            provider,
            state_file: None,
        }
    }

    pub fn with_state_file(mut self, file: StateFile) -> Self {
        self.state_file = Some(file);
        self
    }

    /// 模块开关落盘（尽力而为）
    pub(crate) async fn persist(&self) {
        if let Some(file) = &self.state_file {
            if let Err(e) = file.save(&self.store.snapshot()).await {
                tracing::warn!(path = %file.path().display(), error = %e, "Failed to persist module switches");
            }
        }
    }
}

pub fn create_router(state: Arc<AuthorityState>) -> Router {
    Router::new()
        .route("/api/status", get(handlers::status))
        .route("/api/toggle", post(handlers::toggle))
        .route("/api/engine/status", post(handlers::engine_status))
        .route(
            "/api/engine/error",
            post(handlers::report_engine_error).delete(handlers::clear_engine_error),
        )
        .route("/api/error", get(handlers::error_state))
        .route("/api/player/state", get(player::playback_state))
        .route("/api/player/devices", get(player::devices))
        .route("/api/player/:command", post(player::relay))
        .route(
            "/internal/token",
            get(internal::get_token)
                .post(internal::set_token)
                .delete(internal::clear_token),
        )
        .route("/internal/status", get(internal::internal_status))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

/// 定期把心跳超时的引擎转为离线，直到取消
pub fn spawn_readiness_sweeper(
    store: Arc<ControlStore>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Readiness sweeper stopped");
                    break;
                }
                _ = timer.tick() => {
                    let expired = store.sweep_readiness();
                    if !expired.is_empty() {
                        tracing::info!(?expired, "Engines marked offline");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::state::{Module, ReadinessState};

    #[tokio::test]
    async fn test_sweeper_marks_stale_engine_offline() {
        let clock = ManualClock::new();
        let store = Arc::new(ControlStore::new(Arc::new(clock.clone()), Duration::from_millis(100)));
        store.update_ready(Module::Hand, true);
        clock.advance_ms(500);

        let cancel = CancellationToken::new();
        let handle = spawn_readiness_sweeper(store.clone(), Duration::from_millis(5), cancel.clone());
        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(store.readiness(Module::Hand), ReadinessState::Offline);
        assert_eq!(store.readiness(Module::Voice), ReadinessState::Unregistered);
    }
}
