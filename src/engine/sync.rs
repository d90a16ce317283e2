//! 引擎侧的轮询同步
//!
//! 引擎每轮循环调用一次 `sync()`，但真正的网络请求按 `poll_interval` 节流，其余调用直接返回缓存。
//! 请求失败时 fail-closed：`active` 强制为 false，缓存的凭证保留，等授权服务恢复后继续使用。

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::core::{SharedClock, SyncError, Ticker};
use crate::state::{Module, Token};

pub use crate::protocol::StatusResponse as StatusReply;

/// 引擎看到的授权服务接口
#[async_trait]
pub trait AuthorityApi: Send + Sync {
    /// GET /api/status
    async fn fetch_status(&self) -> Result<StatusReply, SyncError>;

    /// GET /internal/token；没有登录时为 `Ok(None)`
    async fn fetch_token(&self) -> Result<Option<Token>, SyncError>;

    /// POST /api/engine/status
    async fn send_heartbeat(&self, module: Module, ready: bool) -> Result<(), SyncError>;
}

/// 引擎缓存的上一次同步结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSyncSnapshot {
    pub active: bool,
    pub credential: Option<Token>,
    pub last_poll: Option<Instant>,
}

pub struct SyncClient {
    api: Arc<dyn AuthorityApi>,
    module: Module,
    clock: SharedClock,
    ticker: Ticker,
    snapshot: EngineSyncSnapshot,
}

impl SyncClient {
    pub fn new(api: Arc<dyn AuthorityApi>, module: Module, clock: SharedClock, poll_interval: Duration) -> Self {
        Self {
            api,
            module,
            clock,
            ticker: Ticker::new(poll_interval),
            snapshot: EngineSyncSnapshot::default(),
        }
    }

    /// 返回 (本模块是否开启, 当前凭证)
    pub async fn sync(&mut self) -> (bool, Option<Token>) {
        let now = self.clock.now();
        // 失败也占用一个节拍，授权服务宕机时请求频率同样受限
        if !self.ticker.due(now) {
            return self.current();
        }
        self.snapshot.last_poll = Some(now);

        match self.poll().await {
            Ok(active) => {
                if active != self.snapshot.active {
                    tracing::info!(module = %self.module, active, "Module gate changed");
                }
                self.snapshot.active = active;
            }
            Err(e) => {
                if self.snapshot.active {
                    tracing::warn!(module = %self.module, error = %e, "Authority sync failed, going inactive");
                } else {
                    tracing::debug!(module = %self.module, error = %e, "Authority sync failed");
                }
                self.snapshot.active = false;
            }
        }
        self.current()
    }

    async fn poll(&mut self) -> Result<bool, SyncError> {
        let status = self.api.fetch_status().await?;

        if !status.logged_in {
            self.snapshot.credential = None;
        } else if self.needs_credential() {
            self.snapshot.credential = self.api.fetch_token().await?;
        }

        Ok(status.active_for(self.module))
    }

    fn needs_credential(&self) -> bool {
        self.snapshot
            .credential
            .as_ref()
            .map(|t| t.is_expired())
            .unwrap_or(true)
    }

    fn current(&self) -> (bool, Option<Token>) {
        (self.snapshot.active, self.snapshot.credential.clone())
    }

    /// 丢弃缓存的凭证（媒体服务返回 401 时），下一次 `sync()` 不等节拍立即重新获取
    pub fn invalidate_credential(&mut self) {
        if self.snapshot.credential.take().is_some() {
            tracing::info!(module = %self.module, "Cached credential invalidated");
        }
        self.ticker.reset();
    }

    pub fn snapshot(&self) -> &EngineSyncSnapshot {
        &self.snapshot
    }

    pub fn module(&self) -> Module {
        self.module
    }
}
