//! 关闭处理：信号监听、关闭原因、退出前的清理任务
//!
//! 引擎退出前发送最后一次「未就绪」心跳，授权服务退出前落盘模块开关，都是尽力而为；
//! 进程崩溃时清理被跳过，由授权服务的心跳截止兜底。

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::engine::sync::AuthorityApi;
use crate::state::{ControlStore, Module, StateFile};

/// 单项清理的超时
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);

/// 关闭原因；只记录第一次触发
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl+C
    UserInitiated,
    /// SIGTERM
    Signal,
    /// 观测流结束（传感器被释放）
    SensorClosed,
}

/// 关闭信号：一个 CancellationToken 加上触发原因
#[derive(Default)]
pub struct ShutdownManager {
    token: CancellationToken,
    reason: OnceLock<ShutdownReason>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 循环每轮检查的取消 token
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn shutdown(&self, reason: ShutdownReason) {
        if self.reason.set(reason).is_ok() {
            tracing::info!(?reason, "Shutdown requested");
        }
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 第一次触发关闭的原因；尚未关闭时为 None
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().copied()
    }

    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }

    /// Ctrl+C 与 SIGTERM 都触发关闭
    pub fn install_signal_handlers(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                tracing::info!("Received Ctrl+C, shutting down");
                manager.shutdown(ShutdownReason::UserInitiated);
            }
        });

        #[cfg(unix)]
        {
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                    sigterm.recv().await;
                    tracing::info!("Received SIGTERM, shutting down");
                    manager.shutdown(ShutdownReason::Signal);
                }
            });
        }
    }
}

/// 关闭时执行的清理
#[async_trait::async_trait]
pub trait ShutdownCleanup: Send + Sync {
    async fn cleanup(&self) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}

/// 按注册顺序执行清理，每项带超时，失败只记日志
#[derive(Default)]
pub struct ShutdownCoordinator {
    tasks: Vec<Box<dyn ShutdownCleanup>>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: ShutdownCleanup + 'static>(&mut self, task: T) {
        self.tasks.push(Box::new(task));
    }

    pub async fn run_cleanup(&self) {
        for task in &self.tasks {
            let name = task.name();
            match tokio::time::timeout(CLEANUP_TIMEOUT, task.cleanup()).await {
                Ok(Ok(())) => tracing::info!(task = name, "Cleanup finished"),
                Ok(Err(e)) => tracing::warn!(task = name, error = %e, "Cleanup failed"),
                Err(_) => tracing::warn!(task = name, timeout = ?CLEANUP_TIMEOUT, "Cleanup timed out"),
            }
        }
    }
}

/// 引擎退出：发送最后一次 ready=false 心跳
pub struct OfflineHeartbeatCleanup {
    api: Arc<dyn AuthorityApi>,
    module: Module,
}

impl OfflineHeartbeatCleanup {
    pub fn new(api: Arc<dyn AuthorityApi>, module: Module) -> Self {
        Self { api, module }
    }
}

#[async_trait::async_trait]
impl ShutdownCleanup for OfflineHeartbeatCleanup {
    async fn cleanup(&self) -> anyhow::Result<()> {
        self.api.send_heartbeat(self.module, false).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "OfflineHeartbeat"
    }
}

/// 授权服务退出：保存模块开关
pub struct StateFileCleanup {
    store: Arc<ControlStore>,
    file: StateFile,
}

impl StateFileCleanup {
    pub fn new(store: Arc<ControlStore>, file: StateFile) -> Self {
        Self { store, file }
    }
}

#[async_trait::async_trait]
impl ShutdownCleanup for StateFileCleanup {
    async fn cleanup(&self) -> anyhow::Result<()> {
        self.file.save(&self.store.snapshot()).await
    }

    fn name(&self) -> &'static str {
        "StateFile"
    }
}
