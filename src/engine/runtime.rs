//! 引擎主循环
//!
//! 单个协作式循环：心跳 → 同步 → 读观测（带超时）→ 防抖 → 后台派发。
//! 派发在有上限的后台任务里跑，循环从不等待媒体服务；取消信号在两轮之间检查。
//!
//! 每次等待观测最多一个「时间片」：心跳间隔、轮询间隔、剩余静默时间三者取小。
//! 传感器长时间没有输出时，心跳与同步照常进行；静默累计满 `listen_timeout` 才记一次超时。
//! 模块关闭时观测照读但全部丢弃，重新开启后只处理开启之后产生的观测。

use std::cmp::min;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::command::ClassifiedCommand;
use super::debounce::Debouncer;
use super::dispatch::Dispatcher;
use super::sync::{AuthorityApi, SyncClient};
use crate::config::AppConfig;
use crate::core::{SharedClock, TaskScheduler, Ticker, UpstreamError};
use crate::state::Module;

/// 单个引擎的运行参数
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub module: Module,
    pub cooldown: Duration,
    pub suppress_repeats: bool,
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub listen_timeout: Duration,
    pub max_in_flight: usize,
}

impl EngineSettings {
    pub fn for_module(module: Module, cfg: &AppConfig) -> Self {
        let (cooldown_ms, suppress_repeats) = match module {
            Module::Hand => (cfg.hand.cooldown_ms, cfg.hand.suppress_repeats),
            Module::Voice => (cfg.voice.cooldown_ms, cfg.voice.suppress_repeats),
        };
        Self {
            module,
            cooldown: Duration::from_millis(cooldown_ms),
            suppress_repeats,
            poll_interval: cfg.engine.poll_interval(),
            heartbeat_interval: cfg.engine.heartbeat_interval(),
            listen_timeout: cfg.engine.listen_timeout(),
            max_in_flight: cfg.engine.max_in_flight,
        }
    }
}

/// 一次运行的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub observations: u64,
    pub timeouts: u64,
    pub admitted: u64,
    pub dispatched: u64,
    pub dropped: u64,
    /// 模块关闭期间读到并丢弃的观测
    pub discarded: u64,
}

const MIN_WAIT_SLICE: Duration = Duration::from_millis(1);

pub struct EngineRunner {
    settings: EngineSettings,
    api: Arc<dyn AuthorityApi>,
    sync: SyncClient,
    debouncer: Debouncer,
    dispatcher: Dispatcher,
    scheduler: TaskScheduler,
    clock: SharedClock,
    heartbeat: Ticker,
    /// 后台派发遇到 401 时置位，下一轮丢弃缓存凭证
    credential_rejected: Arc<AtomicBool>,
    was_active: bool,
    /// 连续未读到观测的累计时长
    silence: Duration,
    stats: EngineStats,
}

impl EngineRunner {
    pub fn new(
        settings: EngineSettings,
        api: Arc<dyn AuthorityApi>,
        dispatcher: Dispatcher,
        clock: SharedClock,
    ) -> Self {
        let sync = SyncClient::new(
            Arc::clone(&api),
            settings.module,
            Arc::clone(&clock),
            settings.poll_interval,
        );
        Self {
            debouncer: Debouncer::new(settings.cooldown, settings.suppress_repeats),
            scheduler: TaskScheduler::new(settings.max_in_flight),
            heartbeat: Ticker::new(settings.heartbeat_interval),
            credential_rejected: Arc::new(AtomicBool::new(false)),
            was_active: false,
            silence: Duration::ZERO,
            stats: EngineStats::default(),
            settings,
            api,
            sync,
            dispatcher,
            clock,
        }
    }

    pub fn module(&self) -> Module {
        self.settings.module
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn in_flight(&self) -> usize {
        self.scheduler.in_flight()
    }

    /// 运行直到取消或观测流结束
    pub async fn run<S>(&mut self, commands: S, cancel: CancellationToken) -> EngineStats
    where
        S: Stream<Item = ClassifiedCommand> + Send,
    {
        let module = self.settings.module;
        let mut commands = std::pin::pin!(commands);
        tracing::info!(%module, "Engine loop started");

        loop {
            if cancel.is_cancelled() {
                tracing::info!(%module, "Engine loop cancelled");
                break;
            }

            self.heartbeat_if_due().await;

            if self.credential_rejected.swap(false, Ordering::SeqCst) {
                self.sync.invalidate_credential();
            }
            let (active, credential) = self.sync.sync().await;

            if !active {
                if self.was_active {
                    tracing::info!(%module, "Module inactive, pausing");
                    self.debouncer.reset();
                    self.was_active = false;
                }
                let next = tokio::select! {
                    _ = cancel.cancelled() => continue,
                    _ = tokio::time::sleep(self.wait_slice()) => continue,
                    next = commands.next() => next,
                };
                match next {
                    Some(_) => {
                        self.stats.discarded += 1;
                        continue;
                    }
                    None => {
                        tracing::info!(%module, "Observation stream ended");
                        break;
                    }
                }
            }
            if !self.was_active {
                tracing::info!(%module, "Module active, listening");
                self.was_active = true;
                self.silence = Duration::ZERO;
            }

            let slice = self.wait_slice();
            let next = tokio::select! {
                _ = cancel.cancelled() => continue,
                next = tokio::time::timeout(slice, commands.next()) => next,
            };
            let classified = match next {
                Ok(Some(c)) => c,
                Ok(None) => {
                    tracing::info!(%module, "Observation stream ended");
                    break;
                }
                Err(_) => {
                    self.silence += slice;
                    if self.silence >= self.settings.listen_timeout {
                        // 超时按 none 处理
                        self.stats.timeouts += 1;
                        self.silence = Duration::ZERO;
                    }
                    continue;
                }
            };
            self.silence = Duration::ZERO;
            self.stats.observations += 1;

            if !self.debouncer.admit(classified.command, classified.at) {
                continue;
            }
            self.stats.admitted += 1;

            let dispatcher = self.dispatcher.clone();
            let rejected = Arc::clone(&self.credential_rejected);
            let command = classified.command;
            let spawned = self.scheduler.spawn_detached(async move {
                let result = dispatcher.dispatch(command, credential.as_ref()).await;
                if let Err(UpstreamError::Status { status: 401, .. }) = result {
                    rejected.store(true, Ordering::SeqCst);
                }
            });
            match spawned {
                Some(task) => {
                    tracing::info!(%module, %command, %task, "Command issued");
                    self.stats.dispatched += 1;
                }
                None => {
                    tracing::warn!(%module, %command, "Dispatch pool saturated, command dropped");
                    self.stats.dropped += 1;
                }
            }
        }

        tracing::info!(%module, stats = ?self.stats, "Engine loop stopped");
        self.stats
    }

    /// 单次等待观测的上限，保证心跳与同步不被传感器阻塞
    fn wait_slice(&self) -> Duration {
        let cadence = min(self.settings.heartbeat_interval, self.settings.poll_interval);
        let slice = if self.was_active {
            min(cadence, self.settings.listen_timeout.saturating_sub(self.silence))
        } else {
            cadence
        };
        slice.max(MIN_WAIT_SLICE)
    }

    async fn heartbeat_if_due(&mut self) {
        if !self.heartbeat.due(self.clock.now()) {
            return;
        }
        let module = self.settings.module;
        if let Err(e) = self.api.send_heartbeat(module, true).await {
            tracing::debug!(%module, error = %e, "Heartbeat failed");
        }
    }
}
