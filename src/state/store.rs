//! 控制状态存储
//!
//! 由授权服务独占持有，以 `Arc<ControlStore>` 注入到 HTTP handler 与测试中，不存在全局单例。
//! 所有操作同步、非阻塞、对合法输入总是成功；跨进程没有锁，每个字段 last-write-wins。
//! 成功的状态变更会清除本调用路径留下的错误，外部可观察的失败会写入错误槽。

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use super::readiness::{Readiness, ReadinessState};
use super::types::{CallPath, ControlState, ErrorRecord, Module, PerModule, Token};
use super::persistence::PersistedState;
use crate::core::SharedClock;

#[derive(Debug, Default)]
struct Inner {
    credential: Option<Token>,
    active: PerModule<bool>,
    readiness: PerModule<Readiness>,
    error: Option<ErrorRecord>,
}

#[derive(Debug)]
pub struct ControlStore {
    inner: RwLock<Inner>,
    clock: SharedClock,
    /// 心跳截止时间 = 2 × 引擎轮询间隔
    heartbeat_deadline: Duration,
}

impl ControlStore {
    pub fn new(clock: SharedClock, poll_interval: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
            heartbeat_deadline: poll_interval * 2,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn heartbeat_deadline(&self) -> Duration {
        self.heartbeat_deadline
    }

    // ---- active ----

    pub fn update_active(&self, module: Module, active: bool) {
        let mut inner = self.write();
        *inner.active.get_mut(module) = active;
        clear_if_path(&mut inner, CallPath::Toggle);
        tracing::info!(%module, active, "Module toggled");
    }

    pub fn is_active(&self, module: Module) -> bool {
        *self.read().active.get(module)
    }

    pub fn system_active(&self) -> bool {
        let inner = self.read();
        inner.active.voice || inner.active.hand
    }

    // ---- readiness ----

    pub fn update_ready(&self, module: Module, ready: bool) {
        let now = self.clock.now();
        let mut inner = self.write();
        if let Some((from, to)) = inner.readiness.get_mut(module).heartbeat(ready, now) {
            tracing::info!(%module, ?from, ?to, "Engine readiness changed");
        } else {
            tracing::trace!(%module, ready, "Heartbeat refreshed");
        }
    }

    pub fn is_ready(&self, module: Module) -> bool {
        let now = self.clock.now();
        self.read().readiness.get(module).is_ready(now, self.heartbeat_deadline)
    }

    pub fn readiness(&self, module: Module) -> ReadinessState {
        let now = self.clock.now();
        self.read().readiness.get(module).evaluate(now, self.heartbeat_deadline)
    }

    /// 把超过截止时间的 Ready 引擎转为 Offline，返回本次转换的模块
    pub fn sweep_readiness(&self) -> Vec<Module> {
        let now = self.clock.now();
        let mut inner = self.write();
        let mut expired = Vec::new();
        for module in Module::ALL {
            if inner.readiness.get_mut(module).expire(now, self.heartbeat_deadline) {
                tracing::warn!(%module, "Engine missed its heartbeat deadline, marking offline");
                expired.push(module);
            }
        }
        expired
    }

    // ---- credential ----

    pub fn set_credential(&self, token: Token) {
        let mut inner = self.write();
        inner.credential = Some(token);
        clear_if_path(&mut inner, CallPath::Credential);
        tracing::info!("Credential updated");
    }

    pub fn clear_credential(&self) {
        self.write().credential = None;
        tracing::info!("Credential cleared");
    }

    pub fn get_credential(&self) -> Option<Token> {
        self.read().credential.clone()
    }

    // ---- error slot ----

    /// 覆盖错误槽（last-write-wins，不论之前是哪条路径写的）
    pub fn set_error(&self, path: CallPath, code: u16, message: impl Into<String>, dev_info: impl Into<String>) {
        let record = ErrorRecord::new(path, code, message, dev_info);
        tracing::warn!(?path, code, message = %record.message, "Error recorded");
        self.write().error = Some(record);
    }

    pub fn clear_error(&self) {
        self.write().error = None;
    }

    /// 仅当错误槽由 `path` 写入时清除；返回是否清除
    pub fn clear_error_for(&self, path: CallPath) -> bool {
        clear_if_path(&mut self.write(), path)
    }

    pub fn error(&self) -> Option<ErrorRecord> {
        self.read().error.clone()
    }

    // ---- snapshot / restore ----

    pub fn snapshot(&self) -> ControlState {
        let now = self.clock.now();
        let inner = self.read();
        let ready = |m: Module| inner.readiness.get(m).is_ready(now, self.heartbeat_deadline);
        ControlState {
            credential: inner.credential.clone(),
            active: inner.active,
            ready: PerModule {
                voice: ready(Module::Voice),
                hand: ready(Module::Hand),
            },
            error: inner.error.clone(),
        }
    }

    /// 只恢复模块开关；凭证、就绪状态、错误都是进程生命周期内的
    pub fn restore(&self, persisted: &PersistedState) {
        let mut inner = self.write();
        inner.active.voice = persisted.voice_active;
        inner.active.hand = persisted.hand_active;
        tracing::info!(
            voice_active = persisted.voice_active,
            hand_active = persisted.hand_active,
            "Module switches restored"
        );
    }
}

fn clear_if_path(inner: &mut Inner, path: CallPath) -> bool {
    if inner.error.as_ref().map(|e| e.path) == Some(path) {
        inner.error = None;
        true
    } else {
        false
    }
}
