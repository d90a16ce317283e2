//! 引擎就绪状态机
//!
//! 状态：Unregistered → Ready ⇄ Offline。
//! 除了显式的 ready=false 心跳，超过 2 × poll_interval 没收到心跳的引擎也会转为 Offline，
//! 否则崩溃而未来得及告别的引擎会一直显示为就绪。

use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    Unregistered,
    Ready,
    Offline,
}

#[derive(Debug, Clone)]
pub struct Readiness {
    state: ReadinessState,
    last_heartbeat: Option<Instant>,
}

impl Default for Readiness {
    fn default() -> Self {
        Self {
            state: ReadinessState::Unregistered,
            last_heartbeat: None,
        }
    }
}

impl Readiness {
    /// 记录一次心跳，返回发生的状态变化（重复心跳只刷新截止时间）
    pub fn heartbeat(&mut self, ready: bool, now: Instant) -> Option<(ReadinessState, ReadinessState)> {
        self.last_heartbeat = Some(now);
        let next = if ready {
            ReadinessState::Ready
        } else {
            ReadinessState::Offline
        };
        if next == self.state {
            return None;
        }
        let prev = std::mem::replace(&mut self.state, next);
        Some((prev, next))
    }

    /// 不修改状态，按截止时间求当前可观察状态
    pub fn evaluate(&self, now: Instant, deadline: Duration) -> ReadinessState {
        match (self.state, self.last_heartbeat) {
            (ReadinessState::Ready, Some(last)) if now.saturating_duration_since(last) > deadline => {
                ReadinessState::Offline
            }
            (state, _) => state,
        }
    }

    /// 把截止时间导致的转换落到状态里；发生转换返回 true
    pub fn expire(&mut self, now: Instant, deadline: Duration) -> bool {
        if self.state == ReadinessState::Ready && self.evaluate(now, deadline) == ReadinessState::Offline {
            self.state = ReadinessState::Offline;
            return true;
        }
        false
    }

    pub fn is_ready(&self, now: Instant, deadline: Duration) -> bool {
        self.evaluate(now, deadline) == ReadinessState::Ready
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    pub fn last_heartbeat(&self) -> Option<Instant> {
        self.last_heartbeat
    }
}
