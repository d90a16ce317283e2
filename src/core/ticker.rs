//! 固定间隔节拍器
//!
//! 不睡眠、不起线程：调用方每轮传入当前时间问一次 `due`，到点则返回 true 并记下这一拍。
//! 轮询节流与心跳节奏都建立在它上面，与分类逻辑解耦。

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    last: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 距上一拍是否已满一个间隔；首次调用总是到点。到点时记录本拍。
    pub fn due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    /// 只查询，不记录
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// 下一拍立即到点
    pub fn reset(&mut self) {
        self.last = None;
    }
}
