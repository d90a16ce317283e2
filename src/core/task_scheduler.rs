//! 后台任务调度：有上限的即发即弃
//!
//! 引擎的观测循环不能等媒体服务响应，所以指令派发放到后台任务里跑；
//! Semaphore 限制同时在途的派发数，拿不到许可时直接丢弃（try-acquire，从不等待）。
//! 不 join 返回值，也不保证重叠派发之间的先后顺序。

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

/// 任务 ID（仅用于日志关联）
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TaskId(u64);

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(0);

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskId {
    pub fn new() -> Self {
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// 任务调度器
#[derive(Clone)]
pub struct TaskScheduler {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl TaskScheduler {
    pub fn new(max_in_flight: usize) -> Self {
        let capacity = max_in_flight.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// 后台执行 `fut`；已满时返回 None，任务被丢弃
    pub fn spawn_detached<F>(&self, fut: F) -> Option<TaskId>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!(capacity = self.capacity, "Task pool saturated, dropping task");
                return None;
            }
        };

        let id = TaskId::new();
        tokio::spawn(async move {
            fut.await;
            drop(permit);
        });
        Some(id)
    }

    /// 当前在途任务数
    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(2)
    }
}
