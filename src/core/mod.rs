//! 核心基础设施：错误分类、可注入时钟、节拍器、关闭处理、后台任务调度

pub mod clock;
pub mod error;
pub mod shutdown;
pub mod task_scheduler;
pub mod ticker;

pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use error::{SensorError, SyncError, UpstreamError, ValidationError};
pub use shutdown::{
    OfflineHeartbeatCleanup, ShutdownCleanup, ShutdownCoordinator,
    ShutdownManager, ShutdownReason, StateFileCleanup,
};
pub use task_scheduler::{TaskId, TaskScheduler};
pub use ticker::Ticker;
