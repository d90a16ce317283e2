//! 控制状态：模块开关、引擎就绪、凭证、最近错误
//!
//! - **store**: 授权服务独占的状态存储（可注入，无全局单例）
//! - **readiness**: 心跳驱动的就绪状态机（带截止时间）
//! - **persistence**: 模块开关的可选落盘
//! - **types**: Module / Token / ErrorRecord / ControlState

mod persistence;
mod readiness;
mod store;
mod types;

pub use persistence::{PersistedState, StateFile};
pub use readiness::{Readiness, ReadinessState};
pub use store::ControlStore;
pub use types::{CallPath, ControlState, ErrorRecord, Module, PerModule, Token};
