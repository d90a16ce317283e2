//! Maestro - 手势 / 语音驱动的播放控制
//!
//! 模块划分：
//! - **authority**: 授权服务 HTTP 接口（axum），持有凭证与模块开关
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、可注入时钟、节拍器、关闭处理、后台任务调度
//! - **engine**: 观测分类、指令防抖、派发、轮询同步、引擎主循环
//! - **observability**: 日志初始化
//! - **protocol**: 授权服务与引擎 / 前端之间的 JSON 消息
//! - **provider**: 媒体服务边界（HTTP / Mock）
//! - **state**: 控制状态存储、就绪状态机、开关持久化

#[cfg(feature = "authority")]
pub mod authority;
pub mod config;
pub mod core;
pub mod engine;
pub mod observability;
pub mod protocol;
pub mod provider;
pub mod state;
