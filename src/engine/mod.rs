//! 传感器引擎
//!
//! 观测 → 分类 → 防抖 → 派发，与授权服务之间靠轮询同步与心跳协调。
//!
//! - **classifier / gesture / voice**: 观测流到指令流
//! - **debounce**: 冷却窗口与重复抑制
//! - **dispatch**: 发往媒体服务并上报结果
//! - **sync / client**: 节流轮询授权服务（fail-closed）
//! - **runtime**: 引擎主循环
//! - **source**: stdin 观测来源

pub mod classifier;
pub mod client;
pub mod command;
pub mod debounce;
pub mod dispatch;
pub mod gesture;
pub mod runtime;
pub mod source;
pub mod sync;
pub mod voice;

use std::sync::Arc;

pub use classifier::{classify_stream, Classifier};
pub use client::HttpAuthorityClient;
pub use command::{ClassifiedCommand, PlaybackCommand};
pub use debounce::{CooldownState, Debouncer};
pub use dispatch::{DispatchError, Dispatcher, ErrorReporter, NETWORK_FAILURE_STATUS, SUCCESS_STATUSES};
pub use gesture::{GestureClassifier, GestureObservation, HandLandmarks, Landmark};
pub use runtime::{EngineRunner, EngineSettings, EngineStats};
pub use sync::{AuthorityApi, EngineSyncSnapshot, StatusReply, SyncClient};
pub use voice::{UtteranceObservation, VoiceClassifier};

use crate::config::AppConfig;
use crate::core::SharedClock;
use crate::provider::HttpMediaProvider;
use crate::state::Module;

/// 按配置组装一个连接真实授权服务与媒体服务的引擎
///
/// 返回的 `AuthorityApi` 供关闭时发送最后一次心跳。
pub fn build_engine(
    module: Module,
    cfg: &AppConfig,
    clock: SharedClock,
) -> Result<(EngineRunner, Arc<dyn AuthorityApi>), reqwest::Error> {
    let authority = Arc::new(HttpAuthorityClient::new(
        &cfg.engine.authority_url,
        cfg.engine.request_timeout(),
    )?);
    let provider = Arc::new(HttpMediaProvider::from_config(&cfg.provider)?);

    let dispatcher = Dispatcher::new(provider, authority.clone());
    let api: Arc<dyn AuthorityApi> = authority;
    let runner = EngineRunner::new(
        EngineSettings::for_module(module, cfg),
        Arc::clone(&api),
        dispatcher,
        clock,
    );
    Ok((runner, api))
}
