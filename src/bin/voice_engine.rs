//! Maestro 语音引擎
//!
//! 从 stdin 逐行读取语音识别文本（空行表示没听清），按关键词分类、防抖后发给媒体服务。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use maestro::{
    config::load_config,
    core::{system_clock, OfflineHeartbeatCleanup, ShutdownCoordinator, ShutdownManager, ShutdownReason},
    engine::{build_engine, classify_stream, source, VoiceClassifier},
    observability,
    state::Module,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;

    let clock = system_clock();
    let (mut runner, api) =
        build_engine(Module::Voice, &cfg, clock.clone()).context("Failed to build voice engine")?;

    let observations = source::utterance_observations(source::stdin_lines());
    let commands = classify_stream(observations, VoiceClassifier::new(), clock);

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();
    tracing::info!(authority = %cfg.engine.authority_url, "Voice engine starting");

    let stats = runner.run(commands, shutdown.token()).await;
    if !shutdown.is_shutdown() {
        shutdown.shutdown(ShutdownReason::SensorClosed);
    }

    let mut coordinator = ShutdownCoordinator::new();
    coordinator.register(OfflineHeartbeatCleanup::new(api, Module::Voice));
    coordinator.run_cleanup().await;

    tracing::info!(
        reason = ?shutdown.reason(),
        issued = stats.dispatched,
        dropped = stats.dropped,
        "Voice engine shut down"
    );
    Ok(())
}
