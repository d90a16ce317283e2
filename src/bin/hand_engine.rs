//! Maestro 手势引擎
//!
//! 从 stdin 逐行读取手部关键点 JSON（每行一帧，`{"landmarks": [...]}` 或 `{"landmarks": null}`），
//! 分类、防抖后把播放指令发给媒体服务。模块开关与凭证来自授权服务。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use maestro::{
    config::load_config,
    core::{system_clock, OfflineHeartbeatCleanup, ShutdownCoordinator, ShutdownManager, ShutdownReason},
    engine::{build_engine, classify_stream, source, GestureClassifier},
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
        build_engine(Module::Hand, &cfg, clock.clone()).context("Failed to build hand engine")?;

    let observations = source::gesture_observations(source::stdin_lines());
    let commands = classify_stream(
        observations,
        GestureClassifier::new(cfg.hand.swipe_threshold),
        clock,
    );

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();
    tracing::info!(authority = %cfg.engine.authority_url, "Hand engine starting");

    let stats = runner.run(commands, shutdown.token()).await;
    if !shutdown.is_shutdown() {
        shutdown.shutdown(ShutdownReason::SensorClosed);
    }

    let mut coordinator = ShutdownCoordinator::new();
    coordinator.register(OfflineHeartbeatCleanup::new(api, Module::Hand));
    coordinator.run_cleanup().await;

    tracing::info!(
        reason = ?shutdown.reason(),
        issued = stats.dispatched,
        discarded = stats.discarded,
        "Hand engine shut down"
    );
    Ok(())
}
