//! Maestro 授权服务
//!
//! 入口：加载配置、初始化日志、恢复模块开关，启动 HTTP 服务与就绪清扫，收到关闭信号后落盘退出。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use maestro::{
    authority::{create_router, spawn_readiness_sweeper, AuthorityState},
    config::load_config,
    core::{system_clock, ShutdownCoordinator, ShutdownManager, StateFileCleanup},
    observability,
    provider::HttpMediaProvider,
    state::{ControlStore, StateFile, Token},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;

    let store = Arc::new(ControlStore::new(system_clock(), cfg.authority.poll_interval()));

    let state_file = cfg.authority.state_file.as_ref().map(StateFile::new);
    if let Some(file) = &state_file {
        match file.load() {
            Ok(Some(persisted)) => store.restore(&persisted),
            Ok(None) => tracing::info!(path = %file.path().display(), "No state file yet, starting inactive"),
            Err(e) => tracing::warn!(path = %file.path().display(), error = %e, "Ignoring unreadable state file"),
        }
    }

    if let Some(token) = cfg.authority.initial_token.as_deref().filter(|t| !t.is_empty()) {
        store.set_credential(Token::new(token));
    }

    let provider = Arc::new(
        HttpMediaProvider::from_config(&cfg.provider).context("Failed to build provider client")?,
    );
    let mut state = AuthorityState::new(store.clone(), provider);
    if let Some(file) = state_file.clone() {
        state = state.with_state_file(file);
    }
    let app = create_router(Arc::new(state));

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let sweeper = spawn_readiness_sweeper(
        store.clone(),
        cfg.authority.sweep_interval(),
        shutdown.token(),
    );

    let addr = cfg.authority.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Maestro authority listening on http://{}", addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.wait_for_shutdown().await })
        .await
        .context("Server error")?;

    let _ = sweeper.await;

    let mut coordinator = ShutdownCoordinator::new();
    if let Some(file) = state_file {
        coordinator.register(StateFileCleanup::new(store, file));
    }
    coordinator.run_cleanup().await;

    tracing::info!(reason = ?shutdown.reason(), "Maestro authority shut down");
    Ok(())
}
