//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `MAESTRO__*` 覆盖（双下划线表示嵌套，如 `MAESTRO__ENGINE__AUTHORITY_URL=http://10.0.0.2:5000`）。
//! 授权服务与两个引擎共用同一份配置，各自只读自己关心的段。

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub authority: AuthoritySection,
    pub engine: EngineSection,
    pub provider: ProviderSection,
    pub hand: HandSection,
    pub voice: VoiceSection,
}

/// [authority] 段：监听地址、心跳截止、状态文件
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthoritySection {
    pub bind_addr: SocketAddr,
    /// 引擎的心跳间隔（毫秒）；截止时间取它的两倍
    pub poll_interval_ms: u64,
    /// 后台清扫过期引擎的间隔（毫秒）
    pub sweep_interval_ms: u64,
    /// 模块开关落盘位置；不设置则不持久化
    pub state_file: Option<PathBuf>,
    /// 启动时预置的凭证（开发用，代替 OAuth 回调）
    pub initial_token: Option<String>,
}

impl Default for AuthoritySection {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            poll_interval_ms: 1000,
            sweep_interval_ms: 1000,
            state_file: None,
            initial_token: None,
        }
    }
}

impl AuthoritySection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}

/// [engine] 段：两个引擎共用的同步与派发参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub authority_url: String,
    pub poll_interval_ms: u64,
    pub heartbeat_interval_ms: u64,
    /// 访问授权服务的单次请求超时
    pub request_timeout_ms: u64,
    /// 一次传感器读取最长等待；超时按 none 处理
    pub listen_timeout_ms: u64,
    /// 同时在途的派发上限
    pub max_in_flight: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            authority_url: "http://127.0.0.1:5000".to_string(),
            poll_interval_ms: 1000,
            heartbeat_interval_ms: 1000,
            request_timeout_ms: 2000,
            listen_timeout_ms: 5000,
            max_in_flight: 2,
        }
    }
}

impl EngineSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn listen_timeout(&self) -> Duration {
        Duration::from_millis(self.listen_timeout_ms)
    }
}

/// [provider] 段：媒体服务 REST 接口
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.spotify.com/v1".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// [hand] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HandSection {
    pub cooldown_ms: u64,
    /// 冷却之外也拒绝与上一条相同的指令
    pub suppress_repeats: bool,
    /// 手腕横向位移超过该值（归一化坐标）视为挥动
    pub swipe_threshold: f32,
}

impl Default for HandSection {
    fn default() -> Self {
        Self {
            cooldown_ms: 1000,
            suppress_repeats: true,
            swipe_threshold: 0.25,
        }
    }
}

/// [voice] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceSection {
    pub cooldown_ms: u64,
    pub suppress_repeats: bool,
}

impl Default for VoiceSection {
    fn default() -> Self {
        Self {
            cooldown_ms: 1000,
            suppress_repeats: false,
        }
    }
}

/// 从 config 目录加载配置，环境变量 MAESTRO__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 MAESTRO__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("MAESTRO")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
