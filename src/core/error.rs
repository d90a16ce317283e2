//! 错误分类
//!
//! 四类错误对应四种处理方式：
//! - `ValidationError`：请求不合法，直接拒绝调用方
//! - `UpstreamError`：媒体服务调用失败，写入 ErrorRecord，不中断引擎循环
//! - `SyncError`：引擎连不上授权服务，fail-closed 为 inactive，仅本地日志
//! - `SensorError`：传感器缺失 / 超时 / 无法识别，按 `none` 分类处理

use thiserror::Error;

/// 发往授权服务的请求不合法（缺字段、未知模块名）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("unknown module '{0}', expected 'voice' or 'hand'")]
    UnknownModule(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("field '{0}' is out of range")]
    OutOfRange(&'static str),
}

/// 媒体服务调用失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// 有响应但状态码不在成功集合内
    #[error("provider returned status {status}")]
    Status { status: u16, body: String },

    /// 没有拿到响应（连接失败、超时）
    #[error("provider unreachable: {0}")]
    Transport(String),

    /// 当前没有可用凭证
    #[error("no credential available")]
    NoCredential,

    /// 成功状态码但响应体无法解析
    #[error("invalid provider payload: {0}")]
    Payload(String),
}

/// 引擎与授权服务同步失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("authority unreachable: {0}")]
    Unreachable(String),

    #[error("authority returned status {0}")]
    Status(u16),

    #[error("invalid authority payload: {0}")]
    Payload(String),
}

/// 传感器读取失败；调用方一律当作 `none` 观测
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("sensor listen timed out")]
    Timeout,

    #[error("unreadable observation: {0}")]
    Unreadable(String),

    #[error("sensor stream ended")]
    Closed,
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => SyncError::Status(status.as_u16()),
            None if e.is_decode() => SyncError::Payload(e.to_string()),
            None => SyncError::Unreachable(e.to_string()),
        }
    }
}
