//! 控制状态的数据类型
//!
//! 模块名是封闭枚举，凭证是不透明字符串 + 过期提示，错误槽只保存最近一条。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ValidationError;

/// 引擎模块
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Voice,
    Hand,
}

impl Module {
    pub const ALL: [Module; 2] = [Module::Voice, Module::Hand];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Voice => "voice",
            Module::Hand => "hand",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "voice" => Ok(Module::Voice),
            "hand" => Ok(Module::Hand),
            _ => Err(ValidationError::UnknownModule(s.to_string())),
        }
    }
}

/// 按模块索引的一对值
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerModule<T> {
    pub voice: T,
    pub hand: T,
}

impl<T> PerModule<T> {
    pub fn get(&self, module: Module) -> &T {
        match module {
            Module::Voice => &self.voice,
            Module::Hand => &self.hand,
        }
    }

    pub fn get_mut(&mut self, module: Module) -> &mut T {
        match module {
            Module::Voice => &mut self.voice,
            Module::Hand => &mut self.hand,
        }
    }
}

/// 媒体服务的 Bearer 凭证
///
/// 存储层不解析也不刷新它；`expires_at` 只是提供方给的提示，引擎据此决定何时重新拉取。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// 以「从现在起 N 秒后过期」构造（提供方通常返回 expires_in）；超出时间范围的值被拒绝
    pub fn expiring_in(access_token: impl Into<String>, secs: i64) -> Result<Self, ValidationError> {
        let expires_at = ChronoDuration::try_seconds(secs)
            .and_then(|d| Utc::now().checked_add_signed(d))
            .ok_or(ValidationError::OutOfRange("expires_in"))?;
        Ok(Self {
            access_token: access_token.into(),
            expires_at: Some(expires_at),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.access_token
    }

    /// 没有过期提示时永不视为过期
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// 写入错误槽的调用路径；只有同一路径的成功操作才会清除它
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPath {
    /// 前端开关模块
    Toggle,
    /// 凭证设置 / 获取
    Credential,
    /// 播放指令派发（引擎或前端中转）
    Dispatch,
}

/// 进程内唯一的最近错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub code: u16,
    pub message: String,
    pub dev_info: String,
    pub path: CallPath,
    pub raised_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(path: CallPath, code: u16, message: impl Into<String>, dev_info: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            dev_info: dev_info.into(),
            path,
            raised_at: Utc::now(),
        }
    }
}

/// 授权服务持有的控制状态快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlState {
    pub credential: Option<Token>,
    pub active: PerModule<bool>,
    pub ready: PerModule<bool>,
    pub error: Option<ErrorRecord>,
}

impl ControlState {
    /// 任一模块开启即视为系统开启
    pub fn system_active(&self) -> bool {
        self.active.voice || self.active.hand
    }

    pub fn logged_in(&self) -> bool {
        self.credential.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_parse() {
        assert_eq!("voice".parse::<Module>(), Ok(Module::Voice));
        assert_eq!(" Hand ".parse::<Module>(), Ok(Module::Hand));
        assert!(matches!(
            "camera".parse::<Module>(),
            Err(ValidationError::UnknownModule(name)) if name == "camera"
        ));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("secret-value");
        let printed = format!("{:?}", token);
        assert!(!printed.contains("secret-value"));
    }

    #[test]
    fn test_token_expiry_hint() {
        let token = Token::expiring_in("abc", 3600).unwrap();
        assert!(!token.is_expired());
        assert!(token.is_expired_at(Utc::now() + ChronoDuration::seconds(3601)));
        assert!(!Token::new("abc").is_expired_at(Utc::now() + ChronoDuration::days(365)));
    }

    #[test]
    fn test_unrepresentable_expiry_is_rejected() {
        assert_eq!(
            Token::expiring_in("abc", i64::MAX),
            Err(ValidationError::OutOfRange("expires_in"))
        );
        assert!(Token::expiring_in("abc", i64::MIN).is_err());
        assert!(Token::expiring_in("abc", -60).unwrap().is_expired());
    }

    #[test]
    fn test_system_active_aggregates_modules() {
        let mut state = ControlState::default();
        assert!(!state.system_active());
        state.active.hand = true;
        assert!(state.system_active());
    }
}
