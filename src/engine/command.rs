//! 播放指令

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// 分类器输出的符号指令；`Noop` 表示这一拍没有可识别的手势 / 语句
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackCommand {
    Play,
    Pause,
    Next,
    Previous,
    #[serde(rename = "none")]
    Noop,
}

impl PlaybackCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackCommand::Play => "play",
            PlaybackCommand::Pause => "pause",
            PlaybackCommand::Next => "next",
            PlaybackCommand::Previous => "previous",
            PlaybackCommand::Noop => "none",
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, PlaybackCommand::Noop)
    }

    /// 面向用户的动作描述（写入错误信息）
    pub fn action_label(&self) -> &'static str {
        match self {
            PlaybackCommand::Play => "resume playback",
            PlaybackCommand::Pause => "pause playback",
            PlaybackCommand::Next => "skip to next track",
            PlaybackCommand::Previous => "skip to previous track",
            PlaybackCommand::Noop => "do nothing",
        }
    }
}

impl fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 只解析可派发的四个指令
impl FromStr for PlaybackCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(PlaybackCommand::Play),
            "pause" => Ok(PlaybackCommand::Pause),
            "next" => Ok(PlaybackCommand::Next),
            "previous" => Ok(PlaybackCommand::Previous),
            other => Err(format!("unknown playback command '{other}'")),
        }
    }
}

/// 带产生时间的分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedCommand {
    pub command: PlaybackCommand,
    pub at: Instant,
}
