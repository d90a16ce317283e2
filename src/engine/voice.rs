//! 语音指令分类
//!
//! 对识别文本做小写后的关键词包含匹配，四组关键词按顺序检查，先命中者胜。
//! 没识别出来或监听超时的音频就是 `none`，不算错误。

use super::classifier::Classifier;
use super::command::PlaybackCommand;

/// 关键词表（顺序即优先级）
const KEYWORDS: [(&[&str], PlaybackCommand); 4] = [
    (&["resume", "play", "continue", "start"], PlaybackCommand::Play),
    (&["stop", "pause", "hush"], PlaybackCommand::Pause),
    (&["next", "skip"], PlaybackCommand::Next),
    (&["previous", "back"], PlaybackCommand::Previous),
];

/// 一次语音识别结果；`text == None` 表示没听清
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtteranceObservation {
    pub text: Option<String>,
}

impl UtteranceObservation {
    pub fn heard(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn unrecognized() -> Self {
        Self { text: None }
    }
}

#[derive(Debug, Default, Clone)]
pub struct VoiceClassifier;

impl VoiceClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_text(text: &str) -> PlaybackCommand {
        let lowered = text.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(words, _)| words.iter().any(|w| lowered.contains(w)))
            .map(|(_, command)| *command)
            .unwrap_or(PlaybackCommand::Noop)
    }
}

impl Classifier for VoiceClassifier {
    type Observation = UtteranceObservation;

    fn name(&self) -> &'static str {
        "voice"
    }

    fn classify(&mut self, observation: UtteranceObservation) -> PlaybackCommand {
        match observation.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let command = Self::classify_text(text);
                tracing::debug!(heard = text, %command, "Utterance classified");
                command
            }
            _ => PlaybackCommand::Noop,
        }
    }
}
