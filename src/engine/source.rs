//! 观测来源
//!
//! 发布的二进制从 stdin 读观测：手势引擎每行一帧 JSON 关键点，语音引擎每行一句识别文本。
//! 摄像头 / 麦克风与识别库在进程外，通过管道把结果写进来。

use futures_util::stream::{self, Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::gesture::GestureObservation;
use super::voice::UtteranceObservation;
use crate::core::SensorError;

/// 把按行读取的输入变成惰性流；读到 EOF 即结束
pub fn lines_from<R>(reader: R) -> impl Stream<Item = Result<String, SensorError>> + Send
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    stream::unfold(Some(reader.lines()), |state| async move {
        let mut lines = state?;
        match lines.next_line().await {
            Ok(Some(line)) => Some((Ok(line), Some(lines))),
            Ok(None) => None,
            Err(e) => Some((Err(SensorError::Unreadable(e.to_string())), None)),
        }
    })
}

pub fn stdin_lines() -> impl Stream<Item = Result<String, SensorError>> + Send {
    lines_from(BufReader::new(tokio::io::stdin()))
}

/// 每行一帧 JSON；解析失败的行是 `SensorError::Unreadable`
pub fn gesture_observations<S>(lines: S) -> impl Stream<Item = Result<GestureObservation, SensorError>> + Send
where
    S: Stream<Item = Result<String, SensorError>> + Send,
{
    lines.map(|line| line.and_then(|l| GestureObservation::from_json(l.trim())))
}

/// 每行一句识别文本；空行表示没听清
pub fn utterance_observations<S>(lines: S) -> impl Stream<Item = Result<UtteranceObservation, SensorError>> + Send
where
    S: Stream<Item = Result<String, SensorError>> + Send,
{
    lines.map(|line| {
        line.map(|l| {
            let text = l.trim();
            if text.is_empty() {
                UtteranceObservation::unrecognized()
            } else {
                UtteranceObservation::heard(text)
            }
        })
    })
}
