//! 分类器抽象
//!
//! 每个观测产出恰好一个 `ClassifiedCommand`（识别不出时是显式的 `none`，而不是不输出）。
//! 观测流是惰性的、可能无限的、不可重启的；重启等于重新获取传感器。

use futures_util::{Stream, StreamExt};

use super::command::{ClassifiedCommand, PlaybackCommand};
use crate::core::{SensorError, SharedClock};

pub trait Classifier: Send {
    type Observation: Send;

    fn name(&self) -> &'static str;

    fn classify(&mut self, observation: Self::Observation) -> PlaybackCommand;

    /// 传感器读失败 / 超时的这一拍；默认直接 `none`
    fn classify_gap(&mut self) -> PlaybackCommand {
        PlaybackCommand::Noop
    }
}

/// 把观测流映射为分类结果流，时间戳取自注入的时钟
pub fn classify_stream<S, C>(
    observations: S,
    mut classifier: C,
    clock: SharedClock,
) -> impl Stream<Item = ClassifiedCommand> + Send
where
    S: Stream<Item = Result<C::Observation, SensorError>> + Send,
    C: Classifier + 'static,
{
    observations.map(move |observation| {
        let command = match observation {
            Ok(obs) => classifier.classify(obs),
            Err(e) => {
                tracing::debug!(classifier = classifier.name(), error = %e, "Sensor reading treated as none");
                classifier.classify_gap()
            }
        };
        ClassifiedCommand {
            command,
            at: clock.now(),
        }
    })
}
