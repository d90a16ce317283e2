//! 手势指令分类
//!
//! 输入是 21 点手部关键点（归一化图像坐标，y 向下增长），每帧最多一只手。
//! 会话状态只有一个：上一帧手腕的 x 坐标，用于识别横向挥动。
//!
//! 判定顺序（先命中者胜）：
//! 1. 手腕横向位移超过 `swipe_threshold` → next / previous，并重置 `prev_x`
//! 2. 伸直手指数：0 → pause；≥ 3 → 看手腕到中指根的方向，横向 → next / previous，竖直向上 → play
//! 3. 没有手 → 重置 `prev_x`，输出 none

use serde::Deserialize;

use super::classifier::Classifier;
use super::command::PlaybackCommand;
use crate::core::SensorError;

pub const LANDMARK_COUNT: usize = 21;

const WRIST: usize = 0;
const MIDDLE_MCP: usize = 9;
/// 食指、中指、无名指、小指的指尖与对应 PIP 关节（拇指不计）
const FINGER_TIPS: [usize; 4] = [8, 12, 16, 20];
const FINGER_PIPS: [usize; 4] = [6, 10, 14, 18];

pub const DEFAULT_SWIPE_THRESHOLD: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    fn dist_sq(&self, other: &Landmark) -> f32 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }
}

/// 一只手的 21 个关键点（构造时校验数量）
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks(Vec<Landmark>);

impl HandLandmarks {
    pub fn new(points: Vec<Landmark>) -> Result<Self, SensorError> {
        if points.len() != LANDMARK_COUNT {
            return Err(SensorError::Unreadable(format!(
                "expected {} landmarks, got {}",
                LANDMARK_COUNT,
                points.len()
            )));
        }
        Ok(Self(points))
    }

    pub fn wrist(&self) -> Landmark {
        self.0[WRIST]
    }

    pub fn point(&self, index: usize) -> Landmark {
        self.0[index]
    }

    /// 指尖比 PIP 关节离手腕更远即视为伸直，与手的朝向无关
    pub fn extended_fingers(&self) -> usize {
        let wrist = self.wrist();
        FINGER_TIPS
            .iter()
            .zip(FINGER_PIPS.iter())
            .filter(|&(&tip, &pip)| self.0[tip].dist_sq(&wrist) > self.0[pip].dist_sq(&wrist))
            .count()
    }
}

/// 一帧的识别结果；`hand == None` 表示画面里没有手
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureObservation {
    pub hand: Option<HandLandmarks>,
}

impl GestureObservation {
    pub fn with_hand(hand: HandLandmarks) -> Self {
        Self { hand: Some(hand) }
    }

    pub fn no_hand() -> Self {
        Self { hand: None }
    }

    /// 解析一行 JSON：`{"landmarks":[{"x":..,"y":..}, ...]}`，`landmarks` 为 null 或缺失即没有手
    pub fn from_json(line: &str) -> Result<Self, SensorError> {
        #[derive(Deserialize)]
        struct Frame {
            #[serde(default)]
            landmarks: Option<Vec<Landmark>>,
        }

        let frame: Frame =
            serde_json::from_str(line).map_err(|e| SensorError::Unreadable(e.to_string()))?;
        match frame.landmarks {
            Some(points) if !points.is_empty() => Ok(Self::with_hand(HandLandmarks::new(points)?)),
            _ => Ok(Self::no_hand()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GestureClassifier {
    swipe_threshold: f32,
    prev_x: Option<f32>,
}

impl GestureClassifier {
    pub fn new(swipe_threshold: f32) -> Self {
        Self {
            swipe_threshold,
            prev_x: None,
        }
    }

    fn classify_pose(hand: &HandLandmarks) -> PlaybackCommand {
        let count = hand.extended_fingers();
        if count == 0 {
            return PlaybackCommand::Pause;
        }
        if count < 3 {
            return PlaybackCommand::Noop;
        }

        let wrist = hand.wrist();
        let base = hand.point(MIDDLE_MCP);
        let dx = base.x - wrist.x;
        let dy = base.y - wrist.y;

        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                PlaybackCommand::Next
            } else {
                PlaybackCommand::Previous
            }
        } else if dy < 0.0 {
            PlaybackCommand::Play
        } else {
            PlaybackCommand::Noop
        }
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD)
    }
}

impl Classifier for GestureClassifier {
    type Observation = GestureObservation;

    fn name(&self) -> &'static str {
        "gesture"
    }

    fn classify(&mut self, observation: GestureObservation) -> PlaybackCommand {
        let Some(hand) = observation.hand else {
            self.prev_x = None;
            return PlaybackCommand::Noop;
        };

        let x = hand.wrist().x;
        if let Some(prev) = self.prev_x {
            let dx = x - prev;
            if dx.abs() > self.swipe_threshold {
                self.prev_x = None;
                return if dx > 0.0 {
                    PlaybackCommand::Next
                } else {
                    PlaybackCommand::Previous
                };
            }
        }

        self.prev_x = Some(x);
        Self::classify_pose(&hand)
    }

    fn classify_gap(&mut self) -> PlaybackCommand {
        self.prev_x = None;
        PlaybackCommand::Noop
    }
}
