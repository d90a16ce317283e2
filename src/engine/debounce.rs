//! 指令防抖
//!
//! 一个引擎会话一个 `Debouncer`：冷却窗口内拒绝一切指令；`suppress_repeats` 打开时
//! （手势默认）即使过了冷却也拒绝与上一条相同的指令。引擎转为 inactive 时 `reset`，开始新会话。

use std::time::{Duration, Instant};

use super::command::PlaybackCommand;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownState {
    pub last_issued_command: Option<PlaybackCommand>,
    pub last_issued_time: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    cooldown: Duration,
    suppress_repeats: bool,
    state: CooldownState,
}

impl Debouncer {
    pub fn new(cooldown: Duration, suppress_repeats: bool) -> Self {
        Self {
            cooldown,
            suppress_repeats,
            state: CooldownState::default(),
        }
    }

    /// 判断是否放行；放行时记录本次指令与时间
    pub fn admit(&mut self, command: PlaybackCommand, now: Instant) -> bool {
        if command.is_noop() {
            return false;
        }

        if let Some(last) = self.state.last_issued_time {
            if now.saturating_duration_since(last) < self.cooldown {
                tracing::trace!(%command, "Rejected inside cooldown");
                return false;
            }
        }

        if self.suppress_repeats && self.state.last_issued_command == Some(command) {
            tracing::trace!(%command, "Rejected repeat");
            return false;
        }

        self.state = CooldownState {
            last_issued_command: Some(command),
            last_issued_time: Some(now),
        };
        true
    }

    pub fn reset(&mut self) {
        self.state = CooldownState::default();
    }

    pub fn state(&self) -> CooldownState {
        self.state
    }

    pub fn suppress_repeats(&self) -> bool {
        self.suppress_repeats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Clock, ManualClock};

    fn second() -> Duration {
        Duration::from_secs(1)
    }

    #[test]
    fn test_none_is_never_admitted() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(second(), false);
        assert!(!debouncer.admit(PlaybackCommand::Noop, clock.now()));
        assert_eq!(debouncer.state(), CooldownState::default());
    }

    #[test]
    fn test_voice_policy_admits_repeat_after_cooldown() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(second(), false);

        assert!(debouncer.admit(PlaybackCommand::Play, clock.now()));
        clock.advance_ms(100);
        assert!(!debouncer.admit(PlaybackCommand::Play, clock.now()));
        clock.advance_ms(1400);
        assert!(debouncer.admit(PlaybackCommand::Play, clock.now()));
    }

    #[test]
    fn test_gesture_policy_suppresses_repeat_after_cooldown() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(second(), true);

        assert!(debouncer.admit(PlaybackCommand::Play, clock.now()));
        clock.advance_ms(100);
        assert!(!debouncer.admit(PlaybackCommand::Play, clock.now()));
        clock.advance_ms(1400);
        assert!(!debouncer.admit(PlaybackCommand::Play, clock.now()));
        assert!(debouncer.admit(PlaybackCommand::Pause, clock.now()));
    }

    #[test]
    fn test_cooldown_applies_across_commands() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(second(), true);
        assert!(debouncer.admit(PlaybackCommand::Next, clock.now()));
        clock.advance_ms(500);
        assert!(!debouncer.admit(PlaybackCommand::Previous, clock.now()));
    }

    #[test]
    fn test_exact_cooldown_boundary_is_admitted() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(second(), false);
        assert!(debouncer.admit(PlaybackCommand::Next, clock.now()));
        clock.advance_ms(1000);
        assert!(debouncer.admit(PlaybackCommand::Next, clock.now()));
    }

    #[test]
    fn test_rejection_does_not_extend_cooldown() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(second(), false);
        assert!(debouncer.admit(PlaybackCommand::Play, clock.now()));
        clock.advance_ms(900);
        assert!(!debouncer.admit(PlaybackCommand::Pause, clock.now()));
        clock.advance_ms(100);
        assert!(debouncer.admit(PlaybackCommand::Pause, clock.now()));
    }

    #[test]
    fn test_reset_starts_new_session() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(second(), true);
        assert!(debouncer.admit(PlaybackCommand::Play, clock.now()));
        debouncer.reset();
        assert!(debouncer.admit(PlaybackCommand::Play, clock.now()));
    }
}
