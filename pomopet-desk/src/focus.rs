//! Pomodoro focus timer.
//!
//! A pure state machine driven by [`FocusTimer::advance`]; it never reads the
//! clock itself, so the binary can feed it tokio time and tests can feed it
//! arbitrary spans. Completing a focus block yields
//! [`FocusEvent::SessionCompleted`], which the companion flows turn into
//! points and a pet celebration.
//!
//! ```text
//!   Idle ──start──▶ Focus ──done──▶ ShortBreak ──done──▶ Focus | Idle
//!                     │  (every Nth)
//!                     └───────────▶ LongBreak  ──done──▶ Focus | Idle
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FocusConfig;

/// Where the timer is in the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusPhase {
    /// Not running.
    Idle,
    /// Working.
    Focus,
    /// Short rest after a focus block.
    ShortBreak,
    /// Long rest after every Nth focus block.
    LongBreak,
}

impl FocusPhase {
    /// Whether this is one of the two break phases.
    #[must_use]
    pub fn is_break(self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }
}

/// Something that happened while advancing the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    /// The timer moved from one phase to another.
    PhaseChanged {
        /// Phase that ended.
        from: FocusPhase,
        /// Phase that began.
        to: FocusPhase,
    },
    /// A focus block ran to completion.
    SessionCompleted {
        /// Focus blocks completed since the last reset, including this one.
        completed_sessions: u32,
    },
}

/// Pomodoro timer state.
#[derive(Debug, Clone)]
pub struct FocusTimer {
    config: FocusConfig,
    phase: FocusPhase,
    remaining: Duration,
    paused: bool,
    completed_sessions: u32,
}

impl FocusTimer {
    /// A new idle timer.
    #[must_use]
    pub fn new(config: FocusConfig) -> Self {
        Self {
            config,
            phase: FocusPhase::Idle,
            remaining: Duration::ZERO,
            paused: false,
            completed_sessions: 0,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    /// Time left in the current phase. Zero when idle.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Whether the countdown is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Focus blocks completed since the last reset.
    #[must_use]
    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    /// Fraction of the current phase already elapsed, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let total = self.duration_of(self.phase);
        if total.is_zero() {
            return 0.0;
        }
        let done = total.saturating_sub(self.remaining);
        (done.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Begin a focus block. Ignored (returns `None`) if one is already running.
    ///
    /// Starting from a break abandons the break.
    pub fn start_focus(&mut self) -> Option<FocusEvent> {
        if self.phase == FocusPhase::Focus {
            return None;
        }
        self.paused = false;
        Some(self.enter(FocusPhase::Focus))
    }

    /// Pause the countdown. Returns `false` if idle or already paused.
    pub fn pause(&mut self) -> bool {
        if self.phase == FocusPhase::Idle || self.paused {
            return false;
        }
        self.paused = true;
        true
    }

    /// Resume a paused countdown. Returns `false` if not paused.
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        true
    }

    /// Abandon the current phase without credit.
    ///
    /// A skipped focus block goes back to idle; a skipped break moves on as if
    /// it had finished.
    pub fn skip(&mut self) -> Option<FocusEvent> {
        self.paused = false;
        match self.phase {
            FocusPhase::Idle => None,
            FocusPhase::Focus => Some(self.enter(FocusPhase::Idle)),
            FocusPhase::ShortBreak | FocusPhase::LongBreak => Some(self.enter(self.after_break())),
        }
    }

    /// Back to idle with the session count cleared.
    pub fn reset(&mut self) {
        self.phase = FocusPhase::Idle;
        self.remaining = Duration::ZERO;
        self.paused = false;
        self.completed_sessions = 0;
    }

    /// Count down by `elapsed`, crossing as many phase boundaries as it covers.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<FocusEvent> {
        let mut events = Vec::new();
        if self.paused {
            return events;
        }

        let mut left = elapsed;
        while self.phase != FocusPhase::Idle {
            if left < self.remaining {
                self.remaining -= left;
                break;
            }
            left -= self.remaining;
            self.finish_phase(&mut events);
        }
        events
    }

    fn finish_phase(&mut self, events: &mut Vec<FocusEvent>) {
        match self.phase {
            FocusPhase::Idle => {}
            FocusPhase::Focus => {
                self.completed_sessions += 1;
                events.push(FocusEvent::SessionCompleted {
                    completed_sessions: self.completed_sessions,
                });
                let next = if self.config.auto_start_breaks {
                    self.next_break()
                } else {
                    FocusPhase::Idle
                };
                events.push(self.enter(next));
            }
            FocusPhase::ShortBreak | FocusPhase::LongBreak => {
                let next = self.after_break();
                events.push(self.enter(next));
            }
        }
    }

    fn next_break(&self) -> FocusPhase {
        let every = self.config.sessions_before_long_break.max(1);
        if self.completed_sessions % every == 0 {
            FocusPhase::LongBreak
        } else {
            FocusPhase::ShortBreak
        }
    }

    fn after_break(&self) -> FocusPhase {
        if self.config.auto_start_focus {
            FocusPhase::Focus
        } else {
            FocusPhase::Idle
        }
    }

    fn enter(&mut self, to: FocusPhase) -> FocusEvent {
        let from = self.phase;
        self.phase = to;
        self.remaining = self.duration_of(to);
        debug!(?from, ?to, completed = self.completed_sessions, "Focus phase changed");
        FocusEvent::PhaseChanged { from, to }
    }

    fn duration_of(&self, phase: FocusPhase) -> Duration {
        match phase {
            FocusPhase::Idle => Duration::ZERO,
            FocusPhase::Focus => self.config.focus(),
            FocusPhase::ShortBreak => self.config.short_break(),
            FocusPhase::LongBreak => self.config.long_break(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_secs(60);

    fn sessions(events: &[FocusEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e {
                FocusEvent::SessionCompleted { completed_sessions } => Some(*completed_sessions),
                FocusEvent::PhaseChanged { .. } => None,
            })
            .collect()
    }

    #[test]
    fn idle_timer_ignores_time() {
        let mut timer = FocusTimer::new(FocusConfig::default());
        assert!(timer.advance(MIN * 100).is_empty());
        assert_eq!(timer.phase(), FocusPhase::Idle);
        assert!(!timer.pause());
    }

    #[test]
    fn focus_block_completes_into_short_break() {
        let mut timer = FocusTimer::new(FocusConfig::default());
        timer.start_focus();
        assert!(timer.advance(MIN * 24).is_empty());
        assert_eq!(timer.remaining(), MIN);

        let events = timer.advance(MIN);
        assert_eq!(sessions(&events), [1]);
        assert_eq!(timer.phase(), FocusPhase::ShortBreak);
        assert_eq!(timer.remaining(), MIN * 5);
    }

    #[test]
    fn fourth_session_earns_long_break() {
        let config = FocusConfig {
            auto_start_focus: true,
            ..FocusConfig::default()
        };
        let mut timer = FocusTimer::new(config);
        timer.start_focus();

        // 3 × (25 + 5) then the 4th focus block.
        let events = timer.advance(MIN * (3 * 30 + 25));
        assert_eq!(sessions(&events), [1, 2, 3, 4]);
        assert_eq!(timer.phase(), FocusPhase::LongBreak);
        assert_eq!(timer.remaining(), MIN * 15);
    }

    #[test]
    fn break_ends_idle_without_auto_focus() {
        let mut timer = FocusTimer::new(FocusConfig::default());
        timer.start_focus();
        timer.advance(MIN * 30);
        assert_eq!(timer.phase(), FocusPhase::Idle);
        assert!(timer.advance(MIN * 60).is_empty());
    }

    #[test]
    fn pause_freezes_the_countdown() {
        let mut timer = FocusTimer::new(FocusConfig::default());
        timer.start_focus();
        timer.advance(MIN * 10);
        assert!(timer.pause());
        assert!(!timer.pause());
        assert!(timer.advance(MIN * 30).is_empty());
        assert_eq!(timer.remaining(), MIN * 15);
        assert!(timer.resume());
        assert!(!timer.resume());
        assert!((timer.progress() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn skipping_focus_gives_no_credit() {
        let mut timer = FocusTimer::new(FocusConfig::default());
        timer.start_focus();
        timer.advance(MIN * 20);
        assert_eq!(
            timer.skip(),
            Some(FocusEvent::PhaseChanged {
                from: FocusPhase::Focus,
                to: FocusPhase::Idle,
            })
        );
        assert_eq!(timer.completed_sessions(), 0);
        assert_eq!(timer.skip(), None);
    }

    #[test]
    fn start_while_focusing_is_ignored_and_reset_clears() {
        let mut timer = FocusTimer::new(FocusConfig::default());
        assert!(timer.start_focus().is_some());
        assert!(timer.start_focus().is_none());
        timer.advance(MIN * 25);
        assert_eq!(timer.completed_sessions(), 1);
        timer.reset();
        assert_eq!(timer.completed_sessions(), 0);
        assert_eq!(timer.phase(), FocusPhase::Idle);
        assert!(timer.progress().abs() < f64::EPSILON);
    }

    #[test]
    fn manual_breaks_wait_in_idle() {
        let config = FocusConfig {
            auto_start_breaks: false,
            ..FocusConfig::default()
        };
        let mut timer = FocusTimer::new(config);
        timer.start_focus();
        let events = timer.advance(MIN * 25);
        assert_eq!(sessions(&events), [1]);
        assert_eq!(timer.phase(), FocusPhase::Idle);
    }
}
