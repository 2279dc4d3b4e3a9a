//! Update scheduler — fixed-interval driver for the decay simulation.
//!
//! Each tick measures the wall-clock time since the last applied tick and
//! hands it to [`PetRegistry::tick`]. Spans shorter than the decay debounce
//! are carried over to the next tick rather than dropped, so a short period
//! still decays at the configured rate.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::mood::DECAY_DEBOUNCE;
use crate::registry::PetRegistry;

/// Whether the scheduler is driving ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No task running.
    Stopped,
    /// The interval task is live.
    Running,
}

/// Periodic driver for [`PetRegistry::tick`].
#[derive(Debug)]
pub struct UpdateScheduler {
    registry: PetRegistry,
    period: Duration,
    ticks: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl UpdateScheduler {
    /// Create a stopped scheduler. A zero period is bumped to 1 ms.
    #[must_use]
    pub fn new(registry: PetRegistry, period: Duration) -> Self {
        Self {
            registry,
            period: period.max(Duration::from_millis(1)),
            ticks: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Start ticking. Returns `false` if already running or if there is no
    /// tokio runtime to spawn on.
    pub fn start(&mut self) -> bool {
        if self.task.is_some() {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime; update scheduler not started");
            return false;
        };

        let registry = self.registry.clone();
        let period = self.period;
        let ticks = Arc::clone(&self.ticks);
        self.task = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;
            let mut last = Instant::now();

            loop {
                interval.tick().await;
                let now = Instant::now();
                let elapsed = now.duration_since(last);
                if elapsed < DECAY_DEBOUNCE {
                    continue;
                }
                last = now;
                let changed = registry.tick(elapsed);
                ticks.fetch_add(1, Ordering::Relaxed);
                if changed > 0 {
                    debug!(changed, "Scheduler tick announced changes");
                }
            }
        }));

        info!(period = ?self.period, "Update scheduler started");
        true
    }

    /// Stop ticking immediately. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            return false;
        };
        task.abort();
        info!(ticks = self.ticks(), "Update scheduler stopped");
        true
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        if self.task.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    /// Configured period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks applied since construction.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::persistence::NullSink;
    use crate::types::Species;

    fn registry() -> PetRegistry {
        PetRegistry::new(&SimulationConfig::default(), Arc::new(NullSink))
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_are_idempotent() {
        let mut scheduler = UpdateScheduler::new(registry(), Duration::from_secs(1));
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_decay_pets_until_stopped() {
        let registry = registry();
        let id = registry.create_pet("Mochi", Species::Cat);
        let mut scheduler = UpdateScheduler::new(registry.clone(), Duration::from_secs(1));
        assert!(scheduler.start());

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        let ticks = scheduler.ticks();
        assert!(ticks >= 4, "expected several ticks, got {ticks}");
        let after_run = registry.pet(id).expect("pet").happiness;
        assert!(after_run < 70.0);

        scheduler.stop();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(scheduler.ticks(), ticks);
        let after_stop = registry.pet(id).expect("pet").happiness;
        assert!((after_stop - after_run).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn short_periods_accumulate_past_debounce() {
        let registry = registry();
        let id = registry.create_pet("Mochi", Species::Cat);
        let mut scheduler = UpdateScheduler::new(registry.clone(), Duration::from_millis(40));
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(scheduler.ticks() > 0);
        assert!(registry.pet(id).expect("pet").energy < 100.0);
    }

    #[test]
    fn start_without_runtime_fails_softly() {
        let mut scheduler = UpdateScheduler::new(registry(), Duration::from_secs(1));
        assert!(!scheduler.start());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_the_task() {
        let registry = registry();
        let id = registry.create_pet("Mochi", Species::Cat);
        {
            let mut scheduler = UpdateScheduler::new(registry.clone(), Duration::from_secs(1));
            scheduler.start();
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!((registry.pet(id).expect("pet").happiness - 70.0).abs() < f64::EPSILON);
    }
}
