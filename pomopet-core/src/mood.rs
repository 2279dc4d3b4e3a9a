//! Stat Decay & Mood Engine
//!
//! Mood is a pure function of the three gauges:
//!
//! ```text
//!   avg = (happiness + energy + cleanliness) / 3
//!
//!   avg ≥ 80 → excited
//!   avg ≥ 60 → happy
//!   avg ≥ 40 → neutral
//!   avg ≥ 20 → tired
//!   else     → sad
//! ```
//!
//! Decay is linear in elapsed wall-clock minutes. Elapsed spans below the
//! debounce window are ignored entirely so sub-visible timer jitter never
//! moves a gauge.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Mood;

/// Lower bound of every gauge.
pub const GAUGE_MIN: f64 = 0.0;
/// Upper bound of every gauge.
pub const GAUGE_MAX: f64 = 100.0;

/// Elapsed spans shorter than this are not applied.
pub const DECAY_DEBOUNCE: Duration = Duration::from_millis(100);

/// Mood thresholds, evaluated top to bottom. First match wins.
const MOOD_TABLE: [(f64, Mood); 4] = [
    (80.0, Mood::Excited),
    (60.0, Mood::Happy),
    (40.0, Mood::Neutral),
    (20.0, Mood::Tired),
];

impl Mood {
    /// Classify a gauge average.
    #[must_use]
    pub fn from_average(average: f64) -> Self {
        MOOD_TABLE
            .iter()
            .find(|(threshold, _)| average >= *threshold)
            .map_or(Self::Sad, |(_, mood)| *mood)
    }

    /// Derive the mood from the three gauges.
    #[must_use]
    pub fn from_gauges(happiness: f64, energy: f64, cleanliness: f64) -> Self {
        Self::from_average(gauge_average(happiness, energy, cleanliness))
    }
}

/// Mean of the three gauges.
#[must_use]
pub fn gauge_average(happiness: f64, energy: f64, cleanliness: f64) -> f64 {
    (happiness + energy + cleanliness) / 3.0
}

/// Clamp a gauge into `[0, 100]`. NaN collapses to 0.
#[must_use]
pub fn clamp_gauge(value: f64) -> f64 {
    if value.is_nan() {
        return GAUGE_MIN;
    }
    value.clamp(GAUGE_MIN, GAUGE_MAX)
}

/// Per-minute decay rates for the three gauges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayRates {
    /// Happiness lost per elapsed minute.
    #[serde(default = "default_happiness_rate")]
    pub happiness_per_minute: f64,
    /// Energy lost per elapsed minute.
    #[serde(default = "default_energy_rate")]
    pub energy_per_minute: f64,
    /// Cleanliness lost per elapsed minute.
    #[serde(default = "default_cleanliness_rate")]
    pub cleanliness_per_minute: f64,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            happiness_per_minute: 0.5,
            energy_per_minute: 0.3,
            cleanliness_per_minute: 0.2,
        }
    }
}

/// Gauge deltas produced by one decay step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayDelta {
    /// Happiness change (≤ 0).
    pub happiness: f64,
    /// Energy change (≤ 0).
    pub energy: f64,
    /// Cleanliness change (≤ 0).
    pub cleanliness: f64,
}

impl DecayRates {
    /// Compute the deltas for `elapsed`, or `None` inside the debounce window.
    #[must_use]
    pub fn delta_for(&self, elapsed: Duration) -> Option<DecayDelta> {
        if elapsed < DECAY_DEBOUNCE {
            return None;
        }
        let minutes = elapsed.as_secs_f64() / 60.0;
        Some(DecayDelta {
            happiness: -self.happiness_per_minute * minutes,
            energy: -self.energy_per_minute * minutes,
            cleanliness: -self.cleanliness_per_minute * minutes,
        })
    }
}

fn default_happiness_rate() -> f64 { 0.5 }
fn default_energy_rate() -> f64 { 0.3 }
fn default_cleanliness_rate() -> f64 { 0.2 }
