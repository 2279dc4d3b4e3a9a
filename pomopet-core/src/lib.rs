//! # pomopet Core Library
//!
//! The shared pet simulation behind every pomopet window.
//!
//! One [`PetRegistry`] owns every live [`pet::Pet`]. Views mount a
//! [`ViewAdapter`] to follow it, user actions enter through
//! [`PetRegistry::dispatch`], and an [`UpdateScheduler`] advances the decay
//! simulation on a fixed interval:
//!
//! - **Gauges** — happiness, energy and cleanliness, always in `[0, 100]`
//! - **Mood** — derived from the gauge average, never set directly
//! - **Animation** — what the pet is doing; celebrations revert on a timer
//! - **Persistence** — fire-and-forget saves through a [`persistence::PersistSink`]
//!
//! ## Performance Contract
//!
//! - Mood derivation: pure, allocation-free
//! - Tick (100 pets): < 100μs plus observer time
//! - Dispatch: one lock acquisition, one snapshot clone per observer

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod mood;
pub mod persistence;
pub mod pet;
pub mod registry;
pub mod scheduler;
pub mod types;

pub use adapter::{ViewAdapter, ViewFilter};
pub use config::PetConfig;
pub use error::PetError;
pub use registry::{ObserverToken, PetObserver, PetRegistry};
pub use scheduler::{SchedulerState, UpdateScheduler};
pub use types::*;
