//! # pomopet-desk — the desktop companion around the pet core
//!
//! Wires `pomopet-core` (the pet simulation) and `pomopet-lms` (coursework
//! import) into the pieces a desktop shell needs.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 pomopet-desk                 │
//! │  ┌────────────┐ ┌───────────┐ ┌───────────┐  │
//! │  │ FocusTimer │ │ TaskList  │ │  Rewards  │  │
//! │  └─────┬──────┘ └─────┬─────┘ └─────┬─────┘  │
//! │        └──────── Companion ─────────┘        │
//! │                      │ dispatch              │
//! │  ┌────────────┐      ▼                       │
//! │  │ WindowHost │──▶ pomopet-core registry     │
//! │  └────────────┘                              │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config` — `pomopet.toml` loading
//! - `focus` — Pomodoro state machine
//! - `tasks` — to-do list with LMS import
//! - `rewards` — points ledger and accessory shop
//! - `flows` — completion → points → pet reaction
//! - `windows` — open windows, one view adapter each
//! - `telemetry` — tracing subscriber setup

pub mod config;
pub mod error;
pub mod flows;
pub mod focus;
pub mod rewards;
pub mod tasks;
pub mod telemetry;
pub mod windows;

pub use config::DeskConfig;
pub use error::DeskError;
pub use flows::Companion;
pub use focus::{FocusEvent, FocusPhase, FocusTimer};
pub use rewards::{Catalog, PointsLedger, Rewards};
pub use tasks::{Task, TaskId, TaskList};
pub use windows::{WindowHost, WindowKind, WindowModel};
