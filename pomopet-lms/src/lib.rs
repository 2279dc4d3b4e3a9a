//! # pomopet-lms — coursework import for pomopet
//!
//! Pulls courses and assignments from a learning-management system so they
//! can be turned into tasks:
//!   - **Canvas** (REST API, personal access token)
//!   - **None** (import disabled; every call returns `Unavailable`)
//!
//! Requests retry a bounded number of times and then give up. The caller
//! decides what to do with an unavailable LMS; the pet never depends on it.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{LmsClient, LmsProvider};
pub use config::{LmsConfig, ProviderKind};
pub use error::LmsError;
pub use types::{Assignment, Course};
