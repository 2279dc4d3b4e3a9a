//! Error types for the desktop layer.

use pomopet_core::PetError;
use pomopet_lms::LmsError;
use thiserror::Error;

use crate::tasks::TaskId;

/// Top-level error type for desk operations.
#[derive(Debug, Error)]
pub enum DeskError {
    /// Not enough points for a purchase.
    #[error("Insufficient points: need {needed}, have {balance}")]
    InsufficientPoints {
        /// Price of the item.
        needed: u32,
        /// Current balance.
        balance: u32,
    },

    /// No catalog item with this ID.
    #[error("Unknown catalog item: {0}")]
    UnknownItem(String),

    /// The item was bought before.
    #[error("Item already owned: {0}")]
    AlreadyOwned(String),

    /// No task with this ID.
    #[error("Unknown task: {0}")]
    UnknownTask(TaskId),

    /// The task is already completed.
    #[error("Task already completed: {0}")]
    TaskAlreadyDone(TaskId),

    /// No window of this kind is open.
    #[error("Window not open: {0}")]
    WindowNotOpen(String),

    /// The companion pet is gone.
    #[error("Companion pet is not live")]
    NoCompanion,

    /// Pet simulation error.
    #[error("Pet error: {0}")]
    Pet(#[from] PetError),

    /// LMS import error.
    #[error("LMS error: {0}")]
    Lms(#[from] LmsError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DeskError>;
