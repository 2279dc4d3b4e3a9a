//! Error types for the pomopet core library.

use thiserror::Error;

use crate::types::{AccessoryId, PetId};

/// Top-level error type for all core operations.
#[derive(Error, Debug)]
pub enum PetError {
    /// The pet already wears this accessory.
    #[error("Pet {pet} already has accessory '{accessory}'")]
    DuplicateAccessory {
        /// The pet.
        pet: PetId,
        /// The accessory that was already equipped.
        accessory: AccessoryId,
    },

    /// The pet does not wear this accessory.
    #[error("Pet {pet} has no accessory '{accessory}'")]
    AccessoryNotFound {
        /// The pet.
        pet: PetId,
        /// The accessory that was missing.
        accessory: AccessoryId,
    },

    /// No live pet has this ID.
    #[error("Unknown pet: {0}")]
    UnknownPet(PetId),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PetError {
    /// Whether this is an accessory validation failure that UI code is
    /// expected to show to the user.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateAccessory { .. } | Self::AccessoryNotFound { .. }
        )
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, PetError>;
