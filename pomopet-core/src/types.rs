//! Core type definitions for the pomopet simulation.
//!
//! All types that cross the registry boundary are owned, `Clone` and
//! serializable, so observers and stores never see live pet state.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PetId(pub Uuid);

impl PetId {
    /// Create a new random pet ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a cosmetic accessory (e.g. `"party_hat"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessoryId(pub String);

impl AccessoryId {
    /// Build an accessory ID from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccessoryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Pet species. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// A cat.
    Cat,
    /// A dog.
    Dog,
    /// A bunny.
    Bunny,
    /// A fox.
    Fox,
    /// A small dragon.
    Dragon,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cat => "cat",
            Self::Dog => "dog",
            Self::Bunny => "bunny",
            Self::Fox => "fox",
            Self::Dragon => "dragon",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Simulation State
// ---------------------------------------------------------------------------

/// A pet's mood. Always derived from the gauges, see [`crate::mood`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Gauge average ≥ 80.
    Excited,
    /// Gauge average ≥ 60.
    Happy,
    /// Gauge average ≥ 40.
    Neutral,
    /// Gauge average ≥ 20.
    Tired,
    /// Gauge average < 20.
    Sad,
}

/// The animation a view should play for a pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Animation {
    /// Standing around.
    #[default]
    Idle,
    /// Moving or playing.
    Walking,
    /// Just fed.
    Eating,
    /// Reacting to a finished task or focus session. Reverts to idle.
    Celebrating,
    /// Asleep.
    Sleeping,
}

/// Screen position of a pet, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Owned copy of a pet's identity and simulation state.
///
/// This is the notification payload and the persisted form. Mutating a
/// snapshot never affects the pet it was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetSnapshot {
    /// Pet identifier.
    pub id: PetId,
    /// Display name.
    pub name: String,
    /// Species.
    pub species: Species,
    /// Derived mood.
    pub mood: Mood,
    /// Current animation.
    pub animation: Animation,
    /// Screen position.
    pub position: Position,
    /// Equipped accessories.
    pub accessories: BTreeSet<AccessoryId>,
    /// Happiness gauge, 0–100.
    pub happiness: f64,
    /// Energy gauge, 0–100.
    pub energy: f64,
    /// Cleanliness gauge, 0–100.
    pub cleanliness: f64,
    /// Time of the last user-initiated interaction.
    pub last_interaction: DateTime<Utc>,
}

impl PetSnapshot {
    /// Average of the three gauges.
    #[must_use]
    pub fn gauge_average(&self) -> f64 {
        (self.happiness + self.energy + self.cleanliness) / 3.0
    }
}

// ---------------------------------------------------------------------------
// Registry Messages
// ---------------------------------------------------------------------------

/// A notification delivered to every registered observer.
#[derive(Debug, Clone, PartialEq)]
pub enum PetUpdate {
    /// The pet was created, restored or changed.
    Changed {
        /// Which pet.
        id: PetId,
        /// Its state after the change.
        snapshot: PetSnapshot,
    },
    /// The pet was removed. No further updates follow for this ID.
    Removed {
        /// Which pet.
        id: PetId,
    },
}

impl PetUpdate {
    /// The pet this update is about.
    #[must_use]
    pub fn pet_id(&self) -> PetId {
        match self {
            Self::Changed { id, .. } | Self::Removed { id } => *id,
        }
    }

    /// The new snapshot, if the pet still exists.
    #[must_use]
    pub fn snapshot(&self) -> Option<&PetSnapshot> {
        match self {
            Self::Changed { snapshot, .. } => Some(snapshot),
            Self::Removed { .. } => None,
        }
    }
}

/// A user-initiated action routed through [`crate::registry::PetRegistry::dispatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PetAction {
    /// Feed the pet.
    Feed,
    /// Play with the pet.
    Play,
    /// Groom the pet.
    Groom,
    /// Move the pet on screen. Not an interaction.
    Move {
        /// New X coordinate.
        x: f64,
        /// New Y coordinate.
        y: f64,
    },
    /// A task was completed.
    TaskComplete,
    /// A focus session was completed.
    SessionComplete,
    /// Rename the pet.
    Rename {
        /// The new display name.
        name: String,
    },
    /// Equip an accessory.
    AddAccessory {
        /// Accessory to equip.
        accessory: AccessoryId,
    },
    /// Unequip an accessory.
    RemoveAccessory {
        /// Accessory to unequip.
        accessory: AccessoryId,
    },
}

impl PetAction {
    /// Short name used in log fields.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Play => "play",
            Self::Groom => "groom",
            Self::Move { .. } => "move",
            Self::TaskComplete => "task_complete",
            Self::SessionComplete => "session_complete",
            Self::Rename { .. } => "rename",
            Self::AddAccessory { .. } => "add_accessory",
            Self::RemoveAccessory { .. } => "remove_accessory",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pet_ids_are_unique() {
        let a = PetId::new();
        let b = PetId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn action_serializes_with_tag() {
        let action = PetAction::AddAccessory {
            accessory: AccessoryId::new("party_hat"),
        };
        let json = serde_json::to_string(&action).expect("serialize");
        assert!(json.contains("\"action\":\"add_accessory\""));
        assert!(json.contains("party_hat"));
    }

    #[test]
    fn update_exposes_pet_id() {
        let id = PetId::new();
        let update = PetUpdate::Removed { id };
        assert_eq!(update.pet_id(), id);
        assert!(update.snapshot().is_none());
    }
}
