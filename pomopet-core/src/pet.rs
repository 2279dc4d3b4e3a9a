//! The pet entity — one pet's identity, gauges and transition rules.
//!
//! A [`Pet`] knows nothing about observers, timers or storage. Every
//! operation mutates in place and hands back an owned [`PetSnapshot`].
//! Gauges are clamped after every additive change and the mood is
//! re-derived after every change that could move a gauge.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{PetError, Result};
use crate::mood::{DecayRates, clamp_gauge};
use crate::types::{AccessoryId, Animation, Mood, PetId, PetSnapshot, Position, Species};

/// Starting happiness of a new pet.
pub const DEFAULT_HAPPINESS: f64 = 70.0;
/// Starting energy of a new pet.
pub const DEFAULT_ENERGY: f64 = 100.0;
/// Starting cleanliness of a new pet.
pub const DEFAULT_CLEANLINESS: f64 = 100.0;

const FEED_ENERGY: f64 = 30.0;
const PLAY_HAPPINESS: f64 = 15.0;
const PLAY_ENERGY: f64 = -10.0;
const GROOM_HAPPINESS: f64 = 5.0;
const TASK_HAPPINESS: f64 = 10.0;
const SESSION_HAPPINESS: f64 = 20.0;
const SESSION_ENERGY: f64 = -10.0;

/// Proof that a celebration started at a given animation generation.
///
/// Handed back to [`Pet::revert_celebration`] once the revert delay has
/// elapsed. A ticket from an older generation is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CelebrationTicket {
    /// The celebrating pet.
    pub pet: PetId,
    /// Animation generation captured when the celebration began.
    pub generation: u64,
}

/// Result of [`Pet::apply_elapsed_decay`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecayOutcome {
    /// Nothing observable changed (gauges may still have moved).
    Unchanged,
    /// Mood or animation changed; here is the new state.
    Changed(PetSnapshot),
}

impl DecayOutcome {
    /// Whether the caller should notify observers.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// A single pet.
#[derive(Debug, Clone)]
pub struct Pet {
    id: PetId,
    name: String,
    species: Species,
    mood: Mood,
    animation: Animation,
    position: Position,
    accessories: BTreeSet<AccessoryId>,
    happiness: f64,
    energy: f64,
    cleanliness: f64,
    last_interaction: DateTime<Utc>,
    /// Bumped whenever an interaction sets the animation; guards deferred
    /// celebration reverts.
    generation: u64,
}

impl Pet {
    /// Create a pet with default state and a fresh ID.
    #[must_use]
    pub fn create(name: impl Into<String>, species: Species) -> Self {
        Self::with_id(PetId::new(), name, species)
    }

    /// Create a pet with default state under an existing ID.
    #[must_use]
    pub fn with_id(id: PetId, name: impl Into<String>, species: Species) -> Self {
        let mut pet = Self {
            id,
            name: name.into(),
            species,
            mood: Mood::Neutral,
            animation: Animation::Idle,
            position: Position::default(),
            accessories: BTreeSet::new(),
            happiness: DEFAULT_HAPPINESS,
            energy: DEFAULT_ENERGY,
            cleanliness: DEFAULT_CLEANLINESS,
            last_interaction: Utc::now(),
            generation: 0,
        };
        pet.recompute_mood();
        pet
    }

    /// Rebuild a pet from a persisted snapshot.
    ///
    /// Gauges are clamped and the mood is re-derived, so a tampered or stale
    /// snapshot cannot break the gauge invariants.
    #[must_use]
    pub fn from_snapshot(snapshot: PetSnapshot) -> Self {
        let mut pet = Self {
            id: snapshot.id,
            name: snapshot.name,
            species: snapshot.species,
            mood: snapshot.mood,
            animation: snapshot.animation,
            position: snapshot.position,
            accessories: snapshot.accessories,
            happiness: clamp_gauge(snapshot.happiness),
            energy: clamp_gauge(snapshot.energy),
            cleanliness: clamp_gauge(snapshot.cleanliness),
            last_interaction: snapshot.last_interaction,
            generation: 0,
        };
        // A celebration cannot outlive the process that scheduled its revert.
        if pet.animation == Animation::Celebrating {
            pet.animation = Animation::Idle;
        }
        pet.recompute_mood();
        pet
    }

    /// The pet's ID.
    #[must_use]
    pub fn id(&self) -> PetId {
        self.id
    }

    /// Current mood.
    #[must_use]
    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// Current animation.
    #[must_use]
    pub fn animation(&self) -> Animation {
        self.animation
    }

    /// Current animation generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Owned copy of the pet's state.
    #[must_use]
    pub fn snapshot(&self) -> PetSnapshot {
        PetSnapshot {
            id: self.id,
            name: self.name.clone(),
            species: self.species,
            mood: self.mood,
            animation: self.animation,
            position: self.position,
            accessories: self.accessories.clone(),
            happiness: self.happiness,
            energy: self.energy,
            cleanliness: self.cleanliness,
            last_interaction: self.last_interaction,
        }
    }

    // ------------------------------------------------------------------
    // Identity & cosmetics
    // ------------------------------------------------------------------

    /// Replace the display name.
    pub fn rename(&mut self, name: impl Into<String>) -> PetSnapshot {
        self.name = name.into();
        self.snapshot()
    }

    /// Equip an accessory.
    ///
    /// # Errors
    /// Returns [`PetError::DuplicateAccessory`] if it is already equipped.
    pub fn add_accessory(&mut self, accessory: AccessoryId) -> Result<PetSnapshot> {
        if self.accessories.contains(&accessory) {
            return Err(PetError::DuplicateAccessory {
                pet: self.id,
                accessory,
            });
        }
        self.accessories.insert(accessory);
        Ok(self.snapshot())
    }

    /// Unequip an accessory.
    ///
    /// # Errors
    /// Returns [`PetError::AccessoryNotFound`] if it is not equipped. The pet
    /// is left untouched.
    pub fn remove_accessory(&mut self, accessory: &AccessoryId) -> Result<PetSnapshot> {
        if !self.accessories.remove(accessory) {
            return Err(PetError::AccessoryNotFound {
                pet: self.id,
                accessory: accessory.clone(),
            });
        }
        Ok(self.snapshot())
    }

    // ------------------------------------------------------------------
    // Interactions
    // ------------------------------------------------------------------

    /// Feed: energy +30, eating.
    pub fn feed(&mut self) -> PetSnapshot {
        self.energy = clamp_gauge(self.energy + FEED_ENERGY);
        self.interact(Animation::Eating)
    }

    /// Play: happiness +15, energy −10, walking.
    pub fn play(&mut self) -> PetSnapshot {
        self.happiness = clamp_gauge(self.happiness + PLAY_HAPPINESS);
        self.energy = clamp_gauge(self.energy + PLAY_ENERGY);
        self.interact(Animation::Walking)
    }

    /// Groom: cleanliness restored to full, happiness +5.
    pub fn groom(&mut self) -> PetSnapshot {
        self.cleanliness = clamp_gauge(crate::mood::GAUGE_MAX);
        self.happiness = clamp_gauge(self.happiness + GROOM_HAPPINESS);
        self.last_interaction = Utc::now();
        self.recompute_mood();
        self.snapshot()
    }

    /// Move on screen. Not an interaction: the timestamp is left alone.
    pub fn set_position(&mut self, x: f64, y: f64) -> PetSnapshot {
        self.position = Position::new(x, y);
        self.snapshot()
    }

    /// A task was completed: happiness +10 and a celebration.
    pub fn on_task_complete(&mut self) -> (PetSnapshot, CelebrationTicket) {
        self.happiness = clamp_gauge(self.happiness + TASK_HAPPINESS);
        let snapshot = self.interact(Animation::Celebrating);
        (snapshot, self.ticket())
    }

    /// A focus session was completed: happiness +20, energy −10 and a celebration.
    pub fn on_session_complete(&mut self) -> (PetSnapshot, CelebrationTicket) {
        self.happiness = clamp_gauge(self.happiness + SESSION_HAPPINESS);
        self.energy = clamp_gauge(self.energy + SESSION_ENERGY);
        let snapshot = self.interact(Animation::Celebrating);
        (snapshot, self.ticket())
    }

    /// End a celebration if nothing newer has happened since `ticket` was issued.
    ///
    /// Returns the new state when the revert was applied.
    pub fn revert_celebration(&mut self, ticket: CelebrationTicket) -> Option<PetSnapshot> {
        if ticket.pet != self.id
            || ticket.generation != self.generation
            || self.animation != Animation::Celebrating
        {
            return None;
        }
        self.animation = Animation::Idle;
        Some(self.snapshot())
    }

    // ------------------------------------------------------------------
    // Passive decay
    // ------------------------------------------------------------------

    /// Advance the gauges by `elapsed` wall-clock time.
    ///
    /// Spans inside the debounce window are ignored. Returns
    /// [`DecayOutcome::Changed`] only if the mood or animation moved.
    pub fn apply_elapsed_decay(&mut self, elapsed: Duration, rates: &DecayRates) -> DecayOutcome {
        let Some(delta) = rates.delta_for(elapsed) else {
            return DecayOutcome::Unchanged;
        };

        let before = (self.mood, self.animation);

        self.happiness = clamp_gauge(self.happiness + delta.happiness);
        self.energy = clamp_gauge(self.energy + delta.energy);
        self.cleanliness = clamp_gauge(self.cleanliness + delta.cleanliness);
        self.recompute_mood();

        if before == (self.mood, self.animation) {
            DecayOutcome::Unchanged
        } else {
            DecayOutcome::Changed(self.snapshot())
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn interact(&mut self, animation: Animation) -> PetSnapshot {
        self.animation = animation;
        self.generation += 1;
        self.last_interaction = Utc::now();
        self.recompute_mood();
        self.snapshot()
    }

    fn recompute_mood(&mut self) {
        self.mood = Mood::from_gauges(self.happiness, self.energy, self.cleanliness);
    }

    fn ticket(&self) -> CelebrationTicket {
        CelebrationTicket {
            pet: self.id,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn new_pet_has_defaults() {
        let pet = Pet::create("Mochi", Species::Cat);
        let s = pet.snapshot();
        assert!(approx(s.happiness, 70.0));
        assert!(approx(s.energy, 100.0));
        assert!(approx(s.cleanliness, 100.0));
        assert_eq!(s.mood, Mood::Excited);
        assert_eq!(s.animation, Animation::Idle);
        assert_eq!(s.position, Position::default());
        assert!(s.accessories.is_empty());
    }

    #[test]
    fn feed_clamps_energy_and_recomputes_mood() {
        let mut pet = Pet::create("Mochi", Species::Cat);
        let s = pet.feed();
        assert!(approx(s.energy, 100.0));
        assert_eq!(s.animation, Animation::Eating);
        assert_eq!(s.mood, Mood::Excited);
    }

    #[test]
    fn play_moves_two_gauges() {
        let mut pet = Pet::create("Mochi", Species::Cat);
        let s = pet.play();
        assert!(approx(s.happiness, 85.0));
        assert!(approx(s.energy, 90.0));
        assert_eq!(s.animation, Animation::Walking);
        assert_eq!(s.mood, Mood::Excited);
    }

    #[test]
    fn groom_restores_cleanliness() {
        let mut pet = Pet::create("Mochi", Species::Cat);
        pet.apply_elapsed_decay(Duration::from_secs(60 * 100), &DecayRates::default());
        let s = pet.groom();
        assert!(approx(s.cleanliness, 100.0));
        assert!(approx(s.happiness, 25.0));
    }

    #[test]
    fn move_is_not_an_interaction() {
        let mut pet = Pet::create("Mochi", Species::Cat);
        let before = pet.snapshot();
        let generation = pet.generation();
        let s = pet.set_position(120.0, -4.5);
        assert_eq!(s.position, Position::new(120.0, -4.5));
        assert_eq!(s.last_interaction, before.last_interaction);
        assert_eq!(s.mood, before.mood);
        assert_eq!(pet.generation(), generation);
    }

    #[test]
    fn accessories_have_set_semantics() {
        let mut pet = Pet::create("Mochi", Species::Cat);
        pet.add_accessory("bow".into()).expect("first add");
        let err = pet.add_accessory("bow".into()).expect_err("duplicate");
        assert!(matches!(err, PetError::DuplicateAccessory { .. }));
        pet.remove_accessory(&"bow".into()).expect("remove");
        let before = pet.snapshot();
        let err = pet.remove_accessory(&"bow".into()).expect_err("absent");
        assert!(matches!(err, PetError::AccessoryNotFound { .. }));
        assert_eq!(pet.snapshot(), before);
    }

    #[test]
    fn task_complete_celebrates() {
        let mut pet = Pet::create("Mochi", Species::Dog);
        let (s, ticket) = pet.on_task_complete();
        assert!(approx(s.happiness, 80.0));
        assert_eq!(s.animation, Animation::Celebrating);
        assert_eq!(ticket.generation, pet.generation());
    }

    #[test]
    fn session_complete_costs_energy() {
        let mut pet = Pet::create("Mochi", Species::Dog);
        let (s, _) = pet.on_session_complete();
        assert!(approx(s.happiness, 90.0));
        assert!(approx(s.energy, 90.0));
        assert_eq!(s.animation, Animation::Celebrating);
    }

    #[test]
    fn revert_applies_to_current_celebration() {
        let mut pet = Pet::create("Mochi", Species::Fox);
        let (_, ticket) = pet.on_task_complete();
        let s = pet.revert_celebration(ticket).expect("reverted");
        assert_eq!(s.animation, Animation::Idle);
    }

    #[test]
    fn stale_revert_is_discarded() {
        let mut pet = Pet::create("Mochi", Species::Fox);
        let (_, old) = pet.on_task_complete();
        let (_, _new) = pet.on_session_complete();
        assert!(pet.revert_celebration(old).is_none());
        assert_eq!(pet.animation(), Animation::Celebrating);
    }

    #[test]
    fn revert_does_not_stomp_newer_animation() {
        let mut pet = Pet::create("Mochi", Species::Fox);
        let (_, ticket) = pet.on_task_complete();
        pet.feed();
        assert!(pet.revert_celebration(ticket).is_none());
        assert_eq!(pet.animation(), Animation::Eating);
    }

    #[test]
    fn decay_inside_debounce_is_noop() {
        let mut pet = Pet::create("Mochi", Species::Bunny);
        let before = pet.snapshot();
        let outcome = pet.apply_elapsed_decay(Duration::from_millis(99), &DecayRates::default());
        assert_eq!(outcome, DecayOutcome::Unchanged);
        assert_eq!(pet.snapshot(), before);
    }

    #[test]
    fn two_hundred_minutes_of_decay() {
        let mut pet = Pet::create("Mochi", Species::Bunny);
        let outcome =
            pet.apply_elapsed_decay(Duration::from_secs(200 * 60), &DecayRates::default());
        let DecayOutcome::Changed(s) = outcome else {
            panic!("mood should have changed");
        };
        assert!(approx(s.happiness, 0.0));
        assert!(approx(s.energy, 40.0));
        assert!(approx(s.cleanliness, 60.0));
        assert_eq!(s.mood, Mood::Tired);
    }

    #[test]
    fn small_decay_without_mood_change_is_unchanged() {
        let mut pet = Pet::create("Mochi", Species::Bunny);
        pet.feed(); // mood now excited
        let outcome = pet.apply_elapsed_decay(Duration::from_secs(1), &DecayRates::default());
        assert_eq!(outcome, DecayOutcome::Unchanged);
        assert!(pet.snapshot().happiness < 70.0);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let pet = Pet::create("Mochi", Species::Dragon);
        let mut s = pet.snapshot();
        s.happiness = 0.0;
        s.accessories.insert("crown".into());
        assert!(approx(pet.snapshot().happiness, 70.0));
        assert!(pet.snapshot().accessories.is_empty());
    }

    #[test]
    fn from_snapshot_restores_invariants() {
        let mut snapshot = Pet::create("Mochi", Species::Cat).snapshot();
        snapshot.happiness = 250.0;
        snapshot.energy = -3.0;
        snapshot.mood = Mood::Sad;
        snapshot.animation = Animation::Celebrating;
        let pet = Pet::from_snapshot(snapshot);
        let s = pet.snapshot();
        assert!(approx(s.happiness, 100.0));
        assert!(approx(s.energy, 0.0));
        assert_eq!(s.mood, Mood::from_gauges(100.0, 0.0, 100.0));
        assert_eq!(s.animation, Animation::Idle);
    }
}
