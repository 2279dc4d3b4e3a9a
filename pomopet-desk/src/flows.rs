//! Companion flows — where productivity turns into pet reactions.
//!
//! The core never awards points; these flows do, and then tell the pet:
//!
//! | Trigger | Points | Pet action |
//! |---|---|---|
//! | task completed | `rewards.task_points` | `TaskComplete` |
//! | focus block completed | `rewards.session_points` | `SessionComplete` |
//! | item purchased | −price | `AddAccessory` |

use std::time::Duration;

use chrono::NaiveDate;
use pomopet_core::{AccessoryId, PetAction, PetId, PetRegistry, PetSnapshot};
use pomopet_lms::LmsClient;
use tracing::{info, warn};

use crate::config::{DeskConfig, RewardsConfig};
use crate::error::{DeskError, Result};
use crate::focus::{FocusEvent, FocusTimer};
use crate::rewards::Rewards;
use crate::tasks::{TaskId, TaskList};

/// The user's companion pet plus the productivity state that feeds it.
#[derive(Debug)]
pub struct Companion {
    registry: PetRegistry,
    pet: PetId,
    tasks: TaskList,
    rewards: Rewards,
    focus: FocusTimer,
    points: RewardsConfig,
}

impl Companion {
    /// Attach to an existing pet.
    #[must_use]
    pub fn new(registry: PetRegistry, pet: PetId, config: &DeskConfig) -> Self {
        Self {
            registry,
            pet,
            tasks: TaskList::new(),
            rewards: Rewards::new(config.rewards.starting_balance),
            focus: FocusTimer::new(config.focus.clone()),
            points: config.rewards.clone(),
        }
    }

    /// Attach to the first live pet, creating the configured starter pet if
    /// the registry is empty.
    #[must_use]
    pub fn adopt(registry: PetRegistry, config: &DeskConfig) -> Self {
        let pet = match registry.all_pets().first() {
            Some((id, _)) => *id,
            None => registry.create_pet(config.starter.name.clone(), config.starter.species),
        };
        Self::new(registry, pet, config)
    }

    /// The companion pet's ID.
    #[must_use]
    pub fn pet_id(&self) -> PetId {
        self.pet
    }

    /// Current pet state, if it is still live.
    #[must_use]
    pub fn pet(&self) -> Option<PetSnapshot> {
        self.registry.pet(self.pet)
    }

    /// Shared registry handle.
    #[must_use]
    pub fn registry(&self) -> &PetRegistry {
        &self.registry
    }

    /// The task list.
    #[must_use]
    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    /// Points and purchases.
    #[must_use]
    pub fn rewards(&self) -> &Rewards {
        &self.rewards
    }

    /// The focus timer.
    #[must_use]
    pub fn focus(&self) -> &FocusTimer {
        &self.focus
    }

    /// Mutable focus timer, for pause/resume/skip/reset.
    pub fn focus_mut(&mut self) -> &mut FocusTimer {
        &mut self.focus
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Add a task.
    pub fn add_task(&mut self, title: impl Into<String>, due: Option<NaiveDate>) -> TaskId {
        self.tasks.add(title, due)
    }

    /// Remove a task.
    ///
    /// # Errors
    /// [`DeskError::UnknownTask`].
    pub fn remove_task(&mut self, id: TaskId) -> Result<()> {
        self.tasks.remove(id).map(|_| ())
    }

    /// Finish a task: award points, then celebrate.
    ///
    /// Returns the pet's new state, or `None` if the pet is gone (the points
    /// are kept either way).
    ///
    /// # Errors
    /// [`DeskError::UnknownTask`] or [`DeskError::TaskAlreadyDone`]; nothing
    /// is awarded in that case.
    pub fn complete_task(&mut self, id: TaskId) -> Result<Option<PetSnapshot>> {
        let title = self.tasks.complete(id)?.title.clone();
        let balance = self
            .rewards
            .award_points(self.points.task_points, format!("task: {title}"));
        info!(task = %id, balance, "Task reward granted");
        self.react(PetAction::TaskComplete)
    }

    /// Pull upcoming coursework from the LMS into the task list.
    ///
    /// # Errors
    /// Any [`pomopet_lms::LmsError`] from the fetch.
    pub async fn import_assignments(&mut self, client: &LmsClient) -> Result<usize> {
        let assignments = client.fetch_upcoming().await?;
        Ok(self.tasks.import(assignments))
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// Start a focus block.
    pub fn start_focus(&mut self) -> Option<FocusEvent> {
        self.focus.start_focus()
    }

    /// Advance the focus timer; each completed block is rewarded and
    /// celebrated.
    ///
    /// # Errors
    /// Pet dispatch errors (not expected for session completion).
    pub fn advance_focus(&mut self, elapsed: Duration) -> Result<Vec<FocusEvent>> {
        let events = self.focus.advance(elapsed);
        for event in &events {
            if let FocusEvent::SessionCompleted { completed_sessions } = event {
                let balance = self.rewards.award_points(
                    self.points.session_points,
                    format!("focus session #{completed_sessions}"),
                );
                info!(completed_sessions, balance, "Focus reward granted");
                self.react(PetAction::SessionComplete)?;
            }
        }
        Ok(events)
    }

    // ------------------------------------------------------------------
    // Marketplace
    // ------------------------------------------------------------------

    /// Buy an item and put it on the pet.
    ///
    /// # Errors
    /// Purchase errors leave points and the pet untouched.
    pub fn purchase(&mut self, item_id: &str) -> Result<Option<PetSnapshot>> {
        let item = self.rewards.purchase(item_id)?;
        self.react(PetAction::AddAccessory {
            accessory: item.accessory(),
        })
    }

    /// Put an owned accessory back on.
    ///
    /// # Errors
    /// [`DeskError::UnknownItem`] if it was never bought, or the pet's
    /// duplicate-accessory error.
    pub fn equip(&mut self, accessory: &AccessoryId) -> Result<Option<PetSnapshot>> {
        if !self.rewards.owns(accessory) {
            return Err(DeskError::UnknownItem(accessory.to_string()));
        }
        self.react(PetAction::AddAccessory {
            accessory: accessory.clone(),
        })
    }

    /// Take an accessory off. It stays owned.
    ///
    /// # Errors
    /// The pet's accessory-not-found error.
    pub fn unequip(&mut self, accessory: &AccessoryId) -> Result<Option<PetSnapshot>> {
        self.react(PetAction::RemoveAccessory {
            accessory: accessory.clone(),
        })
    }

    fn react(&self, action: PetAction) -> Result<Option<PetSnapshot>> {
        let name = action.name();
        let snapshot = self.registry.dispatch(self.pet, action)?;
        if snapshot.is_none() {
            warn!(pet = %self.pet, action = name, "Companion pet is gone");
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pomopet_core::config::SimulationConfig;
    use pomopet_core::persistence::NullSink;
    use pomopet_core::{Animation, Species};

    use super::*;

    fn companion() -> Companion {
        let registry = PetRegistry::new(&SimulationConfig::default(), Arc::new(NullSink));
        Companion::adopt(registry, &DeskConfig::default())
    }

    #[test]
    fn adopt_creates_starter_once() {
        let registry = PetRegistry::new(&SimulationConfig::default(), Arc::new(NullSink));
        let first = Companion::adopt(registry.clone(), &DeskConfig::default());
        let second = Companion::adopt(registry.clone(), &DeskConfig::default());
        assert_eq!(first.pet_id(), second.pet_id());
        assert_eq!(registry.pet_count(), 1);
        assert_eq!(first.pet().map(|p| p.species), Some(Species::Cat));
    }

    #[test]
    fn task_completion_pays_and_celebrates() {
        let mut companion = companion();
        let task = companion.add_task("Problem set", None);
        let snapshot = companion
            .complete_task(task)
            .expect("complete")
            .expect("live");
        assert_eq!(snapshot.animation, Animation::Celebrating);
        assert!((snapshot.happiness - 80.0).abs() < f64::EPSILON);
        assert_eq!(companion.rewards().balance(), 10);

        assert!(companion.complete_task(task).is_err());
        assert_eq!(companion.rewards().balance(), 10);
    }

    #[test]
    fn focus_session_pays_and_celebrates() {
        let mut companion = companion();
        companion.start_focus();
        let events = companion
            .advance_focus(Duration::from_secs(25 * 60))
            .expect("advance");
        assert!(events.contains(&FocusEvent::SessionCompleted { completed_sessions: 1 }));
        assert_eq!(companion.rewards().balance(), 25);
        let pet = companion.pet().expect("live");
        assert_eq!(pet.animation, Animation::Celebrating);
        assert!((pet.energy - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn purchase_equips_the_pet() {
        let registry = PetRegistry::new(&SimulationConfig::default(), Arc::new(NullSink));
        let mut config = DeskConfig::default();
        config.rewards.starting_balance = 30;
        let mut companion = Companion::adopt(registry, &config);
        let hat = AccessoryId::from("bow_tie");

        let pet = companion.purchase("bow_tie").expect("buy").expect("live");
        assert!(pet.accessories.contains(&hat));
        assert_eq!(companion.rewards().balance(), 0);
        assert!(matches!(companion.purchase("crown"), Err(DeskError::InsufficientPoints { .. })));

        companion.unequip(&hat).expect("unequip");
        assert!(!companion.pet().expect("live").accessories.contains(&hat));
        companion.equip(&hat).expect("equip");
        assert!(matches!(
            companion.equip(&AccessoryId::from("crown")),
            Err(DeskError::UnknownItem(_))
        ));
    }

    #[test]
    fn rewards_survive_a_missing_pet() {
        let mut companion = companion();
        let id = companion.pet_id();
        companion.registry().remove_pet(id);
        let task = companion.add_task("Laundry", None);
        assert_eq!(companion.complete_task(task).expect("complete"), None);
        assert_eq!(companion.rewards().balance(), 10);
    }
}
