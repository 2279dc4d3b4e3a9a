//! The pet registry — single source of truth for every live pet.
//!
//! One [`PetRegistry`] is constructed at startup and handed to every view,
//! scheduler and flow by cloning the handle. All mutation goes through one
//! mutex, so changes to a pet are strictly ordered, and every change is fanned
//! out to the registered [`PetObserver`]s before the lock is released.
//!
//! ```text
//!   ViewAdapter ──dispatch──▶ PetRegistry ──▶ Pet (mutate)
//!                                  │
//!   UpdateScheduler ──tick──▶      ├──▶ PersistSink (fire-and-forget)
//!                                  └──▶ observers (registration order)
//! ```
//!
//! Observers run while the registry lock is held and must not call back into
//! the registry from `on_update`.

use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SimulationConfig;
use crate::error::{PetError, Result};
use crate::mood::DecayRates;
use crate::persistence::{PersistOp, PersistSink};
use crate::pet::{CelebrationTicket, DecayOutcome, Pet};
use crate::types::{PetAction, PetId, PetSnapshot, PetUpdate, Species};

/// Receives every pet change.
pub trait PetObserver: Send + Sync {
    /// Called once per change, and once per live pet right after registration.
    fn on_update(&self, update: &PetUpdate);
}

impl<F> PetObserver for F
where
    F: Fn(&PetUpdate) + Send + Sync,
{
    fn on_update(&self, update: &PetUpdate) {
        self(update);
    }
}

/// Handle returned by [`PetRegistry::register_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverToken(u64);

struct PendingRevert {
    generation: u64,
    handle: JoinHandle<()>,
}

struct RegistryInner {
    pets: BTreeMap<PetId, Pet>,
    /// Keyed by monotonically increasing tokens, so iteration is registration order.
    observers: BTreeMap<ObserverToken, Arc<dyn PetObserver>>,
    next_token: u64,
    reverts: HashMap<PetId, PendingRevert>,
    decay: DecayRates,
    celebration_revert: Duration,
    sink: Arc<dyn PersistSink>,
}

impl RegistryInner {
    fn notify(&self, update: &PetUpdate) {
        for (token, observer) in &self.observers {
            deliver(*token, observer.as_ref(), update);
        }
    }
}

fn deliver(token: ObserverToken, observer: &dyn PetObserver, update: &PetUpdate) {
    let result = catch_unwind(AssertUnwindSafe(|| observer.on_update(update)));
    if result.is_err() {
        error!(observer = token.0, pet = %update.pet_id(), "Observer panicked; continuing");
    }
}

/// Shared handle to the registry. Cloning is cheap and every clone sees the
/// same pets.
#[derive(Clone)]
pub struct PetRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl std::fmt::Debug for PetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PetRegistry")
            .field("pets", &inner.pets.len())
            .field("observers", &inner.observers.len())
            .field("pending_reverts", &inner.reverts.len())
            .finish_non_exhaustive()
    }
}

impl PetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(config: &SimulationConfig, sink: Arc<dyn PersistSink>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                pets: BTreeMap::new(),
                observers: BTreeMap::new(),
                next_token: 0,
                reverts: HashMap::new(),
                decay: config.decay,
                celebration_revert: config.celebration_revert(),
                sink,
            })),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a pet, persist it and announce it to every observer.
    pub fn create_pet(&self, name: impl Into<String>, species: Species) -> PetId {
        let pet = Pet::create(name, species);
        let id = pet.id();
        let snapshot = pet.snapshot();

        let mut inner = self.inner.lock();
        inner.pets.insert(id, pet);
        inner.sink.submit(PersistOp::Save(snapshot.clone()));
        inner.notify(&PetUpdate::Changed { id, snapshot });

        info!(pet = %id, %species, "Pet created");
        id
    }

    /// Load previously saved pets. Existing pets with the same ID are
    /// replaced. Restored pets are announced but not re-persisted.
    pub fn restore<I>(&self, snapshots: I) -> usize
    where
        I: IntoIterator<Item = PetSnapshot>,
    {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let mut restored = 0;
        for snapshot in snapshots {
            let pet = Pet::from_snapshot(snapshot);
            let id = pet.id();
            let snapshot = pet.snapshot();
            if let Some(pending) = inner.reverts.remove(&id) {
                pending.handle.abort();
            }
            inner.pets.insert(id, pet);
            inner.notify(&PetUpdate::Changed { id, snapshot });
            restored += 1;
        }
        info!(restored, "Pets restored");
        restored
    }

    /// Remove a pet. Cancels its pending celebration revert and announces the
    /// removal; no further updates are sent for this ID.
    ///
    /// Returns `false` if no such pet was live.
    pub fn remove_pet(&self, id: PetId) -> bool {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.pets.remove(&id).is_none() {
            debug!(pet = %id, "Remove of unknown pet ignored");
            return false;
        }
        if let Some(pending) = inner.reverts.remove(&id) {
            pending.handle.abort();
        }
        inner.sink.submit(PersistOp::Delete(id));
        inner.notify(&PetUpdate::Removed { id });
        info!(pet = %id, "Pet removed");
        true
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register an observer and immediately replay every live pet to it.
    pub fn register_observer(&self, observer: Arc<dyn PetObserver>) -> ObserverToken {
        let mut inner = self.inner.lock();
        let token = ObserverToken(inner.next_token);
        inner.next_token += 1;
        inner.observers.insert(token, Arc::clone(&observer));

        for (id, pet) in &inner.pets {
            let update = PetUpdate::Changed {
                id: *id,
                snapshot: pet.snapshot(),
            };
            deliver(token, observer.as_ref(), &update);
        }

        debug!(observer = token.0, pets = inner.pets.len(), "Observer registered");
        token
    }

    /// Remove an observer. Unknown tokens are ignored.
    ///
    /// Returns `true` if the observer was registered.
    pub fn unregister_observer(&self, token: ObserverToken) -> bool {
        let removed = self.inner.lock().observers.remove(&token).is_some();
        if removed {
            debug!(observer = token.0, "Observer unregistered");
        }
        removed
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Apply a user action to a pet, persist the result and notify everyone.
    ///
    /// Returns `Ok(None)` when the pet does not exist: a stale ID held by a
    /// view is logged and otherwise ignored.
    ///
    /// # Errors
    /// Accessory validation failures ([`PetError::DuplicateAccessory`],
    /// [`PetError::AccessoryNotFound`]). Nothing is persisted or notified in
    /// that case.
    pub fn dispatch(&self, id: PetId, action: PetAction) -> Result<Option<PetSnapshot>> {
        let action_name = action.name();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(pet) = inner.pets.get_mut(&id) else {
            warn!(pet = %id, action = action_name, "Dispatch to unknown pet ignored");
            return Ok(None);
        };

        let (snapshot, ticket) = match action {
            PetAction::Feed => (pet.feed(), None),
            PetAction::Play => (pet.play(), None),
            PetAction::Groom => (pet.groom(), None),
            PetAction::Move { x, y } => (pet.set_position(x, y), None),
            PetAction::TaskComplete => {
                let (snapshot, ticket) = pet.on_task_complete();
                (snapshot, Some(ticket))
            }
            PetAction::SessionComplete => {
                let (snapshot, ticket) = pet.on_session_complete();
                (snapshot, Some(ticket))
            }
            PetAction::Rename { name } => (pet.rename(name), None),
            PetAction::AddAccessory { accessory } => (pet.add_accessory(accessory)?, None),
            PetAction::RemoveAccessory { accessory } => (pet.remove_accessory(&accessory)?, None),
        };

        debug!(
            pet = %id,
            action = action_name,
            mood = ?snapshot.mood,
            animation = ?snapshot.animation,
            "Dispatched"
        );

        inner.sink.submit(PersistOp::Save(snapshot.clone()));
        if let Some(ticket) = ticket {
            self.schedule_revert(inner, ticket);
        }
        inner.notify(&PetUpdate::Changed {
            id,
            snapshot: snapshot.clone(),
        });
        Ok(Some(snapshot))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Snapshot of every live pet.
    #[must_use]
    pub fn all_pets(&self) -> Vec<(PetId, PetSnapshot)> {
        self.inner
            .lock()
            .pets
            .iter()
            .map(|(id, pet)| (*id, pet.snapshot()))
            .collect()
    }

    /// Snapshot of one pet.
    #[must_use]
    pub fn pet(&self, id: PetId) -> Option<PetSnapshot> {
        self.inner.lock().pets.get(&id).map(Pet::snapshot)
    }

    /// Snapshot of one pet, failing if it does not exist.
    ///
    /// # Errors
    /// Returns [`PetError::UnknownPet`] if the pet is not live.
    pub fn require(&self, id: PetId) -> Result<PetSnapshot> {
        self.pet(id).ok_or(PetError::UnknownPet(id))
    }

    /// Number of live pets.
    #[must_use]
    pub fn pet_count(&self) -> usize {
        self.inner.lock().pets.len()
    }

    /// Number of celebrations waiting to revert.
    #[must_use]
    pub fn pending_reverts(&self) -> usize {
        self.inner.lock().reverts.len()
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Advance every live pet by `elapsed`.
    ///
    /// Only pets whose mood or animation changed are persisted and announced.
    /// Returns how many pets were announced.
    pub fn tick(&self, elapsed: Duration) -> usize {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let ids: Vec<PetId> = inner.pets.keys().copied().collect();
        let rates = inner.decay;

        let mut changed = 0;
        for id in ids {
            let Some(pet) = inner.pets.get_mut(&id) else {
                continue;
            };
            if let DecayOutcome::Changed(snapshot) = pet.apply_elapsed_decay(elapsed, &rates) {
                inner.sink.submit(PersistOp::Save(snapshot.clone()));
                inner.notify(&PetUpdate::Changed { id, snapshot });
                changed += 1;
            }
        }

        debug!(
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            pets = inner.pets.len(),
            changed,
            "Tick"
        );
        changed
    }

    /// End a celebration if `ticket` is still current. Called by the revert
    /// task once the delay elapses.
    pub fn revert_celebration(&self, ticket: CelebrationTicket) -> Option<PetSnapshot> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if inner
            .reverts
            .get(&ticket.pet)
            .is_some_and(|pending| pending.generation == ticket.generation)
        {
            inner.reverts.remove(&ticket.pet);
        }

        let snapshot = inner.pets.get_mut(&ticket.pet)?.revert_celebration(ticket)?;
        debug!(pet = %ticket.pet, generation = ticket.generation, "Celebration over");
        inner.sink.submit(PersistOp::Save(snapshot.clone()));
        inner.notify(&PetUpdate::Changed {
            id: ticket.pet,
            snapshot: snapshot.clone(),
        });
        Some(snapshot)
    }

    fn schedule_revert(&self, inner: &mut RegistryInner, ticket: CelebrationTicket) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(pet = %ticket.pet, "No async runtime; celebration will not auto-revert");
            return;
        };

        let delay = inner.celebration_revert;
        let weak: Weak<Mutex<RegistryInner>> = Arc::downgrade(&self.inner);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                PetRegistry { inner }.revert_celebration(ticket);
            }
        });

        let pending = PendingRevert {
            generation: ticket.generation,
            handle,
        };
        if let Some(previous) = inner.reverts.insert(ticket.pet, pending) {
            previous.handle.abort();
        }
    }
}
