//! Per-view adapter — one mounted view's window onto the registry.
//!
//! A [`ViewAdapter`] owns exactly one observer registration. It keeps the
//! latest snapshot of every pet the view cares about and calls the view's
//! refresh callback after each change. Unmounting (explicitly or by drop)
//! unregisters that observer, so a closed window is never written to again.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::registry::{ObserverToken, PetObserver, PetRegistry};
use crate::types::{PetAction, PetId, PetSnapshot, PetUpdate};

/// Which pets a view follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFilter {
    /// Every pet.
    #[default]
    All,
    /// A single pet.
    Pet(PetId),
}

impl ViewFilter {
    /// Whether updates for `id` pass the filter.
    #[must_use]
    pub fn matches(self, id: PetId) -> bool {
        match self {
            Self::All => true,
            Self::Pet(only) => only == id,
        }
    }
}

type PetTable = Arc<Mutex<BTreeMap<PetId, PetSnapshot>>>;
type RefreshFn = Box<dyn Fn(&PetUpdate) + Send + Sync>;

struct ViewObserver {
    filter: ViewFilter,
    pets: PetTable,
    refresh: RefreshFn,
}

impl PetObserver for ViewObserver {
    fn on_update(&self, update: &PetUpdate) {
        if !self.filter.matches(update.pet_id()) {
            return;
        }
        {
            let mut pets = self.pets.lock();
            match update {
                PetUpdate::Changed { id, snapshot } => {
                    pets.insert(*id, snapshot.clone());
                }
                PetUpdate::Removed { id } => {
                    pets.remove(id);
                }
            }
        }
        (self.refresh)(update);
    }
}

/// Bridge between one mounted view and the [`PetRegistry`].
pub struct ViewAdapter {
    label: String,
    registry: PetRegistry,
    filter: ViewFilter,
    pets: PetTable,
    token: Option<ObserverToken>,
}

impl std::fmt::Debug for ViewAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewAdapter")
            .field("label", &self.label)
            .field("filter", &self.filter)
            .field("mounted", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ViewAdapter {
    /// Mount a view. The refresh callback fires once per live pet straight
    /// away (catch-up), then once per change.
    pub fn mount<F>(
        registry: &PetRegistry,
        label: impl Into<String>,
        filter: ViewFilter,
        refresh: F,
    ) -> Self
    where
        F: Fn(&PetUpdate) + Send + Sync + 'static,
    {
        let mut adapter = Self {
            label: label.into(),
            registry: registry.clone(),
            filter,
            pets: Arc::new(Mutex::new(BTreeMap::new())),
            token: None,
        };
        adapter.attach(Box::new(refresh));
        debug!(view = %adapter.label, "View mounted");
        adapter
    }

    /// Swap the refresh callback while keeping the same logical view.
    ///
    /// The old registration is removed before the new one is added, so no
    /// update is delivered twice. The new callback gets the catch-up replay.
    pub fn replace_refresh<F>(&mut self, refresh: F)
    where
        F: Fn(&PetUpdate) + Send + Sync + 'static,
    {
        self.detach();
        self.attach(Box::new(refresh));
        debug!(view = %self.label, "View callback replaced");
    }

    /// Unregister from the registry. Safe to call more than once.
    ///
    /// Returns `true` if the view was mounted.
    pub fn unmount(&mut self) -> bool {
        let was_mounted = self.detach();
        if was_mounted {
            debug!(view = %self.label, "View unmounted");
        }
        was_mounted
    }

    /// Whether the view is still registered.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.token.is_some()
    }

    /// The view's label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The view's filter.
    #[must_use]
    pub fn filter(&self) -> ViewFilter {
        self.filter
    }

    /// Latest known state of every followed pet.
    #[must_use]
    pub fn pets(&self) -> Vec<PetSnapshot> {
        self.pets.lock().values().cloned().collect()
    }

    /// Latest known state of one pet.
    #[must_use]
    pub fn pet(&self, id: PetId) -> Option<PetSnapshot> {
        self.pets.lock().get(&id).cloned()
    }

    /// Forward a user action to the registry.
    ///
    /// # Errors
    /// Accessory validation failures from [`PetRegistry::dispatch`].
    pub fn dispatch(&self, id: PetId, action: PetAction) -> Result<Option<PetSnapshot>> {
        self.registry.dispatch(id, action)
    }

    fn attach(&mut self, refresh: RefreshFn) {
        let observer = ViewObserver {
            filter: self.filter,
            pets: Arc::clone(&self.pets),
            refresh,
        };
        self.token = Some(self.registry.register_observer(Arc::new(observer)));
    }

    fn detach(&mut self) -> bool {
        self.token
            .take()
            .is_some_and(|token| self.registry.unregister_observer(token))
    }
}

impl Drop for ViewAdapter {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::SimulationConfig;
    use crate::persistence::NullSink;
    use crate::types::{Animation, Species};

    fn registry() -> PetRegistry {
        PetRegistry::new(&SimulationConfig::default(), Arc::new(NullSink))
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&PetUpdate) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move |_: &PetUpdate| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn mount_catches_up_on_existing_pets() {
        let registry = registry();
        let id = registry.create_pet("Mochi", Species::Cat);
        let (count, refresh) = counter();
        let view = ViewAdapter::mount(&registry, "main", ViewFilter::All, refresh);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(view.pet(id).map(|s| s.name), Some("Mochi".to_string()));
    }

    #[test]
    fn filtered_view_ignores_other_pets() {
        let registry = registry();
        let mochi = registry.create_pet("Mochi", Species::Cat);
        let pixel = registry.create_pet("Pixel", Species::Dog);
        let (count, refresh) = counter();
        let view = ViewAdapter::mount(&registry, "overlay", ViewFilter::Pet(mochi), refresh);

        registry.dispatch(pixel, PetAction::Feed).expect("feed");
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(view.pets().len(), 1);
    }

    #[test]
    fn dispatch_through_adapter_updates_cache() {
        let registry = registry();
        let id = registry.create_pet("Mochi", Species::Cat);
        let (_, refresh) = counter();
        let view = ViewAdapter::mount(&registry, "main", ViewFilter::All, refresh);
        view.dispatch(id, PetAction::Feed).expect("feed");
        assert_eq!(view.pet(id).map(|s| s.animation), Some(Animation::Eating));
    }

    #[test]
    fn unmount_and_drop_release_the_observer() {
        let registry = registry();
        let (_, refresh) = counter();
        let mut view = ViewAdapter::mount(&registry, "main", ViewFilter::All, refresh);
        assert_eq!(registry.observer_count(), 1);
        assert!(view.unmount());
        assert!(!view.unmount());
        assert_eq!(registry.observer_count(), 0);

        let (_, refresh) = counter();
        let view = ViewAdapter::mount(&registry, "pomodoro", ViewFilter::All, refresh);
        assert_eq!(registry.observer_count(), 1);
        drop(view);
        assert_eq!(registry.observer_count(), 0);
    }

    #[test]
    fn replace_refresh_never_double_delivers() {
        let registry = registry();
        let id = registry.create_pet("Mochi", Species::Cat);
        let (old_count, old_refresh) = counter();
        let mut view = ViewAdapter::mount(&registry, "main", ViewFilter::All, old_refresh);
        let (new_count, new_refresh) = counter();
        view.replace_refresh(new_refresh);
        assert_eq!(registry.observer_count(), 1);

        registry.dispatch(id, PetAction::Play).expect("play");
        assert_eq!(old_count.load(Ordering::SeqCst), 1);
        assert_eq!(new_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn removal_drops_pet_from_cache() {
        let registry = registry();
        let id = registry.create_pet("Mochi", Species::Cat);
        let (_, refresh) = counter();
        let view = ViewAdapter::mount(&registry, "main", ViewFilter::All, refresh);
        registry.remove_pet(id);
        assert!(view.pet(id).is_none());
    }
}
