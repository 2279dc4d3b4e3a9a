//! Window host — the desktop shell's open windows.
//!
//! Each open window owns one [`ViewAdapter`] and a [`WindowModel`] that the
//! adapter's refresh callback keeps current. Closing a window drops its
//! adapter, which unregisters it from the registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use pomopet_core::{PetAction, PetId, PetRegistry, PetSnapshot, PetUpdate, ViewAdapter, ViewFilter};
use tracing::{debug, info};

use crate::error::{DeskError, Result};

/// The windows the app can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WindowKind {
    /// Dashboard with tasks, shop and every pet.
    Main,
    /// Transparent always-on-top pet.
    PetOverlay,
    /// Focus timer window.
    Pomodoro,
}

impl WindowKind {
    /// Stable label used in logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::PetOverlay => "pet-overlay",
            Self::Pomodoro => "pomodoro",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a window would render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowModel {
    /// Refresh callbacks received since the window opened.
    pub refreshes: u64,
    /// The most recent update.
    pub last_update: Option<PetUpdate>,
}

struct Window {
    adapter: ViewAdapter,
    model: Arc<Mutex<WindowModel>>,
}

impl Window {
    fn open(registry: &PetRegistry, kind: WindowKind, filter: ViewFilter) -> Self {
        let model = Arc::new(Mutex::new(WindowModel::default()));
        let adapter = ViewAdapter::mount(registry, kind.label(), filter, refresh_into(&model));
        Self { adapter, model }
    }
}

fn refresh_into(model: &Arc<Mutex<WindowModel>>) -> impl Fn(&PetUpdate) + Send + Sync + 'static {
    let model = Arc::clone(model);
    move |update: &PetUpdate| {
        let mut model = model.lock();
        model.refreshes += 1;
        model.last_update = Some(update.clone());
    }
}

/// Tracks open windows and which one has focus.
pub struct WindowHost {
    registry: PetRegistry,
    windows: BTreeMap<WindowKind, Window>,
    focused: Option<WindowKind>,
}

impl fmt::Debug for WindowHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowHost")
            .field("open", &self.windows.keys().collect::<Vec<_>>())
            .field("focused", &self.focused)
            .finish_non_exhaustive()
    }
}

impl WindowHost {
    /// A host with no windows.
    #[must_use]
    pub fn new(registry: PetRegistry) -> Self {
        Self {
            registry,
            windows: BTreeMap::new(),
            focused: None,
        }
    }

    /// Open a window, or focus it if it is already open.
    ///
    /// Returns `true` if a new window was opened.
    pub fn open(&mut self, kind: WindowKind, filter: ViewFilter) -> bool {
        if self.windows.contains_key(&kind) {
            self.focused = Some(kind);
            debug!(window = %kind, "Window already open; focusing");
            return false;
        }
        self.windows.insert(kind, Window::open(&self.registry, kind, filter));
        self.focused = Some(kind);
        info!(window = %kind, "Window opened");
        true
    }

    /// Close a window. Returns `false` if it was not open.
    pub fn close(&mut self, kind: WindowKind) -> bool {
        let Some(window) = self.windows.remove(&kind) else {
            return false;
        };
        drop(window);
        if self.focused == Some(kind) {
            self.focused = self.windows.keys().next_back().copied();
        }
        info!(window = %kind, "Window closed");
        true
    }

    /// Close everything.
    pub fn close_all(&mut self) {
        let kinds: Vec<WindowKind> = self.windows.keys().copied().collect();
        for kind in kinds {
            self.close(kind);
        }
    }

    /// Bring a window to the front.
    ///
    /// # Errors
    /// [`DeskError::WindowNotOpen`].
    pub fn focus(&mut self, kind: WindowKind) -> Result<()> {
        if !self.windows.contains_key(&kind) {
            return Err(DeskError::WindowNotOpen(kind.label().to_string()));
        }
        self.focused = Some(kind);
        Ok(())
    }

    /// Reload a window's view: its refresh callback is replaced and the
    /// model restarts from the catch-up replay.
    ///
    /// # Errors
    /// [`DeskError::WindowNotOpen`].
    pub fn reload(&mut self, kind: WindowKind) -> Result<()> {
        let window = self
            .windows
            .get_mut(&kind)
            .ok_or_else(|| DeskError::WindowNotOpen(kind.label().to_string()))?;
        let model = Arc::new(Mutex::new(WindowModel::default()));
        window.adapter.replace_refresh(refresh_into(&model));
        window.model = model;
        debug!(window = %kind, "Window reloaded");
        Ok(())
    }

    /// Whether a window is open.
    #[must_use]
    pub fn is_open(&self, kind: WindowKind) -> bool {
        self.windows.contains_key(&kind)
    }

    /// The focused window, if any.
    #[must_use]
    pub fn focused(&self) -> Option<WindowKind> {
        self.focused
    }

    /// Open windows.
    #[must_use]
    pub fn open_windows(&self) -> Vec<WindowKind> {
        self.windows.keys().copied().collect()
    }

    /// A copy of a window's model.
    #[must_use]
    pub fn model(&self, kind: WindowKind) -> Option<WindowModel> {
        self.windows.get(&kind).map(|w| w.model.lock().clone())
    }

    /// Pets as the window currently sees them.
    #[must_use]
    pub fn pets(&self, kind: WindowKind) -> Vec<PetSnapshot> {
        self.windows
            .get(&kind)
            .map(|w| w.adapter.pets())
            .unwrap_or_default()
    }

    /// Send a user action from a window.
    ///
    /// # Errors
    /// [`DeskError::WindowNotOpen`], or the pet's validation error.
    pub fn dispatch(
        &self,
        kind: WindowKind,
        id: PetId,
        action: PetAction,
    ) -> Result<Option<PetSnapshot>> {
        let window = self
            .windows
            .get(&kind)
            .ok_or_else(|| DeskError::WindowNotOpen(kind.label().to_string()))?;
        Ok(window.adapter.dispatch(id, action)?)
    }
}

#[cfg(test)]
mod tests {
    use pomopet_core::config::SimulationConfig;
    use pomopet_core::persistence::NullSink;
    use pomopet_core::{Animation, Species};

    use super::*;

    fn setup() -> (PetRegistry, PetId, WindowHost) {
        let registry = PetRegistry::new(&SimulationConfig::default(), Arc::new(NullSink));
        let pet = registry.create_pet("Mochi", Species::Cat);
        let host = WindowHost::new(registry.clone());
        (registry, pet, host)
    }

    #[test]
    fn open_twice_only_focuses() {
        let (registry, _, mut host) = setup();
        assert!(host.open(WindowKind::Main, ViewFilter::All));
        assert!(host.open(WindowKind::Pomodoro, ViewFilter::All));
        assert!(!host.open(WindowKind::Main, ViewFilter::All));
        assert_eq!(host.focused(), Some(WindowKind::Main));
        assert_eq!(registry.observer_count(), 2);
    }

    #[test]
    fn every_window_sees_dispatches_from_any_window() {
        let (_, pet, mut host) = setup();
        host.open(WindowKind::Main, ViewFilter::All);
        host.open(WindowKind::PetOverlay, ViewFilter::Pet(pet));

        host.dispatch(WindowKind::PetOverlay, pet, PetAction::Play)
            .expect("play");
        for kind in [WindowKind::Main, WindowKind::PetOverlay] {
            let model = host.model(kind).expect("open");
            assert_eq!(model.refreshes, 2);
            let snapshot = model.last_update.and_then(|u| u.snapshot().cloned()).expect("changed");
            assert_eq!(snapshot.animation, Animation::Walking);
        }
    }

    #[test]
    fn closing_unregisters_and_moves_focus() {
        let (registry, pet, mut host) = setup();
        host.open(WindowKind::Main, ViewFilter::All);
        host.open(WindowKind::Pomodoro, ViewFilter::All);
        assert!(host.close(WindowKind::Pomodoro));
        assert!(!host.close(WindowKind::Pomodoro));
        assert_eq!(host.focused(), Some(WindowKind::Main));
        assert_eq!(registry.observer_count(), 1);

        assert!(matches!(
            host.dispatch(WindowKind::Pomodoro, pet, PetAction::Feed),
            Err(DeskError::WindowNotOpen(_))
        ));
        assert!(host.focus(WindowKind::Pomodoro).is_err());

        host.close_all();
        assert!(host.open_windows().is_empty());
        assert_eq!(host.focused(), None);
        assert_eq!(registry.observer_count(), 0);
    }

    #[test]
    fn reload_restarts_the_model_from_catch_up() {
        let (registry, pet, mut host) = setup();
        host.open(WindowKind::Main, ViewFilter::All);
        registry.dispatch(pet, PetAction::Groom).expect("groom");
        assert_eq!(host.model(WindowKind::Main).expect("open").refreshes, 2);

        host.reload(WindowKind::Main).expect("reload");
        assert_eq!(host.model(WindowKind::Main).expect("open").refreshes, 1);
        assert_eq!(registry.observer_count(), 1);
        assert_eq!(host.pets(WindowKind::Main).len(), 1);
    }
}
