//! Headless pomopet: runs the pet simulation, a focus timer and the window
//! models until Ctrl-C.
//!
//! Usage: `pomopet [path/to/pomopet.toml]`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use pomopet_core::persistence::{PersistQueue, open_store};
use pomopet_core::{PetRegistry, UpdateScheduler, ViewFilter};
use pomopet_desk::{Companion, DeskConfig, FocusEvent, WindowHost, WindowKind, telemetry};
use pomopet_lms::LmsClient;
use tokio::time::Instant;
use tracing::{info, warn};

const FOCUS_CLOCK: Duration = Duration::from_secs(1);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("pomopet.toml"), PathBuf::from);
    let config = if path.exists() {
        DeskConfig::from_file(&path).with_context(|| format!("loading {}", path.display()))?
    } else {
        DeskConfig::default()
    };
    telemetry::init(&config.pet.general);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %path.display(),
        "pomopet starting"
    );

    // ── Storage & registry ───────────────────────────────────────────────
    let store = open_store(&config.pet.persistence).context("opening pet store")?;
    let saved = store.load_all().context("loading saved pets")?;
    let (queue, persist_worker) =
        PersistQueue::spawn(Arc::clone(&store), config.pet.persistence.queue_capacity);
    let registry = PetRegistry::new(&config.pet.simulation, Arc::new(queue));
    registry.restore(saved);

    let mut companion = Companion::adopt(registry.clone(), &config);
    let lms = LmsClient::from_config(&config.lms).context("configuring LMS import")?;
    if lms.is_available() {
        match companion.import_assignments(&lms).await {
            Ok(added) => info!(added, "Coursework imported"),
            Err(e) => warn!(error = %e, "Coursework import failed; continuing without it"),
        }
    }

    // ── Simulation & windows ─────────────────────────────────────────────
    let mut scheduler =
        UpdateScheduler::new(registry.clone(), config.pet.simulation.tick_interval());
    scheduler.start();

    let mut windows = WindowHost::new(registry.clone());
    windows.open(WindowKind::Main, ViewFilter::All);
    windows.open(WindowKind::PetOverlay, ViewFilter::Pet(companion.pet_id()));
    windows.open(WindowKind::Pomodoro, ViewFilter::Pet(companion.pet_id()));

    companion.start_focus();
    let mut clock = tokio::time::interval(FOCUS_CLOCK);
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = clock.tick() => {
                let now = Instant::now();
                for event in companion.advance_focus(now.duration_since(last))? {
                    match event {
                        FocusEvent::SessionCompleted { completed_sessions } => info!(
                            completed_sessions,
                            balance = companion.rewards().balance(),
                            "Focus session complete"
                        ),
                        FocusEvent::PhaseChanged { from, to } => info!(?from, ?to, "Focus phase"),
                    }
                }
                last = now;
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("waiting for Ctrl-C")?;
                info!("Shutting down");
                break;
            }
        }
    }

    // ── Shutdown: drop every registry handle so the persistence queue drains ──
    scheduler.stop();
    windows.close_all();
    drop(windows);
    drop(scheduler);
    drop(companion);
    drop(registry);
    match tokio::time::timeout(SHUTDOWN_GRACE, persist_worker).await {
        Ok(joined) => joined.context("persistence worker")?,
        Err(_) => warn!("Persistence queue did not drain in time"),
    }

    info!("pomopet stopped");
    Ok(())
}
