//! Timer-driven background loops: memory sync (3 min), autonomous wake
//! (15 min), and the clock tick (1 s). Each loop is an independent task;
//! all of them share one shutdown hook and exit at their next suspension
//! point when it fires.

use crate::buffer::SyncEngine;
use crate::engine::InteractionEngine;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default sync flush cadence: 3 minutes.
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 180;

/// Default autonomous wake cadence: 15 minutes.
const DEFAULT_WAKE_INTERVAL_SECS: u64 = 900;

const CLOCK_TICK_SECS: u64 = 1;

/// Intervals for the recurring loops. Env overrides:
/// `LUMINOUS_SYNC_INTERVAL_SECS` (min 10) and `LUMINOUS_WAKE_INTERVAL_SECS`
/// (min 60).
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub sync_interval: Duration,
    pub wake_interval: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let sync_secs = std::env::var("LUMINOUS_SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS)
            .max(10);
        let wake_secs = std::env::var("LUMINOUS_WAKE_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_WAKE_INTERVAL_SECS)
            .max(60);
        Self {
            sync_interval: Duration::from_secs(sync_secs),
            wake_interval: Duration::from_secs(wake_secs),
        }
    }
}

/// Seconds-resolution uptime counter bumped by the clock tick; fuels the
/// heartbeat display.
#[derive(Default)]
pub struct ClockState {
    ticks: AtomicU64,
}

impl ClockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

/// Owns the background tasks and their shared shutdown hook.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Spawns a recurring loop. The first tick fires one full period after
    /// spawn, matching wall-clock cadence rather than firing immediately.
    pub fn spawn_recurring<F, Fut>(&mut self, name: &'static str, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut rx = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => tick().await,
                    _ = rx.changed() => {
                        debug!(target: "luminous::sched", "{} loop stopped", name);
                        break;
                    }
                }
            }
        });
        self.tasks.push((name, handle));
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Flips the shared hook and waits for every loop to exit. In-flight
    /// network calls are not cancelled; the loops stop scheduling new ticks.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for (name, handle) in self.tasks {
            if handle.await.is_err() {
                debug!(target: "luminous::sched", "{} loop ended abnormally", name);
            }
        }
        info!(target: "luminous::sched", "background loops stopped");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Wires the three loops and returns the running scheduler.
pub fn start_background_loops(
    engine: Arc<InteractionEngine>,
    sync: Arc<SyncEngine>,
    clock: Arc<ClockState>,
    config: ScheduleConfig,
) -> Scheduler {
    info!(
        target: "luminous::sched",
        sync_secs = config.sync_interval.as_secs(),
        wake_secs = config.wake_interval.as_secs(),
        "starting background loops"
    );

    let mut scheduler = Scheduler::new();

    scheduler.spawn_recurring("memory-sync", config.sync_interval, move || {
        let sync = Arc::clone(&sync);
        async move {
            sync.flush().await;
        }
    });

    scheduler.spawn_recurring("wake-cycle", config.wake_interval, move || {
        let engine = Arc::clone(&engine);
        async move {
            engine.autonomous_wake().await;
        }
    });

    scheduler.spawn_recurring(
        "clock-tick",
        Duration::from_secs(CLOCK_TICK_SECS),
        move || {
            let clock = Arc::clone(&clock);
            async move {
                clock.bump();
            }
        },
    );

    scheduler
}
