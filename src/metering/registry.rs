//! Per-backend rate meters and their periodic driver.
//!
//! # Responsibilities
//! - Own one `RateMeter` per tracked identity
//! - Tick every meter once per fixed interval from a background task
//! - Produce `(id, rate)` snapshots for logging and metrics

use std::sync::{Arc, Mutex};
use std::time::Duration;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::lifecycle::Shutdown;
use crate::metering::rate_meter::RateMeter;
use crate::observability::metrics;

/// How long `stop` waits for the driver before aborting it.
const STOP_GRACE: Duration = Duration::from_secs(1);

/// Floor for the tick period; Tokio intervals reject a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A point-in-time reading of one meter.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterSnapshot {
    pub id: String,
    pub rate: f64,
}

/// Registry of rate meters keyed by backend identity.
pub struct ReportRegistry {
    meters: Arc<DashMap<String, Arc<RateMeter>>>,
    interval: Duration,
    shutdown: Shutdown,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl ReportRegistry {
    /// Create a registry that ticks its meters every `interval`.
    ///
    /// The driver does not run until [`ReportRegistry::start`] is called.
    pub fn new(interval: Duration) -> Self {
        Self {
            meters: Arc::new(DashMap::new()),
            interval,
            shutdown: Shutdown::new(),
            driver: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register (or replace) the meter for `id`, smoothing over `window`.
    pub fn register(&self, id: impl Into<String>, window: Duration) {
        let id = id.into();
        let meter = Arc::new(RateMeter::with_window(window, self.interval));
        tracing::debug!(backend = %id, alpha = meter.alpha(), "Rate meter registered");
        self.meters.insert(id, meter);
    }

    /// Record one event for `id`. Unknown ids are ignored.
    pub fn increment(&self, id: &str) {
        if let Some(meter) = self.meters.get(id) {
            meter.update(1);
        }
    }

    /// Current rate for `id`, if registered.
    pub fn rate(&self, id: &str) -> Option<f64> {
        self.meters.get(id).map(|meter| meter.rate())
    }

    pub fn len(&self) -> usize {
        self.meters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }

    /// Tick every registered meter once.
    pub fn tick_all(&self) {
        tick_meters(&self.meters);
    }

    /// Snapshot every meter, logging and publishing each rate. Order is unspecified.
    pub fn report(&self) -> Vec<MeterSnapshot> {
        let snapshots: Vec<MeterSnapshot> = self
            .meters
            .iter()
            .map(|entry| MeterSnapshot {
                id: entry.key().clone(),
                rate: entry.value().rate(),
            })
            .collect();

        for snapshot in &snapshots {
            tracing::info!(backend = %snapshot.id, rate = snapshot.rate, "Backend rate");
            metrics::record_backend_rate(&snapshot.id, snapshot.rate);
        }
        snapshots
    }

    /// Spawn the periodic driver on the current Tokio runtime.
    ///
    /// Calling `start` on a running or stopped registry is a no-op.
    pub fn start(&self) {
        let mut driver = self.driver.lock().expect("registry driver mutex poisoned");
        if driver.is_some() || self.shutdown.is_triggered() {
            return;
        }

        let meters = self.meters.clone();
        let interval = self.interval.max(MIN_INTERVAL);
        let mut shutdown = self.shutdown.subscribe();

        *driver = Some(tokio::spawn(async move {
            // First tick lands one full interval after start.
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => tick_meters(&meters),
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate meter driver received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        }));

        tracing::debug!(interval_ms = interval.as_millis() as u64, "Rate meter driver started");
    }

    /// Halt the periodic driver. Idempotent.
    ///
    /// Waits at most a short grace period for the driver to exit, then aborts it.
    pub async fn stop(&self) {
        self.shutdown.trigger();

        let handle = self
            .driver
            .lock()
            .expect("registry driver mutex poisoned")
            .take();

        if let Some(mut handle) = handle {
            if time::timeout(STOP_GRACE, &mut handle).await.is_err() {
                tracing::warn!("Rate meter driver did not stop in time, aborting");
                handle.abort();
            }
        }
    }
}

fn tick_meters(meters: &DashMap<String, Arc<RateMeter>>) {
    for entry in meters.iter() {
        entry.value().tick();
    }
}
