//! Worker pool and its start/stop protocol.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::{EngineConfig, MeteringConfig};
use crate::engine::error::EngineError;
use crate::engine::state::EngineState;
use crate::engine::worker::{BoxedRequest, DispatchContext, Worker};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{Backend, Selector};
use crate::metering::ReportRegistry;
use crate::observability::metrics;
use crate::queue::BlockingQueue;

/// Floor for timer periods; Tokio intervals reject a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handles owned while the engine is running or stopping.
///
/// A handle is removed only after it has been joined, so an interrupted
/// `stop` leaves behind exactly the tasks it has not waited for yet.
struct RunningPool {
    queue: Arc<BlockingQueue<BoxedRequest>>,
    shutdown: Shutdown,
    workers: Vec<JoinHandle<()>>,
    reporter: Option<JoinHandle<()>>,
}

/// Bounded pool of workers dispatching queued requests to backends.
pub struct Engine {
    max_workers: usize,
    selector: Arc<dyn Selector>,
    report_interval: Duration,
    window: Duration,
    registry: Arc<ReportRegistry>,
    state: AtomicU8,
    active: Arc<AtomicUsize>,
    running: Mutex<Option<RunningPool>>,
}

impl Engine {
    /// Create an engine with `max_workers` worker loops and default intervals.
    pub fn new(max_workers: usize, selector: Arc<dyn Selector>) -> Self {
        let engine = EngineConfig {
            max_workers,
            ..Default::default()
        };
        Self::from_config(&engine, &MeteringConfig::default(), selector)
    }

    /// Create an engine from configuration.
    pub fn from_config(
        engine: &EngineConfig,
        metering: &MeteringConfig,
        selector: Arc<dyn Selector>,
    ) -> Self {
        Self {
            max_workers: engine.max_workers,
            selector,
            report_interval: engine.report_interval(),
            window: metering.window(),
            registry: Arc::new(ReportRegistry::new(metering.tick_interval())),
            state: AtomicU8::new(EngineState::Created as u8),
            active: Arc::new(AtomicUsize::new(0)),
            running: Mutex::new(None),
        }
    }

    /// Override the coarse report interval.
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Override the meter tick interval and EMA window.
    pub fn with_metering(mut self, tick_interval: Duration, window: Duration) -> Self {
        self.registry = Arc::new(ReportRegistry::new(tick_interval));
        self.window = window;
        self
    }

    pub fn state(&self) -> EngineState {
        EngineState::from(self.state.load(Ordering::Acquire))
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Worker loops currently running.
    pub fn active_workers(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Per-backend rate meters.
    pub fn registry(&self) -> &Arc<ReportRegistry> {
        &self.registry
    }

    /// Begin consuming `queue`, dispatching to `backends`.
    ///
    /// Must be called from within a Tokio runtime. Fails if the engine was
    /// already started, has no workers, or if `backends` is empty.
    pub fn start(
        &self,
        queue: Arc<BlockingQueue<BoxedRequest>>,
        backends: Vec<Arc<dyn Backend>>,
    ) -> Result<(), EngineError> {
        // Held until the pool is stored so a concurrent `stop` always finds it.
        // Only a `stop` can hold the lock, and then the engine has left `Created`.
        let mut running = self
            .running
            .try_lock()
            .map_err(|_| EngineError::AlreadyStarted)?;

        if self.state() != EngineState::Created {
            return Err(EngineError::AlreadyStarted);
        }
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        if self.max_workers == 0 {
            return Err(EngineError::NoWorkers);
        }
        if backends.is_empty() {
            return Err(EngineError::NoBackends);
        }
        self.transition(EngineState::Created, EngineState::Running)
            .map_err(|_| EngineError::AlreadyStarted)?;

        for backend in &backends {
            self.registry.register(backend.id(), self.window);
        }
        self.registry.start();

        let shutdown = Shutdown::new();
        let reporter = runtime.spawn(run_reporter(
            queue.clone(),
            self.registry.clone(),
            self.report_interval,
            shutdown.subscribe(),
        ));

        let backend_count = backends.len();
        let ctx = Arc::new(DispatchContext {
            queue: queue.clone(),
            backends,
            selector: self.selector.clone(),
            registry: self.registry.clone(),
            active: self.active.clone(),
        });

        let workers = (0..self.max_workers)
            .map(|id| runtime.spawn(Worker::new(id).run(ctx.clone())))
            .collect();

        *running = Some(RunningPool {
            queue,
            shutdown,
            workers,
            reporter: Some(reporter),
        });

        tracing::info!(
            workers = self.max_workers,
            backends = backend_count,
            report_interval_secs = self.report_interval.as_secs_f64(),
            tick_interval_secs = self.registry.interval().as_secs_f64(),
            "Engine started"
        );
        Ok(())
    }

    /// Stop gracefully: signal shutdown, close the queue, stop metering,
    /// and wait for every worker to drain the remaining items.
    ///
    /// If the returned future is dropped before completion the engine stays
    /// `Stopping`; calling `stop` again resumes waiting for the tasks that
    /// have not been joined yet.
    pub async fn stop(&self) -> Result<(), EngineError> {
        let mut running = match self.state() {
            EngineState::Created => return Err(EngineError::NotStarted),
            EngineState::Stopped => return Err(EngineError::AlreadyStopped),
            EngineState::Running => {
                self.transition(EngineState::Running, EngineState::Stopping)
                    .map_err(|_| EngineError::AlreadyStopped)?;
                self.running.lock().await
            }
            // Another `stop` either holds the pool or was dropped midway.
            EngineState::Stopping => match self.running.try_lock() {
                Ok(guard) if guard.is_some() => guard,
                _ => return Err(EngineError::AlreadyStopped),
            },
        };
        let Some(pool) = running.as_mut() else {
            return Err(EngineError::AlreadyStopped);
        };

        tracing::info!(queued = pool.queue.len(), "Engine stopping");

        pool.shutdown.trigger();
        pool.queue.close();
        self.registry.stop().await;

        while let Some(handle) = pool.workers.last_mut() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task terminated abnormally");
            }
            pool.workers.pop();
        }
        if let Some(reporter) = pool.reporter.as_mut() {
            if let Err(e) = reporter.await {
                tracing::error!(error = %e, "Reporter task terminated abnormally");
            }
            pool.reporter = None;
        }

        let remaining = pool.queue.len();
        *running = None;
        self.state.store(EngineState::Stopped as u8, Ordering::Release);
        tracing::info!(remaining, "Engine stopped");
        Ok(())
    }

    fn transition(&self, from: EngineState, to: EngineState) -> Result<(), EngineState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(EngineState::from)
    }
}

/// Periodically log the queue depth and a rate snapshot until shutdown.
async fn run_reporter(
    queue: Arc<BlockingQueue<BoxedRequest>>,
    registry: Arc<ReportRegistry>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let interval = interval.max(MIN_INTERVAL);
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let len = queue.len();
                tracing::info!(queue_length = len, "Remaining items in queue");
                metrics::record_queue_length(len);
                registry.report();
            }
            _ = shutdown.recv() => {
                tracing::debug!("Reporter received shutdown signal, exiting loop");
                break;
            }
        }
    }
}
