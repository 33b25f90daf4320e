//! The per-viewer pipeline dispatcher.
//!
//! A [`Dispatcher`] owns one worker thread and the effect registry it runs
//! against. Submissions are serialized: each job gets its own callbacks and
//! buffers, and the [`BusyPolicy`] decides whether a submission made while
//! another job runs is queued or rejected.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use parking_lot::{Mutex, RwLock};
use tincture_core::{EffectError, EffectOptions, EffectRegistry, PixelBuffer, Progress, Surface};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::{BusyPolicy, DispatcherConfig};
use crate::error::DispatchError;
use crate::job::{Job, JobHandle, JobId};
use crate::queue::EffectQueue;
use crate::worker::{self, WorkerState};

/// Snapshot of what the worker is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherStatus {
    pub running: Option<JobId>,
    pub pending: usize,
}

impl DispatcherStatus {
    pub fn is_idle(&self) -> bool {
        self.running.is_none() && self.pending == 0
    }
}

pub struct Dispatcher {
    config: DispatcherConfig,
    registry: Arc<RwLock<EffectRegistry>>,
    state: Arc<Mutex<WorkerState>>,
    sender: Option<mpsc::UnboundedSender<Job>>,
    worker: Option<JoinHandle<()>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    /// Start a dispatcher with every built-in effect registered.
    pub fn new(config: DispatcherConfig) -> Result<Self, DispatchError> {
        Self::with_registry(config, EffectRegistry::with_builtins())
    }

    /// Start a dispatcher over a caller-built registry.
    pub fn with_registry(
        config: DispatcherConfig,
        registry: EffectRegistry,
    ) -> Result<Self, DispatchError> {
        let registry = Arc::new(RwLock::new(registry));
        let state = Arc::new(Mutex::new(WorkerState::default()));
        let (sender, receiver) = mpsc::unbounded_channel();

        let worker = {
            let registry = Arc::clone(&registry);
            let state = Arc::clone(&state);
            std::thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || worker::run(receiver, registry, state))?
        };

        info!(
            busy_policy = %config.busy_policy,
            max_pending = config.max_pending,
            "Dispatcher started"
        );

        Ok(Self {
            config,
            registry,
            state,
            sender: Some(sender),
            worker: Some(worker),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Queue `queue` to run over `input` on the worker thread.
    ///
    /// `on_progress` receives non-decreasing fractions from 0.0 to 1.0 and
    /// `on_done` receives the final buffer. Both run on the worker thread.
    /// On failure or cancellation `on_done` is never called; the outcome is
    /// available from the returned handle.
    pub fn submit<D, P>(
        &self,
        input: PixelBuffer,
        queue: EffectQueue,
        on_done: D,
        on_progress: P,
    ) -> Result<JobHandle, DispatchError>
    where
        D: FnOnce(PixelBuffer) + Send + 'static,
        P: FnMut(f32) + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(DispatchError::Shutdown)?;

        // Held across the send so the worker cannot pick the job up before
        // `pending` accounts for it.
        let mut state = self.state.lock();
        let outstanding = state.pending + usize::from(state.running.is_some());
        match self.config.busy_policy {
            BusyPolicy::Reject if outstanding > 0 => {
                return Err(DispatchError::Busy);
            }
            // One job may run while `max_pending` more wait behind it.
            BusyPolicy::Queue if outstanding > self.config.max_pending => {
                return Err(DispatchError::QueueFull {
                    limit: self.config.max_pending,
                });
            }
            _ => {}
        }

        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let stages = queue.len();
        let (job, handle) = Job::new(id, input, queue, Box::new(on_done), Box::new(on_progress));
        sender.send(job).map_err(|_| DispatchError::Shutdown)?;
        state.pending += 1;

        debug!(job = %id, stages, pending = state.pending, "Job submitted");
        Ok(handle)
    }

    /// Capture the whole of `surface` and submit it.
    ///
    /// Fails with [`DispatchError::BufferAccess`] when the pixels cannot be
    /// read; no job is created in that case.
    pub fn submit_from_surface<D, P>(
        &self,
        surface: &dyn Surface,
        queue: EffectQueue,
        on_done: D,
        on_progress: P,
    ) -> Result<JobHandle, DispatchError>
    where
        D: FnOnce(PixelBuffer) + Send + 'static,
        P: FnMut(f32) + Send + 'static,
    {
        let (width, height) = surface.dimensions();
        let input = surface.read_pixels(0, 0, width, height)?;
        self.submit(input, queue, on_done, on_progress)
    }

    /// Register a custom effect. Replaces any effect with the same name,
    /// including built-ins; jobs already past that stage's lookup are unaffected.
    pub fn register_effect<F>(&self, name: impl Into<String>, run: F)
    where
        F: Fn(&[u8], &mut [u8], u32, u32, &EffectOptions, &mut Progress<'_>) -> Result<(), EffectError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        debug!(effect = %name, "Registering effect");
        self.registry.write().register_fn(name, run);
    }

    /// Names of every registered effect, sorted.
    pub fn list_effects(&self) -> Vec<String> {
        self.registry.read().names()
    }

    pub fn status(&self) -> DispatcherStatus {
        let state = self.state.lock();
        DispatcherStatus {
            running: state.running,
            pending: state.pending,
        }
    }

    /// Stop accepting jobs, let the worker drain the queue, and join it.
    pub fn shutdown(mut self) -> Result<(), DispatchError> {
        self.sender.take();
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| DispatchError::WorkerLost),
            None => Ok(()),
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish queued jobs and exit on its own.
        if self.sender.take().is_some() {
            debug!("Dispatcher dropped, detaching worker");
        }
    }
}
