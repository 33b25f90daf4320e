//! Jobs and the handles callers keep for them.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tincture_core::{CancelToken, PixelBuffer};
use tokio::sync::oneshot;

use crate::error::DispatchError;
use crate::queue::EffectQueue;

/// Identifier assigned to each submitted job, unique per dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u64);

impl JobId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

pub(crate) type DoneFn = Box<dyn FnOnce(PixelBuffer) + Send>;
pub(crate) type ProgressFn = Box<dyn FnMut(f32) + Send>;
pub(crate) type Outcome = Result<(), DispatchError>;

/// Everything the worker needs to run one pipeline. Owns its input buffer.
pub(crate) struct Job {
    pub id: JobId,
    pub input: PixelBuffer,
    pub queue: EffectQueue,
    pub cancel: CancelToken,
    pub on_done: DoneFn,
    pub on_progress: ProgressFn,
    pub finished: Arc<AtomicBool>,
    pub outcome: oneshot::Sender<Outcome>,
}

impl Job {
    /// Build a job together with the caller's handle on it.
    pub fn new(
        id: JobId,
        input: PixelBuffer,
        queue: EffectQueue,
        on_done: DoneFn,
        on_progress: ProgressFn,
    ) -> (Self, JobHandle) {
        let cancel = CancelToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let (tx, rx) = oneshot::channel();
        let handle = JobHandle {
            id,
            cancel: cancel.clone(),
            finished: Arc::clone(&finished),
            outcome: rx,
        };
        let job = Self {
            id,
            input,
            queue,
            cancel,
            on_done,
            on_progress,
            finished,
            outcome: tx,
        };
        (job, handle)
    }
}

/// Caller-side view of a submitted job.
///
/// Dropping the handle does not cancel the job.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    cancel: CancelToken,
    finished: Arc<AtomicBool>,
    outcome: oneshot::Receiver<Outcome>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Ask the worker to stop. Takes effect at the next progress step or
    /// stage boundary; `on_done` is then never called.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the job has succeeded, failed, or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Block until the job ends.
    ///
    /// On success `on_done` has already run. Must not be called from inside
    /// an async runtime; use [`outcome`](Self::outcome) there.
    pub fn wait(self) -> Result<(), DispatchError> {
        self.outcome
            .blocking_recv()
            .unwrap_or(Err(DispatchError::WorkerLost))
    }

    /// Await the end of the job.
    pub async fn outcome(self) -> Result<(), DispatchError> {
        self.outcome.await.unwrap_or(Err(DispatchError::WorkerLost))
    }
}
