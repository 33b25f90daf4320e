use tincture_core::{EffectError, SurfaceError};

/// Errors surfaced by the dispatcher to the submitting viewer.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("cannot capture source pixels: {0}")]
    BufferAccess(#[from] SurfaceError),

    #[error("a job is already running")]
    Busy,

    #[error("job queue is full ({limit} pending)")]
    QueueFull { limit: usize },

    #[error("dispatcher has shut down")]
    Shutdown,

    #[error("stage {stage} ({name}) failed: {source}")]
    Effect {
        stage: usize,
        name: String,
        #[source]
        source: EffectError,
    },

    #[error("job was cancelled")]
    Cancelled,

    #[error("worker stopped before the job finished")]
    WorkerLost,

    /// A job callback panicked on the worker thread.
    #[error("job callback panicked: {message}")]
    Panicked { message: String },

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
