//! The background worker: runs queued jobs one at a time.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tincture_core::registry::run_effect;
use tincture_core::{CancelToken, EffectError, EffectRegistry, PixelBuffer, Progress};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::DispatchError;
use crate::job::{Job, JobId};
use crate::queue::EffectQueue;

/// Shared between the dispatcher and its worker.
#[derive(Debug, Default)]
pub(crate) struct WorkerState {
    pub running: Option<JobId>,
    pub pending: usize,
}

/// Worker thread body. Returns once every sender is gone and the channel is drained.
pub(crate) fn run(
    mut jobs: mpsc::UnboundedReceiver<Job>,
    registry: Arc<RwLock<EffectRegistry>>,
    state: Arc<Mutex<WorkerState>>,
) {
    while let Some(job) = jobs.blocking_recv() {
        {
            let mut state = state.lock();
            state.pending = state.pending.saturating_sub(1);
            state.running = Some(job.id);
        }

        let Job {
            id,
            input,
            queue,
            cancel,
            on_done,
            mut on_progress,
            finished,
            outcome,
        } = job;

        info!(job = %id, stages = queue.len(), "Job started");
        let started = Instant::now();
        // Panics in effects are caught per stage; this covers the callbacks.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            execute(id, input, &queue, &registry, &cancel, &mut *on_progress)
        }))
        .unwrap_or_else(|payload| {
            Err(DispatchError::Panicked {
                message: panic_message(payload.as_ref()),
            })
        });
        state.lock().running = None;

        let reply = match result {
            Ok(buffer) => {
                info!(
                    job = %id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Job finished"
                );
                panic::catch_unwind(AssertUnwindSafe(|| on_done(buffer))).map_err(|payload| {
                    let e = DispatchError::Panicked {
                        message: panic_message(payload.as_ref()),
                    };
                    error!(job = %id, error = %e, "Completion callback panicked");
                    e
                })
            }
            Err(DispatchError::Cancelled) => {
                warn!(job = %id, "Job cancelled");
                Err(DispatchError::Cancelled)
            }
            Err(e) => {
                error!(job = %id, error = %e, "Job failed");
                Err(e)
            }
        };

        finished.store(true, Ordering::Release);
        // The caller may have dropped its handle.
        let _ = outcome.send(reply);
    }

    debug!("Job channel closed, worker exiting");
}

/// Run every stage of `queue` over `input`, ping-ponging between two buffers.
pub(crate) fn execute(
    id: JobId,
    input: PixelBuffer,
    queue: &EffectQueue,
    registry: &RwLock<EffectRegistry>,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(f32),
) -> Result<PixelBuffer, DispatchError> {
    on_progress(0.0);
    let mut progress = Progress::new(on_progress).with_cancel(cancel);

    let (width, height) = input.dimensions();
    let total = queue.len();
    let mut front = input;
    let mut back = front.blank_like();

    for (stage, spec) in queue.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        let stage_error = |source: EffectError| match source {
            EffectError::Cancelled => DispatchError::Cancelled,
            source => DispatchError::Effect {
                stage,
                name: spec.name().to_string(),
                source,
            },
        };

        // Read lock is released before the stage runs.
        let effect = registry.read().get(spec.name()).ok_or_else(|| {
            stage_error(EffectError::UnknownEffect {
                name: spec.name().to_string(),
            })
        })?;

        debug!(job = %id, stage, effect = spec.name(), "Running stage");
        let start = stage as f32 / total as f32;
        let end = (stage + 1) as f32 / total as f32;
        progress
            .scoped(start, end, |p| {
                panic::catch_unwind(AssertUnwindSafe(|| {
                    run_effect(
                        effect.as_ref(),
                        front.as_bytes(),
                        back.as_bytes_mut(),
                        width,
                        height,
                        spec.options(),
                        p,
                    )
                }))
                .unwrap_or_else(|payload| {
                    Err(EffectError::Failed {
                        effect: spec.name().to_string(),
                        message: format!("panicked: {}", panic_message(payload.as_ref())),
                    })
                })
            })
            .map_err(stage_error)?;
        progress.report(end).map_err(stage_error)?;

        std::mem::swap(&mut front, &mut back);
    }

    progress.finish().map_err(|_| DispatchError::Cancelled)?;
    Ok(front)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
