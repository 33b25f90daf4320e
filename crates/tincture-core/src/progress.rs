//! Incremental progress reporting with cooperative cancellation.
//!
//! Every transform receives a [`Progress`] and calls [`Progress::step`] as it
//! walks the image. A report fires at most once per whole percent, and the
//! fractions handed to the sink never decrease. Multi-phase effects carve
//! their slot into sub-ranges with [`Progress::scoped`]; the pipeline does
//! the same to place each stage inside `[stage / total, (stage + 1) / total]`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::EffectError;

/// Shared cancellation flag for one job.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Progress reporter scoped to one sub-range of the overall `[0, 1]` run.
pub struct Progress<'a> {
    sink: &'a mut dyn FnMut(f32),
    cancel: Option<&'a CancelToken>,
    origin: f32,
    span: f32,
    /// Last local fraction seen by this scope.
    last: f32,
    /// Last absolute fraction handed to the sink, across scopes.
    emitted: f32,
}

impl<'a> Progress<'a> {
    /// Root reporter covering `[0, 1]`.
    pub fn new(sink: &'a mut dyn FnMut(f32)) -> Self {
        Self {
            sink,
            cancel: None,
            origin: 0.0,
            span: 1.0,
            last: 0.0,
            emitted: 0.0,
        }
    }

    /// Check `token` each time progress advances.
    pub fn with_cancel(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// `Err(Cancelled)` once the owning job has been cancelled.
    pub fn check_cancelled(&self) -> Result<(), EffectError> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(EffectError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Record that `done` of `total` units in this scope are finished.
    ///
    /// The fraction is floored to whole percent before it is reported.
    pub fn step(&mut self, done: usize, total: usize) -> Result<(), EffectError> {
        if total == 0 {
            return Ok(());
        }
        let percent = (done.min(total) as u64 * 100 / total as u64) as f32;
        if percent / 100.0 <= self.last {
            return Ok(());
        }
        self.report(percent / 100.0)
    }

    /// Report a local fraction in `[0, 1]`. Equal or smaller values are ignored.
    pub fn report(&mut self, fraction: f32) -> Result<(), EffectError> {
        let local = fraction.clamp(0.0, 1.0);
        if local <= self.last {
            return Ok(());
        }
        self.last = local;
        self.check_cancelled()?;

        let absolute = (self.origin + self.span * local).min(1.0);
        if absolute > self.emitted {
            self.emitted = absolute;
            (self.sink)(absolute);
        }
        Ok(())
    }

    /// Report completion of this scope.
    pub fn finish(&mut self) -> Result<(), EffectError> {
        self.report(1.0)
    }

    /// Run `f` with a child reporter mapped onto `[start, end]` of this scope.
    pub fn scoped<T>(&mut self, start: f32, end: f32, f: impl FnOnce(&mut Progress<'_>) -> T) -> T {
        let mut child = Progress {
            sink: &mut *self.sink,
            cancel: self.cancel,
            origin: self.origin + self.span * start,
            span: self.span * (end - start),
            last: 0.0,
            emitted: self.emitted,
        };
        let out = f(&mut child);
        let emitted = child.emitted;
        self.emitted = self.emitted.max(emitted);
        out
    }
}
