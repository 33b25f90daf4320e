//! Tincture Dispatch: background pipeline runner.
//!
//! Runs [`EffectQueue`]s from `tincture-core` on a dedicated worker thread so
//! the submitting viewer is never blocked for a pipeline's duration. Progress
//! and completion come back through per-job callbacks and a [`JobHandle`];
//! jobs can be cancelled between progress steps.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod queue;
mod worker;

// Re-exports for convenience.
pub use config::{BusyPolicy, DispatcherConfig};
pub use dispatcher::{Dispatcher, DispatcherStatus};
pub use error::DispatchError;
pub use job::{JobHandle, JobId};
pub use queue::{EffectQueue, EffectSpec};
