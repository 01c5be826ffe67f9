use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Stage;
use crate::config::LimitsConfig;
use crate::error::{Result, ThumbnailError};

/// Wall-clock limit plus a cancel flag, checked between units of work.
///
/// The clock starts when the budget is created, so create it right before the run.
#[derive(Debug, Clone)]
pub struct Budget {
    started: Instant,
    limit: Option<Duration>,
    cancelled: Arc<AtomicBool>,
}

/// Lets another thread stop a run. The run then fails with `Timeout`.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl Budget {
    pub fn unlimited() -> Self {
        Self {
            started: Instant::now(),
            limit: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_limit(limit: Duration) -> Self {
        Self {
            limit: Some(limit),
            ..Self::unlimited()
        }
    }

    pub fn from_limits(limits: &LimitsConfig) -> Self {
        match limits.time_budget() {
            Some(limit) => Self::with_limit(limit),
            None => Self::unlimited(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancelled))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `stage` is the last stage completed, reported in the error.
    pub fn check(&self, stage: Stage) -> Result<()> {
        let elapsed = self.elapsed();
        let expired = self.limit.is_some_and(|limit| elapsed >= limit);
        if expired || self.cancelled.load(Ordering::Relaxed) {
            return Err(ThumbnailError::Timeout { stage, elapsed });
        }
        Ok(())
    }
}
