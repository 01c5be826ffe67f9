//! Listener for observing a thumbnail run.
//!
//! Events are emitted from rayon workers while columns are analyzed, so listeners
//! take `&self` and must be `Sync`.

use super::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The pipeline just reached `Stage`.
    StageCompleted(Stage),

    /// One more window finished analysis. Completion order, not column order.
    ColumnAnalyzed { done: usize, total: usize },

    /// The run failed; `last` is the last stage it completed.
    Failed { last: Stage },
}

pub trait PipelineListener: Sync {
    fn on_event(&self, event: PipelineEvent);
}

/// No-op listener.
pub struct NoOpListener;

impl PipelineListener for NoOpListener {
    #[inline(always)]
    fn on_event(&self, _event: PipelineEvent) {}
}
