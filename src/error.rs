use std::time::Duration;

use thiserror::Error;

use crate::pipeline::Stage;

/// Every way a thumbnail run can fail. All of them are fatal to the run.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("unreadable stream: {0}")]
    UnreadableStream(String),

    #[error("stream contains no audio frames")]
    EmptyStream,

    #[error("unsupported channel layout ({channels} channels): {reason}")]
    UnsupportedChannelLayout { channels: u16, reason: String },

    #[error("processing budget exceeded during {stage} after {elapsed:?}")]
    Timeout { stage: Stage, elapsed: Duration },

    #[error("failed to write thumbnail: {0}")]
    SinkWriteFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ThumbnailError>;
