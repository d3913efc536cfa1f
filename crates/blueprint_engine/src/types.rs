use std::fmt;

use blueprint_core::{Idea, RequestId, StreamEvent};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// One decoded event of a streaming request.
    Stream {
        request_id: RequestId,
        event: StreamEvent,
    },
    /// A frame of a streaming request was skipped.
    FrameRejected {
        request_id: RequestId,
        reason: String,
    },
    StreamCompleted {
        request_id: RequestId,
        result: Result<StreamSummary, RequestError>,
    },
    IdeasCompleted {
        request_id: RequestId,
        result: Result<Vec<Idea>, RequestError>,
    },
    BreakdownCompleted {
        request_id: RequestId,
        result: Result<String, RequestError>,
    },
}

/// Counters for a stream that reached end-of-data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSummary {
    pub bytes: u64,
    pub frames: usize,
    pub rejected_frames: usize,
    pub saw_terminal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RequestError {
    pub kind: FailureKind,
    pub message: String,
}

impl RequestError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    /// The server rejected the request with a `detail` message.
    Server { status: u16 },
    Timeout,
    FrameTooLarge { max_bytes: usize },
    Decode,
    Cancelled,
    Network,
    /// The background runtime could not be started.
    Runtime,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Server { status } => write!(f, "server error {status}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::FrameTooLarge { max_bytes } => {
                write!(f, "frame larger than {max_bytes} bytes")
            }
            FailureKind::Decode => write!(f, "invalid response body"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Runtime => write!(f, "engine runtime unavailable"),
        }
    }
}
