//! Line framing and event decoding for the `data: <json>` stream protocol.
use serde::Deserialize;
use thiserror::Error;

use crate::candidates::Candidate;
use crate::event::{Outcome, StreamEvent, StreamKind};

/// Marker that starts every frame carrying an event.
pub const FRAME_PREFIX: &str = "data: ";

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid frame json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid result payload: {0}")]
    Result(serde_json::Error),
    #[error("invalid source progress {0:?}")]
    SourceProgress(String),
    #[error("invalid analysis progress {0:?}")]
    AnalysisProgress(String),
}

/// Splits an arbitrarily chunked byte stream into frame payloads.
///
/// Bytes are buffered until a newline so a frame may span any number of
/// reads and one read may carry several frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the payloads of every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            if let Some(payload) = frame_payload(&self.buffer[start..end]) {
                payloads.push(payload);
            }
            start = end + 1;
            self.scanned = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        payloads
    }

    /// Flushes a trailing frame that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        frame_payload(&rest)
    }

    /// Bytes held back waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

fn frame_payload(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let text = String::from_utf8_lossy(line);
    text.strip_prefix(FRAME_PREFIX).map(ToOwned::to_owned)
}

#[derive(Debug, Default, Deserialize)]
struct WireFrame {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    progress: Option<String>,
    #[serde(default)]
    source_progress: Option<String>,
    #[serde(default)]
    analysis_progress: Option<String>,
    #[serde(default)]
    project: Option<Candidate>,
    #[serde(default)]
    project_update: Option<Candidate>,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Decodes one frame payload into typed events.
///
/// A frame can carry several fields; they are emitted in a fixed order with
/// the terminal events last. The frame is rejected as a whole when any
/// populated field fails validation.
pub fn decode_frame(kind: StreamKind, payload: &str) -> Result<Vec<StreamEvent>, FrameError> {
    let wire: WireFrame = serde_json::from_str(payload)?;
    let mut events = Vec::new();

    if let Some(status) = wire.status.filter(|s| !s.is_empty()) {
        events.push(StreamEvent::Status(status));
    }
    if let Some(progress) = wire.progress.filter(|p| !p.is_empty()) {
        events.push(StreamEvent::Progress(progress));
    }
    if let Some(raw) = wire.source_progress {
        let (source, count) = parse_source_progress(&raw)?;
        events.push(StreamEvent::SourceProgress { source, count });
    }
    if let Some(raw) = wire.analysis_progress {
        let (done, total) = parse_analysis_progress(&raw)?;
        events.push(StreamEvent::AnalysisProgress { done, total });
    }
    if let Some(project) = wire.project {
        events.push(StreamEvent::ProjectFound(project));
    }
    if let Some(project) = wire.project_update {
        events.push(StreamEvent::ProjectScored(project));
    }
    if let Some(result) = wire.result {
        events.push(StreamEvent::Completed(decode_outcome(kind, result)?));
    }
    if let Some(error) = wire.error {
        events.push(StreamEvent::Failed(error));
    }

    Ok(events)
}

fn decode_outcome(kind: StreamKind, value: serde_json::Value) -> Result<Outcome, FrameError> {
    match kind {
        StreamKind::IdeaGeneration => serde_json::from_value(value)
            .map(Outcome::Ideas)
            .map_err(FrameError::Result),
        StreamKind::SimilarityCheck => serde_json::from_value(value)
            .map(Outcome::Similarity)
            .map_err(FrameError::Result),
    }
}

/// Parses `"<source>: <count>"`; the source name is lower-cased.
pub fn parse_source_progress(raw: &str) -> Result<(String, u32), FrameError> {
    let (name, count) = raw
        .split_once(": ")
        .ok_or_else(|| FrameError::SourceProgress(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(FrameError::SourceProgress(raw.to_string()));
    }
    let count = count
        .trim()
        .parse::<u32>()
        .map_err(|_| FrameError::SourceProgress(raw.to_string()))?;
    Ok((name.to_lowercase(), count))
}

fn parse_analysis_progress(raw: &str) -> Result<(u32, u32), FrameError> {
    let invalid = || FrameError::AnalysisProgress(raw.to_string());
    let (done, total) = raw.split_once('/').ok_or_else(invalid)?;
    let done = done.trim().parse::<u32>().map_err(|_| invalid())?;
    let total = total.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok((done, total))
}
