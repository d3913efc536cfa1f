use std::collections::BTreeMap;
use std::fmt;


use crate::candidates::{CandidateStore, StoreChange};
use crate::event::{Outcome, StreamEvent, StreamKind};
use crate::ideas::Idea;
use crate::view_model::{
    AppViewModel, BreakdownViewModel, CandidateRow, IdeasViewModel, StreamViewModel,
};

pub type RequestId = u64;

pub(crate) const STOPPED_STATUS: &str = "Stopped without result";
pub(crate) const CANCELLED_STATUS: &str = "Cancelled";
pub(crate) const ERROR_EVENT_STATUS: &str = "Error occurred";

/// Lifecycle of one streaming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Streaming,
    /// A `result` event arrived.
    Completed,
    /// An `error` event arrived, or the request itself failed.
    Failed,
    /// The transport closed without a terminal event.
    Stopped,
    Cancelled,
}

impl RequestPhase {
    pub fn is_busy(self) -> bool {
        self == RequestPhase::Streaming
    }

    pub fn is_settled(self) -> bool {
        !matches!(self, RequestPhase::Idle | RequestPhase::Streaming)
    }
}

/// Lifecycle of a non-streaming load (ideas list, breakdown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Request-level failures reported by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// Connection failure, dropped stream or unexpected HTTP status.
    Transport(String),
    /// The server answered with an error body.
    Server(String),
    Timeout,
    Cancelled,
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFailure::Transport(message) => write!(f, "{message}"),
            RequestFailure::Server(detail) => write!(f, "{detail}"),
            RequestFailure::Timeout => write!(f, "request timed out"),
            RequestFailure::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl StreamKind {
    pub(crate) fn starting_status(self) -> &'static str {
        match self {
            StreamKind::IdeaGeneration => "Starting idea generation...",
            StreamKind::SimilarityCheck => "Starting similarity check...",
        }
    }

    pub(crate) fn success_status(self) -> &'static str {
        match self {
            StreamKind::IdeaGeneration => "Ideas generated successfully!",
            StreamKind::SimilarityCheck => "Analysis complete!",
        }
    }

    pub(crate) fn failure_status(self) -> &'static str {
        match self {
            StreamKind::IdeaGeneration => "Failed to generate ideas",
            StreamKind::SimilarityCheck => "Failed to check similarity",
        }
    }
}

/// View state of one streaming flow. Rebuilt from scratch for every request.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamState {
    kind: StreamKind,
    request_id: Option<RequestId>,
    target_url: Option<String>,
    phase: RequestPhase,
    status: String,
    progress: Vec<String>,
    source_counts: BTreeMap<String, u32>,
    analysis: Option<(u32, u32)>,
    candidates: CandidateStore,
    outcome: Option<Outcome>,
    error: Option<String>,
    input_error: Option<String>,
    rejected_frames: usize,
}

impl StreamState {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            request_id: None,
            target_url: None,
            phase: RequestPhase::Idle,
            status: String::new(),
            progress: Vec::new(),
            source_counts: BTreeMap::new(),
            analysis: None,
            candidates: CandidateStore::new(),
            outcome: None,
            error: None,
            input_error: None,
            rejected_frames: 0,
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }

    pub fn candidates(&self) -> &CandidateStore {
        &self.candidates
    }

    pub fn source_count(&self, source: &str) -> u32 {
        self.source_counts.get(source).copied().unwrap_or(0)
    }

    /// The request still streaming in this view, if any.
    pub(crate) fn active_request(&self) -> Option<RequestId> {
        self.request_id.filter(|_| self.phase.is_busy())
    }

    pub(crate) fn owns(&self, request_id: RequestId) -> bool {
        self.request_id == Some(request_id)
    }

    pub(crate) fn begin(&mut self, request_id: RequestId, target_url: String) {
        *self = Self::new(self.kind);
        self.request_id = Some(request_id);
        self.target_url = Some(target_url);
        self.phase = RequestPhase::Streaming;
        self.status = self.kind.starting_status().to_string();
    }

    pub(crate) fn reject_input(&mut self, message: String) {
        self.input_error = Some(message);
    }

    /// Applies one decoded event. Returns whether the view changed.
    pub(crate) fn apply_event(&mut self, event: StreamEvent) -> bool {
        if !self.phase.is_busy() {
            return false;
        }

        match event {
            StreamEvent::Status(status) => self.status = status,
            StreamEvent::Progress(line) => self.progress.push(line),
            StreamEvent::SourceProgress { source, count } => {
                self.source_counts.insert(source, count);
            }
            StreamEvent::AnalysisProgress { done, total } => self.analysis = Some((done, total)),
            StreamEvent::ProjectFound(candidate) => {
                if self.candidates.insert_found(candidate) == StoreChange::Ignored {
                    return false;
                }
            }
            StreamEvent::ProjectScored(candidate) => {
                self.candidates.apply_update(candidate);
            }
            StreamEvent::Completed(outcome) => {
                self.outcome = Some(outcome);
                self.status = self.kind.success_status().to_string();
                self.phase = RequestPhase::Completed;
            }
            StreamEvent::Failed(message) => {
                self.error = Some(message);
                self.status = ERROR_EVENT_STATUS.to_string();
                self.phase = RequestPhase::Failed;
            }
        }
        true
    }

    pub(crate) fn record_rejected_frame(&mut self) -> bool {
        if !self.phase.is_busy() {
            return false;
        }
        self.rejected_frames += 1;
        true
    }

    /// Transport reached end-of-data.
    pub(crate) fn finish_stream(&mut self) -> bool {
        if !self.phase.is_busy() {
            return false;
        }
        self.phase = RequestPhase::Stopped;
        self.status = STOPPED_STATUS.to_string();
        true
    }

    /// Request-level failure; a terminal event already received wins.
    pub(crate) fn fail_request(&mut self, failure: &RequestFailure) -> bool {
        if !self.phase.is_busy() {
            return false;
        }
        self.phase = RequestPhase::Failed;
        self.error = Some(failure.to_string());
        self.status = self.kind.failure_status().to_string();
        true
    }

    /// Returns the request id that must be released, if one was streaming.
    pub(crate) fn cancel(&mut self) -> Option<RequestId> {
        let active = self.active_request()?;
        self.phase = RequestPhase::Cancelled;
        self.status = CANCELLED_STATUS.to_string();
        Some(active)
    }

    fn view(&self) -> StreamViewModel {
        StreamViewModel {
            kind: self.kind,
            phase: self.phase,
            target_url: self.target_url.clone(),
            status: self.status.clone(),
            progress: self.progress.clone(),
            source_counts: self
                .source_counts
                .iter()
                .map(|(source, count)| (source.clone(), *count))
                .collect(),
            analysis: self.analysis,
            candidates: self
                .candidates
                .ranked()
                .into_iter()
                .map(CandidateRow::from_candidate)
                .collect(),
            outcome: self.outcome.clone(),
            error: self.error.clone(),
            input_error: self.input_error.clone(),
            rejected_frames: self.rejected_frames,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdeasState {
    request_id: Option<RequestId>,
    ideas_file: Option<String>,
    phase: LoadPhase,
    ideas: Vec<Idea>,
    error: Option<String>,
}

impl IdeasState {
    pub(crate) fn active_request(&self) -> Option<RequestId> {
        self.request_id.filter(|_| self.phase == LoadPhase::Loading)
    }

    pub(crate) fn begin(&mut self, request_id: RequestId, ideas_file: String) {
        *self = Self {
            request_id: Some(request_id),
            ideas_file: Some(ideas_file),
            phase: LoadPhase::Loading,
            ..Self::default()
        };
    }

    pub(crate) fn reject_input(&mut self, message: &str) {
        self.phase = LoadPhase::Failed;
        self.error = Some(message.to_string());
    }

    pub(crate) fn owns_loading(&self, request_id: RequestId) -> bool {
        self.request_id == Some(request_id) && self.phase == LoadPhase::Loading
    }

    pub(crate) fn loaded(&mut self, ideas: Vec<Idea>) {
        self.ideas = ideas;
        self.phase = LoadPhase::Ready;
    }

    pub(crate) fn failed(&mut self, failure: &RequestFailure) {
        self.phase = LoadPhase::Failed;
        self.error = Some(format!("Failed to load ideas: {failure}"));
    }

    pub(crate) fn find(&self, number: u32) -> Option<&Idea> {
        if self.phase != LoadPhase::Ready {
            return None;
        }
        self.ideas.iter().find(|idea| idea.number == number)
    }

    pub(crate) fn ideas_file(&self) -> Option<&str> {
        self.ideas_file.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BreakdownState {
    request_id: Option<RequestId>,
    idea: Option<Idea>,
    phase: LoadPhase,
    markdown: Option<String>,
    error: Option<String>,
}

impl BreakdownState {
    pub(crate) fn active_request(&self) -> Option<RequestId> {
        self.request_id.filter(|_| self.phase == LoadPhase::Loading)
    }

    pub(crate) fn begin(&mut self, request_id: RequestId, idea: Idea) {
        *self = Self {
            request_id: Some(request_id),
            idea: Some(idea),
            phase: LoadPhase::Loading,
            ..Self::default()
        };
    }

    pub(crate) fn reject_selection(&mut self, message: String) {
        self.phase = LoadPhase::Failed;
        self.error = Some(message);
    }

    pub(crate) fn owns_loading(&self, request_id: RequestId) -> bool {
        self.request_id == Some(request_id) && self.phase == LoadPhase::Loading
    }

    pub(crate) fn loaded(&mut self, markdown: String) {
        self.markdown = Some(markdown);
        self.phase = LoadPhase::Ready;
    }

    pub(crate) fn failed(&mut self, failure: &RequestFailure) {
        let message = match failure {
            RequestFailure::Timeout => "The request took too long. Please try again.".to_string(),
            other => format!("Failed to generate implementation guide: {other}"),
        };
        self.phase = LoadPhase::Failed;
        self.error = Some(message);
    }
}

/// Whole client state: one state per view, owned by the dispatch loop.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    next_request_id: RequestId,
    generation: StreamState,
    similarity: StreamState,
    ideas: IdeasState,
    breakdown: BreakdownState,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            next_request_id: 1,
            generation: StreamState::new(StreamKind::IdeaGeneration),
            similarity: StreamState::new(StreamKind::SimilarityCheck),
            ideas: IdeasState::default(),
            breakdown: BreakdownState::default(),
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            generation: self.generation.view(),
            similarity: self.similarity.view(),
            ideas: IdeasViewModel {
                phase: self.ideas.phase,
                ideas_file: self.ideas.ideas_file.clone(),
                ideas: self.ideas.ideas.clone(),
                error: self.ideas.error.clone(),
            },
            breakdown: BreakdownViewModel {
                phase: self.breakdown.phase,
                idea: self.breakdown.idea.clone(),
                markdown: self.breakdown.markdown.clone(),
                error: self.breakdown.error.clone(),
            },
            dirty: self.dirty,
        }
    }

    pub fn stream(&self, kind: StreamKind) -> &StreamState {
        match kind {
            StreamKind::IdeaGeneration => &self.generation,
            StreamKind::SimilarityCheck => &self.similarity,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn allocate_request_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub(crate) fn stream_mut(&mut self, kind: StreamKind) -> &mut StreamState {
        match kind {
            StreamKind::IdeaGeneration => &mut self.generation,
            StreamKind::SimilarityCheck => &mut self.similarity,
        }
    }

    pub(crate) fn stream_for_request_mut(&mut self, request_id: RequestId) -> Option<&mut StreamState> {
        if self.generation.owns(request_id) {
            Some(&mut self.generation)
        } else if self.similarity.owns(request_id) {
            Some(&mut self.similarity)
        } else {
            None
        }
    }

    pub(crate) fn ideas_mut(&mut self) -> &mut IdeasState {
        &mut self.ideas
    }

    pub(crate) fn ideas(&self) -> &IdeasState {
        &self.ideas
    }

    pub(crate) fn breakdown_mut(&mut self) -> &mut BreakdownState {
        &mut self.breakdown
    }
}
