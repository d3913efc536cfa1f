use crate::{Idea, RequestFailure, RequestId, StreamEvent, StreamKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted a hackathon URL for idea generation.
    GenerateSubmitted(String),
    /// User submitted a Devpost project URL for a similarity check.
    SimilaritySubmitted(String),
    /// User abandoned the streaming request of a view.
    CancelClicked(StreamKind),
    /// One decoded event from a streaming request.
    Event {
        request_id: RequestId,
        event: StreamEvent,
    },
    /// A frame could not be decoded and was skipped.
    FrameRejected {
        request_id: RequestId,
        reason: String,
    },
    /// The transport reported end-of-data.
    StreamEnded { request_id: RequestId },
    /// The request failed before or during transfer.
    RequestFailed {
        request_id: RequestId,
        failure: RequestFailure,
    },
    /// Load the ideas list stored under an ideas file id.
    IdeasRequested(String),
    IdeasLoaded {
        request_id: RequestId,
        ideas: Vec<Idea>,
    },
    /// User picked an idea (by number) for a detailed breakdown.
    IdeaSelected(u32),
    BreakdownLoaded {
        request_id: RequestId,
        markdown: String,
    },
    /// Periodic tick from the dispatch loop.
    Tick,
}
