use crate::{Idea, RequestId, StreamKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenStream {
        request_id: RequestId,
        kind: StreamKind,
        target_url: String,
    },
    CancelRequest {
        request_id: RequestId,
    },
    FetchIdeas {
        request_id: RequestId,
        ideas_file: String,
    },
    RequestBreakdown {
        request_id: RequestId,
        idea: Idea,
        hackathon_folder: String,
    },
}
