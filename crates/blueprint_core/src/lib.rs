//! Blueprint core: stream protocol decoding, pure state machine and view-model helpers.
mod candidates;
mod effect;
mod event;
mod frame;
mod ideas;
mod input;
mod msg;
mod state;
mod update;
mod view_model;

pub use candidates::{Candidate, CandidateStore, SimilarityBand, StoreChange};
pub use effect::Effect;
pub use event::{FraudRisk, GenerationResult, Outcome, SimilarityReport, StreamEvent, StreamKind};
pub use frame::{decode_frame, parse_source_progress, FrameDecoder, FrameError, FRAME_PREFIX};
pub use ideas::{hackathon_folder, Idea};
pub use input::{clean_devpost_url, validate_hackathon_url, InputError};
pub use msg::Msg;
pub use state::{
    AppState, BreakdownState, IdeasState, LoadPhase, RequestFailure, RequestId, RequestPhase,
    StreamState,
};
pub use update::update;
pub use view_model::{
    AppViewModel, BreakdownViewModel, CandidateRow, IdeasViewModel, StreamViewModel,
};
