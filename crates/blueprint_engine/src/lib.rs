//! Blueprint engine: API client, stream consumption and result export.
mod client;
mod engine;
mod export;
mod filename;
mod types;

pub use client::{
    ApiClient, ChannelEventSink, ClientSettings, EventSink, ReqwestApiClient, DEFAULT_API_URL,
};
pub use engine::EngineHandle;
pub use export::{
    ensure_output_dir, export_breakdown, export_similarity_report, AtomicFileWriter, ExportError,
    PersistError,
};
pub use filename::export_filename;
pub use types::{EngineEvent, FailureKind, HealthStatus, RequestError, StreamSummary};
