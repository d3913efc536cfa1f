use std::sync::mpsc;
use std::time::Duration;

use blueprint_core::{decode_frame, FrameDecoder, Idea, RequestId, StreamKind};
use bytes::Bytes;
use engine_logging::{engine_debug, engine_warn};
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{EngineEvent, FailureKind, HealthStatus, RequestError, StreamSummary};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to idea loads and health checks.
    pub request_timeout: Duration,
    pub breakdown_timeout: Duration,
    /// Overall deadline for a streaming request. `None` lets a stream run
    /// for as long as the server keeps it open.
    pub stream_timeout: Option<Duration>,
    /// Upper bound on a single undelimited line in the stream buffer.
    pub max_frame_bytes: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            breakdown_timeout: Duration::from_secs(120),
            stream_timeout: None,
            max_frame_bytes: 1024 * 1024,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// The Blueprint backend as seen by the engine.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    /// Opens a streaming request and forwards every decoded event to `sink`
    /// until the server closes the stream, `cancel` fires or the deadline
    /// elapses.
    async fn stream(
        &self,
        request_id: RequestId,
        kind: StreamKind,
        target_url: &str,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<StreamSummary, RequestError>;

    async fn fetch_ideas(&self, ideas_file: &str) -> Result<Vec<Idea>, RequestError>;

    async fn request_breakdown(
        &self,
        idea: &Idea,
        hackathon_folder: &str,
    ) -> Result<String, RequestError>;

    async fn health(&self) -> Result<HealthStatus, RequestError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    hackathon_url: &'a str,
}

#[derive(Serialize)]
struct SimilarityRequest<'a> {
    devpost_url: &'a str,
}

#[derive(Serialize)]
struct BreakdownRequest<'a> {
    idea: &'a Idea,
    hackathon_folder: &'a str,
}

#[derive(Deserialize)]
struct IdeasResponse {
    ideas: Vec<Idea>,
}

#[derive(Deserialize)]
struct BreakdownResponse {
    breakdown: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ReqwestApiClient {
    settings: ClientSettings,
    base_url: Url,
    http: reqwest::Client,
}

impl ReqwestApiClient {
    pub fn new(settings: ClientSettings) -> Result<Self, RequestError> {
        let base_url = Url::parse(settings.base_url.trim())
            .map_err(|err| RequestError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(RequestError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as an API base"),
            ));
        }

        // No client-wide timeout: streams are bounded by `stream_timeout`
        // and the other calls set their own.
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| RequestError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base_url,
            http,
        })
    }

    /// Appends path segments to the base url. Segments are percent-encoded,
    /// so a `/` inside one stays part of that segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, RequestError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RequestError::new(FailureKind::InvalidUrl, "base url has no path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn open_stream(
        &self,
        kind: StreamKind,
        target_url: &str,
    ) -> Result<reqwest::Response, RequestError> {
        let request = match kind {
            StreamKind::IdeaGeneration => self.http.post(self.endpoint(&["generate"])?).json(
                &GenerateRequest {
                    hackathon_url: target_url,
                },
            ),
            StreamKind::SimilarityCheck => self
                .http
                .post(self.endpoint(&["similarity-check"])?)
                .json(&SimilarityRequest {
                    devpost_url: target_url,
                }),
        };
        let response = request
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await
    }
}

#[async_trait::async_trait]
impl ApiClient for ReqwestApiClient {
    async fn stream(
        &self,
        request_id: RequestId,
        kind: StreamKind,
        target_url: &str,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<StreamSummary, RequestError> {
        let deadline = self.settings.stream_timeout.map(|t| Instant::now() + t);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            _ = wait_for(deadline) => return Err(stream_deadline()),
            response = self.open_stream(kind, target_url) => response?,
        };
        engine_debug!("Request {} connected to stream", request_id);

        let max_frame_bytes = self.settings.max_frame_bytes;
        let mut decoder = FrameDecoder::new();
        let mut summary = StreamSummary::default();
        let mut body = response.bytes_stream();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = wait_for(deadline) => return Err(stream_deadline()),
                next = body.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk: Bytes = chunk.map_err(map_reqwest_error)?;
            summary.bytes += chunk.len() as u64;

            for payload in decoder.push(&chunk) {
                dispatch_frame(request_id, kind, &payload, sink, &mut summary);
            }
            if decoder.pending_len() > max_frame_bytes {
                return Err(RequestError::new(
                    FailureKind::FrameTooLarge {
                        max_bytes: max_frame_bytes,
                    },
                    "stream line exceeds limit",
                ));
            }
        }

        if let Some(payload) = decoder.finish() {
            dispatch_frame(request_id, kind, &payload, sink, &mut summary);
        }
        Ok(summary)
    }

    async fn fetch_ideas(&self, ideas_file: &str) -> Result<Vec<Idea>, RequestError> {
        let url = self.endpoint(&["ideas", ideas_file])?;
        let response = self
            .http
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: IdeasResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(map_reqwest_error)?;
        Ok(body.ideas)
    }

    async fn request_breakdown(
        &self,
        idea: &Idea,
        hackathon_folder: &str,
    ) -> Result<String, RequestError> {
        let response = self
            .http
            .post(self.endpoint(&["breakdown"])?)
            .timeout(self.settings.breakdown_timeout)
            .json(&BreakdownRequest {
                idea,
                hackathon_folder,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: BreakdownResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(map_reqwest_error)?;
        Ok(body.breakdown)
    }

    async fn health(&self) -> Result<HealthStatus, RequestError> {
        let response = self
            .http
            .get(self.endpoint(&["health"])?)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response)
            .await?
            .json()
            .await
            .map_err(map_reqwest_error)
    }
}

fn dispatch_frame(
    request_id: RequestId,
    kind: StreamKind,
    payload: &str,
    sink: &dyn EventSink,
    summary: &mut StreamSummary,
) {
    summary.frames += 1;
    match decode_frame(kind, payload) {
        Ok(events) => {
            for event in events {
                summary.saw_terminal |= event.is_terminal();
                sink.emit(EngineEvent::Stream { request_id, event });
            }
        }
        Err(err) => {
            summary.rejected_frames += 1;
            engine_warn!("Request {} skipped frame: {}", request_id, err);
            sink.emit(EngineEvent::FrameRejected {
                request_id,
                reason: err.to_string(),
            });
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Turns a non-success response into an error, preferring the server's
/// `detail` message when the body carries one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RequestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail)
        .map(|detail| match detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        });
    Err(match detail {
        Some(detail) => RequestError::new(
            FailureKind::Server {
                status: status.as_u16(),
            },
            detail,
        ),
        None => RequestError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string()),
    })
}

pub(crate) fn cancelled() -> RequestError {
    RequestError::new(FailureKind::Cancelled, "request cancelled")
}

fn stream_deadline() -> RequestError {
    RequestError::new(FailureKind::Timeout, "stream deadline elapsed")
}

fn map_reqwest_error(err: reqwest::Error) -> RequestError {
    if err.is_timeout() {
        return RequestError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return RequestError::new(FailureKind::Decode, err.to_string());
    }
    RequestError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ReqwestApiClient {
        ReqwestApiClient::new(ClientSettings {
            base_url: base.to_string(),
            ..ClientSettings::default()
        })
        .expect("client")
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let client = client("http://localhost:8000/api/");
        let url = client.endpoint(&["generate"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/generate");
    }

    #[test]
    fn ideas_file_stays_one_segment() {
        let client = client("http://localhost:8000");
        let url = client.endpoint(&["ideas", "cal hacks/ideas.txt"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/ideas/cal%20hacks%2Fideas.txt"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        let err = ReqwestApiClient::new(ClientSettings {
            base_url: "mailto:someone@example.com".to_string(),
            ..ClientSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
