use std::collections::HashMap;
use std::future::Future;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use blueprint_core::{Idea, RequestId, StreamKind};
use engine_logging::{engine_error, engine_info, engine_warn};
use tokio_util::sync::CancellationToken;

use crate::client::{cancelled, ApiClient, ChannelEventSink, ClientSettings, ReqwestApiClient};
use crate::{EngineEvent, FailureKind, RequestError};

enum EngineCommand {
    OpenStream {
        request_id: RequestId,
        kind: StreamKind,
        target_url: String,
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
    Cancel {
        request_id: RequestId,
    },
}

impl EngineCommand {
    fn request_id(&self) -> RequestId {
        match self {
            EngineCommand::OpenStream { request_id, .. }
            | EngineCommand::FetchIdeas { request_id, .. }
            | EngineCommand::RequestBreakdown { request_id, .. }
            | EngineCommand::Cancel { request_id } => *request_id,
        }
    }
}

type TokenMap = Arc<Mutex<HashMap<RequestId, CancellationToken>>>;

/// Runs requests on a background tokio runtime and hands their events back
/// over a channel. Dropping every handle shuts the runtime down.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, RequestError> {
        let client = ReqwestApiClient::new(settings)?;
        Self::with_client(Arc::new(client))
    }

    pub fn with_client(client: Arc<dyn ApiClient>) -> Result<Self, RequestError> {
        let runtime = tokio::runtime::Runtime::new().map_err(|err| {
            engine_error!("Failed to start engine runtime: {}", err);
            RequestError::new(FailureKind::Runtime, err.to_string())
        })?;
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let tokens: TokenMap = Arc::default();

            while let Ok(command) = cmd_rx.recv() {
                let request_id = command.request_id();
                if let EngineCommand::Cancel { .. } = command {
                    let token = tokens.lock().ok().and_then(|mut map| map.remove(&request_id));
                    if let Some(token) = token {
                        engine_info!("Cancelling request {}", request_id);
                        token.cancel();
                    }
                    continue;
                }

                let token = CancellationToken::new();
                if let Ok(mut map) = tokens.lock() {
                    map.insert(request_id, token.clone());
                }
                let client = client.clone();
                let event_tx = event_tx.clone();
                let tokens = tokens.clone();
                runtime.spawn(async move {
                    run_command(client.as_ref(), command, &token, event_tx).await;
                    if let Ok(mut map) = tokens.lock() {
                        map.remove(&request_id);
                    }
                });
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn open_stream(
        &self,
        request_id: RequestId,
        kind: StreamKind,
        target_url: impl Into<String>,
    ) {
        self.send(EngineCommand::OpenStream {
            request_id,
            kind,
            target_url: target_url.into(),
        });
    }

    pub fn fetch_ideas(&self, request_id: RequestId, ideas_file: impl Into<String>) {
        self.send(EngineCommand::FetchIdeas {
            request_id,
            ideas_file: ideas_file.into(),
        });
    }

    pub fn request_breakdown(
        &self,
        request_id: RequestId,
        idea: Idea,
        hackathon_folder: impl Into<String>,
    ) {
        self.send(EngineCommand::RequestBreakdown {
            request_id,
            idea,
            hackathon_folder: hackathon_folder.into(),
        });
    }

    /// Stops a running request. Unknown or finished ids are ignored.
    pub fn cancel(&self, request_id: RequestId) {
        self.send(EngineCommand::Cancel { request_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("Engine runtime is gone; command dropped");
        }
    }
}

async fn run_command(
    client: &dyn ApiClient,
    command: EngineCommand,
    cancel: &CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::OpenStream {
            request_id,
            kind,
            target_url,
        } => {
            engine_info!("Request {} streaming {}", request_id, target_url);
            let sink = ChannelEventSink::new(event_tx.clone());
            let result = client
                .stream(request_id, kind, &target_url, &sink, cancel)
                .await;
            match &result {
                Ok(summary) => engine_info!(
                    "Request {} stream closed after {} bytes, {} frames ({} rejected)",
                    request_id,
                    summary.bytes,
                    summary.frames,
                    summary.rejected_frames
                ),
                Err(err) => engine_warn!("Request {} stream failed: {}", request_id, err),
            }
            let _ = event_tx.send(EngineEvent::StreamCompleted { request_id, result });
        }
        EngineCommand::FetchIdeas {
            request_id,
            ideas_file,
        } => {
            engine_info!("Request {} loading ideas from {}", request_id, ideas_file);
            let result = until_cancelled(cancel, client.fetch_ideas(&ideas_file)).await;
            if let Err(err) = &result {
                engine_warn!("Request {} ideas failed: {}", request_id, err);
            }
            let _ = event_tx.send(EngineEvent::IdeasCompleted { request_id, result });
        }
        EngineCommand::RequestBreakdown {
            request_id,
            idea,
            hackathon_folder,
        } => {
            engine_info!("Request {} breaking down idea {}", request_id, idea.number);
            let result =
                until_cancelled(cancel, client.request_breakdown(&idea, &hackathon_folder)).await;
            if let Err(err) = &result {
                engine_warn!("Request {} breakdown failed: {}", request_id, err);
            }
            let _ = event_tx.send(EngineEvent::BreakdownCompleted { request_id, result });
        }
        EngineCommand::Cancel { .. } => {}
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    request: impl Future<Output = Result<T, RequestError>>,
) -> Result<T, RequestError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancelled()),
        result = request => result,
    }
}
