use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use blueprint_core::{Effect, Msg, RequestFailure};
use blueprint_engine::{EngineEvent, EngineHandle, FailureKind, RequestError};
use engine_logging::{engine_debug, engine_info};

/// Executes core effects on the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<Msg>) -> Self {
        let runner = Self { engine };
        runner.spawn_event_loop(msg_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenStream {
                    request_id,
                    kind,
                    target_url,
                } => {
                    engine_info!(
                        "OpenStream request_id={} kind={:?} url={}",
                        request_id,
                        kind,
                        target_url
                    );
                    self.engine.open_stream(request_id, kind, target_url);
                }
                Effect::CancelRequest { request_id } => {
                    self.engine.cancel(request_id);
                }
                Effect::FetchIdeas {
                    request_id,
                    ideas_file,
                } => {
                    self.engine.fetch_ideas(request_id, ideas_file);
                }
                Effect::RequestBreakdown {
                    request_id,
                    idea,
                    hackathon_folder,
                } => {
                    self.engine.request_breakdown(request_id, idea, hackathon_folder);
                }
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.try_recv() {
                if msg_tx.send(event_to_msg(event)).is_err() {
                    engine_debug!("Message loop closed; stopping engine event forwarding");
                    break;
                }
            } else {
                thread::sleep(Duration::from_millis(20));
            }
        });
    }
}

pub(crate) fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Stream { request_id, event } => Msg::Event { request_id, event },
        EngineEvent::FrameRejected { request_id, reason } => {
            Msg::FrameRejected { request_id, reason }
        }
        EngineEvent::StreamCompleted { request_id, result } => match result {
            Ok(_) => Msg::StreamEnded { request_id },
            Err(err) => Msg::RequestFailed {
                request_id,
                failure: map_failure(err),
            },
        },
        EngineEvent::IdeasCompleted { request_id, result } => match result {
            Ok(ideas) => Msg::IdeasLoaded { request_id, ideas },
            Err(err) => Msg::RequestFailed {
                request_id,
                failure: map_failure(err),
            },
        },
        EngineEvent::BreakdownCompleted { request_id, result } => match result {
            Ok(markdown) => Msg::BreakdownLoaded {
                request_id,
                markdown,
            },
            Err(err) => Msg::RequestFailed {
                request_id,
                failure: map_failure(err),
            },
        },
    }
}

fn map_failure(err: RequestError) -> RequestFailure {
    match err.kind {
        FailureKind::Timeout => RequestFailure::Timeout,
        FailureKind::Cancelled => RequestFailure::Cancelled,
        FailureKind::Server { .. } => RequestFailure::Server(err.message),
        _ => RequestFailure::Transport(err.to_string()),
    }
}
