use crate::ideas::hackathon_folder;
use crate::input::{clean_devpost_url, validate_hackathon_url};
use crate::{AppState, Effect, Msg, RequestFailure, RequestId, StreamKind};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::GenerateSubmitted(raw) => submit_stream(&mut state, StreamKind::IdeaGeneration, &raw),
        Msg::SimilaritySubmitted(raw) => {
            submit_stream(&mut state, StreamKind::SimilarityCheck, &raw)
        }
        Msg::CancelClicked(kind) => match state.stream_mut(kind).cancel() {
            Some(request_id) => {
                state.mark_dirty();
                vec![Effect::CancelRequest { request_id }]
            }
            None => Vec::new(),
        },
        Msg::Event { request_id, event } => {
            let changed = state
                .stream_for_request_mut(request_id)
                .is_some_and(|view| view.apply_event(event));
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FrameRejected { request_id, .. } => {
            let changed = state
                .stream_for_request_mut(request_id)
                .is_some_and(|view| view.record_rejected_frame());
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StreamEnded { request_id } => {
            let changed = state
                .stream_for_request_mut(request_id)
                .is_some_and(|view| view.finish_stream());
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RequestFailed {
            request_id,
            failure,
        } => {
            apply_failure(&mut state, request_id, &failure);
            Vec::new()
        }
        Msg::IdeasRequested(ideas_file) => request_ideas(&mut state, ideas_file),
        Msg::IdeasLoaded { request_id, ideas } => {
            if state.ideas().owns_loading(request_id) {
                state.ideas_mut().loaded(ideas);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::IdeaSelected(number) => select_idea(&mut state, number),
        Msg::BreakdownLoaded {
            request_id,
            markdown,
        } => {
            let breakdown = state.breakdown_mut();
            if breakdown.owns_loading(request_id) {
                breakdown.loaded(markdown);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}

fn submit_stream(state: &mut AppState, kind: StreamKind, raw: &str) -> Vec<Effect> {
    let validated = match kind {
        StreamKind::IdeaGeneration => validate_hackathon_url(raw),
        StreamKind::SimilarityCheck => clean_devpost_url(raw),
    };
    let target_url = match validated {
        Ok(url) => url,
        Err(err) => {
            state.stream_mut(kind).reject_input(err.to_string());
            state.mark_dirty();
            return Vec::new();
        }
    };

    let request_id = state.allocate_request_id();
    let mut effects = Vec::with_capacity(2);
    if let Some(previous) = state.stream(kind).active_request() {
        effects.push(Effect::CancelRequest {
            request_id: previous,
        });
    }
    state.stream_mut(kind).begin(request_id, target_url.clone());
    state.mark_dirty();
    effects.push(Effect::OpenStream {
        request_id,
        kind,
        target_url,
    });
    effects
}

fn request_ideas(state: &mut AppState, ideas_file: String) -> Vec<Effect> {
    let ideas_file = ideas_file.trim().to_string();
    if ideas_file.is_empty() {
        state.ideas_mut().reject_input("No ideas file to load");
        state.mark_dirty();
        return Vec::new();
    }

    let request_id = state.allocate_request_id();
    let mut effects = Vec::with_capacity(2);
    if let Some(previous) = state.ideas().active_request() {
        effects.push(Effect::CancelRequest {
            request_id: previous,
        });
    }
    state.ideas_mut().begin(request_id, ideas_file.clone());
    state.mark_dirty();
    effects.push(Effect::FetchIdeas {
        request_id,
        ideas_file,
    });
    effects
}

fn select_idea(state: &mut AppState, number: u32) -> Vec<Effect> {
    let selected = state.ideas().find(number).cloned().map(|idea| {
        let folder = state.ideas().ideas_file().map(hackathon_folder);
        (idea, folder.unwrap_or_default())
    });
    let Some((idea, hackathon_folder)) = selected else {
        state
            .breakdown_mut()
            .reject_selection(format!("Idea {number} is not available"));
        state.mark_dirty();
        return Vec::new();
    };

    let request_id = state.allocate_request_id();
    let mut effects = Vec::with_capacity(2);
    if let Some(previous) = state.breakdown_mut().active_request() {
        effects.push(Effect::CancelRequest {
            request_id: previous,
        });
    }
    state.breakdown_mut().begin(request_id, idea.clone());
    state.mark_dirty();
    effects.push(Effect::RequestBreakdown {
        request_id,
        idea,
        hackathon_folder,
    });
    effects
}

fn apply_failure(state: &mut AppState, request_id: RequestId, failure: &RequestFailure) {
    let changed = if let Some(view) = state.stream_for_request_mut(request_id) {
        view.fail_request(failure)
    } else if state.ideas().owns_loading(request_id) {
        state.ideas_mut().failed(failure);
        true
    } else if state.breakdown_mut().owns_loading(request_id) {
        state.breakdown_mut().failed(failure);
        true
    } else {
        false
    };
    if changed {
        state.mark_dirty();
    }
}
