use std::sync::Once;

use blueprint_core::{
    update, AppState, Candidate, Effect, GenerationResult, Msg, Outcome, RequestFailure,
    RequestPhase, StreamEvent, StreamKind,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn start_similarity(state: AppState, url: &str) -> (AppState, u64) {
    let (state, effects) = update(state, Msg::SimilaritySubmitted(url.to_string()));
    let request_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::OpenStream { request_id, .. } => Some(*request_id),
            _ => None,
        })
        .expect("open stream effect");
    (state, request_id)
}

fn event(state: AppState, request_id: u64, event: StreamEvent) -> AppState {
    update(state, Msg::Event { request_id, event }).0
}

fn project(url: &str) -> Candidate {
    Candidate {
        url: url.to_string(),
        name: format!("project {url}"),
        platform: "Devpost".to_string(),
        ..Candidate::default()
    }
}

#[test]
fn generate_submit_opens_stream_with_fresh_state() {
    init_logging();
    let (mut state, effects) = update(
        AppState::new(),
        Msg::GenerateSubmitted(" https://cal-hacks-12-0.devpost.com ".to_string()),
    );

    assert_eq!(
        effects,
        vec![Effect::OpenStream {
            request_id: 1,
            kind: StreamKind::IdeaGeneration,
            target_url: "https://cal-hacks-12-0.devpost.com/".to_string(),
        }]
    );
    let view = state.view();
    assert_eq!(view.generation.phase, RequestPhase::Streaming);
    assert_eq!(view.generation.status, "Starting idea generation...");
    assert!(view.generation.progress.is_empty());
    assert!(state.consume_dirty());
}

#[test]
fn missing_input_issues_no_request() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::SimilaritySubmitted("   ".to_string()));

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.similarity.phase, RequestPhase::Idle);
    assert_eq!(
        view.similarity.input_error.as_deref(),
        Some("Please enter a Devpost URL")
    );
}

#[test]
fn similarity_url_query_is_stripped_before_request() {
    init_logging();
    let (_state, effects) = update(
        AppState::new(),
        Msg::SimilaritySubmitted("https://devpost.com/software/demo?ref_content=x".to_string()),
    );

    assert!(matches!(
        &effects[0],
        Effect::OpenStream { target_url, .. } if target_url == "https://devpost.com/software/demo"
    ));
}

#[test]
fn progress_lines_accumulate_and_status_tracks_latest() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::GenerateSubmitted("https://hack.example.com".to_string()),
    );
    let request_id = match &effects[0] {
        Effect::OpenStream { request_id, .. } => *request_id,
        other => panic!("unexpected effect {other:?}"),
    };

    let state = event(state, request_id, StreamEvent::Status("Initializing...".into()));
    let state = event(state, request_id, StreamEvent::Progress("Setting up".into()));
    let state = event(state, request_id, StreamEvent::Status("Scraping".into()));
    let state = event(state, request_id, StreamEvent::Progress("Found rules".into()));

    let view = state.view().generation;
    assert_eq!(view.status, "Scraping");
    assert_eq!(view.progress, vec!["Setting up", "Found rules"]);
    assert_eq!(view.latest_progress(), Some("Found rules"));
}

#[test]
fn result_event_completes_generation() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::GenerateSubmitted("https://hack.example.com".to_string()),
    );
    let result = GenerationResult {
        ideas_file: "hack/ideas.txt".to_string(),
        output_dir: Some("hack".to_string()),
    };
    let state = event(state, 1, StreamEvent::Completed(Outcome::Ideas(result.clone())));

    let view = state.view().generation;
    assert_eq!(view.phase, RequestPhase::Completed);
    assert_eq!(view.status, "Ideas generated successfully!");
    assert_eq!(view.outcome, Some(Outcome::Ideas(result)));
}

#[test]
fn source_progress_overwrites_previous_count() {
    init_logging();
    let (state, request_id) = start_similarity(AppState::new(), "https://devpost.com/software/x");
    let state = event(
        state,
        request_id,
        StreamEvent::SourceProgress {
            source: "github".into(),
            count: 5,
        },
    );
    let state = event(
        state,
        request_id,
        StreamEvent::SourceProgress {
            source: "github".into(),
            count: 12,
        },
    );

    let view = state.view().similarity;
    assert_eq!(view.source_count("github"), 12);
    assert_eq!(view.source_count("devpost"), 0);
}

#[test]
fn error_event_cannot_be_reverted_by_late_projects() {
    init_logging();
    let (state, request_id) = start_similarity(AppState::new(), "https://devpost.com/software/x");
    let state = event(state, request_id, StreamEvent::ProjectFound(project("a")));
    let mut state = event(state, request_id, StreamEvent::Failed("Invalid link".into()));
    assert!(state.consume_dirty());

    let (mut state, _) = update(
        state,
        Msg::Event {
            request_id,
            event: StreamEvent::ProjectFound(project("b")),
        },
    );
    assert!(!state.consume_dirty());
    let mut scored = project("a");
    scored.ai_similarity = Some(80.0);
    let state = event(state, request_id, StreamEvent::ProjectScored(scored));
    let (state, _) = update(state, Msg::StreamEnded { request_id });

    let view = state.view().similarity;
    assert_eq!(view.phase, RequestPhase::Failed);
    assert_eq!(view.status, "Error occurred");
    assert_eq!(view.error.as_deref(), Some("Invalid link"));
    assert_eq!(view.candidates.len(), 1);
    assert_eq!(view.candidates[0].candidate.ai_similarity, None);
}

#[test]
fn stream_end_without_terminal_event_stops_without_error() {
    init_logging();
    let (state, request_id) = start_similarity(AppState::new(), "https://devpost.com/software/x");
    let state = event(state, request_id, StreamEvent::Status("Searching".into()));
    let (state, _) = update(state, Msg::StreamEnded { request_id });

    let view = state.view().similarity;
    assert_eq!(view.phase, RequestPhase::Stopped);
    assert_eq!(view.status, "Stopped without result");
    assert_eq!(view.error, None);
}

#[test]
fn transport_failure_replaces_status() {
    init_logging();
    let (state, request_id) = start_similarity(AppState::new(), "https://devpost.com/software/x");
    let (state, _) = update(
        state,
        Msg::RequestFailed {
            request_id,
            failure: RequestFailure::Transport("connection refused".into()),
        },
    );

    let view = state.view().similarity;
    assert_eq!(view.phase, RequestPhase::Failed);
    assert_eq!(view.status, "Failed to check similarity");
    assert_eq!(view.error.as_deref(), Some("connection refused"));
}

#[test]
fn transport_failure_after_result_keeps_result() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::GenerateSubmitted("https://hack.example.com".to_string()),
    );
    let state = event(
        state,
        1,
        StreamEvent::Completed(Outcome::Ideas(GenerationResult {
            ideas_file: "hack/ideas.txt".into(),
            output_dir: None,
        })),
    );
    let (state, _) = update(
        state,
        Msg::RequestFailed {
            request_id: 1,
            failure: RequestFailure::Transport("reset".into()),
        },
    );

    assert_eq!(state.view().generation.phase, RequestPhase::Completed);
    assert_eq!(state.view().generation.error, None);
}

#[test]
fn resubmit_while_streaming_cancels_previous_request() {
    init_logging();
    let (state, first) = start_similarity(AppState::new(), "https://devpost.com/software/x");
    let state = event(state, first, StreamEvent::ProjectFound(project("old")));

    let (state, effects) = update(
        state,
        Msg::SimilaritySubmitted("https://devpost.com/software/y".to_string()),
    );
    assert_eq!(effects.len(), 2);
    assert_eq!(effects[0], Effect::CancelRequest { request_id: first });
    let second = match &effects[1] {
        Effect::OpenStream { request_id, .. } => *request_id,
        other => panic!("unexpected effect {other:?}"),
    };
    assert_ne!(first, second);

    let mut state = state;
    assert!(state.consume_dirty());

    // Late events from the superseded request are discarded.
    let (mut state, _) = update(
        state,
        Msg::Event {
            request_id: first,
            event: StreamEvent::ProjectFound(project("late")),
        },
    );
    assert!(!state.consume_dirty());
    assert!(state.view().similarity.candidates.is_empty());
}

#[test]
fn cancel_stops_state_mutation() {
    init_logging();
    let (state, request_id) = start_similarity(AppState::new(), "https://devpost.com/software/x");
    let (state, effects) = update(state, Msg::CancelClicked(StreamKind::SimilarityCheck));
    assert_eq!(effects, vec![Effect::CancelRequest { request_id }]);

    let state = event(state, request_id, StreamEvent::ProjectFound(project("a")));
    let (state, _) = update(
        state,
        Msg::RequestFailed {
            request_id,
            failure: RequestFailure::Cancelled,
        },
    );

    let view = state.view().similarity;
    assert_eq!(view.phase, RequestPhase::Cancelled);
    assert!(view.candidates.is_empty());
    assert_eq!(view.error, None);

    let (_state, effects) = update(state, Msg::CancelClicked(StreamKind::SimilarityCheck));
    assert!(effects.is_empty());
}

#[test]
fn views_do_not_share_state() {
    init_logging();
    let (state, similarity_id) =
        start_similarity(AppState::new(), "https://devpost.com/software/x");
    let (state, effects) = update(
        state,
        Msg::GenerateSubmitted("https://hack.example.com".to_string()),
    );
    assert_eq!(effects.len(), 1);

    let state = event(state, similarity_id, StreamEvent::Status("Searching".into()));
    let view = state.view();
    assert_eq!(view.similarity.status, "Searching");
    assert_eq!(view.generation.status, "Starting idea generation...");
    assert_eq!(view.generation.phase, RequestPhase::Streaming);
}

#[test]
fn rejected_frames_are_counted_but_do_not_stop_stream() {
    init_logging();
    let (state, request_id) = start_similarity(AppState::new(), "https://devpost.com/software/x");
    let (state, _) = update(
        state,
        Msg::FrameRejected {
            request_id,
            reason: "invalid frame json".into(),
        },
    );
    let state = event(state, request_id, StreamEvent::ProjectFound(project("a")));

    let view = state.view().similarity;
    assert_eq!(view.rejected_frames, 1);
    assert_eq!(view.phase, RequestPhase::Streaming);
    assert_eq!(view.candidates.len(), 1);
}
