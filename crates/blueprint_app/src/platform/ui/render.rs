use blueprint_core::{
    BreakdownViewModel, Candidate, CandidateRow, IdeasViewModel, Outcome, RequestPhase,
    SimilarityBand, StreamViewModel,
};

/// What has already been printed for one stream, so each render only emits
/// what changed since the previous one.
#[derive(Debug, Default)]
pub struct StreamCursor {
    status: String,
    progress_lines: usize,
    sources: Vec<(String, u32)>,
    analysis: Option<(u32, u32)>,
    candidates: usize,
    rejected_frames: usize,
}

pub fn render_stream_updates(cursor: &mut StreamCursor, view: &StreamViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(input_error) = &view.input_error {
        lines.push(format!("error: {input_error}"));
        return lines;
    }

    if view.status != cursor.status && !view.status.is_empty() {
        lines.push(format!("> {}", view.status));
        cursor.status = view.status.clone();
    }

    if let Some(new_lines) = view.progress.get(cursor.progress_lines..) {
        lines.extend(new_lines.iter().map(|line| format!("  {line}")));
    }
    cursor.progress_lines = view.progress.len();

    if view.source_counts != cursor.sources {
        let summary = view
            .source_counts
            .iter()
            .map(|(source, count)| format!("{} {count}", source_label(source)))
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(format!("  sources: {summary}"));
        cursor.sources = view.source_counts.clone();
    }

    if view.candidates.len() != cursor.candidates {
        lines.push(format!("  candidates found: {}", view.candidates.len()));
        cursor.candidates = view.candidates.len();
    }

    if view.analysis != cursor.analysis {
        if let Some((done, total)) = view.analysis {
            lines.push(format!("  analyzed {done}/{total}"));
        }
        cursor.analysis = view.analysis;
    }

    if view.rejected_frames > cursor.rejected_frames {
        lines.push(format!(
            "  skipped {} malformed frame(s)",
            view.rejected_frames - cursor.rejected_frames
        ));
        cursor.rejected_frames = view.rejected_frames;
    }

    lines
}

/// Final block printed once a stream settles.
pub fn render_stream_summary(view: &StreamViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    match view.phase {
        RequestPhase::Failed => {
            lines.push(format!(
                "{}: {}",
                view.status,
                view.error.as_deref().unwrap_or("unknown error")
            ));
        }
        RequestPhase::Stopped | RequestPhase::Cancelled => lines.push(view.status.clone()),
        _ => {}
    }

    match &view.outcome {
        Some(Outcome::Ideas(result)) => {
            lines.push(format!("Ideas file: {}", result.ideas_file));
            if let Some(dir) = &result.output_dir {
                lines.push(format!("Output folder: {dir}"));
            }
        }
        Some(Outcome::Similarity(report)) => {
            lines.push(String::new());
            if let Some(name) = &report.project_name {
                lines.push(format!("Project: {name}"));
            }
            let risk = report.fraud_risk.map(|r| r.label()).unwrap_or("UNKNOWN");
            let originality = report
                .originality_score
                .map(|score| format!("{score:.0}"))
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "Fraud risk: {risk} | Originality: {originality} | Projects analyzed: {}",
                report.total_projects
            ));
            if let Some(date) = &report.submission_date {
                lines.push(format!("Submitted: {date}"));
            }
        }
        None => {}
    }

    if !view.candidates.is_empty() {
        lines.push(String::new());
        for (rank, row) in view.candidates.iter().enumerate() {
            lines.extend(render_candidate(rank + 1, row));
        }
    }
    lines
}

fn render_candidate(rank: usize, row: &CandidateRow) -> Vec<String> {
    let candidate = &row.candidate;
    let score = candidate
        .ai_similarity
        .map(|score| format!("{score:>3.0}%"))
        .unwrap_or_else(|| "   -".to_string());
    let band = row.band.map(band_label).unwrap_or("pending");

    let mut lines = vec![format!(
        "{rank:>3}. {score} [{band}] {} ({})",
        candidate.name, candidate.platform
    )];
    let meta = platform_meta(candidate);
    if !meta.is_empty() {
        lines.push(format!("       {}", meta.join(" | ")));
    }
    if let Some(reasoning) = candidate.ai_reasoning.as_deref().filter(|r| !r.is_empty()) {
        lines.push(format!("       {reasoning}"));
    }
    lines.push(format!("       {}", candidate.url));
    lines
}

fn platform_meta(candidate: &Candidate) -> Vec<String> {
    let mut meta = Vec::new();
    if let Some(stars) = candidate.stars {
        meta.push(format!("{stars} stars"));
    }
    if let Some(language) = &candidate.language {
        meta.push(language.clone());
    }
    if let Some(created) = &candidate.created_at {
        meta.push(format!("created {created}"));
    }
    if let Some(likes) = candidate.likes {
        meta.push(format!("{likes} likes"));
    }
    if candidate.is_winner == Some(true) {
        meta.push("winner".to_string());
    }
    if let Some(date) = &candidate.submission_date {
        meta.push(format!("submitted {date}"));
    }
    if let Some(comments) = candidate.comments {
        meta.push(format!("{comments} comments"));
    }
    meta
}

fn band_label(band: SimilarityBand) -> &'static str {
    match band {
        SimilarityBand::Critical => "critical",
        SimilarityBand::High => "high",
        SimilarityBand::Elevated => "elevated",
        SimilarityBand::Low => "low",
    }
}

fn source_label(source: &str) -> &str {
    match source {
        "devpost" => "Devpost",
        "github" => "GitHub",
        other => other,
    }
}

pub fn render_ideas(view: &IdeasViewModel) -> Vec<String> {
    if let Some(error) = &view.error {
        return vec![error.clone()];
    }
    let mut lines = Vec::new();
    if let Some(file) = &view.ideas_file {
        lines.push(format!("Ideas from {file}:"));
    }
    for idea in &view.ideas {
        lines.push(format!("{:>3}. {}", idea.number, idea.title));
        if !idea.technologies.is_empty() {
            lines.push(format!("     tech: {}", idea.technologies.join(", ")));
        }
    }
    if view.ideas.is_empty() {
        lines.push("No ideas in this file.".to_string());
    }
    lines
}

pub fn render_breakdown(view: &BreakdownViewModel) -> Vec<String> {
    if let Some(error) = &view.error {
        return vec![error.clone()];
    }
    let mut lines = Vec::new();
    if let Some(idea) = &view.idea {
        lines.push(format!("# {}", idea.title));
        lines.push(String::new());
    }
    if let Some(markdown) = &view.markdown {
        lines.extend(markdown.lines().map(str::to_string));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::{
        update, AppState, FraudRisk, GenerationResult, LoadPhase, Msg, SimilarityReport,
        StreamEvent, StreamKind,
    };
    use pretty_assertions::assert_eq;

    fn similarity_state() -> AppState {
        let (state, _) = update(
            AppState::new(),
            Msg::SimilaritySubmitted("https://devpost.com/software/demo".into()),
        );
        state
    }

    fn apply(state: AppState, event: StreamEvent) -> AppState {
        update(
            state,
            Msg::Event {
                request_id: 1,
                event,
            },
        )
        .0
    }

    #[test]
    fn updates_only_print_what_changed() {
        let mut cursor = StreamCursor::default();
        let state = similarity_state();
        let first = render_stream_updates(&mut cursor, &state.view().similarity);
        assert_eq!(first, vec!["> Starting similarity check..."]);

        let state = apply(state, StreamEvent::Progress("Loading project".into()));
        let state = apply(
            state,
            StreamEvent::SourceProgress {
                source: "github".into(),
                count: 3,
            },
        );
        let second = render_stream_updates(&mut cursor, &state.view().similarity);
        assert_eq!(second, vec!["  Loading project", "  sources: GitHub 3"]);

        assert!(render_stream_updates(&mut cursor, &state.view().similarity).is_empty());
    }

    #[test]
    fn input_error_is_printed_alone() {
        let (state, _) = update(AppState::new(), Msg::GenerateSubmitted(String::new()));
        let lines = render_stream_updates(&mut StreamCursor::default(), &state.view().generation);
        assert_eq!(lines, vec!["error: Please enter a hackathon URL"]);
    }

    #[test]
    fn summary_lists_ranked_candidates_with_platform_details() {
        let state = similarity_state();
        let state = apply(
            state,
            StreamEvent::ProjectFound(Candidate {
                url: "https://github.com/a/a".into(),
                name: "Repo".into(),
                platform: "GitHub".into(),
                stars: Some(12),
                language: Some("Rust".into()),
                ..Candidate::default()
            }),
        );
        let state = apply(
            state,
            StreamEvent::ProjectScored(Candidate {
                url: "https://devpost.com/software/b".into(),
                name: "Twin".into(),
                platform: "Devpost".into(),
                ai_similarity: Some(92.0),
                ai_reasoning: Some("Same idea".into()),
                likes: Some(7),
                is_winner: Some(true),
                ..Candidate::default()
            }),
        );
        let state = apply(
            state,
            StreamEvent::Completed(Outcome::Similarity(SimilarityReport {
                fraud_risk: Some(FraudRisk::High),
                originality_score: Some(20.0),
                total_projects: 2,
                submission_date: None,
                project_name: Some("Demo".into()),
            })),
        );

        let lines = render_stream_summary(&state.view().similarity);
        assert_eq!(
            lines,
            vec![
                "",
                "Project: Demo",
                "Fraud risk: HIGH | Originality: 20 | Projects analyzed: 2",
                "",
                "  1.  92% [critical] Twin (Devpost)",
                "       7 likes | winner",
                "       Same idea",
                "       https://devpost.com/software/b",
                "  2.    - [pending] Repo (GitHub)",
                "       12 stars | Rust",
                "       https://github.com/a/a",
            ]
        );
    }

    #[test]
    fn generation_summary_names_ideas_file() {
        let (state, _) = update(
            AppState::new(),
            Msg::GenerateSubmitted("https://hack.example.com".into()),
        );
        let state = apply(
            state,
            StreamEvent::Completed(Outcome::Ideas(GenerationResult {
                ideas_file: "hack/ideas.txt".into(),
                output_dir: None,
            })),
        );
        assert_eq!(
            render_stream_summary(state.view().stream(StreamKind::IdeaGeneration)),
            vec!["Ideas file: hack/ideas.txt"]
        );
    }

    #[test]
    fn failed_breakdown_shows_error_only() {
        let view = BreakdownViewModel {
            phase: LoadPhase::Failed,
            idea: None,
            markdown: None,
            error: Some("Idea 4 is not available".into()),
        };
        assert_eq!(render_breakdown(&view), vec!["Idea 4 is not available"]);
    }
}
