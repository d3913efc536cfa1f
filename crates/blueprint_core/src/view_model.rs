use crate::candidates::{Candidate, SimilarityBand};
use crate::event::{Outcome, StreamKind};
use crate::ideas::Idea;
use crate::state::{LoadPhase, RequestPhase};

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub generation: StreamViewModel,
    pub similarity: StreamViewModel,
    pub ideas: IdeasViewModel,
    pub breakdown: BreakdownViewModel,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn stream(&self, kind: StreamKind) -> &StreamViewModel {
        match kind {
            StreamKind::IdeaGeneration => &self.generation,
            StreamKind::SimilarityCheck => &self.similarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamViewModel {
    pub kind: StreamKind,
    pub phase: RequestPhase,
    pub target_url: Option<String>,
    pub status: String,
    pub progress: Vec<String>,
    /// Source name (lower-case) and its latest count, sorted by name.
    pub source_counts: Vec<(String, u32)>,
    pub analysis: Option<(u32, u32)>,
    /// Ranked for display: highest similarity first, unscored last.
    pub candidates: Vec<CandidateRow>,
    pub outcome: Option<Outcome>,
    pub error: Option<String>,
    pub input_error: Option<String>,
    pub rejected_frames: usize,
}

impl StreamViewModel {
    pub fn source_count(&self, source: &str) -> u32 {
        self.source_counts
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn latest_progress(&self) -> Option<&str> {
        self.progress.last().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    pub candidate: Candidate,
    pub band: Option<SimilarityBand>,
}

impl CandidateRow {
    pub(crate) fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            band: candidate.ai_similarity.map(SimilarityBand::from_score),
            candidate: candidate.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeasViewModel {
    pub phase: LoadPhase,
    pub ideas_file: Option<String>,
    pub ideas: Vec<Idea>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownViewModel {
    pub phase: LoadPhase,
    pub idea: Option<Idea>,
    pub markdown: Option<String>,
    pub error: Option<String>,
}
