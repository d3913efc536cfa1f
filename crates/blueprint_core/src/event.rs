use serde::{Deserialize, Serialize};

use crate::candidates::Candidate;

/// Which streaming endpoint a request talks to.
///
/// Both flows share the frame protocol; they differ in the `result` schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    IdeaGeneration,
    SimilarityCheck,
}

/// A typed event decoded from one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Status(String),
    Progress(String),
    SourceProgress { source: String, count: u32 },
    AnalysisProgress { done: u32, total: u32 },
    ProjectFound(Candidate),
    ProjectScored(Candidate),
    Completed(Outcome),
    Failed(String),
}

impl StreamEvent {
    /// `Completed` and `Failed` end a request for display purposes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Failed(_))
    }
}

/// Final aggregate outcome of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ideas(GenerationResult),
    Similarity(SimilarityReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub ideas_file: String,
    #[serde(default)]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityReport {
    #[serde(default)]
    pub fraud_risk: Option<FraudRisk>,
    #[serde(default)]
    pub originality_score: Option<f64>,
    #[serde(default)]
    pub total_projects: u32,
    #[serde(default)]
    pub submission_date: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FraudRisk {
    High,
    Medium,
    Low,
    Analyzing,
    #[serde(other)]
    Unknown,
}

impl FraudRisk {
    pub fn label(self) -> &'static str {
        match self {
            FraudRisk::High => "HIGH",
            FraudRisk::Medium => "MEDIUM",
            FraudRisk::Low => "LOW",
            FraudRisk::Analyzing => "ANALYZING",
            FraudRisk::Unknown => "UNKNOWN",
        }
    }
}
