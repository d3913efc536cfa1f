use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A discovered similar or competing project, keyed by `url`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_reasoning: Option<String>,
    // GitHub metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    // Devpost metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_winner: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
}

impl Candidate {
    /// Score used for ranking; unscored candidates rank below any score.
    pub fn rank_score(&self) -> f64 {
        self.ai_similarity.unwrap_or(-1.0)
    }
}

/// Coarse similarity bucket used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityBand {
    Critical,
    High,
    Elevated,
    Low,
}

impl SimilarityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            SimilarityBand::Critical
        } else if score >= 70.0 {
            SimilarityBand::High
        } else if score >= 50.0 {
            SimilarityBand::Elevated
        } else {
            SimilarityBand::Low
        }
    }
}

/// What an insert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Appended,
    Replaced { position: usize },
    Ignored,
}

/// Insertion-ordered candidates with a `url` index.
///
/// The stored order is never changed by ranking; [`CandidateStore::ranked`]
/// computes the display order on every call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandidateStore {
    entries: Vec<Candidate>,
    index: HashMap<String, usize>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly discovered candidate. A `url` that is already known
    /// keeps its existing entry, including any score it carries.
    pub fn insert_found(&mut self, candidate: Candidate) -> StoreChange {
        if self.index.contains_key(&candidate.url) {
            return StoreChange::Ignored;
        }
        self.append(candidate)
    }

    /// Replaces the entry for the candidate's `url` in place, or appends it
    /// when the `url` was never announced.
    pub fn apply_update(&mut self, candidate: Candidate) -> StoreChange {
        match self.index.get(&candidate.url) {
            Some(&position) => {
                self.entries[position] = candidate;
                StoreChange::Replaced { position }
            }
            None => self.append(candidate),
        }
    }

    fn append(&mut self, candidate: Candidate) -> StoreChange {
        self.index.insert(candidate.url.clone(), self.entries.len());
        self.entries.push(candidate);
        StoreChange::Appended
    }

    pub fn get(&self, url: &str) -> Option<&Candidate> {
        self.index.get(url).map(|&position| &self.entries[position])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Candidates in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter()
    }

    pub fn scored_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|c| c.ai_similarity.is_some())
            .count()
    }

    /// Display order: score descending, unscored last, ties in arrival order.
    pub fn ranked(&self) -> Vec<&Candidate> {
        let mut ranked: Vec<&Candidate> = self.entries.iter().collect();
        // `sort_by` is stable, so equal scores keep arrival order.
        ranked.sort_by(|a, b| {
            b.rank_score()
                .partial_cmp(&a.rank_score())
                .unwrap_or(Ordering::Equal)
        });
        ranked
    }
}
