//! Nearest canonical action category for each sentence

use crate::error::{AnalyzerError, Result};
use crate::processing::embeddings::{Embedder, EmbeddingMatrix};
use crate::processing::similarity::{cosine_similarity, round_to};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionCategory {
    ActionResolve,
    ActionCollaborate,
    ActionLearn,
    ActionImprove,
    ActionCommunicate,
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 5] = [
        Self::ActionResolve,
        Self::ActionCollaborate,
        Self::ActionLearn,
        Self::ActionImprove,
        Self::ActionCommunicate,
    ];

    pub fn canonical_sentence(&self) -> &'static str {
        match self {
            Self::ActionResolve => "문제를 해결했다.",
            Self::ActionCollaborate => "팀원들과 협업했다.",
            Self::ActionLearn => "새로운 기술을 학습했다.",
            Self::ActionImprove => "성능을 개선했다.",
            Self::ActionCommunicate => "의사소통을 통해 조율했다.",
        }
    }

    pub fn korean_name(&self) -> &'static str {
        match self {
            Self::ActionResolve => "문제 해결",
            Self::ActionCollaborate => "협업",
            Self::ActionLearn => "학습",
            Self::ActionImprove => "개선",
            Self::ActionCommunicate => "소통",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLabel {
    pub sentence: String,
    /// `None` when no category reaches the threshold.
    pub category: Option<ActionCategory>,
    pub similarity: f32,
}

/// Embedded canonical sentences, one row per `ActionCategory::ALL` entry.
pub struct ActionLabeler {
    anchors: EmbeddingMatrix,
    threshold: f32,
}

impl ActionLabeler {
    pub fn build(embedder: &dyn Embedder, threshold: f32) -> Result<Self> {
        let sentences: Vec<String> = ActionCategory::ALL
            .iter()
            .map(|c| c.canonical_sentence().to_string())
            .collect();
        let anchors = embedder.embed(&sentences)?;
        if anchors.len() != ActionCategory::ALL.len() {
            return Err(AnalyzerError::Embedding(format!(
                "Expected {} action anchors, got {}",
                ActionCategory::ALL.len(),
                anchors.len()
            )));
        }
        Ok(Self { anchors, threshold })
    }

    pub fn label(&self, sentences: &[String], embeddings: &EmbeddingMatrix) -> Result<Vec<ActionLabel>> {
        sentences
            .iter()
            .zip(embeddings.rows())
            .map(|(sentence, vector)| {
                let mut best: Option<(ActionCategory, f32)> = None;
                for (category, anchor) in ActionCategory::ALL.iter().zip(self.anchors.rows()) {
                    let sim = cosine_similarity(vector, anchor)?;
                    if best.map_or(true, |(_, best_sim)| sim > best_sim) {
                        best = Some((*category, sim));
                    }
                }

                let (category, similarity) = match best {
                    Some((category, sim)) if sim >= self.threshold => (Some(category), sim),
                    Some((_, sim)) => (None, sim),
                    None => (None, 0.0),
                };
                Ok(ActionLabel {
                    sentence: sentence.clone(),
                    category,
                    similarity: round_to(similarity, 4),
                })
            })
            .collect()
    }
}
