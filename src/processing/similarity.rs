//! Cosine similarity and calibration of raw similarities onto a 0-100 scale

use crate::config::{CalibrationAnchors, CalibrationMode, ScoringConfig};
use crate::error::{AnalyzerError, Result};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

const COSINE_EPSILON: f32 = 1e-8;

/// `dot / (|a| * |b| + 1e-8)`; zero vectors score 0.
pub fn cosine_similarity(a: ArrayView1<f32>, b: ArrayView1<f32>) -> Result<f32> {
    if a.len() != b.len() {
        return Err(AnalyzerError::DimensionMismatch {
            context: "cosine similarity".to_string(),
            expected: a.len(),
            found: b.len(),
        });
    }

    let dot = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    Ok(dot / (norm_a * norm_b + COSINE_EPSILON))
}

pub(crate) fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibrator {
    mode: CalibrationMode,
    anchors: CalibrationAnchors,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(CalibrationMode::Anchored, CalibrationAnchors::default())
    }
}

impl Calibrator {
    pub fn new(mode: CalibrationMode, anchors: CalibrationAnchors) -> Self {
        Self { mode, anchors }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.calibration, config.anchors)
    }

    pub fn mode(&self) -> CalibrationMode {
        self.mode
    }

    /// Map a raw similarity onto [0, 100], rounded to two decimals.
    pub fn calibrate(&self, similarity: f32) -> f32 {
        let score = match self.mode {
            CalibrationMode::Linear => (similarity + 1.0) / 2.0 * 100.0,
            CalibrationMode::Anchored => self.anchored(similarity),
        };
        round_to(score.clamp(0.0, 100.0), 2)
    }

    fn anchored(&self, s: f32) -> f32 {
        let CalibrationAnchors { low, mid, high } = self.anchors;

        if s <= low {
            if low > 0.0 {
                30.0 * (s / low)
            } else if low == 0.0 {
                30.0
            } else {
                // ramp from -1 up to a negative low anchor
                30.0 * (s + 1.0) / (low + 1.0)
            }
        } else if s <= mid {
            30.0 + (s - low) / (mid - low) * 20.0
        } else if s <= high {
            50.0 + (s - mid) / (high - mid) * 30.0
        } else {
            80.0 + ((s - high) * 100.0).min(20.0)
        }
    }
}

/// Calibrated fit scores for one essay against one job and one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitScoreSet {
    pub job_fit: f32,
    pub company_fit: f32,
    pub job_company_alignment: f32,
    pub raw_job_similarity: f32,
    pub raw_company_similarity: f32,
    pub raw_job_company_similarity: f32,
    pub calibration: CalibrationMode,
    pub essay_vector_available: bool,
}

impl FitScoreSet {
    /// `essay` is `None` for an essay without sentences; essay fits then stay at zero.
    pub fn compute(
        calibrator: &Calibrator,
        essay: Option<ArrayView1<f32>>,
        job: ArrayView1<f32>,
        company: ArrayView1<f32>,
    ) -> Result<Self> {
        let raw_job_company = cosine_similarity(job, company)?;

        let (raw_job, raw_company) = match essay {
            Some(essay) => (
                cosine_similarity(job, essay)?,
                cosine_similarity(company, essay)?,
            ),
            None => (0.0, 0.0),
        };

        let essay_vector_available = essay.is_some();
        let fit = |raw: f32| {
            if essay_vector_available {
                calibrator.calibrate(raw)
            } else {
                0.0
            }
        };

        Ok(Self {
            job_fit: fit(raw_job),
            company_fit: fit(raw_company),
            job_company_alignment: calibrator.calibrate(raw_job_company),
            raw_job_similarity: round_to(raw_job, 4),
            raw_company_similarity: round_to(raw_company, 4),
            raw_job_company_similarity: round_to(raw_job_company, 4),
            calibration: calibrator.mode(),
            essay_vector_available,
        })
    }
}

/// Similarity of each sentence to the job and company vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceSimilarity {
    pub sentence: String,
    pub job_similarity: f32,
    pub company_similarity: f32,
}

pub fn sentence_similarities(
    sentences: &[String],
    embeddings: &crate::processing::embeddings::EmbeddingMatrix,
    job: ArrayView1<f32>,
    company: ArrayView1<f32>,
) -> Result<Vec<SentenceSimilarity>> {
    sentences
        .iter()
        .zip(embeddings.rows())
        .map(|(sentence, vector)| {
            Ok(SentenceSimilarity {
                sentence: sentence.clone(),
                job_similarity: round_to(cosine_similarity(vector, job)?, 4),
                company_similarity: round_to(cosine_similarity(vector, company)?, 4),
            })
        })
        .collect()
}
