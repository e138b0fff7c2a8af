//! Analysis engine running every stage over one essay and assembling the report

use crate::config::{CalibrationMode, Config, StarConfig};
use crate::error::{AnalyzerError, Result};
use crate::processing::action_labels::{ActionLabel, ActionLabeler};
use crate::processing::embeddings::{Embedder, EmbeddingMatrix};
use crate::processing::keyword_matcher::{KeywordCoverageReport, KeywordMatcher};
use crate::processing::repetition::{RepetitionAnalyzer, RepetitionReport};
use crate::processing::similarity::{sentence_similarities, Calibrator, FitScoreSet, SentenceSimilarity};
use crate::processing::star::{group_episodes, StarCentroids, StarEpisode, StarLabelCounts, StarTag, StarTagger};
use crate::processing::text_processor::TextProcessor;
use crate::profiles::ProfileStore;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Coordinates normalization, embedding, scoring, keyword coverage, repetition
/// and STAR analysis.
pub struct EssayAnalyzer {
    embedder: Arc<dyn Embedder>,
    profiles: Arc<ProfileStore>,
    text_processor: TextProcessor,
    calibrator: Calibrator,
    keyword_matcher: KeywordMatcher,
    repetition: RepetitionAnalyzer,
    centroids: StarCentroids,
    action_labeler: Option<ActionLabeler>,
    star_config: StarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub job_id: i64,
    pub job_name: String,
    pub company_id: String,
    pub company_name: String,
    pub sentence_count: usize,
    pub cleaned_text: String,
    /// Space-joined morphemes, present when `processing.morph_normalize` is on.
    pub morph_normalized_text: Option<String>,
    pub sentences: Vec<String>,
    pub fit_scores: FitScoreSet,
    pub sentence_similarities: Vec<SentenceSimilarity>,
    pub keyword_coverage: KeywordCoverageReport,
    pub repetition: RepetitionReport,
    pub star_tags: Vec<StarTag>,
    pub star_episodes: Vec<StarEpisode>,
    pub action_labels: Vec<ActionLabel>,
    pub model_info: ModelInfo,
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub embedding_model: String,
    pub embedding_dimension: Option<usize>,
    pub calibration: CalibrationMode,
}

impl Report {
    /// True when the essay produced no sentences.
    pub fn is_empty(&self) -> bool {
        self.sentence_count == 0
    }

    pub fn star_counts(&self) -> StarLabelCounts {
        StarLabelCounts::from_tags(&self.star_tags)
    }

    pub fn best_episode(&self) -> Option<&StarEpisode> {
        self.star_episodes.iter().max_by(|a, b| {
            a.evaluation
                .score
                .total_cmp(&b.evaluation.score)
                .then_with(|| b.index.cmp(&a.index))
        })
    }
}

impl EssayAnalyzer {
    /// Builds the STAR centroids and action anchors up front with `embedder`.
    pub fn new(config: &Config, embedder: Arc<dyn Embedder>, profiles: Arc<ProfileStore>) -> Result<Self> {
        let start_time = Instant::now();

        let centroids = StarCentroids::build(embedder.as_ref())?;
        if let Some(dim) = profiles.dimension() {
            if dim != centroids.dimension() {
                return Err(AnalyzerError::DimensionMismatch {
                    context: format!(
                        "model {} against stored profile embeddings",
                        embedder.model_name()
                    ),
                    expected: dim,
                    found: centroids.dimension(),
                });
            }
        }

        let action_labeler = if config.star.action_labels {
            Some(ActionLabeler::build(
                embedder.as_ref(),
                config.star.action_label_threshold,
            )?)
        } else {
            None
        };

        info!(
            "Analysis engine ready in {:.2?} (model {}, dimension {})",
            start_time.elapsed(),
            embedder.model_name(),
            centroids.dimension()
        );

        Ok(Self {
            keyword_matcher: KeywordMatcher::new(embedder.clone(), &config.keywords),
            embedder,
            profiles,
            text_processor: TextProcessor::with_options(&config.processing),
            calibrator: Calibrator::from_config(&config.scoring),
            repetition: RepetitionAnalyzer::new(config.repetition.clone()),
            centroids,
            action_labeler,
            star_config: config.star.clone(),
        })
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn analyze(&self, essay: &str, job_id: i64, company_id: &str) -> Result<Report> {
        let start_time = Instant::now();

        // 1. Normalize and embed
        let normalized = self.text_processor.normalize(essay);
        let embeddings = self.embedder.embed(&normalized.sentences)?;
        debug!(
            "Embedded {} sentences (dimension {})",
            embeddings.len(),
            embeddings.dim()
        );

        // 2. Profiles
        let job = self.profiles.job(job_id)?;
        let company = self.profiles.company(company_id)?;
        self.check_dimension(&embeddings, job.dimension())?;

        // 3. Fit scores
        let essay_vector = embeddings.mean();
        let fit_scores = FitScoreSet::compute(
            &self.calibrator,
            essay_vector.as_ref().map(|v| v.view()),
            job.embedding.view(),
            company.embedding.view(),
        )?;
        let sentence_similarities = sentence_similarities(
            &normalized.sentences,
            &embeddings,
            job.embedding.view(),
            company.embedding.view(),
        )?;

        // 4. Keyword coverage
        let keyword_coverage = self
            .keyword_matcher
            .analyze(job, &normalized.sentences, &embeddings)?;

        // 5. Repetition
        let repetition = self.repetition.analyze(&normalized.cleaned_text);

        // 6. STAR structure
        let tagger = StarTagger::new(&self.centroids, self.star_config.other_threshold);
        let star_tags = tagger.tag(&normalized.sentences, &embeddings)?;
        let star_episodes = group_episodes(&star_tags, self.star_config.min_episode_sentences);

        let action_labels = match &self.action_labeler {
            Some(labeler) => labeler.label(&normalized.sentences, &embeddings)?,
            None => Vec::new(),
        };

        let processing_time = start_time.elapsed();
        info!(
            "Analyzed {} sentences for job {} / company {} in {:.2?}: job fit {:.2}, coverage {:.2}%",
            normalized.sentences.len(),
            job_id,
            company_id,
            processing_time,
            fit_scores.job_fit,
            keyword_coverage.overall_coverage
        );

        Ok(Report {
            job_id,
            job_name: job.job_nm.clone(),
            company_id: company.company_id.clone(),
            company_name: company.company_name.clone(),
            sentence_count: normalized.sentences.len(),
            cleaned_text: normalized.cleaned_text,
            morph_normalized_text: normalized.morph_normalized_text,
            sentences: normalized.sentences,
            fit_scores,
            sentence_similarities,
            keyword_coverage,
            repetition,
            star_tags,
            star_episodes,
            action_labels,
            model_info: ModelInfo {
                embedding_model: self.embedder.model_name().to_string(),
                embedding_dimension: self.embedder.dimension(),
                calibration: self.calibrator.mode(),
            },
            generated_at: Utc::now(),
            processing_time_ms: processing_time.as_millis() as u64,
        })
    }

    fn check_dimension(&self, embeddings: &EmbeddingMatrix, expected: usize) -> Result<()> {
        if !embeddings.is_empty() && embeddings.dim() != expected {
            return Err(AnalyzerError::DimensionMismatch {
                context: format!("essay embeddings from {}", self.embedder.model_name()),
                expected,
                found: embeddings.dim(),
            });
        }
        Ok(())
    }
}
