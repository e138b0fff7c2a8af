//! Configuration management for the essay analyzer

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub data: DataConfig,
    pub processing: ProcessingConfig,
    pub scoring: ScoringConfig,
    pub keywords: KeywordConfig,
    pub repetition: RepetitionConfig,
    pub star: StarConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub backend: EmbeddingBackend,
    pub default_embedding_model: String,
    /// Dimension used by the hashing backend.
    pub hashing_dimension: usize,
    pub batch_size: usize,
    pub available_models: Vec<AvailableModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Model2Vec,
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub job_profiles: PathBuf,
    pub company_profiles: PathBuf,
    /// When set, every profile embedding must have exactly this many components.
    pub expected_dimension: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub spell_check: bool,
    pub morph_normalize: bool,
    pub enable_caching: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub calibration: CalibrationMode,
    pub anchors: CalibrationAnchors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMode {
    /// Piecewise-linear mapping through the low/mid/high anchors.
    Anchored,
    /// `(s + 1) / 2 * 100`
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationAnchors {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl Default for CalibrationAnchors {
    fn default() -> Self {
        Self {
            low: -0.08,
            mid: 0.02,
            high: 0.12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub mode: MatchingMode,
    pub similarity_threshold: f32,
    pub max_recommended_keywords: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingMode {
    Semantic,
    Lexical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepetitionConfig {
    pub word_threshold: usize,
    pub phrase_threshold: usize,
    pub skeleton_threshold: usize,
    pub min_ngram: usize,
    pub max_ngram: usize,
}

impl Default for RepetitionConfig {
    fn default() -> Self {
        Self {
            word_threshold: 3,
            phrase_threshold: 2,
            skeleton_threshold: 2,
            min_ngram: 2,
            max_ngram: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarConfig {
    pub other_threshold: f32,
    pub min_episode_sentences: usize,
    pub action_labels: bool,
    pub action_label_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub include_recommendations: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".selfintro-analyzer");

        Self {
            models: ModelConfig {
                models_dir: base_dir.join("models"),
                backend: EmbeddingBackend::Model2Vec,
                default_embedding_model: "minishlab/potion-multilingual-128M".to_string(),
                hashing_dimension: 256,
                batch_size: 32,
                available_models: vec![
                    AvailableModel {
                        name: "potion-multilingual".to_string(),
                        repo_id: "minishlab/potion-multilingual-128M".to_string(),
                        size_mb: 500,
                        description: "Multilingual Model2Vec static embeddings with Korean coverage"
                            .to_string(),
                    },
                    AvailableModel {
                        name: "m2v-multilingual".to_string(),
                        repo_id: "minishlab/M2V_multilingual_output".to_string(),
                        size_mb: 480,
                        description: "Model2Vec distillation of a multilingual sentence encoder"
                            .to_string(),
                    },
                ],
            },
            data: DataConfig {
                job_profiles: base_dir.join("data").join("jobs.json"),
                company_profiles: base_dir.join("data").join("companies.json"),
                expected_dimension: None,
            },
            processing: ProcessingConfig {
                spell_check: false,
                morph_normalize: false,
                enable_caching: true,
            },
            scoring: ScoringConfig {
                calibration: CalibrationMode::Anchored,
                anchors: CalibrationAnchors::default(),
            },
            keywords: KeywordConfig {
                mode: MatchingMode::Semantic,
                similarity_threshold: 0.35,
                max_recommended_keywords: 5,
            },
            repetition: RepetitionConfig::default(),
            star: StarConfig {
                other_threshold: 0.20,
                min_episode_sentences: 1,
                action_labels: true,
                action_label_threshold: 0.70,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                include_recommendations: true,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AnalyzerError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            AnalyzerError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("selfintro-analyzer")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let CalibrationAnchors { low, mid, high } = self.scoring.anchors;
        if !(low > -1.0 && low < mid && mid < high && high < 1.0) {
            return Err(AnalyzerError::Configuration(format!(
                "Calibration anchors must satisfy -1 < low < mid < high < 1 (got {}, {}, {})",
                low, mid, high
            )));
        }

        for (name, value) in [
            ("keywords.similarity_threshold", self.keywords.similarity_threshold),
            ("star.other_threshold", self.star.other_threshold),
            ("star.action_label_threshold", self.star.action_label_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(AnalyzerError::Configuration(format!(
                    "{} must lie in [-1, 1] (got {})",
                    name, value
                )));
            }
        }

        let rep = &self.repetition;
        if rep.min_ngram < 1 || rep.min_ngram > rep.max_ngram {
            return Err(AnalyzerError::Configuration(format!(
                "Invalid n-gram range {}..={}",
                rep.min_ngram, rep.max_ngram
            )));
        }

        if self.models.backend == EmbeddingBackend::Hashing && self.models.hashing_dimension == 0 {
            return Err(AnalyzerError::Configuration(
                "models.hashing_dimension must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Local model directory when it has been downloaded, otherwise the hub repo id.
    pub fn embedding_model_source(&self) -> String {
        let model = &self.models.default_embedding_model;
        let local = self.models.models_dir.join(model.replace('/', "--"));
        if local.exists() {
            local.to_string_lossy().into_owned()
        } else {
            model.clone()
        }
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<&AvailableModel> {
        self.models.available_models.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.keywords.similarity_threshold, 0.35);
        assert_eq!(config.scoring.calibration, CalibrationMode::Anchored);
    }

    #[test]
    fn test_rejects_unordered_anchors() {
        let mut config = Config::default();
        config.scoring.anchors = CalibrationAnchors {
            low: 0.1,
            mid: 0.05,
            high: 0.2,
        };
        assert!(matches!(
            config.validate(),
            Err(AnalyzerError::Configuration(_))
        ));
    }

    #[test]
    fn test_save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.keywords.mode = MatchingMode::Lexical;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.keywords.mode, MatchingMode::Lexical);
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("mode = \"lexical\""));
    }

    #[test]
    fn test_model_lookup_by_name() {
        let config = Config::default();
        assert!(config.get_model_by_name("potion-multilingual").is_some());
        assert!(config.get_model_by_name("missing").is_none());
    }
}
