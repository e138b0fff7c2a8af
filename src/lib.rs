//! Self-introduction essay analyzer library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod processing;
pub mod profiles;

pub use config::Config;
pub use error::{AnalyzerError, Result};
pub use output::EssayReport;
pub use processing::analyzer::{EssayAnalyzer, Report};
pub use processing::embeddings::{embedder_from_config, Embedder, EmbeddingMatrix};
pub use profiles::ProfileStore;
