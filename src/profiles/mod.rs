//! Job and company profiles consumed by the analyzer

pub mod company;
pub mod job;
pub mod store;

pub use company::{CompanyProfile, CompanyRecord};
pub use job::{split_keyword_terms, JobProfile, JobRecord, KeywordGroup, KeywordGroups};
pub use store::{JobSummary, ProfileStore};

use crate::error::{AnalyzerError, Result};

fn validate_embedding(embedding: &[f32], source_name: &str, owner: &str) -> Result<()> {
    if embedding.is_empty() {
        return Err(AnalyzerError::InvalidProfile {
            source_name: source_name.to_string(),
            reason: format!("{} has an empty embedding", owner),
        });
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(AnalyzerError::InvalidProfile {
            source_name: source_name.to_string(),
            reason: format!("{} has a non-finite embedding component", owner),
        });
    }
    Ok(())
}
