//! Company profile records

use crate::error::{AnalyzerError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub company_id: String,
    pub company_name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub values: String,
    #[serde(default)]
    pub talent: String,
    #[serde(default)]
    pub tech_keywords: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct CompanyProfile {
    pub company_id: String,
    pub company_name: String,
    pub industry: String,
    pub summary: String,
    pub values: String,
    pub talent: String,
    pub tech_keywords: String,
    pub embedding: Array1<f32>,
}

impl CompanyProfile {
    pub fn from_record(record: CompanyRecord, source_name: &str) -> Result<Self> {
        let company_id = record.company_id.trim().to_string();
        if company_id.is_empty() {
            return Err(AnalyzerError::InvalidProfile {
                source_name: source_name.to_string(),
                reason: format!("company '{}' has an empty company_id", record.company_name),
            });
        }
        super::validate_embedding(
            &record.embedding,
            source_name,
            &format!("company {}", company_id),
        )?;

        Ok(Self {
            company_id,
            company_name: record.company_name.trim().to_string(),
            industry: record.industry,
            summary: record.summary,
            values: record.values,
            talent: record.talent,
            tech_keywords: record.tech_keywords,
            embedding: Array1::from_vec(record.embedding),
        })
    }

    /// The merged description a company vector is built from.
    pub fn document_text(&self) -> String {
        format!(
            "기업명: {}. 산업: {}. 기업요약: {}. 핵심가치: {}. 인재상: {}. 기술키워드: {}.",
            self.company_name,
            self.industry,
            self.summary,
            self.values,
            self.talent,
            self.tech_keywords
        )
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, embedding: Vec<f32>) -> CompanyRecord {
        CompanyRecord {
            company_id: id.to_string(),
            company_name: "테스트전자".to_string(),
            industry: "전자".to_string(),
            summary: String::new(),
            values: "도전".to_string(),
            talent: String::new(),
            tech_keywords: String::new(),
            embedding,
        }
    }

    #[test]
    fn test_document_text_merges_fields() {
        let company = CompanyProfile::from_record(record("c1", vec![1.0]), "companies.json").unwrap();
        let text = company.document_text();
        assert!(text.starts_with("기업명: 테스트전자. 산업: 전자."));
        assert!(text.contains("핵심가치: 도전."));
    }

    #[test]
    fn test_non_finite_embedding_is_rejected() {
        let err =
            CompanyProfile::from_record(record("c1", vec![1.0, f32::NAN]), "companies.json")
                .unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidProfile { .. }));
    }

    #[test]
    fn test_blank_id_is_rejected() {
        assert!(CompanyProfile::from_record(record(" ", vec![1.0]), "companies.json").is_err());
    }
}
