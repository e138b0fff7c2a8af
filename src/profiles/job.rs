//! Job taxonomy records and their keyword groups

use crate::error::{AnalyzerError, Result};
use ndarray::Array1;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

static TERM_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[·,()/ .]+").expect("Invalid keyword separator regex"));

/// Job record as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_cd: i64,
    pub job_nm: String,
    #[serde(default)]
    pub top_nm: Option<String>,
    #[serde(default)]
    pub aptit_name: Option<String>,
    #[serde(default)]
    pub work_summary: String,
    #[serde(default)]
    pub main_abilities: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub knowledge: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordGroup {
    Skills,
    Knowledge,
    MainAbilities,
}

impl KeywordGroup {
    pub const ALL: [KeywordGroup; 3] = [Self::Skills, Self::Knowledge, Self::MainAbilities];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skills => "skills",
            Self::Knowledge => "knowledge",
            Self::MainAbilities => "main_abilities",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Skills => "기술",
            Self::Knowledge => "지식",
            Self::MainAbilities => "핵심 능력",
        }
    }
}

impl fmt::Display for KeywordGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordGroups {
    pub skills: Vec<String>,
    pub knowledge: Vec<String>,
    pub main_abilities: Vec<String>,
}

impl KeywordGroups {
    pub fn get(&self, group: KeywordGroup) -> &[String] {
        match group {
            KeywordGroup::Skills => &self.skills,
            KeywordGroup::Knowledge => &self.knowledge,
            KeywordGroup::MainAbilities => &self.main_abilities,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (KeywordGroup, &[String])> {
        KeywordGroup::ALL.into_iter().map(move |g| (g, self.get(g)))
    }
}

/// Validated job profile.
#[derive(Debug, Clone)]
pub struct JobProfile {
    pub job_cd: i64,
    pub job_nm: String,
    pub top_nm: Option<String>,
    pub aptit_name: Option<String>,
    pub work_summary: String,
    pub interests: Vec<String>,
    pub keywords: KeywordGroups,
    pub embedding: Array1<f32>,
}

impl JobProfile {
    pub fn from_record(record: JobRecord, source_name: &str) -> Result<Self> {
        if record.job_nm.trim().is_empty() {
            return Err(AnalyzerError::InvalidProfile {
                source_name: source_name.to_string(),
                reason: format!("job {} has an empty job_nm", record.job_cd),
            });
        }
        super::validate_embedding(&record.embedding, source_name, &format!("job {}", record.job_cd))?;

        Ok(Self {
            job_cd: record.job_cd,
            job_nm: record.job_nm.trim().to_string(),
            top_nm: record.top_nm.filter(|s| !s.trim().is_empty()),
            aptit_name: record.aptit_name.filter(|s| !s.trim().is_empty()),
            work_summary: record.work_summary,
            interests: record.interests,
            keywords: KeywordGroups {
                skills: split_keyword_terms(&record.skills),
                knowledge: split_keyword_terms(&record.knowledge),
                main_abilities: split_keyword_terms(&record.main_abilities),
            },
            embedding: Array1::from_vec(record.embedding),
        })
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

/// Split compound terms such as `"데이터 분석·통계(R/Python)"` into single
/// keywords, dropping one-character fragments and duplicates. First occurrence wins.
pub fn split_keyword_terms(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    for item in items {
        for part in TERM_SEPARATOR.split(item) {
            let part = part.trim();
            if part.chars().count() > 1 && seen.insert(part.to_string()) {
                terms.push(part.to_string());
            }
        }
    }

    terms
}
