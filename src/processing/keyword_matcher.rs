//! Coverage of job-taxonomy keywords in an essay

use crate::config::{KeywordConfig, MatchingMode};
use crate::error::{AnalyzerError, Result};
use crate::processing::embeddings::{Embedder, EmbeddingMatrix};
use crate::processing::similarity::{cosine_similarity, round_to};
use crate::profiles::{JobProfile, KeywordGroup, ProfileStore};
use aho_corasick::AhoCorasick;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

const RECOMMENDATION_TEMPLATES: [&str; 3] = [
    "{}과(와) 관련된 구체적인 경험을 행동 중심으로 서술해보세요.",
    "{}을(를) 활용해 문제를 해결하거나 판단했던 사례를 추가해보세요.",
    "{} 역량이 드러나는 결과나 성과를 함께 제시하면 좋습니다.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Evaluated,
    /// The essay produced no sentences.
    NoSentences,
    /// The job id is not in the profile store; distinct from zero coverage.
    JobNotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEvidence {
    pub sentence: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCoverage {
    pub group: KeywordGroup,
    pub total: usize,
    pub coverage_score: f32,
    pub matched: BTreeMap<String, KeywordEvidence>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCoverageReport {
    pub status: CoverageStatus,
    pub mode: MatchingMode,
    pub threshold: f32,
    pub groups: Vec<GroupCoverage>,
    pub overall_coverage: f32,
    pub matched_keywords: BTreeMap<String, KeywordEvidence>,
    pub missing_keywords: Vec<String>,
    pub recommendations: Vec<String>,
}

impl KeywordCoverageReport {
    pub fn empty(status: CoverageStatus, mode: MatchingMode, threshold: f32) -> Self {
        Self {
            status,
            mode,
            threshold,
            groups: Vec::new(),
            overall_coverage: 0.0,
            matched_keywords: BTreeMap::new(),
            missing_keywords: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn group(&self, group: KeywordGroup) -> Option<&GroupCoverage> {
        self.groups.iter().find(|g| g.group == group)
    }
}

/// Matches each taxonomy keyword against its closest essay sentence.
pub struct KeywordMatcher {
    embedder: Arc<dyn Embedder>,
    mode: MatchingMode,
    threshold: f32,
    max_recommended: usize,
}

impl KeywordMatcher {
    pub fn new(embedder: Arc<dyn Embedder>, config: &KeywordConfig) -> Self {
        Self {
            embedder,
            mode: config.mode,
            threshold: config.similarity_threshold.clamp(-1.0, 1.0),
            max_recommended: config.max_recommended_keywords,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Coverage for a job looked up by id; unknown ids yield a `JobNotFound` report.
    pub fn analyze_job_id(
        &self,
        store: &ProfileStore,
        job_cd: i64,
        sentences: &[String],
        embeddings: &EmbeddingMatrix,
    ) -> Result<KeywordCoverageReport> {
        match store.find_job(job_cd) {
            Some(job) => self.analyze(job, sentences, embeddings),
            None => Ok(KeywordCoverageReport::empty(
                CoverageStatus::JobNotFound,
                self.mode,
                self.threshold,
            )),
        }
    }

    pub fn analyze(
        &self,
        job: &JobProfile,
        sentences: &[String],
        embeddings: &EmbeddingMatrix,
    ) -> Result<KeywordCoverageReport> {
        if sentences.is_empty() {
            return Ok(KeywordCoverageReport::empty(
                CoverageStatus::NoSentences,
                self.mode,
                self.threshold,
            ));
        }
        if self.mode == MatchingMode::Semantic && embeddings.len() != sentences.len() {
            return Err(AnalyzerError::AnalysisFailed(format!(
                "{} sentence embeddings for {} sentences",
                embeddings.len(),
                sentences.len()
            )));
        }

        let mut groups = Vec::with_capacity(KeywordGroup::ALL.len());
        let mut matched_keywords = BTreeMap::new();
        let mut missing_keywords = Vec::new();
        let mut seen_missing = HashSet::new();

        for (group, keywords) in job.keywords.iter() {
            let matches = match self.mode {
                MatchingMode::Semantic => self.match_semantic(keywords, sentences, embeddings)?,
                MatchingMode::Lexical => self.match_lexical(keywords, sentences)?,
            };

            let mut matched = BTreeMap::new();
            let mut missing = Vec::new();
            for (keyword, evidence) in keywords.iter().zip(matches) {
                match evidence {
                    Some(evidence) => {
                        matched.insert(keyword.clone(), evidence);
                    }
                    None => missing.push(keyword.clone()),
                }
            }

            let coverage_score = if keywords.is_empty() {
                0.0
            } else {
                round_to(matched.len() as f32 / keywords.len() as f32 * 100.0, 2)
            };
            debug!(
                "Keyword group {}: {}/{} matched",
                group,
                matched.len(),
                keywords.len()
            );

            matched_keywords.extend(matched.iter().map(|(k, v)| (k.clone(), v.clone())));
            for keyword in &missing {
                if seen_missing.insert(keyword.clone()) {
                    missing_keywords.push(keyword.clone());
                }
            }

            groups.push(GroupCoverage {
                group,
                total: keywords.len(),
                coverage_score,
                matched,
                missing,
            });
        }

        let overall_coverage = round_to(
            groups.iter().map(|g| g.coverage_score).sum::<f32>() / groups.len() as f32,
            2,
        );
        let recommendations = recommendations(&missing_keywords, self.max_recommended);

        Ok(KeywordCoverageReport {
            status: CoverageStatus::Evaluated,
            mode: self.mode,
            threshold: self.threshold,
            groups,
            overall_coverage,
            matched_keywords,
            missing_keywords,
            recommendations,
        })
    }

    /// Exhaustive nearest-sentence scan per keyword.
    fn match_semantic(
        &self,
        keywords: &[String],
        sentences: &[String],
        embeddings: &EmbeddingMatrix,
    ) -> Result<Vec<Option<KeywordEvidence>>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let keyword_vectors = self.embedder.embed(keywords)?;

        let mut results = Vec::with_capacity(keywords.len());
        for keyword_vector in keyword_vectors.rows() {
            let mut best: Option<(usize, f32)> = None;
            for (index, sentence_vector) in embeddings.rows().enumerate() {
                let sim = cosine_similarity(keyword_vector, sentence_vector)?;
                if best.map_or(true, |(_, best_sim)| sim > best_sim) {
                    best = Some((index, sim));
                }
            }

            results.push(best.and_then(|(index, sim)| {
                (sim >= self.threshold).then(|| KeywordEvidence {
                    sentence: sentences[index].clone(),
                    similarity: round_to(sim, 3),
                })
            }));
        }
        Ok(results)
    }

    /// Exact substring occurrence; the first containing sentence is the evidence.
    fn match_lexical(
        &self,
        keywords: &[String],
        sentences: &[String],
    ) -> Result<Vec<Option<KeywordEvidence>>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(keywords)
            .map_err(|e| {
                AnalyzerError::AnalysisFailed(format!("Failed to build keyword matcher: {}", e))
            })?;

        let mut results: Vec<Option<KeywordEvidence>> = vec![None; keywords.len()];
        for sentence in sentences {
            for mat in matcher.find_overlapping_iter(sentence) {
                let slot = &mut results[mat.pattern().as_usize()];
                if slot.is_none() {
                    *slot = Some(KeywordEvidence {
                        sentence: sentence.clone(),
                        similarity: 1.0,
                    });
                }
            }
        }
        Ok(results)
    }
}

/// Three writing prompts for each of the first `limit` missing keywords.
pub fn recommendations(missing: &[String], limit: usize) -> Vec<String> {
    missing
        .iter()
        .take(limit)
        .flat_map(|keyword| {
            RECOMMENDATION_TEMPLATES
                .iter()
                .map(move |template| template.replace("{}", keyword))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::embeddings::testing::{axis, LookupEmbedder};
    use crate::profiles::JobRecord;

    fn job(skills: &[&str], knowledge: &[&str]) -> JobProfile {
        JobProfile::from_record(
            JobRecord {
                job_cd: 1,
                job_nm: "데이터분석가".to_string(),
                top_nm: None,
                aptit_name: None,
                work_summary: String::new(),
                main_abilities: vec![],
                skills: skills.iter().map(|s| s.to_string()).collect(),
                knowledge: knowledge.iter().map(|s| s.to_string()).collect(),
                interests: vec![],
                embedding: vec![1.0; 4],
            },
            "test",
        )
        .unwrap()
    }

    fn config(mode: MatchingMode) -> KeywordConfig {
        KeywordConfig {
            mode,
            similarity_threshold: 0.35,
            max_recommended_keywords: 5,
        }
    }

    fn sentences(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_semantic_match_uses_best_sentence() {
        let embedder = Arc::new(
            LookupEmbedder::new(4)
                .with("통계", axis(4, 0))
                .with("설계", axis(4, 2))
                .with("통계를 공부했습니다.", vec![0.9, 0.1, 0.0, 0.0])
                .with("모델을 만들었습니다.", vec![0.5, 0.5, 0.0, 0.0]),
        );
        let matcher = KeywordMatcher::new(embedder.clone(), &config(MatchingMode::Semantic));
        let essay = sentences(&["모델을 만들었습니다.", "통계를 공부했습니다."]);
        let embeddings = embedder.embed(&essay).unwrap();

        let report = matcher.analyze(&job(&["통계", "설계"], &[]), &essay, &embeddings).unwrap();

        let skills = report.group(KeywordGroup::Skills).unwrap();
        assert_eq!(skills.coverage_score, 50.0);
        assert_eq!(skills.matched["통계"].sentence, "통계를 공부했습니다.");
        assert_eq!(skills.missing, vec!["설계"]);
        // knowledge and main abilities are empty and score zero
        assert!((report.overall_coverage - 16.67).abs() < 0.01);
        assert_eq!(report.recommendations.len(), 3);
        assert!(report.recommendations[0].starts_with("설계과(와)"));
    }

    #[test]
    fn test_no_sentences_short_circuits() {
        let embedder = Arc::new(LookupEmbedder::new(4));
        let matcher = KeywordMatcher::new(embedder, &config(MatchingMode::Semantic));
        let report = matcher
            .analyze(&job(&["통계"], &[]), &[], &EmbeddingMatrix::empty())
            .unwrap();
        assert_eq!(report.status, CoverageStatus::NoSentences);
        assert_eq!(report.overall_coverage, 0.0);
    }

    #[test]
    fn test_unknown_job_is_flagged() {
        let embedder = Arc::new(LookupEmbedder::new(4));
        let matcher = KeywordMatcher::new(embedder, &config(MatchingMode::Semantic));
        let store = ProfileStore::default();
        let report = matcher
            .analyze_job_id(&store, 42, &sentences(&["문장입니다."]), &EmbeddingMatrix::empty())
            .unwrap();
        assert_eq!(report.status, CoverageStatus::JobNotFound);
    }

    #[test]
    fn test_lexical_mode_matches_substrings() {
        let embedder = Arc::new(LookupEmbedder::new(4));
        let matcher = KeywordMatcher::new(embedder, &config(MatchingMode::Lexical));
        let essay = sentences(&["Python으로 데이터를 정리했습니다.", "통계 모델을 검증했습니다."]);

        let report = matcher
            .analyze(&job(&["python", "SQL"], &["통계"]), &essay, &EmbeddingMatrix::empty())
            .unwrap();

        assert_eq!(report.mode, MatchingMode::Lexical);
        assert_eq!(
            report.matched_keywords["python"].sentence,
            "Python으로 데이터를 정리했습니다."
        );
        assert_eq!(report.group(KeywordGroup::Knowledge).unwrap().coverage_score, 100.0);
        assert_eq!(report.missing_keywords, vec!["SQL"]);
    }

    #[test]
    fn test_recommendations_are_capped() {
        let missing: Vec<String> = (0..8).map(|i| format!("역량{}", i)).collect();
        let recs = recommendations(&missing, 5);
        assert_eq!(recs.len(), 15);
        assert!(recs.iter().all(|r| !r.contains("역량5")));
    }
}
