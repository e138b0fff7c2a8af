//! Integration tests for the essay analyzer

mod common;

use common::*;
use selfintro_analyzer::config::{Config, MatchingMode, OutputFormat};
use selfintro_analyzer::input::manager::InputManager;
use selfintro_analyzer::output::{EssayReport, ReportGenerator};
use selfintro_analyzer::processing::embeddings::HashingEmbedder;
use selfintro_analyzer::processing::keyword_matcher::CoverageStatus;
use selfintro_analyzer::processing::star::StarLabel;
use selfintro_analyzer::profiles::KeywordGroup;
use selfintro_analyzer::{AnalyzerError, EssayAnalyzer, ProfileStore};
use std::sync::Arc;

fn analyzer_with(config: &Config) -> EssayAnalyzer {
    EssayAnalyzer::new(config, Arc::new(star_embedder()), Arc::new(fixture_store())).unwrap()
}

fn analyzer() -> EssayAnalyzer {
    analyzer_with(&Config::default())
}

fn star_essay() -> String {
    format!("{} {} {} {}", SITUATION, TASK, ACTION, RESULT)
}

#[test]
fn test_text_extraction_from_txt() {
    let mut manager = InputManager::new();
    let text = manager.extract_text(&fixture("sample_essay.txt")).unwrap();
    assert!(text.contains(SITUATION));
    assert!(text.contains(RESULT));
    assert_eq!(manager.cache_size(), 1);
}

#[test]
fn test_text_extraction_from_markdown() {
    let mut manager = InputManager::new();
    let text = manager.extract_text(&fixture("sample_essay.md")).unwrap();
    assert!(text.contains("지원 동기"));
    assert!(text.contains("로그를 분석했습니다."));
    assert!(!text.contains("**"));
    assert!(!text.contains('#'));
}

#[test]
fn test_unsupported_and_missing_files() {
    let mut manager = InputManager::new();
    assert!(manager.extract_text(&fixture("unsupported.xyz")).is_err());
    assert!(manager.extract_text(&fixture("nonexistent.txt")).is_err());
}

#[test]
fn test_star_sentences_form_one_complete_episode() {
    let report = analyzer().analyze(&star_essay(), 10, "acme").unwrap();

    let labels: Vec<StarLabel> = report.star_tags.iter().map(|t| t.label).collect();
    assert_eq!(labels, vec![StarLabel::S, StarLabel::T, StarLabel::A, StarLabel::R]);

    assert_eq!(report.star_episodes.len(), 1);
    let episode = &report.star_episodes[0];
    assert_eq!(episode.sentences.len(), 4);
    assert_eq!(episode.evaluation.score, 100.0);
    assert!(episode.evaluation.feedback.iter().any(|f| f.contains("핵심 카드")));

    let counts = report.star_counts();
    assert_eq!((counts.situation, counts.task, counts.action, counts.result), (1, 1, 1, 1));
    assert!(counts.needs_more_action_or_result());
}

#[test]
fn test_sample_file_matches_inline_essay() {
    let text = InputManager::new()
        .extract_text(&fixture("sample_essay.txt"))
        .unwrap();
    let report = analyzer().analyze(&text, 10, "acme").unwrap();
    assert_eq!(
        report.sentences,
        vec![SITUATION, TASK, ACTION, RESULT]
    );
}

#[test]
fn test_compound_skill_is_split_and_matched() {
    let report = analyzer().analyze(&star_essay(), 10, "acme").unwrap();
    let coverage = &report.keyword_coverage;
    assert_eq!(coverage.status, CoverageStatus::Evaluated);

    let skills = coverage.group(KeywordGroup::Skills).unwrap();
    assert_eq!(skills.total, 2);
    assert_eq!(skills.coverage_score, 100.0);
    assert_eq!(skills.matched["문제"].sentence, SITUATION);
    assert_eq!(skills.matched["해결"].sentence, RESULT);
    assert!(skills.matched.values().all(|e| e.similarity >= 0.35));

    assert_eq!(coverage.missing_keywords, vec!["데이터베이스", "협업"]);
    assert!((coverage.overall_coverage - 33.33).abs() < 0.01);
    assert_eq!(coverage.recommendations.len(), 6);
}

#[test]
fn test_lexical_mode_finds_substrings() {
    let mut config = Config::default();
    config.keywords.mode = MatchingMode::Lexical;
    let report = analyzer_with(&config)
        .analyze("데이터베이스 설계를 맡았습니다.", 10, "acme")
        .unwrap();

    let knowledge = report.keyword_coverage.group(KeywordGroup::Knowledge).unwrap();
    assert_eq!(knowledge.matched["데이터베이스"].similarity, 1.0);
    assert!(report.keyword_coverage.missing_keywords.contains(&"문제".to_string()));
}

#[test]
fn test_repeated_words_are_reported() {
    let essay = "프로젝트를 시작했습니다. 프로젝트에서 배웠습니다. 프로젝트가 끝났습니다. 프로젝트는 성공했습니다.";
    let report = analyzer().analyze(essay, 10, "acme").unwrap();
    assert_eq!(report.repetition.repeated_words.get("프로젝트"), Some(&4));
    assert!(!report.repetition.suggestions.is_empty());
}

#[test]
fn test_empty_essay_gives_empty_report() {
    let report = analyzer().analyze("", 10, "acme").unwrap();
    assert!(report.is_empty());
    assert!(report.star_episodes.is_empty());
    assert_eq!(report.keyword_coverage.status, CoverageStatus::NoSentences);

    let report = EssayReport::from_analysis(report);
    assert!(report.summary.verdict.contains("분석할 문장이 없습니다"));
    assert!(report.summary.star_warning.is_none());
}

#[test]
fn test_unknown_job_is_not_found() {
    let err = analyzer().analyze(&star_essay(), 999, "acme").unwrap_err();
    assert!(matches!(err, AnalyzerError::JobNotFound(999)));
    assert!(err.is_not_found());
}

#[test]
fn test_model_dimension_must_match_profiles() {
    let result = EssayAnalyzer::new(
        &Config::default(),
        Arc::new(HashingEmbedder::new(256)),
        Arc::new(fixture_store()),
    );
    assert!(matches!(result, Err(AnalyzerError::DimensionMismatch { .. })));
}

#[test]
fn test_profile_loading_and_taxonomy() {
    let store = fixture_store();
    assert_eq!(store.job_count(), 3);
    assert_eq!(store.company_count(), 2);
    assert_eq!(store.dimension(), Some(DIM));

    let taxonomy = store.job_taxonomy();
    assert_eq!(taxonomy["IT"]["개발"][0].job_nm, "백엔드 개발자");
    assert_eq!(taxonomy["보건"]["기타"][0].job_cd, 30);

    let names: Vec<&str> = store.companies().iter().map(|c| c.company_name.as_str()).collect();
    assert_eq!(names, vec!["브라보", "에이크미"]);
    assert!(store.company("acme").unwrap().document_text().contains("기술키워드: Rust"));
}

#[test]
fn test_invalid_profile_files() {
    let dir = tempfile::tempdir().unwrap();
    let companies = fixture("companies.json");

    let missing_field = dir.path().join("jobs.json");
    std::fs::write(&missing_field, r#"[{"job_nm": "개발자", "embedding": [1.0]}]"#).unwrap();
    assert!(matches!(
        ProfileStore::load_from_paths(&missing_field, &companies, None),
        Err(AnalyzerError::InvalidProfile { .. })
    ));

    let short_vector = dir.path().join("short.json");
    std::fs::write(
        &short_vector,
        r#"[{"job_cd": 1, "job_nm": "개발자", "embedding": [1.0, 0.0]}]"#,
    )
    .unwrap();
    assert!(matches!(
        ProfileStore::load_from_paths(&short_vector, &companies, None),
        Err(AnalyzerError::DimensionMismatch { expected: 2, found: 8, .. })
    ));
}

#[test]
fn test_json_report_output() {
    let analysis = analyzer().analyze(&star_essay(), 10, "acme").unwrap();
    let report = EssayReport::from_analysis(analysis);
    let generator = ReportGenerator::with_options(false, true, true, true);

    let json = generator.generate_report(&report, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["analysis"]["job_name"], "백엔드 개발자");
    assert_eq!(value["analysis"]["star_tags"][0]["label"], "S");
    assert_eq!(value["analysis"]["star_episodes"][0]["evaluation"]["score"], 100.0);
    assert_eq!(value["summary"]["star_counts"]["action"], 1);
    assert!(value["summary"]["star_warning"].is_string());
}

#[test]
fn test_console_and_markdown_output() {
    let analysis = analyzer().analyze(&star_essay(), 10, "acme").unwrap();
    let report = EssayReport::from_analysis(analysis);

    let console = ReportGenerator::with_options(false, true, true, true)
        .generate_report(&report, OutputFormat::Console)
        .unwrap();
    assert!(console.contains("직무 적합도"));
    assert!(console.contains("[S] 예기치 못한 문제가 발생했습니다."));
    assert!(console.contains("데이터베이스"));

    let markdown = ReportGenerator::new()
        .with_recommendations(false)
        .generate_report(&report, OutputFormat::Markdown)
        .unwrap();
    assert!(markdown.starts_with("# 자기소개서 분석 결과"));
    assert!(markdown.contains("| 기술 | 100.00 | 2/2 |"));
    assert!(!markdown.contains("개선 제안 문장"));
}
