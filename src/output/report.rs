//! Report summary: interpretation of scores on top of the raw analysis

use crate::processing::analyzer::Report;
use crate::processing::keyword_matcher::CoverageStatus;
use crate::processing::star::StarLabelCounts;
use serde::{Deserialize, Serialize};

/// Analysis plus the interpretation shown to the writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssayReport {
    pub summary: ReportSummary,
    pub analysis: Report,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub job_fit_band: FitBand,
    pub verdict: String,
    pub star_counts: StarLabelCounts,
    pub star_warning: Option<String>,
    pub best_episode_score: Option<f32>,
    pub strengths: Vec<String>,
    pub improvement_areas: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitBand {
    Strong,
    Partial,
    Weak,
}

impl FitBand {
    pub fn from_score(score: f32) -> Self {
        if score >= 70.0 {
            FitBand::Strong
        } else if score >= 50.0 {
            FitBand::Partial
        } else {
            FitBand::Weak
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FitBand::Strong => "지원 직무와 매우 잘 맞는 경험이 드러납니다.",
            FitBand::Partial => "직무와 연결되는 경험은 있으나 핵심 역량 표현이 부족합니다.",
            FitBand::Weak => "직무 요구 역량과의 연결성이 낮아 보완이 필요합니다.",
        }
    }
}

const STAR_WARNING: &str = "행동(Action)과 결과(Result) 중심 문장을 보강하면 설득력이 높아집니다.";

impl EssayReport {
    pub fn from_analysis(analysis: Report) -> Self {
        let summary = ReportSummary::from_analysis(&analysis);
        Self { summary, analysis }
    }
}

impl ReportSummary {
    pub fn from_analysis(report: &Report) -> Self {
        let job_fit_band = FitBand::from_score(report.fit_scores.job_fit);
        let star_counts = report.star_counts();
        let best_episode_score = report.best_episode().map(|e| e.evaluation.score);

        if report.is_empty() {
            return Self {
                job_fit_band,
                verdict: "분석할 문장이 없습니다. 자기소개서를 입력해주세요.".to_string(),
                star_counts,
                star_warning: None,
                best_episode_score,
                strengths: Vec::new(),
                improvement_areas: Vec::new(),
            };
        }

        let star_warning = star_counts
            .needs_more_action_or_result()
            .then(|| STAR_WARNING.to_string());

        let coverage = &report.keyword_coverage;
        let fits = &report.fit_scores;
        let mut strengths = Vec::new();
        let mut improvement_areas = Vec::new();

        if fits.company_fit >= 70.0 {
            strengths.push("기업의 사업 방향과 연결되는 표현이 잘 드러납니다.".to_string());
        } else if fits.company_fit < 50.0 {
            improvement_areas
                .push("기업의 사업 방향이나 실제 업무와 직접 연결된 표현이 부족합니다.".to_string());
        }

        if coverage.status == CoverageStatus::Evaluated {
            if coverage.overall_coverage >= 70.0 {
                strengths.push(format!(
                    "직무 핵심 키워드의 {:.0}%가 문장에 반영되어 있습니다.",
                    coverage.overall_coverage
                ));
            } else if coverage.overall_coverage < 50.0 {
                improvement_areas.push(format!(
                    "직무 핵심 키워드 반영률이 {:.0}%로 낮습니다. 부족한 역량을 경험과 연결해보세요.",
                    coverage.overall_coverage
                ));
            }
        }

        match best_episode_score {
            Some(score) if score >= 75.0 => {
                strengths.push("완성도 높은 STAR 경험이 포함되어 있습니다.".to_string())
            }
            Some(_) => improvement_areas
                .push("경험의 상황·과제·행동·결과 중 빠진 요소를 보완해보세요.".to_string()),
            None => improvement_areas
                .push("STAR 구조로 정리된 경험이 드러나지 않습니다.".to_string()),
        }

        if !report.repetition.is_empty() {
            improvement_areas.push("반복되는 단어와 문장 구조를 다양하게 바꿔보세요.".to_string());
        }

        Self {
            job_fit_band,
            verdict: job_fit_band.message().to_string(),
            star_counts,
            star_warning,
            best_episode_score,
            strengths,
            improvement_areas,
        }
    }
}
