//! Situation/Task/Action/Result tagging and episode scoring

use crate::error::{AnalyzerError, Result};
use crate::processing::embeddings::{Embedder, EmbeddingMatrix};
use crate::processing::similarity::{cosine_similarity, round_to};
use log::debug;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SITUATION_EXAMPLES: [&str; 20] = [
    "프로젝트를 진행하던 중 예기치 못한 문제가 발생했습니다.",
    "팀 전체가 해결하기 어려운 상황에 직면했습니다.",
    "업무 환경이 급격히 변하면서 혼란이 있었습니다.",
    "초기 설계 단계에서 큰 오류가 발견되는 상황이었습니다.",
    "담당하던 기능에서 지속적인 장애가 발생했습니다.",
    "프로젝트 일정이 지연되는 문제가 있었습니다.",
    "사용자 수가 급증하여 서버가 불안정해졌습니다.",
    "팀 내 의사소통 부족으로 갈등이 생겼습니다.",
    "새로운 기술을 적용해야 하는 상황이었습니다.",
    "예상보다 복잡한 요구사항이 추가되었습니다.",
    "테스트 과정에서 치명적인 버그가 발견되었습니다.",
    "서비스 배포 직전 심각한 성능 저하가 발생했습니다.",
    "외부 API 변경으로 기능이 정상적으로 동작하지 않았습니다.",
    "기획 변경으로 전체 구조를 수정해야 하는 상황이었습니다.",
    "고객의 불만이 지속적으로 접수되는 상황이었습니다.",
    "데이터 손실 위험이 있는 문제가 발생했습니다.",
    "주요 담당자가 갑작스러운 부재로 프로젝트가 정체되었습니다.",
    "문제 해결을 위한 자료가 부족한 상황이었습니다.",
    "주어진 시간 대비 과업량이 과도하게 많은 상황이었습니다.",
    "프로젝트 방향성이 모호해 혼란이 있었습니다.",
];

pub const TASK_EXAMPLES: [&str; 20] = [
    "저는 이 프로젝트에서 백엔드 개발을 맡았습니다.",
    "제가 맡은 역할은 문제의 원인을 분석하는 일이었습니다.",
    "프로젝트 전체 구조를 개선하는 책임을 맡았습니다.",
    "저는 팀 내에서 데이터 처리 모듈을 담당했습니다.",
    "제 임무는 장애를 신속하게 해결하는 것이었습니다.",
    "저는 팀원 간 협업을 조율하는 역할을 맡았습니다.",
    "제가 담당한 업무는 성능 개선을 위한 분석 작업이었습니다.",
    "저에게 주어진 목표는 기능 안정성을 확보하는 것이었습니다.",
    "저는 사용자 요구사항을 기술적으로 해석하는 임무를 맡았습니다.",
    "저는 프로젝트 일정 관리를 담당했습니다.",
    "제가 맡은 역할은 테스트 자동화 환경을 구축하는 것이었습니다.",
    "저는 오류 로그를 정리하고 패턴을 분석하는 업무를 담당했습니다.",
    "제 과제는 문제 해결 방안을 제시하는 일이었습니다.",
    "저는 서비스 품질을 높이기 위한 개선안을 도출하는 임무를 맡았습니다.",
    "제가 수행해야 할 목표는 배포 안정성 확보였습니다.",
    "저는 팀에서 기술적 의사결정을 지원하는 역할을 맡았습니다.",
    "제가 맡은 업무는 신규 기능 개발과 유지보수였습니다.",
    "저는 데이터 정확성을 검증하는 역할을 담당했습니다.",
    "제 임무는 문제 상황을 팀에 명확히 공유하는 것이었습니다.",
    "저는 프로젝트의 핵심 기능을 책임지는 역할을 맡았습니다.",
];

pub const ACTION_EXAMPLES: [&str; 20] = [
    "문제를 해결하기 위해 로그를 면밀히 분석했습니다.",
    "서비스의 안정성을 높이기 위해 코드를 재구성했습니다.",
    "장애 원인을 파악하여 구조적 개선을 수행했습니다.",
    "팀원들과 소통하며 해결책을 조율했습니다.",
    "데이터 패턴을 분석하여 오류 지점을 찾았습니다.",
    "테스트 코드를 작성해 문제 재발을 방지했습니다.",
    "이슈를 추적하기 위해 모니터링 시스템을 구축했습니다.",
    "새로운 알고리즘을 설계하여 성능을 개선했습니다.",
    "코드 리뷰를 진행하며 품질을 향상시켰습니다.",
    "기능 구현을 위해 여러 기술적 시도를 수행했습니다.",
    "문제 구간을 직접 디버깅하며 해결책을 찾았습니다.",
    "기존 시스템의 취약점을 분석해 보완했습니다.",
    "사용자 피드백을 반영하여 기능을 수정했습니다.",
    "팀이 사용할 문서화를 작성해 협업 효율을 높였습니다.",
    "프로젝트 구조를 재설계해 유지보수성을 높였습니다.",
    "원인을 빠르게 파악하기 위해 반복 테스트를 진행했습니다.",
    "새로운 기술을 도입하기 위해 학습하고 적용했습니다.",
    "성능 병목을 찾아 개선 작업을 수행했습니다.",
    "문제 발생 가능성을 줄이기 위해 예외 처리를 강화했습니다.",
    "협업을 위해 Git Flow 전략을 활용했습니다.",
];

pub const RESULT_EXAMPLES: [&str; 20] = [
    "그 결과 문제를 성공적으로 해결할 수 있었습니다.",
    "서비스의 안정성이 크게 향상되었습니다.",
    "프로젝트를 일정에 맞춰 마무리할 수 있었습니다.",
    "오류율이 눈에 띄게 감소했습니다.",
    "사용자 만족도가 증가했습니다.",
    "팀의 업무 효율이 향상되었습니다.",
    "새로운 기능이 정상적으로 배포되었습니다.",
    "장애가 재발하지 않는 결과를 얻었습니다.",
    "전체 성능이 이전보다 크게 향상되었습니다.",
    "협업 과정이 더 원활해졌습니다.",
    "서비스 로딩 시간이 개선되었습니다.",
    "문제 해결 속도가 빨라졌습니다.",
    "기능이 안정적으로 운영되었습니다.",
    "데이터 정확성이 높아졌습니다.",
    "팀 내 의사소통이 개선되었습니다.",
    "업무 프로세스가 간소화되었습니다.",
    "모든 테스트를 성공적으로 통과했습니다.",
    "사용자 불만이 감소했습니다.",
    "프로젝트 목표를 달성했습니다.",
    "팀의 기술적 역량이 향상되었습니다.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StarLabel {
    S,
    T,
    A,
    R,
    #[serde(rename = "O")]
    Other,
}

impl StarLabel {
    /// Categories in tie-breaking order.
    pub const CATEGORIES: [StarLabel; 4] = [Self::S, Self::T, Self::A, Self::R];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::T => "T",
            Self::A => "A",
            Self::R => "R",
            Self::Other => "O",
        }
    }
}

impl fmt::Display for StarLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mean vector of each category's canonical sentences. Built once, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct StarCentroids {
    situation: Array1<f32>,
    task: Array1<f32>,
    action: Array1<f32>,
    result: Array1<f32>,
}

impl StarCentroids {
    /// Centroids of the built-in example sentences.
    pub fn build(embedder: &dyn Embedder) -> Result<Self> {
        Self::from_examples(
            embedder,
            &SITUATION_EXAMPLES,
            &TASK_EXAMPLES,
            &ACTION_EXAMPLES,
            &RESULT_EXAMPLES,
        )
    }

    pub fn from_examples(
        embedder: &dyn Embedder,
        situation: &[&str],
        task: &[&str],
        action: &[&str],
        result: &[&str],
    ) -> Result<Self> {
        let centroid = |label: StarLabel, examples: &[&str]| -> Result<Array1<f32>> {
            let texts: Vec<String> = examples.iter().map(|s| s.to_string()).collect();
            embedder.embed(&texts)?.mean().ok_or_else(|| {
                AnalyzerError::AnalysisFailed(format!(
                    "No example sentences for STAR category {}",
                    label
                ))
            })
        };

        Self::from_vectors(
            centroid(StarLabel::S, situation)?,
            centroid(StarLabel::T, task)?,
            centroid(StarLabel::A, action)?,
            centroid(StarLabel::R, result)?,
        )
    }

    pub fn from_vectors(
        situation: Array1<f32>,
        task: Array1<f32>,
        action: Array1<f32>,
        result: Array1<f32>,
    ) -> Result<Self> {
        let dim = situation.len();
        for (label, vector) in [
            (StarLabel::T, &task),
            (StarLabel::A, &action),
            (StarLabel::R, &result),
        ] {
            if vector.len() != dim {
                return Err(AnalyzerError::DimensionMismatch {
                    context: format!("STAR centroid {}", label),
                    expected: dim,
                    found: vector.len(),
                });
            }
        }

        Ok(Self {
            situation,
            task,
            action,
            result,
        })
    }

    pub fn dimension(&self) -> usize {
        self.situation.len()
    }

    pub fn centroid(&self, label: StarLabel) -> Option<ArrayView1<'_, f32>> {
        match label {
            StarLabel::S => Some(self.situation.view()),
            StarLabel::T => Some(self.task.view()),
            StarLabel::A => Some(self.action.view()),
            StarLabel::R => Some(self.result.view()),
            StarLabel::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarTag {
    pub sentence: String,
    pub label: StarLabel,
    pub similarity: f32,
}

/// Nearest-centroid sentence classifier.
pub struct StarTagger<'a> {
    centroids: &'a StarCentroids,
    other_threshold: f32,
}

impl<'a> StarTagger<'a> {
    pub fn new(centroids: &'a StarCentroids, other_threshold: f32) -> Self {
        Self {
            centroids,
            other_threshold,
        }
    }

    pub fn classify(&self, vector: ArrayView1<f32>) -> Result<(StarLabel, f32)> {
        let mut best = (StarLabel::Other, f32::NEG_INFINITY);
        for label in StarLabel::CATEGORIES {
            if let Some(centroid) = self.centroids.centroid(label) {
                let sim = cosine_similarity(vector, centroid)?;
                if sim > best.1 {
                    best = (label, sim);
                }
            }
        }

        if best.1 < self.other_threshold {
            Ok((StarLabel::Other, best.1))
        } else {
            Ok(best)
        }
    }

    pub fn tag(&self, sentences: &[String], embeddings: &EmbeddingMatrix) -> Result<Vec<StarTag>> {
        if sentences.len() != embeddings.len() {
            return Err(AnalyzerError::AnalysisFailed(format!(
                "{} sentence embeddings for {} sentences",
                embeddings.len(),
                sentences.len()
            )));
        }

        sentences
            .iter()
            .zip(embeddings.rows())
            .map(|(sentence, vector)| {
                let (label, similarity) = self.classify(vector)?;
                Ok(StarTag {
                    sentence: sentence.clone(),
                    label,
                    similarity: round_to(similarity, 4),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarEvaluation {
    pub score: f32,
    pub has_situation: bool,
    pub has_task: bool,
    pub has_action: bool,
    pub has_result: bool,
    pub action_count: usize,
    pub result_count: usize,
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarEpisode {
    /// 1-based position in the essay.
    pub index: usize,
    pub sentences: Vec<String>,
    pub labels: Vec<StarLabel>,
    pub evaluation: StarEvaluation,
}

#[derive(Debug, Default)]
enum EpisodeState {
    #[default]
    Idle,
    Open {
        sentences: Vec<String>,
        labels: Vec<StarLabel>,
    },
}

struct EpisodeFold {
    state: EpisodeState,
    min_sentences: usize,
    closed: Vec<(Vec<String>, Vec<StarLabel>)>,
}

impl EpisodeFold {
    fn new(min_sentences: usize) -> Self {
        Self {
            state: EpisodeState::Idle,
            min_sentences,
            closed: Vec::new(),
        }
    }

    fn step(&mut self, sentence: &str, label: StarLabel) {
        if sentence.trim().is_empty() {
            return;
        }

        let state = std::mem::take(&mut self.state);
        self.state = match (state, label) {
            (EpisodeState::Idle, StarLabel::Other) => EpisodeState::Idle,
            (open @ EpisodeState::Open { .. }, StarLabel::S) => {
                self.close(open);
                Self::open(sentence, label)
            }
            (EpisodeState::Idle, _) => Self::open(sentence, label),
            (
                EpisodeState::Open {
                    mut sentences,
                    mut labels,
                },
                _,
            ) => {
                sentences.push(sentence.to_string());
                labels.push(label);
                EpisodeState::Open { sentences, labels }
            }
        };
    }

    fn open(sentence: &str, label: StarLabel) -> EpisodeState {
        EpisodeState::Open {
            sentences: vec![sentence.to_string()],
            labels: vec![label],
        }
    }

    fn close(&mut self, state: EpisodeState) {
        if let EpisodeState::Open { sentences, labels } = state {
            if sentences.len() >= self.min_sentences {
                self.closed.push((sentences, labels));
            }
        }
    }

    fn finish(mut self) -> Vec<(Vec<String>, Vec<StarLabel>)> {
        let state = std::mem::take(&mut self.state);
        self.close(state);
        self.closed
    }
}

/// Group tagged sentences into episodes; each `S` starts a new one.
pub fn group_episodes(tags: &[StarTag], min_sentences: usize) -> Vec<StarEpisode> {
    let mut fold = EpisodeFold::new(min_sentences);
    for tag in tags {
        fold.step(&tag.sentence, tag.label);
    }

    let episodes: Vec<StarEpisode> = fold
        .finish()
        .into_iter()
        .enumerate()
        .map(|(i, (sentences, labels))| StarEpisode {
            index: i + 1,
            evaluation: evaluate_episode(&labels),
            sentences,
            labels,
        })
        .collect();

    debug!("Grouped {} tagged sentences into {} episodes", tags.len(), episodes.len());
    episodes
}

/// 25 points per category present, +5 each for two or more actions or results.
pub fn evaluate_episode(labels: &[StarLabel]) -> StarEvaluation {
    let has = |label: StarLabel| labels.contains(&label);
    let has_situation = has(StarLabel::S);
    let has_task = has(StarLabel::T);
    let has_action = has(StarLabel::A);
    let has_result = has(StarLabel::R);

    let action_count = labels.iter().filter(|l| **l == StarLabel::A).count();
    let result_count = labels.iter().filter(|l| **l == StarLabel::R).count();

    let present = [has_situation, has_task, has_action, has_result]
        .iter()
        .filter(|p| **p)
        .count();
    let mut score = present as f32 * 25.0;
    if action_count >= 2 {
        score += 5.0;
    }
    if result_count >= 2 {
        score += 5.0;
    }
    let score = round_to(score.min(100.0), 1);

    let mut feedback = Vec::new();
    if !has_situation {
        feedback.push(
            "상황(S)이 드러나지 않아, 언제·어디서·무슨 계기로 시작된 경험인지 보완하면 좋습니다."
                .to_string(),
        );
    }
    if !has_task {
        feedback.push(
            "역할/목표(T)가 약해, 내가 맡은 책임과 구체적인 목표를 명확히 쓰면 좋습니다.".to_string(),
        );
    }
    if !has_action {
        feedback.push(
            "행동(A)이 부족해, 실제로 무엇을 어떻게 했는지를 단계별로 풀어 쓰면 좋습니다."
                .to_string(),
        );
    }
    if !has_result {
        feedback.push(
            "결과(R)가 없거나 약해, 숫자·변화·배운 점 등을 통해 성과를 명확히 드러내면 좋습니다."
                .to_string(),
        );
    }
    if has_action && has_result && score >= 75.0 {
        feedback.push(
            "행동과 결과가 잘 연결된 STAR 구조입니다. 이 경험은 자소서 핵심 카드로 활용할 수 있습니다."
                .to_string(),
        );
    }

    StarEvaluation {
        score,
        has_situation,
        has_task,
        has_action,
        has_result,
        action_count,
        result_count,
        feedback,
    }
}

/// Per-label sentence counts over a whole essay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarLabelCounts {
    pub situation: usize,
    pub task: usize,
    pub action: usize,
    pub result: usize,
    pub other: usize,
}

impl StarLabelCounts {
    pub fn from_tags(tags: &[StarTag]) -> Self {
        tags.iter().fold(Self::default(), |mut counts, tag| {
            match tag.label {
                StarLabel::S => counts.situation += 1,
                StarLabel::T => counts.task += 1,
                StarLabel::A => counts.action += 1,
                StarLabel::R => counts.result += 1,
                StarLabel::Other => counts.other += 1,
            }
            counts
        })
    }

    /// Fewer than two action or result sentences.
    pub fn needs_more_action_or_result(&self) -> bool {
        self.action < 2 || self.result < 2
    }
}
