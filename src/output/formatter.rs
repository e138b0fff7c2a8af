//! Output formatters: console, JSON and Markdown

use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::{EssayReport, FitBand};
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for rendering an essay report
pub trait OutputFormatter {
    fn format_report(&self, report: &EssayReport) -> Result<String>;
}

/// Console formatter with optional colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
    include_recommendations: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
    detailed: bool,
    include_recommendations: bool,
}

/// Dispatches to the formatter for the requested format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self {
            use_colors,
            detailed,
            include_recommendations: true,
        }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score(&self, score: f32) -> String {
        let color = match FitBand::from_score(score) {
            FitBand::Strong => Color::Green,
            FitBand::Partial => Color::Yellow,
            FitBand::Weak => Color::Red,
        };
        self.colorize(&format!("{:.2}점", score), color)
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &EssayReport) -> Result<String> {
        let analysis = &report.analysis;
        let summary = &report.summary;
        let mut output = String::new();

        output.push_str(&self.format_header("자기소개서 분석 결과", 1));
        output.push_str(&format!(
            "직무: {} ({}) | 기업: {} ({})\n",
            analysis.job_name, analysis.job_id, analysis.company_name, analysis.company_id
        ));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms | Sentences: {}\n",
            analysis.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            analysis.processing_time_ms,
            analysis.sentence_count
        ));

        // Fit scores
        output.push_str(&self.format_header("전체 분석 요약", 2));
        let fits = &analysis.fit_scores;
        output.push_str(&format!("직무 적합도: {}\n", self.format_score(fits.job_fit)));
        output.push_str(&format!("기업 적합도: {}\n", self.format_score(fits.company_fit)));
        output.push_str(&format!(
            "직무-기업 정합성: {}\n",
            self.format_score(fits.job_company_alignment)
        ));
        output.push_str(&format!("{}\n", self.colorize(&summary.verdict, Color::Cyan)));

        for strength in &summary.strengths {
            output.push_str(&format!("  {} {}\n", self.colorize("+", Color::Green), strength));
        }
        for area in &summary.improvement_areas {
            output.push_str(&format!("  {} {}\n", self.colorize("-", Color::Red), area));
        }

        if analysis.is_empty() {
            return Ok(output);
        }

        // Keyword coverage
        let coverage = &analysis.keyword_coverage;
        output.push_str(&self.format_header("직무 핵심 역량 커버리지", 2));
        for group in &coverage.groups {
            output.push_str(&format!(
                "{}: {:.2}% ({}/{})\n",
                group.group.label(),
                group.coverage_score,
                group.matched.len(),
                group.total
            ));
        }
        output.push_str(&format!("전체 키워드 반영률: {:.2}%\n", coverage.overall_coverage));

        if !coverage.missing_keywords.is_empty() {
            output.push_str("부족한 핵심 요소: ");
            let missing: Vec<&str> = coverage
                .missing_keywords
                .iter()
                .take(5)
                .map(String::as_str)
                .collect();
            output.push_str(&self.colorize(&missing.join(", "), Color::Yellow));
            output.push('\n');
        }

        if self.detailed {
            for (keyword, evidence) in &coverage.matched_keywords {
                output.push_str(&format!(
                    "  {} {} ({:.3}) ← {}\n",
                    self.colorize("✓", Color::Green),
                    keyword,
                    evidence.similarity,
                    evidence.sentence
                ));
            }
        }

        if self.include_recommendations {
            let limit = if self.detailed { usize::MAX } else { 5 };
            for rec in coverage.recommendations.iter().take(limit) {
                output.push_str(&format!("  • {}\n", rec));
            }
        }

        // Repetition
        output.push_str(&self.format_header("반복 표현 분석", 2));
        if analysis.repetition.is_empty() {
            output.push_str("눈에 띄는 반복 표현이 없습니다.\n");
        }
        for (word, count) in &analysis.repetition.repeated_words {
            output.push_str(&format!("- '{}' : {}회\n", word, count));
        }
        for suggestion in &analysis.repetition.suggestions {
            output.push_str(&format!("  • {}\n", suggestion));
        }

        // STAR
        output.push_str(&self.format_header("STAR 구조 분석", 2));
        let counts = &summary.star_counts;
        output.push_str(&format!(
            "상황(S): {} | 과제(T): {} | 행동(A): {} | 결과(R): {}\n",
            counts.situation, counts.task, counts.action, counts.result
        ));
        if let Some(warning) = &summary.star_warning {
            output.push_str(&format!("{}\n", self.colorize(warning, Color::Yellow)));
        }

        for episode in &analysis.star_episodes {
            output.push_str(&self.format_header(
                &format!("에피소드 {} - {:.1}점", episode.index, episode.evaluation.score),
                3,
            ));
            if self.detailed {
                for (sentence, label) in episode.sentences.iter().zip(&episode.labels) {
                    output.push_str(&format!("  [{}] {}\n", label, sentence));
                }
            }
            for feedback in &episode.evaluation.feedback {
                output.push_str(&format!("  • {}\n", feedback));
            }
        }

        if self.detailed && !analysis.action_labels.is_empty() {
            output.push_str(&self.format_header("행동 유형", 3));
            for label in analysis.action_labels.iter().filter(|l| l.category.is_some()) {
                if let Some(category) = label.category {
                    output.push_str(&format!(
                        "  [{}] {} ({:.2})\n",
                        category.korean_name(),
                        label.sentence,
                        label.similarity
                    ));
                }
            }
        }

        Ok(output)
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &EssayReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool, detailed: bool) -> Self {
        Self {
            include_metadata,
            detailed,
            include_recommendations: true,
        }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &EssayReport) -> Result<String> {
        let analysis = &report.analysis;
        let summary = &report.summary;
        let fits = &analysis.fit_scores;
        let mut md = String::new();

        md.push_str("# 자기소개서 분석 결과\n\n");
        md.push_str(&format!(
            "**직무:** {} (`{}`)  \n**기업:** {} (`{}`)\n\n",
            analysis.job_name, analysis.job_id, analysis.company_name, analysis.company_id
        ));

        md.push_str("## 전체 분석 요약\n\n");
        md.push_str("| 항목 | 점수 |\n|---|---|\n");
        md.push_str(&format!("| 직무 적합도 | {:.2} |\n", fits.job_fit));
        md.push_str(&format!("| 기업 적합도 | {:.2} |\n", fits.company_fit));
        md.push_str(&format!("| 직무-기업 정합성 | {:.2} |\n\n", fits.job_company_alignment));
        md.push_str(&format!("> {}\n\n", summary.verdict));

        for strength in &summary.strengths {
            md.push_str(&format!("- ✅ {}\n", strength));
        }
        for area in &summary.improvement_areas {
            md.push_str(&format!("- ⚠️ {}\n", area));
        }
        md.push('\n');

        if !analysis.is_empty() {
            let coverage = &analysis.keyword_coverage;
            md.push_str("## 직무 핵심 역량 커버리지\n\n");
            md.push_str("| 역량 | 커버리지(%) | 매칭 |\n|---|---|---|\n");
            for group in &coverage.groups {
                md.push_str(&format!(
                    "| {} | {:.2} | {}/{} |\n",
                    group.group.label(),
                    group.coverage_score,
                    group.matched.len(),
                    group.total
                ));
            }
            md.push_str(&format!(
                "\n전체 키워드 반영률: **{:.2}%**\n\n",
                coverage.overall_coverage
            ));

            if self.include_recommendations && !coverage.recommendations.is_empty() {
                md.push_str("### 개선 제안 문장\n\n");
                for rec in &coverage.recommendations {
                    md.push_str(&format!("- {}\n", rec));
                }
                md.push('\n');
            }

            md.push_str("## 반복 표현 분석\n\n");
            for (word, count) in &analysis.repetition.repeated_words {
                md.push_str(&format!("- '{}' : {}회\n", word, count));
            }
            for suggestion in &analysis.repetition.suggestions {
                md.push_str(&format!("- {}\n", suggestion));
            }
            md.push('\n');

            md.push_str("## STAR 구조 분석\n\n");
            let counts = &summary.star_counts;
            md.push_str(&format!(
                "- 상황(S): {}문장\n- 과제(T): {}문장\n- 행동(A): {}문장\n- 결과(R): {}문장\n\n",
                counts.situation, counts.task, counts.action, counts.result
            ));
            if let Some(warning) = &summary.star_warning {
                md.push_str(&format!("> {}\n\n", warning));
            }
            for episode in &analysis.star_episodes {
                md.push_str(&format!(
                    "### 에피소드 {} ({:.1}점)\n\n",
                    episode.index, episode.evaluation.score
                ));
                if self.detailed {
                    for (sentence, label) in episode.sentences.iter().zip(&episode.labels) {
                        md.push_str(&format!("- `[{}]` {}\n", label, sentence));
                    }
                    md.push('\n');
                }
                for feedback in &episode.evaluation.feedback {
                    md.push_str(&format!("- {}\n", feedback));
                }
                md.push('\n');
            }
        }

        if self.include_metadata {
            md.push_str("---\n\n");
            md.push_str(&format!(
                "*Generated {} with {} ({:?} calibration) in {}ms*\n",
                analysis.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                analysis.model_info.embedding_model,
                analysis.model_info.calibration,
                analysis.processing_time_ms
            ));
        }

        Ok(md)
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false, true, true)
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata, detailed),
        }
    }

    /// Toggle recommendation sentences in console and Markdown output.
    pub fn with_recommendations(mut self, include: bool) -> Self {
        self.console_formatter.include_recommendations = include;
        self.markdown_formatter.include_recommendations = include;
        self
    }

    pub fn generate_report(&self, report: &EssayReport, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: OutputFormat, essay_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(essay_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty() && s != "-")
        .unwrap_or_else(|| "essay".to_string());

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    let extension = match format {
        OutputFormat::Console => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
    };
    format!("{}_analysis{}.{}", base_name, timestamp_suffix, extension)
}
