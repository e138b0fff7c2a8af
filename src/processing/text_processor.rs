//! Essay cleaning and sentence segmentation

use crate::config::ProcessingConfig;
use crate::error::Result;
use crate::processing::tokenizer::KoreanTokenizer;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Archaic or written-report endings rewritten to their contemporary form, applied in order.
const LEXICAL_RULES: &[(&str, &str)] = &[
    ("수행하였습니다", "수행했습니다"),
    ("하였습니다", "했습니다"),
    ("하였으며", "했으며"),
    ("하였고", "했고"),
    ("하였다", "했다"),
    ("해결함으로써", "해결하여"),
];

/// Hook for an external spelling service.
pub trait SpellCorrector: Send + Sync {
    fn correct(&self, text: &str) -> Result<String>;
}

pub struct TextProcessor {
    entity_regex: Regex,
    inline_space_regex: Regex,
    newline_regex: Regex,
    line_end_regex: Regex,
    noise_regex: Regex,
    tokenizer: KoreanTokenizer,
    spell_corrector: Option<Box<dyn SpellCorrector>>,
    spell_check: bool,
    morph_normalize: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEssay {
    pub original: String,
    pub cleaned_text: String,
    pub sentences: Vec<String>,
    /// Space-separated morphemes of the cleaned text, when enabled.
    pub morph_normalized_text: Option<String>,
}

impl NormalizedEssay {
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        let entity_regex = Regex::new(r"&(?:nbsp|emsp|ensp);").expect("Invalid entity regex");
        let inline_space_regex = Regex::new(r"[^\S\n]+").expect("Invalid whitespace regex");
        let newline_regex = Regex::new(r"[^\S\n]*\n\s*").expect("Invalid newline regex");
        let line_end_regex =
            Regex::new(r"([가-힣0-9A-Za-z])\n").expect("Invalid line ending regex");
        let noise_regex = Regex::new(r"[^가-힣0-9A-Za-z\s.,!?]").expect("Invalid noise regex");

        Self {
            entity_regex,
            inline_space_regex,
            newline_regex,
            line_end_regex,
            noise_regex,
            tokenizer: KoreanTokenizer::new(),
            spell_corrector: None,
            spell_check: false,
            morph_normalize: false,
        }
    }

    pub fn with_options(config: &ProcessingConfig) -> Self {
        let mut processor = Self::new();
        processor.spell_check = config.spell_check;
        processor.morph_normalize = config.morph_normalize;
        processor
    }

    pub fn with_spell_corrector(mut self, corrector: Box<dyn SpellCorrector>) -> Self {
        self.spell_corrector = Some(corrector);
        self
    }

    /// Clean the essay and split it into sentences. Never fails: optional steps
    /// that cannot run leave the text unchanged.
    pub fn normalize(&self, text: &str) -> NormalizedEssay {
        let mut cleaned = self.clean_text(text);
        cleaned = apply_lexical_rules(&cleaned);
        cleaned = self.correct_spelling(cleaned);

        let sentences = split_sentences(&cleaned);
        debug!("Normalized essay into {} sentences", sentences.len());

        let morph_normalized_text = if self.morph_normalize {
            Some(self.tokenizer.morphemes(&cleaned).join(" "))
        } else {
            None
        };

        NormalizedEssay {
            original: text.to_string(),
            cleaned_text: cleaned,
            sentences,
            morph_normalized_text,
        }
    }

    /// Whitespace cleanup, implicit line terminators and character filtering.
    pub fn clean_text(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let text = self.entity_regex.replace_all(&text, " ");
        let text = self.collapse_whitespace(&text);
        let text = self.line_end_regex.replace_all(&text, "${1}.\n");
        let text = self.noise_regex.replace_all(&text, " ");
        self.collapse_whitespace(&text)
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        let text = self.inline_space_regex.replace_all(text, " ");
        let text = self.newline_regex.replace_all(&text, "\n");
        text.trim().to_string()
    }

    fn correct_spelling(&self, text: String) -> String {
        if !self.spell_check {
            return text;
        }
        match &self.spell_corrector {
            Some(corrector) => match corrector.correct(&text) {
                Ok(corrected) => corrected,
                Err(e) => {
                    warn!("Spell correction failed, keeping original text: {}", e);
                    text
                }
            },
            None => {
                debug!("Spell correction enabled but no corrector is installed");
                text
            }
        }
    }
}

fn apply_lexical_rules(text: &str) -> String {
    LEXICAL_RULES
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Break after `.`, `!` or `?` followed by whitespace, and at every newline.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            flush_sentence(&mut current, &mut sentences);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(false, |n| n.is_whitespace()) {
            flush_sentence(&mut current, &mut sentences);
        }
    }
    flush_sentence(&mut current, &mut sentences);

    sentences
}

/// Fragments without a letter or digit (Hangul included) are dropped.
fn flush_sentence(current: &mut String, sentences: &mut Vec<String>) {
    let trimmed = current.trim();
    if trimmed.chars().any(char::is_alphanumeric) {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;

    #[test]
    fn test_splits_on_terminators() {
        let processor = TextProcessor::new();
        let essay = processor.normalize("문제가 발생했습니다. 원인을 찾았습니다! 해결했을까요? 네");
        assert_eq!(
            essay.sentences,
            vec!["문제가 발생했습니다.", "원인을 찾았습니다!", "해결했을까요?", "네"]
        );
    }

    #[test]
    fn test_line_breaks_become_sentence_boundaries() {
        let processor = TextProcessor::new();
        let essay = processor.normalize("지원 동기\n\n\n저는 개발자입니다");
        assert_eq!(essay.sentences, vec!["지원 동기.", "저는 개발자입니다"]);
        assert_eq!(essay.cleaned_text, "지원 동기.\n저는 개발자입니다");
    }

    #[test]
    fn test_punctuation_fragments_are_not_sentences() {
        assert!(split_sentences("!!! ??? ...").is_empty());
        assert_eq!(
            split_sentences("좋았습니다. ... 다시 도전했습니다!\n?!"),
            vec!["좋았습니다.", "다시 도전했습니다!"]
        );

        let processor = TextProcessor::new();
        assert!(processor.normalize("!!! ??? ...").is_empty());
    }

    #[test]
    fn test_removes_noise_and_entities() {
        let processor = TextProcessor::new();
        let cleaned = processor.clean_text("성과를&nbsp;★30%★   개선했습니다 :)");
        assert_eq!(cleaned, "성과를 30 개선했습니다");
    }

    #[test]
    fn test_applies_lexical_rules() {
        let processor = TextProcessor::new();
        let essay = processor.normalize("프로젝트를 수행하였습니다. 오류를 해결함으로써 배포하였다.");
        assert_eq!(essay.cleaned_text, "프로젝트를 수행했습니다. 오류를 해결하여 배포했다.");
    }

    #[test]
    fn test_empty_input_yields_no_sentences() {
        let processor = TextProcessor::new();
        assert!(processor.normalize("").is_empty());
        assert!(processor.normalize("   \n\t ").is_empty());
        assert!(processor.normalize("★★★").is_empty());
    }

    struct FailingCorrector;

    impl SpellCorrector for FailingCorrector {
        fn correct(&self, _text: &str) -> Result<String> {
            Err(AnalyzerError::TextProcessing("service unavailable".to_string()))
        }
    }

    #[test]
    fn test_failing_spell_corrector_is_a_no_op() {
        let config = ProcessingConfig {
            spell_check: true,
            morph_normalize: true,
            enable_caching: false,
        };
        let processor =
            TextProcessor::with_options(&config).with_spell_corrector(Box::new(FailingCorrector));
        let essay = processor.normalize("데이터를 분석했습니다.");
        assert_eq!(essay.sentences, vec!["데이터를 분석했습니다."]);
        assert_eq!(
            essay.morph_normalized_text.as_deref(),
            Some("데이터 를 분석했습니다")
        );
    }
}
