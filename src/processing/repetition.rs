//! Frequency-based detection of repeated words, phrases and sentence shapes

use crate::config::RepetitionConfig;
use crate::processing::tokenizer::KoreanTokenizer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

static SKELETON_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s*|\n").expect("Invalid skeleton split regex"));
static CONTENT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[가-힣0-9]+").expect("Invalid content run regex"));

const STRUCTURE_SUGGESTION: &str =
    "유사한 문장 구조가 반복됩니다. 문장 구조를 다양하게 작성하면 더 자연스러워집니다.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepetitionReport {
    pub repeated_words: BTreeMap<String, usize>,
    pub repeated_phrases: BTreeMap<String, usize>,
    pub repeated_skeletons: BTreeMap<String, usize>,
    pub suggestions: Vec<String>,
}

impl RepetitionReport {
    pub fn is_empty(&self) -> bool {
        self.repeated_words.is_empty()
            && self.repeated_phrases.is_empty()
            && self.repeated_skeletons.is_empty()
    }
}

pub struct RepetitionAnalyzer {
    tokenizer: KoreanTokenizer,
    config: RepetitionConfig,
}

impl Default for RepetitionAnalyzer {
    fn default() -> Self {
        Self::new(RepetitionConfig::default())
    }
}

impl RepetitionAnalyzer {
    pub fn new(config: RepetitionConfig) -> Self {
        Self {
            tokenizer: KoreanTokenizer::new(),
            config,
        }
    }

    pub fn analyze(&self, text: &str) -> RepetitionReport {
        if text.trim().is_empty() {
            return RepetitionReport::default();
        }

        let repeated_words = at_least(
            count(self.tokenizer.content_words(text)),
            self.config.word_threshold,
        );
        let repeated_phrases = at_least(self.phrase_counts(text), self.config.phrase_threshold);
        let repeated_skeletons = at_least(skeleton_counts(text), self.config.skeleton_threshold);

        let mut suggestions = Vec::new();
        for (word, n) in &repeated_words {
            suggestions.push(format!(
                "단어 '{}'가 {}회 반복됩니다. 표현을 다양화하거나 구체적 사례로 바꾸는 것을 추천합니다.",
                word, n
            ));
        }
        for (phrase, n) in &repeated_phrases {
            suggestions.push(format!(
                "구절 '{}'가 {}회 반복됩니다. 같은 문장이 반복되면 설득력이 떨어질 수 있습니다.",
                phrase, n
            ));
        }
        if !repeated_skeletons.is_empty() {
            suggestions.push(STRUCTURE_SUGGESTION.to_string());
        }

        RepetitionReport {
            repeated_words,
            repeated_phrases,
            repeated_skeletons,
            suggestions,
        }
    }

    fn phrase_counts(&self, text: &str) -> HashMap<String, usize> {
        let morphemes: Vec<String> = self
            .tokenizer
            .morphemes(text)
            .into_iter()
            .filter(|m| m.chars().count() >= 2)
            .collect();

        let mut counts = HashMap::new();
        for n in self.config.min_ngram..=self.config.max_ngram {
            if n == 0 || morphemes.len() < n {
                continue;
            }
            for window in morphemes.windows(n) {
                *counts.entry(window.join(" ")).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Sentence with every Hangul/digit run replaced by `X`.
pub fn sentence_skeleton(sentence: &str) -> String {
    CONTENT_RUN.replace_all(sentence.trim(), "X").into_owned()
}

fn skeleton_counts(text: &str) -> HashMap<String, usize> {
    SKELETON_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(sentence_skeleton)
        .fold(HashMap::new(), |mut counts, skeleton| {
            *counts.entry(skeleton).or_insert(0) += 1;
            counts
        })
}

fn count(items: Vec<String>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

fn at_least(counts: HashMap<String, usize>, threshold: usize) -> BTreeMap<String, usize> {
    counts.into_iter().filter(|(_, n)| *n >= threshold).collect()
}
