//! Rule-based Korean word tokenization
//!
//! Words come from Unicode word segmentation. A trailing postposition (조사) is
//! split off the stem, and words ending in a verbal or adjectival ending are
//! classified as predicates so that frequency analysis only sees content words.

use unicode_segmentation::UnicodeSegmentation;

/// Postpositions, longest first so that `에서도` wins over `도`.
const PARTICLES: &[&str] = &[
    "에서부터", "으로부터", "에서도", "에서는", "에게서", "으로서", "으로써", "이라는",
    "이라고", "에서", "에게", "한테", "으로", "까지", "부터", "처럼", "보다", "마다",
    "이나", "라는", "에도", "에는", "로서", "로써", "과의", "와의", "이며", "은", "는",
    "이", "가", "을", "를", "의", "에", "와", "과", "도", "로", "만",
];

const PREDICATE_ENDINGS: &[&str] = &[
    "습니다", "니다", "었다", "았다", "였다", "했다", "한다", "된다", "는다", "었고",
    "았고", "였고", "했고", "했으며", "하며", "하고", "하여", "해서", "하면", "하는",
    "되는", "되어", "했던", "었던", "으며", "면서", "지만", "어서", "아서", "겠다",
    "하기", "해야", "시켜", "시킨",
];

const STOPWORDS: &[&str] = &[
    "저는", "제가", "저의", "저를", "저희", "나는", "내가", "또한", "그리고", "하지만",
    "그래서", "따라서", "그러나", "통해", "위해", "대한", "대해", "이러한", "그러한",
    "이런", "그런", "해당", "다른", "다양한", "많은", "모든", "가장", "매우", "함께",
    "더욱", "정말", "특히", "바로", "직접",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Content,
    Predicate,
    Stopword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    pub stem: String,
    pub particle: Option<&'static str>,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, Default)]
pub struct KoreanTokenizer;

impl KoreanTokenizer {
    pub fn new() -> Self {
        Self
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        text.unicode_words().map(|word| self.classify(word)).collect()
    }

    fn classify(&self, word: &str) -> Token {
        let surface = word.to_lowercase();

        if STOPWORDS.contains(&surface.as_str()) {
            return Token {
                stem: surface.clone(),
                surface,
                particle: None,
                kind: TokenKind::Stopword,
            };
        }

        if PREDICATE_ENDINGS
            .iter()
            .any(|ending| surface.ends_with(ending))
        {
            return Token {
                stem: surface.clone(),
                surface,
                particle: None,
                kind: TokenKind::Predicate,
            };
        }

        let (stem, particle) = split_particle(&surface);
        let kind = if STOPWORDS.contains(&stem.as_str()) {
            TokenKind::Stopword
        } else {
            TokenKind::Content
        };

        Token {
            surface,
            stem,
            particle,
            kind,
        }
    }

    /// Particle-stripped content words of at least two characters.
    pub fn content_words(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .into_iter()
            .filter(|t| t.kind == TokenKind::Content && t.stem.chars().count() >= 2)
            .map(|t| t.stem)
            .collect()
    }

    /// Morpheme-like units in reading order: stems and particles as separate items.
    pub fn morphemes(&self, text: &str) -> Vec<String> {
        let mut morphemes = Vec::new();
        for token in self.tokenize(text) {
            match token.particle {
                Some(particle) => {
                    morphemes.push(token.stem);
                    morphemes.push(particle.to_string());
                }
                None => morphemes.push(token.stem),
            }
        }
        morphemes
    }
}

fn split_particle(word: &str) -> (String, Option<&'static str>) {
    let word_len = word.chars().count();
    for particle in PARTICLES {
        if !word.ends_with(particle) {
            continue;
        }
        let particle_len = particle.chars().count();
        let stem_len = word_len - particle_len;
        // single-syllable particles are only split from stems of two or more syllables
        let min_stem = if particle_len == 1 { 2 } else { 1 };
        if stem_len >= min_stem {
            let stem = &word[..word.len() - particle.len()];
            return (stem.to_string(), Some(particle));
        }
    }
    (word.to_string(), None)
}
