//! Shared fixtures for integration tests

#![allow(dead_code)]

use selfintro_analyzer::processing::star::{
    ACTION_EXAMPLES, RESULT_EXAMPLES, SITUATION_EXAMPLES, TASK_EXAMPLES,
};
use selfintro_analyzer::profiles::ProfileStore;
use selfintro_analyzer::{Embedder, EmbeddingMatrix, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DIM: usize = 8;

pub const SITUATION: &str = "예기치 못한 문제가 발생했습니다.";
pub const TASK: &str = "저는 해결 역할을 맡았습니다.";
pub const ACTION: &str = "로그를 분석했습니다.";
pub const RESULT: &str = "문제를 해결했습니다.";

/// Embedder answering from a fixed table; unknown texts map to the zero vector.
pub struct LookupEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl LookupEmbedder {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    pub fn with_all(mut self, texts: &[&str], vector: Vec<f32>) -> Self {
        for text in texts {
            self = self.with(text, vector.clone());
        }
        self
    }
}

impl Embedder for LookupEmbedder {
    fn embed(&self, texts: &[String]) -> Result<EmbeddingMatrix> {
        if texts.is_empty() {
            return Ok(EmbeddingMatrix::empty());
        }
        EmbeddingMatrix::from_rows(
            texts
                .iter()
                .map(|t| self.table.get(t).cloned().unwrap_or_else(|| vec![0.0; DIM]))
                .collect(),
        )
    }

    fn model_name(&self) -> &str {
        "lookup"
    }

    fn dimension(&self) -> Option<usize> {
        Some(DIM)
    }
}

pub fn axis(index: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[index] = 1.0;
    v
}

/// STAR examples on axes 0..4, the four sample sentences on the same axes,
/// and the keywords 문제/해결 aligned with the situation and result sentences.
pub fn star_embedder() -> LookupEmbedder {
    LookupEmbedder::new()
        .with_all(&SITUATION_EXAMPLES, axis(0))
        .with_all(&TASK_EXAMPLES, axis(1))
        .with_all(&ACTION_EXAMPLES, axis(2))
        .with_all(&RESULT_EXAMPLES, axis(3))
        .with(SITUATION, axis(0))
        .with(TASK, axis(1))
        .with(ACTION, axis(2))
        .with(RESULT, axis(3))
        .with("문제", axis(0))
        .with("해결", axis(3))
}

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture_store() -> ProfileStore {
    ProfileStore::load_from_paths(&fixture("jobs.json"), &fixture("companies.json"), Some(DIM))
        .expect("fixture profiles should load")
}
