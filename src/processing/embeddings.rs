//! Sentence embeddings behind a pluggable `Embedder` interface

use crate::config::{Config, EmbeddingBackend};
use crate::error::{AnalyzerError, Result};
use log::{debug, info};
use model2vec_rs::model::StaticModel;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use once_cell::sync::OnceCell;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use unicode_segmentation::UnicodeSegmentation;

/// Turns texts into fixed-dimension vectors.
pub trait Embedder: Send + Sync {
    /// One row per input text. An empty input yields an empty `0 x 0` matrix.
    fn embed(&self, texts: &[String]) -> Result<EmbeddingMatrix>;

    fn model_name(&self) -> &str;

    /// Output dimension, once known.
    fn dimension(&self) -> Option<usize>;
}

/// Row-major `n x dim` matrix of embeddings.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Array2<f32>,
}

impl EmbeddingMatrix {
    pub fn empty() -> Self {
        Self {
            data: Array2::zeros((0, 0)),
        }
    }

    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let Some(dim) = rows.first().map(Vec::len) else {
            return Ok(Self::empty());
        };

        let n = rows.len();
        let mut flat = Vec::with_capacity(n * dim);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(AnalyzerError::DimensionMismatch {
                    context: format!("embedding row {}", i),
                    expected: dim,
                    found: row.len(),
                });
            }
            flat.extend(row);
        }

        let data = Array2::from_shape_vec((n, dim), flat)
            .map_err(|e| AnalyzerError::Embedding(format!("Invalid embedding shape: {}", e)))?;
        Ok(Self { data })
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.data.row(index)
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, f32>> {
        self.data.outer_iter()
    }

    /// Document vector: mean of all rows, `None` when there are no rows.
    pub fn mean(&self) -> Option<Array1<f32>> {
        if self.is_empty() {
            return None;
        }
        self.data.mean_axis(Axis(0))
    }
}

/// Build the embedder selected in the configuration.
pub fn embedder_from_config(config: &Config) -> Arc<dyn Embedder> {
    match config.models.backend {
        EmbeddingBackend::Model2Vec => Arc::new(Model2VecEmbedder::from_config(config)),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.models.hashing_dimension)),
    }
}

/// Default number of cached texts before the cache is reset.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Text to vector cache that is emptied once it reaches `capacity`.
#[derive(Debug)]
struct EmbeddingCache {
    entries: HashMap<String, Vec<f32>>,
    capacity: usize,
}

impl EmbeddingCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Distinct texts not yet cached, in sorted order. Resets a full cache first.
    fn missing(&mut self, texts: &[String]) -> Vec<String> {
        if self.entries.len() >= self.capacity {
            debug!("Embedding cache reached {} entries, clearing", self.entries.len());
            self.entries.clear();
        }

        let mut missing: Vec<String> = texts
            .iter()
            .filter(|t| !self.entries.contains_key(*t))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    fn insert(&mut self, text: String, vector: Vec<f32>) {
        self.entries.insert(text, vector);
    }

    fn get(&self, text: &str) -> Option<&Vec<f32>> {
        self.entries.get(text)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Model2Vec static embeddings. The model is loaded on first use and shared by
/// every later call.
pub struct Model2VecEmbedder {
    source: String,
    model_name: String,
    batch_size: usize,
    model: OnceCell<StaticModel>,
    dimension: OnceCell<usize>,
    cache: Option<Mutex<EmbeddingCache>>,
}

impl Model2VecEmbedder {
    pub fn new(source: impl Into<String>, batch_size: usize, enable_caching: bool) -> Self {
        let source = source.into();
        Self {
            model_name: source.clone(),
            source,
            batch_size: batch_size.max(1),
            model: OnceCell::new(),
            dimension: OnceCell::new(),
            cache: enable_caching.then(|| Mutex::new(EmbeddingCache::new(DEFAULT_CACHE_CAPACITY))),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut embedder = Self::new(
            config.embedding_model_source(),
            config.models.batch_size,
            config.processing.enable_caching,
        );
        embedder.model_name = config.models.default_embedding_model.clone();
        embedder
    }

    fn model(&self) -> Result<&StaticModel> {
        self.model.get_or_try_init(|| {
            let start_time = Instant::now();
            info!("Loading Model2Vec embedding model from: {}", self.source);

            let model = StaticModel::from_pretrained(&self.source, None, None, None).map_err(|e| {
                AnalyzerError::ModelLoading(format!("Failed to load {}: {}", self.source, e))
            })?;

            info!("Model loaded successfully in {:.2?}", start_time.elapsed());
            Ok(model)
        })
    }

    fn encode_uncached(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.model()?;
        let vectors = model.encode_with_args(texts, Some(512), self.batch_size);
        if vectors.len() != texts.len() {
            return Err(AnalyzerError::Embedding(format!(
                "Model returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        if let Some(first) = vectors.first() {
            let _ = self.dimension.set(first.len());
        }
        Ok(vectors)
    }
}

impl Embedder for Model2VecEmbedder {
    fn embed(&self, texts: &[String]) -> Result<EmbeddingMatrix> {
        if texts.is_empty() {
            return Ok(EmbeddingMatrix::empty());
        }

        let Some(cache) = &self.cache else {
            return EmbeddingMatrix::from_rows(self.encode_uncached(texts)?);
        };

        let mut cache = cache
            .lock()
            .map_err(|_| AnalyzerError::Embedding("Embedding cache lock poisoned".to_string()))?;

        let missing = cache.missing(texts);
        debug!(
            "Embedding {} texts ({} distinct uncached, {} cached entries)",
            texts.len(),
            missing.len(),
            cache.len()
        );

        if !missing.is_empty() {
            let vectors = self.encode_uncached(&missing)?;
            for (text, vector) in missing.into_iter().zip(vectors) {
                cache.insert(text, vector);
            }
        }

        let rows = texts
            .iter()
            .map(|t| {
                cache.get(t).cloned().ok_or_else(|| {
                    AnalyzerError::Embedding(format!("Missing embedding for text: {}", t))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        EmbeddingMatrix::from_rows(rows)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Known after the first successful encode.
    fn dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }
}

const HASH_SEED_K0: u64 = 0x5e1f_1a70_2b3c_4d5e;
const HASH_SEED_K1: u64 = 0xa1b2_c3d4_e5f6_0718;

/// Deterministic feature-hashing embedder over words and character bigrams.
/// Needs no model files; vectors are L2 normalized.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash_feature(&self, feature: &str) -> (usize, f32) {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        feature.hash(&mut hasher);
        let hash = hasher.finish();
        let index = (hash % self.dimension as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text.unicode_words() {
            let word = word.to_lowercase();
            let (idx, sign) = self.hash_feature(&word);
            vector[idx] += sign;

            let chars: Vec<char> = word.chars().collect();
            for pair in chars.windows(2) {
                let bigram: String = pair.iter().collect();
                let (idx, sign) = self.hash_feature(&format!("#{}", bigram));
                vector[idx] += 0.5 * sign;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, texts: &[String]) -> Result<EmbeddingMatrix> {
        if texts.is_empty() {
            return Ok(EmbeddingMatrix::empty());
        }
        EmbeddingMatrix::from_rows(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn model_name(&self) -> &str {
        "feature-hashing"
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Embedder that answers from a fixed table; unknown texts map to the zero vector.
    pub struct LookupEmbedder {
        pub dim: usize,
        table: HashMap<String, Vec<f32>>,
    }

    impl LookupEmbedder {
        pub fn new(dim: usize) -> Self {
            Self {
                dim,
                table: HashMap::new(),
            }
        }

        pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
            assert_eq!(vector.len(), self.dim);
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

    pub fn axis(dim: usize, index: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[index] = 1.0;
        v
    }

    impl Embedder for LookupEmbedder {
        fn embed(&self, texts: &[String]) -> Result<EmbeddingMatrix> {
            if texts.is_empty() {
                return Ok(EmbeddingMatrix::empty());
            }
            let rows = texts
                .iter()
                .map(|t| {
                    self.table
                        .get(t)
                        .cloned()
                        .unwrap_or_else(|| vec![0.0; self.dim])
                })
                .collect();
            EmbeddingMatrix::from_rows(rows)
        }

        fn model_name(&self) -> &str {
            "lookup"
        }

        fn dimension(&self) -> Option<usize> {
            Some(self.dim)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gives_empty_matrix() {
        let embedder = HashingEmbedder::new(32);
        let matrix = embedder.embed(&[]).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.dim(), 0);
        assert!(matrix.mean().is_none());
    }

    #[test]
    fn test_mean_of_rows() {
        let matrix = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let mean = matrix.mean().unwrap();
        assert_eq!(mean.to_vec(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::DimensionMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_hashing_embedder_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let texts = vec!["문제를 해결했습니다".to_string(), "데이터 분석".to_string()];
        let a = embedder.embed(&texts).unwrap();
        let b = embedder.embed(&texts).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.dim(), 64);

        let norm: f32 = a.row(0).iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cache_resets_when_full() {
        let mut cache = EmbeddingCache::new(2);
        let texts = vec!["가".to_string(), "나".to_string(), "가".to_string()];
        assert_eq!(cache.missing(&texts), vec!["가", "나"]);
        cache.insert("가".to_string(), vec![1.0]);
        cache.insert("나".to_string(), vec![2.0]);

        // full: the next request starts from an empty cache
        assert_eq!(cache.missing(&["가".to_string()]), vec!["가"]);
        assert_eq!(cache.len(), 0);
        cache.insert("가".to_string(), vec![1.0]);
        assert!(cache.missing(&["가".to_string()]).is_empty());
        assert_eq!(cache.get("가"), Some(&vec![1.0]));
    }

    #[test]
    fn test_model2vec_embedder_does_not_load_for_empty_input() {
        let embedder = Model2VecEmbedder::new("/nonexistent/model", 8, true);
        assert!(embedder.embed(&[]).unwrap().is_empty());
        assert!(embedder.dimension().is_none());
    }
}
