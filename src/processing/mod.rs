//! Text processing and analysis module

pub mod action_labels;
pub mod analyzer;
pub mod embeddings;
pub mod keyword_matcher;
pub mod repetition;
pub mod similarity;
pub mod star;
pub mod text_processor;
pub mod tokenizer;
