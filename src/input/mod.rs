//! Essay input: file type detection, text extraction and caching

pub mod file_detector;
pub mod manager;
pub mod text_extractor;

pub use manager::InputManager;
