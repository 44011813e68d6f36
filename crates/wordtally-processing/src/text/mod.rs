//! Text decoding and tokenization

pub mod analyzer;
pub mod decoder;

pub use analyzer::{analyze_bytes, TextAnalyzer, TOP_WORDS_LIMIT};
pub use decoder::{DecodeError, Utf8ChunkDecoder};
