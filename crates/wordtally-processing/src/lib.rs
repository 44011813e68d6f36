//! Wordtally Processing Library
//!
//! Streaming word-frequency analysis over chunked UTF-8 input. Results do not
//! depend on where chunk boundaries fall, including inside multi-byte characters
//! and inside words.

pub mod pipeline;
pub mod text;

pub use pipeline::{analyze_stream, StreamAnalysisError};
pub use text::{DecodeError, TextAnalyzer, Utf8ChunkDecoder};
