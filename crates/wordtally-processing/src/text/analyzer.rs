//! Word-frequency analysis.
//!
//! A word is a maximal run of Unicode letters (`\p{L}`) after per-character lower
//! casing. Digits, punctuation and whitespace separate words and are dropped.
//!
//! The last word of a chunk is not counted while it touches the end of the decoded
//! text, because the next chunk may continue it. It is carried over, prepended to
//! the next chunk's text, and counted once a separator or the end of input proves
//! it complete.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use wordtally_core::{AnalysisResult, WordCount};

use super::decoder::{DecodeError, Utf8ChunkDecoder};

/// Number of entries reported in `top10_words`.
pub const TOP_WORDS_LIMIT: usize = 10;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}+").expect("word pattern is a valid regex"));

/// Streaming analyzer. Feed chunks in arrival order, then call [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct TextAnalyzer {
    decoder: Utf8ChunkDecoder,
    carry: String,
    frequencies: HashMap<String, u64>,
    total_words: u64,
    total_chars: u64,
}

impl TextAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        let mut decoded = String::new();
        self.decoder.decode(chunk, &mut decoded)?;
        if decoded.is_empty() {
            return Ok(());
        }

        let mut text = std::mem::take(&mut self.carry);
        text.extend(decoded.chars().flat_map(char::to_lowercase));
        self.tokenize(&text);
        Ok(())
    }

    fn tokenize(&mut self, text: &str) {
        let mut matches = WORD_PATTERN.find_iter(text).peekable();
        while let Some(word) = matches.next() {
            if matches.peek().is_none() && word.end() == text.len() {
                self.carry = word.as_str().to_string();
                return;
            }
            self.record(word.as_str());
        }
    }

    fn record(&mut self, word: &str) {
        self.total_words += 1;
        self.total_chars += word.chars().count() as u64;
        match self.frequencies.get_mut(word) {
            Some(count) => *count += 1,
            None => {
                self.frequencies.insert(word.to_string(), 1);
            }
        }
    }

    /// Flush the decoder and any carried word, and produce the statistics.
    pub fn finish(mut self) -> Result<AnalysisResult, DecodeError> {
        self.decoder.finish()?;
        let carry = std::mem::take(&mut self.carry);
        if !carry.is_empty() {
            self.record(&carry);
        }

        let avg_word_length = if self.total_words == 0 {
            0.0
        } else {
            round2(self.total_chars as f64 / self.total_words as f64)
        };

        let mut ranked: Vec<(String, u64)> = self.frequencies.into_iter().collect();
        let unique_words = ranked.len() as u64;
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(TOP_WORDS_LIMIT);

        Ok(AnalysisResult {
            total_words: self.total_words,
            unique_words,
            avg_word_length,
            top10_words: ranked
                .into_iter()
                .map(|(word, count)| WordCount { word, count })
                .collect(),
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Analyze an in-memory buffer in one pass.
pub fn analyze_bytes(bytes: &[u8]) -> Result<AnalysisResult, DecodeError> {
    let mut analyzer = TextAnalyzer::new();
    analyzer.feed(bytes)?;
    analyzer.finish()
}
