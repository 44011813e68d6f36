//! Random test corpus generation.
//!
//! Produces a space-separated text drawn from a fixed English vocabulary together
//! with the statistics the analyzer is expected to report for it, so a generated
//! file can be uploaded and its analytics checked end to end.

use anyhow::Context;
use rand::Rng;
use std::path::{Path, PathBuf};
use wordtally_core::AnalysisResult;
use wordtally_processing::text::analyze_bytes;

pub const VOCABULARY: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
    "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
    "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me", "when",
    "make", "can", "like", "time", "no", "just", "him", "know", "take", "people", "into",
    "year", "your", "good", "some", "could", "them", "see", "other", "than", "then", "now",
    "look", "only", "come", "its", "over", "think", "also", "back", "after", "use", "two",
    "how", "our", "work", "first", "well", "way", "even", "new", "want", "because", "any",
    "these", "give", "day", "most", "us", "is", "was", "are", "been", "has", "had", "were",
    "said", "did", "having", "may", "should", "each", "where", "through", "very", "world",
    "still", "own", "house", "while", "place", "small", "large", "number", "water", "river",
    "mountain", "forest", "city", "country", "family", "friend", "school", "market",
    "window", "garden", "morning", "evening", "letter", "question", "answer", "reason",
    "problem", "system", "program", "history", "music", "picture", "story", "money",
];

/// `count` words drawn uniformly from [`VOCABULARY`], space separated with a trailing newline.
pub fn generate_text<R: Rng + ?Sized>(rng: &mut R, count: u64) -> anyhow::Result<String> {
    anyhow::ensure!(count > 0, "total words must be greater than 0");

    let mut text = String::new();
    for i in 0..count {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(VOCABULARY[rng.random_range(0..VOCABULARY.len())]);
    }
    text.push('\n');
    Ok(text)
}

/// Statistics the analyzer reports for `text`.
pub fn expected_stats(text: &str) -> anyhow::Result<AnalysisResult> {
    analyze_bytes(text.as_bytes()).context("Analyze generated text")
}

pub fn default_output_name(count: u64, timestamp_ms: i64) -> PathBuf {
    PathBuf::from(format!("generated-{}-words-{}.txt", count, timestamp_ms))
}

/// Sidecar path holding the expected statistics: `{output}.meta.json`.
pub fn meta_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".meta.json");
    PathBuf::from(name)
}

#[derive(Debug)]
pub struct GeneratedFiles {
    pub output: PathBuf,
    pub meta: PathBuf,
    pub stats: AnalysisResult,
}

/// Write a generated corpus to `output` and its expected statistics next to it.
pub async fn write_corpus<R: Rng + ?Sized>(
    rng: &mut R,
    count: u64,
    output: &Path,
) -> anyhow::Result<GeneratedFiles> {
    let text = generate_text(rng, count)?;
    let stats = expected_stats(&text)?;
    let meta = meta_path(output);

    tokio::fs::write(output, text.as_bytes())
        .await
        .with_context(|| format!("Write {}", output.display()))?;
    let json = serde_json::to_string_pretty(&stats).context("Serialize statistics")?;
    tokio::fs::write(&meta, json)
        .await
        .with_context(|| format!("Write {}", meta.display()))?;

    tracing::debug!(words = count, output = %output.display(), "Corpus written");

    Ok(GeneratedFiles {
        output: output.to_path_buf(),
        meta,
        stats,
    })
}
