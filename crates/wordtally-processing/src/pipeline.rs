use bytes::Bytes;
use futures::{Stream, StreamExt};
use wordtally_core::AnalysisResult;

use crate::text::{DecodeError, TextAnalyzer};

/// Failure while analyzing a byte stream
#[derive(Debug, thiserror::Error)]
pub enum StreamAnalysisError<E> {
    /// The underlying stream failed to yield a chunk.
    #[error("Failed to read input: {0}")]
    Read(E),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Run the analyzer over a chunk stream, strictly in arrival order.
///
/// Only the current chunk and a small carry are held in memory.
pub async fn analyze_stream<S, E>(stream: S) -> Result<AnalysisResult, StreamAnalysisError<E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut analyzer = TextAnalyzer::new();
    let mut bytes_read: u64 = 0;
    let mut chunks: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(StreamAnalysisError::Read)?;
        bytes_read += chunk.len() as u64;
        chunks += 1;
        analyzer.feed(&chunk)?;
    }

    let result = analyzer.finish()?;

    tracing::debug!(
        bytes_read = bytes_read,
        chunks = chunks,
        total_words = result.total_words,
        unique_words = result.unique_words,
        "Text analysis finished"
    );

    Ok(result)
}
