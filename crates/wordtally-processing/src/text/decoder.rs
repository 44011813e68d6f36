use std::borrow::Cow;

/// Errors raised while decoding the byte stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid UTF-8 sequence at byte offset {offset}")]
    InvalidUtf8 { offset: u64 },

    #[error("Truncated UTF-8 sequence at end of input (byte offset {offset})")]
    TruncatedSequence { offset: u64 },
}

/// Incremental UTF-8 decoder.
///
/// Chunks may end in the middle of a character; those trailing bytes are held
/// back and completed by the next chunk, so only whole characters are emitted.
/// Malformed input is an error rather than being replaced.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
    /// Absolute offset of the first pending byte (or of the next chunk).
    position: u64,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, appending every complete character to `out`.
    pub fn decode(&mut self, chunk: &[u8], out: &mut String) -> Result<(), DecodeError> {
        let input: Cow<'_, [u8]> = if self.pending.is_empty() {
            Cow::Borrowed(chunk)
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            Cow::Owned(joined)
        };

        match std::str::from_utf8(&input) {
            Ok(text) => {
                out.push_str(text);
                self.position += input.len() as u64;
                Ok(())
            }
            Err(e) => {
                let valid = e.valid_up_to();
                if e.error_len().is_some() {
                    return Err(DecodeError::InvalidUtf8 {
                        offset: self.position + valid as u64,
                    });
                }

                let (complete, tail) = input.split_at(valid);
                let text = std::str::from_utf8(complete).map_err(|_| DecodeError::InvalidUtf8 {
                    offset: self.position,
                })?;
                out.push_str(text);
                self.position += valid as u64;
                self.pending = tail.to_vec();
                Ok(())
            }
        }
    }

    /// Signal end of input. Fails if a character was left incomplete.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TruncatedSequence {
                offset: self.position,
            })
        }
    }
}
