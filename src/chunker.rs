//! Recursive character splitting with a sliding-window overlap.
//!
//! Source pages are split along a prioritized separator hierarchy (paragraph
//! break, line break, space, then fixed character strides) and merged back
//! into chunks bounded by a maximum size. Each chunk after the first starts
//! with the tail of the previous chunk so local context survives chunk
//! boundaries. All sizes are measured in characters, not bytes; the vendor
//! pages this crate ingests are frequently CJK.

use crate::types::AssistantError;

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_SIZE: usize = 512;
/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_OVERLAP: usize = 100;
/// Default separator hierarchy, highest priority first. The empty string is
/// the terminal fallback: it splits at fixed character strides and guarantees
/// termination.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into bounded, overlapping chunks.
#[derive(Clone, Debug)]
pub struct Chunker {
    max_size: usize,
    overlap: usize,
    separators: Vec<String>,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_OVERLAP, DEFAULT_SEPARATORS)
            .expect("default chunker configuration is valid")
    }
}

impl Chunker {
    /// Builds a chunker, failing fast on configurations that cannot make
    /// progress (`overlap >= max_size`, or a zero max size).
    pub fn new<I, S>(max_size: usize, overlap: usize, separators: I) -> Result<Self, AssistantError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if max_size == 0 {
            return Err(AssistantError::Config(
                "chunk max size must be greater than zero".to_string(),
            ));
        }
        if overlap >= max_size {
            return Err(AssistantError::Config(format!(
                "chunk overlap ({overlap}) must be smaller than max size ({max_size})"
            )));
        }
        let mut separators: Vec<String> = separators.into_iter().map(Into::into).collect();
        if !separators.iter().any(String::is_empty) {
            separators.push(String::new());
        }
        Ok(Self {
            max_size,
            overlap,
            separators,
        })
    }

    /// Splits `text` into chunks of at most `max_size` characters.
    ///
    /// Empty input yields an empty vector; input of at most `max_size`
    /// characters yields exactly one chunk equal to the input. For longer
    /// input, every chunk after the first begins with the last `overlap`
    /// characters of the previous chunk, so concatenating the first chunk
    /// with each subsequent chunk minus its overlap prefix reconstructs the
    /// input exactly.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.max_size {
            return vec![text.to_string()];
        }

        // Pieces are bounded by max_size - overlap so that a chunk seeded
        // with the previous chunk's overlap tail always has room for at
        // least one more piece.
        let budget = self.max_size - self.overlap;
        let mut pieces = Vec::new();
        collect_pieces(text, &self.separators, budget, &mut pieces);
        self.merge(pieces)
    }

    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);
            if current_len > 0 && current_len + piece_len > self.max_size {
                let seed = char_tail(&current, self.overlap);
                current_len = char_len(&seed);
                chunks.push(std::mem::replace(&mut current, seed));
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

/// Splits `text` into pieces of at most `budget` characters, trying each
/// separator in order and keeping separators attached to the preceding piece
/// so that concatenating all pieces reconstructs `text`.
fn collect_pieces(text: &str, separators: &[String], budget: usize, out: &mut Vec<String>) {
    if char_len(text) <= budget {
        out.push(text.to_string());
        return;
    }

    for (idx, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            break;
        }
        if text.contains(separator.as_str()) {
            for part in text.split_inclusive(separator.as_str()) {
                if char_len(part) <= budget {
                    out.push(part.to_string());
                } else {
                    collect_pieces(part, &separators[idx + 1..], budget, out);
                }
            }
            return;
        }
    }

    // Fallback: split at fixed character strides.
    let chars: Vec<char> = text.chars().collect();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + budget).min(chars.len());
        out.push(chars[start..end].iter().collect());
        start = end;
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn char_tail(text: &str, n: usize) -> String {
    let len = char_len(text);
    text.chars().skip(len.saturating_sub(n)).collect()
}
