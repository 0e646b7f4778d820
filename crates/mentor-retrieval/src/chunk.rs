//! Character-window text chunking with overlap.
//!
//! Documents are split into windows of `chunk_size` characters with
//! `overlap` characters shared between consecutive chunks, preferring
//! to break at a newline or space near the window end so chunks do not
//! cut words in half.

/// Splits document text into overlapping chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker with the given window size and overlap.
    ///
    /// The overlap is clamped below the chunk size so every iteration
    /// makes forward progress.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Split text into chunks. Whitespace-only chunks are dropped.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();

        let mut start = 0usize;
        while start < chars.len() {
            let hard_end = (start + self.chunk_size).min(chars.len());
            let end = if hard_end < chars.len() {
                self.find_break(&chars, start, hard_end)
            } else {
                hard_end
            };

            let chunk: String = chars[start..end].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if end >= chars.len() {
                break;
            }
            let next = end.saturating_sub(self.overlap);
            start = if next > start { next } else { end };
        }

        chunks
    }

    /// Find a break position in the tail half of the window.
    ///
    /// Prefers a newline, then a space. Falls back to a hard cut at
    /// `hard_end` when neither is found.
    fn find_break(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        let floor = (start + self.chunk_size / 2).min(hard_end);

        for i in (floor..hard_end).rev() {
            if chars[i] == '\n' {
                return i + 1;
            }
        }
        for i in (floor..hard_end).rev() {
            if chars[i] == ' ' {
                return i + 1;
            }
        }
        hard_end
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1000, 20)
    }
}
