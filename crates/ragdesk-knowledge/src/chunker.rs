//! Document chunker.
//!
//! Splits text into overlapping windows of at most `chunk_size` characters.
//! Each window ends on the strongest boundary it contains: paragraph break,
//! then line break, then sentence end, then whitespace, and only as a last
//! resort a hard cut. Segments are exact substrings of the input, so the
//! document can be rebuilt from them.

use ragdesk_core::config::IngestionConfig;
use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::types::Segment;

/// Overlapping, boundary-aware text splitter.
#[derive(Debug, Clone)]
pub struct Chunker {
    /// Maximum characters per segment.
    chunk_size: usize,
    /// Characters shared between consecutive segments (upper bound).
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            overlap: 30,
        }
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagDeskError::Config("chunk_size must be > 0".into()));
        }
        if overlap >= chunk_size {
            return Err(RagDeskError::Config(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &IngestionConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split a document into segments tagged with `source_id`.
    pub fn split(&self, source_id: &str, text: &str) -> Vec<Segment> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let n = chars.len();
        let byte_at = |i: usize| if i < n { chars[i].0 } else { text.len() };

        let mut segments = Vec::new();
        let mut start = 0;
        while start < n {
            let limit = (start + self.chunk_size).min(n);
            let end = if limit == n {
                n
            } else {
                self.find_break(&chars, start, limit)
            };

            segments.push(Segment {
                text: text[byte_at(start)..byte_at(end)].to_string(),
                source_id: source_id.to_string(),
                offset: byte_at(start),
                index: segments.len(),
            });

            if end == n {
                break;
            }
            start = self.next_start(&chars, start, end);
        }
        segments
    }

    /// Best exclusive end position in `(start + overlap, limit]`.
    fn find_break(&self, chars: &[(usize, char)], start: usize, limit: usize) -> usize {
        let lo = start + self.overlap + 1;
        let ch = |i: usize| chars[i].1;

        let paragraph = |i: usize| i >= 2 && ch(i - 1) == '\n' && ch(i - 2) == '\n';
        let line = |i: usize| ch(i - 1) == '\n';
        let sentence =
            |i: usize| matches!(ch(i - 1), '.' | '!' | '?') && ch(i).is_whitespace();
        let space = |i: usize| ch(i - 1).is_whitespace();

        let rules: [&dyn Fn(usize) -> bool; 4] = [&paragraph, &line, &sentence, &space];
        for rule in rules {
            if let Some(pos) = (lo..=limit).rev().find(|&i| rule(i)) {
                return pos;
            }
        }
        limit
    }

    /// Step back `overlap` characters from `end`, then forward to the start of a word.
    fn next_start(&self, chars: &[(usize, char)], start: usize, end: usize) -> usize {
        let mut next = end.saturating_sub(self.overlap).max(start + 1);
        while next < end && next > 0 && !chars[next - 1].1.is_whitespace() {
            next += 1;
        }
        next
    }
}

/// Rebuild a document from consecutive segments, dropping the overlapping
/// prefix of each segment after the first.
pub fn reassemble(segments: &[Segment]) -> String {
    let mut out = String::new();
    let mut covered: usize = 0;
    for seg in segments {
        let skip = covered.saturating_sub(seg.offset).min(seg.text.len());
        out.push_str(&seg.text[skip..]);
        covered = covered.max(seg.end());
    }
    out
}
