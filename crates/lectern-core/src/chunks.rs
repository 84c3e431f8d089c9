//! Splits document text into overlapping chunks for embedding and search.
//! Prefers paragraph boundaries; falls back to line breaks, sentence ends, spaces, then hard cuts.

use serde::{Deserialize, Serialize};

/// Default maximum characters per chunk.
pub const DEFAULT_MAX_CHARS: usize = 10_000;
/// Default characters shared between consecutive chunks.
pub const DEFAULT_OVERLAP: usize = 1_000;

/// Natural boundaries, most preferred first. A cut lands right after the separator.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "? ", "! ", " "];

/// A chunk of text from a document, with source reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Name of the document the chunk came from.
    pub source: String,
    /// Index of this chunk within its document (0, 1, 2, …).
    pub index: usize,
}

/// Character-window splitter with a fixed overlap between neighbours.
///
/// Sizes are counted in `char`s. Every chunk is at most `max_chars` long and
/// chunk `n + 1` starts exactly `overlap` characters before chunk `n` ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    max_chars: usize,
    overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl TextSplitter {
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self, ChunkError> {
        if max_chars == 0 {
            return Err(ChunkError::ZeroSize);
        }
        if overlap >= max_chars {
            return Err(ChunkError::OverlapTooLarge { overlap, max_chars });
        }
        Ok(Self { max_chars, overlap })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into ordered, overlapping chunks.
    ///
    /// Empty input yields no chunks; input that already fits yields itself.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= self.max_chars {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            if chars.len() - start <= self.max_chars {
                chunks.push(chars[start..].iter().collect());
                break;
            }
            let end = self.cut_point(&chars, start);
            chunks.push(chars[start..end].iter().collect());
            start = end - self.overlap;
        }
        chunks
    }

    /// End (exclusive) of the chunk starting at `start`. Always greater than
    /// `start + overlap`, so the next start moves forward.
    fn cut_point(&self, chars: &[char], start: usize) -> usize {
        let hard_end = start + self.max_chars;
        let min_len = (self.max_chars / 2 + 1).max(self.overlap + 1);
        let window = &chars[start..hard_end];
        for sep in SEPARATORS {
            if let Some(len) = last_boundary(window, sep) {
                if len >= min_len {
                    return start + len;
                }
            }
        }
        hard_end
    }
}

/// Offset just past the last occurrence of `sep` in `window`.
fn last_boundary(window: &[char], sep: &str) -> Option<usize> {
    let sep: Vec<char> = sep.chars().collect();
    if sep.len() > window.len() {
        return None;
    }
    (0..=window.len() - sep.len())
        .rev()
        .find(|&i| window[i..i + sep.len()] == sep[..])
        .map(|i| i + sep.len())
}

/// Chunk a single document's text. Whitespace-only chunks are dropped.
pub fn chunk_document(source: &str, text: &str, splitter: &TextSplitter) -> Vec<Chunk> {
    splitter
        .split(text)
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .enumerate()
        .map(|(index, text)| Chunk {
            text,
            source: source.to_string(),
            index,
        })
        .collect()
}

/// Chunk all documents, given as `(name, text)` pairs. Returns chunks from all documents in order.
pub fn chunk_documents<'a>(
    documents: impl IntoIterator<Item = (&'a str, &'a str)>,
    splitter: &TextSplitter,
) -> Vec<Chunk> {
    documents
        .into_iter()
        .flat_map(|(source, text)| chunk_document(source, text, splitter))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("chunk size must be greater than zero")]
    ZeroSize,
    #[error("overlap ({overlap}) must be smaller than chunk size ({max_chars})")]
    OverlapTooLarge { overlap: usize, max_chars: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(max: usize, overlap: usize) -> TextSplitter {
        TextSplitter::new(max, overlap).unwrap()
    }

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    fn assert_overlaps(chunks: &[String], overlap: usize) {
        for pair in chunks.windows(2) {
            let tail: String = {
                let c: Vec<char> = pair[0].chars().collect();
                c[c.len() - overlap..].iter().collect()
            };
            let head: String = pair[1].chars().take(overlap).collect();
            assert_eq!(tail, head, "neighbours must share {overlap} chars");
        }
    }

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(splitter(100, 10).split("").is_empty());
    }

    #[test]
    fn short_input_is_one_identical_chunk() {
        let s = splitter(100, 10);
        assert_eq!(s.split("The sky is blue."), vec!["The sky is blue.".to_string()]);
        let exact = "x".repeat(100);
        assert_eq!(s.split(&exact), vec![exact.clone()]);
    }

    #[test]
    fn hard_cut_respects_size_and_overlap() {
        let text = "a".repeat(1_000);
        let chunks = splitter(200, 20).split(&text);
        assert!(chunks.len() >= 5);
        assert!(chunks.iter().all(|c| char_len(c) <= 200));
        assert_overlaps(&chunks, 20);
        assert_eq!(chunks[0].len(), 200);
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let para = "word ".repeat(30); // 150 chars
        let text = format!("{para}\n\n{para}\n\n{para}");
        let chunks = splitter(200, 10).split(&text);
        assert!(chunks[0].ends_with("\n\n"));
        assert!(chunks.iter().all(|c| char_len(c) <= 200));
        assert_overlaps(&chunks, 10);
    }

    #[test]
    fn prefers_sentence_end_over_space() {
        let text = format!("{}. {}", "a".repeat(150), "b c ".repeat(40));
        let chunks = splitter(200, 5).split(&text);
        assert_eq!(chunks[0], format!("{}. ", "a".repeat(150)));
    }

    #[test]
    fn early_boundary_is_ignored() {
        // A paragraph break in the first few characters would make a tiny chunk.
        let text = format!("ab\n\n{}", "z".repeat(400));
        let chunks = splitter(100, 10).split(&text);
        assert_eq!(char_len(&chunks[0]), 100);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "é".repeat(250);
        let chunks = splitter(100, 10).split(&text);
        assert!(chunks.iter().all(|c| char_len(c) <= 100));
        assert_overlaps(&chunks, 10);
        assert_eq!(chunks.concat().chars().count(), 250 + 10 * (chunks.len() - 1));
    }

    #[test]
    fn chunks_cover_whole_text() {
        let text: String = (0..500).map(|i| format!("w{i} ")).collect();
        let s = splitter(300, 30);
        let chunks = s.split(&text);
        let mut rebuilt = chunks[0].clone();
        for c in &chunks[1..] {
            rebuilt.extend(c.chars().skip(30));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(TextSplitter::new(0, 0), Err(ChunkError::ZeroSize)));
        assert!(matches!(
            TextSplitter::new(10, 10),
            Err(ChunkError::OverlapTooLarge { .. })
        ));
    }

    #[test]
    fn chunk_document_numbers_and_skips_blank() {
        let chunks = chunk_document("a.pdf", "One paragraph.", &splitter(100, 10));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "a.pdf");
        assert_eq!(chunks[0].index, 0);
        assert!(chunk_document("b.pdf", "   \n ", &splitter(100, 10)).is_empty());
    }

    #[test]
    fn chunk_documents_keeps_order() {
        let docs = [("a.pdf", "first"), ("b.pdf", "second")];
        let chunks = chunk_documents(docs, &TextSplitter::default());
        let sources: Vec<_> = chunks.iter().map(|c| c.source.as_str()).collect();
        assert_eq!(sources, ["a.pdf", "b.pdf"]);
    }
}
