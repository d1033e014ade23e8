//! Fixed-window character splitting with configurable overlap.

use crate::types::RagError;

/// Splits segments into overlapping character windows.
///
/// The window advances by `chunk_size - overlap` characters per step, so the
/// configuration is rejected up front when `overlap >= chunk_size` — such a
/// window would never advance. Arithmetic is in characters, not bytes, so
/// multi-byte text never splits inside a code point.
#[derive(Clone, Copy, Debug)]
pub struct CharacterSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl CharacterSplitter {
    /// Creates a splitter, validating the window configuration.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "overlap {overlap} must be smaller than chunk_size {chunk_size}"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Splits segments into chunks, preserving segment order and
    /// left-to-right order within each segment. Empty segments contribute
    /// nothing.
    pub fn split(&self, segments: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        for segment in segments {
            self.split_segment(segment, &mut chunks);
        }
        chunks
    }

    fn split_segment(&self, segment: &str, out: &mut Vec<String>) {
        let chars: Vec<char> = segment.chars().collect();
        if chars.is_empty() {
            return;
        }
        let step = self.chunk_size - self.overlap;
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Drops each chunk's leading overlap and concatenates the rest.
    fn reassemble(chunks: &[String], overlap: usize) -> String {
        let mut text = String::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            if idx == 0 {
                text.push_str(chunk);
            } else {
                text.extend(chunk.chars().skip(overlap));
            }
        }
        text
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        assert!(matches!(
            CharacterSplitter::new(10, 10),
            Err(RagError::Config(_))
        ));
        assert!(matches!(
            CharacterSplitter::new(10, 15),
            Err(RagError::Config(_))
        ));
        assert!(matches!(
            CharacterSplitter::new(0, 0),
            Err(RagError::Config(_))
        ));
    }

    #[test]
    fn short_segment_yields_single_chunk() {
        let splitter = CharacterSplitter::new(100, 20).unwrap();
        let chunks = splitter.split(&["tiny".to_string()]);
        assert_eq!(chunks, vec!["tiny".to_string()]);
    }

    #[test]
    fn empty_segments_yield_no_chunks() {
        let splitter = CharacterSplitter::new(10, 2).unwrap();
        assert!(splitter.split(&[String::new(), String::new()]).is_empty());
    }

    #[test]
    fn windows_overlap_by_configured_amount() {
        let splitter = CharacterSplitter::new(8, 4).unwrap();
        let chunks = splitter.split(&["abcdefghijkl".to_string()]);
        assert_eq!(chunks, vec!["abcdefgh", "efghijkl"]);
    }

    #[test]
    fn chunk_order_follows_segment_order() {
        let splitter = CharacterSplitter::new(4, 0).unwrap();
        let segments = vec!["aaaabbbb".to_string(), "cccc".to_string()];
        let chunks = splitter.split(&segments);
        assert_eq!(chunks, vec!["aaaa", "bbbb", "cccc"]);
    }

    #[test]
    fn multibyte_text_splits_on_character_boundaries() {
        let splitter = CharacterSplitter::new(3, 1).unwrap();
        let chunks = splitter.split(&["héllö wörld".to_string()]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 3);
        }
        assert_eq!(reassemble(&chunks, 1), "héllö wörld");
    }

    proptest! {
        #[test]
        fn reassembly_reconstructs_input(
            text in ".{0,400}",
            chunk_size in 1usize..50,
            overlap_frac in 0usize..50,
        ) {
            let overlap = overlap_frac % chunk_size;
            let splitter = CharacterSplitter::new(chunk_size, overlap).unwrap();
            let chunks = splitter.split(&[text.clone()]);
            prop_assert_eq!(reassemble(&chunks, overlap), text);
        }
    }
}
