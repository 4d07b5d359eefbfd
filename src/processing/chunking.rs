//! Word-window chunking for extracted document text.
//!
//! Documents are split on whitespace and re-assembled into overlapping windows of a fixed
//! word count. The policy is deterministic: the same text, size, and overlap always produce
//! the same chunk sequence, so re-indexing a document is restartable at any point.

use super::types::ChunkingError;

/// Split text into overlapping word windows.
///
/// Windows hold `size` words and advance by `size - overlap` words per step, so adjacent
/// chunks share exactly `overlap` words of boundary content. Words are re-joined with single
/// spaces; the original whitespace is not preserved.
///
/// Empty or all-whitespace input yields an empty vector. For `n` words the number of chunks
/// is `ceil((n - overlap) / (size - overlap))`, or zero when `n <= overlap`.
pub fn chunk_words(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, ChunkingError> {
    if size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= size {
        return Err(ChunkingError::InvalidOverlap { size, overlap });
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let stride = size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    // Once a window start falls inside the previous window's overlap region, the tail has
    // already been emitted in full.
    while start < words.len().saturating_sub(overlap) {
        let end = (start + size).min(words.len());
        let chunk = words[start..end].join(" ");
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        start += stride;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_count(n: usize, size: usize, overlap: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let stride = size - overlap;
        n.saturating_sub(overlap).div_ceil(stride)
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_words("", 10, 2).unwrap().is_empty());
        assert!(chunk_words("   \n\t ", 10, 2).unwrap().is_empty());
    }

    #[test]
    fn rejects_zero_chunk_size() {
        assert!(matches!(
            chunk_words("hello", 0, 0),
            Err(ChunkingError::InvalidChunkSize)
        ));
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(matches!(
            chunk_words("hello world", 3, 3),
            Err(ChunkingError::InvalidOverlap { .. })
        ));
        assert!(matches!(
            chunk_words("hello world", 3, 5),
            Err(ChunkingError::InvalidOverlap { .. })
        ));
    }

    #[test]
    fn no_overlap_produces_disjoint_windows() {
        let chunks = chunk_words("one two three four five", 2, 0).unwrap();
        assert_eq!(chunks, vec!["one two", "three four", "five"]);
    }

    #[test]
    fn adjacent_chunks_share_overlap_words() {
        let chunks = chunk_words("one two three four five six", 4, 2).unwrap();
        assert_eq!(chunks, vec!["one two three four", "three four five six"]);

        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].split_whitespace().collect();
            let next: Vec<&str> = pair[1].split_whitespace().collect();
            assert_eq!(prev[prev.len() - 2..], next[..2]);
        }
    }

    #[test]
    fn chunk_count_matches_closed_form() {
        let cases = [
            (5, 3, 1),
            (5, 2, 0),
            (100, 10, 3),
            (1, 10, 2),
            (37, 7, 6),
            (10, 10, 0),
        ];
        for (n, size, overlap) in cases {
            let words: Vec<String> = (0..n).map(|i| format!("w{i}")).collect();
            let text = words.join(" ");
            let chunks = chunk_words(&text, size, overlap).unwrap();
            assert_eq!(
                chunks.len(),
                expected_count(n, size, overlap),
                "n={n} size={size} overlap={overlap}"
            );
        }
    }

    #[test]
    fn text_shorter_than_overlap_yields_nothing() {
        assert!(chunk_words("one two", 5, 2).unwrap().is_empty());
    }

    #[test]
    fn every_word_appears_when_text_exceeds_overlap() {
        let words: Vec<String> = (0..25).map(|i| format!("w{i}")).collect();
        let text = words.join(" ");
        let chunks = chunk_words(&text, 8, 3).unwrap();

        let rejoined: Vec<&str> = chunks
            .last()
            .unwrap()
            .split_whitespace()
            .collect();
        assert_eq!(rejoined.last(), Some(&"w24"));

        let first: Vec<&str> = chunks[0].split_whitespace().collect();
        assert_eq!(first.first(), Some(&"w0"));
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "alpha beta gamma delta epsilon zeta";
        let a = chunk_words(text, 3, 1).unwrap();
        let b = chunk_words(text, 3, 1).unwrap();
        assert_eq!(a, b);
    }
}
