//! Extractive answer assembly and confidence scoring.
//!
//! Answers are composed solely of verbatim sentences lifted from retrieved chunks; no
//! generative rewriting happens anywhere. All functions here are pure so the scoring
//! behavior is fully unit-testable.

use crate::processing::SearchResult;
use std::collections::HashSet;

/// Canned reply when retrieval produced no usable evidence.
pub const NO_INFORMATION_ANSWER: &str = "No relevant information found in the knowledge base.";

/// Number of top-ranked chunks mined for candidate sentences.
const ANSWER_CHUNKS: usize = 3;
/// Sentences at or below this trimmed length are treated as fragments and dropped.
const MIN_SENTENCE_CHARS: usize = 20;
/// Maximum number of sentences assembled into an answer.
const MAX_ANSWER_SENTENCES: usize = 3;
/// Minimum combined score for a sentence to qualify.
const MIN_SENTENCE_SCORE: f32 = 0.3;
/// Length of the fallback excerpt taken from the best chunk.
const FALLBACK_EXCERPT_CHARS: usize = 300;

/// Assemble an extractive answer from retrieved chunks, best-first.
///
/// Candidate sentences from the top chunks are scored by word overlap with the question
/// blended with the owning chunk's similarity, then the highest-scoring distinct sentences
/// are joined. When nothing clears the score floor, the reply falls back to an excerpt of
/// the best chunk.
pub fn extractive_answer(question: &str, chunks: &[SearchResult]) -> String {
    if chunks.is_empty() {
        return NO_INFORMATION_ANSWER.to_string();
    }

    let question_words = word_set(question);

    let mut scored: Vec<(String, f32)> = Vec::new();
    for chunk in chunks.iter().take(ANSWER_CHUNKS) {
        for sentence in split_sentences(&chunk.content) {
            let score = sentence_score(&question_words, &sentence, chunk.similarity_score);
            scored.push((sentence, score));
        }
    }

    // Stable sort keeps encounter order for tied scores.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut selected: Vec<String> = Vec::new();
    let mut used: HashSet<String> = HashSet::new();
    for (sentence, score) in &scored {
        if selected.len() == MAX_ANSWER_SENTENCES {
            break;
        }
        if *score > MIN_SENTENCE_SCORE && used.insert(sentence.clone()) {
            selected.push(sentence.clone());
        }
    }

    if selected.is_empty() {
        let excerpt: String = chunks[0]
            .content
            .chars()
            .take(FALLBACK_EXCERPT_CHARS)
            .collect();
        return format!("Based on the search results:\n\n{excerpt}...");
    }

    selected.join(" ")
}

/// Blend word overlap with chunk similarity into a sentence score.
///
/// `score = 0.5 * |question ∩ sentence| / |question| + 0.5 * chunk_similarity`, over
/// case-insensitive whitespace token sets. A question with no words contributes zero overlap.
fn sentence_score(question_words: &HashSet<String>, sentence: &str, chunk_score: f32) -> f32 {
    let overlap = if question_words.is_empty() {
        0.0
    } else {
        let sentence_words = word_set(sentence);
        let shared = question_words.intersection(&sentence_words).count();
        shared as f32 / question_words.len() as f32
    };

    overlap * 0.5 + chunk_score * 0.5
}

/// Split text into candidate sentences on terminal punctuation, dropping short fragments.
fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|sentence| sentence.chars().count() > MIN_SENTENCE_CHARS)
        .map(str::to_string)
        .collect()
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Estimate answer confidence from retrieval scores.
///
/// `confidence = 0.4 * mean(similarity) + 0.6 * top-1 similarity`, capped at 1.0. Empty
/// retrieval is exactly 0.0.
pub fn confidence(chunks: &[SearchResult]) -> f32 {
    if chunks.is_empty() {
        return 0.0;
    }

    let avg = chunks
        .iter()
        .map(|chunk| chunk.similarity_score)
        .sum::<f32>()
        / chunks.len() as f32;
    let top = chunks[0].similarity_score;

    (avg * 0.4 + top * 0.6).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn hit(content: &str, score: f32) -> SearchResult {
        SearchResult {
            document_id: "doc".into(),
            filename: "doc.txt".into(),
            chunk_id: "doc_0".into(),
            content: content.into(),
            similarity_score: score,
            metadata: Map::new(),
        }
    }

    #[test]
    fn empty_retrieval_yields_canned_answer_and_zero_confidence() {
        assert_eq!(extractive_answer("anything?", &[]), NO_INFORMATION_ANSWER);
        assert_eq!(confidence(&[]), 0.0);
    }

    #[test]
    fn relevant_sentence_is_extracted() {
        let chunks = vec![hit(
            "Supervised learning uses labeled training data. Cats are fluffy animals indeed.",
            0.9,
        )];
        let answer = extractive_answer("What is supervised learning?", &chunks);
        assert!(answer.contains("Supervised learning uses labeled training data"));
    }

    #[test]
    fn short_fragments_are_dropped() {
        let chunks = vec![hit("Too short. This sentence is comfortably long enough to keep.", 0.9)];
        let answer = extractive_answer("keep this sentence", &chunks);
        assert!(!answer.contains("Too short"));
    }

    #[test]
    fn duplicate_sentences_are_selected_once() {
        let sentence = "Supervised learning uses labeled training data";
        let chunks = vec![
            hit(&format!("{sentence}."), 0.9),
            hit(&format!("{sentence}."), 0.85),
        ];
        let answer = extractive_answer("supervised learning", &chunks);
        assert_eq!(answer.matches(sentence).count(), 1);
    }

    #[test]
    fn low_scores_fall_back_to_excerpt() {
        let content = "completely unrelated material that shares no words with anything asked";
        let chunks = vec![hit(content, 0.1)];
        let answer = extractive_answer("quantum chromodynamics", &chunks);
        assert!(answer.starts_with("Based on the search results:"));
        assert!(answer.ends_with("..."));
        assert!(answer.contains(content));
    }

    #[test]
    fn fallback_excerpt_is_bounded() {
        let long = "word ".repeat(200);
        let chunks = vec![hit(&long, 0.0)];
        let answer = extractive_answer("zzz", &chunks);
        let prefix = "Based on the search results:\n\n";
        let body = &answer[prefix.len()..answer.len() - 3];
        assert_eq!(body.chars().count(), 300);
    }

    #[test]
    fn sentence_score_blends_overlap_and_similarity() {
        let question = word_set("what is supervised learning");
        let full = sentence_score(&question, "supervised learning is what this is", 0.8);
        let none = sentence_score(&question, "entirely different words", 0.8);
        assert!(full > none);
        assert!((none - 0.4).abs() < 1e-6);
    }

    #[test]
    fn confidence_matches_weighted_formula() {
        let chunks = vec![hit("a", 0.9), hit("b", 0.5)];
        let expected = 0.7_f32 * 0.4 + 0.9 * 0.6;
        assert!((confidence(&chunks) - expected).abs() < 1e-6);
    }

    #[test]
    fn confidence_is_monotone_in_top_score() {
        let lower = vec![hit("a", 0.6), hit("b", 0.5)];
        let higher = vec![hit("a", 0.8), hit("b", 0.5)];
        assert!(confidence(&higher) > confidence(&lower));
    }

    #[test]
    fn confidence_is_capped_at_one() {
        let chunks = vec![hit("a", 1.0), hit("b", 1.0)];
        assert!(confidence(&chunks) <= 1.0);
    }
}
