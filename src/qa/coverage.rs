//! Topic coverage heuristics: aspect catalogs, gap classification, and recommendations.

use crate::processing::SearchResult;
use crate::qa::types::CompletenessResult;
use std::collections::HashSet;

/// Cap applied to the covered and missing lists of a single topic.
const MAX_ASPECTS_LISTED: usize = 5;
/// Topics scoring below this threshold are flagged as needing more content.
const LOW_COVERAGE_SCORE: f32 = 0.5;
/// Every topic must exceed this score for the knowledge base to be praised.
const HIGH_COVERAGE_SCORE: f32 = 0.8;
/// Total missing aspects beyond this count trigger a gap warning.
const GAP_WARNING_MISSING: usize = 5;

/// Lookup table resolving a topic to the aspects expected of complete coverage.
///
/// Entries match by case-insensitive substring in either direction and the first match wins,
/// so more specific phrases should be registered before general ones. The catalog ships with
/// a small machine-learning vocabulary and is extensible at construction time; it is a
/// heuristic, not something derived from the corpus.
#[derive(Debug, Clone)]
pub struct AspectCatalog {
    entries: Vec<(String, Vec<String>)>,
}

impl AspectCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create a catalog seeded with the built-in topic vocabulary.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        let defaults: [(&str, &[&str]); 7] = [
            (
                "machine learning",
                &[
                    "supervised",
                    "unsupervised",
                    "reinforcement",
                    "neural networks",
                    "training",
                    "models",
                ],
            ),
            (
                "deep learning",
                &[
                    "neural networks",
                    "backpropagation",
                    "layers",
                    "activation",
                    "convolution",
                    "recurrent",
                ],
            ),
            (
                "data science",
                &[
                    "analysis",
                    "visualization",
                    "statistics",
                    "cleaning",
                    "modeling",
                    "insights",
                ],
            ),
            (
                "artificial intelligence",
                &[
                    "machine learning",
                    "neural networks",
                    "nlp",
                    "computer vision",
                    "reasoning",
                ],
            ),
            (
                "supervised learning",
                &[
                    "classification",
                    "regression",
                    "labeled data",
                    "training",
                    "prediction",
                ],
            ),
            (
                "unsupervised learning",
                &[
                    "clustering",
                    "dimensionality",
                    "patterns",
                    "unlabeled",
                    "grouping",
                ],
            ),
            (
                "reinforcement learning",
                &["agent", "environment", "reward", "policy", "action", "state"],
            ),
        ];
        for (topic, aspects) in defaults {
            catalog.insert(topic, aspects.iter().map(|s| s.to_string()).collect());
        }
        catalog
    }

    /// Register (or append) an aspect vocabulary for a topic phrase.
    pub fn insert(&mut self, topic: &str, aspects: Vec<String>) {
        self.entries.push((topic.to_lowercase(), aspects));
    }

    /// Resolve the aspect list for a topic.
    ///
    /// Falls back to synthesizing aspects from the topic's own words (plus a
    /// `"{word} examples"` variant per word) when no entry matches.
    pub fn resolve(&self, topic: &str) -> Vec<String> {
        let topic_lower = topic.to_lowercase();

        for (key, aspects) in &self.entries {
            if topic_lower.contains(key.as_str()) || key.contains(&topic_lower) {
                return aspects.clone();
            }
        }

        let words: Vec<String> = topic_lower.split_whitespace().map(str::to_string).collect();
        let mut synthesized = words.clone();
        synthesized.extend(words.iter().map(|word| format!("{word} examples")));
        synthesized
    }
}

impl Default for AspectCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Classify a topic's aspects against retrieved chunk content.
///
/// Returns `(covered, missing)`, each capped at five entries. Verbatim substring hits and
/// partial word co-occurrence both count as covered; summary markers are prepended before
/// capping, matching the score that is later derived from the returned lists.
pub(crate) fn analyze_coverage(
    catalog: &AspectCatalog,
    topic: &str,
    chunks: &[SearchResult],
) -> (Vec<String>, Vec<String>) {
    let content = chunks
        .iter()
        .map(|chunk| chunk.content.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let content_words: HashSet<&str> = content.split_whitespace().collect();

    let mut covered = Vec::new();
    let mut missing = Vec::new();

    for aspect in catalog.resolve(topic) {
        let aspect_lower = aspect.to_lowercase();
        if content.contains(&aspect_lower) {
            covered.push(format!("Coverage of {aspect}"));
        } else if aspect_lower
            .split_whitespace()
            .any(|word| content_words.contains(word))
        {
            covered.push(format!("Partial coverage of {aspect}"));
        } else {
            missing.push(format!("Missing information about {aspect}"));
        }
    }

    if covered.len() > missing.len() {
        covered.insert(0, format!("Good overall coverage of {topic}"));
    } else if covered.is_empty() {
        missing.insert(0, format!("No clear coverage of {topic}"));
    }

    covered.truncate(MAX_ASPECTS_LISTED);
    missing.truncate(MAX_ASPECTS_LISTED);
    (covered, missing)
}

/// Coverage fraction over the classified aspect lists; 0.0 when both are empty.
pub(crate) fn coverage_score(covered: &[String], missing: &[String]) -> f32 {
    let total = covered.len() + missing.len();
    if total == 0 {
        return 0.0;
    }
    covered.len() as f32 / total as f32
}

/// Derive corpus-level recommendations from the per-topic results.
pub(crate) fn recommendations(results: &[CompletenessResult]) -> Vec<String> {
    let mut recommendations = Vec::new();

    let low_coverage: Vec<&str> = results
        .iter()
        .filter(|result| result.coverage_score < LOW_COVERAGE_SCORE)
        .map(|result| result.topic.as_str())
        .collect();
    if !low_coverage.is_empty() {
        recommendations.push(format!(
            "Consider adding more content about: {}",
            low_coverage.join(", ")
        ));
    }

    let missing_total: usize = results
        .iter()
        .map(|result| result.missing_aspects.len())
        .sum();
    if missing_total > GAP_WARNING_MISSING {
        recommendations.push(
            "The knowledge base has significant gaps. Consider comprehensive content review."
                .to_string(),
        );
    }

    if !results.is_empty()
        && results
            .iter()
            .all(|result| result.coverage_score > HIGH_COVERAGE_SCORE)
    {
        recommendations
            .push("Knowledge base has excellent coverage of the specified topics.".to_string());
    }

    recommendations
}
