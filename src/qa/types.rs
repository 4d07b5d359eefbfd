//! Response types for question answering and completeness analysis.

use crate::processing::SearchResult;
use serde::Serialize;

/// Extractive answer with its supporting evidence.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    /// Question as asked.
    pub question: String,
    /// Assembled answer text.
    pub answer: String,
    /// Retrieved chunks the answer was drawn from, best-first.
    pub sources: Vec<SearchResult>,
    /// Confidence estimate in `[0, 1]`.
    pub confidence: f32,
    /// Wall-clock seconds spent answering.
    pub processing_time: f64,
}

/// Per-topic coverage verdict.
#[derive(Debug, Clone, Serialize)]
pub struct CompletenessResult {
    /// Topic as requested.
    pub topic: String,
    /// Fraction of aspects judged covered, in `[0, 1]`.
    pub coverage_score: f32,
    /// Aspects found in the retrieved content (capped at five).
    pub covered_aspects: Vec<String>,
    /// Aspects absent from the retrieved content (capped at five).
    pub missing_aspects: Vec<String>,
    /// Sample of the chunks the verdict was based on.
    pub relevant_chunks: Vec<SearchResult>,
}

/// Corpus-level completeness report.
#[derive(Debug, Clone, Serialize)]
pub struct CompletenessResponse {
    /// Mean of the per-topic coverage scores; 0.0 when no topics were given.
    pub overall_completeness: f32,
    /// Per-topic results in request order.
    pub results: Vec<CompletenessResult>,
    /// Synthesized guidance derived from the full result set.
    pub recommendations: Vec<String>,
}
