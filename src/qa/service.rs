//! Question-answering service wiring retrieval into answer and coverage analysis.

use crate::{
    metrics::IndexMetrics,
    processing::{ProcessingService, SearchError, SearchOptions, SearchResult},
    qa::{
        answer::{NO_INFORMATION_ANSWER, confidence, extractive_answer},
        coverage::{AspectCatalog, analyze_coverage, coverage_score, recommendations},
        types::{AnswerResponse, CompletenessResponse, CompletenessResult},
    },
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Default number of chunks retrieved per question.
const DEFAULT_ANSWER_RESULTS: usize = 5;
/// Number of chunks retrieved per topic during completeness checks.
const COMPLETENESS_RESULTS: usize = 10;
/// Number of sample chunks attached to each per-topic result.
const COMPLETENESS_SAMPLE: usize = 3;

/// Retrieval capability the QA layer depends on.
#[async_trait]
pub trait ChunkRetriever: Send + Sync {
    /// Retrieve ranked chunks for a query.
    async fn retrieve(&self, options: SearchOptions) -> Result<Vec<SearchResult>, SearchError>;
}

#[async_trait]
impl ChunkRetriever for ProcessingService {
    async fn retrieve(&self, options: SearchOptions) -> Result<Vec<SearchResult>, SearchError> {
        self.search(options).await
    }
}

/// Abstraction over the QA surface used by the HTTP layer.
#[async_trait]
pub trait QaApi: Send + Sync {
    /// Answer a question extractively from retrieved evidence.
    async fn answer_question(
        &self,
        question: &str,
        max_results: Option<usize>,
    ) -> Result<AnswerResponse, SearchError>;

    /// Analyze how completely the corpus covers the given topics.
    async fn check_completeness(
        &self,
        topics: &[String],
        document_ids: Option<Vec<String>>,
    ) -> Result<CompletenessResponse, SearchError>;
}

/// Stateless QA orchestrator over a retriever.
///
/// All scoring is a pure function of the retrieved chunks; the service only adds retrieval,
/// timing, and metrics.
pub struct QaService<R: ChunkRetriever> {
    retriever: Arc<R>,
    catalog: AspectCatalog,
    metrics: Arc<IndexMetrics>,
}

impl<R: ChunkRetriever> QaService<R> {
    /// Build a QA service with the default aspect catalog.
    pub fn new(retriever: Arc<R>, metrics: Arc<IndexMetrics>) -> Self {
        Self::with_catalog(retriever, metrics, AspectCatalog::with_defaults())
    }

    /// Build a QA service with a caller-provided aspect catalog.
    pub fn with_catalog(
        retriever: Arc<R>,
        metrics: Arc<IndexMetrics>,
        catalog: AspectCatalog,
    ) -> Self {
        Self {
            retriever,
            catalog,
            metrics,
        }
    }

    /// Answer a question from the indexed corpus.
    pub async fn answer_question(
        &self,
        question: &str,
        max_results: Option<usize>,
    ) -> Result<AnswerResponse, SearchError> {
        let start = Instant::now();

        let sources = self
            .retriever
            .retrieve(SearchOptions {
                query: question.to_string(),
                max_results: Some(max_results.unwrap_or(DEFAULT_ANSWER_RESULTS)),
                ..Default::default()
            })
            .await?;

        self.metrics.record_question();

        if sources.is_empty() {
            tracing::debug!(question, "No evidence retrieved for question");
            return Ok(AnswerResponse {
                question: question.to_string(),
                answer: NO_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
                confidence: 0.0,
                processing_time: start.elapsed().as_secs_f64(),
            });
        }

        let answer = extractive_answer(question, &sources);
        let confidence = confidence(&sources);
        tracing::debug!(
            question,
            sources = sources.len(),
            confidence,
            "Question answered"
        );

        Ok(AnswerResponse {
            question: question.to_string(),
            answer,
            sources,
            confidence,
            processing_time: start.elapsed().as_secs_f64(),
        })
    }

    /// Analyze topic coverage across the corpus, one topic at a time.
    pub async fn check_completeness(
        &self,
        topics: &[String],
        document_ids: Option<Vec<String>>,
    ) -> Result<CompletenessResponse, SearchError> {
        let mut results = Vec::with_capacity(topics.len());

        for topic in topics {
            let chunks = self
                .retriever
                .retrieve(SearchOptions {
                    query: topic.clone(),
                    max_results: Some(COMPLETENESS_RESULTS),
                    document_ids: document_ids.clone(),
                    ..Default::default()
                })
                .await?;

            let result = if chunks.is_empty() {
                CompletenessResult {
                    topic: topic.clone(),
                    coverage_score: 0.0,
                    covered_aspects: Vec::new(),
                    missing_aspects: vec![format!("No information about {topic}")],
                    relevant_chunks: Vec::new(),
                }
            } else {
                let (covered, missing) = analyze_coverage(&self.catalog, topic, &chunks);
                let score = coverage_score(&covered, &missing);
                let mut sample = chunks;
                sample.truncate(COMPLETENESS_SAMPLE);
                CompletenessResult {
                    topic: topic.clone(),
                    coverage_score: score,
                    covered_aspects: covered,
                    missing_aspects: missing,
                    relevant_chunks: sample,
                }
            };
            results.push(result);
        }

        let overall_completeness = if results.is_empty() {
            0.0
        } else {
            results
                .iter()
                .map(|result| result.coverage_score)
                .sum::<f32>()
                / results.len() as f32
        };

        let recommendations = recommendations(&results);
        tracing::debug!(
            topics = topics.len(),
            overall = overall_completeness,
            "Completeness analyzed"
        );

        Ok(CompletenessResponse {
            overall_completeness,
            results,
            recommendations,
        })
    }
}

#[async_trait]
impl<R: ChunkRetriever> QaApi for QaService<R> {
    async fn answer_question(
        &self,
        question: &str,
        max_results: Option<usize>,
    ) -> Result<AnswerResponse, SearchError> {
        QaService::answer_question(self, question, max_results).await
    }

    async fn check_completeness(
        &self,
        topics: &[String],
        document_ids: Option<Vec<String>>,
    ) -> Result<CompletenessResponse, SearchError> {
        QaService::check_completeness(self, topics, document_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use tokio::sync::Mutex;

    struct StubRetriever {
        responses: Mutex<Vec<Vec<SearchResult>>>,
        calls: Mutex<Vec<SearchOptions>>,
    }

    impl StubRetriever {
        fn new(responses: Vec<Vec<SearchResult>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChunkRetriever for StubRetriever {
        async fn retrieve(
            &self,
            options: SearchOptions,
        ) -> Result<Vec<SearchResult>, SearchError> {
            self.calls.lock().await.push(options);
            let mut responses = self.responses.lock().await;
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(responses.remove(0))
            }
        }
    }

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

    fn service(responses: Vec<Vec<SearchResult>>) -> QaService<StubRetriever> {
        QaService::new(
            Arc::new(StubRetriever::new(responses)),
            Arc::new(IndexMetrics::new()),
        )
    }

    #[tokio::test]
    async fn empty_retrieval_yields_zero_confidence_answer() {
        let qa = service(vec![Vec::new()]);
        let response = qa.answer_question("what is anything?", None).await.unwrap();

        assert_eq!(response.answer, NO_INFORMATION_ANSWER);
        assert_eq!(response.confidence, 0.0);
        assert!(response.sources.is_empty());
    }

    #[tokio::test]
    async fn answer_includes_evidence_and_confidence() {
        let qa = service(vec![vec![hit(
            "Supervised learning uses labeled training data.",
            0.9,
        )]]);
        let response = qa
            .answer_question("What is supervised learning?", None)
            .await
            .unwrap();

        assert!(response.answer.to_lowercase().contains("supervised learning"));
        assert!(response.confidence > 0.3);
        assert_eq!(response.sources.len(), 1);
    }

    #[tokio::test]
    async fn completeness_overall_is_mean_of_topic_scores() {
        let qa = service(vec![
            vec![hit(
                "classification regression labeled data training prediction",
                0.9,
            )],
            Vec::new(),
        ]);
        let topics = vec!["supervised learning".to_string(), "cooking".to_string()];
        let response = qa.check_completeness(&topics, None).await.unwrap();

        assert_eq!(response.results.len(), 2);
        let mean = (response.results[0].coverage_score + response.results[1].coverage_score) / 2.0;
        assert!((response.overall_completeness - mean).abs() < 1e-6);

        let empty_topic = &response.results[1];
        assert_eq!(empty_topic.coverage_score, 0.0);
        assert_eq!(
            empty_topic.missing_aspects,
            vec!["No information about cooking".to_string()]
        );
    }

    #[tokio::test]
    async fn completeness_passes_document_filter_through() {
        let retriever = Arc::new(StubRetriever::new(vec![Vec::new()]));
        let qa = QaService::new(Arc::clone(&retriever), Arc::new(IndexMetrics::new()));
        let topics = vec!["supervised learning".to_string()];
        qa.check_completeness(&topics, Some(vec!["doc-1".into()]))
            .await
            .unwrap();

        let calls = retriever.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].document_ids, Some(vec!["doc-1".to_string()]));
        assert_eq!(calls[0].max_results, Some(COMPLETENESS_RESULTS));
    }

    #[tokio::test]
    async fn completeness_with_no_topics_scores_zero() {
        let qa = service(Vec::new());
        let response = qa.check_completeness(&[], None).await.unwrap();
        assert_eq!(response.overall_completeness, 0.0);
        assert!(response.results.is_empty());
        assert!(response.recommendations.is_empty());
    }
}
