//! Processing service coordinating chunking, embedding, and vector store operations.

use crate::{
    config::get_config,
    embedding::{EmbeddingClient, get_embedding_client},
    metrics::{IndexMetrics, MetricsSnapshot},
    processing::{
        chunking::chunk_words,
        extract::{DocumentKind, PlainTextExtractor, TextExtractor},
        identity,
        mappers::{build_point, map_scored_point, summarize_documents},
        types::{
            Chunk, DeleteOutcome, DocumentSummary, IndexOutcome, IndexStats, ProcessingError,
            SearchError, SearchOptions, SearchResult,
        },
    },
    vector::{PointInsert, VectorStoreService, current_timestamp_rfc3339, document_filter,
        document_ids_filter},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Coordinates the full pipeline: chunking, identity assignment, embedding, and storage.
///
/// The service owns long-lived handles to the embedding client, the vector store transport,
/// the text extractor, and the metrics registry. Construct it once near process start and
/// share it through an `Arc`; no other in-process mutable index state exists, so no locking
/// is needed across requests.
pub struct ProcessingService {
    embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
    vector_store: VectorStoreService,
    extractor: Box<dyn TextExtractor>,
    metrics: Arc<IndexMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface.
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Extract, chunk, embed, and index an uploaded document.
    async fn index_document(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IndexOutcome, ProcessingError>;

    /// Execute a similarity search, best hit first.
    async fn search(&self, options: SearchOptions) -> Result<Vec<SearchResult>, SearchError>;

    /// Remove all chunks belonging to a document. Idempotent.
    async fn delete_document(&self, document_id: &str) -> Result<DeleteOutcome, ProcessingError>;

    /// Replace a stored document with new content.
    async fn update_document(
        &self,
        document_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IndexOutcome, ProcessingError>;

    /// List stored documents, reconstructed from chunk payloads.
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ProcessingError>;

    /// Aggregate index statistics.
    async fn stats(&self) -> Result<IndexStats, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Build a new processing service, initializing backing services as needed.
    pub async fn new() -> Self {
        let config = get_config();
        tracing::info!("Initializing embedding client");
        let embedding_client = get_embedding_client();
        let vector_store = VectorStoreService::new().expect("Failed to connect to Qdrant");
        let vector_size = config.embedding_dimension as u64;
        tracing::debug!(
            collection = %config.qdrant_collection_name,
            vector_size,
            "Ensuring primary collection"
        );
        vector_store
            .create_collection_if_not_exists(&config.qdrant_collection_name, vector_size)
            .await
            .expect("Failed to ensure Qdrant collection exists");
        vector_store
            .ensure_payload_indexes(&config.qdrant_collection_name)
            .await
            .expect("Failed to ensure Qdrant payload indexes");
        tracing::debug!(collection = %config.qdrant_collection_name, "Primary collection ready");

        Self {
            embedding_client,
            vector_store,
            extractor: Box::new(PlainTextExtractor),
            metrics: Arc::new(IndexMetrics::new()),
        }
    }

    /// Extract, chunk, embed, and index an uploaded document.
    pub async fn index_document(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IndexOutcome, ProcessingError> {
        let kind = DocumentKind::from_filename(filename)?;
        let text = self.extractor.extract(bytes, kind)?;
        self.index_text(filename, kind, &text).await
    }

    /// Chunk, embed, and index already-extracted text.
    pub async fn index_text(
        &self,
        filename: &str,
        kind: DocumentKind,
        text: &str,
    ) -> Result<IndexOutcome, ProcessingError> {
        let config = get_config();
        tracing::info!(filename, kind = kind.as_str(), "Processing document");

        let windows = chunk_words(text, config.chunk_size, config.chunk_overlap)?;
        let chunks = build_chunk_records(filename, kind, text, windows);
        self.index_chunks(chunks).await
    }

    /// Embed and upsert prepared chunks.
    ///
    /// A single call always carries exactly one source document's chunks, so the first
    /// chunk's document id identifies the batch.
    pub async fn index_chunks(&self, chunks: Vec<Chunk>) -> Result<IndexOutcome, ProcessingError> {
        if chunks.is_empty() {
            return Err(ProcessingError::EmptyBatch);
        }
        let config = get_config();
        let document_id = chunks[0].document_id.clone();

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let embeddings = self.embedding_client.generate_embeddings(texts).await?;
        debug_assert_eq!(chunks.len(), embeddings.len());

        let points: Vec<PointInsert> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, vector)| build_point(chunk, vector))
            .collect();

        // Transport batching only: the stored state is identical to a single large upsert.
        // A mid-document failure must not leave a partially indexed document behind.
        let batch_size = config.upsert_batch_size.max(1);
        for batch in points.chunks(batch_size) {
            if let Err(error) = self
                .vector_store
                .upsert_points(&config.qdrant_collection_name, batch)
                .await
            {
                self.cleanup_partial_upload(&document_id).await;
                return Err(error.into());
            }
        }

        self.metrics.record_document(points.len() as u64);
        tracing::info!(
            document_id = %document_id,
            chunks = points.len(),
            "Document indexed"
        );

        Ok(IndexOutcome {
            document_id,
            chunks_added: points.len(),
        })
    }

    /// Best-effort removal of chunks written before a failed upsert batch.
    async fn cleanup_partial_upload(&self, document_id: &str) {
        tracing::warn!(document_id, "Upsert failed mid-document; removing partial chunks");
        if let Err(error) = self.delete_document(document_id).await {
            tracing::error!(
                document_id,
                error = %error,
                "Failed to clean up partially indexed document"
            );
        }
    }

    /// Execute a similarity search against the vector store.
    ///
    /// Hits come back best-first; every returned score is at or above the effective
    /// threshold and the result count never exceeds the effective limit. An empty query or
    /// an empty index yields an empty list, not an error.
    pub async fn search(
        &self,
        options: SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let config = get_config();
        let SearchOptions {
            query,
            max_results,
            document_ids,
            similarity_threshold,
        } = options;

        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = self
            .embedding_client
            .generate_embeddings(vec![query])
            .await?;
        let vector = vectors.pop().ok_or(SearchError::EmptyEmbedding)?;

        let expected = config.embedding_dimension;
        let actual = vector.len();
        if actual != expected {
            return Err(SearchError::DimensionMismatch { expected, actual });
        }

        let limit = max_results.unwrap_or(config.max_search_results).max(1);
        let threshold = similarity_threshold
            .unwrap_or(config.similarity_threshold)
            .clamp(0.0, 1.0);

        let filter = document_ids
            .as_deref()
            .and_then(document_ids_filter);

        let points = self
            .vector_store
            .query_points(
                &config.qdrant_collection_name,
                vector,
                filter,
                limit,
                Some(threshold),
            )
            .await?;

        let mut results: Vec<SearchResult> =
            points.into_iter().map(map_scored_point).collect();
        // The store already applies the threshold; keep the client-side guard so the
        // guarantee holds even against stores that ignore score_threshold.
        results.retain(|result| result.similarity_score >= threshold);
        results.truncate(limit);

        self.metrics.record_search();
        Ok(results)
    }

    /// Remove all chunks belonging to a document.
    ///
    /// Deleting an id that was never indexed is not an error; the outcome reports zero
    /// deleted chunks and a `not_found` status.
    pub async fn delete_document(
        &self,
        document_id: &str,
    ) -> Result<DeleteOutcome, ProcessingError> {
        let config = get_config();
        let matches = self
            .vector_store
            .scroll_points(
                &config.qdrant_collection_name,
                Some(document_filter(document_id)),
            )
            .await?;

        let point_ids: Vec<String> = matches.into_iter().map(|(id, _)| id).collect();
        let chunks_deleted = point_ids.len();

        if chunks_deleted > 0 {
            self.vector_store
                .delete_points(&config.qdrant_collection_name, &point_ids)
                .await?;
        }

        tracing::info!(document_id, chunks_deleted, "Document deleted");
        Ok(DeleteOutcome {
            document_id: document_id.to_string(),
            chunks_deleted,
        })
    }

    /// Replace a stored document with new content.
    ///
    /// Implemented as delete-then-reinsert. The two steps are not transactional: a search
    /// running between them observes a temporary absence of the document's chunks.
    pub async fn update_document(
        &self,
        document_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IndexOutcome, ProcessingError> {
        self.delete_document(document_id).await?;
        self.index_document(filename, bytes).await
    }

    /// List stored documents by grouping chunk payloads back to their owning document.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ProcessingError> {
        let config = get_config();
        let points = self
            .vector_store
            .scroll_points(&config.qdrant_collection_name, None)
            .await?;
        let payloads = points.into_iter().map(|(_, payload)| payload).collect();
        Ok(summarize_documents(payloads))
    }

    /// Aggregate index statistics.
    pub async fn stats(&self) -> Result<IndexStats, ProcessingError> {
        let config = get_config();
        let total_chunks = self
            .vector_store
            .count_points(&config.qdrant_collection_name, None)
            .await?;
        let total_documents = self.list_documents().await?.len();

        Ok(IndexStats {
            total_documents,
            total_chunks,
            collection_name: config.qdrant_collection_name.clone(),
        })
    }

    /// Return the current activity metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Shared handle to the activity metrics, for wiring into sibling services.
    pub fn metrics_handle(&self) -> Arc<IndexMetrics> {
        Arc::clone(&self.metrics)
    }
}

/// Assemble identified chunk records from raw windows.
pub(crate) fn build_chunk_records(
    filename: &str,
    kind: DocumentKind,
    text: &str,
    windows: Vec<String>,
) -> Vec<Chunk> {
    let document_id = identity::document_id(filename, text);
    let total_chunks = windows.len();
    let created_at = current_timestamp_rfc3339();

    windows
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk {
            chunk_id: identity::chunk_id(&document_id, index),
            document_id: document_id.clone(),
            content,
            chunk_index: index,
            total_chunks,
            filename: filename.to_string(),
            document_type: kind.as_str().to_string(),
            created_at: created_at.clone(),
        })
        .collect()
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    async fn index_document(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IndexOutcome, ProcessingError> {
        ProcessingService::index_document(self, filename, bytes).await
    }

    async fn search(&self, options: SearchOptions) -> Result<Vec<SearchResult>, SearchError> {
        ProcessingService::search(self, options).await
    }

    async fn delete_document(&self, document_id: &str) -> Result<DeleteOutcome, ProcessingError> {
        ProcessingService::delete_document(self, document_id).await
    }

    async fn update_document(
        &self,
        document_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IndexOutcome, ProcessingError> {
        ProcessingService::update_document(self, document_id, filename, bytes).await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ProcessingError> {
        ProcessingService::list_documents(self).await
    }

    async fn stats(&self) -> Result<IndexStats, ProcessingError> {
        ProcessingService::stats(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}
