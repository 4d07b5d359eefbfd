//! Mapping helpers between pipeline records and vector store payloads.

use crate::{
    processing::types::{Chunk, DocumentSummary, SearchResult},
    vector::{PointInsert, ScoredPoint, point_id_for_chunk},
};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Build the payload object stored alongside an indexed chunk.
pub(crate) fn build_payload(chunk: &Chunk) -> Value {
    json!({
        "document_id": chunk.document_id,
        "chunk_id": chunk.chunk_id,
        "content": chunk.content,
        "chunk_index": chunk.chunk_index,
        "total_chunks": chunk.total_chunks,
        "filename": chunk.filename,
        "document_type": chunk.document_type,
        "created_at": chunk.created_at,
    })
}

/// Pair a chunk with its embedding vector, ready for upsert.
pub(crate) fn build_point(chunk: &Chunk, vector: Vec<f32>) -> PointInsert {
    PointInsert {
        point_id: point_id_for_chunk(&chunk.chunk_id),
        vector,
        payload: build_payload(chunk),
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> String {
    match map.remove(key) {
        Some(Value::String(value)) => value,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Map a scored point into a search result.
///
/// Identity fields are lifted out of the payload; whatever remains is carried along as
/// metadata so callers keep positional context (`chunk_index`, `total_chunks`, timestamps).
pub(crate) fn map_scored_point(point: ScoredPoint) -> SearchResult {
    let mut payload = point.payload.unwrap_or_default();

    let document_id = take_string(&mut payload, "document_id");
    let filename = take_string(&mut payload, "filename");
    let chunk_id = take_string(&mut payload, "chunk_id");
    let content = take_string(&mut payload, "content");

    SearchResult {
        document_id,
        filename,
        chunk_id,
        content,
        similarity_score: point.score,
        metadata: payload,
    }
}

/// Group scrolled chunk payloads back into per-document summaries.
///
/// Output is ordered by document id for stable listings.
pub(crate) fn summarize_documents(payloads: Vec<Map<String, Value>>) -> Vec<DocumentSummary> {
    let mut grouped: BTreeMap<String, DocumentSummary> = BTreeMap::new();

    for mut payload in payloads {
        let document_id = take_string(&mut payload, "document_id");
        if document_id.is_empty() {
            continue;
        }
        let filename = take_string(&mut payload, "filename");
        let created_at = take_string(&mut payload, "created_at");

        grouped
            .entry(document_id.clone())
            .and_modify(|summary| summary.chunk_count += 1)
            .or_insert(DocumentSummary {
                document_id,
                filename,
                chunk_count: 1,
                created_at,
            });
    }

    grouped.into_values().collect()
}
