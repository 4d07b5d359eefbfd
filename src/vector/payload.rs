//! Point id derivation and timestamp helpers for stored payloads.

use sha2::{Digest, Sha256};
use time::OffsetDateTime;

/// Derive the Qdrant point id for a chunk.
///
/// Qdrant only accepts UUIDs or integers as point ids, while chunk ids are
/// `{document_id}_{index}` strings. Hashing the chunk id and formatting the leading bytes as a
/// UUID keeps the id deterministic: re-indexing the same document overwrites its points.
pub fn point_id_for_chunk(chunk_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chunk_id.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!(
        "{}-{}-{}-{}-{}",
        &digest[0..8],
        &digest[8..12],
        &digest[12..16],
        &digest[16..20],
        &digest[20..32]
    )
}

/// Current timestamp formatted for payload storage.
pub fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_is_stable_and_uuid_shaped() {
        let a = point_id_for_chunk("doc_0");
        let b = point_id_for_chunk("doc_0");
        assert_eq!(a, b);

        let groups: Vec<usize> = a.split('-').map(str::len).collect();
        assert_eq!(groups, vec![8, 4, 4, 4, 12]);
    }

    #[test]
    fn distinct_chunks_get_distinct_point_ids() {
        assert_ne!(point_id_for_chunk("doc_0"), point_id_for_chunk("doc_1"));
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = current_timestamp_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }
}
