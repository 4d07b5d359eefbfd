//! Content-addressed document and chunk identifiers.
//!
//! A document id is a SHA-256 digest of the filename, the content length, and the first 100
//! characters of content. Re-uploading an unchanged file therefore maps to the same id and is
//! idempotent. Known limitation, accepted by design: two distinct documents sharing a
//! filename and identical leading content collide.

use sha2::{Digest, Sha256};

/// Number of leading characters folded into the document digest.
const ID_PREFIX_CHARS: usize = 100;

/// Separator between a document id and the chunk index inside a chunk id.
///
/// Document ids are hex digests and can never contain this token, so chunk ids always parse
/// back to their owning document unambiguously.
const CHUNK_SEPARATOR: char = '_';

/// Derive the stable document id for a filename/content pair.
pub fn document_id(filename: &str, content: &str) -> String {
    let prefix: String = content.chars().take(ID_PREFIX_CHARS).collect();
    let unique = format!("{filename}_{}_{prefix}", content.chars().count());

    let mut hasher = Sha256::new();
    hasher.update(unique.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compose the chunk id for a zero-based position within a document.
pub fn chunk_id(document_id: &str, index: usize) -> String {
    format!("{document_id}{CHUNK_SEPARATOR}{index}")
}

/// Recover the owning document id and chunk index from a chunk id.
///
/// Returns `None` when the input does not follow the `{document_id}_{index}` shape.
pub fn parse_chunk_id(chunk_id: &str) -> Option<(&str, usize)> {
    let (document, index) = chunk_id.rsplit_once(CHUNK_SEPARATOR)?;
    if document.is_empty() {
        return None;
    }
    let index = index.parse().ok()?;
    Some((document, index))
}
