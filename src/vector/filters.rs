//! Filter helpers for Qdrant queries against chunk payloads.

use serde_json::{Value, json};

/// Build a membership filter restricting results to the given document ids.
///
/// Returns `None` when the list is empty or contains only blank entries, so callers can pass
/// the optional filter straight through to the client.
pub fn document_ids_filter(document_ids: &[String]) -> Option<Value> {
    let cleaned: Vec<&str> = document_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .collect();

    match cleaned.as_slice() {
        [] => None,
        [single] => Some(document_filter(single)),
        many => Some(json!({
            "must": [
                {
                    "key": "document_id",
                    "match": { "any": many }
                }
            ]
        })),
    }
}

/// Build an equality filter for a single document id.
pub fn document_filter(document_id: &str) -> Value {
    json!({
        "must": [
            {
                "key": "document_id",
                "match": { "value": document_id }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_filter_uses_match_any() {
        let filter = document_ids_filter(&["a".into(), "b".into()]).expect("filter");
        assert_eq!(
            filter,
            json!({
                "must": [
                    {
                        "key": "document_id",
                        "match": { "any": ["a", "b"] }
                    }
                ]
            })
        );
    }

    #[test]
    fn single_id_collapses_to_equality() {
        let filter = document_ids_filter(&["doc-1".into()]).expect("filter");
        assert_eq!(filter, document_filter("doc-1"));
    }

    #[test]
    fn empty_and_blank_ids_yield_no_filter() {
        assert!(document_ids_filter(&[]).is_none());
        assert!(document_ids_filter(&["   ".into()]).is_none());
    }
}
