//! HTTP client wrapper for interacting with Qdrant.

use crate::config::get_config;
use crate::vector::types::{
    CountResponse, PointInsert, QueryResponse, QueryResponseResult, ScoredPoint, ScrollResponse,
    VectorStoreError,
};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Map, Value, json};

/// Lightweight HTTP client for Qdrant operations.
///
/// Constructed once near process start and shared by reference; the underlying `reqwest`
/// client pools connections internally.
pub struct VectorStoreService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl VectorStoreService {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, VectorStoreError> {
        let config = get_config();
        let client = Client::builder().user_agent("kbsearch/0.1").build()?;

        let base_url =
            normalize_base_url(&config.qdrant_url).map_err(VectorStoreError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = %config
                .qdrant_api_key
                .as_deref()
                .map(|value| !value.is_empty())
                .unwrap_or(false),
            "Initialized Qdrant HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.qdrant_api_key.clone(),
        })
    }

    /// Create a cosine-distance collection only when it is missing from Qdrant.
    pub async fn create_collection_if_not_exists(
        &self,
        collection_name: &str,
        vector_size: u64,
    ) -> Result<(), VectorStoreError> {
        if self.collection_exists(collection_name).await? {
            return Ok(());
        }

        tracing::debug!(
            collection = collection_name,
            vector_size,
            "Creating collection"
        );
        self.create_collection(collection_name, vector_size).await
    }

    /// Create or update a collection with the specified vector size.
    pub async fn create_collection(
        &self,
        collection_name: &str,
        vector_size: u64,
    ) -> Result<(), VectorStoreError> {
        let body = json!({
            "vectors": {
                "size": vector_size,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{collection_name}"))?
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = collection_name, "Collection ensured/created");
        })
        .await
    }

    /// Ensure payload indexes exist for the filterable chunk metadata fields.
    pub async fn ensure_payload_indexes(
        &self,
        collection_name: &str,
    ) -> Result<(), VectorStoreError> {
        let fields: [(&str, &str); 2] = [("document_id", "keyword"), ("filename", "keyword")];

        for (field, schema) in fields {
            let body = json!({
                "field_name": field,
                "field_schema": schema,
            });

            let response = self
                .request(Method::PUT, &format!("collections/{collection_name}/index"))?
                .json(&body)
                .send()
                .await?;

            if response.status().is_success() {
                tracing::debug!(
                    collection = collection_name,
                    field,
                    schema,
                    "Payload index ensured"
                );
            } else if response.status() == StatusCode::CONFLICT {
                tracing::debug!(
                    collection = collection_name,
                    field,
                    schema,
                    "Payload index already exists"
                );
            } else {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = VectorStoreError::UnexpectedStatus { status, body };
                tracing::warn!(collection = collection_name, field, schema, error = %error, "Failed to ensure payload index");
            }
        }

        Ok(())
    }

    /// Upsert a batch of prepared points into the given collection.
    ///
    /// Callers are responsible for splitting large documents into transport batches; this
    /// method issues exactly one request.
    pub async fn upsert_points(
        &self,
        collection_name: &str,
        points: &[PointInsert],
    ) -> Result<(), VectorStoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let serialized: Vec<Value> = points
            .iter()
            .map(|point| {
                json!({
                    "id": point.point_id,
                    "vector": point.vector,
                    "payload": point.payload,
                })
            })
            .collect();

        let point_count = serialized.len();
        let response = self
            .request(
                Method::PUT,
                &format!("collections/{collection_name}/points"),
            )?
            .query(&[("wait", true)])
            .json(&json!({ "points": serialized }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                collection = collection_name,
                points = point_count,
                "Points upserted"
            );
        })
        .await
    }

    /// Perform a similarity search against a collection, returning scored payloads.
    ///
    /// Results come back ordered best-first by cosine similarity; `score_threshold` is pushed
    /// down to the store when provided.
    pub async fn query_points(
        &self,
        collection_name: &str,
        vector: Vec<f32>,
        filter: Option<Value>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>, VectorStoreError> {
        let mut body = json!({
            "query": vector,
            "limit": limit,
            "with_payload": true,
        });
        let obj = body
            .as_object_mut()
            .expect("query body should remain an object");

        if let Some(threshold) = score_threshold {
            obj.insert("score_threshold".into(), Value::from(threshold));
        }

        if let Some(filter_value) = filter {
            obj.insert("filter".into(), filter_value);
        }

        let response = self
            .request(
                Method::POST,
                &format!("collections/{collection_name}/points/query"),
            )?
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = VectorStoreError::UnexpectedStatus { status, body };
            tracing::error!(collection = collection_name, error = %error, "Qdrant search failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        let points = match payload.result {
            QueryResponseResult::Points(points) => points,
            QueryResponseResult::Object { points } => points,
        };
        let results = points
            .into_iter()
            .map(|point| ScoredPoint {
                id: stringify_point_id(point.id),
                score: point.score,
                payload: point.payload,
            })
            .collect();

        Ok(results)
    }

    /// Scroll all points matching a filter, returning point ids with their payloads.
    pub async fn scroll_points(
        &self,
        collection: &str,
        filter: Option<Value>,
    ) -> Result<Vec<(String, Map<String, Value>)>, VectorStoreError> {
        let mut offset: Option<Value> = None;
        let mut results = Vec::new();
        let filter_body = filter.unwrap_or_else(|| json!({ "must": [] }));

        loop {
            let mut body = json!({
                "with_payload": true,
                "with_vector": false,
                "limit": 512,
                "offset": offset.clone().unwrap_or(Value::Null),
                "filter": filter_body.clone(),
            });

            if offset.is_none() {
                body.as_object_mut()
                    .expect("scroll body should remain an object")
                    .remove("offset");
            }

            let response = self
                .request(
                    Method::POST,
                    &format!("collections/{collection}/points/scroll"),
                )?
                .json(&body)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = VectorStoreError::UnexpectedStatus { status, body };
                tracing::error!(collection, error = %error, "Failed to scroll points");
                return Err(error);
            }

            let ScrollResponse { result } = response.json().await?;
            for point in result.points {
                if let (Some(id), Some(payload)) = (point.id, point.payload) {
                    results.push((stringify_point_id(id), payload));
                }
            }

            match result.next_page_offset {
                Some(next) if !next.is_null() => offset = Some(next),
                _ => break,
            }
        }

        Ok(results)
    }

    /// Delete the points with the given ids from a collection.
    pub async fn delete_points(
        &self,
        collection_name: &str,
        point_ids: &[String],
    ) -> Result<(), VectorStoreError> {
        if point_ids.is_empty() {
            return Ok(());
        }

        let response = self
            .request(
                Method::POST,
                &format!("collections/{collection_name}/points/delete"),
            )?
            .query(&[("wait", true)])
            .json(&json!({ "points": point_ids }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                collection = collection_name,
                points = point_ids.len(),
                "Points deleted"
            );
        })
        .await
    }

    /// Count the points stored in a collection, optionally restricted by a filter.
    pub async fn count_points(
        &self,
        collection_name: &str,
        filter: Option<Value>,
    ) -> Result<usize, VectorStoreError> {
        let mut body = json!({ "exact": true });
        if let Some(filter_value) = filter {
            body.as_object_mut()
                .expect("count body should remain an object")
                .insert("filter".into(), filter_value);
        }

        let response = self
            .request(
                Method::POST,
                &format!("collections/{collection_name}/points/count"),
            )?
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = VectorStoreError::UnexpectedStatus { status, body };
            tracing::error!(collection = collection_name, error = %error, "Qdrant count failed");
            return Err(error);
        }

        let payload: CountResponse = response.json().await?;
        Ok(payload.result.count)
    }

    async fn collection_exists(&self, collection_name: &str) -> Result<bool, VectorStoreError> {
        let response = self
            .request(Method::GET, &format!("collections/{collection_name}"))?
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = VectorStoreError::UnexpectedStatus { status, body };
                tracing::error!(collection = collection_name, error = %error, "Collection existence check failed");
                Err(error)
            }
        }
    }

    fn request(
        &self,
        method: Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, VectorStoreError> {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key {
            if !api_key.is_empty() {
                req = req.header("api-key", api_key);
            }
        }
        Ok(req)
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), VectorStoreError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = VectorStoreError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Qdrant request failed");
            Err(error)
        }
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

fn stringify_point_id(id: Value) -> String {
    match id {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::filters::document_ids_filter;
    use httpmock::{Method::POST, MockServer};
    use reqwest::Client;

    fn test_service(base_url: String) -> VectorStoreService {
        VectorStoreService {
            client: Client::builder()
                .user_agent("kbsearch-test")
                .build()
                .expect("client"),
            base_url,
            api_key: None,
        }
    }

    #[tokio::test]
    async fn query_points_emits_expected_request() {
        let server = MockServer::start_async().await;

        let filter = document_ids_filter(&["doc-a".into()]).expect("filter value");

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/kb/points/query");
                then.status(200).json_body(json!({
                    "status": "ok",
                    "time": 0.0,
                    "result": [
                        {
                            "id": "11111111-2222-3333-4444-555555555555",
                            "score": 0.91,
                            "payload": {
                                "document_id": "doc-a",
                                "chunk_id": "doc-a_0",
                                "content": "Example chunk"
                            }
                        }
                    ]
                }));
            })
            .await;

        let service = test_service(server.base_url());
        let results = service
            .query_points("kb", vec![0.1, 0.2], Some(filter), 3, Some(0.7))
            .await
            .expect("search request");

        mock.assert();

        assert_eq!(results.len(), 1);
        let hit = &results[0];
        assert!((hit.score - 0.91).abs() < f32::EPSILON);
        let payload = hit.payload.as_ref().expect("payload");
        assert_eq!(payload["document_id"], Value::String("doc-a".into()));
        assert_eq!(payload["chunk_id"], Value::String("doc-a_0".into()));
    }

    #[tokio::test]
    async fn scroll_points_follows_pagination() {
        let server = MockServer::start_async().await;

        let first = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/kb/points/scroll")
                    .matches(|req| {
                        let body = req.body.clone().unwrap_or_default();
                        !String::from_utf8_lossy(&body).contains("\"offset\"")
                    });
                then.status(200).json_body(json!({
                    "result": {
                        "points": [
                            { "id": "p-1", "payload": { "document_id": "doc-a" } }
                        ],
                        "next_page_offset": "p-2"
                    }
                }));
            })
            .await;

        let second = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/kb/points/scroll")
                    .body_contains("\"offset\"");
                then.status(200).json_body(json!({
                    "result": {
                        "points": [
                            { "id": "p-2", "payload": { "document_id": "doc-a" } }
                        ],
                        "next_page_offset": null
                    }
                }));
            })
            .await;

        let service = test_service(server.base_url());
        let results = service
            .scroll_points("kb", None)
            .await
            .expect("scroll request");

        first.assert();
        second.assert();
        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["p-1", "p-2"]);
    }

    #[tokio::test]
    async fn count_points_parses_result() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/kb/points/count");
                then.status(200)
                    .json_body(json!({ "result": { "count": 42 } }));
            })
            .await;

        let service = test_service(server.base_url());
        let count = service.count_points("kb", None).await.expect("count");

        mock.assert();
        assert_eq!(count, 42);
    }
}
