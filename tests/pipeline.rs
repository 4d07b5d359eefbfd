//! End-to-end pipeline tests against a mocked Qdrant instance.
//!
//! The embedding client and all scoring logic run for real; only the vector store transport
//! is mocked. Configuration is process-global, so every test shares one leaked mock server.

use httpmock::{
    Method::{GET, POST, PUT},
    MockServer,
};
use kbsearch::{config, processing::ProcessingService, qa::QaService};
use regex::Regex;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::const_new();

const COLLECTION: &str = "kb-test";
const DOCUMENT_TEXT: &str = "Supervised learning uses labeled training data. \
    Models are trained on input output pairs and evaluated on held out examples afterwards.";

fn set_env(key: &str, value: &str) {
    // SAFETY: Tests establish deterministic configuration before any service is built.
    unsafe { std::env::set_var(key, value) }
}

async fn init_harness() {
    INIT.get_or_init(|| async {
        let server = Box::leak(Box::new(MockServer::start_async().await));
        let base_url = server.base_url();

        set_env("QDRANT_URL", &base_url);
        set_env("QDRANT_COLLECTION_NAME", COLLECTION);
        set_env("EMBEDDING_DIMENSION", "64");
        set_env("CHUNK_SIZE", "100");
        set_env("CHUNK_OVERLAP", "10");
        config::init_config();

        let index_regex = Regex::new(r"/index$").expect("index path regex");

        // Collection exists, so startup skips creation.
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/collections/{COLLECTION}"));
                then.status(200).json_body(json!({
                    "status": "ok",
                    "time": 0.0,
                    "result": {}
                }));
            })
            .await;

        server
            .mock_async(move |when, then| {
                when.method(PUT).path_matches(index_regex.clone());
                then.status(200).json_body(json!({
                    "status": "ok",
                    "time": 0.0,
                    "result": {}
                }));
            })
            .await;

        // Upserts always succeed; stored state is scripted per endpoint below.
        server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path(format!("/collections/{COLLECTION}/points"));
                then.status(200).json_body(json!({
                    "status": "ok",
                    "time": 0.0,
                    "result": { "operation_id": 1, "status": "completed" }
                }));
            })
            .await;

        // Every similarity query retrieves the indexed chunk with a strong score.
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/collections/{COLLECTION}/points/query"));
                then.status(200).json_body(json!({
                    "status": "ok",
                    "time": 0.0,
                    "result": [
                        {
                            "id": "11111111-2222-3333-4444-555555555555",
                            "score": 0.9,
                            "payload": {
                                "document_id": "doc-ml",
                                "chunk_id": "doc-ml_0",
                                "filename": "ml_basics.txt",
                                "content": DOCUMENT_TEXT,
                                "chunk_index": 0,
                                "total_chunks": 1
                            }
                        }
                    ]
                }));
            })
            .await;

        // Scrolling for a document that was never indexed finds nothing.
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/collections/{COLLECTION}/points/scroll"));
                then.status(200).json_body(json!({
                    "result": {
                        "points": [],
                        "next_page_offset": null
                    }
                }));
            })
            .await;
    })
    .await;
}

async fn build_services() -> (Arc<ProcessingService>, QaService<ProcessingService>) {
    init_harness().await;
    let processing = Arc::new(ProcessingService::new().await);
    let qa = QaService::new(Arc::clone(&processing), processing.metrics_handle());
    (processing, qa)
}

#[tokio::test]
async fn index_then_ask_yields_grounded_answer() {
    let (processing, qa) = build_services().await;

    let outcome = processing
        .index_document("ml_basics.txt", DOCUMENT_TEXT.as_bytes())
        .await
        .expect("indexing succeeds");
    assert_eq!(outcome.chunks_added, 1);
    assert_eq!(outcome.document_id.len(), 64);
    assert!(outcome.document_id.chars().all(|c| c.is_ascii_hexdigit()));

    let response = qa
        .answer_question("What is supervised learning?", None)
        .await
        .expect("question answered");

    assert!(
        response.answer.to_lowercase().contains("supervised learning"),
        "answer should quote the indexed sentence: {}",
        response.answer
    );
    assert!(
        response.confidence > 0.3,
        "confidence should reflect the strong retrieval score: {}",
        response.confidence
    );
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].chunk_id, "doc-ml_0");
    assert!(response.processing_time >= 0.0);
}

#[tokio::test]
async fn search_results_respect_limit_and_carry_identity() {
    let (processing, _) = build_services().await;

    let results = processing
        .search(kbsearch::processing::SearchOptions {
            query: "labeled training data".to_string(),
            max_results: Some(1),
            ..Default::default()
        })
        .await
        .expect("search succeeds");

    assert_eq!(results.len(), 1);
    let hit = &results[0];
    assert_eq!(hit.document_id, "doc-ml");
    assert_eq!(hit.filename, "ml_basics.txt");
    assert!(hit.similarity_score >= 0.7);
    assert!(hit.content.contains("Supervised learning"));
}

#[tokio::test]
async fn deleting_unknown_document_is_idempotent() {
    let (processing, _) = build_services().await;

    let first = processing
        .delete_document("never-indexed")
        .await
        .expect("delete succeeds");
    assert_eq!(first.chunks_deleted, 0);
    assert_eq!(first.status(), "not_found");

    let second = processing
        .delete_document("never-indexed")
        .await
        .expect("repeat delete succeeds");
    assert_eq!(second.chunks_deleted, 0);
    assert_eq!(second.status(), "not_found");
}
