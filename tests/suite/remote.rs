//! Full pipeline against a mock Chat Completions server

use std::time::Duration;

use shorten::run_batch;
use shorten_config::OnRemoteFailure;
use shorten_providers::retry::RetryConfig;
use shorten_providers::{ApiConfig, OpenAIRewriter};
use shorten_types::ApiKey;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{batch_options, mount_completion, small_shortener, words, write_files};

fn rewriter_for(server: &MockServer) -> OpenAIRewriter {
    let config = ApiConfig::new(ApiKey::new("sk-test").unwrap(), &format!("{}/v1", server.uri()))
        .unwrap()
        .with_retry(RetryConfig {
            max_retries: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter_factor: 0.0,
        });
    OpenAIRewriter::new(&config).unwrap()
}

#[tokio::test]
async fn one_request_per_window() {
    let server = MockServer::start().await;
    mount_completion(&server, "shortened chunk").await;

    let shortener = small_shortener();
    let text = words(300);
    let windows = shortener.plan_windows(&text).unwrap().len();

    let result = shortener
        .shorten(&rewriter_for(&server), &text, "doc.txt")
        .await
        .unwrap();

    assert_eq!(result.chunks().len(), windows);
    assert_eq!(result.text(), vec!["shortened chunk"; windows].join("\n"));
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), windows);

    let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    let user = second["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("\"Previous Text\": \"\"\"shortened chunk\"\"\""));
    assert_eq!(second["messages"][0]["role"], "system");
    assert_eq!(second["model"], "gpt-4");
}

#[tokio::test]
async fn server_errors_fail_only_the_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_files(input.path(), &[("a.txt", "short text"), ("b.txt", "more text")]);
    let documents = shorten::list_documents(input.path()).unwrap();
    let options = batch_options(output.path(), OnRemoteFailure::SkipDocument, 1);

    let report = run_batch(&small_shortener(), &rewriter_for(&server), &documents, &options).await;

    assert!(!report.aborted);
    assert_eq!(report.documents.len(), 2);
    assert!(report.documents.iter().all(|d| !d.outcome.is_shortened()));
    // Two attempts per document with max_retries = 1.
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}
