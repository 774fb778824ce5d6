//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use shorten::BatchOptions;
use shorten_config::OnRemoteFailure;
use shorten_context::{Shortener, Tokenizer};
use shorten_providers::{RewriteError, RewriteRequest, Rewriter};
use shorten_types::{SamplingParams, ShortenRequest};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CURRENT_OPEN: &str = "\"Current Text\": \"\"\"";
const CLOSE: &str = "\"\"\"";

/// The current text embedded in a rewrite prompt.
pub fn current_text(request: &RewriteRequest<'_>) -> String {
    let user = &request.messages[1].content;
    let start = user.find(CURRENT_OPEN).unwrap() + CURRENT_OPEN.len();
    let end = start + user[start..].find(CLOSE).unwrap();
    user[start..end].to_string()
}

/// Keeps the first half of each current text's words.
#[derive(Default)]
pub struct HalvingRewriter {
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl HalvingRewriter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rewriter for HalvingRewriter {
    async fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String, RewriteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push(request.messages[1].content.clone());
        let current = current_text(request);
        let words: Vec<&str> = current.split_whitespace().collect();
        Ok(words[..words.len().div_ceil(2)].join(" "))
    }
}

/// Halves like [`HalvingRewriter`] but fails with a transient error on any
/// chunk containing `marker`, or on call number `fail_on_call`.
pub struct PoisonedRewriter {
    marker: Option<&'static str>,
    fail_on_call: Option<usize>,
    pub calls: AtomicUsize,
    inner: HalvingRewriter,
}

impl PoisonedRewriter {
    pub fn new(marker: &'static str) -> Self {
        Self {
            marker: Some(marker),
            fail_on_call: None,
            calls: AtomicUsize::new(0),
            inner: HalvingRewriter::default(),
        }
    }

    pub fn on_call(call: usize) -> Self {
        Self {
            marker: None,
            fail_on_call: Some(call),
            calls: AtomicUsize::new(0),
            inner: HalvingRewriter::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rewriter for PoisonedRewriter {
    async fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String, RewriteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let poisoned = self
            .marker
            .is_some_and(|marker| current_text(request).contains(marker));
        if poisoned || self.fail_on_call == Some(call) {
            return Err(RewriteError::Transient {
                attempts: 10,
                message: "API error 503 Service Unavailable".into(),
            });
        }
        self.inner.rewrite(request).await
    }
}

/// The previous text embedded in a rewrite prompt.
pub fn previous_text(prompt: &str) -> &str {
    const OPEN: &str = "\"Previous Text\": \"\"\"";
    let start = prompt.find(OPEN).unwrap() + OPEN.len();
    let end = start + prompt[start..].find(CLOSE).unwrap();
    &prompt[start..end]
}

pub fn tokenizer() -> Tokenizer {
    Tokenizer::for_model("gpt-4").unwrap()
}

/// Small windows so short fixtures span several chunks.
pub fn small_shortener() -> Shortener {
    let request = ShortenRequest::new(0.5, 0.2, 0.2, 200).unwrap();
    Shortener::new(tokenizer(), request, 0, SamplingParams::default(), 1).unwrap()
}

pub fn words(n: usize) -> String {
    (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
}

/// Write `files` into `dir` and return their paths in the given order.
pub fn write_files(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            std::fs::write(&path, content).unwrap();
            path
        })
        .collect()
}

pub fn batch_options(output_dir: &Path, policy: OnRemoteFailure, concurrency: usize) -> BatchOptions {
    BatchOptions {
        output_dir: output_dir.to_path_buf(),
        output_prefix: String::new(),
        on_remote_failure: policy,
        max_concurrent_documents: NonZeroUsize::new(concurrency).unwrap(),
    }
}

pub fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 100, "completion_tokens": 10, "total_tokens": 110}
    })
}

/// Mount a Chat Completions endpoint that always answers `content`.
pub async fn mount_completion(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
        .mount(server)
        .await;
}
