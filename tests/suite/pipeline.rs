//! Splitting, rewriting and assembly through the public API

use shorten_context::{CHUNK_SEPARATOR, ShortenError, split_with_lookahead};
use shorten_types::{ContextRatio, ValidationError};

use crate::common::{
    HalvingRewriter, PoisonedRewriter, previous_text, small_shortener, tokenizer, words,
};

fn hellos(n: usize) -> String {
    let mut text = String::from("hello");
    for _ in 1..n {
        text.push_str(" hello");
    }
    text
}

#[test]
fn windows_partition_the_document() {
    let tokenizer = tokenizer();
    let text = hellos(1000);
    let next = ContextRatio::new("next", 0.2).unwrap();

    let windows = split_with_lookahead(&tokenizer, &text, 300, next).unwrap();

    assert_eq!(windows.len(), 5);
    let currents: Vec<usize> = windows.iter().map(|w| w.current().token_count()).collect();
    assert_eq!(currents, vec![240, 240, 240, 240, 40]);
    let rejoined: String = windows.iter().map(|w| w.current().text()).collect();
    assert_eq!(rejoined, text);
}

#[test]
fn newlines_survive_splitting() {
    let tokenizer = tokenizer();
    let text = "first line\nsecond line\n\nthird paragraph\n".repeat(20);
    let windows =
        split_with_lookahead(&tokenizer, &text, 30, ContextRatio::new("next", 0.2).unwrap())
            .unwrap();

    assert!(windows.len() > 1);
    let rejoined: String = windows.iter().map(|w| w.current().text()).collect();
    assert_eq!(rejoined, text);
}

#[tokio::test]
async fn shortens_document_with_rolling_context() {
    let shortener = small_shortener();
    let text = words(300);
    let windows = shortener.plan_windows(&text).unwrap();
    assert!(windows.len() >= 3);

    let rewriter = HalvingRewriter::default();
    let result = shortener.shorten(&rewriter, &text, "doc.txt").await.unwrap();

    assert_eq!(rewriter.calls(), windows.len());
    assert_eq!(result.chunks().len(), windows.len());
    assert_eq!(result.text(), result.chunks().join(CHUNK_SEPARATOR));
    assert!(result.stats().final_tokens < result.stats().original_tokens);
    assert_eq!(result.stats().original_chars, text.chars().count());

    let prompts = rewriter.prompts.lock().unwrap();
    assert_eq!(previous_text(&prompts[0]), "");
    // Each later prompt's previous text is a tail of the output before it.
    for (i, prompt) in prompts.iter().enumerate().skip(1) {
        let previous = previous_text(prompt);
        assert!(!previous.is_empty());
        assert!(result.chunks()[i - 1].ends_with(previous));
    }
}

#[tokio::test]
async fn previous_text_is_capped_when_last_output_is_longer() {
    let shortener = small_shortener();
    let tokenizer = tokenizer();
    let cap = shortener.plan().previous_tokens();
    let text = words(300);

    let rewriter = HalvingRewriter::default();
    let result = shortener.shorten(&rewriter, &text, "doc.txt").await.unwrap();

    let prompts = rewriter.prompts.lock().unwrap();
    assert!(prompts.len() >= 3);
    for (i, prompt) in prompts.iter().enumerate().skip(1) {
        let prior = &result.chunks()[i - 1];
        assert!(tokenizer.count(prior) > cap, "chunk {i} too short to cut");

        let previous = previous_text(prompt);
        assert!(tokenizer.count(previous) <= cap);
        assert!(previous.len() < prior.len());
    }
}

#[tokio::test]
async fn empty_document_is_a_validation_error() {
    let rewriter = HalvingRewriter::default();
    let err = small_shortener()
        .shorten(&rewriter, "", "empty.txt")
        .await
        .unwrap_err();

    assert!(matches!(err, ShortenError::Validation(ValidationError::EmptyText)));
    assert!(!err.is_remote());
    assert_eq!(rewriter.calls(), 0);
}

#[tokio::test]
async fn remote_failure_drops_partial_output() {
    let shortener = small_shortener();
    let text = words(300);
    let rewriter = PoisonedRewriter::on_call(2);

    let err = shortener.shorten(&rewriter, &text, "doc.txt").await.unwrap_err();

    assert!(err.is_remote());
    assert_eq!(rewriter.calls(), 2);
    match err {
        ShortenError::Rewrite { chunk, total, source } => {
            assert_eq!(chunk, 2);
            assert!(total >= 2);
            assert!(source.is_transient());
        }
        other => panic!("expected Rewrite, got {other:?}"),
    }
}
