//! Sequential chunk rewriting with a rolling context.
//!
//! Each window's previous text is the tail of the model's own last output,
//! never the source text. Windows of one document are rewritten strictly in
//! order since every step reads what the step before produced.

use shorten_providers::{RewriteError, RewriteRequest, Rewriter};
use shorten_types::{ChatMessage, SamplingParams, ShortenRatio, TextSlice, ValidationError, Window};

use crate::Tokenizer;
use crate::truncate::{TruncateFrom, truncate_by_token_count};

const SYSTEM_TEMPLATE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/rewrite_system.md"));
const USER_TEMPLATE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/rewrite_user.md"));

#[derive(Debug, thiserror::Error)]
pub enum ShortenError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("chunk {chunk}/{total}: {source}")]
    Rewrite {
        chunk: usize,
        total: usize,
        #[source]
        source: RewriteError,
    },
}

impl ShortenError {
    /// The remote rewrite call failed (as opposed to bad input).
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Rewrite { .. })
    }
}

/// The last rewritten chunk of the document in progress.
///
/// Replaced (never appended to) after each window.
#[derive(Debug, Default)]
pub struct RollingContext {
    last_output: String,
}

impl RollingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tail of the last output, at most about `tokens` tokens.
    #[must_use]
    pub fn previous_slice(&self, tokenizer: &Tokenizer, tokens: usize) -> TextSlice {
        truncate_by_token_count(tokenizer, &self.last_output, Some(tokens), TruncateFrom::Front)
    }

    pub fn replace(&mut self, output: &str) {
        output.clone_into(&mut self.last_output);
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.last_output
    }
}

/// Placeholders are substituted in a single left-to-right pass, so
/// placeholder-like text inside a value is never expanded again.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Instruction messages for chunk `chunk` (1-based) of `total`.
#[must_use]
pub fn build_messages(
    chunk: usize,
    total: usize,
    target_tokens: usize,
    previous: &str,
    current: &str,
    next: &str,
) -> Vec<ChatMessage> {
    let chunk = chunk.to_string();
    let total = total.to_string();
    let target = target_tokens.to_string();

    let system = render(
        SYSTEM_TEMPLATE.trim_end(),
        &[("chunk", &chunk), ("total", &total)],
    );
    let user = render(
        USER_TEMPLATE.trim_end(),
        &[
            ("target_tokens", &target),
            ("current", current),
            ("previous", previous),
            ("next", next),
        ],
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Settings for one document's rewrite loop.
#[derive(Debug, Clone, Copy)]
pub struct RewriteSettings<'a> {
    pub model: &'a str,
    pub sampling: SamplingParams,
    pub shorten_ratio: ShortenRatio,
    /// Token cap for the previous text taken from the rolling context.
    pub previous_tokens: usize,
}

/// Rewrite `windows` in order, returning one output per window.
///
/// Stops at the first failed call. Outputs of completed windows are dropped
/// with the error; no partial window output is ever returned.
pub async fn rewrite_windows<R: Rewriter>(
    tokenizer: &Tokenizer,
    rewriter: &R,
    settings: &RewriteSettings<'_>,
    windows: &[Window],
) -> Result<Vec<String>, ShortenError> {
    let total = windows.len();
    let mut context = RollingContext::new();
    let mut outputs = Vec::with_capacity(total);

    for (i, window) in windows.iter().enumerate() {
        let chunk = i + 1;
        let current = window.current();
        let next = window.next();
        let previous = context.previous_slice(tokenizer, settings.previous_tokens);
        let target_tokens = settings.shorten_ratio.target_tokens(current.token_count());
        let target_chars = (current.char_count() as f64 * settings.shorten_ratio.get()).floor() as usize;

        tracing::info!(
            chunk,
            total,
            chars = current.char_count(),
            target_chars,
            tokens = current.token_count(),
            target_tokens,
            previous_chars = previous.char_count(),
            previous_tokens = previous.token_count(),
            next_chars = next.char_count(),
            next_tokens = next.token_count(),
            "Shortening chunk"
        );

        let messages = build_messages(
            chunk,
            total,
            target_tokens,
            previous.text(),
            current.text(),
            next.text(),
        );
        let request = RewriteRequest {
            model: settings.model,
            messages: &messages,
            sampling: settings.sampling,
        };

        let output = rewriter
            .rewrite(&request)
            .await
            .map_err(|source| ShortenError::Rewrite {
                chunk,
                total,
                source,
            })?;

        tracing::info!(
            chunk,
            total,
            chars = output.chars().count(),
            tokens = tokenizer.count(&output),
            "Shortened chunk"
        );

        context.replace(&output);
        outputs.push(output);
    }

    Ok(outputs)
}
