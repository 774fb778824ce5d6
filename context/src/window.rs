use shorten_types::{ContextRatio, ValidationError, Window};

use crate::Tokenizer;
use crate::truncate::{TruncateFrom, truncate_by_token_count};

/// Token budgets for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBudget {
    pub current: usize,
    pub next: usize,
}

impl WindowBudget {
    /// `current = ceil((1 - next_ratio) * max)`, `next = max - current`.
    pub fn new(max_window_tokens: usize, next_ratio: ContextRatio) -> Result<Self, ValidationError> {
        let current = ((1.0 - next_ratio.get()) * max_window_tokens as f64).ceil() as usize;
        let current = current.min(max_window_tokens);
        if current == 0 {
            return Err(ValidationError::EmptyWindowBudget {
                window_tokens: max_window_tokens,
            });
        }
        Ok(Self {
            current,
            next: max_window_tokens - current,
        })
    }
}

/// Partition `text` into windows of at most `max_window_tokens` tokens.
///
/// Each window's `current` is consumed from the text; its `next` is a
/// look-ahead of the text that follows and is not consumed. The `current`
/// slices concatenate back to `text` exactly. Empty text yields no windows.
pub fn split_with_lookahead(
    tokenizer: &Tokenizer,
    text: &str,
    max_window_tokens: usize,
    next_ratio: ContextRatio,
) -> Result<Vec<Window>, ValidationError> {
    let budget = WindowBudget::new(max_window_tokens, next_ratio)?;
    let mut windows = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let current =
            truncate_by_token_count(tokenizer, remaining, Some(budget.current), TruncateFrom::Back);
        debug_assert!(!current.is_empty(), "window made no progress");
        // `current` is a prefix of `remaining`, cut at a char boundary.
        remaining = remaining.get(current.text().len()..).unwrap_or_default();

        let next =
            truncate_by_token_count(tokenizer, remaining, Some(budget.next), TruncateFrom::Back);
        windows.push(Window::new(current, next));
    }

    tracing::debug!(
        windows = windows.len(),
        current_budget = budget.current,
        next_budget = budget.next,
        "Split text into windows"
    );
    Ok(windows)
}
