//! Per-call token budget planning.
//!
//! One completion call carries the previous context, the current chunk, the
//! next look-ahead and the expected output, on top of the fixed instruction
//! text. The planner sizes the current chunk so that all of them fit:
//!
//! ```text
//! text_budget       = token_budget - prompt_reserve
//! current_target    = floor(text_budget / (1 + shorten + previous + next))
//! window_tokens     = floor(current_target * (1 + next))
//! window_next_ratio = next / (1 + next)
//! previous_tokens   = floor(current_budget * previous)
//! ```

use shorten_types::{ContextRatio, ShortenRequest, ValidationError};

use crate::window::WindowBudget;

/// Tokens reserved for the fixed instruction text of each call.
pub const DEFAULT_PROMPT_RESERVE: usize = 122;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetPlan {
    text_budget: usize,
    current_target: usize,
    window_tokens: usize,
    window_next_ratio: ContextRatio,
    window: WindowBudget,
    previous_tokens: usize,
}

impl BudgetPlan {
    pub fn new(request: &ShortenRequest, prompt_reserve: usize) -> Result<Self, ValidationError> {
        let budget = request.model_token_budget();
        let text_budget = budget.saturating_sub(prompt_reserve);
        if text_budget == 0 {
            return Err(ValidationError::BudgetBelowReserve {
                budget,
                reserve: prompt_reserve,
            });
        }

        let shorten = request.shorten_ratio().get();
        let previous = request.previous_ratio().get();
        let next = request.next_ratio().get();

        let current_target = (text_budget as f64 / (1.0 + shorten + previous + next)).floor() as usize;
        let window_tokens = (current_target as f64 * (1.0 + next)).floor() as usize;
        let window_next_ratio = ContextRatio::new("window next", next / (1.0 + next))?;
        let window = WindowBudget::new(window_tokens, window_next_ratio)?;
        let previous_tokens = (window.current as f64 * previous).floor() as usize;

        Ok(Self {
            text_budget,
            current_target,
            window_tokens,
            window_next_ratio,
            window,
            previous_tokens,
        })
    }

    /// Token budget left for text after the instruction reserve.
    #[must_use]
    pub const fn text_budget(&self) -> usize {
        self.text_budget
    }

    #[must_use]
    pub const fn current_target(&self) -> usize {
        self.current_target
    }

    /// Size passed to the splitter as its `max_window_tokens`.
    #[must_use]
    pub const fn window_tokens(&self) -> usize {
        self.window_tokens
    }

    /// Splitter next ratio, rescaled to the window size.
    #[must_use]
    pub const fn window_next_ratio(&self) -> ContextRatio {
        self.window_next_ratio
    }

    #[must_use]
    pub const fn window(&self) -> WindowBudget {
        self.window
    }

    /// Tail of the rolling context kept as previous text.
    #[must_use]
    pub const fn previous_tokens(&self) -> usize {
        self.previous_tokens
    }
}
