//! Validated shortening parameters.
//!
//! Ratios are checked once at construction so the splitter and rewriter never
//! see an out-of-range value.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("shorten ratio must be in (0, 1] (got {0})")]
    ShortenRatioOutOfRange(f64),
    #[error("{name} ratio must be in [0, 1) (got {value})")]
    ContextRatioOutOfRange { name: &'static str, value: f64 },
    #[error("sum of previous and next ratios must be under 1.0 (got {previous} + {next})")]
    ContextRatioSum { previous: f64, next: f64 },
    #[error("no text to shorten")]
    EmptyText,
    #[error("model token budget must be over 0")]
    ZeroTokenBudget,
    #[error("token budget {budget} leaves no room after the {reserve}-token prompt reserve")]
    BudgetBelowReserve { budget: usize, reserve: usize },
    #[error("window budget of {window_tokens} tokens leaves no room for the current text")]
    EmptyWindowBudget { window_tokens: usize },
    #[error("repeat count must be at least 1")]
    ZeroRepeat,
    #[error("max concurrent documents must be at least 1")]
    ZeroConcurrency,
}

/// Fraction of the original length requested from the model, in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ShortenRatio(f64);

impl ShortenRatio {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(ValidationError::ShortenRatioOutOfRange(value))
        }
    }

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Requested output tokens for a chunk of `token_count` tokens.
    ///
    /// Monotone in the ratio: a larger ratio never yields a smaller target.
    #[must_use]
    pub fn target_tokens(self, token_count: usize) -> usize {
        (token_count as f64 * self.0).floor() as usize
    }
}

impl fmt::Display for ShortenRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Share of a window reserved for surrounding context, in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct ContextRatio(f64);

impl ContextRatio {
    pub const ZERO: Self = Self(0.0);

    pub fn new(name: &'static str, value: f64) -> Result<Self, ValidationError> {
        if value.is_finite() && (0.0..1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::ContextRatioOutOfRange { name, value })
        }
    }

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

/// One document's shortening configuration.
///
/// Invariant: `previous_ratio + next_ratio < 1` and `model_token_budget > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortenRequest {
    shorten_ratio: ShortenRatio,
    previous_ratio: ContextRatio,
    next_ratio: ContextRatio,
    model_token_budget: usize,
}

impl ShortenRequest {
    pub fn new(
        shorten_ratio: f64,
        previous_ratio: f64,
        next_ratio: f64,
        model_token_budget: usize,
    ) -> Result<Self, ValidationError> {
        let shorten_ratio = ShortenRatio::new(shorten_ratio)?;
        let previous = ContextRatio::new("previous", previous_ratio)?;
        let next = ContextRatio::new("next", next_ratio)?;
        if previous.get() + next.get() >= 1.0 {
            return Err(ValidationError::ContextRatioSum {
                previous: previous.get(),
                next: next.get(),
            });
        }
        if model_token_budget == 0 {
            return Err(ValidationError::ZeroTokenBudget);
        }

        Ok(Self {
            shorten_ratio,
            previous_ratio: previous,
            next_ratio: next,
            model_token_budget,
        })
    }

    #[must_use]
    pub const fn shorten_ratio(&self) -> ShortenRatio {
        self.shorten_ratio
    }

    #[must_use]
    pub const fn previous_ratio(&self) -> ContextRatio {
        self.previous_ratio
    }

    #[must_use]
    pub const fn next_ratio(&self) -> ContextRatio {
        self.next_ratio
    }

    #[must_use]
    pub const fn model_token_budget(&self) -> usize {
        self.model_token_budget
    }
}
