//! Whole-document pipeline: split, rewrite, assemble, repeat.

use std::num::NonZeroUsize;

use shorten_providers::Rewriter;
use shorten_types::{SamplingParams, ShortenRequest, ValidationError, Window};

use crate::Tokenizer;
use crate::assembler::{ShortenResult, ShortenStats, assemble};
use crate::budget::BudgetPlan;
use crate::rewriter::{RewriteSettings, ShortenError, rewrite_windows};
use crate::window::split_with_lookahead;

/// Shortens documents with one fixed configuration.
///
/// Holds no per-document state; every call owns its own rolling context, so
/// one `Shortener` can serve several documents at once.
#[derive(Debug, Clone)]
pub struct Shortener {
    tokenizer: Tokenizer,
    request: ShortenRequest,
    plan: BudgetPlan,
    sampling: SamplingParams,
    repeat: NonZeroUsize,
}

impl Shortener {
    pub fn new(
        tokenizer: Tokenizer,
        request: ShortenRequest,
        prompt_reserve: usize,
        sampling: SamplingParams,
        repeat: usize,
    ) -> Result<Self, ValidationError> {
        let plan = BudgetPlan::new(&request, prompt_reserve)?;
        let repeat = NonZeroUsize::new(repeat).ok_or(ValidationError::ZeroRepeat)?;
        Ok(Self {
            tokenizer,
            request,
            plan,
            sampling,
            repeat,
        })
    }

    #[must_use]
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    #[must_use]
    pub fn plan(&self) -> &BudgetPlan {
        &self.plan
    }

    #[must_use]
    pub fn request(&self) -> &ShortenRequest {
        &self.request
    }

    /// The windows the first pass would rewrite. No remote calls.
    pub fn plan_windows(&self, text: &str) -> Result<Vec<Window>, ValidationError> {
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        split_with_lookahead(
            &self.tokenizer,
            text,
            self.plan.window_tokens(),
            self.plan.window_next_ratio(),
        )
    }

    /// Shorten `text`, feeding each pass's output into the next.
    ///
    /// Statistics compare the original input with the last pass. Chunks in the
    /// result are those of the last pass. A pass that yields empty text ends
    /// the repetition with that result.
    pub async fn shorten<R: Rewriter>(
        &self,
        rewriter: &R,
        text: &str,
        name: &str,
    ) -> Result<ShortenResult, ShortenError> {
        let passes = self.repeat.get();
        let mut input = text.to_string();
        let mut result = None;

        for pass in 1..=passes {
            if passes > 1 {
                tracing::info!(document = name, pass, passes, "Shortening pass");
            }
            let shortened = self.shorten_once(rewriter, &input, name).await?;
            let exhausted = shortened.text().is_empty();
            input = shortened.text().to_string();
            result = Some(shortened);
            if exhausted && pass < passes {
                tracing::warn!(
                    document = name,
                    pass,
                    passes,
                    "Pass produced no text; stopping early"
                );
                break;
            }
        }

        let last = result.ok_or(ValidationError::ZeroRepeat)?;
        if passes == 1 {
            return Ok(last);
        }

        let stats = ShortenStats {
            original_chars: text.chars().count(),
            original_tokens: self.tokenizer.count(text),
            ..last.stats()
        };
        Ok(last.with_stats(stats))
    }

    async fn shorten_once<R: Rewriter>(
        &self,
        rewriter: &R,
        text: &str,
        name: &str,
    ) -> Result<ShortenResult, ShortenError> {
        let windows = self.plan_windows(text)?;
        let shorten_ratio = self.request.shorten_ratio();
        let chars = text.chars().count();
        let tokens = self.tokenizer.count(text);

        tracing::info!(
            document = name,
            chars,
            tokens,
            shorten_ratio = shorten_ratio.get(),
            target_chars = (chars as f64 * shorten_ratio.get()).floor() as usize,
            target_tokens = shorten_ratio.target_tokens(tokens),
            windows = windows.len(),
            "Try to shorten"
        );

        let settings = RewriteSettings {
            model: self.tokenizer.model(),
            sampling: self.sampling,
            shorten_ratio,
            previous_tokens: self.plan.previous_tokens(),
        };
        let chunks = rewrite_windows(&self.tokenizer, rewriter, &settings, &windows).await?;
        Ok(assemble(&self.tokenizer, text, chunks))
    }
}
