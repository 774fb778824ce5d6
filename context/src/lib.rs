//! Token-budgeted chunking and context carry-over.
//!
//! ```text
//! text ── split_with_lookahead ──> [Window { current, next }]
//!                                        │
//!          RollingContext ──previous──> rewrite_windows ──> [chunk]
//!                 ▲                           │
//!                 └──── last output ──────────┘
//!                                             │
//!                                         assemble ──> ShortenResult
//! ```
//!
//! [`Shortener`] drives the whole pipeline for one document, including
//! repeated passes. Everything except the remote call is pure and
//! synchronous.

mod assembler;
mod budget;
mod rewriter;
mod shortener;
mod tokenizer;
mod truncate;
mod window;

pub use assembler::{CHUNK_SEPARATOR, ShortenResult, ShortenStats, assemble};
pub use budget::{BudgetPlan, DEFAULT_PROMPT_RESERVE};
pub use rewriter::{
    RewriteSettings, RollingContext, ShortenError, build_messages, rewrite_windows,
};
pub use shortener::Shortener;
pub use tokenizer::{FALLBACK_ENCODING, Tokenizer, TokenizerError};
pub use truncate::{TruncateFrom, truncate_by_token_count, truncate_tokens};
pub use window::{WindowBudget, split_with_lookahead};
