//! Shorten batch front end.
//!
//! ```text
//! config ── RunPlan ──> list_documents ──> run_batch ──> RunReport ──> render_summary
//!                                             │
//!                         read_document ──> Shortener::shorten ──> save_shortened
//! ```
//!
//! Library crates report through `tracing` only; stdout carries nothing but
//! the final summary.

mod batch;
mod logging;
mod output;
mod summary;

pub use batch::{
    BatchOptions, DocumentOutcome, DocumentPlan, DocumentReport, RunReport, WindowPlan, dry_run,
    list_documents, run_batch,
};
pub use logging::{init_tracing, open_log_file};
pub use output::{MAX_NAME_ATTEMPTS, SaveError, output_file_name, save_shortened};
pub use summary::{render_plan_summary, render_summary};
