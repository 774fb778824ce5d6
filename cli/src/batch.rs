//! Batch driver: every document in the input directory, in name order.

use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use futures_util::stream;
use shorten_config::OnRemoteFailure;
use shorten_context::{ShortenStats, Shortener};
use shorten_providers::Rewriter;

use crate::output::save_shortened;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub output_prefix: String,
    pub on_remote_failure: OnRemoteFailure,
    pub max_concurrent_documents: NonZeroUsize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Shortened { stats: ShortenStats, output: PathBuf },
    /// Shortened, but the result could not be written.
    Unsaved { stats: ShortenStats, reason: String },
    Failed { reason: String },
}

impl DocumentOutcome {
    #[must_use]
    pub const fn is_shortened(&self) -> bool {
        matches!(self, Self::Shortened { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    pub name: String,
    pub outcome: DocumentOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub documents: Vec<DocumentReport>,
    /// A remote failure stopped the run under [`OnRemoteFailure::AbortRun`].
    pub aborted: bool,
}

impl RunReport {
    #[must_use]
    pub fn all_shortened(&self) -> bool {
        self.documents.iter().all(|doc| doc.outcome.is_shortened())
    }
}

/// Regular files directly inside `dir`, sorted by file name.
pub fn list_documents(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Shorten and save every document. Reports come back in input order.
pub async fn run_batch<R: Rewriter>(
    shortener: &Shortener,
    rewriter: &R,
    documents: &[PathBuf],
    options: &BatchOptions,
) -> RunReport {
    let total = documents.len();
    let abort = AtomicBool::new(false);

    let documents = stream::iter(documents.iter().enumerate())
        .map(|(i, path)| {
            let abort = &abort;
            async move {
                let name = display_name(path);
                tracing::info!(file = i + 1, total, document = %name, "Processing document");
                let outcome = if abort.load(Ordering::SeqCst) {
                    DocumentOutcome::Failed {
                        reason: "not attempted: run aborted after a remote failure".to_string(),
                    }
                } else {
                    process_document(shortener, rewriter, path, &name, options, abort).await
                };
                DocumentReport { name, outcome }
            }
        })
        .buffered(options.max_concurrent_documents.get())
        .collect::<Vec<_>>()
        .await;

    let aborted = abort.load(Ordering::SeqCst);
    tracing::info!(total, aborted, "Shortening files done");
    RunReport { documents, aborted }
}

async fn process_document<R: Rewriter>(
    shortener: &Shortener,
    rewriter: &R,
    path: &Path,
    name: &str,
    options: &BatchOptions,
    abort: &AtomicBool,
) -> DocumentOutcome {
    let text = match shorten_readers::read_document(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(document = name, error = %err, "Failed to read document");
            return DocumentOutcome::Failed {
                reason: err.to_string(),
            };
        }
    };

    let result = match shortener.shorten(rewriter, &text, name).await {
        Ok(result) => result,
        Err(err) => {
            if err.is_remote() && options.on_remote_failure == OnRemoteFailure::AbortRun {
                abort.store(true, Ordering::SeqCst);
                tracing::error!(document = name, error = %err, "Remote failure, aborting run");
            } else {
                tracing::error!(document = name, error = %err, "Failed to shorten document");
            }
            return DocumentOutcome::Failed {
                reason: err.to_string(),
            };
        }
    };

    let stats = result.stats();
    match save_shortened(
        &options.output_dir,
        &options.output_prefix,
        name,
        result.text(),
        stats.char_ratio(),
    ) {
        Ok(output) => DocumentOutcome::Shortened { stats, output },
        Err(err) => DocumentOutcome::Unsaved {
            stats,
            reason: err.to_string(),
        },
    }
}

/// Window plan of one document, as a dry run computes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPlan {
    pub chars: usize,
    pub tokens: usize,
    pub windows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPlan {
    pub name: String,
    pub plan: Result<WindowPlan, String>,
}

/// Read and split every document, logging the window plan. No remote calls.
pub fn dry_run(shortener: &Shortener, documents: &[PathBuf]) -> Vec<DocumentPlan> {
    documents
        .iter()
        .map(|path| {
            let name = display_name(path);
            let plan = plan_document(shortener, path, &name);
            if let Err(reason) = &plan {
                tracing::error!(document = %name, %reason, "Cannot plan document");
            }
            DocumentPlan { name, plan }
        })
        .collect()
}

fn plan_document(shortener: &Shortener, path: &Path, name: &str) -> Result<WindowPlan, String> {
    let ratio = shortener.request().shorten_ratio();
    let text = shorten_readers::read_document(path).map_err(|e| e.to_string())?;
    let windows = shortener.plan_windows(&text).map_err(|e| e.to_string())?;
    let chars = text.chars().count();
    let tokens = shortener.tokenizer().count(&text);

    tracing::info!(
        document = name,
        chars,
        tokens,
        target_tokens = ratio.target_tokens(tokens),
        windows = windows.len(),
        "Window plan"
    );
    for (i, window) in windows.iter().enumerate() {
        let current = window.current().token_count();
        tracing::info!(
            chunk = i + 1,
            total = windows.len(),
            current_tokens = current,
            target_tokens = ratio.target_tokens(current),
            next_tokens = window.next().token_count(),
            "Planned window"
        );
    }

    Ok(WindowPlan {
        chars,
        tokens,
        windows: windows.len(),
    })
}
