//! Shortened documents on disk.
//!
//! Output names never replace an existing file: `{prefix}{stem}_{ratio}.txt`
//! is tried first, then `_(1)`, `_(2)`, ... appended before the extension.

use std::io;
use std::path::{Path, PathBuf};

use shorten_utils::{FileSyncPolicy, WriteNewOptions, is_collision, write_new};

/// Candidate names tried before a save gives up.
pub const MAX_NAME_ATTEMPTS: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to create output directory {}: {source}", dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no free output name for {stem:?} after {attempts} attempts")]
    Exhausted { stem: String, attempts: usize },
}

/// Name for the `counter`-th attempt; 0 carries no counter.
#[must_use]
pub fn output_file_name(prefix: &str, stem: &str, ratio: f64, counter: usize) -> String {
    if counter == 0 {
        format!("{prefix}{stem}_{ratio:.2}.txt")
    } else {
        format!("{prefix}{stem}_{ratio:.2}_({counter}).txt")
    }
}

/// Write `text` under a fresh name in `dir` and return the path used.
pub fn save_shortened(
    dir: &Path,
    prefix: &str,
    input_name: &str,
    text: &str,
    ratio: f64,
) -> Result<PathBuf, SaveError> {
    save_with_limit(dir, prefix, input_name, text, ratio, MAX_NAME_ATTEMPTS)
}

fn save_with_limit(
    dir: &Path,
    prefix: &str,
    input_name: &str,
    text: &str,
    ratio: f64,
    attempts: usize,
) -> Result<PathBuf, SaveError> {
    std::fs::create_dir_all(dir).map_err(|source| SaveError::CreateDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let stem = Path::new(input_name)
        .file_stem()
        .map_or_else(|| input_name.to_string(), |s| s.to_string_lossy().into_owned());
    let options = WriteNewOptions {
        file_sync: FileSyncPolicy::SyncAll,
        sync_parent_dir: true,
    };

    for counter in 0..attempts {
        let path = dir.join(output_file_name(prefix, &stem, ratio, counter));
        match write_new(&path, text.as_bytes(), options) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Saved shortened text");
                return Ok(path);
            }
            Err(err) if is_collision(&err) => {
                tracing::debug!(path = %path.display(), "Output name taken");
            }
            Err(source) => return Err(SaveError::Write { path, source }),
        }
    }

    tracing::error!(
        document = input_name,
        attempts,
        "Output not saved: every candidate name is taken"
    );
    Err(SaveError::Exhausted { stem, attempts })
}
