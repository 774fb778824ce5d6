//! Atomic file write helpers.
//!
//! Content is staged in a temp file inside the destination directory and then
//! linked into place with a no-clobber rename, so readers never observe a
//! partially written output and an existing file is never replaced.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileSyncPolicy {
    #[default]
    SyncAll,
    SkipSync,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteNewOptions {
    /// File sync policy for the temp file before persisting.
    pub file_sync: FileSyncPolicy,
    /// Best-effort fsync of the parent directory after the rename.
    pub sync_parent_dir: bool,
}

/// Write `bytes` to `path`, failing with [`io::ErrorKind::AlreadyExists`] if
/// `path` is already present.
pub fn write_new(path: impl AsRef<Path>, bytes: &[u8], options: WriteNewOptions) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    if matches!(options.file_sync, FileSyncPolicy::SyncAll) {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist_noclobber(path) {
        return Err(err.error);
    }

    if options.sync_parent_dir {
        best_effort_sync_parent_dir(parent);
    }

    Ok(())
}

/// Whether an error from [`write_new`] means the name is already taken.
#[must_use]
pub fn is_collision(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::AlreadyExists
}

#[cfg(unix)]
fn best_effort_sync_parent_dir(parent: &Path) {
    if let Err(e) = std::fs::File::open(parent).and_then(|d| d.sync_all()) {
        tracing::debug!(path = %parent.display(), "Parent directory sync_all failed (best-effort): {e}");
    }
}

#[cfg(not(unix))]
fn best_effort_sync_parent_dir(_parent: &Path) {}
