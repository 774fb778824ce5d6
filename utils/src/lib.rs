//! Shared infrastructure utilities for Shorten.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename) that
//!   never overwrites an existing output.

pub mod atomic_write;

pub use atomic_write::{FileSyncPolicy, WriteNewOptions, is_collision, write_new};
