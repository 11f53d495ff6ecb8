//! Locks on the files a command writes.
//!
//! Drawings and schedules often live on shared drives. A run holds the lock
//! on each output until it has been written, so two runs cannot interleave
//! their writes to the same file.

use std::path::Path;

use anyhow::{Context, Result};
use rebar_core::file_io::FileLock;

/// Name recorded in lock files
pub fn user_id() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "rebar".to_string())
}

/// Lock `path` for the rest of the run; the lock is released on drop.
pub fn acquire(path: &Path) -> Result<FileLock> {
    FileLock::acquire(path, user_id()).with_context(|| format!("locking {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebar_core::errors::DraftError;

    #[test]
    fn test_second_run_cannot_lock_same_output() {
        let path = std::env::temp_dir().join(format!("rebar_cli_lock_{}.dxf", std::process::id()));

        let held = acquire(&path).unwrap();
        assert_eq!(held.info.user_id, user_id());

        let err = acquire(&path).unwrap_err();
        let draft = err.downcast_ref::<DraftError>().unwrap();
        assert_eq!(draft.error_code(), "FILE_LOCKED");
        assert!(err.to_string().contains("locking"));

        drop(held);
        let again = acquire(&path).unwrap();
        drop(again);
        let _ = std::fs::remove_file(&path);
    }
}
