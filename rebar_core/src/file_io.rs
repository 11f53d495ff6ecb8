//! # File I/O Module
//!
//! Handles project and output file operations with safety features:
//! - **Atomic writes**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Prevent concurrent edits on shared drives
//! - **Version validation**: Ensure schema compatibility
//!
//! ## File Format
//!
//! Projects are saved as `.rbp` (rebar project) files containing JSON.
//! Lock files use `.rbp.lock` extension with metadata about who holds the lock.
//! Drawings and reports go through [`write_atomic`] as well, so a crashed run
//! never leaves a half-written DXF or PDF behind.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rebar_core::file_io::{save_project, load_project, FileLock};
//! use rebar_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::new("Engineer", "25-001", "Client");
//! let path = Path::new("beams.rbp");
//!
//! let lock = FileLock::acquire(path, "engineer@company.com").unwrap();
//! save_project(&project, path).unwrap();
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::{DraftError, DraftResult};
use crate::project::{Project, SCHEMA_VERSION};

/// Extension of project files
pub const PROJECT_EXTENSION: &str = "rbp";

/// Lock file metadata stored in .rbp.lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

/// File lock guard that releases the lock when dropped.
///
/// Combines an OS-level lock (fs2) with a `.lock` file naming the holder.
#[derive(Debug)]
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a project file.
    ///
    /// Fails with [`DraftError::FileLocked`] if another live process holds it.
    /// Locks older than 24 hours, or held by a dead process on this machine,
    /// are taken over.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> DraftResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if lock_path.exists() {
            if let Ok(existing) = read_lock_info(&lock_path) {
                if !is_lock_stale(&existing) {
                    return Err(DraftError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.user_id, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                log::warn!(
                    "taking over stale lock on {} held by {} since {}",
                    path.display(),
                    existing.user_id,
                    existing.locked_at.to_rfc3339()
                );
            }
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(io_error("create lock", &lock_path))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            DraftError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info)?;
        lock_file.write_all(lock_json.as_bytes()).map_err(io_error("write lock", &lock_path))?;
        lock_file.sync_all().map_err(io_error("sync lock", &lock_path))?;

        log::debug!("locked {}", path.display());
        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a file is locked without acquiring the lock.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if lock_path.exists() {
            if let Ok(info) = read_lock_info(&lock_path) {
                if !is_lock_stale(&info) {
                    return Some(info);
                }
            }
        }
        None
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Adapter turning an `io::Error` into a [`DraftError::FileError`] for `path`
fn io_error<'a>(operation: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> DraftError + 'a {
    move |e| DraftError::file_error(operation, path.display().to_string(), e.to_string())
}

fn lock_path_for(project_path: &Path) -> PathBuf {
    with_suffix(project_path, "lock")
}

/// `name.ext` -> `name.ext.suffix`
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut out = path.to_path_buf();
    let extension = out
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    out.set_extension(extension);
    out
}

fn read_lock_info(lock_path: &Path) -> DraftResult<LockInfo> {
    let contents = read_to_string(lock_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// A lock is stale when its process is gone (same machine) or it is over a day old.
fn is_lock_stale(info: &LockInfo) -> bool {
    if let Some(our_machine) = hostname() {
        if info.machine == our_machine {
            #[cfg(windows)]
            {
                use std::process::Command;
                let output = Command::new("tasklist")
                    .args(["/FI", &format!("PID eq {}", info.pid), "/NH"])
                    .output();
                if let Ok(output) = output {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if stdout.contains("No tasks") || !stdout.contains(&info.pid.to_string()) {
                        return true;
                    }
                }
            }
            #[cfg(unix)]
            {
                if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                    return true;
                }
            }
        }
    }

    let age = Utc::now() - info.locked_at;
    age.num_hours() > 24
}

/// Write bytes to `path` atomically.
///
/// The bytes go to `path.<ext>.tmp` first, are synced to disk, and the temp
/// file is renamed over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> DraftResult<()> {
    let tmp_path = with_suffix(path, "tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(io_error("create temp file", &tmp_path))?;
    tmp_file.write_all(bytes).map_err(io_error("write temp file", &tmp_path))?;
    tmp_file.sync_all().map_err(io_error("sync temp file", &tmp_path))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DraftError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    log::debug!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Read a UTF-8 file into a string.
pub fn read_to_string(path: &Path) -> DraftResult<String> {
    let mut file = File::open(path).map_err(io_error("open", path))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(io_error("read", path))?;
    Ok(contents)
}

/// Save a project as pretty-printed JSON with atomic write semantics.
pub fn save_project(project: &Project, path: &Path) -> DraftResult<()> {
    let json = serde_json::to_string_pretty(project)?;
    write_atomic(path, json.as_bytes())
}

/// Load a project from a file.
///
/// Every element is validated while parsing; an invalid element fails the
/// whole load with the element's [`DraftError::Configuration`] reason inside
/// a [`DraftError::SerializationError`]. Two elements with the same name fail
/// with [`DraftError::Configuration`].
pub fn load_project(path: &Path) -> DraftResult<Project> {
    let contents = read_to_string(path)?;

    let project: Project = serde_json::from_str(&contents).map_err(|e| DraftError::SerializationError {
        reason: format!("Invalid project file {}: {}", path.display(), e),
    })?;

    validate_version(&project.meta.version)?;
    project.check_unique_names()?;
    Ok(project)
}

/// Load a project and report whether another user holds its lock.
pub fn load_project_with_lock_check(path: &Path) -> DraftResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    let lock_info = FileLock::check(path);
    Ok((project, lock_info))
}

/// Major versions must match; in 0.x a newer minor version is rejected.
fn validate_version(file_version: &str) -> DraftResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let mismatch = || DraftError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    if file_parts.is_empty() || current_parts.is_empty() || file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}
