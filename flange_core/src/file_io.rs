//! # Job Storage
//!
//! Everything lives under one storage root:
//!
//! ```text
//! flange_helper/
//! ├── jobs.json          the whole JobBook, rewritten on every change
//! ├── jobs.json.lock     who is editing right now
//! ├── photos/
//! ├── signatures/
//! └── reports/           exported PDFs
//! ```
//!
//! Saves are atomic (write `.tmp`, fsync, rename). Edits hold a
//! [`FileLock`] so two technicians sharing a folder cannot overwrite each
//! other.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use flange_core::file_io::StorageLayout;
//! use flange_core::job::Job;
//!
//! let storage = StorageLayout::new("flange_helper");
//! let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
//! storage.update("jsmith", |book| book.add_job(Job::new("24-118", "Unit 3", date)))?;
//! # Ok::<(), flange_core::errors::FlangeError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{FlangeError, FlangeResult};
use crate::job::{JobBook, SCHEMA_VERSION};

/// Job book file name inside the storage root
pub const JOBS_FILE: &str = "jobs.json";

/// Storage ceiling for photos, signatures and reports together
pub const STORAGE_LIMIT_BYTES: u64 = 750 * 1024 * 1024;

/// Locks older than this are taken over
const STALE_LOCK_HOURS: i64 = 24;

// ============================================================================
// Layout
// ============================================================================

/// Paths under the storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

/// Which folder an attached image goes in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    Photo,
    Signature,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        StorageLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn jobs_path(&self) -> PathBuf {
        self.root.join(JOBS_FILE)
    }

    pub fn photos_dir(&self) -> PathBuf {
        self.root.join("photos")
    }

    pub fn signatures_dir(&self) -> PathBuf {
        self.root.join("signatures")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    /// Create the root and its sub-folders if missing.
    pub fn ensure(&self) -> FlangeResult<()> {
        for dir in [
            self.root.clone(),
            self.photos_dir(),
            self.signatures_dir(),
            self.reports_dir(),
        ] {
            fs::create_dir_all(&dir)
                .map_err(|e| FlangeError::file_error("create directory", dir.display().to_string(), e.to_string()))?;
        }
        Ok(())
    }

    pub fn load(&self) -> FlangeResult<JobBook> {
        load_book(&self.jobs_path())
    }

    /// Lock, load, apply `change`, save. The book is only written if
    /// `change` succeeds.
    pub fn update<T>(
        &self,
        user_id: &str,
        change: impl FnOnce(&mut JobBook) -> FlangeResult<T>,
    ) -> FlangeResult<T> {
        self.ensure()?;
        let path = self.jobs_path();
        let _lock = FileLock::acquire(&path, user_id)?;
        let mut book = load_book(&path)?;
        let out = change(&mut book)?;
        save_book(&book, &path)?;
        Ok(out)
    }

    /// Copy an image into `photos/` or `signatures/` under a fresh name.
    ///
    /// Returns the stored path.
    pub fn import(&self, kind: Attachment, source: &Path) -> FlangeResult<PathBuf> {
        self.ensure()?;
        let dir = match kind {
            Attachment::Photo => self.photos_dir(),
            Attachment::Signature => self.signatures_dir(),
        };
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "jpg".to_string());
        let target = dir.join(format!("{}.{}", Uuid::new_v4(), extension));
        fs::copy(source, &target)
            .map_err(|e| FlangeError::file_error("copy", source.display().to_string(), e.to_string()))?;
        tracing::debug!(from = %source.display(), to = %target.display(), "imported attachment");
        Ok(target)
    }

    pub fn usage(&self) -> FlangeResult<StorageUsage> {
        storage_usage(&self.root)
    }
}

// ============================================================================
// Locking
// ============================================================================

/// Contents of `jobs.json.lock`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Held by a process that has exited, or too old to trust.
    pub fn is_stale(&self) -> bool {
        if hostname().as_deref() == Some(self.machine.as_str()) && !process_alive(self.pid) {
            return true;
        }
        (Utc::now() - self.locked_at).num_hours() >= STALE_LOCK_HOURS
    }
}

fn hostname() -> Option<String> {
    whoami::fallible::hostname().ok().filter(|h| !h.is_empty())
}

/// True when some open handle holds the OS lock on `lock_path`.
///
/// A lock file nobody holds was left behind by a process that died.
fn os_lock_held(lock_path: &Path) -> bool {
    let Ok(file) = OpenOptions::new().read(true).write(true).open(lock_path) else {
        return false;
    };
    match file.try_lock_exclusive() {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            false
        }
        Err(_) => true,
    }
}

/// Recorded lock that still has a live holder.
fn live_lock(lock_path: &Path) -> Option<LockInfo> {
    read_lock_info(lock_path).filter(|info| !info.is_stale() && os_lock_held(lock_path))
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    use std::process::Command;
    match Command::new("tasklist")
        .args(["/FI", &format!("PID eq {pid}"), "/NH"])
        .output()
    {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()),
        Err(_) => true,
    }
}

#[cfg(not(any(unix, windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive edit lock on a job book. Released on drop.
///
/// Holds an OS lock (fs2) on the lock file, and writes [`LockInfo`] into it
/// so others can see who has it.
#[derive(Debug)]
pub struct FileLock {
    book_path: PathBuf,
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Lock `path` for `user_id`.
    ///
    /// Fails with [`FlangeError::FileLocked`] if a live lock exists.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> FlangeResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if let Some(existing) = read_lock_info(&lock_path) {
            if live_lock(&lock_path).is_some() {
                return Err(FlangeError::file_locked(
                    path.display().to_string(),
                    format!("{} ({})", existing.user_id, existing.machine),
                    existing.locked_at.to_rfc3339(),
                ));
            }
            tracing::warn!(
                user = %existing.user_id,
                machine = %existing.machine,
                "taking over stale lock"
            );
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| FlangeError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            FlangeError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info).map_err(FlangeError::serialization)?;
        lock_file
            .write_all(lock_json.as_bytes())
            .and_then(|_| lock_file.sync_all())
            .map_err(|e| FlangeError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "acquired lock");
        Ok(FileLock {
            book_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Current live lock on `path`, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        live_lock(&lock_path_for(path))
    }

    pub fn book_path(&self) -> &Path {
        &self.book_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `jobs.json` → `jobs.json.lock`
fn lock_path_for(book_path: &Path) -> PathBuf {
    let mut name = book_path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    book_path.with_file_name(name)
}

fn read_lock_info(lock_path: &Path) -> Option<LockInfo> {
    let mut contents = String::new();
    File::open(lock_path).ok()?.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
}

// ============================================================================
// Save / load
// ============================================================================

/// Write the book to `path` atomically.
pub fn save_book(book: &JobBook, path: &Path) -> FlangeResult<()> {
    let json = serde_json::to_string_pretty(book).map_err(FlangeError::serialization)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| FlangeError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .write_all(json.as_bytes())
        .and_then(|_| tmp_file.sync_all())
        .map_err(|e| FlangeError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        FlangeError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::info!(path = %path.display(), jobs = book.job_count(), "saved job book");
    Ok(())
}

/// Read the book at `path`. A missing or blank file is an empty book.
pub fn load_book(path: &Path) -> FlangeResult<JobBook> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no job book yet");
            return Ok(JobBook::new());
        }
        Err(e) => return Err(FlangeError::file_error("read", path.display().to_string(), e.to_string())),
    };
    if contents.trim().is_empty() {
        return Ok(JobBook::new());
    }

    let book: JobBook = serde_json::from_str(&contents)
        .map_err(|e| FlangeError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))?;
    validate_version(&book.meta.version)?;
    tracing::debug!(path = %path.display(), jobs = book.job_count(), "loaded job book");
    Ok(book)
}

/// Load, also reporting whether someone else holds the edit lock.
pub fn load_book_with_lock_check(path: &Path) -> FlangeResult<(JobBook, Option<LockInfo>)> {
    let book = load_book(path)?;
    Ok((book, FileLock::check(path)))
}

/// Files from another major version, or a newer minor, are refused.
fn validate_version(file_version: &str) -> FlangeResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file = parse(file_version);
    let current = parse(SCHEMA_VERSION);

    let compatible = match (file.as_slice(), current.as_slice()) {
        ([f_major, rest @ ..], [c_major, c_rest @ ..]) => {
            f_major == c_major && rest.first().unwrap_or(&0) <= c_rest.first().unwrap_or(&0)
        }
        _ => false,
    };
    if compatible {
        Ok(())
    } else {
        Err(FlangeError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        })
    }
}

// ============================================================================
// Usage
// ============================================================================

/// Bytes used under the storage root
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorageUsage {
    pub bytes: u64,
    pub limit_bytes: u64,
}

impl StorageUsage {
    pub fn percent(&self) -> f64 {
        if self.limit_bytes == 0 {
            return 100.0;
        }
        self.bytes as f64 / self.limit_bytes as f64 * 100.0
    }

    pub fn is_over_limit(&self) -> bool {
        self.bytes >= self.limit_bytes
    }

    /// `"12.4 MB of 750 MB (1.7%)"`
    pub fn summary(&self) -> String {
        const MB: f64 = 1024.0 * 1024.0;
        format!(
            "{:.1} MB of {:.0} MB ({:.1}%)",
            self.bytes as f64 / MB,
            self.limit_bytes as f64 / MB,
            self.percent()
        )
    }
}

/// Recursive size of `root`. A missing root uses nothing.
pub fn storage_usage(root: &Path) -> FlangeResult<StorageUsage> {
    let bytes = if root.exists() { dir_size(root)? } else { 0 };
    Ok(StorageUsage {
        bytes,
        limit_bytes: STORAGE_LIMIT_BYTES,
    })
}

fn dir_size(dir: &Path) -> FlangeResult<u64> {
    let entries =
        fs::read_dir(dir).map_err(|e| FlangeError::file_error("read directory", dir.display().to_string(), e.to_string()))?;
    let mut total = 0;
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else { continue };
        if meta.is_dir() {
            total += dir_size(&entry.path())?;
        } else {
            total += meta.len();
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FlangeForm;
    use crate::job::Job;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn job(number: &str) -> Job {
        Job::new(number, "Unit 3", NaiveDate::from_ymd_opt(2026, 3, 4).unwrap())
    }

    #[test]
    fn test_lock_path_generation() {
        assert_eq!(
            lock_path_for(Path::new("/data/flange_helper/jobs.json")),
            Path::new("/data/flange_helper/jobs.json.lock")
        );
    }

    #[test]
    fn test_missing_and_blank_files_are_empty_books() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JOBS_FILE);
        assert_eq!(load_book(&path).unwrap().job_count(), 0);

        fs::write(&path, "  \n").unwrap();
        assert_eq!(load_book(&path).unwrap().job_count(), 0);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JOBS_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_book(&path).unwrap_err().error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JOBS_FILE);

        let mut book = JobBook::new();
        let job_id = book.add_job(job("24-118")).unwrap();
        book.add_form(job_id, FlangeForm::new(job_id)).unwrap();
        save_book(&book, &path).unwrap();

        let loaded = load_book(&path).unwrap();
        assert_eq!(loaded, book);
        assert!(!dir.path().join("jobs.json.tmp").exists());
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("1.0.7").is_ok());
        assert!(validate_version("1.1.0").is_err());
        assert!(validate_version("2.0.0").is_err());
        assert!(validate_version("0.9.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_newer_file_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JOBS_FILE);
        let mut book = JobBook::new();
        book.meta.version = "3.0.0".to_string();
        save_book(&book, &path).unwrap();
        assert_eq!(load_book(&path).unwrap_err().error_code(), "VERSION_MISMATCH");
    }

    #[test]
    fn test_lock_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JOBS_FILE);

        let lock = FileLock::acquire(&path, "jsmith").unwrap();
        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());
        assert_eq!(lock.book_path(), path.as_path());

        drop(lock);
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_live_lock_blocks_others() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JOBS_FILE);
        let _lock = FileLock::acquire(&path, "jsmith").unwrap();

        let err = FileLock::acquire(&path, "adoe").unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(FileLock::check(&path).map(|i| i.user_id), Some("jsmith".to_string()));
    }

    #[test]
    fn test_old_lock_is_stale() {
        let mut info = LockInfo::new("jsmith");
        assert!(!info.is_stale());
        info.locked_at = Utc::now() - chrono::Duration::hours(25);
        assert!(info.is_stale());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JOBS_FILE);
        fs::write(lock_path_for(&path), serde_json::to_string(&info).unwrap()).unwrap();
        assert!(FileLock::check(&path).is_none());
        assert!(FileLock::acquire(&path, "adoe").is_ok());
    }

    #[test]
    fn test_abandoned_lock_is_taken_over() {
        let dir = TempDir::new().unwrap();
        let storage = StorageLayout::new(dir.path());
        storage.ensure().unwrap();

        // Fresh record from a process that died without releasing it
        let info = LockInfo {
            user_id: "jsmith".to_string(),
            machine: "unknown".to_string(),
            pid: 999_999,
            locked_at: Utc::now(),
        };
        let lock_path = lock_path_for(&storage.jobs_path());
        fs::write(&lock_path, serde_json::to_string(&info).unwrap()).unwrap();
        assert!(!info.is_stale());
        assert!(FileLock::check(&storage.jobs_path()).is_none());

        let id = storage.update("adoe", |book| book.add_job(job("24-121"))).unwrap();
        assert!(storage.load().unwrap().job(id).is_some());
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_update_saves_only_on_success() {
        let dir = TempDir::new().unwrap();
        let storage = StorageLayout::new(dir.path().join("flange_helper"));

        let id = storage.update("jsmith", |book| book.add_job(job("24-118"))).unwrap();
        assert!(storage.photos_dir().is_dir());
        assert!(storage.load().unwrap().job(id).is_some());

        let failed = storage.update("jsmith", |book| book.add_job(job(" ")));
        assert!(failed.is_err());
        assert_eq!(storage.load().unwrap().job_count(), 1);
        assert!(FileLock::check(&storage.jobs_path()).is_none());
    }

    #[test]
    fn test_import_and_usage() {
        let dir = TempDir::new().unwrap();
        let storage = StorageLayout::new(dir.path().join("store"));
        assert_eq!(storage.usage().unwrap().bytes, 0);

        let source = dir.path().join("IMG_0001.JPG");
        fs::write(&source, vec![0u8; 2048]).unwrap();
        let stored = storage.import(Attachment::Photo, &source).unwrap();
        assert!(stored.starts_with(storage.photos_dir()));
        assert_eq!(stored.extension().unwrap(), "jpg");

        let usage = storage.usage().unwrap();
        assert_eq!(usage.bytes, 2048);
        assert!(!usage.is_over_limit());
        assert!(usage.percent() > 0.0 && usage.percent() < 0.01);
    }

    #[test]
    fn test_usage_summary() {
        let usage = StorageUsage {
            bytes: STORAGE_LIMIT_BYTES / 2,
            limit_bytes: STORAGE_LIMIT_BYTES,
        };
        assert_eq!(usage.summary(), "375.0 MB of 750 MB (50.0%)");
    }
}
