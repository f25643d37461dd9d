//! Size-rotated file writer with bounded backup retention.
//!
//! The active file lives at exactly the configured path. When a write would
//! push it past the size cap, the file is renamed to
//! `<stem>_<RFC3339-timestamp><ext>` in the same directory, a fresh active
//! file is opened, and backups beyond the retention limits are pruned.
//!
//! ```text
//! /var/log/app.log                              active
//! /var/log/app_2021-10-10T13:46:58.123456Z.log  backup (newest)
//! /var/log/app_2021-10-10T12:01:03.994310Z.log  backup
//! ```
//!
//! Pruning keeps the `max_backups` newest backups (by the timestamp embedded
//! in the name) and, when `max_age_days` is set, removes backups older than
//! the cutoff. Rotation and pruning failures are reported and otherwise
//! ignored; the writer keeps accepting bytes.

use std::fs::{self, File};
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;

use crate::{Writer, WriterError};

/// Default per-file cap in MiB.
pub const DEFAULT_MAX_SIZE_MIB: u64 = 256;

/// Default number of retained backups.
pub const DEFAULT_MAX_BACKUPS: usize = 16;

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Configuration for [`RotatingFileWriter`].
#[derive(Debug, Clone)]
pub struct RotateConfig {
    /// Base path of the active file.
    pub filename: PathBuf,

    /// Per-file size cap in MiB; 0 selects [`DEFAULT_MAX_SIZE_MIB`].
    pub max_size_mib: u64,

    /// Retained backups; 0 means unbounded.
    pub max_backups: usize,

    /// Remove backups older than this many days; 0 disables age pruning.
    pub max_age_days: u64,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            filename: PathBuf::from("./limlog"),
            max_size_mib: DEFAULT_MAX_SIZE_MIB,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age_days: 0,
        }
    }
}

impl RotateConfig {
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = filename.into();
        self
    }

    #[must_use]
    pub fn with_max_size_mib(mut self, mib: u64) -> Self {
        self.max_size_mib = mib;
        self
    }

    #[must_use]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }
}

/// Pre-split pieces of the configured path.
#[derive(Debug, Clone)]
struct PathParts {
    /// Parent directory (`.` when the path has none).
    dir: PathBuf,

    /// Extension including the leading dot, or empty.
    ext: String,

    /// `<stem>_` - every backup name starts with this.
    backup_prefix: String,
}

impl PathParts {
    fn split(path: &Path) -> Self {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            dir,
            ext,
            backup_prefix: format!("{stem}_"),
        }
    }

    /// Backup path for a rotation happening now.
    fn backup_path(&self, now: DateTime<Utc>) -> PathBuf {
        let ts = now.to_rfc3339_opts(SecondsFormat::Micros, true);
        self.dir
            .join(format!("{}{}{}", self.backup_prefix, ts, self.ext))
    }

    /// Parse the timestamp embedded in a backup file name.
    fn timestamp_from_name(&self, name: &str) -> Option<DateTime<Utc>> {
        let rest = name.strip_prefix(&self.backup_prefix)?;
        let ts = rest.strip_suffix(&self.ext)?;
        DateTime::parse_from_rfc3339(ts)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

struct Inner {
    filename: PathBuf,
    parts: PathParts,
    max_size_mib: u64,
    max_backups: usize,
    max_age_days: u64,
    file: Option<File>,
    current_size: u64,
}

/// File writer with size-triggered rotation.
///
/// All operations hold the writer's internal mutex; rotation is invisible to
/// the engine, which only ever sees `write`.
pub struct RotatingFileWriter {
    inner: Mutex<Inner>,
}

impl RotatingFileWriter {
    pub fn new(config: RotateConfig) -> Self {
        let parts = PathParts::split(&config.filename);
        Self {
            inner: Mutex::new(Inner {
                filename: config.filename,
                parts,
                max_size_mib: config.max_size_mib,
                max_backups: config.max_backups,
                max_age_days: config.max_age_days,
                file: None,
                current_size: 0,
            }),
        }
    }

    /// Open the active file eagerly, creating parent directories.
    ///
    /// `write` opens lazily; call this at configuration time when an
    /// unopenable log path should fail fast instead of at the first drain.
    pub fn ensure_open(&self) -> io::Result<()> {
        self.inner.lock().open()
    }

    /// The active file path.
    pub fn filename(&self) -> PathBuf {
        self.inner.lock().filename.clone()
    }
}

impl Writer for RotatingFileWriter {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriterError> {
        let mut inner = self.inner.lock();

        let max = inner.max_size_bytes();
        if data.len() as u64 > max {
            return Err(WriterError::EntryTooLarge {
                len: data.len(),
                max,
            });
        }

        if inner.file.is_none() {
            inner.open()?;
        }

        if inner.current_size + data.len() as u64 > max {
            inner.rotate()?;
        }

        let file = inner.file.as_mut().expect("file opened above");
        file.write_all(data)?;
        file.flush()?;
        inner.current_size += data.len() as u64;

        Ok(data.len())
    }

    fn set_filename(&mut self, path: &Path) {
        let mut inner = self.inner.lock();
        inner.file = None;
        inner.current_size = 0;
        inner.filename = path.to_path_buf();
        inner.parts = PathParts::split(path);
    }

    fn set_max_size(&mut self, mib: u64) {
        self.inner.lock().max_size_mib = mib;
    }

    fn set_max_backups(&mut self, count: usize) {
        self.inner.lock().max_backups = count;
    }
}

impl Inner {
    fn max_size_bytes(&self) -> u64 {
        let mib = if self.max_size_mib == 0 {
            DEFAULT_MAX_SIZE_MIB
        } else {
            self.max_size_mib
        };
        mib * BYTES_PER_MIB
    }

    /// Open the active file in append mode, picking up its existing size.
    fn open(&mut self) -> io::Result<()> {
        create_dir_chain(&self.parts.dir)?;

        let file = File::options()
            .create(true)
            .append(true)
            .open(&self.filename)?;
        self.current_size = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    /// Close the active file, move it aside, reopen fresh, prune backups.
    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        let backup = self.parts.backup_path(Utc::now());
        fs::rename(&self.filename, &backup)?;

        let file = File::options()
            .create(true)
            .append(true)
            .open(&self.filename)?;

        // Carry the old file's permission bits onto the new active file.
        match fs::metadata(&backup) {
            Ok(meta) => {
                if let Err(e) = fs::set_permissions(&self.filename, meta.permissions()) {
                    tracing::warn!(
                        path = %self.filename.display(),
                        error = %e,
                        "failed to copy file mode after rotation"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(path = %backup.display(), error = %e, "failed to stat backup");
            }
        }

        tracing::debug!(
            active = %self.filename.display(),
            backup = %backup.display(),
            "rotated log file"
        );

        self.file = Some(file);
        self.current_size = 0;
        self.prune();
        Ok(())
    }

    /// Remove backups beyond the count limit and past the age limit.
    fn prune(&self) {
        if self.max_backups == 0 && self.max_age_days == 0 {
            return;
        }

        let entries = match fs::read_dir(&self.parts.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.parts.dir.display(), error = %e, "failed to list backups");
                return;
            }
        };

        let mut backups: Vec<(DateTime<Utc>, PathBuf)> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name();
                let ts = self.parts.timestamp_from_name(&name.to_string_lossy())?;
                Some((ts, entry.path()))
            })
            .collect();

        // Newest first; everything past the retention window goes.
        backups.sort_by(|a, b| b.0.cmp(&a.0));

        let mut doomed = Vec::new();
        if self.max_backups > 0 && backups.len() > self.max_backups {
            doomed.extend(backups.split_off(self.max_backups));
        }
        if self.max_age_days > 0 {
            let cutoff = Utc::now() - chrono::Duration::days(self.max_age_days as i64);
            let (expired, _kept): (Vec<_>, Vec<_>) =
                backups.into_iter().partition(|(ts, _)| *ts < cutoff);
            doomed.extend(expired);
        }

        for (_, path) in doomed {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove backup");
            }
        }
    }
}

/// Create a directory chain with mode 0755 on unix.
fn create_dir_chain(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir)
}

#[cfg(test)]
#[path = "rotating_test.rs"]
mod rotating_test;
