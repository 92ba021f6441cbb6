use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mnemo_core::{Clock, Entry, EntryFormat, IdGenerator, MemoryError, Section, SectionType};
use mnemo_lock::{CancelToken, LockError, StoreLock};
use tracing::{debug, error, warn};

use crate::codec::{parse_section_entries, render_entry};
use crate::document::initial_document;
use crate::locator::extract_section;
use crate::mutator::append_to_section;

pub const DEFAULT_DIR_NAME: &str = ".mnemo";
pub const DEFAULT_FILE_NAME: &str = "memory.md";
pub const DEFAULT_LOCK_FILE_NAME: &str = ".memory.lock";

/// Where the store lives and how long a writer waits for the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Project root; the store directory is created beneath it.
    pub base_path: PathBuf,
    pub dir_name: String,
    pub file_name: String,
    pub lock_file_name: String,
    /// `None` waits until the lock is free or the token is cancelled.
    pub lock_timeout: Option<Duration>,
}

impl StoreConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            dir_name: DEFAULT_DIR_NAME.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            lock_file_name: DEFAULT_LOCK_FILE_NAME.to_string(),
            lock_timeout: None,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

/// Markdown memory document on disk.
///
/// Reads take no lock and never see a partial write, since every write lands
/// through a rename. Writes are serialized across threads and processes by
/// an advisory lock on a separate lock file. Nothing is cached between calls.
#[derive(Clone)]
pub struct MemoryStore {
    config: StoreConfig,
    dir_path: PathBuf,
    file_path: PathBuf,
    lock_path: PathBuf,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("file_path", &self.file_path)
            .field("lock_path", &self.lock_path)
            .field("lock_timeout", &self.config.lock_timeout)
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    pub fn new(config: StoreConfig, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        let dir_path = config.base_path.join(&config.dir_name);
        Self {
            file_path: dir_path.join(&config.file_name),
            lock_path: dir_path.join(&config.lock_file_name),
            dir_path,
            config,
            ids,
            clock,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn dir_path(&self) -> &Path {
        &self.dir_path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.config.lock_timeout
    }

    pub fn next_id(&self) -> String {
        self.ids.new_id()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Whole document text; empty when the file does not exist yet.
    pub fn read_all(&self) -> Result<String, MemoryError> {
        match fs::read_to_string(&self.file_path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(MemoryError::Read {
                path: self.file_path.clone(),
                source,
            }),
        }
    }

    /// Parsed entries of one section.
    ///
    /// A missing file, heading or parseable content yields an empty section.
    pub fn get_section(&self, section: SectionType) -> Result<Section, MemoryError> {
        let doc = self.read_all()?;
        let block = extract_section(&doc, section.heading());
        if block.is_empty() {
            return Ok(Section::empty(section));
        }

        let parsed = parse_section_entries(block);
        if parsed.format == Some(EntryFormat::LegacyInline) {
            warn!(
                section = section.as_str(),
                path = %self.file_path.display(),
                entries = parsed.entries.len(),
                "section uses legacy inline entry format"
            );
        }
        Ok(Section {
            section_type: section,
            entries: parsed.entries,
            format: parsed.format,
        })
    }

    /// Append `entry` as the last element of `section`.
    ///
    /// A missing id or timestamp is filled from the injected generator and
    /// clock. Cancellation is only observed while waiting for the lock.
    pub fn append_entry(
        &self,
        ctx: &CancelToken,
        section: SectionType,
        entry: &Entry,
    ) -> Result<Entry, MemoryError> {
        let mut entry = entry.clone();
        if entry.id.is_none() {
            entry.id = Some(self.next_id());
        }
        if entry.created_at.is_none() {
            entry.created_at = Some(self.now());
        }

        let lock = self.lock(ctx, "append")?;
        let result = self.append_locked(section, &entry);
        self.unlock(lock);
        result?;

        debug!(
            section = section.as_str(),
            tag = %entry.tag,
            id = entry.id.as_deref().unwrap_or_default(),
            "appended memory entry"
        );
        Ok(entry)
    }

    fn append_locked(&self, section: SectionType, entry: &Entry) -> Result<(), MemoryError> {
        let mut doc = self.read_all()?;
        if doc.is_empty() {
            doc = initial_document(self.now());
        }
        let updated = append_to_section(&doc, section.heading(), &render_entry(entry))?;
        self.atomic_write(&updated)
    }

    /// Replace the whole document, e.g. with a seeded one at `init` time.
    ///
    /// Refuses to overwrite a non-empty document unless `force` is set.
    pub fn initialize(
        &self,
        ctx: &CancelToken,
        content: &str,
        force: bool,
    ) -> Result<(), MemoryError> {
        let lock = self.lock(ctx, "initialize")?;
        let result = self.initialize_locked(content, force);
        self.unlock(lock);
        result
    }

    fn initialize_locked(&self, content: &str, force: bool) -> Result<(), MemoryError> {
        if !force && !self.read_all()?.trim().is_empty() {
            return Err(MemoryError::AlreadyInitialized {
                path: self.file_path.clone(),
            });
        }
        self.atomic_write(content)
    }

    fn lock(&self, ctx: &CancelToken, reason: &str) -> Result<StoreLock, MemoryError> {
        self.ensure_dir()?;
        mnemo_lock::acquire(&self.lock_path, reason, ctx, self.config.lock_timeout).map_err(
            |e| match e {
                LockError::Cancelled => MemoryError::LockCancelled {
                    path: self.lock_path.clone(),
                },
                LockError::TimedOut { waited, holder } => MemoryError::LockTimedOut {
                    path: self.lock_path.clone(),
                    waited,
                    holder,
                },
                LockError::Io { source, .. } => MemoryError::Lock {
                    path: self.lock_path.clone(),
                    source,
                },
            },
        )
    }

    fn unlock(&self, lock: StoreLock) {
        if let Err(e) = lock.release() {
            error!(path = %self.lock_path.display(), error = %e, "failed to release store lock");
        }
    }

    /// Write to a sibling temp file, then rename it over the real path.
    /// The temp file is removed if either step fails.
    fn atomic_write(&self, content: &str) -> Result<(), MemoryError> {
        let tmp_path = self.tmp_path();
        if let Err(source) = write_file(&tmp_path, content) {
            let _ = fs::remove_file(&tmp_path);
            return Err(MemoryError::Write {
                path: tmp_path,
                source,
            });
        }
        if let Err(source) = fs::rename(&tmp_path, &self.file_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(MemoryError::Rename {
                path: self.file_path.clone(),
                source,
            });
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.config.file_name.clone();
        name.push_str(".tmp");
        self.dir_path.join(name)
    }

    fn ensure_dir(&self) -> Result<(), MemoryError> {
        let dir_exists = self.dir_path.exists();
        fs::create_dir_all(&self.dir_path)
            .and_then(|_| {
                if dir_exists {
                    Ok(())
                } else {
                    set_dir_mode_700(&self.dir_path)
                }
            })
            .map_err(|source| MemoryError::CreateDir {
                path: self.dir_path.clone(),
                source,
            })
    }
}

fn write_file(path: &Path, content: &str) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    set_file_mode_600(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

#[cfg(unix)]
fn set_dir_mode_700(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn set_dir_mode_700(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_file_mode_600(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_file_mode_600(_path: &Path) -> io::Result<()> {
    Ok(())
}
