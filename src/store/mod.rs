//! Flat-file persistence for diary entries.
//!
//! Every entry lives in its own text file inside a single storage directory.
//! The store keeps no state besides the directory path, so clones can be handed
//! to background tasks freely. There is no locking: concurrent writers outside
//! this process are not coordinated.

use crate::entry::{DecodeError, EntryRecord};
use crate::errors::{AppResult, StorageError};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;


/// Durable mapping from [`EntryRecord`]s to files in one directory.
///
/// # Examples
///
/// ```
/// use daybook::entry::EntryRecord;
/// use daybook::store::EntryStore;
///
/// # fn main() -> daybook::AppResult<()> {
/// let dir = tempfile::tempdir()?;
/// let store = EntryStore::new(dir.path());
/// store.initialize()?;
///
/// let mut entry = EntryRecord::new("Trip", "Day 1");
/// let file_id = store.save(&mut entry)?;
/// assert_eq!(entry.file_id.as_deref(), Some(file_id.as_str()));
///
/// let entries = store.list_all()?;
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].content, "Day 1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EntryStore {
    dir: PathBuf,
}

impl EntryStore {
    /// Creates a store rooted at `dir`. Nothing touches the disk until
    /// [`EntryStore::initialize`] or another operation runs.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        EntryStore { dir: dir.into() }
    }

    /// The storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ensures the storage directory exists, creating it if necessary.
    ///
    /// Idempotent. A newly created directory is restricted to its owner on
    /// Unix platforms.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CreateDir` if the directory cannot be created.
    /// Callers treat this as non-fatal: later operations report their own
    /// failures.
    pub fn initialize(&self) -> AppResult<()> {
        if self.dir.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(&self.dir).map_err(|source| StorageError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        #[cfg(unix)]
        {
            let permissions = fs::Permissions::from_mode(crate::constants::DEFAULT_DIR_PERMISSIONS);
            fs::set_permissions(&self.dir, permissions).map_err(|source| {
                StorageError::CreateDir {
                    path: self.dir.clone(),
                    source,
                }
            })?;
            debug!("Set 0o700 permissions on entries directory");
        }

        info!("Created entries directory {}", self.dir.display());
        Ok(())
    }

    /// Writes `record` to the file named by [`EntryRecord::file_name`].
    ///
    /// An existing file with the same name is overwritten. On success the
    /// record's `file_id` is set to the file name, which is also returned.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Write` if the file cannot be written; the record
    /// is left untouched in that case.
    pub fn save(&self, record: &mut EntryRecord) -> AppResult<String> {
        let file_id = record.file_name();
        let path = self.dir.join(&file_id);

        write_entry_file(&path, &record.encode())
            .map_err(|source| StorageError::Write { path, source })?;

        debug!("Saved entry '{}' as {}", record.title, file_id);
        record.file_id = Some(file_id.clone());
        Ok(file_id)
    }

    /// Replaces the file backing `original` with one for `updated`.
    ///
    /// This is a delete followed by a save and is not atomic: if the save
    /// fails, the original file is already gone.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever step failed.
    pub fn update(&self, original: &EntryRecord, updated: &mut EntryRecord) -> AppResult<String> {
        self.delete(original)?;
        self.save(updated)
    }

    /// Removes the file backing `record`.
    ///
    /// The file named by `record.file_id` is tried first. If the record has no
    /// identifier or that file is gone, every file in the directory is decoded
    /// and the first one whose timestamp and title both equal the record's is
    /// removed. Returns whether a file was removed; finding nothing is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Delete` if a matching file cannot be removed, or
    /// `StorageError::Read` if the fallback scan cannot read the directory.
    pub fn delete(&self, record: &EntryRecord) -> AppResult<bool> {
        if let Some(path) = record.file_id.as_deref().and_then(|id| self.resolve(id)) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Deleted entry file {}", path.display());
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Entry file {} is gone, scanning directory", path.display());
                }
                Err(source) => return Err(StorageError::Delete { path, source }.into()),
            }
        }

        for (path, loaded) in self.scan()? {
            if loaded.timestamp == record.timestamp && loaded.title == record.title {
                fs::remove_file(&path).map_err(|source| StorageError::Delete {
                    path: path.clone(),
                    source,
                })?;
                debug!("Deleted entry file {} found by scan", path.display());
                return Ok(true);
            }
        }

        debug!("No file found for entry '{}'", record.title);
        Ok(false)
    }

    /// Returns every decodable entry, most recent first.
    ///
    /// Files that cannot be read or decoded are skipped. A missing storage
    /// directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Read` if the storage directory exists but cannot
    /// be read.
    pub fn list_all(&self) -> AppResult<Vec<EntryRecord>> {
        let mut entries: Vec<EntryRecord> = self
            .scan()?
            .into_iter()
            .map(|(_, entry)| entry)
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// Returns the entries whose title or content contains `query`, ignoring
    /// case, in the same order as [`EntryStore::list_all`].
    ///
    /// An empty query matches every entry.
    pub fn search(&self, query: &str) -> AppResult<Vec<EntryRecord>> {
        let needle = query.to_lowercase();
        let mut entries = self.list_all()?;
        entries.retain(|entry| entry.matches_lowercase(&needle));
        Ok(entries)
    }

    /// Maps a file identifier to a path inside the storage directory.
    ///
    /// Identifiers that are absolute or climb out of the directory resolve to
    /// nothing.
    fn resolve(&self, file_id: &str) -> Option<PathBuf> {
        let relative = Path::new(file_id);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if file_id.is_empty() || !contained {
            warn!("Ignoring unusable file id '{}'", file_id);
            return None;
        }
        Some(self.dir.join(relative))
    }

    /// Decodes every regular file under the storage directory.
    fn scan(&self) -> AppResult<Vec<(PathBuf, EntryRecord)>> {
        let mut found = Vec::new();

        for item in WalkDir::new(&self.dir).min_depth(1).sort_by_file_name() {
            let item = match item {
                Ok(item) => item,
                Err(e) if e.depth() == 0 => {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::new(ErrorKind::Other, "walk failed"));
                    if source.kind() == ErrorKind::NotFound {
                        debug!("Entries directory {} does not exist", self.dir.display());
                        return Ok(found);
                    }
                    return Err(StorageError::Read {
                        path: self.dir.clone(),
                        source,
                    }
                    .into());
                }
                Err(e) => {
                    warn!("Skipping unreadable directory item: {}", e);
                    continue;
                }
            };

            if !item.file_type().is_file() {
                continue;
            }

            let path = item.into_path();
            match load_entry(&path) {
                Ok(mut entry) => {
                    entry.file_id = path
                        .strip_prefix(&self.dir)
                        .ok()
                        .map(|relative| relative.to_string_lossy().into_owned());
                    found.push((path, entry));
                }
                Err(LoadError::Decode(e)) => {
                    debug!("Skipping corrupt entry file {}: {}", path.display(), e);
                }
                Err(LoadError::Io(e)) => {
                    warn!("Skipping unreadable entry file {}: {}", path.display(), e);
                }
            }
        }

        Ok(found)
    }
}

enum LoadError {
    Io(std::io::Error),
    Decode(DecodeError),
}

fn load_entry(path: &Path) -> Result<EntryRecord, LoadError> {
    let bytes = fs::read(path).map_err(LoadError::Io)?;
    let text = String::from_utf8(bytes).map_err(|_| LoadError::Decode(DecodeError::NotUtf8))?;
    EntryRecord::decode(&text).map_err(LoadError::Decode)
}

fn write_entry_file(path: &Path, text: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(crate::constants::DEFAULT_FILE_PERMISSIONS);

    let mut file = options.open(path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()
}
