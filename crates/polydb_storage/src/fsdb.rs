//! File-per-key backend.
//!
//! Each record is one file inside the store directory:
//!
//! ```text
//! <dir>/<name>.db/
//! ├─ LOCK            # Advisory lock held while the store is open
//! ├─ k616263         # Value of key "abc" (file name is "k" + hex(key))
//! ├─ k               # Value of the empty key
//! └─ d<250 hex>/     # Long keys: leading hex segments become directories
//!    └─ k<rest>      # Remaining hex of the key
//! ```
//!
//! Hex names are split into segments of at most [`SEGMENT_LEN`] characters
//! so that no path component exceeds file system name limits.
//!
//! Writes go to a temporary `t` file that is renamed over the record, so a
//! reader never observes a partially written value. Leftover temporary files
//! are removed when the store is opened.

use crate::arg::ByteArg;
use crate::batch::{Batch, BatchOp};
use crate::config::{store_path, Config};
use crate::engine::{in_range, Direction, KvEngine, KvIter, KvPair};
use crate::error::{StorageError, StorageResult};
use crate::validate::{check_key, normalize_value};
use fs2::FileExt;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Backend identifier of [`FsDb`].
pub const FSDB_BACKEND: &str = "fsdb";

/// Longest key [`FsDb`] can store, bounded by the platform path length.
///
/// Longer keys are never present: `get`, `has` and `delete` treat them as
/// absent and writes fail with `KeyTooLong`.
pub const FSDB_MAX_KEY_LEN: usize = 1024;

/// Maximum hex characters per path component.
const SEGMENT_LEN: usize = 250;

const LOCK_FILE: &str = "LOCK";
const RECORD_PREFIX: char = 'k';
const DIR_PREFIX: char = 'd';
const TEMP_PREFIX: char = 't';

/// Where a key lives on disk.
#[derive(Debug)]
struct Location {
    dir: PathBuf,
    file: PathBuf,
    temp: PathBuf,
}

/// A directory-backed store with one file per record.
///
/// # Durability
///
/// - `set`/`delete` rename or unlink the record file; data stays in the OS
///   page cache
/// - `set_sync` calls `File::sync_all()` before the rename, and both sync
///   variants sync the touched directories afterwards
///
/// # Thread Safety
///
/// Writers are serialized by an internal lock. A batch stages every value
/// in a temporary file before renaming any of them, so a batch that fails
/// while staging leaves the store unchanged.
///
/// # Example
///
/// ```no_run
/// use polydb_storage::{Config, FsDb, KvEngine};
/// use std::path::Path;
///
/// let db = FsDb::open("state", Path::new("/tmp"), &Config::default()).unwrap();
/// db.set_sync(b"height", b"42").unwrap();
/// db.close().unwrap();
/// ```
#[derive(Debug)]
pub struct FsDb {
    path: PathBuf,
    lock: RwLock<()>,
    _lock_file: File,
}

impl FsDb {
    /// Opens or creates the store `name` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The store doesn't exist and `create_if_missing` is false
    /// - Another handle holds the lock (returns `Locked`)
    /// - I/O errors occur
    pub fn open(name: &str, dir: &Path, config: &Config) -> StorageResult<Self> {
        let path = store_path(dir, name);

        if !path.exists() {
            if config.create_if_missing {
                fs::create_dir_all(&path)?;
            } else {
                return Err(StorageError::Missing { path });
            }
        }

        if !path.is_dir() {
            return Err(StorageError::Corrupted(format!(
                "store path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked { path });
        }

        let removed = Self::remove_temps(&path)?;
        if removed > 0 {
            tracing::warn!(
                path = %path.display(),
                removed,
                "removed leftover temporary files"
            );
        }

        tracing::debug!(path = %path.display(), "opened fsdb");
        Ok(Self {
            path,
            lock: RwLock::new(()),
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves the files of `key`, or `None` if it is too long to store.
    fn locate(&self, key: &[u8]) -> Option<Location> {
        if key.len() > FSDB_MAX_KEY_LEN {
            return None;
        }

        let encoded = hex::encode(key);
        let mut dir = self.path.clone();
        let mut rest = encoded.as_str();
        while rest.len() > SEGMENT_LEN {
            let (segment, tail) = rest.split_at(SEGMENT_LEN);
            dir.push(format!("{DIR_PREFIX}{segment}"));
            rest = tail;
        }

        Some(Location {
            file: dir.join(format!("{RECORD_PREFIX}{rest}")),
            temp: dir.join(format!("{TEMP_PREFIX}{rest}")),
            dir,
        })
    }

    fn locate_for_write(&self, key: &[u8]) -> StorageResult<Location> {
        let location = self.locate(key).ok_or(StorageError::KeyTooLong {
            len: key.len(),
            max: FSDB_MAX_KEY_LEN,
        })?;
        if location.file.is_dir() {
            return Err(StorageError::Corrupted(format!(
                "record path is a directory: {}",
                location.file.display()
            )));
        }
        Ok(location)
    }

    /// Writes `value` to the temporary file of `location`.
    ///
    /// The temporary file is removed again if the write fails.
    fn stage(&self, location: &Location, value: &[u8], sync: bool) -> StorageResult<()> {
        if location.dir != self.path {
            fs::create_dir_all(&location.dir)?;
        }

        let written = Self::write_temp(&location.temp, value, sync);
        if written.is_err() {
            self.discard(location);
        }
        Ok(written?)
    }

    fn write_temp(path: &Path, value: &[u8], sync: bool) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(value)?;
        if sync {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Removes a staged temporary file and any directories left empty.
    fn discard(&self, location: &Location) {
        match fs::remove_file(&location.temp) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %location.temp.display(),
                    error = %e,
                    "failed to remove temporary file"
                );
            }
        }
        self.prune(&location.dir);
    }

    fn write_record(&self, key: &[u8], value: &[u8], sync: bool) -> StorageResult<Location> {
        let location = self.locate_for_write(key)?;
        self.stage(&location, value, sync)?;
        fs::rename(&location.temp, &location.file)?;
        Ok(location)
    }

    fn remove_record(&self, location: &Location) -> StorageResult<()> {
        match fs::remove_file(&location.file) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.prune(&location.dir);
        Ok(())
    }

    /// Removes empty segment directories from `dir` up to the store root.
    fn prune(&self, dir: &Path) {
        let mut dir = dir.to_path_buf();
        while dir != self.path && fs::remove_dir(&dir).is_ok() {
            dir.pop();
        }
    }

    fn read_record(path: &Path) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns every record key, sorted.
    fn keys(&self) -> StorageResult<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        Self::collect_keys(&self.path, "", &mut keys)?;
        keys.sort();
        Ok(keys)
    }

    fn collect_keys(dir: &Path, prefix: &str, keys: &mut Vec<Vec<u8>>) -> StorageResult<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let file_type = entry.file_type()?;

            if let Some(segment) = name.strip_prefix(DIR_PREFIX) {
                if file_type.is_dir() {
                    Self::collect_keys(&entry.path(), &format!("{prefix}{segment}"), keys)?;
                }
            } else if let Some(segment) = name.strip_prefix(RECORD_PREFIX) {
                if file_type.is_file() {
                    if let Ok(key) = hex::decode(format!("{prefix}{segment}")) {
                        keys.push(key);
                    }
                }
            }
        }
        Ok(())
    }

    /// Deletes temporary files left behind by an interrupted write.
    fn remove_temps(dir: &Path) -> StorageResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let file_type = entry.file_type()?;

            if name.starts_with(TEMP_PREFIX) && file_type.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            } else if name.starts_with(DIR_PREFIX) && file_type.is_dir() {
                removed += Self::remove_temps(&entry.path())?;
            }
        }
        Ok(removed)
    }

    /// Syncs a directory entry list. Pruned directories are skipped.
    fn sync_dir(dir: &Path) -> StorageResult<()> {
        #[cfg(unix)]
        match File::open(dir) {
            Ok(handle) => handle.sync_all()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        #[cfg(not(unix))]
        let _ = dir;
        Ok(())
    }

    /// Syncs `dirs` and every directory between them and the store root.
    fn sync_dirs<'a>(&self, dirs: impl IntoIterator<Item = &'a Path>) -> StorageResult<()> {
        let mut pending = BTreeSet::new();
        pending.insert(self.path.as_path());
        for dir in dirs {
            pending.extend(dir.ancestors().take_while(|d| d.starts_with(&self.path)));
        }
        for dir in pending {
            Self::sync_dir(dir)?;
        }
        Ok(())
    }

    /// Applies a batch in two phases.
    ///
    /// Every key is resolved and every value staged before the first rename.
    /// A failure up to that point removes the staged files and leaves the
    /// store untouched.
    fn apply(&self, batch: Batch, sync: bool) -> StorageResult<()> {
        let _guard = self.lock.write();

        let mut last = BTreeMap::new();
        for op in batch {
            match op {
                BatchOp::Set { key, value } => last.insert(key, Some(value)),
                BatchOp::Delete { key } => last.insert(key, None),
            };
        }

        let mut writes = Vec::new();
        let mut removals = Vec::new();
        for (key, value) in last {
            match value {
                Some(value) => writes.push((self.locate_for_write(&key)?, value)),
                None => removals.extend(self.locate(&key)),
            }
        }

        for (staged, (location, value)) in writes.iter().enumerate() {
            if let Err(e) = self.stage(location, value, sync) {
                for (location, _) in &writes[..staged] {
                    self.discard(location);
                }
                return Err(e);
            }
        }

        for (location, _) in &writes {
            fs::rename(&location.temp, &location.file)?;
        }
        for location in &removals {
            self.remove_record(location)?;
        }

        if sync {
            let touched = writes.iter().map(|(l, _)| l).chain(&removals);
            self.sync_dirs(touched.map(|l| l.dir.as_path()))?;
        }
        Ok(())
    }
}

impl KvEngine for FsDb {
    fn backend(&self) -> &'static str {
        FSDB_BACKEND
    }

    fn get<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<Option<Vec<u8>>> {
        let key = check_key(key.byte_arg(), "get");
        let Some(location) = self.locate(key) else {
            return Ok(None);
        };
        let _guard = self.lock.read();
        Self::read_record(&location.file)
    }

    fn has<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<bool> {
        let key = check_key(key.byte_arg(), "has");
        let Some(location) = self.locate(key) else {
            return Ok(false);
        };
        let _guard = self.lock.read();
        match fs::metadata(&location.file) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn set<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        let key = check_key(key.byte_arg(), "set");
        let value = normalize_value(value.byte_arg());
        let _guard = self.lock.write();
        self.write_record(key, value, false)?;
        Ok(())
    }

    fn set_sync<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        let key = check_key(key.byte_arg(), "set_sync");
        let value = normalize_value(value.byte_arg());
        let _guard = self.lock.write();
        let location = self.write_record(key, value, true)?;
        self.sync_dirs([location.dir.as_path()])
    }

    fn delete<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()> {
        let key = check_key(key.byte_arg(), "delete");
        let Some(location) = self.locate(key) else {
            return Ok(());
        };
        let _guard = self.lock.write();
        self.remove_record(&location)
    }

    fn delete_sync<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()> {
        let key = check_key(key.byte_arg(), "delete_sync");
        let Some(location) = self.locate(key) else {
            return Ok(());
        };
        let _guard = self.lock.write();
        self.remove_record(&location)?;
        self.sync_dirs([location.dir.as_path()])
    }

    fn iter(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        direction: Direction,
    ) -> StorageResult<KvIter<'_>> {
        let _guard = self.lock.read();
        let mut pairs: Vec<KvPair> = Vec::new();
        for key in self.keys()? {
            if !in_range(&key, start, end) {
                continue;
            }
            let Some(location) = self.locate(&key) else {
                continue;
            };
            if let Some(value) = Self::read_record(&location.file)? {
                pairs.push((key, value));
            }
        }
        if direction == Direction::Reverse {
            pairs.reverse();
        }
        Ok(Box::new(pairs.into_iter().map(Ok)))
    }

    fn write(&self, batch: Batch) -> StorageResult<()> {
        self.apply(batch, false)
    }

    fn write_sync(&self, batch: Batch) -> StorageResult<()> {
        self.apply(batch, true)
    }

    fn flush(&self) -> StorageResult<()> {
        let _guard = self.lock.write();
        let mut dirs = BTreeSet::new();
        for key in self.keys()? {
            if let Some(location) = self.locate(&key) {
                File::open(&location.file)?.sync_all()?;
                dirs.insert(location.dir);
            }
        }
        self.sync_dirs(dirs.iter().map(PathBuf::as_path))
    }

    fn stats(&self) -> BTreeMap<String, String> {
        let mut stats = BTreeMap::new();
        stats.insert("database.type".to_string(), FSDB_BACKEND.to_string());
        stats.insert("database.path".to_string(), self.path.display().to_string());
        if let Ok(keys) = self.keys() {
            stats.insert("database.keys".to_string(), keys.len().to_string());
        }
        stats
    }

    fn close(self) -> StorageResult<()> {
        let result = self.flush();
        tracing::debug!(path = %self.path.display(), "closing fsdb");
        result
    }
}
