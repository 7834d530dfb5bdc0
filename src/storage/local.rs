/// Local filesystem blob store.
///
/// One file per key inside a base directory, with atomic writes
/// (write to .tmp, fsync, rename, fsync directory).
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{BlobStore, StorageError};

pub struct LocalStore {
    base_dir: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `base_dir`, creating the directory if needed.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Keys become file names, so path separators and traversal are refused.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains('/')
            || key.contains('\\')
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(format!("{}.json", key)))
    }

    /// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        let tmp_path = path.with_extension("sparkboard.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        // fsync directory for rename durability
        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl BlobStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        Self::atomic_write(&path, value)?;
        Ok(())
    }
}
