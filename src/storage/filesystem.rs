//! File system operations
//!
//! [`FileStore`] performs file and directory operations confined to a root.
//! Every call resolves its caller path through [`PathResolver`] first; calls
//! that mutate storage then notify the shared [`WatcherRegistry`].

use log::debug;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs::{self, File, OpenOptions};

use super::modes::WriteMode;
use super::reader::FileReader;
use super::validation::{PathComparison, PathResolver};
use super::writer::FileWriter;
use crate::error::StorageError;
use crate::watch::{FileSystemChangeEvent, WatcherRegistry};

/// Root-confined file store with change notification.
#[derive(Clone)]
pub struct FileStore {
    resolver: PathResolver,
    watchers: WatcherRegistry,
}

impl FileStore {
    pub fn new(resolver: PathResolver, watchers: WatcherRegistry) -> Self {
        Self { resolver, watchers }
    }

    /// Create a store rooted at `root` with a fresh watcher registry.
    pub fn with_root(root: impl AsRef<Path>, comparison: PathComparison) -> io::Result<Self> {
        Ok(Self::new(
            PathResolver::new(root, comparison)?,
            WatcherRegistry::new(),
        ))
    }

    pub fn root(&self) -> Option<&Path> {
        self.resolver.root()
    }

    /// Registry notified by this store's mutating operations.
    pub fn watchers(&self) -> &WatcherRegistry {
        &self.watchers
    }

    pub fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        self.resolver.resolve(path)
    }

    /// Open a write stream in the given mode, creating parent directories.
    ///
    /// Overwrite and RandomAccess writers emit `FileAdded` when released.
    pub async fn open_for_writing(
        &self,
        path: &str,
        mode: WriteMode,
    ) -> Result<FileWriter, StorageError> {
        let resolved = self.resolve(path)?;
        ensure_parent(&resolved).await?;

        let mut options = OpenOptions::new();
        match mode {
            WriteMode::Overwrite => options.write(true).create(true).truncate(true),
            WriteMode::Append => options.append(true).create(true),
            WriteMode::RandomAccess => options.read(true).write(true).create(true),
        };
        let file = options.open(&resolved).await?;

        debug!("Opened {} for writing ({mode})", resolved.display());
        Ok(FileWriter::new(file, mode, self.watchers.clone(), path))
    }

    /// Create or truncate a file to exactly `size` bytes and sync it to disk.
    pub async fn pre_allocate(&self, path: &str, size: u64) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        ensure_parent(&resolved).await?;

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&resolved)
            .await?;
        file.set_len(size).await?;
        file.sync_all().await?;
        drop(file);

        debug!("Pre-allocated {} ({size} bytes)", resolved.display());
        self.watchers.notify(&FileSystemChangeEvent::file_added(path));
        Ok(())
    }

    /// Overwrite a file with UTF-8 text. Always emits `FileAdded`.
    pub async fn write_text(&self, path: &str, content: &str) -> Result<(), StorageError> {
        self.write_bytes(path, content.as_bytes()).await
    }

    /// Overwrite a file with raw bytes. Always emits `FileAdded`.
    pub async fn write_bytes(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        ensure_parent(&resolved).await?;
        fs::write(&resolved, content).await?;

        debug!("Wrote {} bytes to {}", content.len(), resolved.display());
        self.watchers.notify(&FileSystemChangeEvent::file_added(path));
        Ok(())
    }

    /// Open a read-only stream.
    pub async fn open_for_reading(&self, path: &str) -> Result<FileReader, StorageError> {
        let resolved = self.resolve(path)?;
        file_metadata(&resolved, path).await?;
        let file = File::open(&resolved)
            .await
            .map_err(|e| not_found_as(e, || StorageError::FileNotFound(path.to_string())))?;
        Ok(FileReader::new(file))
    }

    /// Read a whole file as UTF-8 text.
    ///
    /// Only UTF-8 is supported. Invalid data fails with [`StorageError::Io`]
    /// of kind `InvalidData`; use [`FileStore::read_bytes`] for other encodings.
    pub async fn read_text(&self, path: &str) -> Result<String, StorageError> {
        let resolved = self.resolve(path)?;
        fs::read_to_string(&resolved)
            .await
            .map_err(|e| not_found_as(e, || StorageError::FileNotFound(path.to_string())))
    }

    pub async fn read_bytes(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let resolved = self.resolve(path)?;
        fs::read(&resolved)
            .await
            .map_err(|e| not_found_as(e, || StorageError::FileNotFound(path.to_string())))
    }

    /// Delete a file. Missing files are ignored.
    ///
    /// Emits `FileDeleted` only when a file was removed.
    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        match fs::remove_file(&resolved).await {
            Ok(()) => {
                debug!("Deleted {}", resolved.display());
                self.watchers
                    .notify(&FileSystemChangeEvent::file_deleted(path));
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a file exists
    pub async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let resolved = self.resolve(path)?;
        Ok(fs::metadata(&resolved).await.is_ok_and(|m| m.is_file()))
    }

    /// Check if a directory exists
    pub async fn directory_exists(&self, path: &str) -> Result<bool, StorageError> {
        let resolved = self.resolve(path)?;
        Ok(fs::metadata(&resolved).await.is_ok_and(|m| m.is_dir()))
    }

    /// Create a directory and any missing parents.
    ///
    /// Emits `DirectoryAdded` on every call, including when the directory
    /// already existed.
    pub async fn create_directory(&self, path: &str) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        fs::create_dir_all(&resolved).await?;

        debug!("Created directory {}", resolved.display());
        self.watchers
            .notify(&FileSystemChangeEvent::directory_added(path));
        Ok(())
    }

    /// Delete a directory. Missing directories are ignored.
    ///
    /// A non-empty directory is only removed when `recursive` is set.
    pub async fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        match fs::metadata(&resolved).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        if recursive {
            fs::remove_dir_all(&resolved).await?;
        } else {
            let mut entries = fs::read_dir(&resolved).await?;
            if entries.next_entry().await?.is_some() {
                return Err(StorageError::DirectoryNotEmpty(path.to_string()));
            }
            fs::remove_dir(&resolved).await?;
        }

        debug!("Deleted directory {} (recursive: {recursive})", resolved.display());
        self.watchers
            .notify(&FileSystemChangeEvent::directory_deleted(path));
        Ok(())
    }

    /// List the files directly inside a directory, sorted by path.
    pub async fn enumerate_files(&self, path: &str) -> Result<Vec<PathBuf>, StorageError> {
        let resolved = self.resolve(path)?;
        match fs::metadata(&resolved).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(StorageError::DirectoryNotFound(path.to_string())),
            Err(e) => {
                return Err(not_found_as(e, || {
                    StorageError::DirectoryNotFound(path.to_string())
                }));
            }
        }

        let mut files = Vec::new();
        let mut entries = fs::read_dir(&resolved).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// File size in bytes
    pub async fn size(&self, path: &str) -> Result<u64, StorageError> {
        let resolved = self.resolve(path)?;
        Ok(file_metadata(&resolved, path).await?.len())
    }

    pub async fn last_modified(&self, path: &str) -> Result<SystemTime, StorageError> {
        let resolved = self.resolve(path)?;
        Ok(file_metadata(&resolved, path).await?.modified()?)
    }

    /// Copy a file, replacing the destination and creating its parents.
    ///
    /// Copying a file onto itself leaves it untouched and emits nothing.
    pub async fn copy_file(&self, source: &str, destination: &str) -> Result<(), StorageError> {
        let resolved_source = self.resolve(source)?;
        let resolved_destination = self.resolve(destination)?;
        file_metadata(&resolved_source, source).await?;

        if self.resolver.same_path(&resolved_source, &resolved_destination) {
            debug!("Copy of {} onto itself skipped", resolved_source.display());
            return Ok(());
        }

        ensure_parent(&resolved_destination).await?;
        let copied = fs::copy(&resolved_source, &resolved_destination)
            .await
            .map_err(|e| not_found_as(e, || StorageError::FileNotFound(source.to_string())))?;

        debug!(
            "Copied {} to {} ({copied} bytes)",
            resolved_source.display(),
            resolved_destination.display()
        );
        self.watchers
            .notify(&FileSystemChangeEvent::file_added(destination));
        Ok(())
    }
}

async fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

/// Metadata for a regular file; directories and missing paths are `FileNotFound`.
async fn file_metadata(resolved: &Path, caller_path: &str) -> Result<Metadata, StorageError> {
    match fs::metadata(resolved).await {
        Ok(metadata) if metadata.is_file() => Ok(metadata),
        Ok(_) => Err(StorageError::FileNotFound(caller_path.to_string())),
        Err(e) => Err(not_found_as(e, || {
            StorageError::FileNotFound(caller_path.to_string())
        })),
    }
}

fn not_found_as(error: io::Error, missing: impl FnOnce() -> StorageError) -> StorageError {
    if error.kind() == io::ErrorKind::NotFound {
        missing()
    } else {
        StorageError::Io(error)
    }
}
