use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::metadata::is_audio_extension;
use crate::utils::file_ops::{FileSystem, FsEntry};
use crate::{LibraryError, LibraryPath, Result};

/// An audio file found in a directory listing, before its metadata is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRef {
    pub path: LibraryPath,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEntry {
    File(SampleRef),
    Directory(LibraryPath),
}

impl DirectoryEntry {
    pub fn path(&self) -> &LibraryPath {
        match self {
            DirectoryEntry::File(file) => &file.path,
            DirectoryEntry::Directory(path) => path,
        }
    }

    pub fn name(&self) -> &str {
        self.path().file_name().unwrap_or_default()
    }
}

/// Lists and classifies the immediate children of library directories.
#[derive(Clone)]
pub struct DirectoryIndex {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    include_hidden: bool,
}

impl DirectoryIndex {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, include_hidden: bool) -> Self {
        Self {
            root: root.into(),
            fs,
            include_hidden,
        }
    }

    /// Audio files and subdirectories of `path`. Sidecars and other files are dropped.
    pub async fn list(&self, path: &LibraryPath) -> Result<Vec<DirectoryEntry>> {
        let dir = path.to_fs_path(&self.root);
        let entries = self.fs.list_directory(&dir, false).await.map_err(|e| {
            log::debug!("Cannot list {}: {}", dir.display(), e);
            LibraryError::DirectoryUnreadable(path.to_string())
        })?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| self.classify(&entry))
            .collect())
    }

    /// Every audio file at or below `path`.
    pub async fn audio_files_under(&self, path: &LibraryPath) -> Result<Vec<SampleRef>> {
        let dir = path.to_fs_path(&self.root);
        let entries = self.fs.list_directory(&dir, true).await.map_err(|e| {
            log::debug!("Cannot walk {}: {}", dir.display(), e);
            LibraryError::DirectoryUnreadable(path.to_string())
        })?;

        Ok(entries
            .into_iter()
            .filter(|entry| self.include_hidden || !self.has_hidden_component(&entry.path))
            .filter_map(|entry| match self.classify(&entry) {
                Some(DirectoryEntry::File(file)) => Some(file),
                _ => None,
            })
            .collect())
    }

    fn classify(&self, entry: &FsEntry) -> Option<DirectoryEntry> {
        let path = LibraryPath::from_fs_path(&self.root, &entry.path)?;
        let name = path.file_name()?.to_string();
        if !self.include_hidden && is_hidden_name(&name) {
            return None;
        }

        if entry.is_dir {
            return Some(DirectoryEntry::Directory(path));
        }
        match path.extension() {
            Some(ext) if is_audio_extension(&ext) => {
                Some(DirectoryEntry::File(SampleRef { path, name }))
            }
            _ => None,
        }
    }

    fn has_hidden_component(&self, path: &Path) -> bool {
        path.strip_prefix(&self.root)
            .map(|relative| {
                relative
                    .components()
                    .any(|c| is_hidden_name(&c.as_os_str().to_string_lossy()))
            })
            .unwrap_or(false)
    }
}

pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}
