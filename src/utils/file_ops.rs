use std::io;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// One entry returned by [`FileSystem::list_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Host filesystem capability the library is built on.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Writes `bytes`, creating intermediate directories.
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Entries below `path`. Immediate children only unless `recursive`.
    async fn list_directory(&self, path: &Path, recursive: bool) -> io::Result<Vec<FsEntry>>;

    async fn ensure_directory(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] over the local disk.
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Hidden temp file next to `path`; listings skip it.
    fn staging_path(path: &Path) -> io::Result<PathBuf> {
        let file_name = path.file_name()
            .ok_or_else(|| io::Error::new(
                io::ErrorKind::InvalidInput,
                "Invalid file path"
            ))?;
        let mut staged = std::ffi::OsString::from(".");
        staged.push(file_name);
        staged.push(".tmp");
        Ok(path.with_file_name(staged))
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path).await
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a staging file and rename so readers never see a torn write.
        let staging = Self::staging_path(path)?;
        let mut file = fs::File::create(&staging).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&staging, path).await
    }

    async fn list_directory(&self, path: &Path, recursive: bool) -> io::Result<Vec<FsEntry>> {
        let meta = fs::metadata(path).await?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Not a directory: {}", path.display()),
            ));
        }

        if !recursive {
            let mut entries = Vec::new();
            let mut dir = fs::read_dir(path).await?;
            while let Some(entry) = dir.next_entry().await? {
                // Follow symlinks like the recursive walk does.
                let is_dir = match fs::metadata(entry.path()).await {
                    Ok(meta) => meta.is_dir(),
                    Err(_) => entry.file_type().await?.is_dir(),
                };
                entries.push(FsEntry {
                    path: entry.path(),
                    is_dir,
                });
            }
            return Ok(entries);
        }

        let root = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            walkdir::WalkDir::new(&root)
                .min_depth(1)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| match e {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        log::warn!("Error accessing entry: {}", err);
                        None
                    }
                })
                .map(|entry| FsEntry {
                    is_dir: entry.file_type().is_dir(),
                    path: entry.into_path(),
                })
                .collect::<Vec<FsEntry>>()
        })
        .await
        .map_err(io::Error::other)
    }

    async fn ensure_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path).await
    }
}
