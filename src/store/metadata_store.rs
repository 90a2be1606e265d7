use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::metadata::METADATA_EXTENSION;
use crate::utils::file_ops::FileSystem;
use crate::{LibraryError, LibraryPath, Result, Sample};

/// Reads and writes the JSON sidecar of each sample. No caching; every call
/// goes to the filesystem.
#[derive(Clone)]
pub struct MetadataStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl MetadataStore {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self { root: root.into(), fs }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `name.ext` -> `name.json` in the same directory.
    pub fn sidecar_path(audio_path: &LibraryPath) -> LibraryPath {
        audio_path.with_extension(METADATA_EXTENSION)
    }

    /// Persists `sample` as the sidecar of `audio_path`, replacing any existing one.
    pub async fn write(&self, audio_path: &LibraryPath, sample: Sample) -> Result<Sample> {
        let sidecar = Self::sidecar_path(audio_path).to_fs_path(&self.root);
        let json = serde_json::to_vec_pretty(&sample)?;
        self.fs.write_file(&sidecar, &json).await?;
        log::debug!("Wrote metadata: {}", sidecar.display());
        Ok(sample)
    }

    /// Loads the sidecar of `audio_path`. Absent or unparsable sidecars are
    /// [`LibraryError::NotFound`]; other I/O failures propagate.
    pub async fn read(&self, audio_path: &LibraryPath) -> Result<Sample> {
        let sidecar = Self::sidecar_path(audio_path).to_fs_path(&self.root);
        let bytes = match self.fs.read_file(&sidecar).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LibraryError::NotFound(audio_path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            log::warn!("Unparsable metadata {}: {}", sidecar.display(), e);
            LibraryError::NotFound(audio_path.to_string())
        })
    }
}
