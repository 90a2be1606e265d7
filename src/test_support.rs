//! Helpers shared by unit tests.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::utils::file_ops::{FileSystem, FsEntry};
use crate::{LibraryConfig, LocalFileSystem, SampleLibrary};

/// Canonical mono 16-bit PCM WAV with `n_frames` frames.
/// `seed` fills the payload so different seeds give different content.
pub fn wav_bytes(sample_rate: u32, n_frames: u32, seed: u8) -> Vec<u8> {
    let channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let block_align = channels * bits_per_sample / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = n_frames * block_align as u32;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, seed);
    out
}

/// Small distinct WAV, 100 ms at 8 kHz.
pub fn tiny_wav(seed: u8) -> Vec<u8> {
    wav_bytes(8_000, 800, seed)
}

pub fn test_config(root: &Path) -> LibraryConfig {
    LibraryConfig {
        root: root.to_path_buf(),
        ..LibraryConfig::default()
    }
}

pub async fn open_library(root: &Path) -> SampleLibrary {
    SampleLibrary::open(test_config(root), Arc::new(LocalFileSystem))
        .await
        .unwrap()
}

/// Number of `.json` sidecars anywhere under `root`.
pub fn count_sidecars(root: &Path) -> usize {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("json"))
        .count()
}

/// Local disk, except reading any file named `locked` fails.
pub struct LockedFileSystem {
    pub locked: &'static str,
}

#[async_trait]
impl FileSystem for LockedFileSystem {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        if path.file_name().and_then(|n| n.to_str()) == Some(self.locked) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        LocalFileSystem.read_file(path).await
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        LocalFileSystem.write_file(path, bytes).await
    }

    async fn list_directory(&self, path: &Path, recursive: bool) -> io::Result<Vec<FsEntry>> {
        LocalFileSystem.list_directory(path, recursive).await
    }

    async fn ensure_directory(&self, path: &Path) -> io::Result<()> {
        LocalFileSystem.ensure_directory(path).await
    }
}

/// A library over [`LockedFileSystem`] whose `locked` file already has a
/// sidecar without a content hash.
pub async fn library_with_locked_file(root: &Path, locked: &'static str, bytes: &[u8]) -> SampleLibrary {
    std::fs::write(root.join(locked), bytes).unwrap();
    open_library(root)
        .await
        .load_sample(&crate::LibraryPath::root().join(locked))
        .await
        .unwrap();
    SampleLibrary::open(test_config(root), Arc::new(LockedFileSystem { locked }))
        .await
        .unwrap()
}
