use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod audio;
pub mod cli;
pub mod config;
pub mod library;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use library::path::LibraryPath;

/// Decoded characteristics of an audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    #[serde(rename = "type")]
    pub media_type: String,
    /// Seconds.
    pub duration: f64,
    /// Hz.
    pub sample_rate: u32,
    /// kbps, derived from file size and duration.
    pub bit_rate: f64,
}

impl MediaInfo {
    /// Placeholder used when a file on disk cannot be decoded.
    pub fn unknown(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            duration: 0.0,
            sample_rate: 0,
            bit_rate: 0.0,
        }
    }
}

/// One audio file in the library, as persisted in its sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub id: Uuid,
    pub original_name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub relative_path: LibraryPath,
    pub folder: LibraryPath,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub is_synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub media: MediaInfo,
}

impl Sample {
    /// Fresh sample for `original_name` inside `folder`. Title defaults to the file name.
    pub fn new(
        original_name: impl Into<String>,
        folder: LibraryPath,
        media: MediaInfo,
        content_hash: Option<String>,
    ) -> Self {
        let original_name = original_name.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: original_name.clone(),
            description: None,
            relative_path: folder.join(&original_name),
            folder,
            original_name,
            tags: Vec::new(),
            content_hash,
            is_synced: false,
            created_at: now,
            updated_at: now,
            media,
        }
    }

    /// Location of the audio file, derived from `folder` and `original_name`.
    pub fn audio_path(&self) -> LibraryPath {
        self.folder.join(&self.original_name)
    }

    /// True when every persisted field except `updated_at` matches.
    pub fn same_content(&self, other: &Sample) -> bool {
        Sample {
            updated_at: other.updated_at,
            ..self.clone()
        } == *other
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Metadata not found: {0}")]
    NotFound(String),
    #[error("Metadata belongs to {owner}, not {path}")]
    SidecarConflict { path: String, owner: String },
    #[error("Directory unreadable: {0}")]
    DirectoryUnreadable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata extraction error: {0}")]
    Metadata(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, LibraryError>;

// Re-exports for convenience
pub use audio::hasher::ContentHasher;
pub use audio::metadata::MetadataExtractor;
pub use config::LibraryConfig;
pub use library::import::{ImportError, ImportItem, ImportOutcome, ImportPipeline};
pub use library::navigator::{Breadcrumb, DirectoryNavigator, NavigationError};
pub use library::sample_library::{LibraryView, SampleEdit, SampleLibrary};
pub use store::directory_index::{DirectoryEntry, DirectoryIndex, SampleRef};
pub use store::metadata_store::MetadataStore;
pub use utils::file_ops::{FileSystem, FsEntry, LocalFileSystem};
pub use utils::notify::{LogNotifier, MemoryNotifier, Notification, Notifier};
