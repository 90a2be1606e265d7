use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::audio::hasher::ContentHasher;
use crate::audio::metadata::{mime_for_extension, MetadataExtractor};
use crate::config::LibraryConfig;
use crate::store::directory_index::{DirectoryEntry, DirectoryIndex};
use crate::store::metadata_store::MetadataStore;
use crate::utils::file_ops::FileSystem;
use crate::{LibraryError, LibraryPath, MediaInfo, Result, Sample};

/// What one library directory contains.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryView {
    pub path: LibraryPath,
    pub samples: Vec<Sample>,
    /// Only [`DirectoryEntry::Directory`] entries.
    pub directories: Vec<DirectoryEntry>,
}

impl LibraryView {
    pub fn empty(path: LibraryPath) -> Self {
        Self {
            path,
            samples: Vec::new(),
            directories: Vec::new(),
        }
    }
}

/// User edits applied by [`SampleLibrary::edit`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct SampleEdit {
    pub title: Option<String>,
    /// An empty string clears the description.
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl SampleEdit {
    fn apply(self, sample: &mut Sample) {
        if let Some(title) = self.title {
            sample.title = title;
        }
        if let Some(description) = self.description {
            sample.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(tags) = self.tags {
            sample.tags = tags;
        }
    }
}

/// The sample store. The disk tree is the source of truth; `views` only
/// caches what the last [`reload`](Self::reload) of each directory saw.
pub struct SampleLibrary {
    config: LibraryConfig,
    fs: Arc<dyn FileSystem>,
    store: MetadataStore,
    index: DirectoryIndex,
    views: HashMap<LibraryPath, LibraryView>,
}

impl SampleLibrary {
    /// Opens the library at `config.root`, creating the directory if needed.
    pub async fn open(config: LibraryConfig, fs: Arc<dyn FileSystem>) -> Result<Self> {
        fs.ensure_directory(&config.root).await?;
        log::info!("Library root: {}", config.root.display());

        Ok(Self {
            store: MetadataStore::new(&config.root, fs.clone()),
            index: DirectoryIndex::new(&config.root, fs.clone(), config.include_hidden),
            views: HashMap::new(),
            config,
            fs,
        })
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Samples and subdirectories of `path`, read fresh from disk.
    ///
    /// Audio files without a usable sidecar get one synthesized and written
    /// before this returns, so a second call finds it.
    pub async fn list(&self, path: &LibraryPath) -> Result<LibraryView> {
        let mut view = LibraryView::empty(path.clone());

        for entry in self.index.list(path).await? {
            match entry {
                DirectoryEntry::File(file) => match self.load_sample(&file.path).await {
                    Ok(sample) => view.samples.push(sample),
                    Err(e) => log::warn!("Skipping {}: {}", file.path, e),
                },
                dir @ DirectoryEntry::Directory(_) => view.directories.push(dir),
            }
        }

        log::debug!(
            "Listed {}: {} samples, {} directories",
            path,
            view.samples.len(),
            view.directories.len()
        );
        Ok(view)
    }

    /// Re-reads `path` into the view cache. An unreadable directory yields an
    /// empty view.
    pub async fn reload(&mut self, path: &LibraryPath) -> Result<&LibraryView> {
        let view = match self.list(path).await {
            Ok(view) => view,
            Err(LibraryError::DirectoryUnreadable(p)) => {
                log::warn!("Directory unreadable, showing empty view: {}", p);
                LibraryView::empty(path.clone())
            }
            Err(e) => return Err(e),
        };

        Ok(match self.views.entry(path.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(view);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(view),
        })
    }

    /// The cached view of `path` from the last reload, if any.
    pub fn view(&self, path: &LibraryPath) -> Option<&LibraryView> {
        self.views.get(path)
    }

    /// Reads the sidecar of `audio_path`, or synthesizes and persists a fresh
    /// sample when it is missing or unparsable.
    ///
    /// `kick.wav` and `kick.ogg` share `kick.json`. A sidecar recorded for the
    /// other file is a [`LibraryError::SidecarConflict`] and is left untouched.
    pub async fn load_sample(&self, audio_path: &LibraryPath) -> Result<Sample> {
        match self.store.read(audio_path).await {
            Ok(sample) if Some(sample.original_name.as_str()) != audio_path.file_name() => {
                log::warn!(
                    "Metadata for {} belongs to {}",
                    audio_path,
                    sample.relative_path
                );
                Err(LibraryError::SidecarConflict {
                    path: audio_path.to_string(),
                    owner: sample.relative_path.to_string(),
                })
            }
            Ok(sample) => Ok(sample),
            Err(LibraryError::NotFound(_)) => self.synthesize(audio_path).await,
            Err(e) => Err(e),
        }
    }

    async fn synthesize(&self, audio_path: &LibraryPath) -> Result<Sample> {
        let name = audio_path
            .file_name()
            .ok_or_else(|| LibraryError::NotFound(audio_path.to_string()))?
            .to_string();
        let folder = audio_path.parent().unwrap_or_default();
        let extension = audio_path.extension().unwrap_or_default();

        let bytes = self.fs.read_file(&audio_path.to_fs_path(self.root())).await?;
        let media = match MetadataExtractor::probe_owned(bytes, extension.clone()).await {
            Ok(media) => media,
            Err(e) => {
                log::warn!("Could not probe {}: {}", audio_path, e);
                MediaInfo::unknown(mime_for_extension(&extension))
            }
        };

        let sample = Sample::new(name, folder, media, None);
        log::info!("Creating missing metadata for {}", audio_path);
        self.store.write(audio_path, sample).await
    }

    /// Persists `sample` at its own location. Saving a sample identical to the
    /// stored one (ignoring `updated_at`) writes nothing.
    pub async fn save(&mut self, mut sample: Sample) -> Result<Sample> {
        let audio_path = sample.audio_path();
        match self.store.read(&audio_path).await {
            Ok(stored) if stored.original_name != sample.original_name => {
                return Err(LibraryError::SidecarConflict {
                    path: audio_path.to_string(),
                    owner: stored.relative_path.to_string(),
                });
            }
            Ok(stored) if stored.same_content(&sample) => return Ok(stored),
            Ok(_) | Err(LibraryError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        sample.updated_at = Utc::now();
        let sample = self.store.write(&audio_path, sample).await?;
        self.replace_cached(&sample);
        Ok(sample)
    }

    /// Applies `edit` to the sample at `audio_path` and saves it.
    pub async fn edit(&mut self, audio_path: &LibraryPath, edit: SampleEdit) -> Result<Sample> {
        let mut sample = self.load_sample(audio_path).await?;
        edit.apply(&mut sample);
        self.save(sample).await
    }

    /// Every sample at or below `scope`, with `content_hash` filled in.
    ///
    /// Missing hashes are computed from the file and, when
    /// `persist_hashes` is set, written back to the sidecar. A file that
    /// cannot be read keeps `content_hash: None`.
    pub async fn known_samples(&self, scope: &LibraryPath) -> Result<Vec<Sample>> {
        let files = self.index.audio_files_under(scope).await?;
        let mut samples = Vec::with_capacity(files.len());

        for file in files {
            let mut sample = match self.load_sample(&file.path).await {
                Ok(sample) => sample,
                Err(e) => {
                    log::warn!("Skipping {}: {}", file.path, e);
                    continue;
                }
            };
            if sample.content_hash.is_none() {
                let bytes = match self.fs.read_file(&file.path.to_fs_path(self.root())).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log::warn!("Cannot hash {}: {}", file.path, e);
                        samples.push(sample);
                        continue;
                    }
                };
                sample.content_hash = Some(ContentHasher::hash_owned(bytes).await);
                log::debug!("Computed content hash for {}", file.path);
                if self.config.persist_hashes {
                    sample = match self.store.write(&file.path, sample.clone()).await {
                        Ok(written) => written,
                        Err(e) => {
                            log::warn!("Cannot persist hash for {}: {}", file.path, e);
                            sample
                        }
                    };
                }
            }
            samples.push(sample);
        }

        Ok(samples)
    }

    /// Content hashes of every sample at or below `scope`.
    pub async fn existing_hashes(&self, scope: &LibraryPath) -> Result<HashSet<String>> {
        Ok(self
            .known_samples(scope)
            .await?
            .into_iter()
            .filter_map(|s| s.content_hash)
            .collect())
    }

    /// Adds a newly created sample to cached views: the sample to its folder's
    /// view, its folder chain to each cached ancestor view.
    pub fn register(&mut self, sample: &Sample) {
        let folder = &sample.folder;
        for depth in 0..folder.depth() {
            if let Some(view) = self.views.get_mut(&folder.ancestor(depth)) {
                let child = DirectoryEntry::Directory(folder.ancestor(depth + 1));
                if !view.directories.contains(&child) {
                    view.directories.push(child);
                }
            }
        }

        if let Some(view) = self.views.get_mut(folder) {
            if !view.samples.iter().any(|s| s.id == sample.id) {
                view.samples.push(sample.clone());
            }
        }
    }

    fn replace_cached(&mut self, sample: &Sample) {
        if let Some(view) = self.views.get_mut(&sample.folder) {
            match view.samples.iter_mut().find(|s| s.id == sample.id) {
                Some(slot) => *slot = sample.clone(),
                None => view.samples.push(sample.clone()),
            }
        }
    }
}
