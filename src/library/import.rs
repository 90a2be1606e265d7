use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::hasher::ContentHasher;
use crate::audio::metadata::{
    is_audio_extension, is_decodable_extension, mime_for_extension, MetadataExtractor,
    METADATA_EXTENSION,
};
use crate::library::sample_library::SampleLibrary;
use crate::store::directory_index::is_hidden_name;
use crate::utils::file_ops::FileSystem;
use crate::utils::notify::{Notification, Notifier};
use crate::{LibraryError, LibraryPath, MediaInfo, Result, Sample};

/// Why a single item of a batch was not imported.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("{name}: identical content already in library at {existing}")]
    DuplicateContent { name: String, existing: LibraryPath },
    #[error("{name}: a sample with this name already exists at {existing}")]
    DuplicateName { name: String, existing: LibraryPath },
    #[error("{name}: its metadata file is already used by {existing}")]
    SidecarTaken { name: String, existing: LibraryPath },
    #[error("{name}: unsupported file type")]
    UnsupportedFormat { name: String },
    #[error("{name}: {source}")]
    Failed {
        name: String,
        #[source]
        source: LibraryError,
    },
}

impl ImportError {
    pub fn name(&self) -> &str {
        match self {
            ImportError::DuplicateContent { name, .. }
            | ImportError::DuplicateName { name, .. }
            | ImportError::SidecarTaken { name, .. }
            | ImportError::UnsupportedFormat { name }
            | ImportError::Failed { name, .. } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::DuplicateContent { .. } => "duplicate-content",
            ImportError::DuplicateName { .. } => "duplicate-name",
            ImportError::SidecarTaken { .. } => "sidecar-taken",
            ImportError::UnsupportedFormat { .. } => "unsupported-format",
            ImportError::Failed { .. } => "failed",
        }
    }
}

pub type ImportOutcome = std::result::Result<Sample, ImportError>;

/// One file to import: its bytes, its base name, and the directory it sat in
/// relative to the dropped folder (root for loose files).
#[derive(Debug, Clone)]
pub struct ImportItem {
    pub name: String,
    pub bytes: Vec<u8>,
    pub sub_directory: LibraryPath,
}

impl ImportItem {
    /// Only the last component of `name` is kept.
    pub fn new(name: &str, bytes: Vec<u8>) -> Self {
        let name = Path::new(name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        Self {
            name,
            bytes,
            sub_directory: LibraryPath::root(),
        }
    }

    pub fn in_directory(mut self, sub_directory: LibraryPath) -> Self {
        self.sub_directory = sub_directory;
        self
    }

    pub fn is_hidden(&self) -> bool {
        is_hidden_name(&self.name)
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Reads dropped paths into import items. Directories are walked and their
/// files keep their position relative to the dropped directory. Sidecars and
/// anything under a hidden directory are left out.
pub async fn collect_items(fs: &dyn FileSystem, sources: &[PathBuf]) -> Result<Vec<ImportItem>> {
    let mut items = Vec::new();

    for source in sources {
        let entries = match fs.list_directory(source, true).await {
            Ok(entries) => entries,
            Err(_) => {
                let name = source.file_name().map(|n| n.to_string_lossy().into_owned());
                let Some(name) = name else {
                    log::warn!("Ignoring source without a file name: {}", source.display());
                    continue;
                };
                items.push(ImportItem::new(&name, fs.read_file(source).await?));
                continue;
            }
        };

        log::info!("Collecting files from {}", source.display());
        for entry in entries.into_iter().filter(|e| !e.is_dir) {
            let Some(relative) = LibraryPath::from_fs_path(source, &entry.path) else {
                continue;
            };
            let sub_directory = relative.parent().unwrap_or_default();
            if sub_directory.segments().iter().any(|s| is_hidden_name(s)) {
                continue;
            }
            if relative.extension().as_deref() == Some(METADATA_EXTENSION) {
                continue;
            }
            let Some(name) = relative.file_name() else {
                continue;
            };
            let bytes = fs.read_file(&entry.path).await?;
            items.push(ImportItem::new(name, bytes).in_directory(sub_directory));
        }
    }

    Ok(items)
}

/// Content hashes and names already taken, each mapped to where it lives.
#[derive(Debug, Default)]
struct DedupIndex {
    hashes: HashMap<String, LibraryPath>,
    names: HashMap<String, LibraryPath>,
}

impl DedupIndex {
    fn insert(&mut self, sample: &Sample) {
        if let Some(hash) = &sample.content_hash {
            self.hashes.entry(hash.clone()).or_insert_with(|| sample.relative_path.clone());
        }
        self.names
            .entry(sample.original_name.clone())
            .or_insert_with(|| sample.relative_path.clone());
    }
}

/// Copies dropped files into the library, rejecting duplicates library-wide.
pub struct ImportPipeline {
    notifier: Arc<dyn Notifier>,
}

impl ImportPipeline {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Imports `items` under `target`, one outcome per non-hidden item, in
    /// order. A failed item never stops the batch.
    ///
    /// Fails as a whole only when the existing library cannot be enumerated
    /// for deduplication.
    pub async fn import_batch(
        &self,
        library: &mut SampleLibrary,
        items: Vec<ImportItem>,
        target: &LibraryPath,
    ) -> Result<Vec<ImportOutcome>> {
        let mut dedup = DedupIndex::default();
        for sample in library.known_samples(&LibraryPath::root()).await? {
            dedup.insert(&sample);
        }
        log::info!(
            "Importing {} item(s) into {} against {} known sample(s)",
            items.len(),
            target,
            dedup.names.len()
        );

        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            if item.is_hidden() {
                log::debug!("Skipping hidden file {}", item.name);
                continue;
            }

            let outcome = self.import_one(library, &dedup, item, target).await;
            match &outcome {
                Ok(sample) => {
                    log::info!("Imported {}", sample.relative_path);
                    self.notifier.notify(Notification::Success(format!(
                        "Imported {} into {}",
                        sample.original_name, sample.folder
                    )));
                    library.register(sample);
                    if library.config().dedup_within_batch {
                        dedup.insert(sample);
                    }
                }
                Err(e) => {
                    log::warn!("Import rejected: {}", e);
                    self.notifier.notify(Notification::Error(e.to_string()));
                }
            }
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn import_one(
        &self,
        library: &SampleLibrary,
        dedup: &DedupIndex,
        item: ImportItem,
        target: &LibraryPath,
    ) -> ImportOutcome {
        let extension = match item.extension() {
            Some(ext) if is_audio_extension(&ext) => ext,
            _ => return Err(ImportError::UnsupportedFormat { name: item.name }),
        };

        let digest = ContentHasher::hash(&item.bytes);
        if let Some(existing) = dedup.hashes.get(&digest) {
            return Err(ImportError::DuplicateContent {
                name: item.name,
                existing: existing.clone(),
            });
        }
        if let Some(existing) = dedup.names.get(&item.name) {
            return Err(ImportError::DuplicateName {
                name: item.name,
                existing: existing.clone(),
            });
        }

        let failed = |name: &str, source: LibraryError| ImportError::Failed {
            name: name.to_string(),
            source,
        };

        let folder = target.join_path(&item.sub_directory);
        let destination = folder.join(&item.name);

        // `kick.ogg` next to `kick.wav` would overwrite its `kick.json`.
        match library.store().read(&destination).await {
            Ok(owner) if owner.original_name != item.name => {
                return Err(ImportError::SidecarTaken {
                    name: item.name,
                    existing: owner.relative_path,
                });
            }
            Ok(_) | Err(LibraryError::NotFound(_)) => {}
            Err(e) => return Err(failed(&item.name, e)),
        }

        // Probe before copying so undecodable files leave nothing behind.
        let media = match MetadataExtractor::probe(&item.bytes, &extension) {
            Ok(media) => media,
            Err(e) if !is_decodable_extension(&extension) => {
                log::debug!("No decoder for {}: {}", item.name, e);
                MediaInfo::unknown(mime_for_extension(&extension))
            }
            Err(e) => return Err(failed(&item.name, e)),
        };

        library
            .file_system()
            .write_file(&destination.to_fs_path(library.root()), &item.bytes)
            .await
            .map_err(|e| failed(&item.name, e.into()))?;

        let sample = Sample::new(item.name.clone(), folder, media, Some(digest));
        library
            .store()
            .write(&destination, sample)
            .await
            .map_err(|e| failed(&item.name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        count_sidecars, library_with_locked_file, open_library, test_config, tiny_wav,
    };
    use crate::{LibraryConfig, LocalFileSystem, MemoryNotifier, SampleEdit};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn pipeline() -> (ImportPipeline, Arc<MemoryNotifier>) {
        let notifier = Arc::new(MemoryNotifier::new());
        (ImportPipeline::new(notifier.clone()), notifier)
    }

    #[test]
    fn item_keeps_only_base_name() {
        let item = ImportItem::new("some/where/kick.WAV", vec![]);
        assert_eq!(item.name, "kick.WAV");
        assert_eq!(item.extension().as_deref(), Some("wav"));
        assert!(ImportItem::new(".DS_Store", vec![]).is_hidden());
    }

    #[tokio::test]
    async fn imports_new_sample_with_fresh_metadata() {
        let dir = tempdir().unwrap();
        let mut library = open_library(dir.path()).await;
        let (pipeline, notifier) = pipeline();
        let bytes = tiny_wav(1);

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![ImportItem::new("kick.wav", bytes.clone())],
                &LibraryPath::parse("/drums"),
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        let sample = outcomes[0].as_ref().unwrap();
        assert_eq!(sample.folder, LibraryPath::parse("/drums"));
        assert_eq!(sample.relative_path, LibraryPath::parse("/drums/kick.wav"));
        assert_eq!(sample.title, "kick.wav");
        assert!(sample.tags.is_empty());
        assert!(!sample.is_synced);
        assert_eq!(sample.created_at, sample.updated_at);
        assert_eq!(sample.content_hash, Some(ContentHasher::hash(&bytes)));
        assert_eq!(sample.media.media_type, "audio/wav");
        assert_eq!(sample.media.sample_rate, 8_000);

        assert_eq!(fs::read(dir.path().join("drums").join("kick.wav")).unwrap(), bytes);
        let stored = library.store().read(&sample.relative_path).await.unwrap();
        assert_eq!(&stored, sample);
        assert!(matches!(notifier.take().as_slice(), [Notification::Success(_)]));
    }

    #[tokio::test]
    async fn duplicate_content_is_rejected_library_wide() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("elsewhere")).unwrap();
        let bytes = tiny_wav(2);
        fs::write(dir.path().join("elsewhere").join("original.wav"), &bytes).unwrap();
        let mut library = open_library(dir.path()).await;
        let (pipeline, notifier) = pipeline();

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![ImportItem::new("copy.wav", bytes)],
                &LibraryPath::parse("/target"),
            )
            .await
            .unwrap();

        match &outcomes[0] {
            Err(ImportError::DuplicateContent { name, existing }) => {
                assert_eq!(name, "copy.wav");
                assert_eq!(existing, &LibraryPath::parse("/elsewhere/original.wav"));
            }
            other => panic!("expected duplicate content, got {other:?}"),
        }
        assert!(!dir.path().join("target").exists());
        assert_eq!(count_sidecars(dir.path()), 1);
        assert!(matches!(notifier.take().as_slice(), [Notification::Error(_)]));
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_for_different_content() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("kick.wav"), tiny_wav(3)).unwrap();
        let mut library = open_library(dir.path()).await;
        let (pipeline, _) = pipeline();

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![ImportItem::new("kick.wav", tiny_wav(4))],
                &LibraryPath::parse("/other"),
            )
            .await
            .unwrap();

        assert!(matches!(
            &outcomes[0],
            Err(ImportError::DuplicateName { name, .. }) if name == "kick.wav"
        ));
        assert_eq!(outcomes[0].as_ref().unwrap_err().kind(), "duplicate-name");
    }

    #[tokio::test]
    async fn sibling_with_same_stem_cannot_take_the_sidecar() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("kick.wav"), tiny_wav(20)).unwrap();
        let mut library = open_library(dir.path()).await;
        let wav = LibraryPath::parse("/kick.wav");
        library
            .edit(&wav, SampleEdit { tags: Some(vec!["808".into()]), ..SampleEdit::default() })
            .await
            .unwrap();
        let (pipeline, notifier) = pipeline();

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![
                    ImportItem::new("kick.ogg", tiny_wav(21)),
                    ImportItem::new("snare.wav", tiny_wav(22)),
                    ImportItem::new("snare.flac", tiny_wav(23)),
                ],
                &LibraryPath::root(),
            )
            .await
            .unwrap();

        match &outcomes[0] {
            Err(ImportError::SidecarTaken { name, existing }) => {
                assert_eq!(name, "kick.ogg");
                assert_eq!(existing, &wav);
            }
            other => panic!("expected sidecar-taken, got {other:?}"),
        }
        assert!(outcomes[1].is_ok());
        assert_eq!(outcomes[2].as_ref().unwrap_err().kind(), "sidecar-taken");
        assert!(!dir.path().join("kick.ogg").exists());
        assert!(!dir.path().join("snare.flac").exists());

        let stored = library.store().read(&wav).await.unwrap();
        assert_eq!(stored.original_name, "kick.wav");
        assert_eq!(stored.tags, vec!["808"]);
        assert_eq!(notifier.take().len(), 3);
    }

    #[tokio::test]
    async fn unreadable_library_file_does_not_block_imports() {
        let dir = tempdir().unwrap();
        let mut library = library_with_locked_file(dir.path(), "locked.wav", &tiny_wav(24)).await;
        let (pipeline, _) = pipeline();

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![
                    ImportItem::new("fresh.wav", tiny_wav(25)),
                    ImportItem::new("locked.wav", tiny_wav(26)),
                ],
                &LibraryPath::parse("/new"),
            )
            .await
            .unwrap();

        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1], Err(ImportError::DuplicateName { .. })));
        assert!(dir.path().join("new").join("fresh.wav").is_file());
    }

    #[tokio::test]
    async fn formats_without_a_decoder_import_with_unknown_media() {
        let dir = tempdir().unwrap();
        let mut library = open_library(dir.path()).await;
        let (pipeline, _) = pipeline();

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![ImportItem::new("lead.xi", b"fasttracker instrument".to_vec())],
                &LibraryPath::root(),
            )
            .await
            .unwrap();

        let sample = outcomes[0].as_ref().unwrap();
        assert_eq!(sample.media, MediaInfo::unknown("application/octet-stream"));
        assert!(dir.path().join("lead.xi").is_file());

        let listed = library.list(&LibraryPath::root()).await.unwrap();
        assert_eq!(&listed.samples[0], sample);
    }

    #[tokio::test]
    async fn hidden_files_are_silently_skipped() {
        let dir = tempdir().unwrap();
        let mut library = open_library(dir.path()).await;
        let (pipeline, notifier) = pipeline();

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![
                    ImportItem::new(".hidden.wav", tiny_wav(5)),
                    ImportItem::new("shown.wav", tiny_wav(6)),
                ],
                &LibraryPath::root(),
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].as_ref().unwrap().original_name, "shown.wav");
        assert!(!dir.path().join(".hidden.wav").exists());
        assert_eq!(notifier.take().len(), 1);
    }

    #[tokio::test]
    async fn folder_structure_is_preserved_under_target() {
        let dir = tempdir().unwrap();
        let mut library = open_library(dir.path()).await;
        let (pipeline, _) = pipeline();
        let target = LibraryPath::parse("/T");

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![
                    ImportItem::new("a.wav", tiny_wav(7)),
                    ImportItem::new("b.wav", tiny_wav(8)).in_directory(LibraryPath::parse("sub")),
                ],
                &target,
            )
            .await
            .unwrap();

        let folders: Vec<String> = outcomes
            .iter()
            .map(|o| o.as_ref().unwrap().folder.to_string())
            .collect();
        assert_eq!(folders, vec!["/T", "/T/sub"]);
        assert!(dir.path().join("T").join("sub").join("b.json").is_file());
    }

    #[tokio::test]
    async fn failures_do_not_abort_the_batch() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("taken.wav"), tiny_wav(9)).unwrap();
        let mut library = open_library(dir.path()).await;
        let (pipeline, notifier) = pipeline();

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![
                    ImportItem::new("taken.wav", tiny_wav(10)),
                    ImportItem::new("notes.txt", b"hello".to_vec()),
                    ImportItem::new("broken.wav", b"not a wav".to_vec()),
                    ImportItem::new("fresh.wav", tiny_wav(11)),
                ],
                &LibraryPath::root(),
            )
            .await
            .unwrap();

        let kinds: Vec<&str> = outcomes
            .iter()
            .map(|o| match o {
                Ok(_) => "ok",
                Err(e) => e.kind(),
            })
            .collect();
        assert_eq!(kinds, vec!["duplicate-name", "unsupported-format", "failed", "ok"]);
        assert!(!dir.path().join("broken.wav").exists());
        assert!(dir.path().join("fresh.wav").is_file());
        assert_eq!(notifier.take().len(), 4);
    }

    #[tokio::test]
    async fn identical_items_in_one_batch_are_deduplicated() {
        let dir = tempdir().unwrap();
        let mut library = open_library(dir.path()).await;
        let (pipeline, _) = pipeline();
        let bytes = tiny_wav(12);

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![
                    ImportItem::new("one.wav", bytes.clone()),
                    ImportItem::new("two.wav", bytes),
                ],
                &LibraryPath::root(),
            )
            .await
            .unwrap();

        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1], Err(ImportError::DuplicateContent { .. })));
    }

    #[tokio::test]
    async fn within_batch_dedup_can_be_disabled() {
        let dir = tempdir().unwrap();
        let config = LibraryConfig {
            dedup_within_batch: false,
            ..test_config(dir.path())
        };
        let mut library = SampleLibrary::open(config, Arc::new(LocalFileSystem)).await.unwrap();
        let (pipeline, _) = pipeline();
        let bytes = tiny_wav(13);

        let outcomes = pipeline
            .import_batch(
                &mut library,
                vec![
                    ImportItem::new("one.wav", bytes.clone()),
                    ImportItem::new("two.wav", bytes),
                ],
                &LibraryPath::root(),
            )
            .await
            .unwrap();

        assert!(outcomes.iter().all(|o| o.is_ok()));
    }

    #[tokio::test]
    async fn imported_samples_show_up_in_cached_views() {
        let dir = tempdir().unwrap();
        let mut library = open_library(dir.path()).await;
        library.reload(&LibraryPath::root()).await.unwrap();
        let (pipeline, _) = pipeline();

        pipeline
            .import_batch(
                &mut library,
                vec![
                    ImportItem::new("top.wav", tiny_wav(14)),
                    ImportItem::new("nested.wav", tiny_wav(15)).in_directory(LibraryPath::parse("pack")),
                ],
                &LibraryPath::root(),
            )
            .await
            .unwrap();

        let view = library.view(&LibraryPath::root()).unwrap();
        assert_eq!(view.samples.len(), 1);
        assert_eq!(view.directories.len(), 1);

        let fresh = library.list(&LibraryPath::root()).await.unwrap();
        assert_eq!(fresh.samples, view.samples);
    }

    #[tokio::test]
    async fn collect_items_preserves_relative_structure() {
        let dir = tempdir().unwrap();
        let dropped = dir.path().join("pack");
        fs::create_dir_all(dropped.join("sub")).unwrap();
        fs::create_dir_all(dropped.join(".git")).unwrap();
        fs::write(dropped.join("a.wav"), b"a").unwrap();
        fs::write(dropped.join("a.json"), b"{}").unwrap();
        fs::write(dropped.join("sub").join("b.wav"), b"b").unwrap();
        fs::write(dropped.join(".git").join("c.wav"), b"c").unwrap();
        let loose = dir.path().join("loose.wav");
        fs::write(&loose, b"l").unwrap();

        let mut items = collect_items(&LocalFileSystem, &[dropped, loose]).await.unwrap();
        items.sort_by(|a, b| a.name.cmp(&b.name));

        let got: Vec<(String, String)> = items
            .iter()
            .map(|i| (i.name.clone(), i.sub_directory.to_string()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("a.wav".to_string(), "/".to_string()),
                ("b.wav".to_string(), "/sub".to_string()),
                ("loose.wav".to_string(), "/".to_string()),
            ]
        );
        assert_eq!(items[1].bytes, b"b");
    }

    #[tokio::test]
    async fn collect_items_fails_for_missing_source() {
        let dir = tempdir().unwrap();
        let result = collect_items(&LocalFileSystem, &[dir.path().join("missing.wav")]).await;
        assert!(matches!(result, Err(LibraryError::Io(_))));
    }
}
