use std::path::PathBuf;

/// Folder name of the library root inside the user's documents directory.
pub const LIBRARY_DIR_NAME: &str = "SampleSync";

#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// Absolute path of the library root.
    pub root: PathBuf,
    /// Whether dot-files and dot-directories show up in listings.
    pub include_hidden: bool,
    /// Whether items of one import batch are deduplicated against each other.
    pub dedup_within_batch: bool,
    /// Whether lazily computed content hashes are written back to sidecars.
    pub persist_hashes: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: default_library_root(),
            include_hidden: false,
            dedup_within_batch: true,
            persist_hashes: true,
        }
    }
}

impl LibraryConfig {
    /// Defaults with the root overridden when one is given.
    pub fn with_root(root: Option<PathBuf>) -> Self {
        let mut config = Self::default();
        if let Some(root) = root {
            config.root = root;
        }
        config
    }
}

/// `<documents>/SampleSync`, falling back to the home directory, then the
/// working directory.
pub fn default_library_root() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(LIBRARY_DIR_NAME)
}
