use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A normalized path relative to the library root.
///
/// Stored as plain segments. `.` and empty segments are dropped, `..` pops a
/// segment but never climbs above the root. Displays as `/a/b`, root as `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryPath {
    segments: Vec<String>,
}

impl LibraryPath {
    pub const SEPARATOR: char = '/';

    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Self {
        let mut path = Self::root();
        path.push_str(raw);
        path
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = Self::root();
        for segment in segments {
            path.push_str(segment.as_ref());
        }
        path
    }

    /// Relative path of `path` under `root`, or `None` when it lies outside.
    pub fn from_fs_path(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(Self::from_segments(segments))
    }

    fn push_str(&mut self, raw: &str) {
        for part in raw.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    self.segments.pop();
                }
                other => self.segments.push(other.to_string()),
            }
        }
    }

    pub fn join(&self, child: &str) -> Self {
        let mut joined = self.clone();
        joined.push_str(child);
        joined
    }

    pub fn join_path(&self, other: &LibraryPath) -> Self {
        let mut joined = self.clone();
        joined.segments.extend(other.segments.iter().cloned());
        joined
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The first `depth` segments.
    pub fn ancestor(&self, depth: usize) -> Self {
        Self {
            segments: self.segments[..depth.min(self.segments.len())].to_vec(),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn extension(&self) -> Option<String> {
        let name = self.file_name()?;
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn with_extension(&self, extension: &str) -> Self {
        let mut changed = self.clone();
        if let Some(last) = changed.segments.last_mut() {
            *last = Path::new(last.as_str())
                .with_extension(extension)
                .to_string_lossy()
                .into_owned();
        }
        changed
    }

    pub fn starts_with(&self, prefix: &LibraryPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }
}

impl fmt::Display for LibraryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "{}", Self::SEPARATOR);
        }
        for segment in &self.segments {
            write!(f, "{}{}", Self::SEPARATOR, segment)?;
        }
        Ok(())
    }
}

impl From<&str> for LibraryPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for LibraryPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LibraryPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
