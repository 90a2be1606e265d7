use crate::LibraryPath;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("{target} is not an ancestor of {current}")]
    NotAnAncestor { target: String, current: String },
    #[error("No breadcrumb at index {0}")]
    NoSuchBreadcrumb(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub label: String,
    pub path: LibraryPath,
}

/// Which library directory is being viewed. Pure state; callers reload the
/// library view themselves after a transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryNavigator {
    current: LibraryPath,
}

impl DirectoryNavigator {
    pub const ROOT_LABEL: &'static str = "Home";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &LibraryPath {
        &self.current
    }

    pub fn can_go_back(&self) -> bool {
        !self.current.is_root()
    }

    pub fn enter(&mut self, child: &str) -> &LibraryPath {
        self.current = self.current.join(child);
        &self.current
    }

    /// No-op at the root.
    pub fn go_back(&mut self) -> &LibraryPath {
        self.current = self.current.parent().unwrap_or_default();
        &self.current
    }

    pub fn jump_to(&mut self, ancestor: &LibraryPath) -> Result<&LibraryPath, NavigationError> {
        if !self.current.starts_with(ancestor) {
            return Err(NavigationError::NotAnAncestor {
                target: ancestor.to_string(),
                current: self.current.to_string(),
            });
        }
        self.current = ancestor.clone();
        Ok(&self.current)
    }

    /// Index 0 is the root crumb; index `i` covers the first `i` segments.
    pub fn jump_to_breadcrumb(&mut self, index: usize) -> Result<&LibraryPath, NavigationError> {
        if index > self.current.depth() {
            return Err(NavigationError::NoSuchBreadcrumb(index));
        }
        self.current = self.current.ancestor(index);
        Ok(&self.current)
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut crumbs = vec![Breadcrumb {
            label: Self::ROOT_LABEL.to_string(),
            path: LibraryPath::root(),
        }];
        for (i, segment) in self.current.segments().iter().enumerate() {
            crumbs.push(Breadcrumb {
                label: segment.clone(),
                path: self.current.ancestor(i + 1),
            });
        }
        crumbs
    }
}
