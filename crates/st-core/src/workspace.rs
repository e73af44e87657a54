//! Resolution of document paths to open workspace folders.

use std::path::{Path, PathBuf};

/// An open project folder whose time is tracked under its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFolder {
    name: String,
    root: PathBuf,
}

impl WorkspaceFolder {
    /// Creates a folder named after the last component of `root`.
    ///
    /// Returns `None` for paths without a usable name, such as `/` or `..`.
    pub fn new(root: impl Into<PathBuf>) -> Option<Self> {
        let root = root.into();
        let name = root.file_name()?.to_str()?.to_string();
        if name.is_empty() {
            return None;
        }
        Some(Self { name, root })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// The set of folders currently open in the host.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceFolders(Vec<WorkspaceFolder>);

impl WorkspaceFolders {
    /// Builds the set from folder paths, skipping unnamed paths and
    /// duplicates of a root already present.
    pub fn from_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut folders: Vec<WorkspaceFolder> = Vec::new();
        for root in roots {
            let root = root.into();
            let Some(folder) = WorkspaceFolder::new(&root) else {
                tracing::warn!(root = %root.display(), "ignoring folder without a name");
                continue;
            };
            if folders.iter().all(|f| f.root != folder.root) {
                folders.push(folder);
            }
        }
        Self(folders)
    }

    /// The innermost open folder containing `path`, if any.
    pub fn resolve(&self, path: &Path) -> Option<&WorkspaceFolder> {
        self.0
            .iter()
            .filter(|folder| path.starts_with(&folder.root))
            .max_by_key(|folder| folder.root.components().count())
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkspaceFolder> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
