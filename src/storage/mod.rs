//! Storage abstractions for the data lake.
//!
//! The lake is a hierarchical store addressed by `/`-separated paths. Each
//! exporter run writes into a fixed, date-partitioned directory:
//!
//! ```text
//! /{zone}/{source}/{type}/
//! └── 2024/
//!     └── 03/
//!         └── 07/
//!             ├── 123.json      # body
//!             └── 456.json      # + extended attributes (user.*)
//! ```
//!
//! Backends implement [`FileSystem`] for bodies and [`XattrBackend`] for
//! extended attributes. [`Datalake`] composes the two.

pub mod attributes;
pub mod lake;
pub mod local;
pub mod webhdfs;

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::utils::join_path;

pub use attributes::AttributeStore;
pub use lake::{Clock, Datalake, FixedClock, Listing, SystemClock};
pub use local::LocalFileSystem;
pub use webhdfs::WebHdfs;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }
}

/// Body operations of a hierarchical store.
pub trait FileSystem: Send + Sync {
    /// Read a whole file. Fails with `NotFound` if absent.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Write a whole file, creating parent directories.
    fn write(&self, path: &str, data: &[u8], overwrite: bool) -> Result<()>;

    /// Children of a directory. Fails with `NotFound` if absent.
    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>>;
}

/// How a set request treats an existing attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XattrFlag {
    /// Fail with `AttributeExists` if already set
    Create,
    /// Fail with `AttributeMissing` if not yet set
    Replace,
}

impl XattrFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            XattrFlag::Create => "CREATE",
            XattrFlag::Replace => "REPLACE",
        }
    }
}

/// A raw attribute as the backend stores it: qualified name, encoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xattr {
    pub name: String,
    pub value: String,
}

/// Extended-attribute operations of a hierarchical store.
///
/// Names are passed fully qualified (`user.foo`).
pub trait XattrBackend: Send + Sync {
    /// All attributes, or only `names` when non-empty.
    fn get_xattrs(&self, path: &str, names: &[String]) -> Result<Vec<Xattr>>;

    fn set_xattr(&self, path: &str, name: &str, value: &str, flag: XattrFlag) -> Result<()>;

    /// Fails with `AttributeMissing` when there is nothing to remove.
    fn remove_xattr(&self, path: &str, name: &str) -> Result<()>;
}

/// One directory visited by [`Walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: String,
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl WalkEntry {
    /// Full paths of the files in this directory.
    pub fn file_paths(&self) -> Vec<String> {
        self.files.iter().map(|f| join_path(&self.path, f)).collect()
    }
}

/// Lazy top-down traversal: one directory listing per step.
///
/// A missing root yields nothing. The first error ends the walk.
pub struct Walk {
    fs: Arc<dyn FileSystem>,
    root: String,
    pending: VecDeque<String>,
    failed: bool,
}

impl Walk {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            fs,
            pending: VecDeque::from([root.clone()]),
            root,
            failed: false,
        }
    }
}

impl Iterator for Walk {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let path = self.pending.pop_front()?;

        let entries = match self.fs.list_dir(&path) {
            Ok(entries) => entries,
            Err(AppError::NotFound { .. }) if path == self.root => return None,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in entries {
            match entry.kind {
                EntryKind::Directory => dirs.push(entry.name),
                EntryKind::File => files.push(entry.name),
            }
        }
        dirs.sort();
        files.sort();

        self.pending
            .extend(dirs.iter().map(|d| join_path(&path, d)));

        Some(Ok(WalkEntry { path, dirs, files }))
    }
}
