//! Local filesystem backend.
//!
//! Mirrors the hierarchical store on a directory for development and
//! testing. Production exports should use [`WebHdfs`](super::WebHdfs).
//!
//! ## Layout
//!
//! ```text
//! {root}/
//! └── raw/github/repositories/2024/03/07/
//!     ├── 123.json           # body
//!     └── .123.json.xattrs   # attributes (hidden from listings)
//! ```
//!
//! Attributes follow WebHDFS semantics: `Create` refuses to overwrite,
//! `Replace` refuses to create, values are returned quoted.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{AppError, Result};
use crate::storage::{DirEntry, FileSystem, Xattr, XattrBackend, XattrFlag};

/// Directory-backed store.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root_dir: PathBuf,
}

impl LocalFileSystem {
    /// Create a new store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Map a store path onto the root directory.
    fn path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::validation(format!("invalid store path {key:?}")));
        }
        Ok(self.root_dir.join(relative))
    }

    fn sidecar(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{name}.xattrs"))
    }

    /// Write bytes atomically (write to temp, then rename).
    fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{name}.tmp"));
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.flush()?;
        drop(file);

        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    fn require_file(key: &str, path: &Path) -> Result<()> {
        if path.is_file() {
            Ok(())
        } else {
            Err(AppError::not_found(key))
        }
    }

    fn load_xattrs(path: &Path) -> Result<BTreeMap<String, String>> {
        match std::fs::read(Self::sidecar(path)) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn save_xattrs(path: &Path, xattrs: &BTreeMap<String, String>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(xattrs)?;
        Self::write_bytes(&Self::sidecar(path), &bytes)
    }
}

impl FileSystem for LocalFileSystem {
    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::not_found(key)),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn write(&self, key: &str, data: &[u8], overwrite: bool) -> Result<()> {
        let path = self.path(key)?;
        if !overwrite && path.exists() {
            return Err(AppError::Hdfs {
                exception: "FileAlreadyExistsException".to_string(),
                message: format!("{key} already exists"),
            });
        }
        Self::write_bytes(&path, data)
    }

    fn list_dir(&self, key: &str) -> Result<Vec<DirEntry>> {
        let path = self.path(key)?;
        let read_dir = match std::fs::read_dir(&path) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(AppError::not_found(key)),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            if entry.file_type()?.is_dir() {
                entries.push(DirEntry::directory(name));
            } else {
                entries.push(DirEntry::file(name));
            }
        }
        Ok(entries)
    }
}

impl XattrBackend for LocalFileSystem {
    fn get_xattrs(&self, key: &str, names: &[String]) -> Result<Vec<Xattr>> {
        let path = self.path(key)?;
        Self::require_file(key, &path)?;
        let xattrs = Self::load_xattrs(&path)?;

        if let Some(missing) = names.iter().find(|n| !xattrs.contains_key(*n)) {
            return Err(AppError::AttributeMissing {
                path: key.to_string(),
                name: missing.clone(),
            });
        }

        Ok(xattrs
            .into_iter()
            .filter(|(name, _)| names.is_empty() || names.contains(name))
            .map(|(name, value)| Xattr {
                name,
                value: format!("\"{value}\""),
            })
            .collect())
    }

    fn set_xattr(&self, key: &str, name: &str, value: &str, flag: XattrFlag) -> Result<()> {
        let path = self.path(key)?;
        Self::require_file(key, &path)?;
        let mut xattrs = Self::load_xattrs(&path)?;

        match (flag, xattrs.contains_key(name)) {
            (XattrFlag::Create, true) => {
                return Err(AppError::AttributeExists {
                    path: key.to_string(),
                    name: name.to_string(),
                });
            }
            (XattrFlag::Replace, false) => {
                return Err(AppError::AttributeMissing {
                    path: key.to_string(),
                    name: name.to_string(),
                });
            }
            _ => {}
        }

        xattrs.insert(name.to_string(), value.to_string());
        Self::save_xattrs(&path, &xattrs)
    }

    fn remove_xattr(&self, key: &str, name: &str) -> Result<()> {
        let path = self.path(key)?;
        Self::require_file(key, &path)?;
        let mut xattrs = Self::load_xattrs(&path)?;

        if xattrs.remove(name).is_none() {
            return Err(AppError::AttributeMissing {
                path: key.to_string(),
                name: name.to_string(),
            });
        }
        Self::save_xattrs(&path, &xattrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new(tmp.path());

        fs.write("/raw/a/test.json", b"hello", true).unwrap();
        assert_eq!(fs.read("/raw/a/test.json").unwrap(), b"hello".to_vec());
    }

    #[test]
    fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new(tmp.path());

        assert!(fs.read("/nope.json").unwrap_err().is_not_found());
        assert!(fs.list_dir("/nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_write_without_overwrite() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new(tmp.path());

        fs.write("/x.json", b"1", false).unwrap();
        assert!(matches!(
            fs.write("/x.json", b"2", false),
            Err(AppError::Hdfs { .. })
        ));
        fs.write("/x.json", b"3", true).unwrap();
        assert_eq!(fs.read("/x.json").unwrap(), b"3".to_vec());
    }

    #[test]
    fn test_rejects_parent_components() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new(tmp.path());
        assert!(matches!(
            fs.read("/raw/../../etc/passwd"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_list_dir_hides_sidecars() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new(tmp.path());

        fs.write("/d/a.json", b"{}", true).unwrap();
        fs.write("/d/sub/b.json", b"{}", true).unwrap();
        fs.set_xattr("/d/a.json", "user.k", "v", XattrFlag::Create)
            .unwrap();

        let mut entries = fs.list_dir("/d").unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            entries,
            vec![DirEntry::file("a.json"), DirEntry::directory("sub")]
        );
    }

    #[test]
    fn test_xattr_flags() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new(tmp.path());
        fs.write("/a.json", b"{}", true).unwrap();

        assert!(matches!(
            fs.set_xattr("/a.json", "user.k", "v", XattrFlag::Replace),
            Err(AppError::AttributeMissing { .. })
        ));
        fs.set_xattr("/a.json", "user.k", "v", XattrFlag::Create)
            .unwrap();
        assert!(matches!(
            fs.set_xattr("/a.json", "user.k", "w", XattrFlag::Create),
            Err(AppError::AttributeExists { .. })
        ));
        fs.set_xattr("/a.json", "user.k", "w", XattrFlag::Replace)
            .unwrap();

        assert_eq!(
            fs.get_xattrs("/a.json", &[]).unwrap(),
            vec![Xattr {
                name: "user.k".to_string(),
                value: "\"w\"".to_string()
            }]
        );

        fs.remove_xattr("/a.json", "user.k").unwrap();
        assert!(matches!(
            fs.remove_xattr("/a.json", "user.k"),
            Err(AppError::AttributeMissing { .. })
        ));
    }

    #[test]
    fn test_xattrs_on_missing_file() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFileSystem::new(tmp.path());
        assert!(fs.get_xattrs("/missing.json", &[]).unwrap_err().is_not_found());
    }
}
