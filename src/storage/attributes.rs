//! Attribute (xattr) operations on stored objects.
//!
//! Callers use plain names (`language`); the backend sees them under the
//! reserved `user.` namespace (`user.language`).

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::storage::{XattrBackend, XattrFlag};

/// Reserved namespace prefix for user attributes.
pub const NAMESPACE: &str = "user.";

/// String attributes attached to store paths.
#[derive(Clone)]
pub struct AttributeStore {
    backend: Arc<dyn XattrBackend>,
}

impl AttributeStore {
    pub fn new(backend: Arc<dyn XattrBackend>) -> Self {
        Self { backend }
    }

    /// Upsert every attribute: create first, replace if it already exists.
    pub fn set_attributes(&self, path: &str, attrs: &BTreeMap<String, String>) -> Result<()> {
        for (key, value) in attrs {
            let name = qualify(key);
            match self.backend.set_xattr(path, &name, value, XattrFlag::Create) {
                Ok(()) => {}
                Err(AppError::AttributeExists { .. }) => {
                    self.backend
                        .set_xattr(path, &name, value, XattrFlag::Replace)?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Attributes of `path`, all of them or only `names`.
    ///
    /// Names come back without the namespace, values without quotes.
    pub fn get_attributes(&self, path: &str, names: &[&str]) -> Result<BTreeMap<String, String>> {
        let wanted: Vec<String> = names.iter().map(|n| qualify(n)).collect();

        let xattrs = match self.backend.get_xattrs(path, &wanted) {
            Ok(xattrs) => xattrs,
            // Some named attribute is absent: fall back to filtering the full set.
            Err(AppError::AttributeMissing { .. }) if !wanted.is_empty() => self
                .backend
                .get_xattrs(path, &[])?
                .into_iter()
                .filter(|x| wanted.contains(&x.name))
                .collect(),
            Err(e) => return Err(e),
        };

        Ok(xattrs
            .into_iter()
            .map(|x| {
                let name = x
                    .name
                    .strip_prefix(NAMESPACE)
                    .unwrap_or(&x.name)
                    .to_string();
                (name, x.value.trim_matches('"').to_string())
            })
            .collect())
    }

    /// Remove the named attributes. Absent ones are ignored.
    pub fn remove_attributes(&self, path: &str, names: &[&str]) -> Result<()> {
        for name in names {
            match self.backend.remove_xattr(path, &qualify(name)) {
                Ok(()) | Err(AppError::AttributeMissing { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Remove every attribute currently on `path`.
    ///
    /// Reads then removes; an attribute added in between survives.
    pub fn remove_all_attributes(&self, path: &str) -> Result<()> {
        let current = self.get_attributes(path, &[])?;
        let names: Vec<&str> = current.keys().map(String::as_str).collect();
        self.remove_attributes(path, &names)
    }
}

fn qualify(name: &str) -> String {
    if name.starts_with(NAMESPACE) {
        name.to_string()
    } else {
        format!("{NAMESPACE}{name}")
    }
}
