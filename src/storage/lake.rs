//! Date-partitioned JSON object store.
//!
//! A [`Datalake`] is bound to one `{zone}/{source}/{type}` prefix and one
//! storage date. The date is taken once, at construction, in UTC, so a run
//! that crosses midnight keeps writing into the day it started.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::storage::{AttributeStore, FileSystem, Walk, WalkEntry};
use crate::utils::join_path;

/// Source of the storage date.
pub trait Clock {
    /// Today's date in UTC.
    fn today(&self) -> NaiveDate;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// A file found by [`Datalake::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub path: String,
    /// Present when attributes were requested
    pub attributes: Option<BTreeMap<String, String>>,
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attributes {
            Some(attrs) => write!(f, "{:<75} {:?}", self.path, attrs),
            None => f.write_str(&self.path),
        }
    }
}

/// JSON objects under `/{zone}/{source}/{type}/{year}/{month}/{day}/`.
pub struct Datalake {
    fs: Arc<dyn FileSystem>,
    attributes: AttributeStore,
    storage_date: NaiveDate,
    type_path: String,
    storage_path: String,
}

impl Datalake {
    pub fn new(
        zone: &str,
        source: &str,
        kind: &str,
        clock: &dyn Clock,
        fs: Arc<dyn FileSystem>,
        attributes: AttributeStore,
    ) -> Self {
        let storage_date = clock.today();
        let type_path = format!("/{zone}/{source}/{kind}");
        let storage_path = join_path(
            &type_path,
            &format!(
                "{}/{:02}/{:02}",
                storage_date.year(),
                storage_date.month(),
                storage_date.day()
            ),
        );

        Self {
            fs,
            attributes,
            storage_date,
            type_path,
            storage_path,
        }
    }

    /// `/{zone}/{source}/{type}`
    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    /// `type_path` plus the storage date
    pub fn storage_path(&self) -> &str {
        &self.storage_path
    }

    pub fn storage_date(&self) -> NaiveDate {
        self.storage_date
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Write `body` as `{storage_path}/{id}.json`, then tag it with `attrs`.
    ///
    /// Returns the written path. If tagging fails the body stays written.
    pub fn store_json<T: Serialize + ?Sized>(
        &self,
        id: &str,
        body: &T,
        attrs: &BTreeMap<String, String>,
    ) -> Result<String> {
        if id.is_empty() || id.contains('/') {
            return Err(AppError::validation(format!("invalid object id {id:?}")));
        }

        let path = join_path(&self.storage_path, &format!("{id}.json"));
        let bytes = serde_json::to_vec(body)?;
        self.fs.write(&path, &bytes, true)?;
        self.attributes.set_attributes(&path, attrs)?;

        log::debug!("Stored {} ({} bytes, {} attributes)", path, bytes.len(), attrs.len());
        Ok(path)
    }

    /// Read a JSON object by full path or by a path relative to `type_path`.
    pub fn get_json<T: DeserializeOwned>(&self, path_or_id: &str) -> Result<T> {
        let path = self.resolve_path(path_or_id);
        let bytes = self.fs.read(&path)?;
        serde_json::from_slice(&bytes).map_err(|e| AppError::decode(format!("{path}: {e}")))
    }

    /// Every file under `type_path/stem`, lazily.
    pub fn list(
        &self,
        stem: Option<&str>,
        show_attributes: bool,
    ) -> impl Iterator<Item = Result<Listing>> + '_ {
        self.walk(stem)
            .flat_map(|entry| match entry {
                Ok(entry) => entry.file_paths().into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            })
            .map(move |path| {
                let path = path?;
                let attributes = if show_attributes {
                    Some(self.attributes.get_attributes(&path, &[])?)
                } else {
                    None
                };
                Ok(Listing { path, attributes })
            })
    }

    /// Raw `(path, dirs, files)` traversal under `type_path/stem`.
    pub fn walk(&self, stem: Option<&str>) -> Walk {
        let root = match stem {
            Some(stem) if !stem.is_empty() => join_path(&self.type_path, stem.trim_start_matches('/')),
            _ => self.type_path.clone(),
        };
        Walk::new(Arc::clone(&self.fs), root)
    }

    /// Walk entries collected eagerly.
    pub fn walk_all(&self, stem: Option<&str>) -> Result<Vec<WalkEntry>> {
        self.walk(stem).collect()
    }

    /// Full store path for a full path or a path relative to `type_path`.
    pub fn resolve_path(&self, path_or_id: &str) -> String {
        let prefixed = path_or_id == self.type_path
            || path_or_id
                .strip_prefix(&self.type_path)
                .is_some_and(|rest| rest.starts_with('/'));
        if prefixed {
            path_or_id.to_string()
        } else {
            join_path(&self.type_path, path_or_id.trim_start_matches('/'))
        }
    }
}
