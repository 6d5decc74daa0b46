//! Catalog module - source of API specification documents
//!
//! The dispatcher only needs the full, ordered list of specifications. How a
//! catalog gets them is up to the implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::Result;

/// One API specification retrieved from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationRecord {
    /// Identifier used in logs (file name, API id, ...)
    pub name: String,

    /// Raw document text, inserted verbatim into prompts
    pub value: String,
}

impl SpecificationRecord {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Catalog trait - interface for fetching specifications
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch every specification available to the user, in catalog order
    async fn fetch_all_specifications(&self) -> Result<Vec<SpecificationRecord>>;
}

/// Directory-backed catalog
///
/// Every regular file in the directory is one specification, ordered by
/// file name.
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Catalog for DirectoryCatalog {
    async fn fetch_all_specifications(&self) -> Result<Vec<SpecificationRecord>> {
        let read_error = |e: std::io::Error| {
            Error::Catalog(format!("Cannot read catalog at {:?}: {}", self.root, e))
        };

        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(read_error)?;

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
            if is_hidden(&entry.file_name()) {
                debug!("Skipping hidden file {:?}", entry.path());
                continue;
            }
            if entry.file_type().await.map_err(read_error)?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let value = tokio::fs::read_to_string(&path).await.map_err(|e| {
                Error::Catalog(format!("Cannot read specification {:?}: {}", path, e))
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            records.push(SpecificationRecord { name, value });
        }

        debug!("Fetched {} specifications from {:?}", records.len(), self.root);
        Ok(records)
    }
}

/// Dotfiles (`.DS_Store`, editor swap files) are not specifications.
fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// In-memory catalog for testing, counting fetches
#[cfg(test)]
pub struct StaticCatalog {
    records: Vec<SpecificationRecord>,
    fail: bool,
    fetches: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl StaticCatalog {
    pub fn new(records: Vec<SpecificationRecord>) -> Self {
        Self {
            records,
            fail: false,
            fetches: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Catalog with `count` records named `spec-1..=count`.
    pub fn numbered(count: usize) -> Self {
        Self::new(
            (1..=count)
                .map(|i| {
                    SpecificationRecord::new(format!("spec-{i}"), format!("openapi: spec-{i}"))
                })
                .collect(),
        )
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl Catalog for StaticCatalog {
    async fn fetch_all_specifications(&self) -> Result<Vec<SpecificationRecord>> {
        self.fetches.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail {
            return Err(Error::Catalog("catalog unavailable".to_string()));
        }
        Ok(self.records.clone())
    }
}
