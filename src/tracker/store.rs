//! Project collection persistence.
//!
//! The whole collection is stored as one JSON document. [`JsonFileStore`] is
//! the on-disk backend; [`MemoryStore`] keeps the data in process for tests
//! and dry runs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::TrackerResult;
use super::project::Project;

/// Current on-disk format version.
pub const COLLECTION_VERSION: u32 = 1;

/// Stored project collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectCollection {
    /// Projects keyed by id
    pub projects: HashMap<String, Project>,
    /// Version for future migrations
    #[serde(default)]
    pub version: u32,
}

/// Backend that loads and saves the project collection.
pub trait ProjectStore {
    /// Load the stored collection; a store with nothing saved yields an empty one.
    fn load(&self) -> TrackerResult<ProjectCollection>;

    /// Replace the stored collection.
    fn save(&mut self, collection: &ProjectCollection) -> TrackerResult<()>;
}

/// JSON file backend.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at a specific path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectStore for JsonFileStore {
    fn load(&self) -> TrackerResult<ProjectCollection> {
        if !self.path.exists() {
            return Ok(ProjectCollection { version: COLLECTION_VERSION, ..Default::default() });
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ProjectCollection { version: COLLECTION_VERSION, ..Default::default() });
        }

        let collection: ProjectCollection = serde_json::from_str(&content)?;
        tracing::debug!(path = ?self.path, projects = collection.projects.len(), "Loaded projects");
        Ok(collection)
    }

    fn save(&mut self, collection: &ProjectCollection) -> TrackerResult<()> {
        let content = serde_json::to_string_pretty(collection)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, content)?;
        tracing::debug!(path = ?self.path, projects = collection.projects.len(), "Saved projects");
        Ok(())
    }
}

/// In-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<ProjectCollection>,
    saves: usize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a collection.
    pub fn with_collection(collection: ProjectCollection) -> Self {
        Self { saved: Some(collection), saves: 0 }
    }

    /// Last saved collection.
    pub fn saved(&self) -> Option<&ProjectCollection> {
        self.saved.as_ref()
    }

    /// Number of saves performed.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl ProjectStore for MemoryStore {
    fn load(&self) -> TrackerResult<ProjectCollection> {
        Ok(self.saved.clone().unwrap_or_else(|| ProjectCollection {
            version: COLLECTION_VERSION,
            ..Default::default()
        }))
    }

    fn save(&mut self, collection: &ProjectCollection) -> TrackerResult<()> {
        self.saved = Some(collection.clone());
        self.saves += 1;
        Ok(())
    }
}
