/*!
 * Discovery tracker
 *
 * Remembers which catalog entries were already shown in the current rotation
 * pass so the session does not repeat an object until every one has been
 * shown. The set is persisted as `{"currentIndex": n, "discoveries": [...]}`;
 * `currentIndex` is carried through unchanged.
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::catalog::AstronomicalObject;
use crate::error::Result;

pub const DISCOVERY_FILE: &str = "storage.json";

/// On-disk shape of the discovery document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDocument {
    #[serde(default)]
    pub current_index: u64,
    #[serde(default)]
    pub discoveries: Vec<String>,
}

/// Persisted set of already shown object names
#[derive(Debug, Clone)]
pub struct DiscoveryTracker {
    path: PathBuf,
    doc: DiscoveryDocument,
}

impl DiscoveryTracker {
    /// Load the tracker; a missing or corrupt document is an empty set
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<DiscoveryDocument>(&raw).unwrap_or_else(|e| {
                debug!("discovery document {} corrupt: {}", path.display(), e);
                DiscoveryDocument::default()
            }),
            Err(e) => {
                debug!("discovery document {} unreadable: {}", path.display(), e);
                DiscoveryDocument::default()
            }
        };

        Self { path, doc }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &DiscoveryDocument {
        &self.doc
    }

    pub fn len(&self) -> usize {
        self.doc.discoveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.discoveries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.doc.discoveries.iter().any(|seen| seen == name)
    }

    /// Record `name` as shown and persist before returning
    pub async fn record_shown(&mut self, name: &str) -> Result<()> {
        if !self.contains(name) {
            self.doc.discoveries.push(name.to_string());
        }
        self.persist().await
    }

    /// Clear the set once it holds `catalog_size` entries. Returns whether it reset.
    pub async fn reset_if_full(&mut self, catalog_size: usize) -> Result<bool> {
        if self.len() < catalog_size {
            return Ok(false);
        }
        info!("All {} objects explored, starting a new rotation", catalog_size);
        self.clear().await?;
        Ok(true)
    }

    pub async fn clear(&mut self) -> Result<()> {
        self.doc.discoveries.clear();
        self.persist().await
    }

    /// Catalog entries not shown yet
    pub fn unseen<'a>(&self, catalog: &'a [AstronomicalObject]) -> Vec<&'a AstronomicalObject> {
        catalog
            .iter()
            .filter(|object| !self.contains(object.name))
            .collect()
    }

    /// Write to a sibling temp file, then rename over the document
    async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string(&self.doc)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, contents).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CATALOG;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let tracker = DiscoveryTracker::load(dir.path().join(DISCOVERY_FILE)).await;
        assert!(tracker.is_empty());
        assert_eq!(tracker.document().current_index, 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DISCOVERY_FILE);
        std::fs::write(&path, "[1, 2").unwrap();

        let tracker = DiscoveryTracker::load(&path).await;
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_record_shown_is_durable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DISCOVERY_FILE);

        let mut tracker = DiscoveryTracker::load(&path).await;
        tracker.record_shown("M60").await.unwrap();
        tracker.record_shown("M60").await.unwrap();
        tracker.record_shown("Betelgeuse").await.unwrap();

        let reloaded = DiscoveryTracker::load(&path).await;
        assert_eq!(reloaded.document().discoveries, vec!["M60", "Betelgeuse"]);
        assert!(!dir.path().join("storage.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_current_index_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DISCOVERY_FILE);
        std::fs::write(&path, r#"{"currentIndex": 7, "discoveries": ["M60"]}"#).unwrap();

        let mut tracker = DiscoveryTracker::load(&path).await;
        tracker.record_shown("NGC 7319").await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let doc: DiscoveryDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc.current_index, 7);
        assert_eq!(doc.discoveries, vec!["M60", "NGC 7319"]);
    }

    #[tokio::test]
    async fn test_reset_only_when_full() {
        let dir = tempdir().unwrap();
        let mut tracker = DiscoveryTracker::load(dir.path().join(DISCOVERY_FILE)).await;

        tracker.record_shown("a").await.unwrap();
        assert!(!tracker.reset_if_full(2).await.unwrap());
        assert_eq!(tracker.len(), 1);

        tracker.record_shown("b").await.unwrap();
        assert!(tracker.reset_if_full(2).await.unwrap());
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_unseen_filters_catalog() {
        let dir = tempdir().unwrap();
        let mut tracker = DiscoveryTracker::load(dir.path().join(DISCOVERY_FILE)).await;
        tracker.record_shown(CATALOG[0].name).await.unwrap();

        let unseen = tracker.unseen(&CATALOG);
        assert_eq!(unseen.len(), CATALOG.len() - 1);
        assert!(unseen.iter().all(|object| object.name != CATALOG[0].name));
    }
}
