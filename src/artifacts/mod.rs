//! Raw result persistence
//!
//! Every successfully fetched listing page and detail payload is written as a
//! JSON document under the output root, keyed by partition + page (listing)
//! or provider id (detail). Writes are write-once per key; a retry of the
//! same key silently overwrites. A failed write is logged and absorbed - data
//! loss of one artifact never halts a partition.

use crate::crawler::Partition;
use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Filesystem store for raw crawl artifacts
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Creates the store, ensuring the listing/detail directories exist
    pub fn new(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root.join("listing"))?;
        std::fs::create_dir_all(root.join("detail"))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Path of a listing-page artifact
    pub fn listing_path(&self, partition: &Partition, page: u32) -> PathBuf {
        self.root.join("listing").join(format!(
            "raw_results_{}_{}_{}_page_{}.json",
            partition.specialty_code,
            partition.service_type.as_str(),
            partition.zip_code,
            page
        ))
    }

    /// Path of a detail artifact
    pub fn detail_path(&self, provider_id: &str) -> PathBuf {
        self.root
            .join("detail")
            .join(format!("raw_results_{}.json", provider_id))
    }

    /// Persists a listing page's raw payload
    pub fn write_listing_page<T: Serialize>(
        &self,
        partition: &Partition,
        page: u32,
        content: &T,
    ) -> Result<PathBuf> {
        let path = self.listing_path(partition, page);
        self.write_json(&path, content)?;
        Ok(path)
    }

    /// Persists a detail fetch's raw payload
    pub fn write_detail<T: Serialize>(&self, provider_id: &str, content: &T) -> Result<PathBuf> {
        let path = self.detail_path(provider_id);
        self.write_json(&path, content)?;
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, path: &Path, content: &T) -> Result<()> {
        let rendered = serde_json::to_string_pretty(content)?;
        std::fs::write(path, rendered)?;
        tracing::debug!("Wrote artifact {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::ServiceType;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_partition() -> Partition {
        Partition {
            zip_code: "10001".to_string(),
            plan_type: "HIP".to_string(),
            network_code: "D013".to_string(),
            specialty_code: "CARD".to_string(),
            service_type: ServiceType::Doctor,
            distance: "50mi".to_string(),
        }
    }

    #[test]
    fn test_listing_path_layout() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        let path = store.listing_path(&test_partition(), 3);
        assert!(path
            .to_string_lossy()
            .ends_with("listing/raw_results_CARD_Doctor_10001_page_3.json"));
    }

    #[test]
    fn test_detail_path_layout() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        let path = store.detail_path("PRV-9");
        assert!(path
            .to_string_lossy()
            .ends_with("detail/raw_results_PRV-9.json"));
    }

    #[test]
    fn test_write_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let partition = test_partition();

        let path = store
            .write_listing_page(&partition, 1, &json!({ "totalRecords": 1 }))
            .unwrap();
        assert!(path.exists());

        // Retry of the same key overwrites
        store
            .write_listing_page(&partition, 1, &json!({ "totalRecords": 2 }))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"totalRecords\": 2"));
    }
}
