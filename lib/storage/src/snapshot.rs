// Catalog snapshots: one JSON document replaced atomically on save
use crate::catalog::{CatalogConfig, CatalogStore};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelfscout_core::{Error, Product, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub text_dim: usize,
    pub image_dim: usize,
    pub products: Vec<Product>,
}

impl CatalogSnapshot {
    pub fn capture(store: &CatalogStore) -> Self {
        let config = store.config();
        Self {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            text_dim: config.text_dim,
            image_dim: config.image_dim,
            products: store.products(),
        }
    }

    /// Rebuild a store; product timestamps are kept as saved
    pub fn restore(self) -> Result<CatalogStore> {
        if self.version != SNAPSHOT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        let store = CatalogStore::new(CatalogConfig {
            text_dim: self.text_dim,
            image_dim: self.image_dim,
        });
        for product in self.products {
            store.import(product)?;
        }
        Ok(store)
    }
}

/// Write the whole catalog to `path`. Readers never observe a partial file.
pub fn save_snapshot<P: AsRef<Path>>(store: &CatalogStore, path: P) -> Result<usize> {
    let snapshot = CatalogSnapshot::capture(store);
    let count = snapshot.products.len();
    let bytes = serde_json::to_vec(&snapshot)?;

    AtomicFile::new(path.as_ref(), AllowOverwrite)
        .write(|f| f.write_all(&bytes))
        .map_err(|e| Error::Storage(format!("snapshot write failed: {e}")))?;

    info!(path = %path.as_ref().display(), products = count, "snapshot saved");
    Ok(count)
}

pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<CatalogStore> {
    let bytes = std::fs::read(path.as_ref())?;
    let snapshot: CatalogSnapshot = serde_json::from_slice(&bytes)?;
    let store = snapshot.restore()?;
    info!(path = %path.as_ref().display(), products = store.len(), "snapshot loaded");
    Ok(store)
}
