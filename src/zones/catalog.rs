//! Immutable zone catalog snapshots and their publication.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{Result, ZoneError};
use crate::models::Zone;

/// Read-only snapshot of the configured zones, in resolution order
#[derive(Debug, Clone, Serialize)]
pub struct ZoneCatalog {
    zones: Vec<Zone>,
    loaded_at: DateTime<Utc>,
}

impl ZoneCatalog {
    /// Wrap zones as given. Order is preserved and drives first-match tie-breaking.
    pub fn new(zones: Vec<Zone>) -> Self {
        Self {
            zones,
            loaded_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn area_count(&self) -> usize {
        self.zones.iter().map(|z| z.areas.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Every area that fails validation, as `MalformedArea` errors
    pub fn malformed_areas(&self) -> Vec<ZoneError> {
        self.zones
            .iter()
            .flat_map(|z| z.areas.iter().filter_map(move |a| a.validate(&z.name).err()))
            .collect()
    }
}

/// On-disk catalog layout
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    zones: Vec<Zone>,
}

/// Parse a TOML catalog.
///
/// Inactive zones are dropped and the rest are stably ordered by
/// `display_order`, so equal orders keep their file order.
pub fn parse_catalog(content: &str) -> Result<ZoneCatalog> {
    let file: CatalogFile =
        toml::from_str(content).map_err(|e| ZoneError::Catalog(e.to_string()))?;

    let mut zones: Vec<Zone> = file.zones.into_iter().filter(|z| z.active).collect();
    zones.sort_by_key(|z| z.display_order);

    Ok(ZoneCatalog::new(zones))
}

/// Read and parse a catalog file
pub fn load_catalog_file<P: AsRef<Path>>(path: P) -> Result<ZoneCatalog> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| ZoneError::Catalog(format!("{}: {}", path.display(), e)))?;
    parse_catalog(&content)
}

/// Holds the current catalog snapshot.
///
/// Refresh publishes a whole new `Arc<ZoneCatalog>`; readers keep whatever
/// snapshot they already hold for the duration of their call.
pub struct CatalogStore {
    tx: watch::Sender<Option<Arc<ZoneCatalog>>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Swap in a new snapshot
    pub fn publish(&self, catalog: ZoneCatalog) -> Arc<ZoneCatalog> {
        let snapshot = Arc::new(catalog);
        info!(
            "Publishing zone catalog with {} zones, {} areas",
            snapshot.zone_count(),
            snapshot.area_count()
        );
        self.tx.send_replace(Some(Arc::clone(&snapshot)));
        snapshot
    }

    /// Current snapshot, or `NotReady` before the first publish
    pub fn snapshot(&self) -> Result<Arc<ZoneCatalog>> {
        (*self.tx.borrow()).clone().ok_or(ZoneError::NotReady)
    }

    /// Wait until a snapshot has been published
    pub async fn wait_ready(&self) -> Result<Arc<ZoneCatalog>> {
        let mut rx = self.tx.subscribe();
        let current = rx
            .wait_for(|c| c.is_some())
            .await
            .map_err(|_| ZoneError::NotReady)?;
        (*current).clone().ok_or(ZoneError::NotReady)
    }

    /// Load a catalog file and publish it. On failure the previous snapshot stays live.
    pub async fn reload_from(&self, path: &Path) -> Result<Arc<ZoneCatalog>> {
        let loaded = match tokio::fs::read_to_string(path).await {
            Ok(content) => parse_catalog(&content),
            Err(e) => Err(ZoneError::Catalog(format!("{}: {}", path.display(), e))),
        };

        match loaded {
            Ok(catalog) => {
                for problem in catalog.malformed_areas() {
                    warn!("{}", problem);
                }
                Ok(self.publish(catalog))
            }
            Err(e) => {
                warn!("Catalog reload from {} failed: {}", path.display(), e);
                Err(e)
            }
        }
    }
}
