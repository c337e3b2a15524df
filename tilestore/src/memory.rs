use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::Result;

use geom::{FeatureID, PolygonFeature};

use crate::{assign_ids, FeatureStore, Snapshot, StoreUnavailable};

/// Lives and dies with the process.
pub struct MemoryStore {
    features: RwLock<BTreeMap<FeatureID, PolygonFeature>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            features: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

fn poisoned<T>(_: T) -> StoreUnavailable {
    StoreUnavailable("a writer panicked while holding the lock".to_string())
}

impl FeatureStore for MemoryStore {
    fn all_features(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            features: self.features.read().map_err(poisoned)?.clone(),
            unusable: Vec::new(),
        })
    }

    fn count(&self) -> Result<usize> {
        Ok(self.features.read().map_err(poisoned)?.len())
    }

    fn insert_many(&self, features: Vec<PolygonFeature>) -> Result<Vec<FeatureID>> {
        let mut stored = self.features.write().map_err(poisoned)?;
        let ids = assign_ids(stored.keys().next_back().cloned(), features.len())?;
        for (id, feature) in ids.iter().zip(features) {
            stored.insert(*id, feature);
        }
        Ok(ids)
    }
}
