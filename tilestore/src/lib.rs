//! Where polygon tiles live between requests. The query engine never reaches in here itself;
//! callers fetch a snapshot and hand it over.

#[macro_use]
extern crate log;

mod file;
mod fixture;
mod memory;

use std::collections::BTreeMap;
use std::{error, fmt};

use anyhow::Result;

use geom::{FeatureID, GeomError, PolygonFeature};

pub use crate::file::FileStore;
pub use crate::fixture::{load_fixture, parse_features};
pub use crate::memory::MemoryStore;

/// Persists polygon tiles and hands back everything on demand. Every call stands alone; two
/// calls may observe different contents if something was inserted in between.
pub trait FeatureStore: Send + Sync {
    /// A copy of every stored record, keyed by the id the store assigned.
    fn all_features(&self) -> Result<Snapshot>;

    fn count(&self) -> Result<usize>;

    /// Stores new tiles, assigning ids in order.
    fn insert_many(&self, features: Vec<PolygonFeature>) -> Result<Vec<FeatureID>>;
}

/// Everything a store held at one moment.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub features: BTreeMap<FeatureID, PolygonFeature>,
    /// Stored records that couldn't even be read as a polygon. They still count as candidates
    /// that had to be skipped.
    pub unusable: Vec<(FeatureID, GeomError)>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.features.len() + self.unusable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The store couldn't be reached or read. Callers can pick this out of an `anyhow::Error` with
/// `downcast_ref` to tell it apart from bad input.
#[derive(Debug)]
pub struct StoreUnavailable(pub String);

impl fmt::Display for StoreUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "feature store unavailable: {}", self.0)
    }
}

impl error::Error for StoreUnavailable {}

/// Picks `count` fresh ids following the highest one in use. Nothing is assigned if the id space
/// would run out partway.
pub(crate) fn assign_ids(
    highest: Option<FeatureID>,
    count: usize,
) -> Result<Vec<FeatureID>, StoreUnavailable> {
    let first = match highest {
        Some(id) => id.0.checked_add(1),
        None => Some(0),
    };
    (0..count)
        .map(|offset| {
            first
                .and_then(|first| first.checked_add(offset))
                .map(FeatureID)
                .ok_or_else(|| StoreUnavailable("ran out of feature ids".to_string()))
        })
        .collect()
}
