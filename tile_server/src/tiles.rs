use std::time::Instant;

use anyhow::Result;

use geom::{FeatureID, PolygonFeature};
use tilestore::FeatureStore;
use tileutil::{elapsed_seconds, prettyprint_time, prettyprint_usize};

pub struct TileQuery {
    /// In ascending id order
    pub tiles: Vec<(FeatureID, PolygonFeature)>,
    pub candidates: usize,
    pub skipped: usize,
}

/// Fetches a fresh snapshot of every stored tile, finds the ones overlapping `input`, and pulls
/// their full records out of that same snapshot. A query tile without usable geometry fails
/// with `geom::GeomError`; stored tiles without usable geometry are just counted.
pub fn get_intersecting_tiles(
    store: &dyn FeatureStore,
    input: &PolygonFeature,
) -> Result<TileQuery> {
    let started = Instant::now();
    let mut snapshot = store.all_features()?;
    let candidates = snapshot.len();
    info!("Fetched {} candidate tiles", prettyprint_usize(candidates));

    let matches = geom::resolve(
        input,
        snapshot.features.iter().map(|(id, tile)| (*id, tile)),
    )?;
    for (id, err) in &snapshot.unusable {
        debug!("Skipping stored {}: {}", id, err);
    }
    let skipped = matches.skipped.len() + snapshot.unusable.len();
    if skipped > 0 {
        warn!(
            "Skipped {} tiles with unusable geometry",
            prettyprint_usize(skipped)
        );
    }

    let tiles: Vec<(FeatureID, PolygonFeature)> = matches
        .ids
        .iter()
        .filter_map(|id| snapshot.features.remove(id).map(|tile| (*id, tile)))
        .collect();
    info!(
        "Matched {} tiles in {}",
        prettyprint_usize(tiles.len()),
        prettyprint_time(elapsed_seconds(started))
    );
    if let Some((id, tile)) = tiles.first() {
        debug!("Example tile: {} {:?}", id, tile);
    }

    Ok(TileQuery {
        tiles,
        candidates,
        skipped,
    })
}
