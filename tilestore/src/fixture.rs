use anyhow::{bail, Context, Result};

use geom::PolygonFeature;

use crate::FeatureStore;

/// Extracts every Polygon feature from a GeoJSON file's contents. Anything else is skipped with
/// a warning. Ids in the input are ignored; the store assigns its own.
pub fn parse_features(raw: &str) -> Result<Vec<PolygonFeature>> {
    let geojson = raw.parse::<geojson::GeoJson>()?;
    let features = match geojson {
        geojson::GeoJson::Feature(feature) => vec![feature],
        geojson::GeoJson::FeatureCollection(collection) => collection.features,
        _ => bail!("Expected a Feature or FeatureCollection"),
    };

    let mut results = Vec::new();
    for (idx, feature) in features.iter().enumerate() {
        match PolygonFeature::from_geojson(feature) {
            Ok(polygon) => results.push(polygon),
            Err(err) => warn!("Skipping fixture feature {}: {}", idx, err),
        }
    }
    Ok(results)
}

/// Seeds an empty store from a GeoJSON file. A store that already has anything in it is left
/// alone. Returns how many features were loaded.
pub fn load_fixture(store: &dyn FeatureStore, path: &str) -> Result<usize> {
    let count = store.count()?;
    if count > 0 {
        info!(
            "Store already has {} features, skipping fixture loading",
            tileutil::prettyprint_usize(count)
        );
        return Ok(0);
    }

    let raw = fs_err::read_to_string(path)?;
    let features = parse_features(&raw).with_context(|| format!("parsing fixture {}", path))?;
    let loaded = store.insert_many(features)?.len();
    info!(
        "Loaded {} features from fixture {}",
        tileutil::prettyprint_usize(loaded),
        path
    );
    Ok(loaded)
}
