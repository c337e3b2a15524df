use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;

use geom::{FeatureID, PolygonFeature};

use crate::{assign_ids, FeatureStore, Snapshot, StoreUnavailable};

/// Keeps every tile in one GeoJSON FeatureCollection on disk, with the assigned ids embedded in
/// the features. Each read goes back to the file, so separate processes sharing the file see
/// each other's inserts. A file that doesn't exist yet is an empty store.
///
/// Records that aren't usable polygons are left in the file untouched, and reported in
/// `Snapshot::unusable` rather than hidden.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> FileStore {
        FileStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Every record in the file, as written.
    fn load(&self) -> Result<Vec<geojson::Feature>> {
        let raw = match fs_err::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(StoreUnavailable(err.to_string()).into());
            }
        };
        match raw.parse::<geojson::GeoJson>() {
            Ok(geojson::GeoJson::FeatureCollection(collection)) => Ok(collection.features),
            Ok(_) => Err(StoreUnavailable(format!(
                "{} isn't a FeatureCollection",
                self.path.display()
            ))
            .into()),
            Err(err) => Err(StoreUnavailable(format!(
                "can't parse {}: {}",
                self.path.display(),
                err
            ))
            .into()),
        }
    }

    fn write(&self, features: Vec<geojson::Feature>) -> Result<()> {
        let collection = geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        };
        let raw = serde_json::to_string_pretty(&collection)?;
        fs_err::write(&self.path, raw).map_err(|err| StoreUnavailable(err.to_string()))?;
        Ok(())
    }

    fn id_of(&self, feature: &geojson::Feature) -> Option<FeatureID> {
        let id = feature.id.as_ref().and_then(FeatureID::from_geojson);
        if id.is_none() {
            warn!(
                "{} has a feature without a usable id, ignoring it",
                self.path.display()
            );
        }
        id
    }
}

impl FeatureStore for FileStore {
    fn all_features(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::default();
        for feature in self.load()? {
            let id = match self.id_of(&feature) {
                Some(id) => id,
                None => continue,
            };
            match PolygonFeature::from_geojson(&feature) {
                Ok(polygon) => {
                    snapshot.features.insert(id, polygon);
                }
                Err(err) => {
                    debug!("{} in {}: {}", id, self.path.display(), err);
                    snapshot.unusable.push((id, err));
                }
            }
        }
        Ok(snapshot)
    }

    fn count(&self) -> Result<usize> {
        Ok(self
            .load()?
            .iter()
            .filter(|feature| self.id_of(feature).is_some())
            .count())
    }

    fn insert_many(&self, new_features: Vec<PolygonFeature>) -> Result<Vec<FeatureID>> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreUnavailable("a writer panicked mid-write".to_string()))?;
        let mut records = self.load()?;
        let highest = records.iter().filter_map(|f| self.id_of(f)).max();
        let ids = assign_ids(highest, new_features.len())?;
        for (id, feature) in ids.iter().zip(&new_features) {
            records.push(feature.to_geojson(Some(*id)));
        }
        let total = records.len();
        self.write(records)?;
        debug!("Wrote {} features to {}", total, self.path.display());
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "tilestore_{}_{}.geojson",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn missing_file_is_empty() {
        let store = FileStore::new(temp_path("missing"));
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.all_features().unwrap().is_empty());
    }

    #[test]
    fn persists_across_instances() {
        let path = temp_path("persist");
        let mut tile = PolygonFeature::new(vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![0.0, 0.0]]);
        tile.fill = Some("#abc".to_string());

        let ids = FileStore::new(path.clone())
            .insert_many(vec![tile.clone(), PolygonFeature::new(Vec::new())])
            .unwrap();
        assert_eq!(ids, vec![FeatureID(0), FeatureID(1)]);

        let reopened = FileStore::new(path.clone());
        let all = reopened.all_features().unwrap().features;
        assert_eq!(all.len(), 2);
        assert_eq!(all[&FeatureID(0)], tile);
        // Broken geometry survives storage; it's only rejected when queried
        assert!(all[&FeatureID(1)].ring.is_empty());

        assert_eq!(
            reopened
                .insert_many(vec![PolygonFeature::new(vec![vec![5.0, 5.0]])])
                .unwrap(),
            vec![FeatureID(2)]
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn garbage_file_is_unavailable() {
        let path = temp_path("garbage");
        std::fs::write(&path, "this is not json").unwrap();
        let err = FileStore::new(path.clone()).all_features().unwrap_err();
        assert!(err.downcast_ref::<StoreUnavailable>().is_some());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn directory_is_unavailable() {
        let err = FileStore::new(std::env::temp_dir()).count().unwrap_err();
        assert!(err.downcast_ref::<StoreUnavailable>().is_some());
    }

    const MIXED: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 0,
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [0.5, 0.5] }
            },
            {
                "type": "Feature",
                "id": 1,
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [0, 1], [1, 1], [1, 0], [0, 0]]]
                }
            }
        ]
    }"#;

    #[test]
    fn non_polygon_records_stay_visible() {
        let path = temp_path("mixed");
        std::fs::write(&path, MIXED).unwrap();
        let store = FileStore::new(path.clone());

        let snapshot = store.all_features().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.features.len(), 1);
        assert!(snapshot.features.contains_key(&FeatureID(1)));
        assert_eq!(snapshot.unusable.len(), 1);
        assert_eq!(snapshot.unusable[0].0, FeatureID(0));
        assert_eq!(store.count().unwrap(), 2);

        // Rewriting the file keeps the record it couldn't read
        assert_eq!(
            store
                .insert_many(vec![PolygonFeature::new(vec![vec![3.0, 3.0]])])
                .unwrap(),
            vec![FeatureID(2)]
        );
        let snapshot = store.all_features().unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.unusable[0].0, FeatureID(0));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn exhausted_ids_leave_the_file_alone() {
        let path = temp_path("exhausted");
        let collection = serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": 0,
                    "properties": { "fill": "#111" },
                    "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 1], [0, 0]]] }
                },
                {
                    "type": "Feature",
                    "id": usize::MAX.to_string(),
                    "properties": {},
                    "geometry": { "type": "Polygon", "coordinates": [[[2, 2], [3, 3], [2, 2]]] }
                }
            ]
        });
        std::fs::write(&path, collection.to_string()).unwrap();
        let store = FileStore::new(path.clone());

        let err = store
            .insert_many(vec![PolygonFeature::new(vec![vec![9.0, 9.0]])])
            .unwrap_err();
        assert!(err.downcast_ref::<StoreUnavailable>().is_some());

        let all = store.all_features().unwrap().features;
        assert_eq!(all.len(), 2);
        assert_eq!(all[&FeatureID(0)].fill, Some("#111".to_string()));
        assert_eq!(all[&FeatureID(0)].ring, vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![0.0, 0.0]]);
        let _ = std::fs::remove_file(&path);
    }
}
