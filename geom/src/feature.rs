use std::fmt;

use crate::{Extents, GeomError};

/// A raw GeoJSON position. Kept unvalidated, so that a stored record with a broken position can
/// still be loaded and then skipped at query time.
pub type Position = Vec<f64>;

/// Assigned by the feature store, never by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureID(pub usize);

impl FeatureID {
    /// Numeric ids, or strings holding a number, are understood. Anything else isn't an id this
    /// system could have handed out.
    pub fn from_geojson(id: &geojson::feature::Id) -> Option<FeatureID> {
        match id {
            geojson::feature::Id::Number(n) => n.as_u64().map(|n| FeatureID(n as usize)),
            geojson::feature::Id::String(s) => s.parse::<usize>().ok().map(FeatureID),
        }
    }

    pub fn to_geojson(self) -> geojson::feature::Id {
        geojson::feature::Id::Number((self.0 as u64).into())
    }
}

impl fmt::Display for FeatureID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Feature #{}", self.0)
    }
}

/// A single-ring polygon tile, plus the one property that's persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonFeature {
    pub fill: Option<String>,
    /// The outer ring. Conventionally closed, but nothing here depends on that.
    pub ring: Vec<Position>,
}

impl PolygonFeature {
    pub fn new(ring: Vec<Position>) -> PolygonFeature {
        PolygonFeature { fill: None, ring }
    }

    /// Only `Polygon` geometry is understood, and only its outer ring is read; holes are
    /// dropped. A polygon without any rings comes back with an empty ring rather than an error,
    /// since that's only a problem once extents are needed.
    pub fn from_geojson(feature: &geojson::Feature) -> Result<PolygonFeature, GeomError> {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or_else(|| GeomError::malformed("feature has no geometry"))?;
        let ring = match &geometry.value {
            geojson::Value::Polygon(rings) => rings.first().cloned().unwrap_or_default(),
            other => {
                return Err(GeomError::malformed(format!(
                    "expected a Polygon, got a {}",
                    value_type(other)
                )));
            }
        };
        let fill = feature
            .properties
            .as_ref()
            .and_then(|props| props.get("fill"))
            .and_then(|value| value.as_str())
            .map(|fill| fill.to_string());
        Ok(PolygonFeature { fill, ring })
    }

    pub fn to_geojson(&self, id: Option<FeatureID>) -> geojson::Feature {
        let mut properties = geojson::JsonObject::new();
        if let Some(ref fill) = self.fill {
            properties.insert("fill".to_string(), fill.clone().into());
        }
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::Polygon(vec![self
                .ring
                .clone()]))),
            id: id.map(FeatureID::to_geojson),
            properties: Some(properties),
            foreign_members: None,
        }
    }

    pub fn extents(&self) -> Result<Extents, GeomError> {
        Extents::from_ring(&self.ring)
    }
}

fn value_type(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}
