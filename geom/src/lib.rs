//! Bounding-box overlap between a drawn query tile and stored polygon tiles. Extents are pulled
//! out of each polygon's outer ring, then candidates are narrowed one axis at a time.

#[macro_use]
extern crate log;

mod error;
mod extents;
mod feature;
mod overlap;

pub use crate::error::GeomError;
pub use crate::extents::{axis_a, axis_b, Axis, Extents, Interval};
pub use crate::feature::{FeatureID, PolygonFeature, Position};
pub use crate::overlap::{intersecting_ids, resolve, Matches};
