use std::collections::BTreeSet;

use crate::{Axis, Extents, FeatureID, GeomError, PolygonFeature};

/// The result of one query. Nothing here outlives the request that produced it.
#[derive(Debug)]
pub struct Matches {
    pub ids: BTreeSet<FeatureID>,
    /// Candidates whose geometry couldn't be measured. They're left out of `ids` instead of
    /// failing the whole query.
    pub skipped: Vec<(FeatureID, GeomError)>,
}

/// Finds every candidate whose box overlaps the query's box on both axes.
///
/// Axis A is checked against every candidate first, and only the survivors are then checked
/// along axis B. The second pass depends on the first pass's output, so the two can't be
/// reordered or interleaved across candidates.
pub fn intersecting_ids(
    query: &Extents,
    candidates: &[(FeatureID, Extents)],
) -> BTreeSet<FeatureID> {
    let mut survivors: Vec<&(FeatureID, Extents)> = candidates.iter().collect();
    for axis in Axis::ALL {
        let before = survivors.len();
        survivors = narrow(axis, query, survivors);
        debug!(
            "Axis {:?} kept {} of {} candidates",
            axis,
            survivors.len(),
            before
        );
    }
    survivors.into_iter().map(|(id, _)| *id).collect()
}

fn narrow<'a>(
    axis: Axis,
    query: &Extents,
    candidates: Vec<&'a (FeatureID, Extents)>,
) -> Vec<&'a (FeatureID, Extents)> {
    let want = query.interval(axis);
    candidates
        .into_iter()
        .filter(|(_, extents)| extents.interval(axis).overlaps(want))
        .collect()
}

/// Measures the query and every candidate, then filters. A query that can't be measured fails
/// the whole call; a candidate that can't be measured is recorded in `Matches::skipped`.
pub fn resolve<'a, I: IntoIterator<Item = (FeatureID, &'a PolygonFeature)>>(
    query: &PolygonFeature,
    candidates: I,
) -> Result<Matches, GeomError> {
    let query_extents = query.extents()?;
    debug!("Query tile covers {}", query_extents);

    let mut measured = Vec::new();
    let mut skipped = Vec::new();
    for (id, feature) in candidates {
        match feature.extents() {
            Ok(extents) => measured.push((id, extents)),
            Err(err) => {
                debug!("Skipping {}: {}", id, err);
                skipped.push((id, err));
            }
        }
    }

    Ok(Matches {
        ids: intersecting_ids(&query_extents, &measured),
        skipped,
    })
}
