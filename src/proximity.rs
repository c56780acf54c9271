// Proximity search: a full scan over the catalog, no index. The dataset
// is a few hundred trails at most, so linear is plenty.

use crate::catalog::{Catalog, TrailEntry};
use crate::geo::{planar_distance, PlanarPoint};

/// Default search radius in meters (10 km).
pub const DEFAULT_RADIUS_M: f64 = 10_000.0;

/// Return every trail with a mapped position within `radius_m` of
/// `origin`, inclusive, in catalog traversal order. An empty result is
/// not an error.
pub fn find_nearby(catalog: &Catalog, origin: PlanarPoint, radius_m: f64) -> Vec<&TrailEntry> {
    let mut within = Vec::new();
    for trail in catalog.trails() {
        let Some(position) = trail.position else {
            continue;
        };
        if planar_distance(origin, position) <= radius_m {
            within.push(trail);
        }
    }
    within
}
