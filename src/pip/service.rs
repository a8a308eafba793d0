//! PIP service for labelling a point with its neighborhood.

use std::sync::Arc;

use tracing::debug;

use super::geometry::ring_contains;
use super::BoundaryStore;
use crate::error::ResolveError;
use crate::models::{Coordinate, Region, RegionCollection, Resolution};

/// Point-in-Polygon neighborhood resolver
#[derive(Clone)]
pub struct PointResolver {
    store: Arc<BoundaryStore>,
}

impl PointResolver {
    pub fn new(store: Arc<BoundaryStore>) -> Self {
        Self { store }
    }

    /// Name of the first region containing the point, or `fallback`.
    pub fn resolve(
        &self,
        latitude: f64,
        longitude: f64,
        fallback: &str,
    ) -> Result<String, ResolveError> {
        self.resolve_detailed(latitude, longitude, fallback)
            .map(|r| r.label)
    }

    /// Like [`resolve`](Self::resolve) but also reports the group and
    /// whether a region matched at all.
    pub fn resolve_detailed(
        &self,
        latitude: f64,
        longitude: f64,
        fallback: &str,
    ) -> Result<Resolution, ResolveError> {
        let resolution = match self.locate(latitude, longitude)? {
            Some(region) => Resolution::matched(region),
            None => Resolution::fallback(fallback),
        };
        Ok(resolution)
    }

    /// First region (in collection order) whose ring contains the point
    pub fn locate(&self, latitude: f64, longitude: f64) -> Result<Option<&Region>, ResolveError> {
        let coordinate = Coordinate::new(latitude, longitude)?;
        let regions = self.store.load()?;
        let found = find_region(regions, coordinate);

        debug!(
            "PIP lookup at ({}, {}): {}",
            longitude,
            latitude,
            found.map(|r| r.name.as_str()).unwrap_or("no match")
        );

        Ok(found)
    }

    /// Get the boundary store (for stats/debugging)
    pub fn store(&self) -> &BoundaryStore {
        &self.store
    }
}

/// Scan `regions` in order and stop at the first containing ring
pub fn find_region(regions: &RegionCollection, coordinate: Coordinate) -> Option<&Region> {
    let point = coordinate.to_xy();
    regions.iter().find(|r| ring_contains(&r.ring, point))
}
