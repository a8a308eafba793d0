//! Named polygon regions and the coordinates resolved against them.

use geo::{BoundingRect, Coord, LineString, Rect};
use serde::Serialize;

use crate::error::ResolveError;

/// A single named polygon boundary
#[derive(Debug, Clone)]
pub struct Region {
    /// Display label, e.g. a neighborhood name
    pub name: String,
    /// Coarser label such as a borough; carried through, never matched on
    pub group_name: Option<String>,
    pub group_code: Option<String>,
    /// Outer ring in (lon, lat) order. Not necessarily closed.
    pub ring: LineString<f64>,
}

impl Region {
    pub fn new(name: impl Into<String>, ring: Vec<Coord<f64>>) -> Self {
        Self {
            name: name.into(),
            group_name: None,
            group_code: None,
            ring: LineString::new(ring),
        }
    }

    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }

    /// Get the bounding box of this region's ring
    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.ring.bounding_rect()
    }
}

/// Ordered, immutable set of regions for one area.
///
/// Order is significant: when rings overlap, the earlier region wins.
#[derive(Debug, Clone, Default)]
pub struct RegionCollection {
    regions: Vec<Region>,
}

impl RegionCollection {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Keep only the regions whose group matches `group` (case-insensitive),
    /// preserving collection order.
    pub fn filter_group(&self, group: &str) -> RegionCollection {
        let regions = self
            .regions
            .iter()
            .filter(|r| {
                r.group_name
                    .as_deref()
                    .map(|g| g.eq_ignore_ascii_case(group))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        RegionCollection { regions }
    }

    /// Bounding rectangle covering every ring in the collection
    pub fn extent(&self) -> Option<Rect<f64>> {
        self.regions
            .iter()
            .filter_map(Region::bbox)
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            })
    }
}

/// Validated geographic point (lat/lon in decimal degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Both values must be finite. (0, 0) is a real point and is accepted.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ResolveError> {
        if !lat.is_finite() {
            return Err(ResolveError::InvalidCoordinate(format!(
                "latitude {} is not finite",
                lat
            )));
        }
        if !lon.is_finite() {
            return Err(ResolveError::InvalidCoordinate(format!(
                "longitude {} is not finite",
                lon
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Point in ring convention: x = lon, y = lat
    pub fn to_xy(self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }

    pub fn is_on_earth(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn within(&self, area: &Rect<f64>) -> bool {
        let min = area.min();
        let max = area.max();
        self.lon >= min.x && self.lon <= max.x && self.lat >= min.y && self.lat <= max.y
    }
}

/// Outcome of a resolution: the label plus whether a region actually matched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub label: String,
    pub group: Option<String>,
    pub matched: bool,
}

impl Resolution {
    pub fn matched(region: &Region) -> Self {
        Self {
            label: region.name.clone(),
            group: region.group_name.clone(),
            matched: true,
        }
    }

    pub fn fallback(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            group: None,
            matched: false,
        }
    }
}
