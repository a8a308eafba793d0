//! Point-in-Polygon (PIP) neighborhood lookup.
//!
//! Loads neighborhood boundaries from a GeoJSON dataset once per process
//! and resolves points against them with an even-odd ray cast.

mod dataset;
pub mod geometry;
mod service;
mod store;

pub use dataset::{decode_regions, read_regions};
pub use service::{find_region, PointResolver};
pub use store::{BoundarySource, BoundaryStore, FileSource};
