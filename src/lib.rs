//! Nabe - neighborhood resolution for restaurant listings
//!
//! This library provides the boundary store, point resolver and HTTP entry
//! point shared by the query and enrich binaries.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pip;

pub use error::ResolveError;
pub use models::{Coordinate, Region, RegionCollection, Resolution};
pub use pip::{BoundaryStore, PointResolver};
