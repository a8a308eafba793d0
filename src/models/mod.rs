//! Core data models for neighborhood resolution.

pub mod region;

pub use region::{Coordinate, Region, RegionCollection, Resolution};
