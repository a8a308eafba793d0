use anyhow::{Context, Result};
use geo::{Coord, Rect};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LABEL: &str = "New York";
pub const DEFAULT_DATASET: &str = "data/newyork.geojson";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// GeoJSON boundary file, optionally gzipped
    pub dataset: PathBuf,
    /// Label used when a request supplies no fallback of its own
    pub default_label: String,
    pub listen: String,
    /// `[min_lon, min_lat, max_lon, max_lat]` accepted by the batch job
    pub service_area: Option<[f64; 4]>,
    /// Cities the batch job may replace with a matched borough, besides
    /// `default_label` and blanks
    pub generic_cities: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from(DEFAULT_DATASET),
            default_label: DEFAULT_LABEL.to_string(),
            listen: DEFAULT_LISTEN.to_string(),
            service_area: None,
            generic_cities: vec!["Manhattan".to_string()],
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn service_area(&self) -> Option<Rect<f64>> {
        self.service_area.map(|[min_lon, min_lat, max_lon, max_lat]| {
            Rect::new(
                Coord {
                    x: min_lon,
                    y: min_lat,
                },
                Coord {
                    x: max_lon,
                    y: max_lat,
                },
            )
        })
    }
}
