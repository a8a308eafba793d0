//! GeoJSON boundary dataset decoding.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use geo::Coord;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ResolveError;
use crate::models::{Region, RegionCollection};

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<FeatureProperties>,
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct FeatureProperties {
    neighborhood: Option<String>,
    name: Option<String>,
    borough: Option<String>,
    /// String or number depending on the publisher; only carried through
    #[serde(rename = "boroughCode", default)]
    borough_code: Option<serde_json::Value>,
}

impl FeatureProperties {
    /// `neighborhood` wins over `name`; blank values count as missing
    fn label(&self) -> Option<String> {
        [&self.neighborhood, &self.name]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .cloned()
    }

    fn group_code(&self) -> Option<String> {
        match self.borough_code.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

/// Read regions from a GeoJSON file. Files ending in `.gz` are gunzipped.
pub fn read_regions(path: &Path) -> Result<RegionCollection, ResolveError> {
    info!("Loading neighborhood boundaries from {}", path.display());

    let file = File::open(path).map_err(|e| {
        ResolveError::DataUnavailable(format!("failed to open {}: {}", path.display(), e))
    })?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let collection = decode_regions(reader)?;
    info!("Loaded {} neighborhood boundaries", collection.len());
    Ok(collection)
}

/// Decode a GeoJSON FeatureCollection into regions, in feature order.
///
/// Only `Polygon` features with a name take part; their first ring becomes
/// the region ring. Anything else is skipped.
pub fn decode_regions<R: Read>(reader: R) -> Result<RegionCollection, ResolveError> {
    let data: FeatureCollection = serde_json::from_reader(reader)
        .map_err(|e| ResolveError::DataUnavailable(format!("failed to parse GeoJSON: {}", e)))?;

    if data.kind != "FeatureCollection" {
        return Err(ResolveError::DataUnavailable(format!(
            "expected a FeatureCollection, found {}",
            data.kind
        )));
    }

    let mut regions = Vec::with_capacity(data.features.len());

    for (idx, feature) in data.features.into_iter().enumerate() {
        let Some(props) = feature.properties else {
            debug!("Skipping feature {}: no properties", idx);
            continue;
        };
        let Some(name) = props.label() else {
            debug!("Skipping feature {}: no neighborhood name", idx);
            continue;
        };
        let geometry = match feature.geometry {
            Some(g) if g.kind == "Polygon" => g,
            Some(g) => {
                debug!("Skipping feature {} ({}): {} geometry", idx, name, g.kind);
                continue;
            }
            None => {
                debug!("Skipping feature {} ({}): no geometry", idx, name);
                continue;
            }
        };

        let ring = outer_ring(geometry.coordinates).map_err(|reason| {
            ResolveError::DataUnavailable(format!("feature {} ({}): {}", idx, name, reason))
        })?;

        regions.push(Region {
            name,
            group_code: props.group_code(),
            group_name: props.borough,
            ring: ring.into(),
        });
    }

    Ok(RegionCollection::new(regions))
}

/// Extract the first ring of Polygon coordinates. Extra position members
/// (elevation) are ignored.
fn outer_ring(coordinates: serde_json::Value) -> Result<Vec<Coord<f64>>, String> {
    let rings: Vec<Vec<Vec<f64>>> =
        serde_json::from_value(coordinates).map_err(|e| format!("bad coordinates: {}", e))?;

    let Some(first) = rings.into_iter().next() else {
        return Ok(Vec::new());
    };

    first
        .into_iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(format!("position has {} values", position.len())),
        })
        .collect()
}
