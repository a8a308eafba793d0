use std::io::Write;
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::Builder;

use nabe::pip::{BoundaryStore, PointResolver};
use nabe::ResolveError;

const BOUNDARIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"neighborhood": "Alpha", "borough": "North", "boroughCode": "1"},
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [0, 1], [1, 1], [1, 0]]]}
        },
        {
            "type": "Feature",
            "properties": {"neighborhood": "Beta", "borough": "South", "boroughCode": "2"},
            "geometry": {"type": "Polygon", "coordinates": [[[0.5, 0.5], [0.5, 1.5], [1.5, 1.5], [1.5, 0.5], [0.5, 0.5]]]}
        }
    ]
}"#;

fn resolver_for(path: &std::path::Path) -> PointResolver {
    PointResolver::new(Arc::new(BoundaryStore::from_path(path)))
}

#[test]
fn resolves_from_geojson_file() {
    let mut file = Builder::new().suffix(".geojson").tempfile().unwrap();
    file.write_all(BOUNDARIES.as_bytes()).unwrap();

    let resolver = resolver_for(file.path());

    // (lat, lon) in, ring is (lon, lat)
    assert_eq!(resolver.resolve(0.25, 0.25, "Nowhere").unwrap(), "Alpha");
    assert_eq!(resolver.resolve(1.25, 1.25, "Nowhere").unwrap(), "Beta");
    assert_eq!(resolver.resolve(0.75, 0.75, "Nowhere").unwrap(), "Alpha");
    assert_eq!(resolver.resolve(2.0, 2.0, "Nowhere").unwrap(), "Nowhere");

    let detailed = resolver.resolve_detailed(1.25, 1.25, "Nowhere").unwrap();
    assert_eq!(detailed.group.as_deref(), Some("South"));
    assert!(detailed.matched);
}

#[test]
fn reads_dataset_once() {
    let mut file = Builder::new().suffix(".geojson").tempfile().unwrap();
    file.write_all(BOUNDARIES.as_bytes()).unwrap();

    let resolver = resolver_for(file.path());
    assert_eq!(resolver.resolve(0.25, 0.25, "X").unwrap(), "Alpha");

    // The collection stays cached after the backing file is gone
    let path = file.path().to_path_buf();
    drop(file);
    assert!(!path.exists());
    assert_eq!(resolver.resolve(0.25, 0.25, "X").unwrap(), "Alpha");
}

#[test]
fn resolves_from_gzipped_file() {
    let file = Builder::new().suffix(".geojson.gz").tempfile().unwrap();
    let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
    encoder.write_all(BOUNDARIES.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let resolver = resolver_for(file.path());
    assert_eq!(resolver.resolve(1.25, 1.25, "X").unwrap(), "Beta");
}

#[test]
fn missing_dataset_is_data_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&dir.path().join("newyork.geojson"));

    let err = resolver.resolve(40.7, -73.9, "New York").unwrap_err();
    assert!(matches!(err, ResolveError::DataUnavailable(_)));
}

#[test]
fn corrupt_dataset_is_data_unavailable() {
    let mut file = Builder::new().suffix(".geojson").tempfile().unwrap();
    file.write_all(br#"{"type": "FeatureCollection", "features": [ {"#)
        .unwrap();

    let resolver = resolver_for(file.path());
    let err = resolver.resolve(40.7, -73.9, "New York").unwrap_err();
    assert!(matches!(err, ResolveError::DataUnavailable(_)));
}

#[test]
fn nan_latitude_is_invalid_coordinate() {
    let mut file = Builder::new().suffix(".geojson").tempfile().unwrap();
    file.write_all(BOUNDARIES.as_bytes()).unwrap();

    let resolver = resolver_for(file.path());
    let err = resolver.resolve(f64::NAN, -73.9, "X").unwrap_err();
    assert!(matches!(err, ResolveError::InvalidCoordinate(_)));
}

#[test]
fn bundled_sample_dataset_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/newyork.geojson");
    let resolver = resolver_for(&path);

    // Times Square
    assert_eq!(
        resolver.resolve(40.7580, -73.9857, "New York").unwrap(),
        "Midtown"
    );
    // Mid-Atlantic
    assert_eq!(resolver.resolve(35.0, -40.0, "New York").unwrap(), "New York");
}
