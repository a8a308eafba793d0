use std::io::Read;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use geo::Rect;

use nabe::{Coordinate, PointResolver};

/// CSV records plus the positions of the columns we read and write
pub struct RecordTable {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
    pub columns: Columns,
}

#[derive(Debug, Clone, Copy)]
pub struct Columns {
    pub latitude: usize,
    pub longitude: usize,
    pub name: Option<usize>,
    pub city: Option<usize>,
    pub neighborhood: usize,
}

/// Load records; a `neighborhood` column is appended if missing, and a
/// `city` column too when `want_city` is set.
pub fn read_table<R: Read>(reader: R, want_city: bool) -> Result<RecordTable> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let mut headers = csv_reader.headers()?.clone();
    let position = |headers: &StringRecord, name: &str| {
        headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let latitude = position(&headers, "latitude").context("Column 'latitude' not found")?;
    let longitude = position(&headers, "longitude").context("Column 'longitude' not found")?;
    let name = position(&headers, "name");

    let mut appended = 0;
    let neighborhood = match position(&headers, "neighborhood") {
        Some(idx) => idx,
        None => {
            headers.push_field("neighborhood");
            appended += 1;
            headers.len() - 1
        }
    };
    let city = match position(&headers, "city") {
        Some(idx) => Some(idx),
        None if want_city => {
            headers.push_field("city");
            appended += 1;
            Some(headers.len() - 1)
        }
        None => None,
    };

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let mut record = result?;
        for _ in 0..appended {
            record.push_field("");
        }
        rows.push(record);
    }

    Ok(RecordTable {
        headers,
        rows,
        columns: Columns {
            latitude,
            longitude,
            name,
            city,
            neighborhood,
        },
    })
}

pub struct EnrichOptions {
    pub skip_existing: bool,
    pub update_city: bool,
    pub default_label: String,
    /// City values too broad to keep once a borough is known
    pub generic_cities: Vec<String>,
    pub service_area: Option<Rect<f64>>,
}

impl EnrichOptions {
    pub fn is_generic_city(&self, city: &str) -> bool {
        city.eq_ignore_ascii_case(&self.default_label)
            || self
                .generic_cities
                .iter()
                .any(|c| c.eq_ignore_ascii_case(city))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Updated {
        neighborhood: String,
        group: Option<String>,
    },
    NotFound,
    SkippedExisting,
    InvalidCoordinates,
    OutsideArea,
}

/// Decide what happens to one record
pub fn assess(
    row: &StringRecord,
    columns: &Columns,
    resolver: &PointResolver,
    options: &EnrichOptions,
) -> Result<Outcome> {
    if options.skip_existing && !field(row, Some(columns.neighborhood)).is_empty() {
        return Ok(Outcome::SkippedExisting);
    }

    let lat = field(row, Some(columns.latitude)).parse::<f64>();
    let lon = field(row, Some(columns.longitude)).parse::<f64>();
    let coordinate = match (lat, lon) {
        (Ok(lat), Ok(lon)) => match Coordinate::new(lat, lon) {
            Ok(c) if c.is_on_earth() => c,
            _ => return Ok(Outcome::InvalidCoordinates),
        },
        _ => return Ok(Outcome::InvalidCoordinates),
    };

    if let Some(area) = &options.service_area {
        if !coordinate.within(area) {
            return Ok(Outcome::OutsideArea);
        }
    }

    let outcome = match resolver.locate(coordinate.lat, coordinate.lon)? {
        Some(region) => Outcome::Updated {
            neighborhood: region.name.clone(),
            group: region.group_name.clone(),
        },
        None => Outcome::NotFound,
    };
    Ok(outcome)
}

/// Rewrite `row` according to `outcome`
pub fn apply(
    row: &StringRecord,
    columns: &Columns,
    outcome: &Outcome,
    options: &EnrichOptions,
) -> StringRecord {
    let Outcome::Updated {
        neighborhood,
        group,
    } = outcome
    else {
        return row.clone();
    };

    let replace_city = options.update_city
        && group.is_some()
        && columns.city.map_or(false, |idx| {
            let city = field(row, Some(idx));
            city.is_empty() || options.is_generic_city(city)
        });

    row.iter()
        .enumerate()
        .map(|(idx, value)| {
            if idx == columns.neighborhood {
                neighborhood.as_str()
            } else if replace_city && Some(idx) == columns.city {
                group.as_deref().unwrap_or(value)
            } else {
                value
            }
        })
        .collect()
}

pub fn field<'a>(row: &'a StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|i| row.get(i)).map(str::trim).unwrap_or("")
}

#[derive(Debug, Default, PartialEq)]
pub struct Summary {
    pub updated: usize,
    pub not_found: usize,
    pub skipped: usize,
    pub invalid_coordinates: usize,
    pub outside_area: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Updated { .. } => self.updated += 1,
            Outcome::NotFound => self.not_found += 1,
            Outcome::SkippedExisting => self.skipped += 1,
            Outcome::InvalidCoordinates => self.invalid_coordinates += 1,
            Outcome::OutsideArea => self.outside_area += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use nabe::{BoundaryStore, Region, RegionCollection};
    use std::sync::Arc;

    const CSV: &str = "\
id,name,latitude,longitude,city
1,STK Steakhouse,40.7398,-74.0072,New York
2,Far Away,51.5,-0.12,London
3,Broken,north,-73.9,New York
4,Queens Spot,40.76,-73.92,
";

    fn resolver() -> PointResolver {
        let chelsea = Region::new(
            "Chelsea",
            vec![
                Coord { x: -74.01, y: 40.73 },
                Coord { x: -74.01, y: 40.75 },
                Coord { x: -73.99, y: 40.75 },
                Coord { x: -73.99, y: 40.73 },
            ],
        )
        .with_group("Manhattan");
        let store = BoundaryStore::from_regions(RegionCollection::new(vec![chelsea]));
        PointResolver::new(Arc::new(store))
    }

    fn options() -> EnrichOptions {
        EnrichOptions {
            skip_existing: true,
            update_city: true,
            default_label: "New York".to_string(),
            generic_cities: vec!["Manhattan".to_string()],
            service_area: Some(Rect::new(
                Coord { x: -74.3, y: 40.4 },
                Coord { x: -73.7, y: 40.9 },
            )),
        }
    }

    #[test]
    fn test_read_table_appends_neighborhood_column() {
        let table = read_table(CSV.as_bytes(), false).unwrap();
        assert_eq!(table.headers.len(), 6);
        assert_eq!(&table.headers[5], "neighborhood");
        assert_eq!(table.columns.neighborhood, 5);
        assert_eq!(table.columns.city, Some(4));
        assert_eq!(table.rows.len(), 4);
        assert!(table.rows.iter().all(|r| r.len() == 6));
    }

    #[test]
    fn test_read_table_requires_coordinates() {
        assert!(read_table("id,name\n1,x\n".as_bytes(), false).is_err());
    }

    #[test]
    fn test_assess_outcomes() {
        let table = read_table(CSV.as_bytes(), true).unwrap();
        let resolver = resolver();
        let options = options();

        let outcomes: Vec<Outcome> = table
            .rows
            .iter()
            .map(|row| assess(row, &table.columns, &resolver, &options).unwrap())
            .collect();

        assert_eq!(
            outcomes,
            vec![
                Outcome::Updated {
                    neighborhood: "Chelsea".to_string(),
                    group: Some("Manhattan".to_string()),
                },
                Outcome::OutsideArea,
                Outcome::InvalidCoordinates,
                Outcome::NotFound,
            ]
        );

        let mut summary = Summary::default();
        outcomes.iter().for_each(|o| summary.record(o));
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.outside_area, 1);
        assert_eq!(summary.invalid_coordinates, 1);
        assert_eq!(summary.not_found, 1);
    }

    #[test]
    fn test_skip_existing() {
        let csv = "name,latitude,longitude,neighborhood\nA,40.74,-74.0,Flatiron\n";
        let table = read_table(csv.as_bytes(), false).unwrap();
        let resolver = resolver();

        let mut options = options();
        let outcome = assess(&table.rows[0], &table.columns, &resolver, &options).unwrap();
        assert_eq!(outcome, Outcome::SkippedExisting);

        options.skip_existing = false;
        let outcome = assess(&table.rows[0], &table.columns, &resolver, &options).unwrap();
        assert!(matches!(outcome, Outcome::Updated { .. }));
    }

    #[test]
    fn test_apply_sets_neighborhood_and_city() {
        let table = read_table(CSV.as_bytes(), true).unwrap();
        let options = options();
        let outcome = Outcome::Updated {
            neighborhood: "Chelsea".to_string(),
            group: Some("Manhattan".to_string()),
        };

        let row = apply(&table.rows[0], &table.columns, &outcome, &options);
        assert_eq!(&row[4], "Manhattan");
        assert_eq!(&row[5], "Chelsea");
        assert_eq!(&row[1], "STK Steakhouse");
    }

    #[test]
    fn test_apply_keeps_specific_city() {
        let csv = "latitude,longitude,city\n40.74,-74.0,Hoboken\n";
        let table = read_table(csv.as_bytes(), true).unwrap();
        let outcome = Outcome::Updated {
            neighborhood: "Chelsea".to_string(),
            group: Some("Manhattan".to_string()),
        };

        let row = apply(&table.rows[0], &table.columns, &outcome, &options());
        assert_eq!(&row[2], "Hoboken");
        assert_eq!(&row[3], "Chelsea");
    }

    #[test]
    fn test_apply_replaces_generic_city() {
        let csv = "latitude,longitude,city\n40.74,-74.0,manhattan\n40.74,-74.0,NEW YORK\n";
        let table = read_table(csv.as_bytes(), true).unwrap();
        let outcome = Outcome::Updated {
            neighborhood: "Chelsea".to_string(),
            group: Some("Manhattan".to_string()),
        };
        let options = options();

        for row in &table.rows {
            let row = apply(row, &table.columns, &outcome, &options);
            assert_eq!(&row[2], "Manhattan");
        }

        let keep = EnrichOptions {
            update_city: false,
            ..options
        };
        let row = apply(&table.rows[1], &table.columns, &outcome, &keep);
        assert_eq!(&row[2], "NEW YORK");
    }

    #[test]
    fn test_apply_leaves_unmatched_rows() {
        let table = read_table(CSV.as_bytes(), false).unwrap();
        let row = apply(&table.rows[3], &table.columns, &Outcome::NotFound, &options());
        assert_eq!(row, table.rows[3]);
    }
}
