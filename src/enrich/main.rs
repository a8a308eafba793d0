//! Batch neighborhood enrichment.
//!
//! Reads restaurant records from CSV, resolves each coordinate to a
//! neighborhood, and writes the enriched records back out.

mod records;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use nabe::config::Config;
use nabe::{BoundaryStore, PointResolver};

use crate::records::{apply, assess, field, read_table, EnrichOptions, Outcome, Summary};

#[derive(Parser, Debug)]
#[command(name = "enrich")]
#[command(about = "Assign neighborhoods to restaurant records")]
struct Args {
    /// CSV file with latitude/longitude columns
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the enriched CSV (required unless --dry-run)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GeoJSON boundary dataset (overrides config)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Only consider neighborhoods in this borough
    #[arg(long)]
    group: Option<String>,

    /// Re-resolve records that already have a neighborhood
    #[arg(long)]
    overwrite: bool,

    /// Keep the city column as-is instead of replacing a blank or generic
    /// city with the matched borough
    #[arg(long)]
    keep_city: bool,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    if args.output.is_none() && !args.dry_run {
        anyhow::bail!("--output is required unless --dry-run is set");
    }

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(dataset) = args.dataset {
        config.dataset = dataset;
    }

    info!("Nabe Enrich");
    info!("Input: {}", args.input.display());

    let store = BoundaryStore::from_path(&config.dataset);
    let all_regions = store
        .load()
        .with_context(|| format!("Failed to load {}", config.dataset.display()))?;

    let regions = match &args.group {
        Some(group) => {
            let filtered = all_regions.filter_group(group);
            info!(
                "Filtered to {} neighborhoods in {}",
                filtered.len(),
                group
            );
            filtered
        }
        None => all_regions.clone(),
    };

    let options = EnrichOptions {
        skip_existing: !args.overwrite,
        update_city: !args.keep_city,
        default_label: config.default_label.clone(),
        generic_cities: config.generic_cities.clone(),
        service_area: config.service_area().or_else(|| all_regions.extent()),
    };

    let resolver = PointResolver::new(Arc::new(BoundaryStore::from_regions(regions)));

    let file = File::open(&args.input).context("Failed to open input file")?;
    let table = read_table(BufReader::new(file), !args.keep_city)?;
    info!("Found {} records", table.rows.len());

    let pb = ProgressBar::new(table.rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    // Collection is immutable once loaded, so records resolve in parallel
    let outcomes: Vec<Outcome> = table
        .rows
        .par_iter()
        .map(|row| {
            let outcome = assess(row, &table.columns, &resolver, &options);
            pb.inc(1);
            outcome
        })
        .collect::<Result<_>>()?;
    pb.finish_and_clear();

    let mut summary = Summary::default();
    let mut enriched = Vec::with_capacity(table.rows.len());

    for (row, outcome) in table.rows.iter().zip(&outcomes) {
        summary.record(outcome);
        let name = field(row, table.columns.name);
        let lat = field(row, Some(table.columns.latitude));
        let lon = field(row, Some(table.columns.longitude));

        match outcome {
            Outcome::Updated {
                neighborhood,
                group,
            } => {
                let prefix = if args.dry_run { "[DRY RUN] Would update" } else { "Updated" };
                info!(
                    "{} {}: {}, {}",
                    prefix,
                    name,
                    neighborhood,
                    group.as_deref().unwrap_or("-")
                );
            }
            Outcome::NotFound => info!("No neighborhood found for {} at ({}, {})", name, lon, lat),
            Outcome::InvalidCoordinates => {
                warn!("Invalid coordinates for {}: ({}, {})", name, lon, lat)
            }
            Outcome::OutsideArea => {
                warn!("Coordinates outside service area for {}: ({}, {})", name, lon, lat)
            }
            Outcome::SkippedExisting => debug!("Skipping {}: already has a neighborhood", name),
        }

        enriched.push(apply(row, &table.columns, outcome, &options));
    }

    info!("Summary:");
    info!("  Updated: {}", summary.updated);
    info!("  Not found: {}", summary.not_found);
    info!("  Skipped: {}", summary.skipped);
    info!("  Invalid coordinates: {}", summary.invalid_coordinates);
    info!("  Outside service area: {}", summary.outside_area);

    if args.dry_run {
        info!("This was a DRY RUN - no records were written");
        return Ok(());
    }

    if let Some(output) = &args.output {
        let mut writer = csv::Writer::from_path(output)
            .with_context(|| format!("Failed to create {}", output.display()))?;
        writer.write_record(&table.headers)?;
        for row in &enriched {
            writer.write_record(row)?;
        }
        writer.flush()?;
        info!("Wrote {} records to {}", enriched.len(), output.display());
    }

    Ok(())
}
