//! Scale command implementation - print color scale boundaries for a region

use anyhow::{Context, Result};

use biomap_core::io::{load_dataset, load_geometry_index};
use biomap_core::{RegionFilter, ScaleBuilder};

use crate::config::Config;

pub fn execute(config: &Config, prefix: &str, region: &str, buckets: Option<usize>) -> Result<()> {
    let region: RegionFilter = region
        .parse()
        .with_context(|| format!("Invalid region '{}'", region))?;

    let layout = super::layout(config);
    let dataset = load_dataset(&layout, prefix)
        .with_context(|| format!("Failed to load dataset '{}'", prefix))?;
    let mut geometry = load_geometry_index(&layout).context("Failed to load state geometry")?;
    let placed = geometry
        .load(dataset.region_type())?
        .resolve(&dataset)
        .with_context(|| format!("Failed to place dataset '{}' on the map", prefix))?;

    let values: Vec<f64> = placed
        .iter()
        .filter(|p| region.matches(&p.state))
        .map(|p| p.value)
        .collect();
    log::info!("{} of {} values inside {}", values.len(), placed.len(), region);

    let continuous = ScaleBuilder::continuous(dataset.scale_kind())
        .with_context(dataset.key())
        .compute(&values)?;
    let buckets = buckets.unwrap_or(config.style.markers.bucket_count);
    let discrete = ScaleBuilder::discretized(buckets)
        .with_context(dataset.key())
        .compute(&values)?;

    println!("Region: {}", region);
    println!("Values: {}", values.len());
    println!(
        "Continuous ({}): [{}, {}]",
        dataset.scale_kind(),
        continuous.vmin(),
        continuous.vmax()
    );
    println!("  Ticks: {}", join(&continuous.ticks(5)));
    println!("Discretized ({} edges): {}", buckets, join(&discrete.ticks(buckets)));

    Ok(())
}

fn join(values: &[f64]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}
