//! List command implementation - datasets and unit tables under the data root

use anyhow::{Context, Result};

use biomap_core::io::{list_datasets, list_units};

use crate::config::Config;

pub fn execute(config: &Config) -> Result<()> {
    let layout = super::layout(config);

    let datasets = list_datasets(&layout)
        .with_context(|| format!("Failed to list {}", layout.biomass_dir().display()))?;
    println!("Datasets ({}):", datasets.len());
    for prefix in &datasets {
        println!("  {}", prefix);
    }

    for (label, dir) in [
        ("Static units", layout.static_units_dir()),
        ("Dynamic units", layout.dynamic_units_dir()),
    ] {
        if !dir.is_dir() {
            log::debug!("{} not present", dir.display());
            continue;
        }
        let prefixes = list_units(&dir).with_context(|| format!("Failed to list {}", dir.display()))?;
        println!("{} ({}):", label, prefixes.len());
        for prefix in &prefixes {
            println!("  {}", prefix);
        }
    }

    Ok(())
}
