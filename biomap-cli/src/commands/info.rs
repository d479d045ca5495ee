//! Info command implementation - print dataset metadata

use anyhow::{Context, Result};

use biomap_core::io::load_dataset;

use crate::config::Config;

pub fn execute(config: &Config, prefix: &str) -> Result<()> {
    let layout = super::layout(config);
    let dataset = load_dataset(&layout, prefix)
        .with_context(|| format!("Failed to load dataset '{}'", prefix))?;
    let meta = dataset.meta();

    println!("Dataset: {}", dataset.key());
    println!("  Name: {}", meta.name);
    println!("  Type: {}", meta.category);
    println!("  Unit: {}", meta.unit);
    println!("  Region type: {}", meta.region_type);
    println!("  Scale: {}", meta.scale_kind);
    println!("  Derived product: {} (x{})", meta.derived_product, meta.derived_coefficient);
    println!("  Gas conversion: {}", meta.gas_coefficient);
    println!("  Records: {}", dataset.records().len());
    if !meta.notes.is_empty() {
        println!("  Notes: {}", meta.notes);
    }
    println!("Fonte: {}", meta.source);

    Ok(())
}
