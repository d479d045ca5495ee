//! Command implementations for the BioMap CLI

pub mod info;
pub mod list;
pub mod render;
pub mod scale;

use anyhow::{Context, Result};

use biomap_core::io::{load_dynamic_units, load_static_units};
use biomap_core::{DataLayout, UnitSource};

use crate::config::Config;

pub(crate) fn layout(config: &Config) -> DataLayout {
    DataLayout::new(&config.data.root)
}

/// Every unit table named in `[data]`, static ones first.
pub(crate) fn load_unit_sources(config: &Config, layout: &DataLayout) -> Result<Vec<UnitSource>> {
    let mut sources = Vec::new();
    for prefix in &config.data.static_units {
        let source = load_static_units(&layout.static_units_dir(), prefix, config.data.unit_legends)
            .with_context(|| format!("Failed to load static units '{}'", prefix))?;
        sources.push(source);
    }
    for prefix in &config.data.dynamic_units {
        let source = load_dynamic_units(&layout.dynamic_units_dir(), prefix)
            .with_context(|| format!("Failed to load dynamic units '{}'", prefix))?;
        sources.push(source);
    }
    Ok(sources)
}
