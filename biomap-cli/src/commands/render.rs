//! Render command implementation - rasterize a map and its legends, optionally export SVG

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use biomap_core::io::{load_bounding_boxes, load_dataset, load_geometry_index};
use biomap_core::RegionFilter;
use biomap_render::{MapController, VectorExporter};

use crate::config::Config;

#[allow(clippy::too_many_arguments)]
pub fn execute(
    config: &Config,
    dataset: Option<String>,
    region: String,
    output: PathBuf,
    legend: Option<PathBuf>,
    svg: Option<PathBuf>,
    units_legend_dir: Option<PathBuf>,
    hide_units: Vec<String>,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<()> {
    log::info!("Starting map rendering");
    log::info!("Data directory: {}", config.data.root.display());
    log::info!("Output file: {}", output.display());

    let region: RegionFilter = region
        .parse()
        .with_context(|| format!("Invalid region '{}'", region))?;

    let mut style = config.style.clone();
    if let Some(width) = width {
        style.figure.width = width;
    }
    if let Some(height) = height {
        style.figure.height = height;
    }

    let layout = super::layout(config);
    let geometry = load_geometry_index(&layout).context("Failed to load state geometry")?;
    let bboxes = load_bounding_boxes(&layout, &geometry).context("Failed to load bounding boxes")?;
    let units = super::load_unit_sources(config, &layout)?;

    let mut controller = match &dataset {
        Some(prefix) => {
            let dataset = load_dataset(&layout, prefix)
                .with_context(|| format!("Failed to load dataset '{}'", prefix))?;
            MapController::new(geometry, bboxes, style, dataset, units)
        }
        None => MapController::empty(geometry, bboxes, style, units),
    }
    .context("Failed to build map")?;

    for key in &hide_units {
        controller
            .set_units_enabled(key, false)
            .with_context(|| format!("Cannot hide unit layer '{}'", key))?;
    }

    if !region.is_nationwide() {
        controller
            .select_region(region)
            .context("Failed to select region")?;
    }

    controller
        .figure()
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Map written to: {}", output.display());

    if let Some(path) = legend {
        match controller.colorbar() {
            Some(colorbar) => {
                colorbar
                    .save(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                log::info!("Colorbar written to: {}", path.display());
            }
            None => log::warn!("Empty map has no colorbar, skipping {}", path.display()),
        }
    }

    if let Some(dir) = units_legend_dir {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for (key, img) in controller.unit_legends() {
            let path = dir.join(format!("{}.png", key));
            img.save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        log::info!(
            "{} unit legends written to: {}",
            controller.unit_legends().len(),
            dir.display()
        );
    }

    if let Some(path) = svg {
        export_svg(&controller, &path)?;
    }

    if let Some(title) = controller.title() {
        println!("{}", title);
    }
    if !controller.source().is_empty() {
        println!("Fonte: {}", controller.source());
    }
    if !controller.notes().is_empty() {
        println!("{}", controller.notes());
    }

    Ok(())
}

fn export_svg(controller: &MapController, path: &Path) -> Result<()> {
    let exporter = VectorExporter::new(controller.style().export_config());
    let source = Some(controller.source()).filter(|s| !s.is_empty());
    exporter
        .export_map(path, controller.surface(), source)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("SVG map written to: {}", path.display());

    if let Some(label) = controller.colorbar_label() {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("map");
        let colorbar_path = path.with_file_name(format!("{}_colorbar.svg", stem));
        let choropleth = controller.choropleth();
        exporter
            .export_colorbar(&colorbar_path, choropleth.colormap(), choropleth.scale(), Some(label.as_str()))
            .with_context(|| format!("Failed to write {}", colorbar_path.display()))?;
        log::info!("SVG colorbar written to: {}", colorbar_path.display());
    }

    Ok(())
}
