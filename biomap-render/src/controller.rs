//! Region selection and dataset switching across all layers.

use image::RgbaImage;
use std::collections::BTreeMap;

use biomap_core::{
    BiomapError, BiomapResult, BoundingBoxTable, Dataset, RegionFilter, RegionGeometryIndex,
    ScaleBuilder, UnitSource,
};

use crate::choropleth::ChoroplethLayer;
use crate::colormap::Colormap;
use crate::legend::{KeyEntry, LegendRasterizer};
use crate::markers::{LayerLegend, MarkerLayer};
use crate::surface::RenderSurface;
use crate::MapStyle;

/// Owns the figure surface and every layer drawn on it.
///
/// One controller per viewer session; nothing here is shared between instances.
pub struct MapController {
    surface: RenderSurface,
    geometry: RegionGeometryIndex,
    bboxes: BoundingBoxTable,
    style: MapStyle,
    legend: LegendRasterizer,
    dataset: Dataset,
    choropleth: ChoroplethLayer,
    unit_sources: Vec<UnitSource>,
    markers: Vec<MarkerLayer>,
    selection: RegionFilter,
    colorbar: Option<RgbaImage>,
    unit_legends: BTreeMap<String, RgbaImage>,
}

impl MapController {
    /// Build every layer for `dataset` and select the whole country.
    pub fn new(
        mut geometry: RegionGeometryIndex,
        bboxes: BoundingBoxTable,
        style: MapStyle,
        dataset: Dataset,
        unit_sources: Vec<UnitSource>,
    ) -> BiomapResult<Self> {
        let mut surface = RenderSurface::new();
        let (choropleth, markers) =
            build_layers(&mut surface, &mut geometry, &style, &dataset, &unit_sources)?;
        let legend = LegendRasterizer::new(style.legend.clone());
        let mut controller = Self {
            surface,
            geometry,
            bboxes,
            style,
            legend,
            dataset,
            choropleth,
            unit_sources,
            markers,
            selection: RegionFilter::Nationwide,
            colorbar: None,
            unit_legends: BTreeMap::new(),
        };
        controller.select_region(RegionFilter::Nationwide)?;
        Ok(controller)
    }

    /// The bare state map with no dataset.
    pub fn empty(
        geometry: RegionGeometryIndex,
        bboxes: BoundingBoxTable,
        style: MapStyle,
        unit_sources: Vec<UnitSource>,
    ) -> BiomapResult<Self> {
        Self::new(geometry, bboxes, style, Dataset::empty(), unit_sources)
    }

    /// Rescale, recolor and show the selected region, then reframe the view on it.
    pub fn select_region(&mut self, region: RegionFilter) -> BiomapResult<()> {
        let view = self.bboxes.get(&region)?;

        let values = self.choropleth.values_in(&region);
        let scale = ScaleBuilder::continuous(self.dataset.scale_kind())
            .with_context(self.dataset.key())
            .compute(&values)?;
        self.choropleth.recolor(&mut self.surface, &self.dataset, scale, &region)?;

        if region.is_nationwide() {
            self.choropleth.set_region_visibility(&mut self.surface, &region, true);
        } else {
            self.choropleth
                .set_region_visibility(&mut self.surface, &RegionFilter::Nationwide, false);
            self.choropleth.set_region_visibility(&mut self.surface, &region, true);
        }

        for layer in &mut self.markers {
            let enabled = layer.is_enabled();
            layer.set_visibility(&mut self.surface, enabled, &region)?;
        }

        self.surface.set_view(view);
        self.selection = region;
        self.render_legends();
        log::info!(
            "Selected {} ({} values, scale [{}, {}])",
            self.selection,
            values.len(),
            self.choropleth.scale().vmin(),
            self.choropleth.scale().vmax()
        );
        Ok(())
    }

    /// Replace the dataset, rebuilding all layers on a cleared surface.
    ///
    /// Geometry, bounding boxes and per-layer enable flags are kept. The new dataset is
    /// validated before anything is torn down, so a failed switch leaves the current map
    /// intact.
    pub fn switch_dataset(&mut self, dataset: Dataset) -> BiomapResult<()> {
        if !dataset.is_empty() {
            self.geometry.load(dataset.region_type())?.resolve(&dataset)?;
        }

        let enabled: BTreeMap<String, bool> =
            self.markers.iter().map(|m| (m.key().to_string(), m.is_enabled())).collect();

        self.surface.rebuild();
        let (choropleth, mut markers) = build_layers(
            &mut self.surface,
            &mut self.geometry,
            &self.style,
            &dataset,
            &self.unit_sources,
        )?;
        for layer in &mut markers {
            if let Some(flag) = enabled.get(layer.key()) {
                layer.set_enabled(*flag);
            }
        }
        log::info!("Switched dataset '{}' -> '{}'", self.dataset.key(), dataset.key());
        self.choropleth = choropleth;
        self.markers = markers;
        self.dataset = dataset;
        self.select_region(RegionFilter::Nationwide)
    }

    /// Toggle a marker layer and re-apply its visibility under the current selection.
    pub fn set_units_enabled(&mut self, key: &str, enabled: bool) -> BiomapResult<()> {
        let layer = self
            .markers
            .iter_mut()
            .find(|m| m.key() == key)
            .ok_or_else(|| BiomapError::UnknownLayer { key: key.to_string() })?;
        layer.set_enabled(enabled);
        layer.set_visibility(&mut self.surface, enabled, &self.selection)?;
        self.render_legends();
        Ok(())
    }

    fn render_legends(&mut self) {
        self.colorbar = self.colorbar_label().map(|caption| {
            self.legend.render(self.choropleth.colormap(), self.choropleth.scale(), Some(caption.as_str()))
        });

        self.unit_legends.clear();
        for layer in self.markers.iter().filter(|m| m.has_own_legend() && m.is_enabled()) {
            let img = match layer.legend() {
                LayerLegend::Colorbar { label, unit, colormap, scale } => {
                    self.legend.render(colormap, scale, Some(with_unit(label, unit).as_str()))
                }
                LayerLegend::Key { label, color, marker } => self.legend.render_key(&[KeyEntry {
                    label: label.to_string(),
                    color,
                    marker,
                    size: self.style.markers.static_size,
                }]),
            };
            self.unit_legends.insert(layer.key().to_string(), img);
        }
    }

    /// Caption of the choropleth colorbar, `Produção de <name> (<unit>)`; absent for the
    /// empty map.
    pub fn colorbar_label(&self) -> Option<String> {
        if self.dataset.is_empty() {
            return None;
        }
        let name = format!("Produção de {}", self.dataset.name());
        Some(with_unit(&name, &self.dataset.meta().unit))
    }

    /// Rasterized map at the configured figure size.
    pub fn figure(&self) -> RgbaImage {
        self.surface.rasterize(&self.style.figure)
    }

    /// Choropleth colorbar; absent for the empty map.
    pub fn colorbar(&self) -> Option<&RgbaImage> {
        self.colorbar.as_ref()
    }

    /// Legends of the enabled marker layers that carry one, by layer key.
    pub fn unit_legends(&self) -> &BTreeMap<String, RgbaImage> {
        &self.unit_legends
    }

    pub fn source(&self) -> &str {
        self.dataset.source()
    }

    pub fn notes(&self) -> &str {
        self.dataset.notes()
    }

    pub fn title(&self) -> Option<&str> {
        self.surface.title()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn selection(&self) -> &RegionFilter {
        &self.selection
    }

    pub fn choropleth(&self) -> &ChoroplethLayer {
        &self.choropleth
    }

    pub fn markers(&self) -> &[MarkerLayer] {
        &self.markers
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn style(&self) -> &MapStyle {
        &self.style
    }

    pub fn geometry(&self) -> &RegionGeometryIndex {
        &self.geometry
    }
}

fn with_unit(label: &str, unit: &str) -> String {
    if unit.is_empty() {
        label.to_string()
    } else {
        format!("{} ({})", label, unit)
    }
}

fn build_layers(
    surface: &mut RenderSurface,
    geometry: &mut RegionGeometryIndex,
    style: &MapStyle,
    dataset: &Dataset,
    unit_sources: &[UnitSource],
) -> BiomapResult<(ChoroplethLayer, Vec<MarkerLayer>)> {
    if !dataset.is_empty() {
        geometry.load(dataset.region_type())?;
    }
    let colormap = Colormap::by_name(&style.choropleth.colormap)?;
    let scale = ScaleBuilder::continuous(dataset.scale_kind())
        .with_context(dataset.key())
        .compute(&dataset.quantities())?;
    let choropleth =
        ChoroplethLayer::build(surface, dataset, geometry, scale, colormap, &style.choropleth)?;
    let markers = unit_sources
        .iter()
        .map(|source| MarkerLayer::build(surface, source, &style.markers))
        .collect::<BiomapResult<Vec<_>>>()?;
    if !dataset.is_empty() {
        surface.set_title(format!("Produção de {}", dataset.name()));
    }
    Ok((choropleth, markers))
}
