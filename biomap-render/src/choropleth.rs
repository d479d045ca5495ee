//! State base polygons, outlines and per-region value fills.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use biomap_core::{
    BiomapError, BiomapResult, Dataset, RegionCode, RegionFilter, RegionGeometryIndex,
    ScaleBoundaries, StateCode,
};

use crate::color::Color;
use crate::colormap::Colormap;
use crate::surface::{Canvas, ElementId, Stroke};

pub const Z_FILL: u8 = 1;
pub const Z_OUTLINE: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoroplethStyle {
    pub colormap: String,
    pub edge_color: Color,
    pub edge_width: f32,
    pub outline_color: Color,
    pub outline_width: f32,
}

impl Default for ChoroplethStyle {
    fn default() -> Self {
        Self {
            colormap: "Oranges".to_string(),
            edge_color: Color::GREY,
            edge_width: 0.1,
            outline_color: Color::BLACK,
            outline_width: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
struct ValueFill {
    state: StateCode,
    value: f64,
    element: ElementId,
}

/// Handles for everything the choropleth drew on the current surface.
#[derive(Debug, Clone)]
pub struct ChoroplethLayer {
    dataset_key: String,
    colormap: Colormap,
    scale: ScaleBoundaries,
    base_fill: BTreeMap<StateCode, ElementId>,
    base_outline: BTreeMap<StateCode, ElementId>,
    value_fill: BTreeMap<RegionCode, ValueFill>,
    by_state: BTreeMap<StateCode, Vec<RegionCode>>,
}

impl ChoroplethLayer {
    /// Draw the 27 base polygons, one fill per value record, then the state outlines.
    ///
    /// The dataset's region type must already be loaded into `geometry`.
    pub fn build<C: Canvas>(
        canvas: &mut C,
        dataset: &Dataset,
        geometry: &RegionGeometryIndex,
        scale: ScaleBoundaries,
        colormap: Colormap,
        style: &ChoroplethStyle,
    ) -> BiomapResult<Self> {
        let placed = if dataset.is_empty() {
            Vec::new()
        } else {
            geometry
                .regions(dataset.region_type())
                .ok_or_else(|| BiomapError::missing_granularity(dataset.region_type()))?
                .resolve(dataset)?
        };

        let base_color = if dataset.is_empty() || scale.is_logarithmic() {
            Color::WHITE
        } else {
            colormap.sample(0.0)
        };

        let mut base_fill = BTreeMap::new();
        for state in geometry.states() {
            let id = canvas.draw_polygon(state.geometry.parts(), base_color, None, Z_FILL);
            base_fill.insert(state.state.clone(), id);
        }

        let edge = Stroke { color: style.edge_color, width: style.edge_width };
        let mut value_fill = BTreeMap::new();
        let mut by_state: BTreeMap<StateCode, Vec<RegionCode>> = BTreeMap::new();
        if let Some(regions) = geometry.regions(dataset.region_type()) {
            for placed in placed {
                // resolve() only yields codes present in the map
                let Some(region) = regions.get(placed.code) else {
                    continue;
                };
                let color = colormap.sample(scale.normalize(placed.value));
                let element = canvas.draw_polygon(region.geometry.parts(), color, Some(edge), Z_FILL);
                by_state.entry(placed.state.clone()).or_default().push(placed.code);
                value_fill.insert(
                    placed.code,
                    ValueFill { state: placed.state, value: placed.value, element },
                );
            }
        }

        let mut base_outline = BTreeMap::new();
        for state in geometry.states() {
            let rings = closed_rings(state.geometry.parts());
            let id = canvas.draw_line(&rings, style.outline_color, style.outline_width, Z_OUTLINE);
            base_outline.insert(state.state.clone(), id);
        }

        log::debug!(
            "Choropleth for '{}': {} base polygons, {} value polygons",
            dataset.key(),
            base_fill.len(),
            value_fill.len()
        );
        Ok(Self {
            dataset_key: dataset.key().to_string(),
            colormap,
            scale,
            base_fill,
            base_outline,
            value_fill,
            by_state,
        })
    }

    /// Show or hide the base fill, outline and value polygons of the filtered states.
    pub fn set_region_visibility<C: Canvas>(&self, canvas: &mut C, filter: &RegionFilter, visible: bool) {
        for (state, id) in self.base_fill.iter().chain(self.base_outline.iter()) {
            if filter.matches(state) {
                canvas.set_visible(*id, visible);
            }
        }
        for (state, codes) in &self.by_state {
            if !filter.matches(state) {
                continue;
            }
            for code in codes {
                if let Some(fill) = self.value_fill.get(code) {
                    canvas.set_visible(fill.element, visible);
                }
            }
        }
    }

    /// Recolor the value polygons inside `filter` under `scale`. Geometry is untouched.
    ///
    /// Values are looked up again in `dataset`, so a region carried by two records is a
    /// `MultipleMatch` error.
    pub fn recolor<C: Canvas>(
        &mut self,
        canvas: &mut C,
        dataset: &Dataset,
        scale: ScaleBoundaries,
        filter: &RegionFilter,
    ) -> BiomapResult<()> {
        let codes: Vec<RegionCode> = match filter {
            RegionFilter::Nationwide => self.value_fill.keys().copied().collect(),
            RegionFilter::State(state) => self.by_state.get(state).cloned().unwrap_or_default(),
        };
        let mut colors = Vec::with_capacity(codes.len());
        for code in codes {
            let value = dataset.value_for(code)?;
            if let Some(fill) = self.value_fill.get(&code) {
                colors.push((fill.element, self.colormap.sample(scale.normalize(value))));
            }
        }
        for (element, color) in colors {
            canvas.set_color(element, color);
        }
        log::debug!(
            "Recolored '{}' polygons for {} on [{}, {}]",
            self.dataset_key,
            filter,
            scale.vmin(),
            scale.vmax()
        );
        self.scale = scale;
        Ok(())
    }

    /// Quantities of the value polygons inside `filter`.
    pub fn values_in(&self, filter: &RegionFilter) -> Vec<f64> {
        self.value_fill
            .values()
            .filter(|fill| filter.matches(&fill.state))
            .map(|fill| fill.value)
            .collect()
    }

    pub fn scale(&self) -> &ScaleBoundaries {
        &self.scale
    }

    pub fn colormap(&self) -> &Colormap {
        &self.colormap
    }

    pub fn base_fill(&self, state: &StateCode) -> Option<ElementId> {
        self.base_fill.get(state).copied()
    }

    pub fn base_outline(&self, state: &StateCode) -> Option<ElementId> {
        self.base_outline.get(state).copied()
    }

    pub fn value_fill(&self, code: RegionCode) -> Option<ElementId> {
        self.value_fill.get(&code).map(|fill| fill.element)
    }

    pub fn value_count(&self) -> usize {
        self.value_fill.len()
    }

    /// Every element the layer owns for `state`.
    pub fn elements_of(&self, state: &StateCode) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self.base_fill(state).into_iter().chain(self.base_outline(state)).collect();
        if let Some(codes) = self.by_state.get(state) {
            ids.extend(codes.iter().filter_map(|code| self.value_fill(*code)));
        }
        ids
    }
}

fn closed_rings(parts: &[Vec<[f64; 2]>]) -> Vec<Vec<[f64; 2]>> {
    parts
        .iter()
        .map(|ring| {
            let mut ring = ring.clone();
            if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
                if first != last {
                    ring.push(first);
                }
            }
            ring
        })
        .collect()
}
