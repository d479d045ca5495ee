//! Point markers for unit tables.
//!
//! Static layers draw every unit with the configured color. Dynamic layers color each unit
//! by its coefficient on a discretized scale that is recomputed for the active selection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use biomap_core::scale::DEFAULT_BUCKETS;
use biomap_core::{
    BiomapError, BiomapResult, RegionFilter, ScaleBoundaries, ScaleBuilder, StateCode, UnitKind,
    UnitSource,
};

use crate::color::Color;
use crate::colormap::Colormap;
use crate::surface::{Canvas, ElementId, MarkerShape};

pub const Z_STATIC: u8 = 2;
pub const Z_DYNAMIC: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub static_size: f32,
    pub dynamic_size: f32,
    pub bucket_count: usize,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            static_size: 8.0,
            dynamic_size: 8.0,
            bucket_count: DEFAULT_BUCKETS,
        }
    }
}

#[derive(Debug, Clone)]
enum MarkerPaint {
    Static { color: Color },
    Dynamic { colormap: Colormap, builder: ScaleBuilder, scale: ScaleBoundaries },
}

#[derive(Debug, Clone)]
struct Marker {
    state: StateCode,
    coefficient: Option<f64>,
    element: ElementId,
}

/// What a layer contributes to the legend area.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerLegend<'a> {
    Key { label: &'a str, color: Color, marker: MarkerShape },
    Colorbar { label: &'a str, unit: &'a str, colormap: &'a Colormap, scale: &'a ScaleBoundaries },
}

#[derive(Debug, Clone)]
pub struct MarkerLayer {
    key: String,
    label: String,
    unit: String,
    shape: MarkerShape,
    paint: MarkerPaint,
    markers: BTreeMap<String, Marker>,
    by_state: BTreeMap<StateCode, Vec<String>>,
    has_own_legend: bool,
    enabled: bool,
}

impl MarkerLayer {
    pub fn build<C: Canvas>(canvas: &mut C, source: &UnitSource, style: &MarkerStyle) -> BiomapResult<Self> {
        let shape = MarkerShape::from_code(source.kind.marker())?;
        let (paint, unit, size, z_order) = match &source.kind {
            UnitKind::Static(spec) => {
                let color = Color::parse(&spec.color)?;
                (MarkerPaint::Static { color }, String::new(), style.static_size, Z_STATIC)
            }
            UnitKind::Dynamic(spec) => {
                let colormap = Colormap::by_name(&spec.colormap)?;
                let builder = ScaleBuilder::discretized(style.bucket_count).with_context(&source.key);
                let all = source.table.coefficients_in(&RegionFilter::Nationwide);
                let scale = builder.compute(&all)?;
                (
                    MarkerPaint::Dynamic { colormap, builder, scale },
                    spec.unit.clone(),
                    style.dynamic_size,
                    Z_DYNAMIC,
                )
            }
        };

        let mut markers = BTreeMap::new();
        let mut by_state: BTreeMap<StateCode, Vec<String>> = BTreeMap::new();
        for record in source.table.records() {
            let color = paint_color(&paint, record.coefficient);
            let element = canvas.draw_point(record.lon, record.lat, color, shape, size, z_order);
            let marker = Marker { state: record.state.clone(), coefficient: record.coefficient, element };
            if markers.insert(record.name.clone(), marker).is_some() {
                return Err(BiomapError::duplicate_record(&source.key, &record.name));
            }
            by_state.entry(record.state.clone()).or_default().push(record.name.clone());
        }

        log::debug!("Marker layer '{}': {} markers", source.key, markers.len());
        Ok(Self {
            key: source.key.clone(),
            label: source.kind.category().to_string(),
            unit,
            shape,
            paint,
            markers,
            by_state,
            has_own_legend: source.has_own_legend,
            enabled: true,
        })
    }

    /// Apply `visible` to the markers inside `filter` and hide the rest.
    ///
    /// Dynamic layers first rescale over the coefficients inside `filter`, falling back to
    /// the whole table when the selection has none, and recolor every marker, hidden ones
    /// included.
    pub fn set_visibility<C: Canvas>(
        &mut self,
        canvas: &mut C,
        visible: bool,
        filter: &RegionFilter,
    ) -> BiomapResult<()> {
        if let MarkerPaint::Dynamic { builder, scale, .. } = &mut self.paint {
            let subset: Vec<f64> = self
                .markers
                .values()
                .filter(|m| filter.matches(&m.state))
                .filter_map(|m| m.coefficient)
                .collect();
            let global: Vec<f64> = self.markers.values().filter_map(|m| m.coefficient).collect();
            *scale = builder.compute_or_global(&subset, &global)?;
            for marker in self.markers.values() {
                canvas.set_color(marker.element, paint_color(&self.paint, marker.coefficient));
            }
        }
        for marker in self.markers.values() {
            canvas.set_visible(marker.element, visible && filter.matches(&marker.state));
        }
        Ok(())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.paint, MarkerPaint::Dynamic { .. })
    }

    pub fn scale(&self) -> Option<&ScaleBoundaries> {
        match &self.paint {
            MarkerPaint::Dynamic { scale, .. } => Some(scale),
            MarkerPaint::Static { .. } => None,
        }
    }

    pub fn has_own_legend(&self) -> bool {
        self.has_own_legend
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn marker(&self, name: &str) -> Option<ElementId> {
        self.markers.get(name).map(|m| m.element)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn elements_of(&self, state: &StateCode) -> Vec<ElementId> {
        self.by_state
            .get(state)
            .map(|names| names.iter().filter_map(|n| self.marker(n)).collect())
            .unwrap_or_default()
    }

    pub fn legend(&self) -> LayerLegend<'_> {
        match &self.paint {
            MarkerPaint::Static { color } => LayerLegend::Key { label: &self.label, color: *color, marker: self.shape },
            MarkerPaint::Dynamic { colormap, scale, .. } => LayerLegend::Colorbar {
                label: &self.label,
                unit: &self.unit,
                colormap,
                scale,
            },
        }
    }
}

fn paint_color(paint: &MarkerPaint, coefficient: Option<f64>) -> Color {
    match paint {
        MarkerPaint::Static { color } => *color,
        MarkerPaint::Dynamic { colormap, scale, .. } => {
            colormap.sample(scale.normalize(coefficient.unwrap_or(0.0)))
        }
    }
}
