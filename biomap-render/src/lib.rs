/*!
# BioMap Rendering

Map-state and color-normalization engine: the figure surface, the choropleth and marker
layers drawn on it, colorbar legends, and the controller that keeps them consistent as the
selected region or dataset changes.

Rasterization runs on the CPU into an `image::RgbaImage`; the same surface can be written
out as SVG.
*/

use serde::{Deserialize, Serialize};

pub mod color;
pub mod colormap;
pub mod surface;
pub mod raster;
pub mod choropleth;
pub mod markers;
pub mod text;
pub mod legend;
pub mod controller;
pub mod vector_export;

#[cfg(test)]
mod testutil;

pub use color::Color;
pub use colormap::Colormap;
pub use surface::{Canvas, ElementId, FigureStyle, MarkerShape, RenderSurface, Shape, Stroke, VisualElement};
pub use raster::Viewport;
pub use choropleth::{ChoroplethLayer, ChoroplethStyle};
pub use markers::{LayerLegend, MarkerLayer, MarkerStyle};
pub use text::TextRenderer;
pub use legend::{trim_whitespace, KeyEntry, LegendConfig, LegendRasterizer};
pub use controller::MapController;
pub use vector_export::{ExportConfig, VectorExporter};

/// Shared render style for CLI and library callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapStyle {
    pub figure: FigureStyle,
    pub choropleth: ChoroplethStyle,
    pub markers: MarkerStyle,
    pub legend: LegendConfig,
}

impl MapStyle {
    /// SVG export settings matching the raster figure.
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            width: self.figure.width,
            height: self.figure.height,
            aspect: self.figure.aspect,
            background_color: self.figure.background.to_hex(),
            ..ExportConfig::default()
        }
    }
}
