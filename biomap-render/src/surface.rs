//! The figure surface: an arena of drawn elements addressed by handle.
//!
//! Layers draw through the [`Canvas`] trait and keep the returned [`ElementId`]s. A
//! [`RenderSurface::rebuild`] clears the arena and bumps its generation, so handles from a
//! previous build no longer resolve.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

use biomap_core::{BiomapError, BiomapResult, BoundingBox};

use crate::color::Color;

/// Figure size and framing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureStyle {
    pub width: u32,
    pub height: u32,
    /// Display ratio of a y unit to an x unit.
    pub aspect: f64,
    pub background: Color,
}

impl Default for FigureStyle {
    fn default() -> Self {
        Self {
            width: 800,
            height: 720,
            aspect: 0.9,
            background: Color::WHITE,
        }
    }
}

/// Handle to a drawn element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    generation: u32,
    index: u32,
}

/// Point marker shapes, parsed from the usual one-character plotting codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerShape {
    Circle,
    Square,
    TriangleUp,
    TriangleDown,
    Diamond,
    ThinDiamond,
    Star,
    Plus,
    Cross,
    Point,
}

/// Pixel-space outline of a marker.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerPath {
    Filled(Vec<[f64; 2]>),
    Stroked(Vec<[[f64; 2]; 2]>),
}

impl MarkerShape {
    pub fn from_code(code: &str) -> BiomapResult<Self> {
        match code.trim() {
            "o" => Ok(MarkerShape::Circle),
            "s" => Ok(MarkerShape::Square),
            "^" => Ok(MarkerShape::TriangleUp),
            "v" => Ok(MarkerShape::TriangleDown),
            "D" => Ok(MarkerShape::Diamond),
            "d" => Ok(MarkerShape::ThinDiamond),
            "*" => Ok(MarkerShape::Star),
            "+" => Ok(MarkerShape::Plus),
            "x" => Ok(MarkerShape::Cross),
            "." => Ok(MarkerShape::Point),
            other => Err(BiomapError::InvalidMarker { value: other.to_string() }),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MarkerShape::Circle => "o",
            MarkerShape::Square => "s",
            MarkerShape::TriangleUp => "^",
            MarkerShape::TriangleDown => "v",
            MarkerShape::Diamond => "D",
            MarkerShape::ThinDiamond => "d",
            MarkerShape::Star => "*",
            MarkerShape::Plus => "+",
            MarkerShape::Cross => "x",
            MarkerShape::Point => ".",
        }
    }

    /// Outline centered on `(cx, cy)` with `size` as the nominal diameter, y pointing down.
    pub fn path(&self, cx: f64, cy: f64, size: f64) -> MarkerPath {
        let r = size * 0.5;
        let at = |pts: &[(f64, f64)]| -> Vec<[f64; 2]> {
            pts.iter().map(|(x, y)| [cx + x, cy + y]).collect()
        };
        match self {
            MarkerShape::Circle => MarkerPath::Filled(regular(cx, cy, r, 24, 0.0)),
            MarkerShape::Point => MarkerPath::Filled(regular(cx, cy, r * 0.4, 12, 0.0)),
            MarkerShape::Square => MarkerPath::Filled(at(&[(-r, -r), (r, -r), (r, r), (-r, r)])),
            MarkerShape::TriangleUp => MarkerPath::Filled(regular(cx, cy, r, 3, -PI / 2.0)),
            MarkerShape::TriangleDown => MarkerPath::Filled(regular(cx, cy, r, 3, PI / 2.0)),
            MarkerShape::Diamond => MarkerPath::Filled(at(&[(0.0, -r), (r, 0.0), (0.0, r), (-r, 0.0)])),
            MarkerShape::ThinDiamond => {
                MarkerPath::Filled(at(&[(0.0, -r), (r * 0.6, 0.0), (0.0, r), (-r * 0.6, 0.0)]))
            }
            MarkerShape::Star => {
                let pts = (0..10)
                    .map(|k| {
                        let radius = if k % 2 == 0 { r } else { r * 0.4 };
                        let angle = -PI / 2.0 + k as f64 * PI / 5.0;
                        [cx + radius * angle.cos(), cy + radius * angle.sin()]
                    })
                    .collect();
                MarkerPath::Filled(pts)
            }
            MarkerShape::Plus => MarkerPath::Stroked(vec![
                [[cx - r, cy], [cx + r, cy]],
                [[cx, cy - r], [cx, cy + r]],
            ]),
            MarkerShape::Cross => {
                let d = r * std::f64::consts::FRAC_1_SQRT_2;
                MarkerPath::Stroked(vec![
                    [[cx - d, cy - d], [cx + d, cy + d]],
                    [[cx - d, cy + d], [cx + d, cy - d]],
                ])
            }
        }
    }
}

fn regular(cx: f64, cy: f64, r: f64, sides: usize, start: f64) -> Vec<[f64; 2]> {
    (0..sides)
        .map(|k| {
            let angle = start + k as f64 * 2.0 * PI / sides as f64;
            [cx + r * angle.cos(), cy + r * angle.sin()]
        })
        .collect()
}

impl FromStr for MarkerShape {
    type Err = BiomapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkerShape::from_code(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

/// Geometry of a drawn element, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygon { parts: Vec<Vec<[f64; 2]>>, edge: Option<Stroke> },
    Line { parts: Vec<Vec<[f64; 2]>>, width: f32 },
    Point { x: f64, y: f64, marker: MarkerShape, size: f32 },
}

impl Shape {
    fn bounds(&self) -> Option<BoundingBox> {
        let mut points: Box<dyn Iterator<Item = [f64; 2]> + '_> = match self {
            Shape::Polygon { parts, .. } | Shape::Line { parts, .. } => {
                Box::new(parts.iter().flatten().copied())
            }
            Shape::Point { x, y, .. } => Box::new(std::iter::once([*x, *y])),
        };
        let first = points.next()?;
        let mut bbox = BoundingBox { min: first, max: first };
        points.for_each(|p| bbox.include(p));
        Some(bbox)
    }
}

/// A drawn artifact. Only `color` and `visible` change after drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualElement {
    pub shape: Shape,
    pub color: Color,
    pub visible: bool,
    pub z_order: u8,
}

/// Drawing capability the layers need from a figure.
pub trait Canvas {
    fn draw_polygon(
        &mut self,
        parts: &[Vec<[f64; 2]>],
        color: Color,
        edge: Option<Stroke>,
        z_order: u8,
    ) -> ElementId;

    fn draw_line(&mut self, parts: &[Vec<[f64; 2]>], color: Color, width: f32, z_order: u8) -> ElementId;

    fn draw_point(
        &mut self,
        x: f64,
        y: f64,
        color: Color,
        marker: MarkerShape,
        size: f32,
        z_order: u8,
    ) -> ElementId;

    fn set_visible(&mut self, id: ElementId, visible: bool);

    fn set_color(&mut self, id: ElementId, color: Color);
}

/// Owned figure: elements, view extent and title.
#[derive(Debug, Clone, Default)]
pub struct RenderSurface {
    generation: u32,
    elements: Vec<VisualElement>,
    view: Option<BoundingBox>,
    title: Option<String>,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every element and invalidate outstanding handles. The view is kept.
    pub fn rebuild(&mut self) {
        self.elements.clear();
        self.title = None;
        self.generation = self.generation.wrapping_add(1);
        log::debug!("Surface rebuilt (generation {})", self.generation);
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn element(&self, id: ElementId) -> Option<&VisualElement> {
        if id.generation != self.generation {
            return None;
        }
        self.elements.get(id.index as usize)
    }

    pub fn elements(&self) -> &[VisualElement] {
        &self.elements
    }

    /// Elements in paint order: ascending z-order, ties in insertion order.
    pub fn paint_order(&self) -> Vec<&VisualElement> {
        let mut ordered: Vec<&VisualElement> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.z_order);
        ordered
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn set_view(&mut self, view: BoundingBox) {
        self.view = Some(view);
    }

    /// Current view, or the extent of everything drawn when none was set.
    pub fn view(&self) -> Option<BoundingBox> {
        self.view.or_else(|| {
            self.elements
                .iter()
                .filter_map(|e| e.shape.bounds())
                .reduce(|a, b| a.union(&b))
        })
    }

    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.title = Some(title.into());
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn rasterize(&self, style: &FigureStyle) -> image::RgbaImage {
        crate::raster::rasterize(self, style)
    }

    fn push(&mut self, shape: Shape, color: Color, z_order: u8) -> ElementId {
        let index = self.elements.len() as u32;
        self.elements.push(VisualElement { shape, color, visible: true, z_order });
        ElementId { generation: self.generation, index }
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut VisualElement> {
        if id.generation != self.generation {
            log::warn!("Ignoring stale element handle from generation {}", id.generation);
            return None;
        }
        self.elements.get_mut(id.index as usize)
    }
}

impl Canvas for RenderSurface {
    fn draw_polygon(
        &mut self,
        parts: &[Vec<[f64; 2]>],
        color: Color,
        edge: Option<Stroke>,
        z_order: u8,
    ) -> ElementId {
        self.push(Shape::Polygon { parts: parts.to_vec(), edge }, color, z_order)
    }

    fn draw_line(&mut self, parts: &[Vec<[f64; 2]>], color: Color, width: f32, z_order: u8) -> ElementId {
        self.push(Shape::Line { parts: parts.to_vec(), width }, color, z_order)
    }

    fn draw_point(
        &mut self,
        x: f64,
        y: f64,
        color: Color,
        marker: MarkerShape,
        size: f32,
        z_order: u8,
    ) -> ElementId {
        self.push(Shape::Point { x, y, marker, size }, color, z_order)
    }

    fn set_visible(&mut self, id: ElementId, visible: bool) {
        if let Some(element) = self.element_mut(id) {
            element.visible = visible;
        }
    }

    fn set_color(&mut self, id: ElementId, color: Color) {
        if let Some(element) = self.element_mut(id) {
            element.color = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_go_stale_on_rebuild() {
        let mut surface = RenderSurface::new();
        let id = surface.draw_point(1.0, 2.0, Color::BLACK, MarkerShape::Circle, 6.0, 2);
        surface.set_visible(id, false);
        assert!(!surface.element(id).unwrap().visible);

        surface.rebuild();
        assert!(surface.element(id).is_none());
        let fresh = surface.draw_point(0.0, 0.0, Color::BLACK, MarkerShape::Square, 6.0, 2);
        surface.set_color(id, Color::WHITE);
        assert_eq!(surface.element(fresh).unwrap().color, Color::BLACK);
    }

    #[test]
    fn test_paint_order_is_stable_by_z() {
        let mut surface = RenderSurface::new();
        surface.draw_point(0.0, 0.0, Color::BLACK, MarkerShape::Circle, 1.0, 3);
        surface.draw_polygon(&[vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]], Color::WHITE, None, 1);
        surface.draw_point(5.0, 5.0, Color::GREY, MarkerShape::Circle, 1.0, 3);
        let z: Vec<u8> = surface.paint_order().iter().map(|e| e.z_order).collect();
        assert_eq!(z, vec![1, 3, 3]);
        assert_eq!(surface.paint_order()[2].color, Color::GREY);
        let view = surface.view().unwrap();
        assert_eq!((view.min, view.max), ([0.0, 0.0], [5.0, 5.0]));
    }

    #[test]
    fn test_marker_codes() {
        for code in ["o", "s", "^", "v", "D", "d", "*", "+", "x", "."] {
            assert_eq!(MarkerShape::from_code(code).unwrap().code(), code);
        }
        assert!(matches!("h".parse::<MarkerShape>(), Err(BiomapError::InvalidMarker { .. })));
        assert!(matches!(MarkerShape::Plus.path(0.0, 0.0, 4.0), MarkerPath::Stroked(ref s) if s.len() == 2));
    }
}
