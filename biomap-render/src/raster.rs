//! CPU rasterization of a [`RenderSurface`] into an RGBA buffer.

use image::{Rgba, RgbaImage};

use biomap_core::BoundingBox;

use crate::color::Color;
use crate::surface::{FigureStyle, MarkerPath, RenderSurface, Shape};

/// World extent mapped onto a pixel grid, y growing upward in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Fit `bbox` into a `width` x `height` image, centered, with `aspect` pixels of y per
    /// pixel of x per world unit.
    pub fn fit(bbox: &BoundingBox, width: u32, height: u32, aspect: f64) -> Self {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        let w = bbox.width().max(1e-9);
        let h = bbox.height().max(1e-9);
        let scale = (width as f64 / w).min(height as f64 / (h * aspect));
        let half_x = width as f64 / scale * 0.5;
        let half_y = height as f64 / (scale * aspect) * 0.5;
        let [cx, cy] = bbox.center();
        Self {
            x_min: cx - half_x,
            x_max: cx + half_x,
            y_min: cy - half_y,
            y_max: cy + half_y,
            width,
            height,
        }
    }

    pub fn world_to_pixel(&self, world_x: f64, world_y: f64) -> [f64; 2] {
        let px = (world_x - self.x_min) / (self.x_max - self.x_min) * self.width as f64;
        let norm = (world_y - self.y_min) / (self.y_max - self.y_min);
        // Invert Y so that larger values are higher on the canvas
        [px, (1.0 - norm) * self.height as f64]
    }
}

/// Paint every visible element of `surface` in z-order onto a fresh buffer.
pub fn rasterize(surface: &RenderSurface, style: &FigureStyle) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(style.width, style.height, style.background.to_rgba());
    let Some(view) = surface.view() else {
        return img;
    };
    let viewport = Viewport::fit(&view, style.width, style.height, style.aspect);
    let to_px = |parts: &[Vec<[f64; 2]>]| -> Vec<Vec<[f64; 2]>> {
        parts
            .iter()
            .map(|ring| ring.iter().map(|p| viewport.world_to_pixel(p[0], p[1])).collect())
            .collect()
    };

    for element in surface.paint_order().into_iter().filter(|e| e.visible) {
        match &element.shape {
            Shape::Polygon { parts, edge } => {
                let px = to_px(parts);
                fill_polygon(&mut img, &px, element.color);
                if let Some(edge) = edge {
                    for ring in &px {
                        stroke_path(&mut img, ring, true, edge.color, edge.width);
                    }
                }
            }
            Shape::Line { parts, width } => {
                for ring in to_px(parts) {
                    stroke_path(&mut img, &ring, false, element.color, *width);
                }
            }
            Shape::Point { x, y, marker, size } => {
                let [cx, cy] = viewport.world_to_pixel(*x, *y);
                draw_marker(&mut img, marker.path(cx, cy, *size as f64), element.color);
            }
        }
    }
    img
}

/// Even-odd scanline fill over all rings, sampling pixel centers.
pub fn fill_polygon(img: &mut RgbaImage, rings: &[Vec<[f64; 2]>], color: Color) {
    if color.is_transparent() {
        return;
    }
    let (mut y_lo, mut y_hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in rings.iter().flatten() {
        y_lo = y_lo.min(p[1]);
        y_hi = y_hi.max(p[1]);
    }
    if !(y_lo <= y_hi) {
        return;
    }
    let row_start = ((y_lo - 0.5).ceil().max(0.0)) as u32;
    let row_end = ((y_hi - 0.5).floor().min(img.height() as f64 - 1.0)).max(-1.0);
    if row_end < 0.0 {
        return;
    }

    let mut crossings = Vec::new();
    for row in row_start..=row_end as u32 {
        let yc = row as f64 + 0.5;
        crossings.clear();
        for ring in rings.iter().filter(|r| r.len() >= 3) {
            for i in 0..ring.len() {
                let a = ring[i];
                let b = ring[(i + 1) % ring.len()];
                if (a[1] <= yc) != (b[1] <= yc) {
                    crossings.push(a[0] + (yc - a[1]) * (b[0] - a[0]) / (b[1] - a[1]));
                }
            }
        }
        crossings.sort_by(f64::total_cmp);
        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().max(0.0);
            let end = ((span[1] - 0.5).ceil() - 1.0).min(img.width() as f64 - 1.0);
            if end < start {
                continue;
            }
            for x in start as u32..=end as u32 {
                blend(img, x as i64, row as i64, color);
            }
        }
    }
}

/// Stroke a polyline. Widths under one pixel are drawn as a hairline with reduced alpha.
pub fn stroke_path(img: &mut RgbaImage, points: &[[f64; 2]], closed: bool, color: Color, width: f32) {
    if points.len() < 2 || color.is_transparent() || width <= 0.0 {
        return;
    }
    let color = if width < 1.0 {
        color.with_alpha((color.alpha() as f32 * width).round().max(1.0) as u8)
    } else {
        color
    };
    let radius = ((width - 1.0) * 0.5).round().max(0.0) as i64;
    let mut segments: Vec<([f64; 2], [f64; 2])> = points.windows(2).map(|w| (w[0], w[1])).collect();
    if closed && points.first() != points.last() {
        if let (Some(last), Some(first)) = (points.last(), points.first()) {
            segments.push((*last, *first));
        }
    }
    for (a, b) in segments {
        draw_line(img, a[0] as i64, a[1] as i64, b[0] as i64, b[1] as i64, color, radius);
    }
}

fn draw_line(img: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Color, radius: i64) {
    // Bresenham line drawing
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        for oy in -radius..=radius {
            for ox in -radius..=radius {
                blend(img, x0 + ox, y0 + oy, color);
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

pub fn draw_marker(img: &mut RgbaImage, path: MarkerPath, color: Color) {
    match path {
        MarkerPath::Filled(outline) => fill_polygon(img, &[outline], color),
        MarkerPath::Stroked(segments) => {
            for [a, b] in segments {
                stroke_path(img, &[a, b], false, color, 2.0);
            }
        }
    }
}

/// Source-over blend of `color` onto one pixel; out-of-bounds coordinates are ignored.
fn blend(img: &mut RgbaImage, x: i64, y: i64, color: Color) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let Color([r, g, b, a]) = color;
    if a == 255 {
        img.put_pixel(x as u32, y as u32, Rgba([r, g, b, 255]));
        return;
    }
    let dst = img.get_pixel(x as u32, y as u32).0;
    let sa = a as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }
    let mix = |s: u8, d: u8| ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round() as u8;
    img.put_pixel(
        x as u32,
        y as u32,
        Rgba([mix(r, dst[0]), mix(g, dst[1]), mix(b, dst[2]), (out_a * 255.0).round() as u8]),
    );
}
