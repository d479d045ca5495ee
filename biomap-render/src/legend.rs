//! Standalone colorbar and marker-key images.
//!
//! Each legend is drawn onto a padded canvas and then cropped: blank rows and columns are
//! stripped from every edge, leaving interior gaps in place.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use biomap_core::{BiomapError, BiomapResult, ScaleBoundaries};

use crate::color::Color;
use crate::colormap::Colormap;
use crate::raster::{draw_marker, fill_polygon, stroke_path};
use crate::surface::MarkerShape;
use crate::text::TextRenderer;
use crate::vector_export::format_value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub width: u32,
    pub height: u32,
    pub bar_width: u32,
    pub margin: u32,
    pub tick_length: u32,
    /// Space between the ticks, their labels and the caption
    pub label_gap: u32,
    pub font_size: f32,
    /// TrueType font for labels; system fonts are tried when unset or unreadable
    pub font_path: Option<PathBuf>,
    pub background: Color,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 400,
            bar_width: 30,
            margin: 40,
            tick_length: 6,
            label_gap: 4,
            font_size: 12.0,
            font_path: None,
            background: Color::WHITE,
        }
    }
}

/// One row of a marker key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEntry {
    pub label: String,
    pub color: Color,
    pub marker: MarkerShape,
    pub size: f32,
}

const KEY_ROW: u32 = 24;

#[derive(Debug, Clone)]
pub struct LegendRasterizer {
    config: LegendConfig,
    text: TextRenderer,
}

impl Default for LegendRasterizer {
    fn default() -> Self {
        Self::new(LegendConfig::default())
    }
}

impl LegendRasterizer {
    pub fn new(config: LegendConfig) -> Self {
        let text = TextRenderer::load(config.font_path.as_deref(), config.font_size);
        Self { config, text }
    }

    /// Draw labels with `text` instead of the configured font.
    pub fn with_text(mut self, text: TextRenderer) -> Self {
        self.text = text;
        self
    }

    pub fn config(&self) -> &LegendConfig {
        &self.config
    }

    /// Vertical colorbar for `scale` with tick values and an optional caption, trimmed.
    pub fn render(&self, colormap: &Colormap, scale: &ScaleBoundaries, caption: Option<&str>) -> RgbaImage {
        trim_whitespace(&self.draw_colorbar(colormap, scale, caption))
    }

    /// Marker swatches stacked vertically, each followed by its label, trimmed.
    pub fn render_key(&self, entries: &[KeyEntry]) -> RgbaImage {
        let cfg = &self.config;
        let label_x = cfg.margin + KEY_ROW + cfg.label_gap;
        let label_w = entries.iter().map(|e| self.text.measure(&e.label).0).max().unwrap_or(0);
        let width = cfg.width.max(label_x + label_w + cfg.margin);
        let height = (2 * cfg.margin + KEY_ROW * entries.len() as u32).max(1);
        let mut img = RgbaImage::from_pixel(width, height, cfg.background.to_rgba());
        let cx = cfg.margin as f64 + KEY_ROW as f64 * 0.5;
        for (i, entry) in entries.iter().enumerate() {
            let cy = cfg.margin as f64 + (i as f64 + 0.5) * KEY_ROW as f64;
            draw_marker(&mut img, entry.marker.path(cx, cy, entry.size as f64), entry.color);
            let (_, ascent, _) = self.text.measure(&entry.label);
            let baseline = (cy + ascent as f64 * 0.5).round() as i32;
            self.text.draw(&mut img, label_x as i32, baseline, &entry.label, Color::BLACK);
        }
        trim_whitespace(&img)
    }

    fn draw_colorbar(&self, colormap: &Colormap, scale: &ScaleBoundaries, caption: Option<&str>) -> RgbaImage {
        let cfg = &self.config;
        let ticks: Vec<(f64, String)> = scale
            .ticks(5)
            .into_iter()
            .filter(|&v| (0.0..=1.0).contains(&tick_position(scale, v)))
            .map(|v| (v, format_value(v)))
            .collect();
        let label_w = ticks.iter().map(|(_, s)| self.text.measure(s).0).max().unwrap_or(0);
        let caption = caption
            .filter(|c| !c.is_empty())
            .map(|c| image::imageops::rotate270(&self.text.render_line(c, Color::BLACK)));

        let labels_x = cfg.margin + cfg.bar_width + cfg.tick_length + cfg.label_gap;
        let caption_x = labels_x + label_w + cfg.label_gap;
        let caption_w = caption.as_ref().map_or(0, |c| c.width());
        let caption_h = caption.as_ref().map_or(0, |c| c.height());
        let width = cfg.width.max(caption_x + caption_w + cfg.margin);
        let height = cfg.height.max(caption_h + 2 * cfg.margin);
        let mut img = RgbaImage::from_pixel(width.max(1), height.max(1), cfg.background.to_rgba());

        let x0 = cfg.margin as f64;
        let x1 = x0 + cfg.bar_width as f64;
        let top = cfg.margin as f64;
        let bar_h = cfg.height.saturating_sub(2 * cfg.margin).max(2) as f64;
        let bottom = top + bar_h;

        // One band per pixel row; t runs from 1 at the top to 0 at the bottom
        for row in 0..bar_h as u32 {
            let t = 1.0 - (row as f64 + 0.5) / bar_h;
            let color = match scale {
                ScaleBoundaries::Discrete { .. } => {
                    let value = scale.vmin() + t * (scale.vmax() - scale.vmin());
                    colormap.sample(scale.normalize(value))
                }
                ScaleBoundaries::Continuous { .. } => colormap.sample(t),
            };
            let y = top + row as f64;
            fill_polygon(&mut img, &[vec![[x0, y], [x1, y], [x1, y + 1.0], [x0, y + 1.0]]], color);
        }

        let frame = [[x0, top], [x1 - 1.0, top], [x1 - 1.0, bottom - 1.0], [x0, bottom - 1.0]];
        stroke_path(&mut img, &frame, true, Color::BLACK, 1.0);

        for (value, label) in &ticks {
            let t = tick_position(scale, *value);
            let y = (bottom - 1.0 - t * (bar_h - 1.0)).round();
            let tick = [[x1 - 1.0, y], [x1 - 1.0 + cfg.tick_length as f64, y]];
            stroke_path(&mut img, &tick, false, Color::BLACK, 1.0);
            let (_, ascent, _) = self.text.measure(label);
            let baseline = (y + ascent as f64 * 0.5).round() as i32;
            self.text.draw(&mut img, labels_x as i32, baseline, label, Color::BLACK);
        }

        if let Some(caption) = caption {
            let y = (top + (bar_h - caption_h as f64) * 0.5).max(0.0) as i64;
            image::imageops::overlay(&mut img, &caption, caption_x as i64, y);
        }
        img
    }
}

/// Position of a tick along the bar in `[0, 1]`.
pub fn tick_position(scale: &ScaleBoundaries, value: f64) -> f64 {
    match scale {
        ScaleBoundaries::Discrete { .. } => {
            let span = scale.vmax() - scale.vmin();
            if span <= 0.0 {
                0.0
            } else {
                (value - scale.vmin()) / span
            }
        }
        ScaleBoundaries::Continuous { .. } => scale.normalize(value),
    }
}

fn is_blank(px: &Rgba<u8>) -> bool {
    px.0 == [255, 255, 255, 255]
}

fn is_clear(px: &Rgba<u8>) -> bool {
    px.0[3] == 0
}

/// Length of the blank runs at the start and end of `0..len`.
///
/// Fails with `EmptyBlankRun` when neither edge is blank. When every line is blank the
/// whole range is reported as the leading run.
fn edge_runs(len: u32, axis: &'static str, blank: impl Fn(u32) -> bool) -> BiomapResult<(u32, u32)> {
    let mut lead = 0;
    while lead < len && blank(lead) {
        lead += 1;
    }
    let mut trail = 0;
    while trail < len - lead && blank(len - 1 - trail) {
        trail += 1;
    }
    if lead == 0 && trail == 0 {
        return Err(BiomapError::EmptyBlankRun { axis });
    }
    Ok((lead, trail))
}

fn line_is_blank(img: &RgbaImage, fixed: u32, along_rows: bool) -> bool {
    let len = if along_rows { img.width() } else { img.height() };
    let px = |i: u32| if along_rows { img.get_pixel(i, fixed) } else { img.get_pixel(fixed, i) };
    (0..len).all(|i| is_blank(px(i))) || (0..len).all(|i| is_clear(px(i)))
}

/// Strip blank rows, then blank columns, from each edge of `img`.
///
/// A line is blank when every pixel is opaque white or every pixel is fully transparent.
/// Without a blank run at either edge of an axis, or when the whole image is blank, that
/// axis is left as it is.
pub fn trim_whitespace(img: &RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }

    let rows = match edge_runs(h, "row", |y| line_is_blank(img, y, true)) {
        Ok((lead, _)) if lead == h => {
            log::debug!("Legend image is entirely blank, leaving it untrimmed");
            return img.clone();
        }
        Ok((lead, trail)) => (lead, h - lead - trail),
        Err(e) => {
            log::warn!("{}, leaving axis untrimmed", e);
            (0, h)
        }
    };
    let cols = match edge_runs(w, "column", |x| {
        (rows.0..rows.0 + rows.1).all(|y| is_blank(img.get_pixel(x, y)))
            || (rows.0..rows.0 + rows.1).all(|y| is_clear(img.get_pixel(x, y)))
    }) {
        Ok((lead, trail)) => (lead, w - lead - trail),
        Err(e) => {
            log::warn!("{}, leaving axis untrimmed", e);
            (0, w)
        }
    };

    if rows == (0, h) && cols == (0, w) {
        return img.clone();
    }
    image::imageops::crop_imm(img, cols.0, rows.0, cols.1, rows.1).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn test_trim_keeps_interior_gaps() {
        let mut img = white(10, 10);
        for x in 2..8 {
            img.put_pixel(x, 3, Rgba([0, 0, 0, 255]));
            img.put_pixel(x, 6, Rgba([0, 0, 0, 255]));
        }
        let out = trim_whitespace(&img);
        assert_eq!(out.dimensions(), (6, 4));
        // Rows 4 and 5 of the original stay as an interior gap
        assert_eq!(out.get_pixel(0, 1).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_trim_without_blank_edges_is_identity() {
        let mut img = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        assert_eq!(trim_whitespace(&img), img);
    }

    #[test]
    fn test_trim_all_blank_is_identity() {
        let img = white(5, 5);
        assert_eq!(trim_whitespace(&img), img);
        let clear = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));
        assert_eq!(trim_whitespace(&clear), clear);
    }

    #[test]
    fn test_trim_transparent_border() {
        let mut img = RgbaImage::from_pixel(6, 6, Rgba([0, 0, 0, 0]));
        img.put_pixel(2, 2, Rgba([200, 0, 0, 255]));
        img.put_pixel(3, 4, Rgba([200, 0, 0, 255]));
        assert_eq!(trim_whitespace(&img).dimensions(), (2, 3));
    }

    #[test]
    fn test_edge_runs_reports_missing_run() {
        assert!(matches!(edge_runs(4, "row", |_| false), Err(BiomapError::EmptyBlankRun { axis: "row" })));
        assert_eq!(edge_runs(5, "row", |i| i == 0 || i == 4).unwrap(), (1, 1));
    }

    fn bitmap_legend() -> LegendRasterizer {
        LegendRasterizer::default().with_text(TextRenderer::bitmap(8.0))
    }

    fn quarters() -> ScaleBoundaries {
        ScaleBoundaries::Discrete { edges: vec![0.0, 250.0, 500.0, 750.0, 1000.0] }
    }

    fn has_ink(img: &RgbaImage, xs: std::ops::Range<u32>) -> bool {
        xs.into_iter().any(|x| (0..img.height()).any(|y| img.get_pixel(x, y).0 == [0, 0, 0, 255]))
    }

    #[test]
    fn test_colorbar_is_cropped_to_bar_ticks_and_labels() {
        let legend = bitmap_legend();
        let img = legend.render(&Colormap::by_name("Oranges").unwrap(), &quarters(), None);
        let cfg = legend.config();
        // 7px labels centered on the end ticks overhang the bar by 3 rows at each end
        assert_eq!(img.height(), cfg.height - 2 * cfg.margin + 6);
        // Bar, tick, gap, then "1000" at 6px per glyph with a 5px last glyph
        assert_eq!(img.width(), cfg.bar_width + cfg.tick_length + cfg.label_gap + 23);
        assert_eq!(img.get_pixel(0, 3).0, [0, 0, 0, 255]);
        let labels_from = cfg.bar_width + cfg.tick_length;
        assert!(has_ink(&img, labels_from..img.width()));
    }

    #[test]
    fn test_colorbar_caption_sits_right_of_labels() {
        let legend = bitmap_legend();
        let colormap = Colormap::by_name("Oranges").unwrap();
        let bare = legend.render(&colormap, &quarters(), None);
        let captioned = legend.render(&colormap, &quarters(), Some("Produção de Cana (t)"));
        assert_eq!(captioned.height(), bare.height());
        assert!(captioned.width() > bare.width() + legend.config().label_gap);
        assert!(has_ink(&captioned, bare.width()..captioned.width()));
        // An empty caption draws nothing
        assert_eq!(legend.render(&colormap, &quarters(), Some("")), bare);
    }

    #[test]
    fn test_colorbar_caption_longer_than_bar_grows_canvas() {
        let legend = LegendRasterizer::new(LegendConfig { height: 100, margin: 10, ..LegendConfig::default() })
            .with_text(TextRenderer::bitmap(8.0));
        let long = "X".repeat(30);
        let img = legend.render(&Colormap::by_name("Greens").unwrap(), &quarters(), Some(long.as_str()));
        // Rotated caption is 30 glyphs of 6px, the last one 5px wide
        assert_eq!(img.height(), 179);
    }

    #[test]
    fn test_key_has_one_swatch_and_label_per_entry() {
        let legend = bitmap_legend();
        let entries = vec![
            KeyEntry { label: "Usina".into(), color: Color::GREY, marker: MarkerShape::Square, size: 10.0 },
            KeyEntry { label: "Silo".into(), color: Color::GREY, marker: MarkerShape::Square, size: 10.0 },
        ];
        let img = legend.render_key(&entries);
        assert!(img.height() > KEY_ROW && img.height() < 2 * KEY_ROW);
        assert!(img.width() > KEY_ROW);
        // Swatches are grey; labels are the only black ink
        assert!(has_ink(&img, 11..img.width()));
        assert!(!has_ink(&img, 0..11));
    }
}
