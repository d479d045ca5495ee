//! Glyph rasterization for legend labels.
//!
//! Text is drawn with `fontdue` from a TrueType font: the configured file first, then the
//! usual system sans-serif fonts. Without any of them a built-in 5x7 bitmap face is used,
//! which folds accents and lowercase onto the uppercase ASCII glyphs.

use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::color::Color;

#[cfg(target_os = "linux")]
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

#[cfg(target_os = "macos")]
const SYSTEM_FONTS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
];

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const SYSTEM_FONTS: &[&str] = &[];

#[derive(Clone)]
enum Face {
    TrueType(Arc<Font>),
    Bitmap { scale: u32 },
}

/// Draws single lines of text onto RGBA images.
#[derive(Clone)]
pub struct TextRenderer {
    face: Face,
    size: f32,
}

impl fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let face = match &self.face {
            Face::TrueType(_) => "truetype",
            Face::Bitmap { .. } => "bitmap",
        };
        f.debug_struct("TextRenderer").field("face", &face).field("size", &self.size).finish()
    }
}

impl TextRenderer {
    /// Load `path` when given, else the first readable system font, else the bitmap face.
    pub fn load(path: Option<&Path>, size: f32) -> Self {
        let candidates = path
            .into_iter()
            .map(Path::to_path_buf)
            .chain(SYSTEM_FONTS.iter().map(|p| Path::new(p).to_path_buf()));
        for candidate in candidates {
            let Ok(data) = std::fs::read(&candidate) else {
                if Some(candidate.as_path()) == path {
                    log::warn!("Cannot read font {}, trying system fonts", candidate.display());
                }
                continue;
            };
            match Font::from_bytes(data, FontSettings::default()) {
                Ok(font) => {
                    log::debug!("Legend font: {}", candidate.display());
                    return Self { face: Face::TrueType(Arc::new(font)), size };
                }
                Err(e) => log::warn!("Invalid font {}: {}", candidate.display(), e),
            }
        }
        log::debug!("No TrueType font found, using the bitmap face");
        Self::bitmap(size)
    }

    /// The built-in face, independent of installed fonts.
    pub fn bitmap(size: f32) -> Self {
        let scale = (size / 8.0).floor().max(1.0) as u32;
        Self { face: Face::Bitmap { scale }, size }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Pixel width of `text` and the ascent and descent of the line.
    pub fn measure(&self, text: &str) -> (u32, u32, u32) {
        match &self.face {
            Face::TrueType(font) => {
                let width: f32 = text.chars().map(|c| font.metrics(c, self.size).advance_width).sum();
                let (ascent, descent) = font
                    .horizontal_line_metrics(self.size)
                    .map(|m| (m.ascent, -m.descent))
                    .unwrap_or((self.size, 0.0));
                (width.ceil() as u32, ascent.ceil() as u32, descent.ceil().max(0.0) as u32)
            }
            Face::Bitmap { scale } => {
                let n = text.chars().count() as u32;
                (n * GLYPH_ADVANCE * scale, GLYPH_ROWS * scale, 0)
            }
        }
    }

    /// Draw `text` with its left edge at `x` and its baseline at `baseline`.
    pub fn draw(&self, img: &mut RgbaImage, x: i32, baseline: i32, text: &str, color: Color) {
        match &self.face {
            Face::TrueType(font) => {
                let mut pen = x as f32;
                for ch in text.chars() {
                    let (metrics, coverage) = font.rasterize(ch, self.size);
                    let left = pen.round() as i32 + metrics.xmin;
                    let top = baseline - metrics.height as i32 - metrics.ymin;
                    if metrics.width > 0 {
                        for (row, line) in coverage.chunks(metrics.width).enumerate() {
                            for (col, &alpha) in line.iter().enumerate() {
                                blend(img, left + col as i32, top + row as i32, color, alpha);
                            }
                        }
                    }
                    pen += metrics.advance_width;
                }
            }
            Face::Bitmap { scale } => {
                let scale = *scale as i32;
                let top = baseline - GLYPH_ROWS as i32 * scale;
                for (i, ch) in text.chars().enumerate() {
                    let left = x + i as i32 * GLYPH_ADVANCE as i32 * scale;
                    let Some(rows) = glyph(ch) else { continue };
                    for (r, bits) in rows.iter().enumerate() {
                        for c in 0..5 {
                            if *bits & (0x10u8 >> c) == 0 {
                                continue;
                            }
                            for dy in 0..scale {
                                for dx in 0..scale {
                                    let px = left + c * scale + dx;
                                    let py = top + r as i32 * scale + dy;
                                    blend(img, px, py, color, 255);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// `text` on a transparent image just large enough to hold the line.
    pub fn render_line(&self, text: &str, color: Color) -> RgbaImage {
        let (width, ascent, descent) = self.measure(text);
        let mut img = RgbaImage::from_pixel(width.max(1), (ascent + descent).max(1), Rgba([0, 0, 0, 0]));
        self.draw(&mut img, 0, ascent as i32, text, color);
        img
    }
}

fn blend(img: &mut RgbaImage, x: i32, y: i32, color: Color, coverage: u8) {
    if coverage == 0 || x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
        return;
    }
    let [sr, sg, sb, sa] = color.0;
    let alpha = coverage as u32 * sa as u32 / 255;
    let dst = img.get_pixel_mut(x as u32, y as u32);
    let [r, g, b, a] = dst.0;
    if a == 0 {
        *dst = Rgba([sr, sg, sb, alpha as u8]);
        return;
    }
    let mix = |src: u8, dst: u8| ((src as u32 * alpha + dst as u32 * (255 - alpha)) / 255) as u8;
    let out_a = (alpha + a as u32 * (255 - alpha) / 255) as u8;
    *dst = Rgba([mix(sr, r), mix(sg, g), mix(sb, b), out_a]);
}

const GLYPH_ROWS: u32 = 7;
const GLYPH_ADVANCE: u32 = 6;

/// Rows of the 5x7 face, most significant of the low five bits leftmost.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let ch = match ch {
        'á' | 'à' | 'â' | 'ã' | 'Á' | 'À' | 'Â' | 'Ã' => 'A',
        'é' | 'ê' | 'É' | 'Ê' => 'E',
        'í' | 'Í' => 'I',
        'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' | 'Õ' => 'O',
        'ú' | 'ü' | 'Ú' => 'U',
        'ç' | 'Ç' => 'C',
        c => c.to_ascii_uppercase(),
    };
    let rows = match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '%' => [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inked(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn test_bitmap_measure() {
        let text = TextRenderer::bitmap(16.0);
        assert_eq!(text.measure("900"), (36, 14, 0));
        assert_eq!(text.measure(""), (0, 14, 0));
    }

    #[test]
    fn test_bitmap_folds_accents_and_case() {
        assert_eq!(glyph('ç'), glyph('C'));
        assert_eq!(glyph('ã'), glyph('A'));
        assert_eq!(glyph('e'), glyph('E'));
        assert_eq!(glyph('~'), None);
    }

    #[test]
    fn test_render_line_inks_only_glyphs() {
        let text = TextRenderer::bitmap(8.0);
        let img = text.render_line("1 1", Color::BLACK);
        assert_eq!(img.dimensions(), (18, 7));
        // '1' has 10 set cells; the space draws nothing
        assert_eq!(inked(&img), 20);
        assert!((0..7).all(|y| img.get_pixel(8, y).0[3] == 0));
    }

    #[test]
    fn test_draw_clips_at_image_edges() {
        let text = TextRenderer::bitmap(8.0);
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        text.draw(&mut img, -2, 5, "88", Color::BLACK);
        assert!(img.pixels().any(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_load_falls_back_without_fonts() {
        let text = TextRenderer::load(Some(Path::new("/nonexistent/font.ttf")), 12.0);
        let (width, ascent, _) = text.measure("10");
        assert!(width > 0 && ascent > 0);
        assert!(inked(&text.render_line("10", Color::BLACK)) > 0);
    }
}
