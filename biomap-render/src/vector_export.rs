/*!
# Vector Export

SVG output of the map surface and of a labelled colorbar, with an optional footer
carrying the data source and generation time.
*/

use std::fs::File;
use std::io::Write;
use std::path::Path;

use biomap_core::{BiomapResult, ScaleBoundaries};

use crate::colormap::Colormap;
use crate::legend::tick_position;
use crate::raster::Viewport;
use crate::surface::{MarkerPath, RenderSurface, Shape};

/// Export configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub width: u32,
    pub height: u32,
    pub aspect: f64,
    pub show_title: bool,
    pub show_footer: bool,
    pub background_color: String,
    pub font_family: String,
    pub font_size: u32,
    pub provenance_comment: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 720,
            aspect: 0.9,
            show_title: true,
            show_footer: true,
            background_color: "#ffffff".to_string(),
            font_family: "Arial, sans-serif".to_string(),
            font_size: 12,
            provenance_comment: None,
        }
    }
}

/// Vector export system
pub struct VectorExporter {
    config: ExportConfig,
}

impl VectorExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// SVG document of the visible surface elements in paint order.
    pub fn map_svg(&self, surface: &RenderSurface, source: Option<&str>) -> String {
        let mut svg = SvgBuilder::new(&self.config, self.config.width, self.config.height);
        svg.add_background();
        if let Some(comment) = &self.config.provenance_comment {
            svg.add_comment(comment);
        }
        if let Some(view) = surface.view() {
            let viewport = Viewport::fit(&view, self.config.width, self.config.height, self.config.aspect);
            svg.render_elements(surface, &viewport);
        }
        if self.config.show_title {
            if let Some(title) = surface.title() {
                svg.add_title(title);
            }
        }
        if self.config.show_footer {
            svg.add_footer(source);
        }
        svg.finish()
    }

    /// Vertical colorbar with tick labels and an optional axis label.
    pub fn colorbar_svg(&self, colormap: &Colormap, scale: &ScaleBoundaries, label: Option<&str>) -> String {
        let (bar_w, bar_h, margin) = (24.0, 300.0, 20.0);
        let width = (margin * 2.0 + bar_w + 90.0) as u32;
        let height = (margin * 2.0 + bar_h) as u32;
        let mut svg = SvgBuilder::new(&self.config, width, height);
        svg.add_background();
        svg.add_colorbar(colormap, scale, margin, margin, bar_w, bar_h);
        if let Some(label) = label {
            svg.elements.push(format!(
                r#"<text x="{}" y="{}" font-family="{}" font-size="{}px" text-anchor="middle" transform="rotate(-90 {} {})">{}</text>"#,
                width as f32 - 8.0,
                margin + bar_h / 2.0,
                self.config.font_family,
                self.config.font_size,
                width as f32 - 8.0,
                margin + bar_h / 2.0,
                escape(label)
            ));
        }
        svg.finish()
    }

    pub fn export_map<P: AsRef<Path>>(&self, path: P, surface: &RenderSurface, source: Option<&str>) -> BiomapResult<()> {
        write_to_file(path, &self.map_svg(surface, source))
    }

    pub fn export_colorbar<P: AsRef<Path>>(
        &self,
        path: P,
        colormap: &Colormap,
        scale: &ScaleBoundaries,
        label: Option<&str>,
    ) -> BiomapResult<()> {
        write_to_file(path, &self.colorbar_svg(colormap, scale, label))
    }
}

struct SvgBuilder {
    config: ExportConfig,
    elements: Vec<String>,
    width: f32,
    height: f32,
    top_comments: Vec<String>,
}

impl SvgBuilder {
    fn new(config: &ExportConfig, width: u32, height: u32) -> Self {
        Self {
            config: config.clone(),
            elements: Vec::new(),
            width: width as f32,
            height: height as f32,
            top_comments: Vec::new(),
        }
    }

    fn add_background(&mut self) {
        self.elements.push(format!(
            r#"<rect width="{}" height="{}" fill="{}"/>"#,
            self.width, self.height, self.config.background_color
        ));
    }

    fn add_comment(&mut self, text: &str) {
        self.top_comments.push(text.to_string());
    }

    fn add_title(&mut self, title: &str) {
        let title_y = self.config.font_size as f32 + 10.0;
        self.elements.push(format!(
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}px" text-anchor="middle" font-weight="bold">{}</text>"#,
            self.width / 2.0, title_y, self.config.font_family, self.config.font_size + 4, escape(title)
        ));
    }

    fn render_elements(&mut self, surface: &RenderSurface, viewport: &Viewport) {
        for element in surface.paint_order().into_iter().filter(|e| e.visible) {
            let (fill, opacity) = element.color.to_svg();
            match &element.shape {
                Shape::Polygon { parts, edge } => {
                    let stroke = match edge {
                        Some(edge) => {
                            let (color, stroke_opacity) = edge.color.to_svg();
                            format!(
                                r#" stroke="{}" stroke-opacity="{:.3}" stroke-width="{}""#,
                                color, stroke_opacity, edge.width
                            )
                        }
                        None => String::from(r#" stroke="none""#),
                    };
                    self.elements.push(format!(
                        r#"<path d="{}" fill="{}" fill-opacity="{:.3}" fill-rule="evenodd"{}/>"#,
                        path_data(parts, viewport, true), fill, opacity, stroke
                    ));
                }
                Shape::Line { parts, width } => {
                    self.elements.push(format!(
                        r#"<path d="{}" fill="none" stroke="{}" stroke-opacity="{:.3}" stroke-width="{}"/>"#,
                        path_data(parts, viewport, false), fill, opacity, width
                    ));
                }
                Shape::Point { x, y, marker, size } => {
                    let [cx, cy] = viewport.world_to_pixel(*x, *y);
                    match marker.path(cx, cy, *size as f64) {
                        MarkerPath::Filled(outline) => self.elements.push(format!(
                            r#"<path d="{}" fill="{}" fill-opacity="{:.3}"/>"#,
                            pixel_path(&[outline], true), fill, opacity
                        )),
                        MarkerPath::Stroked(segments) => {
                            let lines: Vec<Vec<[f64; 2]>> = segments.iter().map(|s| s.to_vec()).collect();
                            self.elements.push(format!(
                                r#"<path d="{}" fill="none" stroke="{}" stroke-opacity="{:.3}" stroke-width="2"/>"#,
                                pixel_path(&lines, false), fill, opacity
                            ));
                        }
                    }
                }
            }
        }
    }

    fn add_colorbar(&mut self, colormap: &Colormap, scale: &ScaleBoundaries, x: f32, y: f32, w: f32, h: f32) {
        let bands = match scale {
            ScaleBoundaries::Discrete { edges } => edges.len().saturating_sub(1).max(1),
            ScaleBoundaries::Continuous { .. } => 64,
        };
        let band_h = h / bands as f32;
        for i in 0..bands {
            // Band 0 sits at the bottom
            let t = if bands == 1 { 0.5 } else { i as f64 / (bands - 1) as f64 };
            let t = match scale {
                ScaleBoundaries::Discrete { .. } => t,
                ScaleBoundaries::Continuous { .. } => (i as f64 + 0.5) / bands as f64,
            };
            let (fill, _) = colormap.sample(t).to_svg();
            let top = y + h - (i + 1) as f32 * band_h;
            self.elements.push(format!(
                r#"<rect x="{}" y="{:.2}" width="{}" height="{:.2}" fill="{}" stroke="none"/>"#,
                x, top, w, band_h + 0.5, fill
            ));
        }
        self.elements.push(format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="black" stroke-width="1"/>"#,
            x, y, w, h
        ));
        for value in scale.ticks(5) {
            let t = tick_position(scale, value);
            if !(0.0..=1.0).contains(&t) {
                continue;
            }
            let ty = y + h - (t as f32) * h;
            self.elements.push(format!(
                r#"<line x1="{}" y1="{:.2}" x2="{}" y2="{:.2}" stroke="black" stroke-width="1"/>"#,
                x + w, ty, x + w + 5.0, ty
            ));
            self.elements.push(format!(
                r#"<text x="{}" y="{:.2}" font-family="{}" font-size="{}px" dominant-baseline="middle">{}</text>"#,
                x + w + 8.0, ty, self.config.font_family, self.config.font_size, format_value(value)
            ));
        }
    }

    fn add_footer(&mut self, source: Option<&str>) {
        let footer_y = self.height - 10.0;
        let footer_text = match source.filter(|s| !s.is_empty()) {
            Some(source) => format!(
                "Fonte: {} | Generated: {}",
                source,
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => format!("Generated: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")),
        };

        self.elements.push(format!(
            r#"<text x="10" y="{}" font-family="{}" font-size="{}px" fill="gray">{}</text>"#,
            footer_y, self.config.font_family, self.config.font_size.saturating_sub(2), escape(&footer_text)
        ));
    }

    fn finish(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            "<svg width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
            self.width, self.height, self.width, self.height
        ));
        for c in &self.top_comments {
            for line in c.lines() {
                out.push_str(&format!("  <!-- {} -->\n", line));
            }
        }
        for element in &self.elements {
            out.push_str("  ");
            out.push_str(element);
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }
}

fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> BiomapResult<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn path_data(parts: &[Vec<[f64; 2]>], viewport: &Viewport, closed: bool) -> String {
    let px: Vec<Vec<[f64; 2]>> = parts
        .iter()
        .map(|ring| ring.iter().map(|p| viewport.world_to_pixel(p[0], p[1])).collect())
        .collect();
    pixel_path(&px, closed)
}

fn pixel_path(parts: &[Vec<[f64; 2]>], closed: bool) -> String {
    let mut d = String::new();
    for ring in parts.iter().filter(|r| !r.is_empty()) {
        for (i, p) in ring.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            d.push_str(&format!("{}{:.2} {:.2} ", cmd, p[0], p[1]));
        }
        if closed {
            d.push_str("Z ");
        }
    }
    d.trim_end().to_string()
}

// Compact tick label: thousands get a k/M suffix, small values keep decimals
pub(crate) fn format_value(v: f64) -> String {
    let a = v.abs();
    if a >= 1e6 {
        format!("{}M", trim_zeros(v / 1e6))
    } else if a >= 1e4 {
        format!("{}k", trim_zeros(v / 1e3))
    } else {
        trim_zeros(v)
    }
}

fn trim_zeros(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
