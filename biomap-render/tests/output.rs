mod common;

use biomap_core::{RegionFilter, ScaleBuilder};
use biomap_render::{
    Colormap, ExportConfig, LegendRasterizer, MapController, MapStyle, TextRenderer, VectorExporter,
};
use common::*;
use image::Rgba;

fn controller() -> MapController {
    let index = geometry();
    let boxes = bboxes(&index);
    MapController::new(index, boxes, MapStyle::default(), cana(), units()).unwrap()
}

#[test]
fn figure_and_legends_are_deterministic() {
    let mut first = controller();
    let mut second = controller();
    first.select_region(RegionFilter::State(state("SP"))).unwrap();
    second.select_region(RegionFilter::State(state("SP"))).unwrap();

    assert_eq!(first.figure(), second.figure());
    assert_eq!(first.colorbar(), second.colorbar());
    assert_eq!(first.unit_legends(), second.unit_legends());
}

#[test]
fn figure_has_configured_size_and_colored_selection() {
    let mut ctl = controller();
    ctl.select_region(RegionFilter::State(state("SP"))).unwrap();
    let style = ctl.style().figure.clone();
    let img = ctl.figure();
    assert_eq!(img.dimensions(), (style.width, style.height));
    let painted = img.pixels().filter(|p| **p != Rgba([255, 255, 255, 255])).count();
    assert!(painted > 0);
}

#[test]
fn colorbar_carries_tick_labels_and_caption() {
    let legend = LegendRasterizer::default().with_text(TextRenderer::bitmap(8.0));
    let config = legend.config().clone();
    let scale = ScaleBuilder::discretized(5).compute(&[14257.0]).unwrap();
    let colormap = Colormap::by_name("Oranges").unwrap();
    let bare = legend.render(&colormap, &scale, None);
    let captioned = legend.render(&colormap, &scale, Some("Produção de Cana (ton)"));

    // End tick labels overhang the bar by half a glyph each way
    assert_eq!(bare.height(), config.height - 2 * config.margin + 6);
    assert!(bare.width() > config.bar_width + config.tick_length + config.label_gap);
    assert!(captioned.width() > bare.width());
    // Top-left corner of the bar frame
    assert_eq!(*bare.get_pixel(0, 3), Rgba([0, 0, 0, 255]));
}

#[test]
fn controller_colorbar_is_labelled() {
    let ctl = controller();
    let config = ctl.style().legend.clone();
    let colorbar = ctl.colorbar().unwrap();
    assert!(colorbar.width() > config.bar_width + config.tick_length + config.label_gap);
    // The static key's swatch is #1f77b4, so dark pixels come from its label
    let key = &ctl.unit_legends()["usinas"];
    assert!(key.pixels().any(|p| p.0[..3].iter().all(|&c| c < 128)));
}

#[test]
fn svg_without_footer_is_stable() {
    let ctl = controller();
    let exporter = VectorExporter::new(ExportConfig { show_footer: false, ..ctl.style().export_config() });
    let a = exporter.map_svg(ctl.surface(), Some(ctl.source()));
    let b = exporter.map_svg(ctl.surface(), Some(ctl.source()));
    assert_eq!(a, b);
    assert!(a.starts_with("<svg") || a.starts_with("<?xml"));
    assert!(a.contains("Produção de Cana"));
    assert!(!a.contains("Generated:"));
}

#[test]
fn svg_footer_names_the_source() {
    let ctl = controller();
    let exporter = VectorExporter::new(ctl.style().export_config());
    let svg = exporter.map_svg(ctl.surface(), Some(ctl.source()));
    assert!(svg.contains("Fonte: IBGE (Cana)"));
}

#[test]
fn svg_files_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let ctl = controller();
    let exporter = VectorExporter::new(ctl.style().export_config());
    let map_path = dir.path().join("mapa.svg");
    let bar_path = dir.path().join("colorbar.svg");
    exporter.export_map(&map_path, ctl.surface(), Some(ctl.source())).unwrap();
    exporter
        .export_colorbar(&bar_path, ctl.choropleth().colormap(), ctl.choropleth().scale(), Some("ton"))
        .unwrap();
    assert!(std::fs::read_to_string(map_path).unwrap().contains("</svg>"));
    assert!(std::fs::read_to_string(bar_path).unwrap().contains("ton"));
}
