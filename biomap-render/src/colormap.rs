//! Sequential colormaps sampled by a normalized value.

use biomap_core::{BiomapError, BiomapResult};

use crate::color::Color;

const STOPS: usize = 9;

// Nine control points per map, light to dark
static COLORMAPS: [(&str, [u32; STOPS]); 9] = [
    ("Oranges", [0xfff5eb, 0xfee6ce, 0xfdd0a2, 0xfdae6b, 0xfd8d3c, 0xf16913, 0xd94801, 0xa63603, 0x7f2704]),
    ("GnBu", [0xf7fcf0, 0xe0f3db, 0xccebc5, 0xa8ddb5, 0x7bccc4, 0x4eb3d3, 0x2b8cbe, 0x0868ac, 0x084081]),
    ("Greens", [0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b]),
    ("Blues", [0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b]),
    ("Reds", [0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d]),
    ("Purples", [0xfcfbfd, 0xefedf5, 0xdadaeb, 0xbcbddc, 0x9e9ac8, 0x807dba, 0x6a51a3, 0x54278f, 0x3f007d]),
    ("YlOrBr", [0xffffe5, 0xfff7bc, 0xfee391, 0xfec44f, 0xfe9929, 0xec7014, 0xcc4c02, 0x993404, 0x662506]),
    ("YlGn", [0xffffe5, 0xf7fcb9, 0xd9f0a3, 0xaddd8e, 0x78c679, 0x41ab5d, 0x238443, 0x006837, 0x004529]),
    ("viridis", [0x440154, 0x472d7b, 0x3b528b, 0x2c728e, 0x21918c, 0x28ae80, 0x5ec962, 0xaddc30, 0xfde725]),
];

/// A named colormap. A `_r` suffix on the name reverses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colormap {
    name: String,
    stops: &'static [u32; STOPS],
    reversed: bool,
}

impl Colormap {
    pub fn by_name(name: &str) -> BiomapResult<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        COLORMAPS
            .iter()
            .find(|(n, _)| *n == base)
            .map(|(_, stops)| Colormap { name: name.to_string(), stops, reversed })
            .ok_or_else(|| BiomapError::UnknownColormap { name: name.to_string() })
    }

    pub fn available() -> impl Iterator<Item = &'static str> {
        COLORMAPS.iter().map(|(n, _)| *n)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color at `t` in `[0, 1]`; out-of-range input clamps and NaN samples the low end.
    pub fn sample(&self, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let t = if self.reversed { 1.0 - t } else { t };
        let pos = t * (STOPS - 1) as f64;
        let i = (pos.floor() as usize).min(STOPS - 2);
        let frac = pos - i as f64;
        let (a, b) = (unpack(self.stops[i]), unpack(self.stops[i + 1]));
        let mix = |k: usize| (a[k] as f64 + (b[k] as f64 - a[k] as f64) * frac).round() as u8;
        Color::rgb(mix(0), mix(1), mix(2))
    }
}

fn unpack(rgb: u32) -> [u8; 3] {
    [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let cmap = Colormap::by_name("Oranges").unwrap();
        assert_eq!(cmap.sample(0.0), Color::rgb(0xff, 0xf5, 0xeb));
        assert_eq!(cmap.sample(1.0), Color::rgb(0x7f, 0x27, 0x04));
        assert_eq!(cmap.sample(0.5), Color::rgb(0xfd, 0x8d, 0x3c));
        assert_eq!(cmap.sample(f64::NAN), cmap.sample(0.0));
        assert_eq!(cmap.sample(3.0), cmap.sample(1.0));
    }

    #[test]
    fn test_reversed() {
        let fwd = Colormap::by_name("GnBu").unwrap();
        let rev = Colormap::by_name("GnBu_r").unwrap();
        assert_eq!(rev.name(), "GnBu_r");
        assert_eq!(rev.sample(0.0), fwd.sample(1.0));
        assert_eq!(rev.sample(0.25), fwd.sample(0.75));
    }

    #[test]
    fn test_unknown_colormap() {
        let err = Colormap::by_name("jet").unwrap_err();
        assert!(matches!(err, BiomapError::UnknownColormap { ref name } if name == "jet"));
        assert_eq!(Colormap::available().count(), 9);
    }
}
