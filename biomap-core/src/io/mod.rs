//! Readers for the on-disk data directory.
//!
//! ```text
//! <root>/biomass/<prefix>.csv[.gz] + <prefix>.json
//! <root>/map_files/geometry/<region_type>.json
//! <root>/map_files/bbox.json
//! <root>/static_units_files/<prefix>.csv[.gz] + <prefix>.json
//! <root>/dynamic_units_files/<prefix>.csv[.gz] + <prefix>.json
//! ```

pub mod dataset;
pub mod geometry;
pub mod units;

pub use dataset::{list_datasets, load_dataset};
pub use geometry::{load_bounding_boxes, load_geometry_index, read_bounding_boxes, read_regions};
pub use units::{list_units, load_dynamic_units, load_static_units};

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{BiomapError, BiomapResult};

/// Paths inside a data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn biomass_dir(&self) -> PathBuf {
        self.root.join("biomass")
    }

    pub fn geometry_dir(&self) -> PathBuf {
        self.root.join("map_files").join("geometry")
    }

    pub fn bbox_path(&self) -> PathBuf {
        self.root.join("map_files").join("bbox.json")
    }

    pub fn static_units_dir(&self) -> PathBuf {
        self.root.join("static_units_files")
    }

    pub fn dynamic_units_dir(&self) -> PathBuf {
        self.root.join("dynamic_units_files")
    }
}

/// `<dir>/<prefix>.csv`, falling back to `<dir>/<prefix>.csv.gz`.
pub fn table_path(dir: &Path, prefix: &str) -> BiomapResult<PathBuf> {
    let plain = dir.join(format!("{}.csv", prefix));
    if plain.is_file() {
        return Ok(plain);
    }
    let gz = dir.join(format!("{}.csv.gz", prefix));
    if gz.is_file() {
        return Ok(gz);
    }
    Err(BiomapError::FileNotFound { path: plain })
}

/// Open a table for reading, decompressing `.gz` files transparently.
pub fn open_table(path: &Path) -> BiomapResult<Box<dyn Read>> {
    use flate2::read::GzDecoder;

    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => BiomapError::FileNotFound { path: path.to_path_buf() },
        _ => BiomapError::Io(e),
    })?;
    let is_gz = path.extension().map(|ext| ext == "gz").unwrap_or(false);
    if is_gz {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Parse a JSON file, naming the file in any error.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> BiomapResult<T> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => BiomapError::FileNotFound { path: path.to_path_buf() },
        _ => BiomapError::Io(e),
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| BiomapError::parse(path.display().to_string(), e.to_string()))
}

/// Prefixes of `<prefix>.json` metadata files in `dir`, sorted.
pub(crate) fn list_prefixes(dir: &Path) -> BiomapResult<Vec<String>> {
    let mut prefixes = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|ext| ext == "json").unwrap_or(false) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prefixes.push(stem.to_string());
            }
        }
    }
    prefixes.sort();
    Ok(prefixes)
}
