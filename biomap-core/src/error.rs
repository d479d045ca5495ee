//! Error taxonomy for BioMap
//!
//! All failures here are local data-integrity problems. None of them are retried; the
//! operation that hit them is aborted and the message names the offending dataset or region.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for BioMap operations
#[derive(Error, Debug)]
pub enum BiomapError {
    #[error("Invalid scale for {context}: {message}")]
    InvalidScale { context: String, message: String },

    #[error("Geometry not found in dataset '{dataset}': region {region_code}")]
    GeometryNotFound { dataset: String, region_code: String },

    #[error("Multiple records for region {region_code} in dataset '{dataset}' ({count} matches)")]
    MultipleMatch {
        dataset: String,
        region_code: u64,
        count: usize,
    },

    #[error("No blank {axis} run at the image edges")]
    EmptyBlankRun { axis: &'static str },

    #[error("Duplicate record '{name}' in table '{table}'")]
    DuplicateRecord { table: String, name: String },

    #[error("Unknown region: {region}")]
    UnknownRegion { region: String },

    #[error("Unknown unit layer: {key}")]
    UnknownLayer { key: String },

    #[error("Unknown colormap: {name}")]
    UnknownColormap { name: String },

    #[error("Invalid color: {value}")]
    InvalidColor { value: String },

    #[error("Invalid marker: {value}")]
    InvalidMarker { value: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Parsing error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl BiomapError {
    pub fn invalid_scale<C: Into<String>, M: Into<String>>(context: C, message: M) -> Self {
        Self::InvalidScale {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn geometry_not_found<D: Into<String>, R: ToString>(dataset: D, region_code: R) -> Self {
        Self::GeometryNotFound {
            dataset: dataset.into(),
            region_code: region_code.to_string(),
        }
    }

    pub fn multiple_match<D: Into<String>>(dataset: D, region_code: u64, count: usize) -> Self {
        Self::MultipleMatch {
            dataset: dataset.into(),
            region_code,
            count,
        }
    }

    pub fn duplicate_record<T: Into<String>, N: Into<String>>(table: T, name: N) -> Self {
        Self::DuplicateRecord {
            table: table.into(),
            name: name.into(),
        }
    }

    pub fn unknown_region<S: Into<String>>(region: S) -> Self {
        Self::UnknownRegion { region: region.into() }
    }

    /// No geometry is loaded for `region_type` and there is no file to read it from.
    pub fn missing_granularity(region_type: &str) -> Self {
        Self::FileNotFound { path: PathBuf::from(format!("{}.json", region_type)) }
    }

    pub fn parse<F: Into<String>, M: Into<String>>(file: F, message: M) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }
}

/// Result type for BioMap operations
pub type BiomapResult<T> = Result<T, BiomapError>;
