//! BioMap Core Library
//!
//! Domain types, scale derivation, region geometry and data loaders for BioMap.

pub mod error;
pub mod types;
pub mod dataset;
pub mod units;
pub mod scale;
pub mod geometry;
pub mod io;

// Re-export commonly used types and functions
pub use error::{BiomapError, BiomapResult};
pub use types::{RegionCode, RegionFilter, ScaleKind, StateCode, NATIONWIDE, STATE_CODES};
pub use dataset::{Dataset, DatasetMeta, PassThrough, ValueRecord};
pub use units::{DynamicUnitSpec, StaticUnitSpec, UnitKind, UnitRecord, UnitSource, UnitTable};
pub use scale::{ScaleBoundaries, ScaleBuilder, ScaleMode};
pub use geometry::{BoundingBox, BoundingBoxTable, Geometry, PlacedValue, Region, RegionGeometryIndex, RegionMap};
pub use io::DataLayout;

/// Version information for the BioMap core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
