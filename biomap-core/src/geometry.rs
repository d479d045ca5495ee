//! Region polygons and bounding boxes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use crate::dataset::Dataset;
use crate::error::{BiomapError, BiomapResult};
use crate::types::{RegionCode, RegionFilter, StateCode, NATIONWIDE, STATE_CODES};

/// Granularity name of the state-level geometry source.
pub const STATE_REGION_TYPE: &str = "uf";

/// Boundary rings of one region. Disjoint parts are drawn as a single fill.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "[Vec<Option<f64>>; 2]")]
pub struct Geometry {
    parts: Vec<Vec<[f64; 2]>>,
}

impl Geometry {
    pub fn new(parts: Vec<Vec<[f64; 2]>>) -> Self {
        let parts = parts.into_iter().filter(|p| !p.is_empty()).collect();
        Self { parts }
    }

    /// Axis-aligned rectangle, convenient for fixtures.
    pub fn rectangle(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self::new(vec![vec![
            [xmin, ymin],
            [xmax, ymin],
            [xmax, ymax],
            [xmin, ymax],
            [xmin, ymin],
        ]])
    }

    pub fn parts(&self) -> &[Vec<[f64; 2]>] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &[f64; 2]> {
        self.parts.iter().flatten()
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut points = self.points();
        let first = points.next()?;
        let mut bbox = BoundingBox { min: *first, max: *first };
        for p in points {
            bbox.include(*p);
        }
        Some(bbox)
    }
}

impl TryFrom<[Vec<Option<f64>>; 2]> for Geometry {
    type Error = String;

    fn try_from([xs, ys]: [Vec<Option<f64>>; 2]) -> Result<Self, Self::Error> {
        if xs.len() != ys.len() {
            return Err(format!(
                "coordinate arrays differ in length ({} x, {} y)",
                xs.len(),
                ys.len()
            ));
        }
        let mut parts = Vec::new();
        let mut current = Vec::new();
        for (x, y) in xs.into_iter().zip(ys) {
            match (x, y) {
                (Some(x), Some(y)) => current.push([x, y]),
                (None, None) => parts.push(std::mem::take(&mut current)),
                _ => return Err("part separator must be null in both coordinate arrays".into()),
            }
        }
        parts.push(current);
        Ok(Geometry::new(parts))
    }
}

/// A geographic unit at either granularity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Region {
    #[serde(rename = "cod_ibge")]
    pub code: RegionCode,
    #[serde(rename = "uf")]
    pub state: StateCode,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "macro", default)]
    pub macro_region: Option<String>,
    pub geometry: Geometry,
}

/// Rectangular extent `[[xmin, ymin], [xmax, ymax]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct BoundingBox {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }

    pub fn include(&mut self, p: [f64; 2]) {
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
    }

    pub fn union(mut self, other: &BoundingBox) -> BoundingBox {
        self.include(other.min);
        self.include(other.max);
        self
    }
}

impl From<[[f64; 2]; 2]> for BoundingBox {
    fn from([min, max]: [[f64; 2]; 2]) -> Self {
        Self { min, max }
    }
}

impl From<BoundingBox> for [[f64; 2]; 2] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.min, bbox.max]
    }
}

/// View extents per selector ("Brasil" and each state code). Loaded once, read-only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct BoundingBoxTable(HashMap<String, BoundingBox>);

impl BoundingBoxTable {
    pub fn new(entries: HashMap<String, BoundingBox>) -> Self {
        Self(entries)
    }

    /// Derive the table from state geometry when no bbox file is available.
    pub fn from_states(index: &RegionGeometryIndex) -> Self {
        let mut entries = HashMap::new();
        let mut country: Option<BoundingBox> = None;
        for region in index.states() {
            if let Some(bbox) = region.geometry.bounds() {
                entries.insert(region.state.to_string(), bbox);
                country = Some(match country {
                    Some(c) => c.union(&bbox),
                    None => bbox,
                });
            }
        }
        if let Some(country) = country {
            entries.insert(NATIONWIDE.to_string(), country);
        }
        Self(entries)
    }

    pub fn get(&self, filter: &RegionFilter) -> BiomapResult<BoundingBox> {
        self.0
            .get(filter.key())
            .copied()
            .ok_or_else(|| BiomapError::unknown_region(format!("{} (no bounding box)", filter.key())))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A value record joined with its region.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedValue {
    pub code: RegionCode,
    pub state: StateCode,
    pub value: f64,
}

/// Regions of one granularity keyed by code.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    region_type: String,
    regions: BTreeMap<RegionCode, Region>,
}

impl RegionMap {
    /// Index `regions`, rejecting a code that appears twice.
    pub fn new<S: Into<String>>(region_type: S, regions: Vec<Region>) -> BiomapResult<Self> {
        let region_type = region_type.into();
        let mut map = BTreeMap::new();
        for region in regions {
            let code = region.code;
            if map.insert(code, region).is_some() {
                return Err(BiomapError::duplicate_record(&region_type, code.to_string()));
            }
        }
        Ok(Self { region_type, regions: map })
    }

    pub fn region_type(&self) -> &str {
        &self.region_type
    }

    pub fn get(&self, code: RegionCode) -> Option<&Region> {
        self.regions.get(&code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Join every record of `dataset` with its region.
    ///
    /// Fails on a record whose code has no geometry, or on a code carried twice.
    pub fn resolve(&self, dataset: &Dataset) -> BiomapResult<Vec<PlacedValue>> {
        dataset.check_unique_regions()?;
        dataset
            .records()
            .iter()
            .map(|record| {
                let region = self
                    .get(record.region_code)
                    .ok_or_else(|| BiomapError::geometry_not_found(dataset.key(), record.region_code))?;
                Ok(PlacedValue {
                    code: record.region_code,
                    state: region.state.clone(),
                    value: record.quantity,
                })
            })
            .collect()
    }
}

/// Geometry for the 27 states plus lazily loaded finer granularities.
#[derive(Debug, Clone)]
pub struct RegionGeometryIndex {
    states: Vec<Region>,
    granularities: HashMap<String, RegionMap>,
    source_dir: Option<PathBuf>,
}

impl RegionGeometryIndex {
    /// Build from state polygons. Every one of the 27 states must be present exactly once.
    pub fn new(states: Vec<Region>) -> BiomapResult<Self> {
        let mut seen = HashSet::new();
        for region in &states {
            if !seen.insert(region.state.clone()) {
                return Err(BiomapError::duplicate_record(
                    STATE_REGION_TYPE,
                    region.state.to_string(),
                ));
            }
        }
        if let Some(missing) = STATE_CODES.iter().find(|c| !seen.iter().any(|s| s.as_str() == **c)) {
            return Err(BiomapError::geometry_not_found(STATE_REGION_TYPE, missing));
        }

        let mut ordered = states;
        ordered.sort_by_key(|r| STATE_CODES.iter().position(|c| *c == r.state.as_str()));

        let state_map = RegionMap::new(STATE_REGION_TYPE, ordered.clone())?;
        let mut granularities = HashMap::new();
        granularities.insert(STATE_REGION_TYPE.to_string(), state_map);

        log::debug!("Indexed geometry for {} states", ordered.len());
        Ok(Self { states: ordered, granularities, source_dir: None })
    }

    /// Directory holding `<region_type>.json` files for [`load`](Self::load).
    pub fn with_source_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    /// State regions in drawing order.
    pub fn states(&self) -> &[Region] {
        &self.states
    }

    pub fn load_states(&self) -> BTreeMap<StateCode, &Region> {
        self.states.iter().map(|r| (r.state.clone(), r)).collect()
    }

    pub fn state(&self, code: &StateCode) -> Option<&Region> {
        self.states.iter().find(|r| &r.state == code)
    }

    /// Register regions of a granularity, replacing any previous entry.
    pub fn insert_regions<S: Into<String>>(
        &mut self,
        region_type: S,
        regions: Vec<Region>,
    ) -> BiomapResult<()> {
        let map = RegionMap::new(region_type, regions)?;
        log::debug!("Indexed {} regions of type '{}'", map.len(), map.region_type());
        self.granularities.insert(map.region_type().to_string(), map);
        Ok(())
    }

    pub fn regions(&self, region_type: &str) -> Option<&RegionMap> {
        self.granularities.get(region_type)
    }

    /// Regions of `region_type`, reading them from the source directory on first use.
    pub fn load(&mut self, region_type: &str) -> BiomapResult<&RegionMap> {
        if !self.granularities.contains_key(region_type) {
            let dir = self
                .source_dir
                .clone()
                .ok_or_else(|| BiomapError::missing_granularity(region_type))?;
            let regions = crate::io::geometry::read_regions(&dir.join(format!("{}.json", region_type)))?;
            self.insert_regions(region_type, regions)?;
        }
        self.granularities
            .get(region_type)
            .ok_or_else(|| BiomapError::missing_granularity(region_type))
    }
}
