//! Point-unit tables: processing units, storage sites, consumption centers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{BiomapError, BiomapResult};
use crate::types::{RegionFilter, StateCode};

/// One unit location. `coefficient` is only present for value-driven tables.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRecord {
    pub name: String,
    pub state: StateCode,
    pub lat: f64,
    pub lon: f64,
    pub coefficient: Option<f64>,
}

/// Records of one unit table, with names unique within the table.
#[derive(Debug, Clone)]
pub struct UnitTable {
    name: String,
    records: Vec<UnitRecord>,
}

impl UnitTable {
    /// Build a table, rejecting duplicate record names.
    pub fn new<S: Into<String>>(name: S, records: Vec<UnitRecord>) -> BiomapResult<Self> {
        let name = name.into();
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.name.as_str()) {
                return Err(BiomapError::duplicate_record(&name, &record.name));
            }
        }
        Ok(Self { name, records })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[UnitRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Coefficients of the records inside `filter`, records without one skipped.
    pub fn coefficients_in(&self, filter: &RegionFilter) -> Vec<f64> {
        self.records
            .iter()
            .filter(|r| filter.matches(&r.state))
            .filter_map(|r| r.coefficient)
            .collect()
    }
}

/// Fixed marker appearance for a static table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticUnitSpec {
    #[serde(rename = "tipo_unidade")]
    pub category: String,
    pub marker: String,
    pub color: String,
}

/// Marker appearance for a value-driven table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicUnitSpec {
    #[serde(rename = "tipo_unidade")]
    pub category: String,
    #[serde(rename = "unidade")]
    pub unit: String,
    pub marker: String,
    #[serde(rename = "cmap")]
    pub colormap: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitKind {
    Static(StaticUnitSpec),
    Dynamic(DynamicUnitSpec),
}

impl UnitKind {
    pub fn category(&self) -> &str {
        match self {
            UnitKind::Static(spec) => &spec.category,
            UnitKind::Dynamic(spec) => &spec.category,
        }
    }

    pub fn marker(&self) -> &str {
        match self {
            UnitKind::Static(spec) => &spec.marker,
            UnitKind::Dynamic(spec) => &spec.marker,
        }
    }
}

/// A unit table together with how it is drawn.
#[derive(Debug, Clone)]
pub struct UnitSource {
    pub key: String,
    pub kind: UnitKind,
    pub table: UnitTable,
    pub has_own_legend: bool,
}
