//! Biomass datasets: one metadata record plus the produced quantity per region.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BiomapError, BiomapResult};
use crate::types::{RegionCode, ScaleKind};

/// Conversion factor carried through from the metadata file untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PassThrough {
    Number(f64),
    Text(String),
}

impl Default for PassThrough {
    fn default() -> Self {
        PassThrough::Text(String::new())
    }
}

impl fmt::Display for PassThrough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassThrough::Number(n) => write!(f, "{}", n),
            PassThrough::Text(s) => f.write_str(s),
        }
    }
}

/// Metadata paired with a dataset table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    #[serde(rename = "nome_biomassa")]
    pub name: String,
    #[serde(rename = "tipo_biomassa")]
    pub category: String,
    #[serde(rename = "unidade")]
    pub unit: String,
    #[serde(rename = "tipo_regiao")]
    pub region_type: String,
    #[serde(rename = "produto_derivado", default)]
    pub derived_product: String,
    #[serde(rename = "conversao_derivado", default)]
    pub derived_coefficient: PassThrough,
    #[serde(rename = "conversao_gas", default)]
    pub gas_coefficient: PassThrough,
    #[serde(rename = "fonte", default)]
    pub source: String,
    #[serde(rename = "norm", default)]
    pub scale_kind: ScaleKind,
    #[serde(rename = "obs", default)]
    pub notes: String,
}

/// One row of a dataset table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRecord {
    pub region_code: RegionCode,
    pub quantity: f64,
    pub year: Option<i32>,
}

/// A loaded dataset. Immutable once built; a dataset switch replaces it wholesale.
#[derive(Debug, Clone)]
pub struct Dataset {
    key: String,
    meta: DatasetMeta,
    records: Vec<ValueRecord>,
}

impl Dataset {
    /// Build a dataset, dropping rows whose quantity is not positive.
    pub fn new<K: Into<String>>(key: K, meta: DatasetMeta, records: Vec<ValueRecord>) -> Self {
        let key = key.into();
        let total = records.len();
        let records: Vec<ValueRecord> = records
            .into_iter()
            .filter(|r| r.quantity.is_finite() && r.quantity > 0.0)
            .collect();
        if records.len() < total {
            log::debug!(
                "Dataset '{}': dropped {} non-positive rows",
                key,
                total - records.len()
            );
        }
        Self { key, meta, records }
    }

    /// Dataset with no values, drawn as the bare state map.
    pub fn empty() -> Self {
        let meta = DatasetMeta {
            name: String::new(),
            category: String::new(),
            unit: String::new(),
            region_type: "uf".to_string(),
            derived_product: String::new(),
            derived_coefficient: PassThrough::default(),
            gas_coefficient: PassThrough::default(),
            source: String::new(),
            scale_kind: ScaleKind::Linear,
            notes: String::new(),
        };
        Self {
            key: "mapa_vazio".to_string(),
            meta,
            records: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn meta(&self) -> &DatasetMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn source(&self) -> &str {
        &self.meta.source
    }

    pub fn notes(&self) -> &str {
        &self.meta.notes
    }

    pub fn scale_kind(&self) -> ScaleKind {
        self.meta.scale_kind
    }

    pub fn region_type(&self) -> &str {
        &self.meta.region_type
    }

    pub fn records(&self) -> &[ValueRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn quantities(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.quantity).collect()
    }

    /// The single value recorded for a region.
    ///
    /// Each region must carry exactly one value per dataset; more than one is a
    /// `MultipleMatch` error rather than an aggregation.
    pub fn value_for(&self, code: RegionCode) -> BiomapResult<f64> {
        let mut matches = self.records.iter().filter(|r| r.region_code == code);
        match (matches.next(), matches.next()) {
            (Some(record), None) => Ok(record.quantity),
            (None, _) => Err(BiomapError::unknown_region(format!(
                "{} in dataset '{}'",
                code, self.key
            ))),
            (Some(_), Some(_)) => {
                let count = self.records.iter().filter(|r| r.region_code == code).count();
                Err(BiomapError::multiple_match(&self.key, code, count))
            }
        }
    }

    /// Fail on the first region code carried by more than one record.
    pub fn check_unique_regions(&self) -> BiomapResult<()> {
        let mut seen = std::collections::HashMap::new();
        for record in &self.records {
            *seen.entry(record.region_code).or_insert(0usize) += 1;
        }
        let mut duplicated: Vec<_> = seen.into_iter().filter(|(_, n)| *n > 1).collect();
        duplicated.sort_unstable();
        match duplicated.first() {
            Some(&(code, count)) => Err(BiomapError::multiple_match(&self.key, code, count)),
            None => Ok(()),
        }
    }
}
