use serde::Deserialize;
use std::path::Path;

use super::{list_prefixes, open_table, read_json, table_path};
use crate::error::{BiomapError, BiomapResult};
use crate::types::StateCode;
use crate::units::{DynamicUnitSpec, StaticUnitSpec, UnitKind, UnitRecord, UnitSource, UnitTable};

#[derive(Debug, Deserialize)]
struct UnitRow {
    nome: String,
    uf: StateCode,
    lat: f64,
    lon: f64,
    #[serde(default)]
    coef: Option<f64>,
}

fn read_unit_table(path: &Path, name: &str, require_coefficient: bool) -> BiomapResult<UnitTable> {
    let file = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(open_table(path)?);

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<UnitRow>().enumerate() {
        let row = row.map_err(|e| BiomapError::parse(&file, e.to_string()))?;
        if require_coefficient && row.coef.is_none() {
            return Err(BiomapError::parse(
                &file,
                format!("row {}: missing coef for '{}'", line + 2, row.nome),
            ));
        }
        records.push(UnitRecord {
            name: row.nome,
            state: row.uf,
            lat: row.lat,
            lon: row.lon,
            coefficient: row.coef,
        });
    }
    UnitTable::new(name, records)
}

/// Load `static_units_files/<prefix>` as a fixed-attribute marker source.
pub fn load_static_units(dir: &Path, prefix: &str, has_own_legend: bool) -> BiomapResult<UnitSource> {
    let spec: StaticUnitSpec = read_json(&dir.join(format!("{}.json", prefix)))?;
    let table = read_unit_table(&table_path(dir, prefix)?, prefix, false)?;
    log::info!("Loaded {} static units from '{}' ({})", table.len(), prefix, spec.category);
    Ok(UnitSource {
        key: prefix.to_string(),
        kind: UnitKind::Static(spec),
        table,
        has_own_legend,
    })
}

/// Load `dynamic_units_files/<prefix>` as a value-driven marker source. Every row needs a
/// `coef` value.
pub fn load_dynamic_units(dir: &Path, prefix: &str) -> BiomapResult<UnitSource> {
    let spec: DynamicUnitSpec = read_json(&dir.join(format!("{}.json", prefix)))?;
    let table = read_unit_table(&table_path(dir, prefix)?, prefix, true)?;
    log::info!("Loaded {} dynamic units from '{}' ({})", table.len(), prefix, spec.category);
    Ok(UnitSource {
        key: prefix.to_string(),
        kind: UnitKind::Dynamic(spec),
        table,
        has_own_legend: true,
    })
}

/// Unit table prefixes available in `dir`.
pub fn list_units(dir: &Path) -> BiomapResult<Vec<String>> {
    list_prefixes(dir)
}
