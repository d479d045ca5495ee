use std::path::Path;

use super::{list_prefixes, open_table, read_json, table_path, DataLayout};
use crate::dataset::{Dataset, DatasetMeta, ValueRecord};
use crate::error::{BiomapError, BiomapResult};
use crate::types::RegionCode;

/// Load `biomass/<prefix>.csv` with its paired metadata file.
pub fn load_dataset(layout: &DataLayout, prefix: &str) -> BiomapResult<Dataset> {
    let dir = layout.biomass_dir();
    let meta: DatasetMeta = read_json(&dir.join(format!("{}.json", prefix)))?;
    let path = table_path(&dir, prefix)?;
    let records = read_value_records(&path)?;
    let dataset = Dataset::new(prefix, meta, records);
    log::info!(
        "Loaded dataset '{}' ({}): {} records, region type '{}'",
        prefix,
        dataset.name(),
        dataset.records().len(),
        dataset.region_type()
    );
    Ok(dataset)
}

/// Dataset prefixes available under `biomass/`.
pub fn list_datasets(layout: &DataLayout) -> BiomapResult<Vec<String>> {
    list_prefixes(&layout.biomass_dir())
}

/// Parse the value table. Quantities that do not parse as numbers become NaN and are
/// dropped along with the non-positive ones.
pub fn read_value_records(path: &Path) -> BiomapResult<Vec<ValueRecord>> {
    let file = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(open_table(path)?);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_owned()).collect();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let code_col = column("cod_ibge")
        .ok_or_else(|| BiomapError::parse(&file, "missing column 'cod_ibge'"))?;
    let qty_col = column("qnt_produzida")
        .ok_or_else(|| BiomapError::parse(&file, "missing column 'qnt_produzida'"))?;
    let year_col = column("ano");

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let raw_code = row.get(code_col).unwrap_or("").trim();
        let region_code = parse_region_code(raw_code).ok_or_else(|| {
            BiomapError::parse(&file, format!("row {}: invalid cod_ibge '{}'", line + 2, raw_code))
        })?;
        let quantity = row
            .get(qty_col)
            .and_then(|q| q.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN);
        let year = year_col
            .and_then(|c| row.get(c))
            .and_then(|y| y.trim().parse::<f64>().ok())
            .map(|y| y as i32);
        records.push(ValueRecord { region_code, quantity, year });
    }
    Ok(records)
}

/// Region codes sometimes arrive float-formatted ("3550308.0").
pub(crate) fn parse_region_code(raw: &str) -> Option<RegionCode> {
    raw.parse::<RegionCode>().ok().or_else(|| {
        let value = raw.parse::<f64>().ok()?;
        (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then_some(value as RegionCode)
    })
}
