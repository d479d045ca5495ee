//! Fixtures shared by the unit tests: one unit square per state on a 9-wide grid.

use biomap_core::{
    Dataset, DatasetMeta, Geometry, PassThrough, Region, RegionCode, RegionGeometryIndex,
    ScaleKind, StateCode, ValueRecord, STATE_CODES,
};

pub(crate) fn sp() -> StateCode {
    StateCode::new("SP").unwrap()
}

fn cell(code: &str) -> (f64, f64) {
    let i = STATE_CODES.iter().position(|c| *c == code).unwrap();
    ((i % 9) as f64, (i / 9) as f64)
}

pub(crate) fn states() -> Vec<Region> {
    STATE_CODES
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let (x, y) = cell(code);
            Region {
                code: 11 + i as RegionCode,
                state: StateCode::new(code).unwrap(),
                name: code.to_string(),
                macro_region: None,
                geometry: Geometry::rectangle(x, y, x + 1.0, y + 1.0),
            }
        })
        .collect()
}

fn municipio(code: RegionCode, state: &str, dx: f64) -> Region {
    let (x, y) = cell(state);
    Region {
        code,
        state: StateCode::new(state).unwrap(),
        name: format!("{}-{}", state, code),
        macro_region: None,
        geometry: Geometry::rectangle(x + dx, y + 0.25, x + dx + 0.4, y + 0.75),
    }
}

/// States plus municipalities 3500105, 3500204 (SP) and 3100104 (MG).
pub(crate) fn index_with_municipios() -> RegionGeometryIndex {
    let mut index = RegionGeometryIndex::new(states()).unwrap();
    index
        .insert_regions(
            "municipio",
            vec![
                municipio(3500105, "SP", 0.05),
                municipio(3500204, "SP", 0.55),
                municipio(3100104, "MG", 0.3),
            ],
        )
        .unwrap();
    index
}

pub(crate) fn dataset(kind: ScaleKind, values: &[(RegionCode, f64)]) -> Dataset {
    let meta = DatasetMeta {
        name: "Cana".to_string(),
        category: "Sacarinas".to_string(),
        unit: "ton".to_string(),
        region_type: "municipio".to_string(),
        derived_product: "etanol".to_string(),
        derived_coefficient: PassThrough::Number(0.08),
        gas_coefficient: PassThrough::Number(0.1),
        source: "IBGE".to_string(),
        scale_kind: kind,
        notes: String::new(),
    };
    let records = values
        .iter()
        .map(|&(region_code, quantity)| ValueRecord { region_code, quantity, year: Some(2020) })
        .collect();
    Dataset::new("cana", meta, records)
}
