#![allow(dead_code)]

use biomap_core::{
    BoundingBoxTable, Dataset, DatasetMeta, DynamicUnitSpec, Geometry, PassThrough, Region,
    RegionCode, RegionGeometryIndex, ScaleKind, StateCode, StaticUnitSpec, UnitKind, UnitRecord,
    UnitSource, UnitTable, ValueRecord, STATE_CODES,
};

pub fn state(code: &str) -> StateCode {
    StateCode::new(code).unwrap()
}

fn cell(code: &str) -> (f64, f64) {
    let i = STATE_CODES.iter().position(|c| *c == code).unwrap();
    ((i % 9) as f64, (i / 9) as f64)
}

fn municipio(code: RegionCode, uf: &str, dx: f64) -> Region {
    let (x, y) = cell(uf);
    Region {
        code,
        state: state(uf),
        name: format!("{}-{}", uf, code),
        macro_region: None,
        geometry: Geometry::rectangle(x + dx, y + 0.25, x + dx + 0.4, y + 0.75),
    }
}

/// 27 unit-square states on a 9x3 grid, with municipalities in SP, MG and BA.
pub fn geometry() -> RegionGeometryIndex {
    let states = STATE_CODES
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let (x, y) = cell(code);
            Region {
                code: 11 + i as RegionCode,
                state: state(code),
                name: code.to_string(),
                macro_region: None,
                geometry: Geometry::rectangle(x, y, x + 1.0, y + 1.0),
            }
        })
        .collect();
    let mut index = RegionGeometryIndex::new(states).unwrap();
    index
        .insert_regions(
            "municipio",
            vec![
                municipio(3500105, "SP", 0.05),
                municipio(3500204, "SP", 0.55),
                municipio(3100104, "MG", 0.3),
                municipio(2900108, "BA", 0.3),
            ],
        )
        .unwrap();
    index
}

pub fn bboxes(index: &RegionGeometryIndex) -> BoundingBoxTable {
    BoundingBoxTable::from_states(index)
}

pub fn dataset(key: &str, kind: ScaleKind, values: &[(RegionCode, f64)]) -> Dataset {
    let meta = DatasetMeta {
        name: key.to_string(),
        category: "Sacarinas".to_string(),
        unit: "ton".to_string(),
        region_type: "municipio".to_string(),
        derived_product: "etanol".to_string(),
        derived_coefficient: PassThrough::Number(0.08),
        gas_coefficient: PassThrough::Text("-".to_string()),
        source: format!("IBGE ({})", key),
        scale_kind: kind,
        notes: "Safra 2020".to_string(),
    };
    let records = values
        .iter()
        .map(|&(region_code, quantity)| ValueRecord { region_code, quantity, year: Some(2020) })
        .collect();
    Dataset::new(key, meta, records)
}

pub fn cana() -> Dataset {
    dataset("Cana", ScaleKind::Linear, &[(3500105, 5.0), (3500204, 40.0), (3100104, 14257.0), (2900108, 900.0)])
}

fn unit(name: &str, uf: &str, coef: Option<f64>) -> UnitRecord {
    let (x, y) = cell(uf);
    UnitRecord { name: name.to_string(), state: state(uf), lat: y + 0.5, lon: x + 0.5, coefficient: coef }
}

pub fn units() -> Vec<UnitSource> {
    vec![
        UnitSource {
            key: "usinas".to_string(),
            kind: UnitKind::Static(StaticUnitSpec {
                category: "Usinas".to_string(),
                marker: "^".to_string(),
                color: "#1f77b4".to_string(),
            }),
            table: UnitTable::new("usinas", vec![unit("U1", "SP", None), unit("U2", "BA", None)]).unwrap(),
            has_own_legend: true,
        },
        UnitSource {
            key: "consumo".to_string(),
            kind: UnitKind::Dynamic(DynamicUnitSpec {
                category: "Centros de consumo".to_string(),
                unit: "ton/mês".to_string(),
                marker: "o".to_string(),
                colormap: "GnBu".to_string(),
            }),
            table: UnitTable::new(
                "consumo",
                vec![unit("C1", "SP", Some(0.0)), unit("C2", "SP", Some(0.0)), unit("C3", "RJ", Some(100.0))],
            )
            .unwrap(),
            has_own_legend: true,
        },
    ]
}
