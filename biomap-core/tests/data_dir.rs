use biomap_core::io::{self, DataLayout};
use biomap_core::{BiomapError, RegionFilter, StateCode, STATE_CODES};
use std::fs;
use tempfile::TempDir;

// Every state as a unit square on a 9-wide grid, plus two municipalities in SP
fn write_fixture(root: &std::path::Path) -> DataLayout {
    let layout = DataLayout::new(root);
    fs::create_dir_all(layout.geometry_dir()).unwrap();
    fs::create_dir_all(layout.biomass_dir()).unwrap();

    let states: Vec<serde_json::Value> = STATE_CODES
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let x = (i % 9) as f64;
            let y = (i / 9) as f64;
            serde_json::json!({
                "cod_ibge": 11 + i,
                "nome": code,
                "uf": code,
                "geometry": [[x, x + 1.0, x + 1.0, x], [y, y, y + 1.0, y + 1.0]],
            })
        })
        .collect();
    fs::write(layout.geometry_dir().join("uf.json"), serde_json::to_string(&states).unwrap()).unwrap();

    let municipios = serde_json::json!([
        {"cod_ibge": 3500105, "nome": "Adamantina", "uf": "SP",
         "geometry": [[1.0, 1.5, 1.5, null, 1.6, 1.9, 1.9], [2.0, 2.0, 2.5, null, 2.6, 2.6, 2.9]]},
        {"cod_ibge": 3500204, "nome": "Adolfo", "uf": "SP",
         "geometry": [[1.5, 2.0, 2.0], [2.5, 2.5, 3.0]]}
    ]);
    fs::write(layout.geometry_dir().join("municipio.json"), municipios.to_string()).unwrap();

    fs::write(
        layout.biomass_dir().join("cana.json"),
        r#"{"nome_biomassa": "Cana-de-açúcar", "tipo_biomassa": "Sacarinas", "unidade": "ton",
            "tipo_regiao": "municipio", "produto_derivado": "etanol",
            "conversao_derivado": 0.08, "conversao_gas": 0.1, "fonte": "IBGE", "obs": "Safra 2020"}"#,
    )
    .unwrap();
    fs::write(
        layout.biomass_dir().join("cana.csv"),
        "cod_ibge,qnt_produzida,ano\n3500105,14257,2020\n3500204,40,2020\n",
    )
    .unwrap();
    layout
}

#[test]
fn loads_dataset_geometry_and_derived_bboxes() {
    let dir = TempDir::new().unwrap();
    let layout = write_fixture(dir.path());

    let dataset = io::load_dataset(&layout, "cana").unwrap();
    assert_eq!(dataset.notes(), "Safra 2020");

    let mut index = io::load_geometry_index(&layout).unwrap();
    assert_eq!(index.states().len(), 27);
    assert_eq!(index.states()[0].state.as_str(), "RO");

    let placed = index.load(dataset.region_type()).unwrap().resolve(&dataset).unwrap();
    assert_eq!(placed.len(), 2);
    assert!(placed.iter().all(|p| p.state.as_str() == "SP"));
    let adamantina = index.regions("municipio").unwrap().get(3500105).unwrap();
    assert_eq!(adamantina.geometry.parts().len(), 2);

    let bboxes = io::load_bounding_boxes(&layout, &index).unwrap();
    let sp = bboxes.get(&RegionFilter::State(StateCode::new("SP").unwrap())).unwrap();
    assert_eq!(sp.min, [1.0, 2.0]);
}

#[test]
fn missing_granularity_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let layout = write_fixture(dir.path());
    let mut index = io::load_geometry_index(&layout).unwrap();
    let err = index.load("microrregiao").unwrap_err();
    assert!(matches!(err, BiomapError::FileNotFound { .. }));
}
