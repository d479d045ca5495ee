use std::path::Path;

use super::{read_json, DataLayout};
use crate::error::BiomapResult;
use crate::geometry::{BoundingBoxTable, Region, RegionGeometryIndex, STATE_REGION_TYPE};

/// Read a geometry file: a JSON array of region objects.
pub fn read_regions(path: &Path) -> BiomapResult<Vec<Region>> {
    let regions: Vec<Region> = read_json(path)?;
    log::debug!("Read {} regions from {}", regions.len(), path.display());
    Ok(regions)
}

pub fn read_bounding_boxes(path: &Path) -> BiomapResult<BoundingBoxTable> {
    read_json(path)
}

/// State geometry, with finer granularities loaded from the same directory on demand.
pub fn load_geometry_index(layout: &DataLayout) -> BiomapResult<RegionGeometryIndex> {
    let dir = layout.geometry_dir();
    let states = read_regions(&dir.join(format!("{}.json", STATE_REGION_TYPE)))?;
    Ok(RegionGeometryIndex::new(states)?.with_source_dir(dir))
}

/// `map_files/bbox.json`, or extents derived from the state polygons when it is absent.
pub fn load_bounding_boxes(
    layout: &DataLayout,
    index: &RegionGeometryIndex,
) -> BiomapResult<BoundingBoxTable> {
    let path = layout.bbox_path();
    if path.is_file() {
        read_bounding_boxes(&path)
    } else {
        log::warn!("{} not found, deriving view extents from state geometry", path.display());
        Ok(BoundingBoxTable::from_states(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RegionFilter, StateCode};
    use tempfile::TempDir;

    #[test]
    fn test_read_regions_and_bboxes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("municipio.json");
        std::fs::write(
            &path,
            r#"[{"cod_ibge": 3550308, "nome": "São Paulo", "uf": "SP", "macro": "Sudeste",
                 "geometry": [[-46.8, -46.3, -46.3, -46.8], [-23.8, -23.8, -23.3, -23.3]]}]"#,
        )
        .unwrap();
        let regions = read_regions(&path).unwrap();
        assert_eq!(regions[0].state, StateCode::new("SP").unwrap());
        assert_eq!(regions[0].macro_region.as_deref(), Some("Sudeste"));

        let bbox_path = dir.path().join("bbox.json");
        std::fs::write(&bbox_path, r#"{"Brasil": [[-74, -34], [-34, 6]], "SP": [[-53, -26], [-44, -19]]}"#)
            .unwrap();
        let table = read_bounding_boxes(&bbox_path).unwrap();
        let sp = table.get(&RegionFilter::State(StateCode::new("SP").unwrap())).unwrap();
        assert_eq!(sp.min, [-53.0, -26.0]);
    }

    #[test]
    fn test_unknown_state_in_geometry_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uf.json");
        std::fs::write(&path, r#"[{"cod_ibge": 99, "nome": "X", "uf": "XX", "geometry": [[0], [0]]}]"#)
            .unwrap();
        assert!(read_regions(&path).is_err());
    }
}
