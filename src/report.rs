//! Tabular summaries of a tissue: species, counts, samples and added cells.

use crate::error::{Result, SamplingError};
use crate::grid::{AddedCell, TissueSample};
use crate::tissue::{SpeciesCatalog, TissueAccessor};
use sampler_common::{AddedCellRow, CountRow, SampleInfo, SpeciesRow};

/// One row per species, in registration order.
pub fn species_table<C: SpeciesCatalog>(catalog: &C) -> Vec<SpeciesRow> {
    catalog
        .species()
        .iter()
        .map(|species| SpeciesRow {
            genotype: species.genotype_name.clone(),
            epistate: species.signature.clone(),
            growth_rate: species.duplication_rate,
            death_rate: species.death_rate,
            switch_rate: species.switch_rate,
        })
        .collect()
}

/// Current number of cells of every species.
pub fn counts_table<T: TissueAccessor>(tissue: &T) -> Vec<CountRow> {
    tissue
        .species()
        .iter()
        .map(|species| CountRow {
            genotype: species.genotype_name.clone(),
            epistate: species.signature.clone(),
            counts: tissue.count_of(species.id),
        })
        .collect()
}

pub fn samples_info(samples: &[TissueSample]) -> Vec<SampleInfo> {
    samples
        .iter()
        .map(|sample| SampleInfo {
            name: sample.name.clone(),
            xmin: sample.region.lower_corner.x,
            ymin: sample.region.lower_corner.y,
            xmax: sample.region.upper_corner.x,
            ymax: sample.region.upper_corner.y,
            tumoural_cells: sample.cell_ids.len(),
            time: sample.time,
        })
        .collect()
}

/// The manually placed cells, named through `catalog`.
pub fn added_cells_table<C: SpeciesCatalog>(catalog: &C, added_cells: &[AddedCell]) -> Result<Vec<AddedCellRow>> {
    added_cells
        .iter()
        .map(|added| {
            Ok(AddedCellRow {
                genotype: catalog
                    .descriptor(added.species_id)
                    .map(|species| species.genotype_name.clone())
                    .ok_or(SamplingError::UnknownSpeciesId(added.species_id))?,
                epistate: catalog.signature_string_of(added.species_id)?.to_string(),
                position_x: added.position.x,
                position_y: added.position.y,
                time: added.time,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridTissue;
    use sampler_common::{Position, Rectangle};

    fn tissue() -> GridTissue {
        let mut tissue = GridTissue::new("report", 8, 8).unwrap();
        let (a_plus, a_minus) = tissue.add_epigenetic_genotype("A", (0.3, 0.2), (0.1, 0.05), (0.01, 0.02)).unwrap();
        let b = tissue.add_genotype("B", 0.4, 0.0).unwrap();
        tissue.place_cell(a_plus, Position::new(2, 2), 0.0).unwrap();
        tissue.insert_cell(a_minus, Position::new(2, 3), 1.0).unwrap();
        tissue.insert_cell(a_minus, Position::new(3, 3), 1.5).unwrap();
        tissue.place_cell(b, Position::new(6, 6), 4.0).unwrap();
        tissue
    }

    #[test]
    fn test_species_and_counts() {
        let tissue = tissue();
        let species = species_table(&tissue);
        assert_eq!(species.len(), 3);
        assert_eq!((species[1].genotype.as_str(), species[1].epistate.as_str()), ("A", "-"));
        assert_eq!(species[1].switch_rate, Some(0.02));
        assert_eq!(species[2].switch_rate, None);

        let counts: Vec<_> = counts_table(&tissue).into_iter().map(|row| row.counts).collect();
        assert_eq!(counts, vec![1, 2, 1]);
    }

    #[test]
    fn test_samples_and_added_cells() {
        let mut tissue = tissue();
        tissue
            .sample_tissue("S1", Rectangle::new(Position::new(0, 0), Position::new(3, 3)), 5.0)
            .unwrap();
        let info = samples_info(tissue.samples());
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].tumoural_cells, 3);
        assert_eq!((info[0].xmax, info[0].ymax), (3, 3));

        let added = added_cells_table(&tissue, tissue.added_cells()).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!((added[0].genotype.as_str(), added[0].epistate.as_str()), ("A", "+"));
        assert_eq!((added[1].position_x, added[1].position_y, added[1].time), (6, 6, 4.0));
    }
}
