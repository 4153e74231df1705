//! An in-memory tissue: a dense grid of cell slots plus the species catalog,
//! the manually added cells, the lineage edges and the samples taken so far.

use crate::lineage::TimedLineageEdge;
use crate::tissue::{CellHandle, SpeciesCatalog, TissueAccessor};
use anyhow::Result;
use log::{debug, trace};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::IndexedRandom;
use rand::Rng;
use sampler_common::{
    AxisPosition, CellId, Position, Rectangle, SpeciesDescriptor, SpeciesId, WILD_TYPE_NAME, WILD_TYPE_SPECIES,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy)]
struct Slot {
    species_id: SpeciesId,
    cell_id: CellId,
    birth_time: f64,
}

/// A cell placed by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct AddedCell {
    pub species_id: SpeciesId,
    pub position: Position,
    pub time: f64,
}

/// A named region sampled at some time, with the ids of the non wild-type
/// cells it contained.
#[derive(Debug, Clone, PartialEq)]
pub struct TissueSample {
    pub name: String,
    pub region: Rectangle,
    pub time: f64,
    pub cell_ids: Vec<CellId>,
}

/// Dense, row-major tissue.
#[derive(Debug, Clone)]
pub struct GridTissue {
    name: String,
    width: AxisPosition,
    height: AxisPosition,
    slots: Vec<Option<Slot>>,
    species: Vec<SpeciesDescriptor>,
    // Positions of the cells of each species, indexed by species id.
    species_cells: Vec<Vec<Position>>,
    next_cell_id: CellId,
    added_cells: Vec<AddedCell>,
    lineage_edges: Vec<TimedLineageEdge>,
    samples: Vec<TissueSample>,
    duplicate_internal_cells: bool,
}

// Calculates the 1D slot index for a given position
#[inline(always)]
fn slot_index(position: Position, width: AxisPosition, height: AxisPosition) -> Option<usize> {
    if position.x >= width || position.y >= height {
        return None;
    }
    Some(position.y as usize * width as usize + position.x as usize)
}

impl GridTissue {
    pub fn new(name: &str, width: AxisPosition, height: AxisPosition) -> Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("Tissue size must be positive, got {}x{}.", width, height);
        }
        debug!("Creating tissue '{}' of size {}x{}.", name, width, height);
        Ok(Self {
            name: name.to_string(),
            width,
            height,
            slots: vec![None; width as usize * height as usize],
            species: Vec::new(),
            species_cells: Vec::new(),
            next_cell_id: 0,
            added_cells: Vec::new(),
            lineage_edges: Vec::new(),
            samples: Vec::new(),
            duplicate_internal_cells: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn register_species(&mut self, genotype_name: &str, signature: &str, duplication_rate: f64,
                        death_rate: f64, switch_rate: Option<f64>) -> SpeciesId {
        let id = self.species.len() as SpeciesId;
        self.species.push(SpeciesDescriptor {
            id,
            genotype_name: genotype_name.to_string(),
            signature: signature.to_string(),
            duplication_rate,
            death_rate,
            switch_rate,
        });
        self.species_cells.push(Vec::new());
        id
    }

    fn ensure_new_genotype(&self, genotype_name: &str) -> Result<()> {
        if genotype_name.is_empty() {
            anyhow::bail!("Genotype names must not be empty.");
        }
        if genotype_name == WILD_TYPE_NAME {
            anyhow::bail!("\"{}\" is a reserved genotype name.", WILD_TYPE_NAME);
        }
        if self.species.iter().any(|species| species.genotype_name == genotype_name) {
            anyhow::bail!("Genotype '{}' has already been added.", genotype_name);
        }
        Ok(())
    }

    /// Adds a genotype without epigenetic states; it gives rise to a single species.
    pub fn add_genotype(&mut self, genotype_name: &str, growth_rate: f64, death_rate: f64) -> Result<SpeciesId> {
        self.ensure_new_genotype(genotype_name)?;
        Ok(self.register_species(genotype_name, "", growth_rate, death_rate, None))
    }

    /// Adds a genotype with the two epigenetic species "+" and "-".
    /// Rates are given as `(plus, minus)` pairs; the switch rates are the
    /// "+" to "-" and "-" to "+" rates respectively.
    pub fn add_epigenetic_genotype(
        &mut self,
        genotype_name: &str,
        growth_rates: (f64, f64),
        death_rates: (f64, f64),
        switch_rates: (f64, f64),
    ) -> Result<(SpeciesId, SpeciesId)> {
        self.ensure_new_genotype(genotype_name)?;
        let plus = self.register_species(genotype_name, "+", growth_rates.0, death_rates.0, Some(switch_rates.0));
        let minus = self.register_species(genotype_name, "-", growth_rates.1, death_rates.1, Some(switch_rates.1));
        Ok((plus, minus))
    }

    /// Puts a new cell of `species_id` at `position` without recording it as
    /// manually added.
    pub fn insert_cell(&mut self, species_id: SpeciesId, position: Position, time: f64) -> Result<CellId> {
        let Some(cells) = self.species_cells.get_mut(species_id as usize) else {
            anyhow::bail!("Unknown species id {}.", species_id);
        };
        let Some(idx) = slot_index(position, self.width, self.height) else {
            anyhow::bail!("Position {} lies outside the {}x{} tissue.", position, self.width, self.height);
        };
        if self.slots[idx].is_some() {
            anyhow::bail!("Position {} is already occupied.", position);
        }
        let cell_id = self.next_cell_id;
        self.next_cell_id += 1;
        self.slots[idx] = Some(Slot { species_id, cell_id, birth_time: time });
        cells.push(position);
        trace!("Cell {} of species {} placed at {}.", cell_id, species_id, position);
        Ok(cell_id)
    }

    /// Places one cell by hand: the cell is listed among the added cells and
    /// a wild-type to species lineage edge is recorded at `time`.
    pub fn place_cell(&mut self, species_id: SpeciesId, position: Position, time: f64) -> Result<CellId> {
        self.place_descendant_cell(WILD_TYPE_SPECIES, species_id, position, time)
    }

    /// As [`GridTissue::place_cell`], with the lineage edge starting from `ancestor`.
    pub fn place_descendant_cell(
        &mut self,
        ancestor: SpeciesId,
        species_id: SpeciesId,
        position: Position,
        time: f64,
    ) -> Result<CellId> {
        if self.count_of(species_id) > 0 {
            log::warn!("The tissue already contains cells of species {}.", species_id);
        }
        let cell_id = self.insert_cell(species_id, position, time)?;
        self.added_cells.push(AddedCell { species_id, position, time });
        self.record_lineage_edge(ancestor, species_id, time);
        Ok(cell_id)
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        slot_index(position, self.width, self.height).is_some_and(|idx| self.slots[idx].is_some())
    }

    /// Records a species-to-species transition. Repeated transitions are kept.
    pub fn record_lineage_edge(&mut self, ancestor: SpeciesId, progeny: SpeciesId, time: f64) {
        self.lineage_edges.push(TimedLineageEdge::new(ancestor, progeny, time));
    }

    /// Samples a rectangular region, storing the ids of its non wild-type cells.
    pub fn sample_tissue(&mut self, name: &str, rectangle: Rectangle, time: f64) -> Result<&TissueSample> {
        let Some(region) = rectangle.clip_to(self.width, self.height) else {
            anyhow::bail!("Sample '{}' region {} does not intersect the tissue.", name, rectangle);
        };
        let cell_ids: Vec<CellId> = region
            .positions()
            .filter_map(|position| slot_index(position, self.width, self.height))
            .filter_map(|idx| self.slots[idx].map(|slot| slot.cell_id))
            .collect();
        debug!("Sample '{}' at time {} holds {} cells.", name, time, cell_ids.len());
        self.samples.push(TissueSample { name: name.to_string(), region, time, cell_ids });
        Ok(&self.samples[self.samples.len() - 1])
    }

    pub fn set_duplicate_internal_cells(&mut self, duplicate_internal_cells: bool) {
        self.duplicate_internal_cells = duplicate_internal_cells;
    }

    pub fn added_cells(&self) -> &[AddedCell] {
        &self.added_cells
    }

    pub fn lineage_edges(&self) -> &[TimedLineageEdge] {
        &self.lineage_edges
    }

    pub fn samples(&self) -> &[TissueSample] {
        &self.samples
    }

    /// Total number of non wild-type cells.
    pub fn num_of_cells(&self) -> usize {
        self.species_cells.iter().map(Vec::len).sum()
    }
}

impl SpeciesCatalog for GridTissue {
    fn species(&self) -> &[SpeciesDescriptor] {
        &self.species
    }

    fn descriptor(&self, species_id: SpeciesId) -> Option<&SpeciesDescriptor> {
        self.species.get(species_id as usize)
    }
}

impl TissueAccessor for GridTissue {
    fn size(&self) -> (AxisPosition, AxisPosition) {
        (self.width, self.height)
    }

    fn cell_at(&self, position: Position) -> CellHandle {
        match slot_index(position, self.width, self.height).and_then(|idx| self.slots[idx]) {
            Some(slot) => CellHandle {
                position,
                species_id: slot.species_id,
                cell_id: slot.cell_id,
                birth_time: Some(slot.birth_time),
            },
            None => CellHandle::wild_type(position),
        }
    }

    fn count_of(&self, species_id: SpeciesId) -> usize {
        self.species_cells.get(species_id as usize).map_or(0, Vec::len)
    }

    fn duplicate_internal_cells(&self) -> bool {
        self.duplicate_internal_cells
    }

    /// Draws a species with probability proportional to its duplication rate
    /// times its number of cells in the region, then a uniform cell of it.
    /// Species with null rates are drawn by cell count alone when no candidate
    /// has a positive rate.
    fn weighted_random_cell<R: Rng + ?Sized>(
        &self,
        species_ids: &BTreeSet<SpeciesId>,
        rectangle: Option<&Rectangle>,
        rng: &mut R,
    ) -> Option<CellHandle> {
        let candidates: Vec<(SpeciesId, Vec<Position>)> = species_ids
            .iter()
            .filter_map(|&id| {
                let cells = self.species_cells.get(id as usize)?;
                let in_region: Vec<Position> = match rectangle {
                    Some(rect) => cells.iter().copied().filter(|pos| rect.contains(*pos)).collect(),
                    None => cells.clone(),
                };
                (!in_region.is_empty()).then_some((id, in_region))
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let mut weights: Vec<f64> = candidates
            .iter()
            .map(|(id, cells)| self.species[*id as usize].duplication_rate * cells.len() as f64)
            .collect();
        if weights.iter().all(|weight| *weight <= 0.0) {
            weights = candidates.iter().map(|(_, cells)| cells.len() as f64).collect();
        }
        let species_dist = WeightedIndex::new(&weights).ok()?;
        let (_, cells) = &candidates[species_dist.sample(rng)];
        let position = *cells.choose(rng)?;
        Some(self.cell_at(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tissue_with_two_species() -> (GridTissue, SpeciesId, SpeciesId, SpeciesId) {
        let mut tissue = GridTissue::new("test", 20, 10).unwrap();
        let (a_plus, a_minus) = tissue.add_epigenetic_genotype("A", (0.2, 0.08), (0.1, 0.01), (0.01, 0.01)).unwrap();
        let b = tissue.add_genotype("B", 0.3, 0.05).unwrap();
        (tissue, a_plus, a_minus, b)
    }

    #[test]
    fn test_slot_index_is_row_major() {
        assert_eq!(slot_index(Position::new(3, 2), 10, 5), Some(23));
        assert_eq!(slot_index(Position::new(10, 0), 10, 5), None);
        assert_eq!(slot_index(Position::new(0, 5), 10, 5), None);
    }

    #[test]
    fn test_catalog_names() {
        let (mut tissue, a_plus, a_minus, b) = tissue_with_two_species();
        assert_eq!(tissue.name_of(a_plus).unwrap(), "A+");
        assert_eq!(tissue.name_of(a_minus).unwrap(), "A-");
        assert_eq!(tissue.name_of(b).unwrap(), "B");
        assert_eq!(tissue.name_of(WILD_TYPE_SPECIES).unwrap(), "Wild-type");
        assert_eq!(tissue.signature_string_of(b).unwrap(), "");
        assert_eq!(tissue.ids_of_genotype("A").unwrap(), BTreeSet::from([a_plus, a_minus]));
        assert!(tissue.ids_of_genotype("C").is_err());
        assert!(tissue.add_genotype("B", 0.1, 0.1).is_err());
    }

    #[test]
    fn test_wild_type_genotype_name_is_reserved() {
        let (mut tissue, _, _, _) = tissue_with_two_species();
        assert!(tissue.add_genotype("Wild-type", 0.1, 0.0).is_err());
        assert!(tissue.add_epigenetic_genotype("Wild-type", (0.1, 0.1), (0.0, 0.0), (0.0, 0.0)).is_err());
        assert!(tissue.add_genotype("", 0.1, 0.0).is_err());
        assert_eq!(tissue.species().len(), 3);
    }

    #[test]
    fn test_place_cell_tracks_lineage_and_added_cells() {
        let (mut tissue, a_plus, _, b) = tissue_with_two_species();
        tissue.place_cell(a_plus, Position::new(4, 4), 0.0).unwrap();
        tissue.insert_cell(b, Position::new(5, 4), 2.0).unwrap();
        assert!(tissue.insert_cell(b, Position::new(4, 4), 2.0).is_err());
        assert!(tissue.insert_cell(b, Position::new(20, 0), 2.0).is_err());

        assert_eq!(tissue.num_of_cells(), 2);
        assert_eq!(tissue.added_cells().len(), 1);
        assert_eq!(tissue.lineage_edges(), &[TimedLineageEdge::new(WILD_TYPE_SPECIES, a_plus, 0.0)]);
        let cell = tissue.cell_at(Position::new(5, 4));
        assert_eq!(cell.species_id, b);
        assert_eq!(cell.birth_time, Some(2.0));
        assert!(tissue.cell_at(Position::new(0, 0)).is_wild_type());
    }

    #[test]
    fn test_sample_tissue_collects_cells() {
        let (mut tissue, a_plus, _, b) = tissue_with_two_species();
        tissue.insert_cell(a_plus, Position::new(1, 1), 0.0).unwrap();
        tissue.insert_cell(b, Position::new(2, 2), 0.0).unwrap();
        tissue.insert_cell(b, Position::new(9, 9), 0.0).unwrap();
        let rect = Rectangle::new(Position::new(0, 0), Position::new(3, 3));
        let sample = tissue.sample_tissue("S1", rect, 5.0).unwrap();
        assert_eq!(sample.cell_ids.len(), 2);
        let outside = Rectangle::new(Position::new(30, 30), Position::new(40, 40));
        assert!(tissue.sample_tissue("S2", outside, 5.0).is_err());
    }

    #[test]
    fn test_weighted_random_cell_respects_filters() {
        let (mut tissue, a_plus, a_minus, b) = tissue_with_two_species();
        tissue.insert_cell(a_plus, Position::new(1, 1), 0.0).unwrap();
        tissue.insert_cell(a_minus, Position::new(15, 5), 0.0).unwrap();
        tissue.insert_cell(b, Position::new(2, 2), 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let genotype_a = BTreeSet::from([a_plus, a_minus]);
        for _ in 0..50 {
            let cell = tissue.weighted_random_cell(&genotype_a, None, &mut rng).unwrap();
            assert!(genotype_a.contains(&cell.species_id));
        }

        let left = Rectangle::new(Position::new(0, 0), Position::new(9, 9));
        for _ in 0..20 {
            let cell = tissue.weighted_random_cell(&genotype_a, Some(&left), &mut rng).unwrap();
            assert_eq!(cell.position, Position::new(1, 1));
        }

        let empty = Rectangle::new(Position::new(5, 5), Position::new(6, 6));
        assert!(tissue.weighted_random_cell(&genotype_a, Some(&empty), &mut rng).is_none());
    }
}
