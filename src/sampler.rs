//! Entry point bundling a tissue with the caller's interrupt probe.

use crate::error::Result;
use crate::interrupt::{Interrupt, InterruptCheck, NeverInterrupt, DEFAULT_CHECK_INTERVAL};
use crate::lineage::{lineage_table, sorted_timed_edges, TimedLineageEdge};
use crate::query::{self, CellFilter, CellQuery};
use crate::search;
use crate::selector::{self, SelectionPolicy};
use crate::tissue::TissueAccessor;
use rand::Rng;
use sampler_common::{AxisPosition, CellRecord, LineageRow, Position, Rectangle, SpeciesId};
use std::collections::BTreeSet;

static NEVER: NeverInterrupt = NeverInterrupt;

/// Read-only view of a tissue running the sampling operations.
///
/// Every scan polls the interrupt probe once every `check_interval`
/// iterations and stops with [`SamplingError::Cancelled`](crate::SamplingError::Cancelled)
/// as soon as it fires.
pub struct Sampler<'a, T: TissueAccessor> {
    tissue: &'a T,
    interrupt: &'a dyn Interrupt,
    check_interval: usize,
}

impl<'a, T: TissueAccessor> Sampler<'a, T> {
    /// A sampler that is never interrupted.
    pub fn new(tissue: &'a T) -> Self {
        Self { tissue, interrupt: &NEVER, check_interval: DEFAULT_CHECK_INTERVAL }
    }

    pub fn with_interrupt(tissue: &'a T, interrupt: &'a dyn Interrupt, check_interval: usize) -> Self {
        Self { tissue, interrupt, check_interval: check_interval.max(1) }
    }

    pub fn tissue(&self) -> &'a T {
        self.tissue
    }

    fn check(&self) -> InterruptCheck<'a> {
        InterruptCheck::new(self.interrupt, self.check_interval)
    }

    pub fn query_cells(&self, rectangle: &Rectangle, filter: &CellFilter) -> Result<Vec<CellRecord>> {
        query::query_cells(self.tissue, rectangle, filter, &mut self.check())
    }

    pub fn query(&self, cell_query: &CellQuery) -> Result<Vec<CellRecord>> {
        let (rectangle, filter) = cell_query.resolve(self.tissue);
        self.query_cells(&rectangle, &filter)
    }

    /// Every cell between two raw corners, which must both be 2-D.
    pub fn cells_in_corners(&self, lower_corner: &[AxisPosition], upper_corner: &[AxisPosition]) -> Result<Vec<CellRecord>> {
        self.query(&CellQuery::from_corners(lower_corner, upper_corner)?)
    }

    pub fn cell_at(&self, position: Position) -> Result<CellRecord> {
        query::cell_at(self.tissue, position)
    }

    pub fn count_cells(&self, rectangle: &Rectangle, filter: &CellFilter) -> Result<usize> {
        query::count_cells(self.tissue, rectangle, filter, &mut self.check())
    }

    pub fn bounding_box(&self) -> Result<Rectangle> {
        search::tumor_bounding_box(self.tissue, &mut self.check())
    }

    pub fn search_sample(
        &self,
        species_ids: &BTreeSet<SpeciesId>,
        num_of_cells: usize,
        width: AxisPosition,
        height: AxisPosition,
    ) -> Result<Rectangle> {
        search::search_sample(self.tissue, species_ids, num_of_cells, width, height, &mut self.check())
    }

    /// [`Sampler::search_sample`] over all the species of a genotype.
    pub fn search_sample_for(
        &self,
        genotype_name: &str,
        num_of_cells: usize,
        width: AxisPosition,
        height: AxisPosition,
    ) -> Result<Rectangle> {
        let species_ids = self.tissue.ids_of_genotype(genotype_name)?;
        self.search_sample(&species_ids, num_of_cells, width, height)
    }

    /// Chooses a cell under the policy matching the engine's growth model.
    pub fn choose_cell<R: Rng + ?Sized>(
        &self,
        species_ids: &BTreeSet<SpeciesId>,
        rectangle: Option<&Rectangle>,
        rng: &mut R,
    ) -> Result<CellRecord> {
        let policy = SelectionPolicy::for_tissue(self.tissue);
        self.choose_cell_with(species_ids, policy, rectangle, rng)
    }

    pub fn choose_cell_with<R: Rng + ?Sized>(
        &self,
        species_ids: &BTreeSet<SpeciesId>,
        policy: SelectionPolicy,
        rectangle: Option<&Rectangle>,
        rng: &mut R,
    ) -> Result<CellRecord> {
        selector::choose_cell(self.tissue, species_ids, policy, rectangle, rng, &mut self.check())
    }

    pub fn ordered_lineage_edges(&self, edges: &[TimedLineageEdge]) -> Vec<TimedLineageEdge> {
        sorted_timed_edges(edges.iter().copied())
    }

    pub fn lineage_table(&self, edges: &[TimedLineageEdge]) -> Result<Vec<LineageRow>> {
        lineage_table(self.tissue, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SamplingError;
    use crate::grid::GridTissue;
    use crate::interrupt::CancelFlag;
    use crate::tissue::SpeciesCatalog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tissue() -> GridTissue {
        let mut tissue = GridTissue::new("facade", 20, 20).unwrap();
        let a = tissue.add_genotype("A", 1.0, 0.0).unwrap();
        for x in 5..10 {
            for y in 5..10 {
                tissue.insert_cell(a, Position::new(x, y), 0.0).unwrap();
            }
        }
        tissue
    }

    #[test]
    fn test_facade_operations() {
        let tissue = tissue();
        let sampler = Sampler::new(&tissue);
        assert_eq!(sampler.bounding_box().unwrap(), Rectangle::new(Position::new(5, 5), Position::new(9, 9)));
        assert_eq!(sampler.query(&CellQuery::All).unwrap().len(), 25);
        assert_eq!(sampler.cells_in_corners(&[0, 0], &[5, 5]).unwrap().len(), 1);
        assert!(matches!(
            sampler.cells_in_corners(&[0], &[5, 5]),
            Err(SamplingError::InvalidDimension(_))
        ));

        let found = sampler.search_sample_for("A", 3, 2, 2).unwrap();
        let filter = CellFilter::all(&tissue);
        assert!(sampler.count_cells(&found, &filter).unwrap() > 3);
        assert_eq!(sampler.search_sample_for("Z", 3, 2, 2), Err(SamplingError::UnknownName("Z".into())));

        let mut rng = StdRng::seed_from_u64(5);
        let chosen = sampler.choose_cell(&tissue.all_species_ids(), None, &mut rng).unwrap();
        assert_eq!(chosen.genotype, "A");
    }

    #[test]
    fn test_cancelled_sampler() {
        let tissue = tissue();
        let flag = CancelFlag::new();
        let sampler = Sampler::with_interrupt(&tissue, &flag, 1);
        assert!(sampler.bounding_box().is_ok());
        flag.cancel();
        assert_eq!(sampler.bounding_box(), Err(SamplingError::Cancelled));
        assert_eq!(sampler.search_sample_for("A", 3, 2, 2), Err(SamplingError::Cancelled));
        // Single-position lookups do not scan.
        assert!(sampler.cell_at(Position::new(5, 5)).is_ok());
    }
}
