//! Cell filter and query engine.
//!
//! A query scans a rectangle x-major (outer loop on x, inner loop on y) and
//! emits a record for every occupied position whose species passes the species
//! filter and whose epigenetic signature passes the epigenetic filter.

use crate::error::{Result, SamplingError};
use crate::interrupt::InterruptCheck;
use crate::tissue::{CellHandle, SpeciesCatalog, TissueAccessor};
use log::debug;
use sampler_common::{AxisPosition, CellRecord, Position, Rectangle, SpeciesId, EPIGENETIC_STATES, WILD_TYPE_NAME};
use std::collections::BTreeSet;

/// Species and epigenetic predicates, resolved to ids and signature strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellFilter {
    pub species: BTreeSet<SpeciesId>,
    pub epistates: BTreeSet<String>,
}

impl CellFilter {
    pub fn new(species: BTreeSet<SpeciesId>, epistates: BTreeSet<String>) -> Self {
        Self { species, epistates }
    }

    /// Accepts every registered species in every epigenetic state.
    pub fn all<C: SpeciesCatalog>(catalog: &C) -> Self {
        Self::new(catalog.all_species_ids(), EPIGENETIC_STATES.iter().map(|s| s.to_string()).collect())
    }

    /// Accepts the species of the named genotypes whose signature is among `epistates`.
    pub fn by_names<C: SpeciesCatalog, S: AsRef<str>>(catalog: &C, genotypes: &[S], epistates: &[S]) -> Self {
        Self::new(
            catalog.ids_of_genotypes(genotypes),
            epistates.iter().map(|s| s.as_ref().to_string()).collect(),
        )
    }

    /// Accepts the given species in every epigenetic state.
    pub fn of_species(species: BTreeSet<SpeciesId>) -> Self {
        Self::new(species, EPIGENETIC_STATES.iter().map(|s| s.to_string()).collect())
    }

    fn accepts<C: SpeciesCatalog>(&self, catalog: &C, species_id: SpeciesId) -> Result<bool> {
        if !self.species.contains(&species_id) {
            return Ok(false);
        }
        let signature = catalog.signature_string_of(species_id)?;
        Ok(self.epistates.contains(signature))
    }
}

/// The ways a caller may address cells, resolved once into a rectangle and a
/// [`CellFilter`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellQuery {
    /// Every cell of the tissue.
    All,
    /// Every cell in a rectangle.
    ByPosition(Rectangle),
    /// Cells of the named genotypes and epigenetic states, anywhere in the tissue.
    ByName { genotypes: Vec<String>, epistates: Vec<String> },
    /// Cells of the named genotypes and epigenetic states in a rectangle.
    ByPositionAndName { rectangle: Rectangle, genotypes: Vec<String>, epistates: Vec<String> },
}

impl CellQuery {
    /// A positional query from raw corners; both must be 2-D.
    pub fn from_corners(lower_corner: &[AxisPosition], upper_corner: &[AxisPosition]) -> Result<Self> {
        Ok(CellQuery::ByPosition(Rectangle::from_corners(lower_corner, upper_corner)?))
    }

    pub fn resolve<T: TissueAccessor>(&self, tissue: &T) -> (Rectangle, CellFilter) {
        match self {
            CellQuery::All => (tissue.extent(), CellFilter::all(tissue)),
            CellQuery::ByPosition(rectangle) => (*rectangle, CellFilter::all(tissue)),
            CellQuery::ByName { genotypes, epistates } => {
                (tissue.extent(), CellFilter::by_names(tissue, genotypes, epistates))
            }
            CellQuery::ByPositionAndName { rectangle, genotypes, epistates } => {
                (*rectangle, CellFilter::by_names(tissue, genotypes, epistates))
            }
        }
    }
}

/// Builds the record of a tissue cell. Wild-type handles produce a wild-type record.
pub fn wrap_cell<C: SpeciesCatalog>(catalog: &C, cell: &CellHandle) -> Result<CellRecord> {
    if cell.is_wild_type() {
        return Ok(CellRecord {
            cell_id: None,
            species_id: None,
            genotype: WILD_TYPE_NAME.to_string(),
            epistate: String::new(),
            position_x: cell.position.x,
            position_y: cell.position.y,
            birth_time: None,
        });
    }
    let species = catalog
        .descriptor(cell.species_id)
        .ok_or(SamplingError::UnknownSpeciesId(cell.species_id))?;
    Ok(CellRecord {
        cell_id: Some(cell.cell_id),
        species_id: Some(cell.species_id),
        genotype: species.genotype_name.clone(),
        epistate: species.signature.clone(),
        position_x: cell.position.x,
        position_y: cell.position.y,
        birth_time: cell.birth_time,
    })
}

/// Visits, in x-major order, every occupied position of `rectangle` whose cell
/// passes `filter`. Inverted rectangles visit nothing; parts outside the
/// tissue are ignored.
fn for_each_selected<T, F>(
    tissue: &T,
    rectangle: &Rectangle,
    filter: &CellFilter,
    check: &mut InterruptCheck<'_>,
    mut f: F,
) -> Result<()>
where
    T: TissueAccessor,
    F: FnMut(&CellHandle) -> Result<()>,
{
    let (width, height) = tissue.size();
    let Some(region) = rectangle.clip_to(width, height) else {
        return Ok(());
    };

    for x in region.lower_corner.x..=region.upper_corner.x {
        for y in region.lower_corner.y..=region.upper_corner.y {
            check.tick()?;
            let cell = tissue.cell_at(Position::new(x, y));
            if cell.is_wild_type() {
                continue;
            }
            if filter.accepts(tissue, cell.species_id)? {
                f(&cell)?;
            }
        }
    }
    Ok(())
}

/// The records of the cells in `rectangle` that pass `filter`, x-major.
pub fn query_cells<T: TissueAccessor>(
    tissue: &T,
    rectangle: &Rectangle,
    filter: &CellFilter,
    check: &mut InterruptCheck<'_>,
) -> Result<Vec<CellRecord>> {
    let mut records = Vec::new();
    for_each_selected(tissue, rectangle, filter, check, |cell| {
        records.push(wrap_cell(tissue, cell)?);
        Ok(())
    })?;
    debug!("Query on {} selected {} cells.", rectangle, records.len());
    Ok(records)
}

/// How many cells [`query_cells`] would return.
pub fn count_cells<T: TissueAccessor>(
    tissue: &T,
    rectangle: &Rectangle,
    filter: &CellFilter,
    check: &mut InterruptCheck<'_>,
) -> Result<usize> {
    let mut total = 0;
    for_each_selected(tissue, rectangle, filter, check, |_| {
        total += 1;
        Ok(())
    })?;
    Ok(total)
}

/// The record of the cell at `position`, wild-type positions included.
pub fn cell_at<T: TissueAccessor>(tissue: &T, position: Position) -> Result<CellRecord> {
    if !tissue.is_valid(position) {
        let (width, height) = tissue.size();
        return Err(SamplingError::OutOfTissue { position, width, height });
    }
    wrap_cell(tissue, &tissue.cell_at(position))
}
