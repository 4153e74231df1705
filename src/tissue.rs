//! The seam between the sampling core and whatever engine owns the tissue.
//!
//! The core never mutates a tissue: it reads occupancy through
//! [`TissueAccessor`], species metadata through [`SpeciesCatalog`], and asks the
//! engine for its weighted random draw when selecting cells.

use crate::error::{Result, SamplingError};
use rand::Rng;
use sampler_common::{
    AxisPosition, CellId, Position, Rectangle, SpeciesDescriptor, SpeciesId, WILD_TYPE_NAME, WILD_TYPE_SPECIES,
};
use std::collections::BTreeSet;

/// What the tissue holds at one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellHandle {
    pub position: Position,
    /// `WILD_TYPE_SPECIES` for unoccupied positions.
    pub species_id: SpeciesId,
    pub cell_id: CellId,
    pub birth_time: Option<f64>,
}

impl CellHandle {
    pub fn wild_type(position: Position) -> Self {
        Self { position, species_id: WILD_TYPE_SPECIES, cell_id: 0, birth_time: None }
    }

    #[inline(always)]
    pub fn is_wild_type(&self) -> bool {
        self.species_id == WILD_TYPE_SPECIES
    }
}

/// Read access to the registered species.
pub trait SpeciesCatalog {
    /// All the species, in registration order.
    fn species(&self) -> &[SpeciesDescriptor];

    fn descriptor(&self, species_id: SpeciesId) -> Option<&SpeciesDescriptor> {
        self.species().iter().find(|species| species.id == species_id)
    }

    /// The species name, "Wild-type" for the sentinel.
    fn name_of(&self, species_id: SpeciesId) -> Result<String> {
        if species_id == WILD_TYPE_SPECIES {
            return Ok(WILD_TYPE_NAME.to_string());
        }
        self.descriptor(species_id)
            .map(SpeciesDescriptor::name)
            .ok_or(SamplingError::UnknownSpeciesId(species_id))
    }

    /// The epigenetic signature string: "+", "-" or "".
    fn signature_string_of(&self, species_id: SpeciesId) -> Result<&str> {
        self.descriptor(species_id)
            .map(|species| species.signature.as_str())
            .ok_or(SamplingError::UnknownSpeciesId(species_id))
    }

    fn species_by_name(&self, name: &str) -> Result<&SpeciesDescriptor> {
        self.species()
            .iter()
            .find(|species| species.name() == name)
            .ok_or_else(|| SamplingError::UnknownName(name.to_string()))
    }

    /// Ids of every species whose genotype is among `genotype_names`.
    /// Unknown names simply contribute nothing.
    fn ids_of_genotypes<S: AsRef<str>>(&self, genotype_names: &[S]) -> BTreeSet<SpeciesId> {
        self.species()
            .iter()
            .filter(|species| genotype_names.iter().any(|name| name.as_ref() == species.genotype_name))
            .map(|species| species.id)
            .collect()
    }

    /// Ids of the species of one genotype; fails when the genotype is unknown.
    fn ids_of_genotype(&self, genotype_name: &str) -> Result<BTreeSet<SpeciesId>> {
        let ids = self.ids_of_genotypes(&[genotype_name]);
        if ids.is_empty() {
            return Err(SamplingError::UnknownName(genotype_name.to_string()));
        }
        Ok(ids)
    }

    fn all_species_ids(&self) -> BTreeSet<SpeciesId> {
        self.species().iter().map(|species| species.id).collect()
    }
}

/// Read access to a 2-D tissue.
pub trait TissueAccessor: SpeciesCatalog {
    /// `(width, height)` of the tissue.
    fn size(&self) -> (AxisPosition, AxisPosition);

    /// The cell at `position`. Positions outside the tissue read as wild-type.
    fn cell_at(&self, position: Position) -> CellHandle;

    fn is_valid(&self, position: Position) -> bool {
        let (width, height) = self.size();
        position.x < width && position.y < height
    }

    /// Number of cells currently in a species.
    fn count_of(&self, species_id: SpeciesId) -> usize;

    /// Whether internal (fully surrounded) cells may be chosen for duplication.
    /// When false the engine follows the border-growth model.
    fn duplicate_internal_cells(&self) -> bool {
        true
    }

    /// The engine's weighted random choice of a cell among the species in
    /// `species_ids`, optionally restricted to `rectangle`.
    fn weighted_random_cell<R: Rng + ?Sized>(
        &self,
        species_ids: &BTreeSet<SpeciesId>,
        rectangle: Option<&Rectangle>,
        rng: &mut R,
    ) -> Option<CellHandle>;

    /// The whole tissue as an inclusive rectangle.
    fn extent(&self) -> Rectangle {
        let (width, height) = self.size();
        Rectangle::new(
            Position::new(0, 0),
            Position::new(width.saturating_sub(1), height.saturating_sub(1)),
        )
    }
}
