use serde::{Deserialize, Serialize};

/// Identifier of a species registered in the tissue.
pub type SpeciesId = u32;

/// Identifier of a cell.
pub type CellId = u64;

/// The "no species" sentinel marking wild-type (unoccupied) positions.
pub const WILD_TYPE_SPECIES: SpeciesId = SpeciesId::MAX;

/// Name used for the wild-type sentinel in reports.
pub const WILD_TYPE_NAME: &str = "Wild-type";

/// The epigenetic states a species signature may take.
pub const EPIGENETIC_STATES: [&str; 3] = ["+", "-", ""];

/// Description of one species: a genotype paired with an epigenetic signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDescriptor {
    pub id: SpeciesId,
    pub genotype_name: String,
    /// "+", "-" or "" for genotypes without epigenetic states.
    pub signature: String,
    pub duplication_rate: f64,
    pub death_rate: f64,
    pub switch_rate: Option<f64>,
}

impl SpeciesDescriptor {
    /// The species name, i.e., the genotype name followed by the signature.
    pub fn name(&self) -> String {
        format!("{}{}", self.genotype_name, self.signature)
    }
}
