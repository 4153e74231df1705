use sampler_common::{AxisPosition, DimensionError, Position, SpeciesId};
use thiserror::Error;

/// Failures of the sampling and query operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplingError {
    /// A corner was not 2-dimensional, or a size was zero.
    #[error(transparent)]
    InvalidDimension(#[from] DimensionError),

    /// No bucket of the search grid holds more than the requested number of cells.
    #[error("no {width}x{height} region holding more than {num_of_cells} cells found")]
    InfeasibleRegion {
        num_of_cells: usize,
        width: AxisPosition,
        height: AxisPosition,
    },

    /// The border-growth selection used up its attempts.
    #[error("missed to find a border cell in {attempts} attempts")]
    NoBorderCellFound { attempts: usize },

    /// A species id is missing from the catalog.
    #[error("unknown species id {0}")]
    UnknownSpeciesId(SpeciesId),

    /// A species or genotype name is missing from the catalog.
    #[error("unknown species or genotype \"{0}\"")]
    UnknownName(String),

    /// The caller's interrupt probe fired during a scan.
    #[error("scan cancelled by the user")]
    Cancelled,

    /// A position outside the tissue was addressed.
    #[error("position {position} lies outside the {width}x{height} tissue")]
    OutOfTissue {
        position: Position,
        width: AxisPosition,
        height: AxisPosition,
    },

    /// The engine's random draw found no cell of the requested species.
    #[error("no cell of the requested species in the selected region")]
    NoCandidateCell,
}

impl SamplingError {
    /// Whether the error reports a user abort rather than a bad request.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SamplingError::Cancelled)
    }
}

pub type Result<T, E = SamplingError> = std::result::Result<T, E>;
