pub mod config;
pub mod geometry;
pub mod records;
pub mod species;

// Re-export key types for easier use by dependent crates
pub use config::{SamplerConfig, TissueConfig, GenotypeConfig, EpigeneticConfig, PlacementConfig, PlacementShape, SampleConfig, SamplingConfig, OutputConfig};
pub use geometry::{AxisPosition, DimensionError, Direction, Position, Rectangle};
pub use records::{AddedCellRow, CellRecord, CountRow, LineageRow, RectangleRow, SampleInfo, SpeciesRow};
pub use species::{CellId, SpeciesDescriptor, SpeciesId, EPIGENETIC_STATES, WILD_TYPE_NAME, WILD_TYPE_SPECIES};
