//! Spatial sampling and query over a 2-D tumour tissue.
//!
//! The core reads a tissue through [`TissueAccessor`] and never mutates it:
//! filtered cell queries, the tumour bounding box, the spiral bucket search
//! for dense sample regions, interior/border cell selection and the ordering
//! of lineage edges. [`GridTissue`] is an in-memory engine implementing the
//! accessor, and [`populate::build_tissue`] fills one from a configuration.

pub mod error;
pub mod grid;
pub mod interrupt;
pub mod lineage;
pub mod output;
pub mod populate;
pub mod query;
pub mod report;
pub mod sampler;
pub mod search;
pub mod selector;
pub mod tissue;

pub use error::{Result, SamplingError};
pub use grid::{AddedCell, GridTissue, TissueSample};
pub use interrupt::{CancelFlag, Deadline, Interrupt, InterruptCheck, NeverInterrupt, DEFAULT_CHECK_INTERVAL};
pub use lineage::{lineage_table, sorted_timed_edges, TimedLineageEdge};
pub use query::{CellFilter, CellQuery};
pub use sampler::Sampler;
pub use search::{search_sample, spiral_order, tumor_bounding_box};
pub use selector::{choose_cell, is_border_cell, BorderSearch, SelectionPolicy, MAX_BORDER_ATTEMPTS};
pub use tissue::{CellHandle, SpeciesCatalog, TissueAccessor};
