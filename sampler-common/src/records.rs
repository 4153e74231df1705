use crate::geometry::{AxisPosition, Rectangle};
use crate::species::{CellId, SpeciesId};
use serde::{Deserialize, Serialize};

/// One cell, as reported by queries and selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    /// `None` for wild-type positions.
    pub cell_id: Option<CellId>,
    /// `None` for wild-type positions.
    pub species_id: Option<SpeciesId>,
    pub genotype: String,
    pub epistate: String,
    pub position_x: AxisPosition,
    pub position_y: AxisPosition,
    /// `None` for wild-type positions.
    pub birth_time: Option<f64>,
}

/// A row of the species table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRow {
    pub genotype: String,
    pub epistate: String,
    pub growth_rate: f64,
    pub death_rate: f64,
    pub switch_rate: Option<f64>,
}

/// Number of cells currently in one species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub genotype: String,
    pub epistate: String,
    pub counts: usize,
}

/// A named tissue sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleInfo {
    pub name: String,
    pub xmin: AxisPosition,
    pub ymin: AxisPosition,
    pub xmax: AxisPosition,
    pub ymax: AxisPosition,
    /// Number of non wild-type cells in the sampled region.
    #[serde(rename = "tumoural cells")]
    pub tumoural_cells: usize,
    pub time: f64,
}

/// A cell placed by hand rather than produced by duplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedCellRow {
    pub genotype: String,
    pub epistate: String,
    pub position_x: AxisPosition,
    pub position_y: AxisPosition,
    pub time: f64,
}

/// A species-to-species transition with the time it first occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageRow {
    pub ancestor: String,
    pub progeny: String,
    pub first_cross: f64,
}

/// Flat rendering of a rectangle, one column per bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectangleRow {
    pub xmin: AxisPosition,
    pub ymin: AxisPosition,
    pub xmax: AxisPosition,
    pub ymax: AxisPosition,
}

impl From<Rectangle> for RectangleRow {
    fn from(rect: Rectangle) -> Self {
        Self {
            xmin: rect.lower_corner.x,
            ymin: rect.lower_corner.y,
            xmax: rect.upper_corner.x,
            ymax: rect.upper_corner.y,
        }
    }
}
