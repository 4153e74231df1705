//! Species-transition edges and their deterministic ordering.

use crate::error::Result;
use crate::tissue::SpeciesCatalog;
use sampler_common::{LineageRow, SpeciesId};
use std::cmp::Ordering;

/// A transition from `ancestor` to `progeny` species, with the time it was
/// first observed. Either end may be the wild-type sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedLineageEdge {
    pub ancestor: SpeciesId,
    pub progeny: SpeciesId,
    pub time: f64,
}

impl TimedLineageEdge {
    pub fn new(ancestor: SpeciesId, progeny: SpeciesId, time: f64) -> Self {
        Self { ancestor, progeny, time }
    }

    /// Time ascending, then ancestor id, then progeny id.
    pub fn order(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.ancestor.cmp(&other.ancestor))
            .then(self.progeny.cmp(&other.progeny))
    }
}

/// Sorts the edges by (time, ancestor, progeny). Equal edges are all kept.
pub fn sorted_timed_edges<I>(edges: I) -> Vec<TimedLineageEdge>
where
    I: IntoIterator<Item = TimedLineageEdge>,
{
    let mut timed_edges: Vec<TimedLineageEdge> = edges.into_iter().collect();
    timed_edges.sort_by(TimedLineageEdge::order);
    timed_edges
}

/// Sorts the edges and names their ends through `catalog`.
/// Every non wild-type id must be known to the catalog.
pub fn lineage_table<C: SpeciesCatalog>(catalog: &C, edges: &[TimedLineageEdge]) -> Result<Vec<LineageRow>> {
    sorted_timed_edges(edges.iter().copied())
        .into_iter()
        .map(|edge| {
            Ok(LineageRow {
                ancestor: catalog.name_of(edge.ancestor)?,
                progeny: catalog.name_of(edge.progeny)?,
                first_cross: edge.time,
            })
        })
        .collect()
}
