//! Single-cell selection under the interior or the border-growth policy.

use crate::error::{Result, SamplingError};
use crate::interrupt::InterruptCheck;
use crate::query::wrap_cell;
use crate::tissue::{CellHandle, TissueAccessor};
use log::{debug, trace};
use rand::Rng;
use sampler_common::{CellRecord, Direction, Position, Rectangle, SpeciesId};
use std::collections::BTreeSet;

/// Number of candidates the border policy draws before giving up.
pub const MAX_BORDER_ATTEMPTS: usize = 1000;

/// Which cells a selection may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Any cell of the species.
    Interior,
    /// Only cells from which some straight line of unoccupied positions
    /// reaches the tissue boundary.
    Border,
}

impl SelectionPolicy {
    /// The policy matching the engine's growth model.
    pub fn for_tissue<T: TissueAccessor>(tissue: &T) -> Self {
        if tissue.duplicate_internal_cells() {
            SelectionPolicy::Interior
        } else {
            SelectionPolicy::Border
        }
    }
}

/// Outcome of a bounded border-cell search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderSearch {
    Found(CellHandle),
    Exhausted,
}

/// Whether, walking from `position` along one of the 8 directions, the tissue
/// boundary is crossed before any occupied position is met.
pub fn is_border_cell<T: TissueAccessor>(
    tissue: &T,
    position: Position,
    check: &mut InterruptCheck<'_>,
) -> Result<bool> {
    for direction in Direction::ALL {
        let mut current = position;
        loop {
            check.tick()?;
            match current.step(direction) {
                Some(next) if tissue.is_valid(next) => {
                    if !tissue.cell_at(next).is_wild_type() {
                        break;
                    }
                    current = next;
                }
                _ => return Ok(true),
            }
        }
    }
    Ok(false)
}

/// Draws up to `max_attempts` candidates of `species_ids` through the engine's
/// weighted choice and returns the first lying on a border.
pub fn search_border_cell<T, R>(
    tissue: &T,
    species_ids: &BTreeSet<SpeciesId>,
    rectangle: Option<&Rectangle>,
    rng: &mut R,
    max_attempts: usize,
    check: &mut InterruptCheck<'_>,
) -> Result<BorderSearch>
where
    T: TissueAccessor,
    R: Rng + ?Sized,
{
    for attempt in 1..=max_attempts {
        let candidate = tissue
            .weighted_random_cell(species_ids, rectangle, rng)
            .ok_or(SamplingError::NoCandidateCell)?;
        if is_border_cell(tissue, candidate.position, check)? {
            debug!("Border cell found at {} after {} attempts.", candidate.position, attempt);
            return Ok(BorderSearch::Found(candidate));
        }
        trace!("Candidate at {} is surrounded, retrying.", candidate.position);
    }
    Ok(BorderSearch::Exhausted)
}

/// Chooses one cell of `species_ids`, optionally inside `rectangle`.
pub fn choose_cell<T, R>(
    tissue: &T,
    species_ids: &BTreeSet<SpeciesId>,
    policy: SelectionPolicy,
    rectangle: Option<&Rectangle>,
    rng: &mut R,
    check: &mut InterruptCheck<'_>,
) -> Result<CellRecord>
where
    T: TissueAccessor,
    R: Rng + ?Sized,
{
    let cell = match policy {
        SelectionPolicy::Interior => tissue
            .weighted_random_cell(species_ids, rectangle, rng)
            .ok_or(SamplingError::NoCandidateCell)?,
        SelectionPolicy::Border => {
            match search_border_cell(tissue, species_ids, rectangle, rng, MAX_BORDER_ATTEMPTS, check)? {
                BorderSearch::Found(cell) => cell,
                BorderSearch::Exhausted => {
                    return Err(SamplingError::NoBorderCellFound { attempts: MAX_BORDER_ATTEMPTS })
                }
            }
        }
    };
    wrap_cell(tissue, &cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridTissue;
    use crate::interrupt::NeverInterrupt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn never() -> InterruptCheck<'static> {
        InterruptCheck::new(&NeverInterrupt, 1)
    }

    /// A at (5, 5) with B on all 8 neighbours in a 11x11 tissue.
    fn enclosed_tissue() -> (GridTissue, SpeciesId, SpeciesId) {
        let mut tissue = GridTissue::new("enclosed", 11, 11).unwrap();
        let a = tissue.add_genotype("A", 1.0, 0.0).unwrap();
        let b = tissue.add_genotype("B", 1.0, 0.0).unwrap();
        tissue.insert_cell(a, Position::new(5, 5), 0.0).unwrap();
        for direction in Direction::ALL {
            let neighbour = Position::new(5, 5).step(direction).unwrap();
            tissue.insert_cell(b, neighbour, 0.0).unwrap();
        }
        (tissue, a, b)
    }

    #[test]
    fn test_enclosed_cell_is_not_on_border() {
        let (tissue, _, _) = enclosed_tissue();
        assert!(!is_border_cell(&tissue, Position::new(5, 5), &mut never()).unwrap());
        assert!(is_border_cell(&tissue, Position::new(4, 4), &mut never()).unwrap());
    }

    #[test]
    fn test_free_line_to_boundary_makes_a_border() {
        let (mut tissue, _, b) = enclosed_tissue();
        // Open the east side, then block the corridor further on.
        let mut reopened = GridTissue::new("open", 11, 11).unwrap();
        let a = reopened.add_genotype("A", 1.0, 0.0).unwrap();
        let b2 = reopened.add_genotype("B", 1.0, 0.0).unwrap();
        reopened.insert_cell(a, Position::new(5, 5), 0.0).unwrap();
        for direction in Direction::ALL.into_iter().filter(|d| *d != Direction { dx: 1, dy: 0 }) {
            reopened.insert_cell(b2, Position::new(5, 5).step(direction).unwrap(), 0.0).unwrap();
        }
        assert!(is_border_cell(&reopened, Position::new(5, 5), &mut never()).unwrap());

        reopened.insert_cell(b2, Position::new(8, 5), 0.0).unwrap();
        assert!(!is_border_cell(&reopened, Position::new(5, 5), &mut never()).unwrap());

        tissue.insert_cell(b, Position::new(0, 0), 0.0).unwrap();
        assert!(is_border_cell(&tissue, Position::new(0, 0), &mut never()).unwrap());
    }

    #[test]
    fn test_border_policy_exhausts_on_enclosed_species() {
        let (tissue, a, _) = enclosed_tissue();
        let mut rng = StdRng::seed_from_u64(1);
        let result = choose_cell(&tissue, &BTreeSet::from([a]), SelectionPolicy::Border, None, &mut rng, &mut never());
        assert_eq!(result, Err(SamplingError::NoBorderCellFound { attempts: MAX_BORDER_ATTEMPTS }));

        let outcome =
            search_border_cell(&tissue, &BTreeSet::from([a]), None, &mut rng, 3, &mut never()).unwrap();
        assert_eq!(outcome, BorderSearch::Exhausted);
    }

    #[test]
    fn test_interior_policy_ignores_enclosure() {
        let (tissue, a, _) = enclosed_tissue();
        let mut rng = StdRng::seed_from_u64(1);
        let record =
            choose_cell(&tissue, &BTreeSet::from([a]), SelectionPolicy::Interior, None, &mut rng, &mut never())
                .unwrap();
        assert_eq!((record.position_x, record.position_y), (5, 5));
        assert_eq!(record.genotype, "A");
    }

    #[test]
    fn test_border_policy_on_solid_block() {
        let mut tissue = GridTissue::new("block", 12, 12).unwrap();
        let a = tissue.add_genotype("A", 1.0, 0.0).unwrap();
        for x in 2..10 {
            for y in 2..10 {
                tissue.insert_cell(a, Position::new(x, y), 0.0).unwrap();
            }
        }
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let record =
                choose_cell(&tissue, &BTreeSet::from([a]), SelectionPolicy::Border, None, &mut rng, &mut never())
                    .unwrap();
            let (x, y) = (record.position_x, record.position_y);
            assert!(x == 2 || x == 9 || y == 2 || y == 9, "({}, {}) is internal", x, y);
        }
    }

    #[test]
    fn test_missing_species_and_policy_flag() {
        let (mut tissue, _, _) = enclosed_tissue();
        let c = tissue.add_genotype("C", 1.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let result = choose_cell(&tissue, &BTreeSet::from([c]), SelectionPolicy::Interior, None, &mut rng, &mut never());
        assert_eq!(result, Err(SamplingError::NoCandidateCell));

        assert_eq!(SelectionPolicy::for_tissue(&tissue), SelectionPolicy::Interior);
        tissue.set_duplicate_internal_cells(false);
        assert_eq!(SelectionPolicy::for_tissue(&tissue), SelectionPolicy::Border);
    }
}
