//! Tumour bounding box and sample-region search.
//!
//! The search partitions the tumour bounding box into a grid of
//! `width` x `height` buckets and visits them ring by ring, starting from the
//! outermost ring of the bucket grid and moving one bucket inwards at a time.
//! Each ring is walked along its top edge left to right, its right edge top
//! to bottom, its bottom edge right to left, its lower-left corner and
//! finally its left edge bottom to top. The first bucket holding more than the
//! requested number of cells wins.

use crate::error::{Result, SamplingError};
use crate::interrupt::InterruptCheck;
use crate::tissue::TissueAccessor;
use log::{debug, trace};
use sampler_common::{AxisPosition, Position, Rectangle, SpeciesId};
use std::collections::BTreeSet;

/// The smallest rectangle containing every non wild-type cell.
///
/// On a tissue without cells the result is degenerate: its lower corner is
/// the tissue size and its upper corner the origin.
pub fn tumor_bounding_box<T: TissueAccessor>(tissue: &T, check: &mut InterruptCheck<'_>) -> Result<Rectangle> {
    let (width, height) = tissue.size();
    let mut lower_corner = Position::new(width, height);
    let mut upper_corner = Position::new(0, 0);

    for x in 0..width {
        for y in 0..height {
            check.tick()?;
            if tissue.cell_at(Position::new(x, y)).is_wild_type() {
                continue;
            }
            lower_corner.x = lower_corner.x.min(x);
            lower_corner.y = lower_corner.y.min(y);
            upper_corner.x = upper_corner.x.max(x);
            upper_corner.y = upper_corner.y.max(y);
        }
    }

    Ok(Rectangle::new(lower_corner, upper_corner))
}

/// The walk of one ring of the bucket grid, whose buckets have coordinates
/// in `[low, high_x] x [low, high_y]`.
fn ring(low: u32, high_x: u32, high_y: u32) -> impl Iterator<Item = (u32, u32)> {
    let top = (low..high_x).map(move |x| (x, low));
    let right = (low..high_y).map(move |y| (high_x, y));
    let bottom = (low + 1..=high_x).rev().map(move |x| (x, high_y));
    let corner = std::iter::once((low, high_y));
    let left = (low + 1..high_y).rev().map(move |y| (low, y));
    top.chain(right).chain(bottom).chain(corner).chain(left)
}

/// Bucket coordinates in search order for a `grid_width` x `grid_height` grid.
///
/// Ring `diag` spans `[diag, grid_width - diag] x [diag, grid_height - diag]`,
/// for `diag` in `0..ceil(min(grid_width, grid_height) / 2)`.
pub fn spiral_order(grid_width: u32, grid_height: u32) -> impl Iterator<Item = (u32, u32)> {
    let diag_size = grid_width.min(grid_height).div_ceil(2);
    (0..diag_size).flat_map(move |diag| ring(diag, grid_width - diag, grid_height - diag))
}

/// Number of cells of `species_ids` in `region`.
fn count_in<T: TissueAccessor>(
    tissue: &T,
    species_ids: &BTreeSet<SpeciesId>,
    region: &Rectangle,
    check: &mut InterruptCheck<'_>,
) -> Result<usize> {
    let mut counter = 0;
    for position in region.positions() {
        check.tick()?;
        let cell = tissue.cell_at(position);
        if !cell.is_wild_type() && species_ids.contains(&cell.species_id) {
            counter += 1;
        }
    }
    Ok(counter)
}

/// The tissue region covered by bucket `(grid_x, grid_y)`, clipped to the
/// tissue; `None` when the bucket lies outside it.
fn bucket_region<T: TissueAccessor>(
    tissue: &T,
    bounding_box: &Rectangle,
    grid_x: u32,
    grid_y: u32,
    width: AxisPosition,
    height: AxisPosition,
) -> Option<Rectangle> {
    let x = u64::from(bounding_box.lower_corner.x) + u64::from(grid_x) * u64::from(width);
    let y = u64::from(bounding_box.lower_corner.y) + u64::from(grid_y) * u64::from(height);
    let origin = Position::new(u32::try_from(x).ok()?, u32::try_from(y).ok()?);
    let (tissue_width, tissue_height) = tissue.size();
    Rectangle::with_size(origin, width, height).ok()?.clip_to(tissue_width, tissue_height)
}

/// Finds a `width` x `height` region, aligned to the bucket grid laid over the
/// tumour bounding box, holding strictly more than `num_of_cells` cells of
/// `species_ids`. The returned rectangle is clipped to the tissue.
pub fn search_sample<T: TissueAccessor>(
    tissue: &T,
    species_ids: &BTreeSet<SpeciesId>,
    num_of_cells: usize,
    width: AxisPosition,
    height: AxisPosition,
    check: &mut InterruptCheck<'_>,
) -> Result<Rectangle> {
    if width == 0 || height == 0 {
        return Err(sampler_common::DimensionError::EmptySize { width, height }.into());
    }

    let bounding_box = tumor_bounding_box(tissue, check)?;
    let grid_width = bounding_box.width().div_ceil(width);
    let grid_height = bounding_box.height().div_ceil(height);
    debug!(
        "Searching a {}x{} sample with more than {} cells over a {}x{} bucket grid laid on {}.",
        width, height, num_of_cells, grid_width, grid_height, bounding_box
    );

    for (grid_x, grid_y) in spiral_order(grid_width, grid_height) {
        let Some(region) = bucket_region(tissue, &bounding_box, grid_x, grid_y, width, height) else {
            continue;
        };
        let counted_cells = count_in(tissue, species_ids, &region, check)?;
        trace!("Bucket ({}, {}) at {} holds {} cells.", grid_x, grid_y, region, counted_cells);
        if counted_cells > num_of_cells {
            debug!("Sample found at {} with {} cells.", region, counted_cells);
            return Ok(region);
        }
    }

    Err(SamplingError::InfeasibleRegion { num_of_cells, width, height })
}
