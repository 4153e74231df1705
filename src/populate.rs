//! Builds an in-memory tissue from a [`SamplerConfig`].

use crate::grid::GridTissue;
use crate::tissue::{SpeciesCatalog, TissueAccessor};
use anyhow::Result;
use log::{debug, info, warn};
use rand::distr::Uniform;
use rand::prelude::*;
use rand_distr::Normal;
use sampler_common::{
    GenotypeConfig, PlacementConfig, PlacementShape, Position, Rectangle, SamplerConfig, WILD_TYPE_SPECIES,
};

/// Creates the tissue, registers the genotypes, runs the placements in order
/// and takes the configured samples. Placements draw from a `StdRng` seeded
/// with `[sampling].seed`, so equal configurations give equal tissues.
pub fn build_tissue(config: &SamplerConfig) -> Result<GridTissue> {
    let mut tissue = GridTissue::new(&config.tissue.name, config.tissue.width, config.tissue.height)?;
    for genotype in &config.genotypes {
        register_genotype(&mut tissue, genotype)?;
    }
    tissue.set_duplicate_internal_cells(config.sampling.duplicate_internal_cells);

    let mut rng = StdRng::seed_from_u64(config.sampling.seed);
    for placement in &config.placements {
        let placed = run_placement(&mut tissue, placement, &mut rng)?;
        info!("Placed {} cells of species {}.", placed, placement.species);
    }

    for sample in &config.samples {
        let region = Rectangle::from_corners(&sample.lower, &sample.upper)?;
        tissue.sample_tissue(&sample.name, region, sample.time)?;
    }

    info!(
        "Tissue '{}' ({}x{}) built with {} cells.",
        tissue.name(),
        config.tissue.width,
        config.tissue.height,
        tissue.num_of_cells()
    );
    Ok(tissue)
}

fn register_genotype(tissue: &mut GridTissue, genotype: &GenotypeConfig) -> Result<()> {
    match &genotype.epigenetic {
        Some(epi) => {
            tissue.add_epigenetic_genotype(
                &genotype.name,
                (genotype.growth_rate, epi.growth_rate_minus),
                (genotype.death_rate, epi.death_rate_minus),
                (epi.switch_plus_minus, epi.switch_minus_plus),
            )?;
        }
        None => {
            tissue.add_genotype(&genotype.name, genotype.growth_rate, genotype.death_rate)?;
        }
    }
    Ok(())
}

/// Runs one placement and returns the number of cells it put in the tissue.
fn run_placement(tissue: &mut GridTissue, placement: &PlacementConfig, rng: &mut StdRng) -> Result<usize> {
    let species_id = tissue.species_by_name(&placement.species)?.id;
    let ancestor = match &placement.ancestor {
        Some(name) => tissue.species_by_name(name)?.id,
        None => WILD_TYPE_SPECIES,
    };

    if let PlacementShape::Cell { position } = &placement.shape {
        let position = Position::from_slice(position, "position")?;
        tissue.place_descendant_cell(ancestor, species_id, position, placement.time)?;
        return Ok(1);
    }

    let positions = shape_positions(tissue, &placement.shape, rng)?;
    let mut placed = 0;
    for position in positions {
        // Bulk placements leave occupied positions alone.
        if !tissue.is_valid(position) || tissue.is_occupied(position) {
            continue;
        }
        tissue.insert_cell(species_id, position, placement.time)?;
        placed += 1;
    }

    if placed == 0 {
        warn!("Placement of species {} put no cell in the tissue.", placement.species);
    } else {
        tissue.record_lineage_edge(ancestor, species_id, placement.time);
    }
    Ok(placed)
}

/// Candidate positions of a bulk placement, possibly outside the tissue.
fn shape_positions(tissue: &GridTissue, shape: &PlacementShape, rng: &mut StdRng) -> Result<Vec<Position>> {
    let (width, height) = tissue.size();
    let positions = match shape {
        PlacementShape::Cell { position } => vec![Position::from_slice(position, "position")?],
        PlacementShape::Rectangle { lower, upper, density } => {
            let Some(region) = Rectangle::from_corners(lower, upper)?.clip_to(width, height) else {
                return Ok(Vec::new());
            };
            region.positions().filter(|_| *density >= 1.0 || rng.random_bool(*density)).collect()
        }
        PlacementShape::Disk { center, radius, density } => {
            let center = Position::from_slice(center, "center")?;
            disk_positions(center, *radius, width, height)
                .into_iter()
                .filter(|_| *density >= 1.0 || rng.random_bool(*density))
                .collect()
        }
        PlacementShape::Cluster { center, sigma, count } => {
            let [cx, cy] = center.as_slice() else {
                anyhow::bail!("Cluster center must have 2 coordinates, got {}.", center.len());
            };
            let dist_x = Normal::new(*cx, *sigma)?;
            let dist_y = Normal::new(*cy, *sigma)?;
            (0..*count)
                .filter_map(|_| {
                    let x = dist_x.sample(rng).round();
                    let y = dist_y.sample(rng).round();
                    (x >= 0.0 && y >= 0.0 && x < width as f64 && y < height as f64)
                        .then(|| Position::new(x as u32, y as u32))
                })
                .collect()
        }
        PlacementShape::Scatter { lower, upper, count } => {
            let region = Rectangle::from_corners(lower, upper)?;
            if region.is_degenerate() {
                anyhow::bail!("Scatter region {} is empty.", region);
            }
            let dist_x = Uniform::new_inclusive(region.lower_corner.x, region.upper_corner.x)?;
            let dist_y = Uniform::new_inclusive(region.lower_corner.y, region.upper_corner.y)?;
            (0..*count).map(|_| Position::new(rng.sample(&dist_x), rng.sample(&dist_y))).collect()
        }
    };
    debug!("Placement shape yields {} candidate positions.", positions.len());
    Ok(positions)
}

/// Positions within euclidean distance `radius` of `center`, clipped to the tissue.
fn disk_positions(center: Position, radius: u32, width: u32, height: u32) -> Vec<Position> {
    let r = i64::from(radius);
    let (cx, cy) = (i64::from(center.x), i64::from(center.y));
    let mut positions = Vec::new();
    for x in (cx - r).max(0)..=(cx + r).min(i64::from(width) - 1) {
        for y in (cy - r).max(0)..=(cy + r).min(i64::from(height) - 1) {
            if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                positions.push(Position::new(x as u32, y as u32));
            }
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [tissue]
        name = "demo"
        width = 60
        height = 40

        [[genotypes]]
        name = "A"
        growth_rate = 0.2
        death_rate = 0.01

        [genotypes.epigenetic]
        switch_plus_minus = 0.01
        switch_minus_plus = 0.01
        growth_rate_minus = 0.08
        death_rate_minus = 0.01

        [[genotypes]]
        name = "B"
        growth_rate = 0.3
        death_rate = 0.02

        [[placements]]
        species = "A+"
        shape = { kind = "rectangle", lower = [10, 10], upper = [19, 19] }

        [[placements]]
        species = "A-"
        time = 1.0
        ancestor = "A+"
        shape = { kind = "disk", center = [15, 15], radius = 8, density = 0.5 }

        [[placements]]
        species = "B"
        time = 3.0
        ancestor = "A-"
        shape = { kind = "cell", position = [40, 30] }

        [[placements]]
        species = "B"
        time = 4.0
        shape = { kind = "cluster", center = [45.0, 20.0], sigma = 3.0, count = 50 }

        [[samples]]
        name = "S1"
        lower = [10, 10]
        upper = [19, 19]
        time = 5.0

        [sampling]
        seed = 17
        duplicate_internal_cells = false
    "#;

    #[test]
    fn test_build_tissue_from_config() {
        let config = SamplerConfig::from_toml_str(CONFIG).unwrap();
        let tissue = build_tissue(&config).unwrap();
        assert_eq!(tissue.name(), "demo");
        assert!(!tissue.duplicate_internal_cells());

        let a_plus = tissue.species_by_name("A+").unwrap().id;
        let a_minus = tissue.species_by_name("A-").unwrap().id;
        let b = tissue.species_by_name("B").unwrap().id;
        assert_eq!(tissue.count_of(a_plus), 100);
        assert!(tissue.count_of(a_minus) > 0);
        assert!(tissue.count_of(b) > 1);
        assert_eq!(tissue.cell_at(Position::new(40, 30)).species_id, b);

        // The dense square is untouched by the disk placed on top of it.
        for position in Rectangle::new(Position::new(10, 10), Position::new(19, 19)).positions() {
            assert_eq!(tissue.cell_at(position).species_id, a_plus);
        }

        assert_eq!(tissue.added_cells().len(), 1);
        let edges: Vec<_> = tissue.lineage_edges().iter().map(|e| (e.ancestor, e.progeny)).collect();
        assert_eq!(edges, vec![(WILD_TYPE_SPECIES, a_plus), (a_plus, a_minus), (a_minus, b), (WILD_TYPE_SPECIES, b)]);
        assert_eq!(tissue.samples()[0].cell_ids.len(), 100);
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = SamplerConfig::from_toml_str(CONFIG).unwrap();
        let first = build_tissue(&config).unwrap();
        let second = build_tissue(&config).unwrap();
        for position in first.extent().positions() {
            assert_eq!(first.cell_at(position), second.cell_at(position));
        }
    }

    #[test]
    fn test_malformed_cell_position() {
        let config = SamplerConfig::from_toml_str(&CONFIG.replace("position = [40, 30]", "position = [40]")).unwrap();
        assert!(build_tissue(&config).is_err());
    }

    #[test]
    fn test_disk_positions() {
        let disk = disk_positions(Position::new(0, 0), 1, 10, 10);
        assert_eq!(disk, vec![Position::new(0, 0), Position::new(0, 1), Position::new(1, 0)]);
        assert_eq!(disk_positions(Position::new(5, 5), 2, 10, 10).len(), 13);
    }
}
