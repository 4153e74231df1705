use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sampler_common::{AxisPosition, Position, Rectangle, RectangleRow, SamplerConfig, EPIGENETIC_STATES};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tissue_sampler::output::TableWriter;
use tissue_sampler::populate::build_tissue;
use tissue_sampler::report::{added_cells_table, counts_table, samples_info, species_table};
use tissue_sampler::{
    CellQuery, Deadline, GridTissue, Interrupt, NeverInterrupt, Sampler, SamplingError, SelectionPolicy, SpeciesCatalog,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the tissue configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Abort scans running longer than this many seconds
    #[arg(long)]
    time_limit_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the cells passing position and name filters
    Cells {
        /// Lower corner, e.g. `--lower 0,0`
        #[arg(long, value_delimiter = ',', requires = "upper")]
        lower: Option<Vec<AxisPosition>>,
        /// Upper corner, e.g. `--upper 99,99`
        #[arg(long, value_delimiter = ',', requires = "lower")]
        upper: Option<Vec<AxisPosition>>,
        /// Genotypes to keep (all when omitted)
        #[arg(long)]
        genotype: Vec<String>,
        /// Epigenetic states to keep: "+", "-" or "" (all when omitted)
        #[arg(long)]
        epistate: Vec<String>,
    },
    /// Show the cell at one position
    Cell { x: AxisPosition, y: AxisPosition },
    /// Bounding box of the non wild-type cells
    Bbox,
    /// Find a sample region holding more than `cells` cells of a genotype
    Search {
        #[arg(long)]
        genotype: String,
        #[arg(long)]
        cells: usize,
        #[arg(long)]
        width: AxisPosition,
        #[arg(long)]
        height: AxisPosition,
    },
    /// Choose a random cell of a genotype
    Choose {
        /// Genotype to choose from (any species when omitted)
        #[arg(long)]
        genotype: Option<String>,
        /// Selection policy; defaults to the one of the configured growth model
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
        #[arg(long, value_delimiter = ',', requires = "upper")]
        lower: Option<Vec<AxisPosition>>,
        #[arg(long, value_delimiter = ',', requires = "lower")]
        upper: Option<Vec<AxisPosition>>,
        /// Overrides `[sampling].seed`
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Lineage edges ordered by first occurrence
    Lineage,
    /// Species table
    Species,
    /// Number of cells per species
    Counts,
    /// Samples taken from the tissue
    Samples,
    /// Cells placed by hand
    Added,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Interior,
    Border,
}

impl From<PolicyArg> for SelectionPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Interior => SelectionPolicy::Interior,
            PolicyArg::Border => SelectionPolicy::Border,
        }
    }
}

/// Builds the query of the `cells` subcommand. An omitted filter flag keeps
/// every genotype (or every epigenetic state) of `catalog`.
fn cell_query<C: SpeciesCatalog>(
    catalog: &C,
    lower: Option<Vec<AxisPosition>>,
    upper: Option<Vec<AxisPosition>>,
    mut genotypes: Vec<String>,
    mut epistates: Vec<String>,
) -> Result<CellQuery> {
    let rectangle = match (lower, upper) {
        (Some(lower), Some(upper)) => Some(Rectangle::from_corners(&lower, &upper)?),
        _ => None,
    };
    if genotypes.is_empty() && epistates.is_empty() {
        return Ok(rectangle.map_or(CellQuery::All, CellQuery::ByPosition));
    }
    if genotypes.is_empty() {
        for species in catalog.species() {
            if !genotypes.contains(&species.genotype_name) {
                genotypes.push(species.genotype_name.clone());
            }
        }
    }
    if epistates.is_empty() {
        epistates = EPIGENETIC_STATES.iter().map(|s| s.to_string()).collect();
    }
    Ok(match rectangle {
        Some(rectangle) => CellQuery::ByPositionAndName { rectangle, genotypes, epistates },
        None => CellQuery::ByName { genotypes, epistates },
    })
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    let args = Args::parse();
    info!("Starting tissue sampler...");

    // --- Load Configuration ---
    let config = SamplerConfig::load(&args.config)?;
    let tissue = build_tissue(&config)?;
    let writer = TableWriter::from_config(&config.output);

    let deadline;
    let interrupt: &dyn Interrupt = match args.time_limit_secs {
        Some(secs) => {
            deadline = Deadline(Instant::now() + Duration::from_secs(secs));
            &deadline
        }
        None => &NeverInterrupt,
    };
    let sampler = Sampler::with_interrupt(&tissue, interrupt, config.sampling.interrupt_check_interval);

    let start_time = Instant::now();
    let outcome = run_command(args.command, &sampler, &config, &writer);
    debug!("Command ran in {:.3} s.", start_time.elapsed().as_secs_f64());

    if let Err(e) = outcome {
        if e.downcast_ref::<SamplingError>().is_some_and(SamplingError::is_cancellation) {
            error!("Time limit reached, the scan was aborted.");
        }
        return Err(e);
    }

    info!("Sampling Complete.");
    Ok(())
}

fn run_command(
    command: Command,
    sampler: &Sampler<'_, GridTissue>,
    config: &SamplerConfig,
    writer: &TableWriter,
) -> Result<()> {
    let tissue = sampler.tissue();
    match command {
        Command::Cells { lower, upper, genotype, epistate } => {
            let query = cell_query(tissue, lower, upper, genotype, epistate)?;
            let cells = sampler.query(&query)?;
            info!("{} cells selected.", cells.len());
            writer.write_table("cells", &cells)?;
        }
        Command::Cell { x, y } => {
            let cell = sampler.cell_at(Position::new(x, y))?;
            info!("Cell at ({},{}): {} {}", x, y, cell.genotype, cell.epistate);
            writer.write_table("cell", &[cell])?;
        }
        Command::Bbox => {
            let bounding_box = sampler.bounding_box()?;
            if bounding_box.is_degenerate() {
                info!("The tissue holds no tumour cells.");
            } else {
                info!("Tumour bounding box: {}", bounding_box);
            }
            writer.write_table("bbox", &[RectangleRow::from(bounding_box)])?;
        }
        Command::Search { genotype, cells, width, height } => {
            let region = sampler.search_sample_for(&genotype, cells, width, height)?;
            info!("Sample region found: {}", region);
            writer.write_table("search", &[RectangleRow::from(region)])?;
        }
        Command::Choose { genotype, policy, lower, upper, seed } => {
            let species_ids = match &genotype {
                Some(name) => tissue.ids_of_genotype(name)?,
                None => tissue.all_species_ids(),
            };
            let rectangle = match (lower, upper) {
                (Some(lower), Some(upper)) => Some(Rectangle::from_corners(&lower, &upper)?),
                _ => None,
            };
            let policy = policy.map_or_else(|| SelectionPolicy::for_tissue(tissue), SelectionPolicy::from);
            let mut rng = StdRng::seed_from_u64(seed.unwrap_or(config.sampling.seed));
            let cell = sampler.choose_cell_with(&species_ids, policy, rectangle.as_ref(), &mut rng)?;
            info!(
                "Chosen cell ({:?} policy): {}{} at ({},{})",
                policy, cell.genotype, cell.epistate, cell.position_x, cell.position_y
            );
            writer.write_table("chosen", &[cell])?;
        }
        Command::Lineage => {
            let rows = sampler.lineage_table(tissue.lineage_edges())?;
            writer.write_table("lineage", &rows)?;
        }
        Command::Species => {
            writer.write_table("species", &species_table(tissue))?;
        }
        Command::Counts => {
            writer.write_table("counts", &counts_table(tissue))?;
        }
        Command::Samples => {
            writer.write_table("samples", &samples_info(tissue.samples()))?;
        }
        Command::Added => {
            writer.write_table("added", &added_cells_table(tissue, tissue.added_cells())?)?;
        }
    }
    Ok(())
}
