use serde::{Deserialize, Serialize};
use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;

use crate::geometry::Position;
use crate::species::WILD_TYPE_NAME;

// Tissue geometry
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TissueConfig {
    #[serde(default = "default_tissue_name")]
    pub name: String,
    pub width: u32,
    pub height: u32,
}

// Epigenetic behaviour of a genotype. When present, the genotype splits into
// the species "<name>+" and "<name>-"; the genotype-level rates apply to "+".
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EpigeneticConfig {
    pub switch_plus_minus: f64,
    pub switch_minus_plus: f64,
    pub growth_rate_minus: f64,
    pub death_rate_minus: f64,
}

// A genotype and its rates, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GenotypeConfig {
    pub name: String,
    pub growth_rate: f64,
    pub death_rate: f64,
    #[serde(default)]
    pub epigenetic: Option<EpigeneticConfig>,
}

impl GenotypeConfig {
    /// Names of the species this genotype gives rise to.
    pub fn species_names(&self) -> Vec<String> {
        match self.epigenetic {
            Some(_) => vec![format!("{}+", self.name), format!("{}-", self.name)],
            None => vec![self.name.clone()],
        }
    }
}

/// Shape of a placement. Coordinates are given as vectors so that malformed
/// (non 2-D) corners are reported rather than silently truncated.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlacementShape {
    /// A single cell.
    Cell { position: Vec<u32> },
    /// Every position of the rectangle, each occupied with probability `density`.
    Rectangle {
        lower: Vec<u32>,
        upper: Vec<u32>,
        #[serde(default = "default_density")]
        density: f64,
    },
    /// Every position within `radius` of `center`, each occupied with probability `density`.
    Disk {
        center: Vec<u32>,
        radius: u32,
        #[serde(default = "default_density")]
        density: f64,
    },
    /// `count` draws from an isotropic Gaussian around `center`.
    Cluster { center: Vec<f64>, sigma: f64, count: usize },
    /// `count` uniform draws in the rectangle.
    Scatter { lower: Vec<u32>, upper: Vec<u32>, count: usize },
}

// One placement of cells of a species
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PlacementConfig {
    pub species: String,
    #[serde(default)]
    pub time: f64,
    /// Species the placed cells descend from; wild-type when absent.
    #[serde(default)]
    pub ancestor: Option<String>,
    pub shape: PlacementShape,
}

// A named sample taken from the tissue
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SampleConfig {
    pub name: String,
    pub lower: Vec<u32>,
    pub upper: Vec<u32>,
    #[serde(default)]
    pub time: f64,
}

// Parameters of the sampling subsystem itself
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SamplingConfig {
    #[serde(default)]
    pub seed: u64,
    /// When false, cell selection follows the border-growth model.
    #[serde(default = "default_duplicate_internal_cells")]
    pub duplicate_internal_cells: bool,
    /// Number of scan iterations between two cancellation checks.
    #[serde(default = "default_interrupt_check_interval")]
    pub interrupt_check_interval: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            seed: 0,
            duplicate_internal_cells: default_duplicate_internal_cells(),
            interrupt_check_interval: default_interrupt_check_interval(),
        }
    }
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_base_filename")]
    pub base_filename: String,
    pub format: Option<String>, // Output format: "csv" or "json"
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig { base_filename: default_base_filename(), format: None }
    }
}

impl OutputConfig {
    /// The configured format name, "csv" when unset.
    pub fn format_name(&self) -> &str {
        self.format.as_deref().unwrap_or("csv")
    }
}

fn default_tissue_name() -> String {
    "A tissue".to_string()
}

fn default_density() -> f64 {
    1.0
}

fn default_duplicate_internal_cells() -> bool {
    true
}

fn default_interrupt_check_interval() -> usize {
    10_000
}

fn default_base_filename() -> String {
    "tissue".to_string()
}

// Main configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SamplerConfig {
    pub tissue: TissueConfig,
    #[serde(default)]
    pub genotypes: Vec<GenotypeConfig>,
    #[serde(default)]
    pub placements: Vec<PlacementConfig>,
    #[serde(default)]
    pub samples: Vec<SampleConfig>,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SamplerConfig {
    /// Loads the configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid configuration in '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SamplerConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tissue.width == 0 || self.tissue.height == 0 {
            anyhow::bail!("tissue width and height must be positive.");
        }
        if self.sampling.interrupt_check_interval == 0 {
            anyhow::bail!("interrupt_check_interval must be greater than 0.");
        }

        let mut genotype_names = HashSet::new();
        for genotype in &self.genotypes {
            if genotype.name.is_empty() {
                anyhow::bail!("genotype names must not be empty.");
            }
            if genotype.name == WILD_TYPE_NAME {
                anyhow::bail!("\"{}\" is a reserved genotype name.", WILD_TYPE_NAME);
            }
            if !genotype_names.insert(genotype.name.as_str()) {
                anyhow::bail!("genotype '{}' is declared twice.", genotype.name);
            }
            let mut rates = vec![genotype.growth_rate, genotype.death_rate];
            if let Some(epi) = &genotype.epigenetic {
                rates.extend([epi.switch_plus_minus, epi.switch_minus_plus, epi.growth_rate_minus, epi.death_rate_minus]);
            }
            if rates.iter().any(|rate| !rate.is_finite() || *rate < 0.0) {
                anyhow::bail!("rates of genotype '{}' must be finite and non-negative.", genotype.name);
            }
        }

        let species_names = self.species_names();
        for placement in &self.placements {
            if !species_names.contains(&placement.species) {
                anyhow::bail!("placement refers to unknown species '{}'.", placement.species);
            }
            if let Some(ancestor) = &placement.ancestor {
                if !species_names.contains(ancestor) {
                    anyhow::bail!("placement refers to unknown ancestor species '{}'.", ancestor);
                }
            }
            // Bulk shapes are clipped to the tissue; a single cell must lie inside it.
            if let PlacementShape::Cell { position } = &placement.shape {
                if let Ok(position) = Position::from_slice(position, "position") {
                    if position.x >= self.tissue.width || position.y >= self.tissue.height {
                        anyhow::bail!(
                            "cell placement {} lies outside the {}x{} tissue.",
                            position,
                            self.tissue.width,
                            self.tissue.height
                        );
                    }
                }
            }
            if let PlacementShape::Rectangle { density, .. } | PlacementShape::Disk { density, .. } = placement.shape {
                if !(0.0..=1.0).contains(&density) {
                    anyhow::bail!("placement density must lie in [0, 1], got {}.", density);
                }
            }
        }

        for sample in &self.samples {
            if sample.name.is_empty() {
                anyhow::bail!("sample names must not be empty.");
            }
        }

        Ok(())
    }

    /// Names of all the species the configured genotypes give rise to, in declaration order.
    pub fn species_names(&self) -> Vec<String> {
        self.genotypes.iter().flat_map(GenotypeConfig::species_names).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [tissue]
        width = 100
        height = 80

        [[genotypes]]
        name = "A"
        growth_rate = 0.2
        death_rate = 0.1

        [genotypes.epigenetic]
        switch_plus_minus = 0.01
        switch_minus_plus = 0.02
        growth_rate_minus = 0.08
        death_rate_minus = 0.01

        [[genotypes]]
        name = "B"
        growth_rate = 0.3
        death_rate = 0.05

        [[placements]]
        species = "A+"
        shape = { kind = "disk", center = [50, 40], radius = 5 }

        [[placements]]
        species = "B"
        ancestor = "A-"
        time = 12.5
        shape = { kind = "cell", position = [10, 10] }
    "#;

    #[test]
    fn test_parse_with_defaults() {
        let config = SamplerConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.tissue.name, "A tissue");
        assert_eq!(config.species_names(), vec!["A+", "A-", "B"]);
        assert!(config.sampling.duplicate_internal_cells);
        assert_eq!(config.sampling.interrupt_check_interval, 10_000);
        assert_eq!(config.output.format_name(), "csv");
        assert_eq!(
            config.placements[0].shape,
            PlacementShape::Disk { center: vec![50, 40], radius: 5, density: 1.0 }
        );
        assert_eq!(config.placements[1].ancestor.as_deref(), Some("A-"));
    }

    #[test]
    fn test_unknown_species_is_rejected() {
        let broken = MINIMAL.replace("species = \"B\"", "species = \"C\"");
        assert!(SamplerConfig::from_toml_str(&broken).is_err());
    }

    #[test]
    fn test_empty_tissue_is_rejected() {
        let broken = MINIMAL.replace("width = 100", "width = 0");
        assert!(SamplerConfig::from_toml_str(&broken).is_err());
    }

    #[test]
    fn test_wild_type_genotype_is_rejected() {
        let broken = MINIMAL.replace("name = \"B\"", "name = \"Wild-type\"");
        let error = SamplerConfig::from_toml_str(&broken).unwrap_err();
        assert!(error.to_string().contains("reserved"));
    }

    #[test]
    fn test_cell_placement_outside_tissue_is_rejected() {
        let broken = MINIMAL.replace("position = [10, 10]", "position = [100, 10]");
        assert!(SamplerConfig::from_toml_str(&broken).is_err());
        let edge = MINIMAL.replace("position = [10, 10]", "position = [99, 79]");
        assert!(SamplerConfig::from_toml_str(&edge).is_ok());
    }
}
