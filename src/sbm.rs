use crate::graph::FoodWeb;
use crate::model::Generator;
use crate::random::RandomStream;
use crate::utils::{check_mat, check_num};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Attribute values of one species, keyed by attribute name.
pub type AttributeLookup = BTreeMap<String, f64>;

/// Configuration of the stochastic block model.
///
/// Either `species_attributes` is given explicitly (the species count is
/// derived from it) or `n_species` together with at least one of
/// `n_binary_attributes` / `n_numeric_attributes`. Omitted `block_sizes` are
/// drawn from a multinomial distribution; an omitted probability matrix is
/// filled with uniform `[0, 1]` draws.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Number of species; required unless `species_attributes` is given.
    pub n_species: Option<usize>,

    /// Number of blocks (communities) to partition species into.
    pub n_blocks: usize,

    /// Number of generated binary (0/1) attributes per species.
    pub n_binary_attributes: usize,
    /// Number of generated continuous `[0, 1)` attributes per species.
    pub n_numeric_attributes: usize,

    /// Explicit per-species attributes; keys must be exactly `0..n_species`.
    pub species_attributes: Option<BTreeMap<usize, AttributeLookup>>,

    /// Explicit block sizes; must have `n_blocks` entries summing to
    /// `n_species`.
    pub block_sizes: Option<Vec<usize>>,

    /// Explicit base edge probabilities (`n_blocks x n_blocks`, entries in
    /// `[0, 1]`); entry `[a][b]` is the probability of an edge from a species
    /// in block `a` to one in block `b` before the hierarchical penalty.
    pub block_probabilities: Option<Vec<Vec<f64>>>,

    /// Multiplier applied to edges running in the non-increasing block
    /// direction (from a block id to a lower-or-equal one). `1.0` disables
    /// the hierarchical bias.
    pub reciprocal_proportion: f64,

    /// Seed for the random stream; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            n_species: None,
            n_blocks: 3,
            n_binary_attributes: 0,
            n_numeric_attributes: 0,
            species_attributes: None,
            block_sizes: None,
            block_probabilities: None,
            reciprocal_proportion: 0.1,
            seed: None,
        }
    }
}

/// Block parameters realized for one generated network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockParams {
    /// Scaled attribute values per species id.
    pub attribute_values: BTreeMap<usize, AttributeLookup>,
    /// Number of species in each block; sums to `n_species`.
    pub block_sizes: Vec<usize>,
    /// Base edge probabilities between blocks.
    pub block_probabilities: Vec<Vec<f64>>,
    /// Block id of every species, contiguous by block.
    pub block_assignments: Vec<usize>,
}

/// Stochastic block model with an optional hierarchical bias.
///
/// Species are assigned to blocks sequentially and contiguously following
/// block order, so species id order correlates with block id. For every
/// ordered species pair an edge is drawn independently from the block
/// probability matrix; edges running in the non-increasing block direction
/// are penalized by `reciprocal_proportion`. There is no repair loop:
/// unconnected or trophically identical species are valid outcomes for this
/// model.
pub struct BlockModel {
    n_species: usize,
    n_blocks: usize,
    n_binary_attributes: usize,
    n_numeric_attributes: usize,
    species_attributes: Option<BTreeMap<usize, AttributeLookup>>,
    block_sizes: Option<Vec<usize>>,
    block_probabilities: Option<Vec<Vec<f64>>>,
    reciprocal_proportion: f64,
    rng: RandomStream,
    params: Option<BlockParams>,
}

impl BlockModel {
    /// Create a model, validating the configuration.
    ///
    /// # Errors
    /// Returns an error if neither `species_attributes` nor `n_species` with
    /// at least one attribute count is given, if `n_species < 2` or
    /// `n_blocks < 1`, if `reciprocal_proportion` lies outside `[0, 1]`, or
    /// if explicit block sizes or probabilities have mismatched dimensions.
    pub fn new(cfg: &BlockConfig) -> Result<Self> {
        let (n_species, n_binary_attributes, n_numeric_attributes) =
            match &cfg.species_attributes {
                Some(attributes) => {
                    for (expected, &id) in attributes.keys().enumerate() {
                        if id != expected {
                            bail!(
                                "species_attributes keys must be exactly 0..{}, but contain {id}",
                                attributes.len()
                            );
                        }
                    }
                    (attributes.len(), 0, 0)
                }
                None => {
                    let Some(n_species) = cfg.n_species else {
                        bail!("must provide either species_attributes or n_species");
                    };
                    if cfg.n_binary_attributes == 0 && cfg.n_numeric_attributes == 0 {
                        bail!(
                            "must provide at least one of n_binary_attributes or \
                             n_numeric_attributes when species_attributes is not given"
                        );
                    }
                    (n_species, cfg.n_binary_attributes, cfg.n_numeric_attributes)
                }
            };

        check_num(n_species, 2..).context("invalid number of species")?;
        check_num(cfg.n_blocks, 1..).context("invalid number of blocks")?;
        check_num(cfg.reciprocal_proportion, 0.0..=1.0)
            .context("invalid reciprocal proportion")?;

        if let Some(block_sizes) = &cfg.block_sizes {
            if block_sizes.len() != cfg.n_blocks {
                bail!(
                    "block_sizes must have {} entries, but has {}",
                    cfg.n_blocks,
                    block_sizes.len()
                );
            }
            let total: usize = block_sizes.iter().sum();
            if total != n_species {
                bail!("block_sizes must sum to {n_species}, but sums to {total}");
            }
        }
        if let Some(block_probabilities) = &cfg.block_probabilities {
            check_mat(block_probabilities, (cfg.n_blocks, cfg.n_blocks), true)
                .context("invalid block probabilities")?;
        }

        Ok(Self {
            n_species,
            n_blocks: cfg.n_blocks,
            n_binary_attributes,
            n_numeric_attributes,
            species_attributes: cfg.species_attributes.clone(),
            block_sizes: cfg.block_sizes.clone(),
            block_probabilities: cfg.block_probabilities.clone(),
            reciprocal_proportion: cfg.reciprocal_proportion,
            rng: RandomStream::new(cfg.seed)?,
            params: None,
        })
    }

    /// Realized parameters of the most recently generated network.
    pub fn params(&self) -> Option<&BlockParams> {
        self.params.as_ref()
    }

    /// Draw attributes for every species: binary attributes uniformly from
    /// {0, 1}, numeric attributes uniformly from `[0, 1)`, named by attribute
    /// index and kind.
    fn generate_random_attributes(&mut self) -> Result<BTreeMap<usize, AttributeLookup>> {
        let mut species_attributes = BTreeMap::new();
        for species in 0..self.n_species {
            let mut attributes = AttributeLookup::new();
            for attr in 0..self.n_binary_attributes {
                let value = *self.rng.choice(&[0.0, 1.0])?;
                attributes.insert(format!("binary_attr_{attr}"), value);
            }
            for attr in 0..self.n_numeric_attributes {
                let value = self.rng.uniform(0.0, 1.0)?;
                attributes.insert(format!("numeric_attr_{attr}"), value);
            }
            species_attributes.insert(species, attributes);
        }
        Ok(species_attributes)
    }

    /// Min-max scale every attribute to `[0, 1]` across the species carrying
    /// it, rounded to 3 decimal places. When all carriers share one value the
    /// scaled value is fixed at 1.0.
    fn min_max_scaling(
        attributes: &BTreeMap<usize, AttributeLookup>,
    ) -> BTreeMap<usize, AttributeLookup> {
        let attribute_names: BTreeSet<&String> = attributes
            .values()
            .flat_map(|species_attrs| species_attrs.keys())
            .collect();

        let mut scaled = attributes.clone();
        for &name in &attribute_names {
            let carriers: Vec<usize> = attributes
                .iter()
                .filter(|(_, attrs)| attrs.contains_key(name))
                .map(|(&species, _)| species)
                .collect();
            let values: Vec<f64> = carriers
                .iter()
                .map(|species| attributes[species][name])
                .collect();

            let min_val = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max_val = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            for (&species, &value) in carriers.iter().zip(&values) {
                let scaled_value = if max_val == min_val {
                    1.0
                } else {
                    let unit = (value - min_val) / (max_val - min_val);
                    (unit * 1000.0).round() / 1000.0
                };
                if let Some(slot) = scaled
                    .get_mut(&species)
                    .and_then(|attrs| attrs.get_mut(name))
                {
                    *slot = scaled_value;
                }
            }
        }
        scaled
    }

    /// Draw block sizes summing to `n_species` from a multinomial
    /// distribution with equal probabilities.
    fn generate_block_sizes(&mut self) -> Result<Vec<usize>> {
        let probs = vec![1.0 / self.n_blocks as f64; self.n_blocks];
        self.rng.multinomial(self.n_species, &probs)
    }

    /// Draw every base edge probability uniformly from `[0, 1)`, row-major.
    fn generate_block_probabilities(&mut self) -> Result<Vec<Vec<f64>>> {
        let mut matrix = Vec::with_capacity(self.n_blocks);
        for _ in 0..self.n_blocks {
            let mut row = Vec::with_capacity(self.n_blocks);
            for _ in 0..self.n_blocks {
                row.push(self.rng.uniform(0.0, 1.0)?);
            }
            matrix.push(row);
        }
        Ok(matrix)
    }

    /// Assign species ids to blocks sequentially: block 0 gets the first
    /// `block_sizes[0]` ids and so on, so species id order correlates with
    /// block id.
    fn assign_blocks(&self, block_sizes: &[usize]) -> Vec<usize> {
        let mut assignments = Vec::with_capacity(self.n_species);
        for (block, &size) in block_sizes.iter().enumerate() {
            assignments.extend(std::iter::repeat_n(block, size));
        }
        assignments
    }

    fn initialize_params(&mut self) -> Result<BlockParams> {
        let raw_attributes = match &self.species_attributes {
            Some(attributes) => attributes.clone(),
            None => self.generate_random_attributes()?,
        };
        let attribute_values = Self::min_max_scaling(&raw_attributes);

        let block_sizes = match &self.block_sizes {
            Some(block_sizes) => block_sizes.clone(),
            None => self.generate_block_sizes()?,
        };
        let block_probabilities = match &self.block_probabilities {
            Some(block_probabilities) => block_probabilities.clone(),
            None => self.generate_block_probabilities()?,
        };
        let block_assignments = self.assign_blocks(&block_sizes);

        Ok(BlockParams {
            attribute_values,
            block_sizes,
            block_probabilities,
            block_assignments,
        })
    }

    /// Wire the web: for every unordered species pair both edge directions
    /// are drawn independently from the block probability matrix, with edges
    /// in the non-increasing block direction penalized by
    /// `reciprocal_proportion`. A pair may yield zero, one, or two edges.
    fn build_web(&mut self, params: &BlockParams) -> Result<FoodWeb> {
        let mut web = FoodWeb::new(self.n_species);
        for id in 0..self.n_species {
            let species = web.species_mut(id);
            species.block = Some(params.block_assignments[id]);
            if let Some(attributes) = params.attribute_values.get(&id) {
                species.attributes = attributes.clone();
            }
        }

        for i in 0..self.n_species {
            for j in (i + 1)..self.n_species {
                let block_i = params.block_assignments[i];
                let block_j = params.block_assignments[j];

                let mut prob_ij = params.block_probabilities[block_i][block_j];
                if block_i >= block_j {
                    prob_ij *= self.reciprocal_proportion;
                }
                if self.rng.uniform(0.0, 1.0)? < prob_ij {
                    web.add_link(i, j); // i -> j, i.e. j consumes i
                }

                let mut prob_ji = params.block_probabilities[block_j][block_i];
                if block_j >= block_i {
                    prob_ji *= self.reciprocal_proportion;
                }
                if self.rng.uniform(0.0, 1.0)? < prob_ji {
                    web.add_link(j, i); // j -> i, i.e. i consumes j
                }
            }
        }
        Ok(web)
    }
}

impl Generator for BlockModel {
    fn generate(&mut self) -> Result<FoodWeb> {
        let params = self.initialize_params()?;
        let web = self.build_web(&params)?;
        self.params = Some(params);
        Ok(web)
    }

    fn n_species(&self) -> usize {
        self.n_species
    }
}
