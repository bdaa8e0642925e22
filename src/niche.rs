use crate::graph::FoodWeb;
use crate::model::Generator;
use crate::random::RandomStream;
use crate::utils::check_num;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Configuration of the niche model.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NicheConfig {
    /// Number of species (nodes) in the network.
    pub n_species: usize,

    /// Target edge density; controls the feeding-range distribution.
    pub connectance: f64,

    /// Seed for the random stream; `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Niche parameters realized for one generated network, indexed by species id.
///
/// For every species `range[i] <= niche[i]` and `center[i]` lies in
/// `[range[i] / 2, niche[i]]`. The species with the smallest niche value has
/// `range == 0`, so a basal (non-consuming) species always exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NicheParams {
    pub niche: Vec<f64>,
    pub range: Vec<f64>,
    pub center: Vec<f64>,
}

impl NicheParams {
    fn with_capacity(n_species: usize) -> Self {
        Self {
            niche: Vec::with_capacity(n_species),
            range: Vec::with_capacity(n_species),
            center: Vec::with_capacity(n_species),
        }
    }
}

/// Niche model of Williams & Martinez (2000).
///
/// Each species gets a niche value in `[0, 1]` and a feeding interval on the
/// same axis; it consumes every species whose niche value falls strictly
/// inside that interval. After construction the web is scanned for
/// unconnected species and for pairs with identical prey and predator sets;
/// offending species are redrawn one at a time until no defects remain.
///
/// The repair loop has no retry cap: for connectance close to the upper
/// bound it can iterate for a long time before converging.
pub struct NicheModel {
    n_species: usize,
    connectance: f64,
    rng: RandomStream,
    params: Option<NicheParams>,
}

impl NicheModel {
    /// Create a model, validating the configuration.
    ///
    /// # Errors
    /// Returns an error if `n_species < 2` or `connectance` lies outside the
    /// open interval `(0, 0.5)`.
    pub fn new(cfg: &NicheConfig) -> Result<Self> {
        check_num(cfg.n_species, 2..).context("invalid number of species")?;
        if !(cfg.connectance > 0.0 && cfg.connectance < 0.5) {
            bail!(
                "connectance must be in the open interval (0, 0.5), but is {}; \
                 values outside it are not biologically realistic",
                cfg.connectance
            );
        }

        Ok(Self {
            n_species: cfg.n_species,
            connectance: cfg.connectance,
            rng: RandomStream::new(cfg.seed)?,
            params: None,
        })
    }

    /// Realized parameters of the most recently generated network.
    pub fn params(&self) -> Option<&NicheParams> {
        self.params.as_ref()
    }

    fn beta_param(&self) -> f64 {
        (1.0 - 2.0 * self.connectance) / (2.0 * self.connectance)
    }

    /// Draw `(niche, range, center)` for a single species.
    ///
    /// The range is sampled from Beta(1, B) via the inverse CDF,
    /// `x = 1 - (1 - u)^(1/B)` with `u ~ Uniform(0, 1)`, then scaled by the
    /// niche value; the center is uniform within `[range / 2, niche]`.
    fn draw_species_params(&mut self) -> Result<(f64, f64, f64)> {
        let b = self.beta_param();
        let niche = self.rng.uniform(0.0, 1.0)?;

        let u = self.rng.uniform(0.0, 1.0)?;
        let x = 1.0 - (1.0 - u).powf(1.0 / b);
        let range = x * niche;

        let center = self.rng.uniform(range / 2.0, niche)?;

        Ok((niche, range, center))
    }

    /// Zero the range of the species with the smallest niche value.
    ///
    /// Re-applied after every reassignment, since the minimum may move.
    fn assign_basal(params: &mut NicheParams) {
        let mut basal = 0;
        for id in 1..params.niche.len() {
            if params.niche[id] < params.niche[basal] {
                basal = id;
            }
        }
        params.range[basal] = 0.0;
    }

    fn initialize_params(&mut self) -> Result<NicheParams> {
        let mut params = NicheParams::with_capacity(self.n_species);
        for _ in 0..self.n_species {
            let (niche, range, center) = self.draw_species_params()?;
            params.niche.push(niche);
            params.range.push(range);
            params.center.push(center);
        }
        Self::assign_basal(&mut params);
        Ok(params)
    }

    fn reassign_species(&mut self, params: &mut NicheParams, id: usize) -> Result<()> {
        let (niche, range, center) = self.draw_species_params()?;
        params.niche[id] = niche;
        params.range[id] = range;
        params.center[id] = center;
        Self::assign_basal(params);
        Ok(())
    }

    /// Wire the web from the niche parameters: species `i` consumes every
    /// species `j != i` whose niche value falls strictly inside `i`'s feeding
    /// interval `(center_i - range_i / 2, center_i + range_i / 2)`.
    fn build_web(&self, params: &NicheParams) -> FoodWeb {
        let mut web = FoodWeb::new(self.n_species);
        for i in 0..self.n_species {
            let lower = params.center[i] - params.range[i] / 2.0;
            let upper = params.center[i] + params.range[i] / 2.0;
            for j in 0..self.n_species {
                if i != j && lower < params.niche[j] && params.niche[j] < upper {
                    web.add_link(j, i);
                }
            }
        }
        web
    }

    /// Flag all but one member of every group of trophically identical
    /// species; the kept member is chosen uniformly at random.
    ///
    /// Groups are discovered in node order of their first member.
    fn trophically_identical(&mut self, web: &FoodWeb) -> Result<Vec<usize>> {
        let mut signatures = Vec::with_capacity(self.n_species);
        let mut groups: HashMap<(Vec<usize>, Vec<usize>), Vec<usize>> = HashMap::new();
        for id in 0..self.n_species {
            let signature = web.trophic_signature(id);
            groups.entry(signature.clone()).or_default().push(id);
            signatures.push(signature);
        }

        let mut flagged = Vec::new();
        for id in 0..self.n_species {
            let Some(group) = groups.remove(&signatures[id]) else {
                continue;
            };
            if group.len() > 1 {
                let keep = *self.rng.choice(&group)?;
                flagged.extend(group.into_iter().filter(|&member| member != keep));
            }
        }
        Ok(flagged)
    }

    /// Species that must be redrawn: isolates first (in node order), then
    /// trophically identical species (in discovery order), deduplicated.
    fn problem_species(&mut self, web: &FoodWeb) -> Result<Vec<usize>> {
        let isolates = web.isolates();
        let identical = self.trophically_identical(web)?;

        let mut problems = Vec::new();
        let mut seen = HashSet::new();
        for id in isolates.into_iter().chain(identical) {
            if seen.insert(id) {
                problems.push(id);
            }
        }
        Ok(problems)
    }
}

impl Generator for NicheModel {
    fn generate(&mut self) -> Result<FoodWeb> {
        let mut params = self.initialize_params()?;
        let mut web = self.build_web(&params);

        // Replace problem species one at a time until every species is
        // connected and trophically unique.
        let mut problems = self.problem_species(&web)?;
        while let Some(&species) = problems.first() {
            log::debug!(
                "redrawing species {species} ({} defects remain)",
                problems.len()
            );
            self.reassign_species(&mut params, species)?;
            web = self.build_web(&params);
            problems = self.problem_species(&web)?;
        }

        self.params = Some(params);
        Ok(web)
    }

    fn n_species(&self) -> usize {
        self.n_species
    }
}
