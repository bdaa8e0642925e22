use crate::niche::NicheConfig;
use crate::sbm::BlockConfig;
use crate::utils::check_num;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Run configuration of the command-line tool.
///
/// Loaded from a TOML file holding exactly one model section (`[niche]` or
/// `[block]`) plus an optional `[output]` section. Model parameters are
/// validated by the model constructors; see [`Config::from_file`] for
/// loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Niche model parameters.
    pub niche: Option<NicheConfig>,
    /// Stochastic block model parameters.
    pub block: Option<BlockConfig>,
}

/// Output settings of a generation run.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of networks to generate per run.
    ///
    /// With a configured seed, network `idx` is generated from `seed + idx`
    /// so every numbered output stays individually reproducible.
    pub n_networks: usize,

    /// On-disk layout of generated networks.
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            n_networks: 1,
            format: OutputFormat::Graphml,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A single GraphML file per network.
    Graphml,
    /// A directory of node/edge/attribute files per network.
    Flat,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to parse config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.output.n_networks, 1..10_000).context("invalid number of networks")?;

        match (&self.niche, &self.block) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => {
                bail!("config must contain only one of the [niche] and [block] sections")
            }
            (None, None) => {
                bail!("config must contain either a [niche] or a [block] section")
            }
        }
    }
}
