use crate::config::{Config, OutputFormat};
use crate::graph::FoodWeb;
use crate::model::Generator;
use crate::niche::NicheModel;
use crate::persist;
use crate::sbm::BlockModel;
use crate::viz;
use anyhow::{Context, Result, bail};
use glob::glob;
use rmp_serde::encode;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter},
    path::{Path, PathBuf},
};

/// Manages the networks generated into one output directory.
///
/// Networks are numbered `web-0000`, `web-0001`, ... and each generation run
/// continues the existing numbering. Every network gets a sidecar file with
/// the realized parameters it was generated from.
pub struct Manager {
    out_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(out_dir: P) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(out_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { out_dir, cfg })
    }

    /// Generate the configured number of networks, continuing the numbering
    /// of any networks already present.
    pub fn generate_networks(&self) -> Result<()> {
        let start_idx = self.count_networks().context("failed to count networks")?;

        for net_idx in start_idx..start_idx + self.cfg.output.n_networks {
            let web = match (&self.cfg.niche, &self.cfg.block) {
                (Some(niche_cfg), None) => {
                    let mut model_cfg = niche_cfg.clone();
                    model_cfg.seed = model_cfg.seed.map(|seed| seed + net_idx as u64);
                    let mut model =
                        NicheModel::new(&model_cfg).context("failed to construct model")?;
                    let web = model.generate().context("failed to generate network")?;
                    let params = model.params().context("params missing after generation")?;
                    self.save_params(net_idx, params)
                        .context("failed to save params")?;
                    web
                }
                (None, Some(block_cfg)) => {
                    let mut model_cfg = block_cfg.clone();
                    model_cfg.seed = model_cfg.seed.map(|seed| seed + net_idx as u64);
                    let mut model =
                        BlockModel::new(&model_cfg).context("failed to construct model")?;
                    let web = model.generate().context("failed to generate network")?;
                    let params = model.params().context("params missing after generation")?;
                    self.save_params(net_idx, params)
                        .context("failed to save params")?;
                    web
                }
                _ => bail!("config must contain exactly one model section"),
            };

            self.save_network(net_idx, &web)
                .context("failed to save network")?;

            log::info!(
                "generated network {net_idx:04} ({} species, {} links)",
                web.n_species(),
                web.n_links()
            );
        }

        Ok(())
    }

    /// Render a previously generated network as a Graphviz DOT file, laying
    /// species out by the trophic levels read from `levels_file` (one
    /// `species_id level` pair per line).
    pub fn render_network<P: AsRef<Path>>(&self, net_idx: usize, levels_file: P) -> Result<()> {
        let web = self
            .load_network(net_idx)
            .context("failed to load network")?;
        let levels =
            read_levels(levels_file, web.n_species()).context("failed to read levels")?;

        let dot_file = self.dot_file(net_idx);
        viz::write_dot(&web, &levels, &dot_file).context("failed to write dot file")?;
        log::info!("rendered network {net_idx:04} to {dot_file:?}");

        Ok(())
    }

    /// Remove every generated network, sidecar, and rendering.
    pub fn clean(&self) -> Result<()> {
        for pattern in ["web-*", "params-*.msgpack"] {
            let pattern = self.out_dir.join(pattern);
            let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
            for path in glob(pattern)
                .context("failed to glob output files")?
                .filter_map(Result::ok)
            {
                if path.is_dir() {
                    fs::remove_dir_all(&path)
                        .with_context(|| format!("failed to remove {path:?}"))?;
                } else {
                    fs::remove_file(&path)
                        .with_context(|| format!("failed to remove {path:?}"))?;
                }
                log::info!("removed {path:?}");
            }
        }
        Ok(())
    }

    fn count_networks(&self) -> Result<usize> {
        let pattern = match self.cfg.output.format {
            OutputFormat::Graphml => self.out_dir.join("web-*.graphml"),
            OutputFormat::Flat => self.out_dir.join("web-*"),
        };
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob network files")?
            .filter_map(Result::ok)
            .filter(|path| match self.cfg.output.format {
                OutputFormat::Graphml => path.is_file(),
                OutputFormat::Flat => path.is_dir(),
            })
            .count();
        Ok(count)
    }

    fn save_network(&self, net_idx: usize, web: &FoodWeb) -> Result<()> {
        match self.cfg.output.format {
            OutputFormat::Graphml => persist::write_graphml(web, self.network_path(net_idx)),
            OutputFormat::Flat => persist::write_flat(web, self.network_path(net_idx)),
        }
    }

    fn load_network(&self, net_idx: usize) -> Result<FoodWeb> {
        match self.cfg.output.format {
            OutputFormat::Graphml => persist::read_graphml(self.network_path(net_idx)),
            OutputFormat::Flat => persist::read_flat(self.network_path(net_idx)),
        }
    }

    fn save_params<T: Serialize>(&self, net_idx: usize, params: &T) -> Result<()> {
        let file = self.params_file(net_idx);
        let file = File::create(&file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, params).context("failed to serialize params")?;
        Ok(())
    }

    fn network_path(&self, net_idx: usize) -> PathBuf {
        match self.cfg.output.format {
            OutputFormat::Graphml => self.out_dir.join(format!("web-{net_idx:04}.graphml")),
            OutputFormat::Flat => self.out_dir.join(format!("web-{net_idx:04}")),
        }
    }

    fn params_file(&self, net_idx: usize) -> PathBuf {
        self.out_dir.join(format!("params-{net_idx:04}.msgpack"))
    }

    fn dot_file(&self, net_idx: usize) -> PathBuf {
        self.out_dir.join(format!("web-{net_idx:04}.dot"))
    }
}

/// Read a trophic-level assignment: one `species_id level` pair per line,
/// covering every species exactly once.
fn read_levels<P: AsRef<Path>>(file: P, n_species: usize) -> Result<Vec<usize>> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let reader = BufReader::new(file);

    let mut levels = vec![None; n_species];
    for line in reader.lines() {
        let line = line.context("failed to read levels file")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (id, level) = line
            .split_once(char::is_whitespace)
            .with_context(|| format!("invalid levels line {line:?}"))?;
        let id: usize = id
            .parse()
            .with_context(|| format!("invalid species id in line {line:?}"))?;
        let level: usize = level
            .trim()
            .parse()
            .with_context(|| format!("invalid level in line {line:?}"))?;
        if id >= n_species {
            bail!("levels reference nonexistent species {id}");
        }
        levels[id] = Some(level);
    }

    levels
        .into_iter()
        .enumerate()
        .map(|(id, level)| level.with_context(|| format!("species {id} has no level")))
        .collect()
}
