//! Graphviz rendering of generated webs.
//!
//! Purely presentational: consumes a finished web plus an externally
//! computed trophic-level assignment and lays species out vertically by
//! level. Nothing here feeds back into generation.

use crate::graph::FoodWeb;
use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `web` as a Graphviz DOT file with one rank per trophic level.
///
/// `levels[id]` is the trophic level of species `id`; species sharing a level
/// are placed on the same rank, and ranks grow upwards (basal species at the
/// bottom).
///
/// # Errors
/// Returns an error if `levels` does not assign exactly one level per
/// species or the file cannot be written.
pub fn write_dot<P: AsRef<Path>>(web: &FoodWeb, levels: &[usize], file: P) -> Result<()> {
    if levels.len() != web.n_species() {
        bail!(
            "levels must assign one level to each of the {} species, but has {} entries",
            web.n_species(),
            levels.len()
        );
    }

    let mut ranks: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (id, &level) in levels.iter().enumerate() {
        ranks.entry(level).or_default().push(id);
    }

    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "digraph foodweb {{")?;
    writeln!(writer, "    rankdir = BT;")?;
    writeln!(writer, "    node [shape = circle];")?;
    for members in ranks.values() {
        let ids: Vec<String> = members.iter().map(|id| format!("\"{id}\"")).collect();
        writeln!(writer, "    {{ rank = same; {}; }}", ids.join("; "))?;
    }
    for (prey, consumer) in web.links() {
        writeln!(writer, "    \"{prey}\" -> \"{consumer}\";")?;
    }
    writeln!(writer, "}}")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}
