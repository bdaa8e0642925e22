//! Reading and writing generated webs.
//!
//! Two on-disk layouts are supported: a single GraphML file, and a directory
//! of flat node/edge/attribute files. Both round-trip an equivalent web:
//! every species survives even when edge-less, values are coerced to
//! numeric, and the `block` column or key is restored as the species' block
//! id. The GraphML reader parses exactly the subset this module writes.

use crate::graph::FoodWeb;
use anyhow::{Context, Result, bail};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const NODES_FILE: &str = "nodes.csv";
const EDGES_FILE: &str = "edges.csv";
const ATTRIBUTES_FILE: &str = "attributes.csv";

const BLOCK_COLUMN: &str = "block";
const ID_COLUMN: &str = "species_id";

/// Names of the node data columns carried by a web: the block column when any
/// species has a block, then every attribute name in sorted order.
fn data_columns(web: &FoodWeb) -> Vec<String> {
    let mut columns = Vec::new();
    if web.species_iter().any(|species| species.block.is_some()) {
        columns.push(BLOCK_COLUMN.to_owned());
    }
    let names: BTreeSet<&String> = web
        .species_iter()
        .flat_map(|species| species.attributes.keys())
        .collect();
    columns.extend(names.into_iter().cloned());
    columns
}

fn column_value(web: &FoodWeb, id: usize, column: &str) -> Option<f64> {
    let species = web.species(id);
    if column == BLOCK_COLUMN {
        species.block.map(|block| block as f64)
    } else {
        species.attributes.get(column).copied()
    }
}

fn set_column_value(web: &mut FoodWeb, id: usize, column: &str, value: f64) {
    let species = web.species_mut(id);
    if column == BLOCK_COLUMN {
        species.block = Some(value as usize);
    } else {
        species.attributes.insert(column.to_owned(), value);
    }
}

/// Format a value so it round-trips through `parse::<f64>` without losing
/// integer-valued columns to a trailing fraction.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn xml_unescape(escaped: &str) -> String {
    escaped
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Extract the value of `attr="..."` from a markup line.
fn markup_attr<'a>(line: &'a str, attr: &str) -> Result<&'a str> {
    let marker = format!("{attr}=\"");
    let start = line
        .find(&marker)
        .with_context(|| format!("missing {attr} attribute in line {line:?}"))?
        + marker.len();
    let len = line[start..]
        .find('"')
        .with_context(|| format!("unterminated {attr} attribute in line {line:?}"))?;
    Ok(&line[start..start + len])
}

/// Write `web` as a single GraphML file.
pub fn write_graphml<P: AsRef<Path>>(web: &FoodWeb, file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);

    let columns = data_columns(web);
    let keys: BTreeMap<&String, String> = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| (name, format!("d{idx}")))
        .collect();

    writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(
        writer,
        "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">"
    )?;
    for name in &columns {
        writeln!(
            writer,
            "  <key id=\"{}\" for=\"node\" attr.name=\"{}\" attr.type=\"double\"/>",
            keys[name],
            xml_escape(name)
        )?;
    }
    writeln!(writer, "  <graph edgedefault=\"directed\">")?;

    for id in 0..web.n_species() {
        let values: Vec<(&String, f64)> = columns
            .iter()
            .filter_map(|column| column_value(web, id, column).map(|value| (column, value)))
            .collect();
        if values.is_empty() {
            writeln!(writer, "    <node id=\"{id}\"/>")?;
        } else {
            writeln!(writer, "    <node id=\"{id}\">")?;
            for (column, value) in values {
                writeln!(
                    writer,
                    "      <data key=\"{}\">{}</data>",
                    keys[column],
                    format_value(value)
                )?;
            }
            writeln!(writer, "    </node>")?;
        }
    }
    for (prey, consumer) in web.links() {
        writeln!(
            writer,
            "    <edge source=\"{prey}\" target=\"{consumer}\"/>"
        )?;
    }

    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</graphml>")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

/// Read a web back from a GraphML file produced by [`write_graphml`].
pub fn read_graphml<P: AsRef<Path>>(file: P) -> Result<FoodWeb> {
    let file = file.as_ref();
    let contents =
        fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

    let mut key_names: BTreeMap<String, String> = BTreeMap::new();
    let mut nodes: BTreeMap<usize, Vec<(String, f64)>> = BTreeMap::new();
    let mut edges: Vec<(usize, usize)> = Vec::new();
    let mut current_node: Option<usize> = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.starts_with("<key ") {
            let id = markup_attr(line, "id")?.to_owned();
            let name = xml_unescape(markup_attr(line, "attr.name")?);
            key_names.insert(id, name);
        } else if line.starts_with("<node ") {
            let id: usize = markup_attr(line, "id")?
                .parse()
                .with_context(|| format!("invalid node id in line {line:?}"))?;
            nodes.entry(id).or_default();
            if !line.ends_with("/>") {
                current_node = Some(id);
            }
        } else if line.starts_with("</node>") {
            current_node = None;
        } else if line.starts_with("<data ") {
            let id = current_node.context("data element outside of a node element")?;
            let key = markup_attr(line, "key")?;
            let name = key_names
                .get(key)
                .with_context(|| format!("data element references unknown key {key:?}"))?;
            let open_end = line
                .find('>')
                .with_context(|| format!("malformed data element {line:?}"))?;
            let close = line
                .rfind("</data>")
                .with_context(|| format!("unterminated data element {line:?}"))?;
            let value: f64 = line[open_end + 1..close]
                .parse()
                .with_context(|| format!("non-numeric data value in line {line:?}"))?;
            nodes
                .get_mut(&id)
                .context("data element precedes its node")?
                .push((name.clone(), value));
        } else if line.starts_with("<edge ") {
            let source: usize = markup_attr(line, "source")?
                .parse()
                .with_context(|| format!("invalid edge source in line {line:?}"))?;
            let target: usize = markup_attr(line, "target")?
                .parse()
                .with_context(|| format!("invalid edge target in line {line:?}"))?;
            edges.push((source, target));
        }
    }

    let n_species = nodes.len();
    for (expected, &id) in nodes.keys().enumerate() {
        if id != expected {
            bail!("node ids must be exactly 0..{n_species}, but contain {id}");
        }
    }

    let mut web = FoodWeb::new(n_species);
    for (id, values) in nodes {
        for (name, value) in values {
            set_column_value(&mut web, id, &name, value);
        }
    }
    for (prey, consumer) in edges {
        if prey >= n_species || consumer >= n_species {
            bail!("edge ({prey}, {consumer}) references a nonexistent node");
        }
        web.add_link(prey, consumer);
    }
    Ok(web)
}

/// Write `web` as three flat files in `dir`: a node-id list, an edge list,
/// and an attribute table. The attribute table is only written when at least
/// one species carries a block or attributes.
pub fn write_flat<P: AsRef<Path>>(web: &FoodWeb, dir: P) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;

    let nodes_path = dir.join(NODES_FILE);
    let file =
        File::create(&nodes_path).with_context(|| format!("failed to create {nodes_path:?}"))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{ID_COLUMN}")?;
    for id in 0..web.n_species() {
        writeln!(writer, "{id}")?;
    }
    writer.flush().context("failed to flush writer stream")?;

    let edges_path = dir.join(EDGES_FILE);
    let file =
        File::create(&edges_path).with_context(|| format!("failed to create {edges_path:?}"))?;
    let mut writer = BufWriter::new(file);
    for (prey, consumer) in web.links() {
        writeln!(writer, "{prey},{consumer}")?;
    }
    writer.flush().context("failed to flush writer stream")?;

    let columns = data_columns(web);
    if columns.is_empty() {
        return Ok(());
    }
    let attributes_path = dir.join(ATTRIBUTES_FILE);
    let file = File::create(&attributes_path)
        .with_context(|| format!("failed to create {attributes_path:?}"))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{ID_COLUMN},{}", columns.join(","))?;
    for id in 0..web.n_species() {
        let row: Vec<String> = columns
            .iter()
            .map(|column| {
                column_value(web, id, column)
                    .map(format_value)
                    .unwrap_or_default()
            })
            .collect();
        writeln!(writer, "{id},{}", row.join(","))?;
    }
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

/// Read a web back from a directory written by [`write_flat`].
pub fn read_flat<P: AsRef<Path>>(dir: P) -> Result<FoodWeb> {
    let dir = dir.as_ref();

    let nodes_path = dir.join(NODES_FILE);
    let file =
        File::open(&nodes_path).with_context(|| format!("failed to open {nodes_path:?}"))?;
    let reader = BufReader::new(file);
    let mut node_ids = Vec::new();
    for line in reader.lines().skip(1) {
        let line = line.context("failed to read node list")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let id: usize = line
            .parse()
            .with_context(|| format!("invalid node id {line:?}"))?;
        node_ids.push(id);
    }
    let n_species = node_ids.len();
    for (expected, &id) in node_ids.iter().enumerate() {
        if id != expected {
            bail!("node ids must be exactly 0..{n_species}, but contain {id}");
        }
    }
    let mut web = FoodWeb::new(n_species);

    let edges_path = dir.join(EDGES_FILE);
    let file =
        File::open(&edges_path).with_context(|| format!("failed to open {edges_path:?}"))?;
    let reader = BufReader::new(file);
    for line in reader.lines() {
        let line = line.context("failed to read edge list")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (prey, consumer) = line
            .split_once(',')
            .with_context(|| format!("invalid edge line {line:?}"))?;
        let prey: usize = prey
            .trim()
            .parse()
            .with_context(|| format!("invalid prey id in line {line:?}"))?;
        let consumer: usize = consumer
            .trim()
            .parse()
            .with_context(|| format!("invalid consumer id in line {line:?}"))?;
        if prey >= n_species || consumer >= n_species {
            bail!("edge ({prey}, {consumer}) references a nonexistent node");
        }
        web.add_link(prey, consumer);
    }

    let attributes_path = dir.join(ATTRIBUTES_FILE);
    if !attributes_path.exists() {
        return Ok(web);
    }
    let file = File::open(&attributes_path)
        .with_context(|| format!("failed to open {attributes_path:?}"))?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();
    let header = lines
        .next()
        .context("attribute table is empty")?
        .context("failed to read attribute table")?;
    let columns: Vec<String> = header.split(',').map(|name| name.trim().to_owned()).collect();
    let id_column = columns
        .iter()
        .position(|name| name == ID_COLUMN)
        .with_context(|| format!("attribute table has no {ID_COLUMN} column"))?;

    for line in lines {
        let line = line.context("failed to read attribute table")?;
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        if cells.len() != columns.len() {
            bail!(
                "attribute row has {} cells, expected {}",
                cells.len(),
                columns.len()
            );
        }
        let id: usize = cells[id_column]
            .parse()
            .with_context(|| format!("invalid species id in row {line:?}"))?;
        if id >= n_species {
            bail!("attribute row references nonexistent node {id}");
        }
        for (column, cell) in columns.iter().zip(&cells) {
            if column == ID_COLUMN || cell.is_empty() {
                continue;
            }
            let value: f64 = cell
                .parse()
                .with_context(|| format!("non-numeric value {cell:?} in column {column:?}"))?;
            set_column_value(&mut web, id, column, value);
        }
    }
    Ok(web)
}
