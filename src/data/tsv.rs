//! Tab-separated edge lists
//!
//! One edge per line: `label_u<TAB>label_v[<TAB>weight]`. The weight
//! defaults to 1. Blank lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::graph::{Graph, LabeledGraphBuilder};

/// Load an edge list file into a graph; labels are indexed by global id
pub fn load_edge_list<P: AsRef<Path>>(path: P) -> Result<(Graph, Vec<String>)> {
    let path = path.as_ref();
    log::info!("Reading edge list: {}", path.display());

    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let (graph, labels) = parse_edge_list(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    log::info!(
        "Loaded graph with {} vertices and {} edges",
        graph.order(),
        graph.num_edges()
    );
    Ok((graph, labels))
}

/// Parse an edge list from any buffered reader
pub fn parse_edge_list<R: BufRead>(reader: R) -> Result<(Graph, Vec<String>)> {
    let mut builder = LabeledGraphBuilder::with_capacity(1024, 4096);

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let weight = match fields.as_slice() {
            [_, _] => 1.0,
            [_, _, weight] => weight
                .trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid weight {:?} on line {}", weight, index + 1))?,
            _ => {
                return Err(anyhow!(
                    "Expected 2 or 3 tab-separated fields on line {}, found {}",
                    index + 1,
                    fields.len()
                ))
            }
        };
        builder.add_edge(fields[0].trim(), fields[1].trim(), weight);
    }
    log::debug!("Parsed edge list with {} distinct labels", builder.node_count());

    Ok(builder.build()?)
}
