//! Results persistence module

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, to_string_pretty};

use crate::cluster::affiliation::AffiliationMetric;
use crate::cluster::metrics::{tree_metrics, ClusterMetrics};
use crate::cluster::ClusterTree;

/// Save a finished cluster hierarchy to `output_dir`.
///
/// Writes `summary.json` with tree-level statistics and `clusters.json`
/// with one record per cluster. Vertices are written as their labels when
/// `labels` is given (indexed by global id), as numbers otherwise.
pub fn save_results<P: AsRef<Path>>(
    tree: &ClusterTree<'_>,
    labels: Option<&[String]>,
    metric: &dyn AffiliationMetric,
    output_dir: P,
) -> Result<()> {
    let output_dir = output_dir.as_ref();
    log::info!("Saving {} clusters to {}", tree.len(), output_dir.display());

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let metrics = tree_metrics(tree, metric)?;
    save_summary(tree, &metrics, output_dir)?;
    save_clusters(tree, &metrics, labels, output_dir)?;

    log::info!("Results saved successfully");
    Ok(())
}

fn save_summary(tree: &ClusterTree<'_>, metrics: &[ClusterMetrics], output_dir: &Path) -> Result<()> {
    let graph = tree.root_graph();
    let leaves: Vec<&ClusterMetrics> = metrics.iter().filter(|m| m.children.is_empty()).collect();
    let max_depth = metrics.iter().map(|m| m.depth).max().unwrap_or(0);

    let summary = json!({
        "graph_stats": {
            "vertex_count": graph.order(),
            "edge_count": graph.num_edges(),
            "total_weight": graph.total_weight(),
        },
        "cluster_stats": {
            "cluster_count": metrics.len(),
            "leaf_count": leaves.len(),
            "max_depth": max_depth,
            "root_remainder_size": tree.remainder(tree.root()).len(),
            "largest_leaf_size": leaves.iter().map(|m| m.size).max().unwrap_or(0),
            "avg_leaf_size": leaves.iter().map(|m| m.size).sum::<usize>() as f64
                / if leaves.is_empty() { 1.0 } else { leaves.len() as f64 },
            "avg_density": metrics.iter().map(|m| m.density).sum::<f64>()
                / if metrics.is_empty() { 1.0 } else { metrics.len() as f64 },
        }
    });

    write_json(&output_dir.join("summary.json"), &summary)
}

fn save_clusters(
    tree: &ClusterTree<'_>,
    metrics: &[ClusterMetrics],
    labels: Option<&[String]>,
    output_dir: &Path,
) -> Result<()> {
    let resolve = |ids: &[u32]| -> Vec<serde_json::Value> {
        ids.iter()
            .map(|&id| match labels.and_then(|l| l.get(id as usize)) {
                Some(label) => json!(label),
                None => json!(id),
            })
            .collect()
    };

    let clusters: Vec<_> = metrics
        .iter()
        .map(|m| {
            let mut remainder = tree.remainder(m.id).to_vec();
            remainder.sort_unstable();
            json!({
                "id": m.id,
                "parent": m.parent,
                "depth": m.depth,
                "children": m.children,
                "size": m.size,
                "density": m.density,
                "mean_affiliation": m.mean_affiliation,
                "central_vertices": resolve(&m.central_vertices),
                "remainder": resolve(&remainder),
            })
        })
        .collect();

    write_json(&output_dir.join("clusters.json"), &json!({ "clusters": clusters }))
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(to_string_pretty(value)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::affiliation::RelativeWeightMetric;
    use crate::graph::GraphBuilder;

    #[test]
    fn test_save_results() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(0, 1, 1.0).add_edge(1, 2, 1.0).add_edge(2, 3, 1.0);
        let g = builder.build().unwrap();
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        tree.add_to_remainder(root, [3]);
        let c = tree.add_child(root);
        tree.add_to_remainder(c, [2, 0, 1]);
        let labels: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

        let dir = tempfile::tempdir().unwrap();
        save_results(&tree, Some(labels.as_slice()), &RelativeWeightMetric, dir.path()).unwrap();

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["graph_stats"]["vertex_count"], 4);
        assert_eq!(summary["cluster_stats"]["cluster_count"], 2);
        assert_eq!(summary["cluster_stats"]["leaf_count"], 1);
        assert_eq!(summary["cluster_stats"]["root_remainder_size"], 1);

        let clusters: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("clusters.json")).unwrap()).unwrap();
        let child = &clusters["clusters"][1];
        assert_eq!(child["parent"], 0);
        assert_eq!(child["remainder"], json!(["a", "b", "c"]));
    }
}
