//! Cluster statistics used when reporting a finished hierarchy

use serde::Serialize;

use crate::cluster::affiliation::AffiliationMetric;
use crate::cluster::{ClusterId, ClusterTree};
use crate::error::Result;
use crate::graph::Graph;

/// Number of central vertices reported per cluster
pub const CENTRAL_VERTEX_COUNT: usize = 5;

/// Summary statistics of one cluster
#[derive(Debug, Clone, Serialize)]
pub struct ClusterMetrics {
    pub id: ClusterId,
    pub parent: Option<ClusterId>,
    pub depth: usize,
    pub children: Vec<ClusterId>,

    /// Number of vertices in the cluster and all its descendants
    pub size: usize,

    /// Number of vertices owned by the cluster itself
    pub remainder_size: usize,

    /// Fraction of possible edges present in the aggregate graph
    pub density: f64,

    /// Global ids of the heaviest vertices of the aggregate graph
    pub central_vertices: Vec<u32>,

    /// Mean affiliation of the remainder vertices with the aggregate graph
    pub mean_affiliation: f64,
}

/// Compute metrics for one cluster
pub fn cluster_metrics(
    tree: &ClusterTree<'_>,
    id: ClusterId,
    metric: &dyn AffiliationMetric,
) -> Result<ClusterMetrics> {
    let aggregate = tree.aggregate_graph(id)?;
    let remainder = tree.remainder_graph(id)?;

    let scores = metric.compute_nested(tree.root_graph(), &aggregate, &remainder);
    let mean_affiliation = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    Ok(ClusterMetrics {
        id,
        parent: tree.parent(id),
        depth: tree.depth(id),
        children: tree.children(id).collect(),
        size: aggregate.order(),
        remainder_size: remainder.order(),
        density: density(&aggregate),
        central_vertices: central_vertices(&aggregate, CENTRAL_VERTEX_COUNT),
        mean_affiliation,
    })
}

/// Metrics of every attached cluster, in pre-order from the root
pub fn tree_metrics(tree: &ClusterTree<'_>, metric: &dyn AffiliationMetric) -> Result<Vec<ClusterMetrics>> {
    tree.clusters()
        .into_iter()
        .map(|id| cluster_metrics(tree, id, metric))
        .collect()
}

/// Calculate density (edges between distinct vertices / potential edges)
pub fn density(graph: &Graph) -> f64 {
    let n = graph.order();
    if n <= 1 {
        // Singleton clusters have density 1 by convention
        return 1.0;
    }

    let self_loops = (0..n as u32)
        .filter(|&u| graph.neighbors(u).binary_search(&u).is_ok())
        .count();
    let edges = graph.num_edges() - self_loops;
    let potential = n * (n - 1) / 2;
    edges as f64 / potential as f64
}

/// Global ids of the `k` heaviest vertices, heaviest first, ties by id
pub fn central_vertices(graph: &Graph, k: usize) -> Vec<u32> {
    let mut weighted: Vec<(u32, f64)> = (0..graph.order() as u32)
        .map(|u| (graph.global_id(u), graph.weight(u)))
        .collect();
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    weighted.into_iter().take(k).map(|(g, _)| g).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::affiliation::RelativeWeightMetric;
    use crate::graph::GraphBuilder;
    use approx::assert_relative_eq;

    fn star(leaves: u32) -> Graph {
        let mut builder = GraphBuilder::new();
        for v in 1..=leaves {
            builder.add_edge(0, v, v as f64);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_density() {
        let g = star(3);
        assert_relative_eq!(density(&g), 0.5);
        assert_relative_eq!(density(&g.subgraph([0, 1]).unwrap()), 1.0);
        assert_relative_eq!(density(&g.subgraph([1]).unwrap()), 1.0);
        assert_relative_eq!(density(&g.subgraph([1, 2]).unwrap()), 0.0);
    }

    #[test]
    fn test_density_ignores_self_loops() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(0, 0, 1.0).add_edge(0, 1, 1.0).add_vertex(2);
        let g = builder.build().unwrap();
        assert_relative_eq!(density(&g), 1.0 / 3.0);
    }

    #[test]
    fn test_central_vertices() {
        let g = star(6);
        assert_eq!(central_vertices(&g, 3), vec![0, 6, 5]);
        assert_eq!(central_vertices(&g, 100).len(), 7);
    }

    #[test]
    fn test_cluster_metrics() {
        let g = star(4);
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        tree.add_to_remainder(root, [1]);
        let c = tree.add_child(root);
        tree.add_to_remainder(c, [0, 3, 4]);
        let d = tree.add_child(c);
        tree.add_to_remainder(d, [2]);

        let m = cluster_metrics(&tree, c, &RelativeWeightMetric).unwrap();
        assert_eq!(m.parent, Some(root));
        assert_eq!(m.depth, 1);
        assert_eq!(m.children, vec![d]);
        assert_eq!(m.size, 4);
        assert_eq!(m.remainder_size, 3);
        assert_eq!(m.central_vertices, vec![0, 4, 3, 2]);
        // Vertex 0 keeps 9 of 10, vertices 3 and 4 keep everything
        assert_relative_eq!(m.mean_affiliation, (0.9 + 1.0 + 1.0) / 3.0);

        let all = tree_metrics(&tree, &RelativeWeightMetric).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].size, 5);
    }
}
