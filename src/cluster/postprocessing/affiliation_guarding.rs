use std::collections::BTreeSet;
use std::sync::Arc;

use super::{Postprocessor, TraversalOrder};
use crate::cluster::affiliation::AffiliationMetric;
use crate::cluster::{ClusterId, ClusterTree};
use crate::error::Result;
use crate::graph::Graph;

/// Re-checks vertex affiliation after the hierarchy has been reshaped.
///
/// Scores are computed over the cluster's aggregate graph, but only vertices
/// of the cluster's own remainder are moved to the parent. Clusters whose
/// remainder drops below the minimum size are dissolved into the parent.
#[derive(Debug, Clone)]
pub struct AffiliationGuardingPostprocessor {
    metric: Arc<dyn AffiliationMetric>,
    min_cluster_size: usize,
    min_affiliation: f64,
}

impl AffiliationGuardingPostprocessor {
    pub fn new(metric: Arc<dyn AffiliationMetric>, min_cluster_size: usize, min_affiliation: f64) -> Self {
        Self {
            metric,
            min_cluster_size,
            min_affiliation,
        }
    }

    /// Drop every vertex of `subgraph` below the affiliation threshold from
    /// `survivors`; those in `own` also move to the parent's remainder
    fn shift_unaffiliated(
        &self,
        tree: &mut ClusterTree<'_>,
        parent: ClusterId,
        subgraph: &Graph,
        own: &mut BTreeSet<u32>,
        survivors: &mut BTreeSet<u32>,
    ) {
        let scores = self.metric.compute(tree.root_graph(), subgraph);
        for (local, score) in scores.into_iter().enumerate() {
            if score < self.min_affiliation {
                let global = subgraph.global_id(local as u32);
                if own.remove(&global) {
                    tree.add_to_remainder(parent, [global]);
                }
                survivors.remove(&global);
            }
        }
    }
}

impl Postprocessor for AffiliationGuardingPostprocessor {
    fn name(&self) -> &'static str {
        "AffiliationGuarding"
    }

    fn traversal_order(&self) -> TraversalOrder {
        TraversalOrder::LocalBottomUp
    }

    fn apply(&self, tree: &mut ClusterTree<'_>, cluster: ClusterId) -> Result<bool> {
        let Some(parent) = tree.parent(cluster) else {
            return Ok(false);
        };

        let mut own: BTreeSet<u32> = tree.remainder(cluster).iter().copied().collect();
        let mut subgraph = tree.aggregate_graph(cluster)?;
        let mut survivors: BTreeSet<u32> = subgraph.global_ids().iter().copied().collect();

        loop {
            let before = own.len();
            self.shift_unaffiliated(tree, parent, &subgraph, &mut own, &mut survivors);
            if own.len() < self.min_cluster_size {
                tree.add_to_remainder(parent, own);
                tree.assimilate_child(parent, cluster, false);
                return Ok(true);
            }
            if own.len() == before {
                break;
            }
            subgraph = tree.root_graph().subgraph(survivors.iter().copied())?;
        }

        if own.len() == tree.remainder(cluster).len() {
            return Ok(false);
        }
        tree.set_remainder(cluster, own.into_iter().collect());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::affiliation::RelativeWeightMetric;
    use crate::graph::GraphBuilder;

    // Two triangles joined by a weak edge, plus a pendant vertex 6 hanging
    // off the second triangle by an even weaker one
    fn graph() -> Graph {
        let mut builder = GraphBuilder::new();
        builder
            .add_edge(0, 1, 1.0)
            .add_edge(1, 2, 1.0)
            .add_edge(0, 2, 1.0)
            .add_edge(3, 4, 1.0)
            .add_edge(4, 5, 1.0)
            .add_edge(3, 5, 1.0)
            .add_edge(2, 3, 0.1)
            .add_edge(5, 6, 0.1)
            .add_edge(6, 0, 1.0);
        builder.build().unwrap()
    }

    fn guarding(min_cluster_size: usize, min_affiliation: f64) -> AffiliationGuardingPostprocessor {
        AffiliationGuardingPostprocessor::new(Arc::new(RelativeWeightMetric), min_cluster_size, min_affiliation)
    }

    #[test]
    fn test_unaffiliated_remainder_vertices_move_to_parent() {
        let g = graph();
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        tree.add_to_remainder(root, [0, 1, 2]);
        let c = tree.add_child(root);
        tree.add_to_remainder(c, [3, 4, 5, 6]);

        assert!(guarding(2, 0.5).apply(&mut tree, c).unwrap());
        assert_eq!(tree.remainder(c), &[3, 4, 5]);
        assert_eq!(tree.remainder(root), &[0, 1, 2, 6]);
        assert!(!guarding(2, 0.5).apply(&mut tree, c).unwrap());
    }

    #[test]
    fn test_descendant_vertices_stay_in_place() {
        let g = graph();
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        tree.add_to_remainder(root, [0, 1, 2]);
        let c = tree.add_child(root);
        tree.add_to_remainder(c, [3, 4, 5]);
        let d = tree.add_child(c);
        tree.add_to_remainder(d, [6]);

        assert!(!guarding(2, 0.5).apply(&mut tree, c).unwrap());
        assert_eq!(tree.remainder(d), &[6]);
        assert_eq!(tree.remainder(c), &[3, 4, 5]);
    }

    #[test]
    fn test_shrunken_cluster_is_dissolved() {
        let g = graph();
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        tree.add_to_remainder(root, [0, 1, 2]);
        let c = tree.add_child(root);
        tree.add_to_remainder(c, [3, 4, 5, 6]);
        let d = tree.add_child(c);

        assert!(guarding(4, 0.5).apply(&mut tree, c).unwrap());
        assert!(!tree.is_attached(c));
        assert_eq!(tree.parent(d), Some(root));
        let mut remainder = tree.remainder(root).to_vec();
        remainder.sort_unstable();
        assert_eq!(remainder, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_root_is_untouched() {
        let g = graph();
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        tree.add_graph_to_remainder(root, &g);
        assert!(!guarding(100, 1.0).apply(&mut tree, root).unwrap());
    }
}
