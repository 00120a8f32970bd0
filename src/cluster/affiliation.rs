//! Vertex affiliation scoring and the guard that enforces a minimum score

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use crate::cluster::{ClusterId, ClusterTree};
use crate::error::Result;
use crate::graph::Graph;

/// Scores how well each vertex of a subgraph fits into it, relative to a
/// reference supergraph
pub trait AffiliationMetric: Debug + Send + Sync {
    /// One score per local vertex of `subgraph`
    fn compute(&self, supergraph: &Graph, subgraph: &Graph) -> Vec<f64>;

    /// One score per local vertex of `subsubgraph`, measuring its fit in `subgraph`
    fn compute_nested(&self, supergraph: &Graph, subgraph: &Graph, subsubgraph: &Graph) -> Vec<f64>;
}

/// Fraction of a vertex's supergraph weight that stays inside the subgraph.
///
/// Vertices without weight in the supergraph score 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeWeightMetric;

impl AffiliationMetric for RelativeWeightMetric {
    fn compute(&self, supergraph: &Graph, subgraph: &Graph) -> Vec<f64> {
        (0..subgraph.order() as u32)
            .map(|u| relative(subgraph.weight(u), supergraph.weight_for_global_id(subgraph.global_id(u))))
            .collect()
    }

    fn compute_nested(&self, supergraph: &Graph, subgraph: &Graph, subsubgraph: &Graph) -> Vec<f64> {
        subsubgraph
            .global_ids()
            .iter()
            .map(|&g| relative(subgraph.weight_for_global_id(g), supergraph.weight_for_global_id(g)))
            .collect()
    }
}

fn relative(weight: f64, reference: f64) -> f64 {
    if reference != 0.0 {
        weight / reference
    } else {
        0.0
    }
}

/// Shrinks a candidate subgraph until every vertex meets the minimum affiliation.
///
/// Scores are taken against the root graph of the cluster tree. Removed
/// vertices go to the parent cluster's remainder, so nothing is lost.
#[derive(Debug, Clone)]
pub struct AffiliationGuard {
    metric: Arc<dyn AffiliationMetric>,
    min_cluster_size: usize,
    min_affiliation: f64,
}

impl AffiliationGuard {
    pub fn new(metric: Arc<dyn AffiliationMetric>, min_cluster_size: usize, min_affiliation: f64) -> Self {
        Self {
            metric,
            min_cluster_size,
            min_affiliation,
        }
    }

    /// Repair `candidate` as a prospective child of `parent`.
    ///
    /// Returns the stabilised subgraph, which may be exactly the minimum
    /// cluster size. Returns `None` once it shrank below that size or became
    /// empty, in which case every candidate vertex ended up in the parent's
    /// remainder.
    pub fn ensure(&self, tree: &mut ClusterTree<'_>, parent: ClusterId, candidate: Graph) -> Result<Option<Graph>> {
        let root = tree.root_graph();
        let mut survivors: BTreeSet<u32> = candidate.global_ids().iter().copied().collect();
        let mut subgraph = candidate;

        loop {
            let scores = self.metric.compute(root, &subgraph);
            let mut removed = 0;
            for (local, score) in scores.into_iter().enumerate() {
                if score < self.min_affiliation {
                    let global = subgraph.global_id(local as u32);
                    survivors.remove(&global);
                    tree.add_to_remainder(parent, [global]);
                    removed += 1;
                }
            }

            if survivors.is_empty() || survivors.len() < self.min_cluster_size {
                tree.add_to_remainder(parent, survivors);
                return Ok(None);
            }
            if removed == 0 {
                return Ok(Some(subgraph));
            }
            subgraph = root.subgraph(survivors.iter().copied())?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use approx::assert_relative_eq;

    fn chain() -> Graph {
        let mut builder = GraphBuilder::new();
        builder
            .add_edge(50, 51, 10.0)
            .add_edge(51, 52, 1.0)
            .add_edge(52, 53, 1.0)
            .add_edge(53, 54, 9.0);
        builder.build().unwrap()
    }

    fn sorted(mut ids: Vec<u32>) -> Vec<u32> {
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_relative_weight_metric() {
        let g = chain();
        let sub = g.subgraph([50, 51, 52]).unwrap();
        let scores = RelativeWeightMetric.compute(&g, &sub);
        assert_relative_eq!(scores[0], 1.0);
        assert_relative_eq!(scores[1], 1.0);
        assert_relative_eq!(scores[2], 0.5);

        let subsub = g.subgraph([52]).unwrap();
        let nested = RelativeWeightMetric.compute_nested(&g, &sub, &subsub);
        assert_eq!(nested, vec![0.5]);
    }

    #[test]
    fn test_guard_removes_weakly_attached_vertices() {
        let g = chain();
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        let guard = AffiliationGuard::new(Arc::new(RelativeWeightMetric), 0, 0.75);
        let candidate = g.subgraph([50, 51, 52, 53]).unwrap();

        let result = guard.ensure(&mut tree, root, candidate).unwrap().unwrap();
        assert_eq!(result.global_ids(), &[50, 51]);
        assert_eq!(sorted(tree.remainder(root).to_vec()), vec![52, 53]);
    }

    #[test]
    fn test_guard_size_exhaustion() {
        let g = chain();
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        let guard = AffiliationGuard::new(Arc::new(RelativeWeightMetric), 4, 0.75);
        let candidate = g.subgraph([50, 51, 52, 53]).unwrap();

        assert!(guard.ensure(&mut tree, root, candidate).unwrap().is_none());
        assert_eq!(sorted(tree.remainder(root).to_vec()), vec![50, 51, 52, 53]);
    }

    #[test]
    fn test_guard_keeps_survivors_of_exactly_min_size() {
        let g = chain();
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        let guard = AffiliationGuard::new(Arc::new(RelativeWeightMetric), 2, 0.75);
        let candidate = g.subgraph([50, 51, 52, 53]).unwrap();

        let result = guard.ensure(&mut tree, root, candidate).unwrap().unwrap();
        assert_eq!(result.global_ids(), &[50, 51]);
        assert_eq!(sorted(tree.remainder(root).to_vec()), vec![52, 53]);
    }

    #[test]
    fn test_guard_small_candidate_without_removals() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(50, 51, 1.0).add_edge(51, 52, 1.0).add_edge(52, 53, 1.0);
        let g = builder.build().unwrap();
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        let guard = AffiliationGuard::new(Arc::new(RelativeWeightMetric), 10, 0.0);
        let candidate = g.subgraph([50, 51, 52]).unwrap();

        assert!(guard.ensure(&mut tree, root, candidate).unwrap().is_none());
        assert_eq!(sorted(tree.remainder(root).to_vec()), vec![50, 51, 52]);
    }

    #[test]
    fn test_guard_output_is_a_fixed_point() {
        let g = chain();
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        let guard = AffiliationGuard::new(Arc::new(RelativeWeightMetric), 0, 0.75);
        let first = guard.ensure(&mut tree, root, g.subgraph([50, 51, 52, 53]).unwrap()).unwrap().unwrap();
        let remainder = tree.remainder(root).len();

        let second = guard.ensure(&mut tree, root, first.clone()).unwrap().unwrap();
        assert_eq!(second, first);
        assert_eq!(tree.remainder(root).len(), remainder);
    }
}
