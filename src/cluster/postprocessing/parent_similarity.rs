use std::sync::Arc;

use super::{Postprocessor, TraversalOrder};
use crate::cluster::{ClusterId, ClusterTree};
use crate::error::Result;
use crate::graph::GraphSimilarityMetric;

/// Relocates clusters by how similar their aggregate graph is to that of
/// their ancestors.
///
/// A cluster more similar to its parent than `max_similarity` is merged into
/// it. A cluster less similar than `min_similarity` moves up to the nearest
/// ancestor reaching `target_similarity`, failing that to the nearest one
/// reaching `min_similarity`, and failing that to the root.
///
/// Moving clusters invalidates affiliation scores, so this is usually
/// followed by an [`super::AffiliationGuardingPostprocessor`].
#[derive(Debug, Clone)]
pub struct ParentSimilarityPostprocessor {
    metric: Arc<dyn GraphSimilarityMetric>,
    min_similarity: f64,
    max_similarity: f64,
    target_similarity: f64,
}

impl ParentSimilarityPostprocessor {
    pub fn new(
        metric: Arc<dyn GraphSimilarityMetric>,
        min_similarity: f64,
        max_similarity: f64,
        target_similarity: f64,
    ) -> Self {
        Self {
            metric,
            min_similarity,
            max_similarity,
            target_similarity,
        }
    }

    fn similarity(&self, tree: &ClusterTree<'_>, ancestor: ClusterId, cluster: ClusterId) -> Result<f64> {
        let ancestor_graph = tree.aggregate_graph(ancestor)?;
        let cluster_graph = tree.aggregate_graph(cluster)?;
        self.metric.compute(&ancestor_graph, &cluster_graph)
    }
}

impl Postprocessor for ParentSimilarityPostprocessor {
    fn name(&self) -> &'static str {
        "ParentSimilarity"
    }

    fn traversal_order(&self) -> TraversalOrder {
        TraversalOrder::LocalBottomUp
    }

    fn apply(&self, tree: &mut ClusterTree<'_>, cluster: ClusterId) -> Result<bool> {
        let Some(parent) = tree.parent(cluster) else {
            return Ok(false);
        };

        let similarity = self.similarity(tree, parent, cluster)?;
        if similarity > self.max_similarity {
            tree.assimilate_child(parent, cluster, true);
            return Ok(true);
        }
        if similarity >= self.min_similarity {
            return Ok(false);
        }

        let mut fallback = None;
        let mut ancestor = tree.parent(parent);
        while let Some(candidate) = ancestor {
            let similarity = self.similarity(tree, candidate, cluster)?;
            if similarity >= self.target_similarity {
                return Ok(tree.annex(candidate, cluster));
            }
            if fallback.is_none() && similarity >= self.min_similarity {
                fallback = Some(candidate);
            }
            ancestor = tree.parent(candidate);
        }

        let new_parent = fallback.unwrap_or_else(|| tree.root());
        if new_parent == parent {
            return Ok(false);
        }
        Ok(tree.annex(new_parent, cluster))
    }
}
