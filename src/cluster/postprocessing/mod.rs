//! Tree-reshaping passes applied to a finished cluster hierarchy

mod affiliation_guarding;
mod descendants;
mod parent_similarity;
mod remainder_size;
mod singletons;

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

pub use affiliation_guarding::AffiliationGuardingPostprocessor;
pub use descendants::{DescendantCollapsingPostprocessor, FlatteningPostprocessor};
pub use parent_similarity::ParentSimilarityPostprocessor;
pub use remainder_size::RemainderSizePostprocessor;
pub use singletons::{SingletonCollapsingPostprocessor, SingletonRedistributionPostprocessor};

use crate::cluster::{ClusterId, ClusterTree};
use crate::config::PostprocessingSettings;
use crate::error::Result;

/// How a postprocessor walks the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// `apply` is called once per cluster, deepest clusters first
    LocalBottomUp,
    /// `apply` is called once with the root and walks the tree itself
    GlobalCustom,
}

/// A single structural rewrite of the cluster tree
pub trait Postprocessor: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn traversal_order(&self) -> TraversalOrder;

    /// Rewrite around `cluster`; returns whether the tree changed
    fn apply(&self, tree: &mut ClusterTree<'_>, cluster: ClusterId) -> Result<bool>;
}

/// Attached clusters in bottom-up order: by depth, then remainder size,
/// then id, all descending
pub fn bottom_up_order(tree: &ClusterTree<'_>) -> Vec<ClusterId> {
    let mut keyed: Vec<(usize, usize, ClusterId)> = tree
        .clusters()
        .into_iter()
        .map(|id| (tree.depth(id), tree.remainder(id).len(), id))
        .collect();
    keyed.sort_unstable_by(|a, b| b.cmp(a));
    keyed.into_iter().map(|(_, _, id)| id).collect()
}

/// Run one postprocessor over the tree according to its traversal order
pub fn apply_postprocessor(postprocessor: &dyn Postprocessor, tree: &mut ClusterTree<'_>) -> Result<bool> {
    match postprocessor.traversal_order() {
        TraversalOrder::GlobalCustom => {
            let root = tree.root();
            postprocessor.apply(tree, root)
        }
        TraversalOrder::LocalBottomUp => {
            let mut changed = false;
            for id in bottom_up_order(tree) {
                // Earlier rewrites may have merged this cluster away
                if tree.is_attached(id) {
                    changed |= postprocessor.apply(tree, id)?;
                }
            }
            Ok(changed)
        }
    }
}

/// The default postprocessing pipeline followed by any custom postprocessors
#[derive(Debug, Clone)]
pub struct Postprocessing {
    pipeline: Vec<Arc<dyn Postprocessor>>,
}

impl Postprocessing {
    pub fn new(settings: &PostprocessingSettings) -> Self {
        let remainder_size: Arc<dyn Postprocessor> =
            Arc::new(RemainderSizePostprocessor::new(settings.min_cluster_size));
        let mut pipeline: Vec<Arc<dyn Postprocessor>> = vec![
            remainder_size.clone(),
            Arc::new(SingletonRedistributionPostprocessor),
            Arc::new(DescendantCollapsingPostprocessor::new(settings.min_children)),
            Arc::new(AffiliationGuardingPostprocessor::new(
                settings.affiliation_metric.clone(),
                settings.min_cluster_size,
                settings.min_affiliation,
            )),
            remainder_size,
            Arc::new(SingletonCollapsingPostprocessor),
        ];
        pipeline.extend(settings.custom_postprocessors.iter().cloned());
        Self { pipeline }
    }

    /// Postprocessors in the order they run
    pub fn pipeline(&self) -> &[Arc<dyn Postprocessor>] {
        &self.pipeline
    }

    /// Run the whole pipeline; returns whether any step changed the tree
    pub fn apply(&self, tree: &mut ClusterTree<'_>) -> Result<bool> {
        let started = Instant::now();
        let mut changed = false;
        for postprocessor in &self.pipeline {
            let step = Instant::now();
            let step_changed = apply_postprocessor(postprocessor.as_ref(), tree)?;
            log::debug!(
                "{} finished in {:?}. There were {} to the cluster hierarchy.",
                postprocessor.name(),
                step.elapsed(),
                if step_changed { "changes" } else { "no changes" }
            );
            changed |= step_changed;
        }
        log::info!("Postprocessing finished after {:?}", started.elapsed());
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, GraphBuilder};

    fn graph(n: u32) -> Graph {
        let mut builder = GraphBuilder::new();
        for i in 0..n {
            builder.add_vertex(i);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_bottom_up_order() {
        let g = graph(6);
        let mut tree = ClusterTree::new(&g);
        let root = tree.root();
        let a = tree.add_child(root);
        let b = tree.add_child(root);
        let c = tree.add_child(a);
        tree.add_to_remainder(a, [0, 1, 2]);
        tree.add_to_remainder(b, [3]);
        tree.add_to_remainder(c, [4, 5]);
        assert_eq!(bottom_up_order(&tree), vec![c, a, b, root]);
    }

    #[test]
    fn test_default_pipeline() {
        let settings = PostprocessingSettings::default()
            .with_postprocessor(Arc::new(FlatteningPostprocessor));
        let names: Vec<_> = Postprocessing::new(&settings)
            .pipeline()
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "RemainderSize",
                "SingletonRedistribution",
                "DescendantCollapsing",
                "AffiliationGuarding",
                "RemainderSize",
                "SingletonCollapsing",
                "Flattening",
            ]
        );
    }
}
