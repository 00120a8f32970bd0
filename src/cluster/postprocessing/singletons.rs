use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use super::{Postprocessor, TraversalOrder};
use crate::cluster::{ClusterId, ClusterTree};
use crate::error::Result;

/// Merges a cluster into its parent when it is the parent's only child
#[derive(Debug, Clone, Copy, Default)]
pub struct SingletonCollapsingPostprocessor;

impl Postprocessor for SingletonCollapsingPostprocessor {
    fn name(&self) -> &'static str {
        "SingletonCollapsing"
    }

    fn traversal_order(&self) -> TraversalOrder {
        TraversalOrder::LocalBottomUp
    }

    fn apply(&self, tree: &mut ClusterTree<'_>, cluster: ClusterId) -> Result<bool> {
        match tree.parent(cluster) {
            Some(parent) if tree.child_count(parent) == 1 => {
                tree.assimilate_child(parent, cluster, true);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Pulls chains of only-children up to their nearest ancestor with at least
/// two children.
///
/// Starts at the leaves and works upwards in bottom-up order. Every cluster
/// on such a chain becomes a sibling under that ancestor, so no cluster is
/// left with exactly one child unless no branching ancestor exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingletonRedistributionPostprocessor;

/// Max-heap of clusters keyed like [`super::bottom_up_order`]
struct RedistributionQueue {
    heap: BinaryHeap<(usize, usize, ClusterId)>,
    enqueued: FxHashSet<ClusterId>,
}

impl RedistributionQueue {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            enqueued: FxHashSet::default(),
        }
    }

    fn push(&mut self, tree: &ClusterTree<'_>, cluster: ClusterId) {
        if self.enqueued.insert(cluster) {
            self.heap.push((tree.depth(cluster), tree.remainder(cluster).len(), cluster));
        }
    }

    fn pop(&mut self) -> Option<ClusterId> {
        self.heap.pop().map(|(_, _, cluster)| cluster)
    }
}

impl SingletonRedistributionPostprocessor {
    fn nearest_branching_ancestor(tree: &ClusterTree<'_>, cluster: ClusterId) -> Option<ClusterId> {
        let mut ancestor = tree.parent(cluster);
        while let Some(current) = ancestor {
            if tree.child_count(current) >= 2 {
                return Some(current);
            }
            ancestor = tree.parent(current);
        }
        None
    }

    fn redistribute(tree: &mut ClusterTree<'_>, cluster: ClusterId, queue: &mut RedistributionQueue) -> bool {
        let Some(parent) = tree.parent(cluster) else {
            return false;
        };
        let Some(ancestor) = Self::nearest_branching_ancestor(tree, cluster) else {
            return false;
        };
        queue.push(tree, ancestor);
        if ancestor == parent {
            return false;
        }

        let mut chain = Vec::new();
        let mut current = cluster;
        while let Some(next) = tree.parent(current).filter(|&p| p != ancestor) {
            chain.push(current);
            current = next;
        }
        for link in chain {
            tree.annex(ancestor, link);
        }
        true
    }
}

impl Postprocessor for SingletonRedistributionPostprocessor {
    fn name(&self) -> &'static str {
        "SingletonRedistribution"
    }

    fn traversal_order(&self) -> TraversalOrder {
        TraversalOrder::GlobalCustom
    }

    fn apply(&self, tree: &mut ClusterTree<'_>, root: ClusterId) -> Result<bool> {
        let mut queue = RedistributionQueue::new();
        for cluster in tree.subtree(root) {
            if tree.child_count(cluster) == 0 {
                queue.push(tree, cluster);
            }
        }

        let mut changed = false;
        while let Some(cluster) = queue.pop() {
            changed |= Self::redistribute(tree, cluster, &mut queue);
        }
        Ok(changed)
    }
}
