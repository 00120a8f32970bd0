//! Cluster hierarchy produced by recursive spectral clustering
//!
//! The tree is an arena of cluster records addressed by [`ClusterId`].
//! Every vertex of the root graph lives in exactly one cluster's remainder;
//! a cluster's aggregate vertex set is its remainder plus the remainders of
//! all its descendants.

pub mod affiliation;
pub mod detection;
pub mod metrics;
pub mod postprocessing;

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::Graph;

/// Handle of a cluster inside its [`ClusterTree`]; ids grow in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterId(usize);

impl ClusterId {
    /// Position of the cluster in creation order
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
struct ClusterNode {
    parent: Option<ClusterId>,
    /// Ordered by creation
    children: BTreeSet<ClusterId>,
    /// Global ids owned by this cluster and none of its descendants
    remainder: Vec<u32>,
    /// False once the cluster was merged away
    attached: bool,
}

/// Mutable cluster hierarchy over a root graph.
///
/// Not synchronised: a tree is built and reshaped by one thread at a time.
#[derive(Debug, Clone)]
pub struct ClusterTree<'g> {
    graph: &'g Graph,
    nodes: Vec<ClusterNode>,
}

impl<'g> ClusterTree<'g> {
    /// Tree consisting of an empty root cluster
    pub fn new(graph: &'g Graph) -> Self {
        let root = ClusterNode {
            attached: true,
            ..ClusterNode::default()
        };
        Self {
            graph,
            nodes: vec![root],
        }
    }

    /// The root graph all remainders refer to
    pub fn root_graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn root(&self) -> ClusterId {
        ClusterId(0)
    }

    /// Create an empty child cluster
    pub fn add_child(&mut self, parent: ClusterId) -> ClusterId {
        let id = ClusterId(self.nodes.len());
        self.nodes.push(ClusterNode {
            parent: Some(parent),
            attached: true,
            ..ClusterNode::default()
        });
        self.nodes[parent.0].children.insert(id);
        id
    }

    pub fn parent(&self, id: ClusterId) -> Option<ClusterId> {
        self.nodes[id.0].parent
    }

    /// Children of a cluster in creation order
    pub fn children(&self, id: ClusterId) -> impl Iterator<Item = ClusterId> + '_ {
        self.nodes[id.0].children.iter().copied()
    }

    pub fn child_count(&self, id: ClusterId) -> usize {
        self.nodes[id.0].children.len()
    }

    pub fn remainder(&self, id: ClusterId) -> &[u32] {
        &self.nodes[id.0].remainder
    }

    pub fn add_to_remainder<I>(&mut self, id: ClusterId, vertices: I)
    where
        I: IntoIterator<Item = u32>,
    {
        self.nodes[id.0].remainder.extend(vertices);
    }

    /// Move every vertex of `graph` into the remainder of `id`
    pub fn add_graph_to_remainder(&mut self, id: ClusterId, graph: &Graph) {
        self.add_to_remainder(id, graph.global_ids().iter().copied());
    }

    /// Replace the remainder of `id`, returning the previous one
    pub fn set_remainder(&mut self, id: ClusterId, remainder: Vec<u32>) -> Vec<u32> {
        std::mem::replace(&mut self.nodes[id.0].remainder, remainder)
    }

    /// Number of edges between `id` and the root
    pub fn depth(&self, id: ClusterId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Whether the cluster is still part of the hierarchy
    pub fn is_attached(&self, id: ClusterId) -> bool {
        self.nodes[id.0].attached
    }

    /// Number of clusters currently in the hierarchy
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.attached).count()
    }

    /// Whether the hierarchy consists of nothing but an empty root
    pub fn is_empty(&self) -> bool {
        self.len() == 1 && self.nodes[0].remainder.is_empty()
    }

    /// Depth-first pre-order walk of the subtree rooted at `id`
    pub fn traverse<F>(&self, id: ClusterId, mut visitor: F)
    where
        F: FnMut(ClusterId),
    {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            visitor(current);
            // Reverse so that children are visited in creation order
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
    }

    /// All clusters of the subtree rooted at `id`, in pre-order
    pub fn subtree(&self, id: ClusterId) -> Vec<ClusterId> {
        let mut clusters = Vec::new();
        self.traverse(id, |c| clusters.push(c));
        clusters
    }

    /// Every attached cluster, in pre-order from the root
    pub fn clusters(&self) -> Vec<ClusterId> {
        self.subtree(self.root())
    }

    /// Sorted global ids of the cluster's remainder and all descendant remainders
    pub fn aggregate_vertices(&self, id: ClusterId) -> Vec<u32> {
        let mut vertices = Vec::new();
        self.traverse(id, |c| vertices.extend_from_slice(self.remainder(c)));
        vertices.sort_unstable();
        vertices
    }

    /// Root subgraph induced by [`ClusterTree::aggregate_vertices`]
    pub fn aggregate_graph(&self, id: ClusterId) -> Result<Graph> {
        self.graph.subgraph(self.aggregate_vertices(id))
    }

    /// Root subgraph induced by the cluster's own remainder
    pub fn remainder_graph(&self, id: ClusterId) -> Result<Graph> {
        self.graph.subgraph(self.remainder(id).iter().copied())
    }

    /// Dissolve `child` into `parent`.
    ///
    /// The child's children are re-parented to `parent`. With
    /// `take_remainder` the child's remainder is appended to the parent's;
    /// otherwise the caller has already redistributed it and it is dropped.
    pub fn assimilate_child(&mut self, parent: ClusterId, child: ClusterId, take_remainder: bool) {
        debug_assert_eq!(self.parent(child), Some(parent));
        self.nodes[parent.0].children.remove(&child);

        let grandchildren = std::mem::take(&mut self.nodes[child.0].children);
        for &grandchild in &grandchildren {
            self.nodes[grandchild.0].parent = Some(parent);
        }
        self.nodes[parent.0].children.extend(grandchildren);

        let remainder = std::mem::take(&mut self.nodes[child.0].remainder);
        if take_remainder {
            self.nodes[parent.0].remainder.extend(remainder);
        }

        let node = &mut self.nodes[child.0];
        node.parent = None;
        node.attached = false;
    }

    /// Move `cluster` (with its whole subtree) under `new_parent`.
    ///
    /// Returns false if `cluster` is the root.
    pub fn annex(&mut self, new_parent: ClusterId, cluster: ClusterId) -> bool {
        let Some(old_parent) = self.parent(cluster) else {
            return false;
        };
        if !self.nodes[old_parent.0].children.remove(&cluster) {
            return false;
        }
        self.nodes[cluster.0].parent = Some(new_parent);
        self.nodes[new_parent.0].children.insert(cluster);
        true
    }

    /// Hash of the tree's shape and remainder contents.
    ///
    /// Equal trees hash equally regardless of the order in which vertices
    /// were appended to a remainder.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.traverse(self.root(), |id| {
            let mut remainder = self.remainder(id).to_vec();
            remainder.sort_unstable();
            self.depth(id).hash(&mut hasher);
            self.child_count(id).hash(&mut hasher);
            remainder.hash(&mut hasher);
        });
        hasher.finish()
    }
}
