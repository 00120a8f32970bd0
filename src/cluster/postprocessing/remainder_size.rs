use super::{Postprocessor, TraversalOrder};
use crate::cluster::{ClusterId, ClusterTree};
use crate::error::Result;

/// Merges clusters whose own remainder is smaller than the minimum cluster
/// size into their parent
#[derive(Debug, Clone, Copy)]
pub struct RemainderSizePostprocessor {
    min_cluster_size: usize,
}

impl RemainderSizePostprocessor {
    pub fn new(min_cluster_size: usize) -> Self {
        Self { min_cluster_size }
    }
}

impl Postprocessor for RemainderSizePostprocessor {
    fn name(&self) -> &'static str {
        "RemainderSize"
    }

    fn traversal_order(&self) -> TraversalOrder {
        TraversalOrder::LocalBottomUp
    }

    fn apply(&self, tree: &mut ClusterTree<'_>, cluster: ClusterId) -> Result<bool> {
        match tree.parent(cluster) {
            Some(parent) if tree.remainder(cluster).len() < self.min_cluster_size => {
                tree.assimilate_child(parent, cluster, true);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, GraphBuilder};

    fn complete_graph(n: u32) -> Graph {
        let mut builder = GraphBuilder::new();
        for u in 0..n {
            for v in u + 1..n {
                builder.add_edge(u, v, 1.0);
            }
        }
        builder.build().unwrap()
    }

    struct Fixture<'g> {
        tree: ClusterTree<'g>,
        c1: ClusterId,
        c11: ClusterId,
        c12: ClusterId,
        c121: ClusterId,
    }

    fn fixture(g: &Graph) -> Fixture<'_> {
        let mut tree = ClusterTree::new(g);
        let root = tree.root();
        tree.add_to_remainder(root, [0]);
        let c1 = tree.add_child(root);
        tree.add_to_remainder(c1, [1, 2, 3]);
        let c11 = tree.add_child(c1);
        tree.add_to_remainder(c11, [4, 5, 6]);
        let c12 = tree.add_child(c1);
        tree.add_to_remainder(c12, [7, 8]);
        let c121 = tree.add_child(c12);
        tree.add_to_remainder(c121, [9, 10, 11]);
        Fixture {
            tree,
            c1,
            c11,
            c12,
            c121,
        }
    }

    #[test]
    fn test_low_min_size_has_no_effect() {
        let g = complete_graph(12);
        let mut f = fixture(&g);
        assert!(!RemainderSizePostprocessor::new(1).apply(&mut f.tree, f.c12).unwrap());
        assert_eq!(f.tree.children(f.c1).collect::<Vec<_>>(), vec![f.c11, f.c12]);
        assert_eq!(f.tree.remainder(f.c12), &[7, 8]);
    }

    #[test]
    fn test_small_remainder_is_merged() {
        let g = complete_graph(12);
        let mut f = fixture(&g);
        assert!(RemainderSizePostprocessor::new(3).apply(&mut f.tree, f.c12).unwrap());
        assert_eq!(f.tree.children(f.c1).collect::<Vec<_>>(), vec![f.c11, f.c121]);
        assert_eq!(f.tree.remainder(f.c1), &[1, 2, 3, 7, 8]);
    }

    #[test]
    fn test_root_is_never_merged() {
        let g = complete_graph(12);
        let mut f = fixture(&g);
        let root = f.tree.root();
        assert!(!RemainderSizePostprocessor::new(100).apply(&mut f.tree, root).unwrap());
    }
}
