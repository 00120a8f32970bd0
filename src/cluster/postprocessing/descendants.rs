use super::{Postprocessor, TraversalOrder};
use crate::cluster::{ClusterId, ClusterTree};
use crate::error::Result;

/// Moves clusters up to their grandparent while the grandparent has fewer
/// than `min_children` children
#[derive(Debug, Clone, Copy)]
pub struct DescendantCollapsingPostprocessor {
    min_children: usize,
}

impl DescendantCollapsingPostprocessor {
    pub fn new(min_children: usize) -> Self {
        Self { min_children }
    }
}

impl Postprocessor for DescendantCollapsingPostprocessor {
    fn name(&self) -> &'static str {
        "DescendantCollapsing"
    }

    fn traversal_order(&self) -> TraversalOrder {
        TraversalOrder::LocalBottomUp
    }

    fn apply(&self, tree: &mut ClusterTree<'_>, cluster: ClusterId) -> Result<bool> {
        let Some(grandparent) = tree.parent(cluster).and_then(|p| tree.parent(p)) else {
            return Ok(false);
        };
        if tree.child_count(grandparent) < self.min_children {
            return Ok(tree.annex(grandparent, cluster));
        }
        Ok(false)
    }
}

/// Reduces the hierarchy to the root and its direct children.
///
/// Not part of the default pipeline; add it through
/// [`crate::config::PostprocessingSettings::with_postprocessor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatteningPostprocessor;

impl Postprocessor for FlatteningPostprocessor {
    fn name(&self) -> &'static str {
        "Flattening"
    }

    fn traversal_order(&self) -> TraversalOrder {
        TraversalOrder::LocalBottomUp
    }

    fn apply(&self, tree: &mut ClusterTree<'_>, cluster: ClusterId) -> Result<bool> {
        match tree.parent(cluster) {
            Some(parent) if tree.depth(cluster) > 1 => {
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
    use crate::cluster::postprocessing::apply_postprocessor;
    use crate::graph::{Graph, GraphBuilder};

    fn isolated(n: u32) -> Graph {
        let mut builder = GraphBuilder::new();
        for i in 0..n {
            builder.add_vertex(i);
        }
        builder.build().unwrap()
    }

    // root { c1, c2 { c21, c22 { c221 } } }
    fn hierarchy(g: &Graph) -> (ClusterTree<'_>, [ClusterId; 5]) {
        let mut tree = ClusterTree::new(g);
        let root = tree.root();
        let c1 = tree.add_child(root);
        let c2 = tree.add_child(root);
        let c21 = tree.add_child(c2);
        let c22 = tree.add_child(c2);
        let c221 = tree.add_child(c22);
        for (i, &c) in [c1, c2, c21, c22, c221].iter().enumerate() {
            tree.add_to_remainder(c, [i as u32]);
        }
        (tree, [c1, c2, c21, c22, c221])
    }

    #[test]
    fn test_descendant_collapsing_leaves_top_levels_alone() {
        let g = isolated(5);
        let (mut tree, [c1, c2, ..]) = hierarchy(&g);
        let collapsing = DescendantCollapsingPostprocessor::new(3);
        let root = tree.root();
        assert!(!collapsing.apply(&mut tree, root).unwrap());
        assert!(!collapsing.apply(&mut tree, c1).unwrap());
        assert!(!collapsing.apply(&mut tree, c2).unwrap());
        assert_eq!(tree.parent(c1), Some(root));
        assert_eq!(tree.parent(c2), Some(root));
    }

    #[test]
    fn test_descendant_collapsing_fills_up_to_threshold() {
        let g = isolated(5);
        let (mut tree, [_, c2, c21, c22, c221]) = hierarchy(&g);
        let collapsing = DescendantCollapsingPostprocessor::new(3);
        let root = tree.root();

        assert!(collapsing.apply(&mut tree, c21).unwrap());
        assert_eq!(tree.parent(c21), Some(root));
        assert!(!collapsing.apply(&mut tree, c22).unwrap());
        assert_eq!(tree.child_count(root), 3);

        // Only one level up, below c2
        assert!(collapsing.apply(&mut tree, c221).unwrap());
        assert_eq!(tree.parent(c221), Some(c2));
        assert_eq!(tree.parent(c22), Some(c2));
    }

    #[test]
    fn test_flattening() {
        let g = isolated(5);
        let (mut tree, [c1, c2, c21, c22, c221]) = hierarchy(&g);
        assert!(apply_postprocessor(&FlatteningPostprocessor, &mut tree).unwrap());

        let root = tree.root();
        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![c1, c2]);
        for c in [c21, c22, c221] {
            assert!(!tree.is_attached(c));
        }
        assert_eq!(tree.aggregate_vertices(c2), vec![1, 2, 3, 4]);
        assert!(!apply_postprocessor(&FlatteningPostprocessor, &mut tree).unwrap());
    }
}
