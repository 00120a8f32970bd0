//! Structural graph algorithms used ahead of bisection

use crate::graph::Graph;

/// Union-find over local vertex ids
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of vertex i)
    parent: Vec<u32>,

    /// Size of each set, valid at roots (for union by size)
    size: Vec<u32>,
}

impl DisjointSets {
    /// Create `n` singleton sets
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
            size: vec![1; n],
        }
    }

    /// Find the root of the set containing x, halving paths on the way
    pub fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return;
        }

        // Attach the smaller tree under the root of the larger one
        let (small, large) = if self.size[root_x as usize] < self.size[root_y as usize] {
            (root_x, root_y)
        } else {
            (root_y, root_x)
        };
        self.parent[small as usize] = large;
        self.size[large as usize] += self.size[small as usize];
    }

    /// Size of the set containing x
    pub fn set_size(&mut self, x: u32) -> u32 {
        let root = self.find(x);
        self.size[root as usize]
    }
}

/// Connected components over edges with positive weight.
///
/// Each component is a sorted list of global ids; components are ordered by
/// their smallest global id.
pub fn connected_components(graph: &Graph) -> Vec<Vec<u32>> {
    let order = graph.order();
    let mut sets = DisjointSets::new(order);
    for u in 0..order as u32 {
        for (v, w) in graph.edges(u) {
            if v < u && w > 0.0 {
                sets.union(u, v);
            }
        }
    }

    // Local ids ascend with global ids, so first-seen roots come out in order
    let mut slot_of_root = vec![u32::MAX; order];
    let mut components: Vec<Vec<u32>> = Vec::new();
    for u in 0..order as u32 {
        let root = sets.find(u) as usize;
        if slot_of_root[root] == u32::MAX {
            slot_of_root[root] = components.len() as u32;
            components.push(Vec::with_capacity(sets.set_size(u) as usize));
        }
        components[slot_of_root[root] as usize].push(graph.global_id(u));
    }
    components
}

/// Whether every vertex is reachable from every other over positive-weight edges
pub fn is_connected(graph: &Graph) -> bool {
    connected_components(graph).len() <= 1
}
