//! Compressed sparse row representation of an undirected weighted graph

use std::mem;

use crate::error::{Error, Result};

/// Marker for "not selected" in local id mappings
const UNMAPPED: u32 = u32::MAX;

/// Immutable weighted graph in compressed-row form.
///
/// Vertices carry a local id `0..order` and a global id. Global ids are kept
/// sorted, so local order follows global order and subgraphs of subgraphs
/// still resolve against the root graph's id space.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    /// Global id for each local id, ascending
    global_ids: Vec<u32>,

    /// offsets[i]..offsets[i + 1] is the arc range of local vertex i
    offsets: Vec<usize>,

    /// Arc targets as local ids, ascending within each row
    neighbors: Vec<u32>,

    /// Arc weights, parallel to `neighbors`
    weights: Vec<f64>,

    /// Sum of incident arc weights per vertex
    vertex_weights: Vec<f64>,

    /// Sum of all vertex weights
    total_weight: f64,
}

impl Default for Graph {
    fn default() -> Self {
        Self::empty()
    }
}

impl Graph {
    /// Graph without vertices
    pub fn empty() -> Self {
        Self {
            global_ids: Vec::new(),
            offsets: vec![0],
            neighbors: Vec::new(),
            weights: Vec::new(),
            vertex_weights: Vec::new(),
            total_weight: 0.0,
        }
    }

    /// Assemble a graph from already compacted rows and derive the vertex weights.
    ///
    /// Callers guarantee sorted global ids, sorted rows and symmetric arcs.
    pub(crate) fn from_rows(
        global_ids: Vec<u32>,
        offsets: Vec<usize>,
        neighbors: Vec<u32>,
        weights: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(offsets.len(), global_ids.len() + 1);
        debug_assert_eq!(neighbors.len(), weights.len());

        let vertex_weights: Vec<f64> = offsets
            .windows(2)
            .map(|range| weights[range[0]..range[1]].iter().sum())
            .collect();
        let total_weight = vertex_weights.iter().sum();

        Self {
            global_ids,
            offsets,
            neighbors,
            weights,
            vertex_weights,
            total_weight,
        }
    }

    /// Number of vertices
    pub fn order(&self) -> usize {
        self.global_ids.len()
    }

    /// Whether the graph has no vertices
    pub fn is_empty(&self) -> bool {
        self.global_ids.is_empty()
    }

    /// Number of stored arcs (an undirected edge counts twice, a self-loop once)
    pub fn num_arcs(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of undirected edges, self-loops included
    pub fn num_edges(&self) -> usize {
        let loops = (0..self.order())
            .filter(|&u| self.edge_weight(u as u32, u as u32).is_some())
            .count();
        (self.num_arcs() - loops) / 2 + loops
    }

    /// Global ids in local order
    pub fn global_ids(&self) -> &[u32] {
        &self.global_ids
    }

    /// Global id of a local vertex
    pub fn global_id(&self, local: u32) -> u32 {
        self.global_ids[local as usize]
    }

    /// Local id of a global vertex, if present
    pub fn local_id(&self, global: u32) -> Option<u32> {
        self.global_ids.binary_search(&global).ok().map(|i| i as u32)
    }

    /// Whether a global id belongs to this graph
    pub fn contains(&self, global: u32) -> bool {
        self.local_id(global).is_some()
    }

    /// Neighbor local ids of a local vertex
    pub fn neighbors(&self, local: u32) -> &[u32] {
        let (start, end) = self.row(local);
        &self.neighbors[start..end]
    }

    /// Arc weights of a local vertex, parallel to [`Graph::neighbors`]
    pub fn neighbor_weights(&self, local: u32) -> &[f64] {
        let (start, end) = self.row(local);
        &self.weights[start..end]
    }

    /// Iterate `(neighbor, weight)` pairs of a local vertex
    pub fn edges(&self, local: u32) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.neighbors(local)
            .iter()
            .copied()
            .zip(self.neighbor_weights(local).iter().copied())
    }

    /// Weight of the arc between two local vertices
    pub fn edge_weight(&self, u: u32, v: u32) -> Option<f64> {
        let (start, _) = self.row(u);
        self.neighbors(u)
            .binary_search(&v)
            .ok()
            .map(|i| self.weights[start + i])
    }

    /// Number of incident arcs of a local vertex
    pub fn degree(&self, local: u32) -> usize {
        let (start, end) = self.row(local);
        end - start
    }

    /// Weight of a local vertex (sum of its incident arc weights)
    pub fn weight(&self, local: u32) -> f64 {
        self.vertex_weights[local as usize]
    }

    /// All vertex weights in local order
    pub fn vertex_weights(&self) -> &[f64] {
        &self.vertex_weights
    }

    /// Weight of a global vertex, 0 when the vertex is not part of this graph
    pub fn weight_for_global_id(&self, global: u32) -> f64 {
        self.local_id(global).map_or(0.0, |local| self.weight(local))
    }

    /// Sum of all vertex weights
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Number of this graph's vertices that are also vertices of `other`
    pub fn overlap(&self, other: &Graph) -> usize {
        let (small, large) = if self.order() <= other.order() {
            (self, other)
        } else {
            (other, self)
        };
        small.global_ids.iter().filter(|&&g| large.contains(g)).count()
    }

    /// Induced subgraph over a set of global ids.
    ///
    /// Duplicates are ignored. Fails on the first id that is not a vertex of
    /// this graph.
    pub fn subgraph<I>(&self, globals: I) -> Result<Graph>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut locals = globals
            .into_iter()
            .map(|g| self.local_id(g).ok_or(Error::UnknownVertex(g)))
            .collect::<Result<Vec<u32>>>()?;
        locals.sort_unstable();
        locals.dedup();
        Ok(self.compact(&locals))
    }

    /// Induced subgraph over the vertices whose global id satisfies `keep`
    pub fn filter_subgraph<F>(&self, mut keep: F) -> Graph
    where
        F: FnMut(u32) -> bool,
    {
        let locals: Vec<u32> = (0..self.order() as u32)
            .filter(|&local| keep(self.global_id(local)))
            .collect();
        self.compact(&locals)
    }

    /// Induced subgraph over a set of local ids
    pub fn local_subgraph<I>(&self, locals: I) -> Result<Graph>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut locals: Vec<u32> = locals.into_iter().collect();
        if let Some(&bad) = locals.iter().find(|&&l| l as usize >= self.order()) {
            return Err(Error::UnknownVertex(bad));
        }
        locals.sort_unstable();
        locals.dedup();
        Ok(self.compact(&locals))
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        mem::size_of::<Self>()
            + self.global_ids.capacity() * mem::size_of::<u32>()
            + self.offsets.capacity() * mem::size_of::<usize>()
            + self.neighbors.capacity() * mem::size_of::<u32>()
            + self.weights.capacity() * mem::size_of::<f64>()
            + self.vertex_weights.capacity() * mem::size_of::<f64>()
    }

    fn row(&self, local: u32) -> (usize, usize) {
        let local = local as usize;
        (self.offsets[local], self.offsets[local + 1])
    }

    /// Copy the rows of sorted, distinct local ids into a fresh graph
    fn compact(&self, locals: &[u32]) -> Graph {
        if locals.len() == self.order() {
            return self.clone();
        }

        // Create mapping from parent to subgraph indices
        let mut parent_to_sub = vec![UNMAPPED; self.order()];
        for (i, &local) in locals.iter().enumerate() {
            parent_to_sub[local as usize] = i as u32;
        }

        let mut global_ids = Vec::with_capacity(locals.len());
        let mut offsets = Vec::with_capacity(locals.len() + 1);
        let mut neighbors = Vec::new();
        let mut weights = Vec::new();
        offsets.push(0);

        for &local in locals {
            global_ids.push(self.global_id(local));
            for (v, w) in self.edges(local) {
                let mapped = parent_to_sub[v as usize];
                // Only include arcs where both endpoints are selected
                if mapped != UNMAPPED {
                    neighbors.push(mapped);
                    weights.push(w);
                }
            }
            offsets.push(neighbors.len());
        }

        Graph::from_rows(global_ids, offsets, neighbors, weights)
    }
}
