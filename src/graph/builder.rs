//! Graph construction module

use std::collections::HashMap;

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::graph::Graph;

/// Builder accumulating undirected weighted edges before compacting them into a [`Graph`]
#[derive(Debug, Default, Clone)]
pub struct GraphBuilder {
    /// Arcs as (source, target, weight); each undirected edge is stored in both directions
    arcs: Vec<(u32, u32, f64)>,

    /// Vertices registered without edges
    isolated: Vec<u32>,
}

impl GraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with room for `edge_count` undirected edges
    pub fn with_capacity(edge_count: usize) -> Self {
        Self {
            arcs: Vec::with_capacity(edge_count * 2),
            isolated: Vec::new(),
        }
    }

    /// Add an undirected edge. Repeated edges have their weights summed.
    pub fn add_edge(&mut self, u: u32, v: u32, weight: f64) -> &mut Self {
        self.arcs.push((u, v, weight));
        if u != v {
            self.arcs.push((v, u, weight));
        }
        self
    }

    /// Register a vertex that may have no incident edges
    pub fn add_vertex(&mut self, id: u32) -> &mut Self {
        self.isolated.push(id);
        self
    }

    /// Build the compressed graph
    pub fn build(mut self) -> Result<Graph> {
        if let Some(&(u, v, weight)) = self
            .arcs
            .iter()
            .find(|(_, _, w)| !w.is_finite() || *w < 0.0)
        {
            return Err(Error::InvalidEdgeWeight { u, v, weight });
        }

        // Vertex set: every arc source plus explicitly registered vertices
        let mut global_ids: Vec<u32> = self.arcs.iter().map(|&(u, _, _)| u).collect();
        global_ids.append(&mut self.isolated);
        global_ids.sort_unstable();
        global_ids.dedup();

        // Sort arcs by row, then neighbor, so duplicates become adjacent
        self.arcs
            .sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut offsets = vec![0usize; global_ids.len() + 1];
        let mut neighbors: Vec<u32> = Vec::with_capacity(self.arcs.len());
        let mut weights: Vec<f64> = Vec::with_capacity(self.arcs.len());

        let merged = self.arcs.into_iter().coalesce(|a, b| {
            if (a.0, a.1) == (b.0, b.1) {
                Ok((a.0, a.1, a.2 + b.2))
            } else {
                Err((a, b))
            }
        });
        for (u, v, w) in merged {
            // Both ids are in `global_ids` by construction
            let lu = local_of(&global_ids, u)?;
            let lv = local_of(&global_ids, v)?;
            neighbors.push(lv);
            weights.push(w);
            offsets[lu as usize + 1] += 1;
        }

        // Prefix sums turn row lengths into offsets
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }

        let graph = Graph::from_rows(global_ids, offsets, neighbors, weights);
        log::debug!(
            "Built graph with {} vertices and {} edges ({} bytes)",
            graph.order(),
            graph.num_edges(),
            graph.memory_usage()
        );

        Ok(graph)
    }
}

fn local_of(global_ids: &[u32], id: u32) -> Result<u32> {
    global_ids
        .binary_search(&id)
        .map(|i| i as u32)
        .map_err(|_| Error::UnknownVertex(id))
}

/// Builder that assigns dense integer ids to string labels as edges arrive
#[derive(Debug, Default)]
pub struct LabeledGraphBuilder {
    /// Mapping from labels to vertex ids
    id_to_index: HashMap<String, u32>,

    /// Labels indexed by vertex id
    labels: Vec<String>,

    inner: GraphBuilder,
}

impl LabeledGraphBuilder {
    /// Create a labelled builder with room for `vertex_count` labels and
    /// `edge_count` undirected edges
    pub fn with_capacity(vertex_count: usize, edge_count: usize) -> Self {
        let mut inner = GraphBuilder::with_capacity(edge_count);
        inner.isolated.reserve(vertex_count);
        Self {
            id_to_index: HashMap::with_capacity(vertex_count),
            labels: Vec::with_capacity(vertex_count),
            inner,
        }
    }

    /// Get or create a vertex id for the given label
    pub fn get_or_create_node(&mut self, label: &str) -> u32 {
        if let Some(&idx) = self.id_to_index.get(label) {
            return idx;
        }

        let idx = self.labels.len() as u32;
        self.id_to_index.insert(label.to_string(), idx);
        self.labels.push(label.to_string());
        self.inner.add_vertex(idx);

        idx
    }

    /// Add an undirected edge between two labelled vertices
    pub fn add_edge(&mut self, u: &str, v: &str, weight: f64) {
        let u = self.get_or_create_node(u);
        let v = self.get_or_create_node(v);
        self.inner.add_edge(u, v, weight);
    }

    /// Number of distinct labels seen
    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Build the graph; labels are returned indexed by vertex id
    pub fn build(self) -> Result<(Graph, Vec<String>)> {
        let graph = self.inner.build()?;
        Ok((graph, self.labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_edges_are_summed() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(0, 1, 1.0).add_edge(1, 0, 2.5).add_edge(1, 2, 1.0);
        let g = builder.build().unwrap();
        assert_eq!(g.edge_weight(0, 1), Some(3.5));
        assert_eq!(g.edge_weight(1, 0), Some(3.5));
        assert_eq!(g.neighbors(1), &[0, 2]);
    }

    #[test]
    fn test_self_loop_stored_once() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(4, 4, 2.0).add_edge(4, 5, 1.0);
        let g = builder.build().unwrap();
        assert_eq!(g.degree(0), 2);
        assert_eq!(g.weight(0), 3.0);
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(0, 1, -1.0);
        assert!(matches!(builder.build(), Err(Error::InvalidEdgeWeight { .. })));

        let mut builder = GraphBuilder::new();
        builder.add_edge(0, 1, f64::NAN);
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_isolated_vertex() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(1, 2, 1.0).add_vertex(9);
        let g = builder.build().unwrap();
        assert_eq!(g.global_ids(), &[1, 2, 9]);
        assert_eq!(g.weight(2), 0.0);
    }

    #[test]
    fn test_labeled_builder() {
        let mut builder = LabeledGraphBuilder::with_capacity(4, 4);
        builder.add_edge("alice", "bob", 1.0);
        builder.add_edge("bob", "carol", 2.0);
        assert_eq!(builder.get_or_create_node("alice"), 0);
        let (g, labels) = builder.build().unwrap();
        assert_eq!(labels, vec!["alice", "bob", "carol"]);
        assert_eq!(g.edge_weight(1, 2), Some(2.0));
    }

    #[test]
    fn test_labeled_capacity_is_split_by_vertices_and_edges() {
        let builder = LabeledGraphBuilder::with_capacity(3, 10);
        assert!(builder.labels.capacity() >= 3);
        assert!(builder.inner.isolated.capacity() >= 3);
        assert!(builder.inner.arcs.capacity() >= 20);
        assert_eq!(builder.node_count(), 0);
    }
}
