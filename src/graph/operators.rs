//! Implicit linear operators over a graph
//!
//! Operators never materialise a matrix; every application is one edge
//! traversal over the graph's compressed rows.

use crate::error::{Error, Result};
use crate::graph::traversal::{Traversal, TraversalMode};
use crate::graph::{vectors, Graph};

/// Square linear map applied to dense vectors
pub trait LinearOperator {
    /// Dimension of the operator
    fn size(&self) -> usize;

    /// Compute `self * x`. Fails when `x.len() != self.size()`.
    fn apply(&mut self, x: &[f64]) -> Result<Vec<f64>>;
}

fn check_dimension(expected: usize, x: &[f64]) -> Result<()> {
    if x.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            found: x.len(),
        });
    }
    Ok(())
}

/// Weighted adjacency matrix `A`
#[derive(Debug, Clone)]
pub struct AdjacencyOperator<'g> {
    graph: &'g Graph,
    traversal: Traversal,
}

impl<'g> AdjacencyOperator<'g> {
    pub fn new(graph: &'g Graph, traversal: Traversal) -> Self {
        Self { graph, traversal }
    }
}

impl LinearOperator for AdjacencyOperator<'_> {
    fn size(&self) -> usize {
        self.graph.order()
    }

    fn apply(&mut self, x: &[f64]) -> Result<Vec<f64>> {
        check_dimension(self.size(), x)?;
        Ok(self
            .traversal
            .accumulate_rows(self.graph, TraversalMode::Default, |_, v, w| w * x[v as usize]))
    }
}

/// `I + D^-1/2 A D^-1/2 - 2 v0 v0ᵀ`, the normalized Laplacian reflected and
/// deflated so that its dominant eigenvector is the Fiedler vector.
///
/// `v0[i] = sqrt(w[i] / W)` is the known null vector of the normalized
/// Laplacian. Results are meaningful only for connected graphs and unit input
/// vectors; neither is checked per application.
#[derive(Debug, Clone)]
pub struct ShiftedNormalizedLaplacian<'g> {
    adjacency: AdjacencyOperator<'g>,

    /// 1 / sqrt(w[i])
    inv_sqrt_weights: Vec<f64>,

    /// Normalized null vector
    v0: Vec<f64>,

    /// D^-1/2 x, reused across applications
    scratch: Vec<f64>,
}

impl<'g> ShiftedNormalizedLaplacian<'g> {
    /// Fails when a vertex has zero weight, for which `D^-1/2` is undefined
    pub fn new(graph: &'g Graph, traversal: Traversal) -> Result<Self> {
        if let Some(local) = (0..graph.order() as u32).find(|&u| graph.weight(u) <= 0.0) {
            return Err(Error::ZeroWeightVertex(graph.global_id(local)));
        }

        let total = graph.total_weight();
        let inv_sqrt_weights = graph.vertex_weights().iter().map(|w| 1.0 / w.sqrt()).collect();
        let v0 = graph.vertex_weights().iter().map(|w| (w / total).sqrt()).collect();

        Ok(Self {
            adjacency: AdjacencyOperator::new(graph, traversal),
            inv_sqrt_weights,
            v0,
            scratch: vec![0.0; graph.order()],
        })
    }

    /// The deflated null vector `v0`
    pub fn null_vector(&self) -> &[f64] {
        &self.v0
    }
}

impl LinearOperator for ShiftedNormalizedLaplacian<'_> {
    fn size(&self) -> usize {
        self.v0.len()
    }

    fn apply(&mut self, x: &[f64]) -> Result<Vec<f64>> {
        check_dimension(self.size(), x)?;

        for ((s, xi), d) in self.scratch.iter_mut().zip(x).zip(&self.inv_sqrt_weights) {
            *s = xi * d;
        }
        let ay = self.adjacency.apply(&self.scratch)?;
        let mu = 2.0 * vectors::dot(&self.v0, x);

        Ok(x.iter()
            .zip(ay)
            .zip(self.inv_sqrt_weights.iter().zip(&self.v0))
            .map(|((xi, ayi), (d, v0i))| xi + ayi * d - mu * v0i)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2};

    fn weighted_square() -> Graph {
        let mut builder = GraphBuilder::new();
        builder
            .add_edge(0, 1, 2.0)
            .add_edge(1, 2, 1.0)
            .add_edge(2, 3, 3.0)
            .add_edge(3, 0, 0.5)
            .add_edge(1, 1, 4.0);
        builder.build().unwrap()
    }

    #[test]
    fn test_adjacency_matches_dense_product() {
        let g = weighted_square();
        let mut dense = Array2::<f64>::zeros((4, 4));
        for u in 0..4u32 {
            for (v, w) in g.edges(u) {
                dense[[u as usize, v as usize]] = w;
            }
        }
        let x = vec![0.3, -1.2, 2.0, 0.7];
        let expected = dense.dot(&Array1::from(x.clone()));

        let mut op = AdjacencyOperator::new(&g, Traversal::sequential());
        let result = op.apply(&x).unwrap();
        for (a, b) in result.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let g = weighted_square();
        let mut op = AdjacencyOperator::new(&g, Traversal::sequential());
        assert!(matches!(
            op.apply(&[1.0, 2.0]),
            Err(Error::DimensionMismatch { expected: 4, found: 2 })
        ));
    }

    #[test]
    fn test_null_vector_is_annihilated() {
        let g = weighted_square();
        let mut op = ShiftedNormalizedLaplacian::new(&g, Traversal::sequential()).unwrap();
        let v0 = op.null_vector().to_vec();
        assert_relative_eq!(vectors::norm2(&v0), 1.0, epsilon = 1e-12);

        // D^-1/2 A D^-1/2 v0 = v0, so the shift and deflation cancel out
        let image = op.apply(&v0).unwrap();
        for value in image {
            assert_relative_eq!(value, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rejects_zero_weight_vertex() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(0, 1, 1.0).add_vertex(7);
        let g = builder.build().unwrap();
        assert!(matches!(
            ShiftedNormalizedLaplacian::new(&g, Traversal::sequential()),
            Err(Error::ZeroWeightVertex(7))
        ));
    }
}
