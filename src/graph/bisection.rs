//! Spectral bisection by the sign pattern of the Fiedler vector

use std::sync::Arc;

use crate::error::Result;
use crate::graph::operators::ShiftedNormalizedLaplacian;
use crate::graph::power_iteration::{power_iteration, CriterionFactory, RandomInitialVectors};
use crate::graph::traversal::Traversal;
use crate::graph::Graph;

/// Two-way vertex partition of a graph
#[derive(Debug, Clone)]
pub struct Bisection {
    /// Vertices with a non-negative eigenvector coordinate
    pub positive: Graph,

    /// Vertices with a negative eigenvector coordinate
    pub negative: Graph,
}

impl Bisection {
    /// Whether one side is empty, i.e. no cut was found
    pub fn is_degenerate(&self) -> bool {
        self.positive.is_empty() || self.negative.is_empty()
    }
}

/// Splits connected graphs along the sign of the shifted normalized
/// Laplacian's dominant eigenvector
#[derive(Debug, Clone)]
pub struct SpectralBisector {
    convergence: Arc<dyn CriterionFactory>,
    max_iterations: usize,
    traversal: Traversal,
}

impl SpectralBisector {
    pub fn new(convergence: Arc<dyn CriterionFactory>, max_iterations: usize, traversal: Traversal) -> Self {
        Self {
            convergence,
            max_iterations,
            traversal,
        }
    }

    /// Bisect a connected graph.
    ///
    /// Non-convergence of the eigensolver is returned as an error and not
    /// retried here.
    pub fn bisect(&self, graph: &Graph, initial_vectors: &mut RandomInitialVectors) -> Result<Bisection> {
        let mut criterion = self.convergence.create(graph);
        let mut operator = ShiftedNormalizedLaplacian::new(graph, self.traversal.clone())?;
        let initial = initial_vectors.generate(graph.order());

        let mut v2 = power_iteration(&mut operator, criterion.as_mut(), initial, self.max_iterations)?;
        criterion.postprocess(graph, &mut v2)?;

        let (positive, negative): (Vec<u32>, Vec<u32>) =
            (0..graph.order() as u32).partition(|&u| v2[u as usize] >= 0.0);

        Ok(Bisection {
            positive: graph.local_subgraph(positive)?,
            negative: graph.local_subgraph(negative)?,
        })
    }
}
