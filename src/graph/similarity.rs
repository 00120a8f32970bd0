//! Similarity between a graph and one of its subgraphs

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::graph::{Graph, Traversal, TraversalMode};

/// Scores how closely a subgraph resembles the graph containing it
pub trait GraphSimilarityMetric: Debug + Send + Sync {
    /// Fails when `subgraph` has a vertex outside of `supergraph`
    fn compute(&self, supergraph: &Graph, subgraph: &Graph) -> Result<f64>;
}

/// Half the normalized cut between a subgraph and its complement.
///
/// Both volumes include the cut weight, so the score lies in [0, 1]. An
/// empty graph on either side scores 0.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCutMetric {
    traversal: Traversal,
}

#[derive(Debug, Default, Clone, Copy)]
struct CutWeights {
    subgraph: f64,
    complement: f64,
    cut: f64,
}

impl NormalizedCutMetric {
    pub fn new(traversal: Traversal) -> Self {
        Self { traversal }
    }

    /// Supergraph-local membership flags of the subgraph's vertices
    fn membership(&self, supergraph: &Graph, subgraph: &Graph) -> Result<Vec<bool>> {
        let member: Vec<AtomicBool> = (0..supergraph.order()).map(|_| AtomicBool::new(false)).collect();
        let unknown = AtomicU64::new(u64::MAX);
        self.traversal.traverse_vertices(subgraph, |u| {
            let global = subgraph.global_id(u);
            match supergraph.local_id(global) {
                Some(local) => member[local as usize].store(true, Ordering::Relaxed),
                None => unknown.store(global as u64, Ordering::Relaxed),
            }
        });
        if let Ok(global) = u32::try_from(unknown.into_inner()) {
            return Err(Error::UnknownVertex(global));
        }
        Ok(member.into_iter().map(AtomicBool::into_inner).collect())
    }

    fn cut_weights(&self, supergraph: &Graph, member: &[bool]) -> CutWeights {
        let slices = self.traversal.fold_edges(
            supergraph,
            TraversalMode::LowerTriangular,
            CutWeights::default,
            |acc, u, v, w| match (member[u as usize], member[v as usize]) {
                (true, true) => acc.subgraph += w,
                (false, false) => acc.complement += w,
                _ => {
                    acc.subgraph += w;
                    acc.complement += w;
                    acc.cut += w;
                }
            },
        );
        slices.into_iter().fold(CutWeights::default(), |total, part| CutWeights {
            subgraph: total.subgraph + part.subgraph,
            complement: total.complement + part.complement,
            cut: total.cut + part.cut,
        })
    }
}

impl GraphSimilarityMetric for NormalizedCutMetric {
    fn compute(&self, supergraph: &Graph, subgraph: &Graph) -> Result<f64> {
        if supergraph.is_empty() || subgraph.is_empty() {
            return Ok(0.0);
        }
        let member = self.membership(supergraph, subgraph)?;
        let weights = self.cut_weights(supergraph, &member);

        let ncut = [weights.subgraph, weights.complement]
            .iter()
            .filter(|&&volume| volume > 0.0)
            .map(|volume| weights.cut / volume)
            .sum::<f64>();
        Ok(ncut / 2.0)
    }
}
