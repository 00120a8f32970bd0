//! Graph storage, traversal and spectral algorithms

pub mod algorithms;
pub mod bisection;
pub mod builder;
pub mod compressed;
pub mod operators;
pub mod power_iteration;
pub mod similarity;
pub mod traversal;
pub mod vectors;

pub use bisection::{Bisection, SpectralBisector};
pub use builder::{GraphBuilder, LabeledGraphBuilder};
pub use compressed::Graph;
pub use similarity::{GraphSimilarityMetric, NormalizedCutMetric};
pub use traversal::{Traversal, TraversalMode};
