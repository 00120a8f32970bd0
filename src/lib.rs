//! Hierarchical graph clustering by recursive spectral bisection

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod storage;

pub use cluster::detection::{run_clustering, run_clustering_with, RecursiveClustering};
pub use cluster::{ClusterId, ClusterTree};
pub use config::{ClusteringSettings, PostprocessingSettings};
pub use error::{Error, Result};
pub use graph::{Graph, GraphBuilder, Traversal};
