//! Configuration for clustering and postprocessing

use std::fmt;
use std::sync::Arc;

use crate::cluster::affiliation::{AffiliationMetric, RelativeWeightMetric};
use crate::cluster::postprocessing::{
    AffiliationGuardingPostprocessor, ParentSimilarityPostprocessor, Postprocessor,
};
use crate::graph::NormalizedCutMetric;
use crate::graph::power_iteration::{CriterionFactory, SignTrailCriterion};

/// Settings of a recursive clustering run.
///
/// Built once via [`Default`] and the `with_*` setters, then handed to the
/// driver by reference.
#[derive(Clone)]
pub struct ClusteringSettings {
    /// Minimum affiliation score a vertex needs to stay in a cluster
    pub min_affiliation: f64,

    /// Clusters at or below this size are not split any further
    pub min_cluster_size: usize,

    /// Power iteration cap per bisection
    pub max_iterations: usize,

    /// Seed of the initial vector source
    pub random_seed: u64,

    /// Convergence criterion used by every bisection
    pub convergence: Arc<dyn CriterionFactory>,

    /// Metric used by the affiliation guard
    pub affiliation_metric: Arc<dyn AffiliationMetric>,

    /// Minimum number of children a grandparent must keep before
    /// descendants get pulled up to it
    pub min_children: usize,
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        Self {
            min_affiliation: 0.2,
            min_cluster_size: 50,
            max_iterations: 540,
            random_seed: 42133742,
            convergence: Arc::new(SignTrailCriterion::default()),
            affiliation_metric: Arc::new(RelativeWeightMetric),
            min_children: 0,
        }
    }
}

impl fmt::Debug for ClusteringSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusteringSettings")
            .field("min_affiliation", &self.min_affiliation)
            .field("min_cluster_size", &self.min_cluster_size)
            .field("max_iterations", &self.max_iterations)
            .field("random_seed", &self.random_seed)
            .field("convergence", &self.convergence)
            .field("affiliation_metric", &self.affiliation_metric)
            .field("min_children", &self.min_children)
            .finish()
    }
}

impl ClusteringSettings {
    pub fn with_min_affiliation(mut self, min_affiliation: f64) -> Self {
        self.min_affiliation = min_affiliation;
        self
    }

    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    /// Use the sign-trail criterion with the given trail size and stable fraction
    pub fn with_sign_trail(self, trail_size: usize, convergence_threshold: f64) -> Self {
        self.with_convergence(Arc::new(SignTrailCriterion {
            trail_size,
            convergence_threshold,
        }))
    }

    pub fn with_convergence(mut self, convergence: Arc<dyn CriterionFactory>) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn with_affiliation_metric(mut self, metric: Arc<dyn AffiliationMetric>) -> Self {
        self.affiliation_metric = metric;
        self
    }

    pub fn with_min_children(mut self, min_children: usize) -> Self {
        self.min_children = min_children;
        self
    }
}

/// Settings of the postprocessing pipeline
#[derive(Clone)]
pub struct PostprocessingSettings {
    pub min_cluster_size: usize,
    pub min_affiliation: f64,
    pub min_children: usize,
    pub affiliation_metric: Arc<dyn AffiliationMetric>,

    /// Appended to the default pipeline, run in order
    pub custom_postprocessors: Vec<Arc<dyn Postprocessor>>,
}

impl Default for PostprocessingSettings {
    fn default() -> Self {
        Self::from(&ClusteringSettings::default())
    }
}

impl From<&ClusteringSettings> for PostprocessingSettings {
    fn from(settings: &ClusteringSettings) -> Self {
        Self {
            min_cluster_size: settings.min_cluster_size,
            min_affiliation: settings.min_affiliation,
            min_children: settings.min_children,
            affiliation_metric: Arc::clone(&settings.affiliation_metric),
            custom_postprocessors: Vec::new(),
        }
    }
}

impl fmt::Debug for PostprocessingSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostprocessingSettings")
            .field("min_cluster_size", &self.min_cluster_size)
            .field("min_affiliation", &self.min_affiliation)
            .field("min_children", &self.min_children)
            .field("affiliation_metric", &self.affiliation_metric)
            .field("custom_postprocessors", &self.custom_postprocessors.len())
            .finish()
    }
}

impl PostprocessingSettings {
    pub fn with_postprocessor(mut self, postprocessor: Arc<dyn Postprocessor>) -> Self {
        self.custom_postprocessors.push(postprocessor);
        self
    }

    /// Relocate clusters by their normalized-cut similarity to their
    /// ancestors, then guard affiliations again
    pub fn with_parent_similarity(self, min_similarity: f64, max_similarity: f64, target_similarity: f64) -> Self {
        let relocation = ParentSimilarityPostprocessor::new(
            Arc::new(NormalizedCutMetric::default()),
            min_similarity,
            max_similarity,
            target_similarity,
        );
        let guarding = AffiliationGuardingPostprocessor::new(
            Arc::clone(&self.affiliation_metric),
            self.min_cluster_size,
            self.min_affiliation,
        );
        self.with_postprocessor(Arc::new(relocation))
            .with_postprocessor(Arc::new(guarding))
    }
}
