//! Recursive spectral clustering driver

use std::collections::VecDeque;
use std::time::Instant;

use crate::cluster::affiliation::AffiliationGuard;
use crate::cluster::postprocessing::Postprocessing;
use crate::cluster::{ClusterId, ClusterTree};
use crate::config::{ClusteringSettings, PostprocessingSettings};
use crate::error::Result;
use crate::graph::algorithms::connected_components;
use crate::graph::power_iteration::RandomInitialVectors;
use crate::graph::{Graph, SpectralBisector, Traversal};

/// How a pending candidate graph came about, which decides the next step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoclusterKind {
    /// The input graph
    Root,
    /// A connected component, ready to be bisected
    Component,
    /// A guarded side of a bisection; may have fallen apart into components
    Spectral,
}

/// A cluster together with the candidate graph still to be split
#[derive(Debug)]
pub struct Protocluster {
    pub graph: Graph,
    pub kind: ProtoclusterKind,
    pub cluster: ClusterId,
}

/// Breadth-first recursive bisection of a graph into a [`ClusterTree`].
///
/// Candidates are processed from a FIFO queue, so clusters are opened top
/// down and the random vectors are drawn in a fixed order. Running twice with
/// the same settings yields the same tree.
pub struct RecursiveClustering<'g> {
    graph: &'g Graph,
    settings: ClusteringSettings,
    bisector: SpectralBisector,
    guard: AffiliationGuard,
    initial_vectors: RandomInitialVectors,
    queue: VecDeque<Protocluster>,
    tree: ClusterTree<'g>,
}

impl<'g> RecursiveClustering<'g> {
    pub fn new(graph: &'g Graph, settings: &ClusteringSettings, traversal: Traversal) -> Self {
        Self {
            graph,
            bisector: SpectralBisector::new(settings.convergence.clone(), settings.max_iterations, traversal),
            guard: AffiliationGuard::new(
                settings.affiliation_metric.clone(),
                settings.min_cluster_size,
                settings.min_affiliation,
            ),
            initial_vectors: RandomInitialVectors::new(settings.random_seed),
            queue: VecDeque::new(),
            tree: ClusterTree::new(graph),
            settings: settings.clone(),
        }
    }

    /// Cluster the whole graph. The returned tree has not been postprocessed.
    pub fn run(mut self) -> Result<ClusterTree<'g>> {
        log::info!(
            "Starting recursive clustering of {} vertices using {:?}",
            self.graph.order(),
            self.settings
        );
        let started = Instant::now();

        self.queue.push_back(Protocluster {
            graph: self.graph.clone(),
            kind: ProtoclusterKind::Root,
            cluster: self.tree.root(),
        });

        while let Some(protocluster) = self.queue.pop_front() {
            match protocluster.kind {
                ProtoclusterKind::Component => self.bisect(protocluster)?,
                ProtoclusterKind::Root | ProtoclusterKind::Spectral => self.decompose_components(protocluster)?,
            }
        }

        log::info!(
            "Finished clustering {} vertices into {} clusters after {:?}",
            self.graph.order(),
            self.tree.len(),
            started.elapsed()
        );
        Ok(self.tree)
    }

    fn decompose_components(&mut self, mut protocluster: Protocluster) -> Result<()> {
        let min_size = self.settings.min_cluster_size;
        let components = connected_components(&protocluster.graph);
        log::trace!("Candidate of size {} has {} components", protocluster.graph.order(), components.len());

        for component in components {
            if component.len() == protocluster.graph.order() {
                // Already connected, hand it over to bisection
                protocluster.kind = ProtoclusterKind::Component;
                self.queue.push_back(protocluster);
                return Ok(());
            }

            if component.len() < min_size {
                self.tree.add_to_remainder(protocluster.cluster, component);
            } else if component.len() == min_size {
                self.add_terminal_child(protocluster.cluster, component);
            } else {
                let subgraph = protocluster.graph.subgraph(component)?;
                self.enqueue(ProtoclusterKind::Component, protocluster.cluster, subgraph);
            }
        }
        Ok(())
    }

    fn bisect(&mut self, protocluster: Protocluster) -> Result<()> {
        let cluster = protocluster.cluster;
        if protocluster.graph.order() < 2 {
            self.tree.add_graph_to_remainder(cluster, &protocluster.graph);
            return Ok(());
        }

        let bisection = match self.bisector.bisect(&protocluster.graph, &mut self.initial_vectors) {
            Ok(bisection) => bisection,
            Err(e) if e.is_non_convergence() => {
                log::debug!("{}. Not clustering any further.", e);
                self.tree.add_graph_to_remainder(cluster, &protocluster.graph);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if bisection.is_degenerate() {
            log::debug!(
                "Bisection of {} vertices found no cut. Not clustering any further.",
                protocluster.graph.order()
            );
            self.tree.add_graph_to_remainder(cluster, &protocluster.graph);
            return Ok(());
        }

        let order = protocluster.graph.order();
        for partition in [bisection.positive, bisection.negative] {
            self.process_partition(cluster, order, partition)?;
        }
        Ok(())
    }

    fn process_partition(&mut self, cluster: ClusterId, parent_order: usize, partition: Graph) -> Result<()> {
        let min_size = self.settings.min_cluster_size;
        if partition.order() < min_size || partition.order() == parent_order {
            self.tree.add_graph_to_remainder(cluster, &partition);
            return Ok(());
        }

        if let Some(guarded) = self.guard.ensure(&mut self.tree, cluster, partition)? {
            if guarded.order() > min_size {
                self.enqueue(ProtoclusterKind::Spectral, cluster, guarded);
            } else {
                self.add_terminal_child(cluster, guarded.global_ids().to_vec());
            }
        }
        Ok(())
    }

    fn add_terminal_child(&mut self, parent: ClusterId, vertices: Vec<u32>) {
        let child = self.tree.add_child(parent);
        self.tree.add_to_remainder(child, vertices);
    }

    fn enqueue(&mut self, kind: ProtoclusterKind, parent: ClusterId, graph: Graph) {
        let cluster = self.tree.add_child(parent);
        self.queue.push_back(Protocluster { graph, kind, cluster });
    }
}

/// Cluster `graph` on rayon's global pool and apply the default postprocessing pipeline
pub fn run_clustering<'g>(graph: &'g Graph, settings: &ClusteringSettings) -> Result<ClusterTree<'g>> {
    run_clustering_with(graph, settings, Traversal::default())
}

/// [`run_clustering`] with an injected traversal service
pub fn run_clustering_with<'g>(
    graph: &'g Graph,
    settings: &ClusteringSettings,
    traversal: Traversal,
) -> Result<ClusterTree<'g>> {
    let mut tree = RecursiveClustering::new(graph, settings, traversal).run()?;
    Postprocessing::new(&PostprocessingSettings::from(settings)).apply(&mut tree)?;
    Ok(tree)
}
