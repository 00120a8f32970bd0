//! Parallel vertex and edge traversal over a rayon thread pool
//!
//! Vertices are partitioned into slices by `local_id % slices`. Each slice is
//! scanned by one task; per-slice results come back over a channel and are
//! reassembled in slice order, so the numeric output does not depend on task
//! scheduling. Small graphs are scanned on the calling thread.

use std::sync::Arc;

use crossbeam::channel;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Error, Result};
use crate::graph::Graph;

/// Graphs with fewer vertices than this are traversed sequentially
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1000;

/// Which arcs an edge traversal visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    /// Every arc, so each undirected edge is seen from both endpoints
    Default,
    /// Only arcs `(u, v)` with `u >= v`
    LowerTriangular,
}

/// Fork-join traversal service shared by the numeric kernels
#[derive(Clone)]
pub struct Traversal {
    /// Pool to run on; `None` uses rayon's global pool
    pool: Option<Arc<ThreadPool>>,

    /// Number of vertex slices
    slices: usize,

    /// Minimum order for a parallel traversal
    threshold: usize,
}

impl std::fmt::Debug for Traversal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traversal")
            .field("dedicated_pool", &self.pool.is_some())
            .field("slices", &self.slices)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl Default for Traversal {
    /// Traversal on rayon's global pool, one slice per worker
    fn default() -> Self {
        Self {
            pool: None,
            slices: rayon::current_num_threads().max(1),
            threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl Traversal {
    /// Traversal that always runs on the calling thread
    pub fn sequential() -> Self {
        Self {
            pool: None,
            slices: 1,
            threshold: usize::MAX,
        }
    }

    /// Traversal on an injected pool, one slice per pool worker
    pub fn with_pool(pool: Arc<ThreadPool>) -> Self {
        let slices = pool.current_num_threads().max(1);
        Self {
            pool: Some(pool),
            slices,
            threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Traversal on a dedicated pool of `threads` workers
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("traversal-{}", i))
            .build()
            .map_err(|e| Error::Traversal(e.to_string()))?;
        Ok(Self::with_pool(Arc::new(pool)))
    }

    /// Override the sequential/parallel cut-over order
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Number of vertex slices
    pub fn slices(&self) -> usize {
        self.slices
    }

    /// Whether a graph of the given order is traversed in parallel
    pub fn is_parallel_for(&self, order: usize) -> bool {
        self.slices > 1 && order >= self.threshold
    }

    /// Invoke `visitor(u, v, weight)` for every arc selected by `mode`
    pub fn traverse_edges<F>(&self, graph: &Graph, mode: TraversalMode, visitor: F)
    where
        F: Fn(u32, u32, f64) + Sync,
    {
        self.for_each_slice(graph.order(), |slice, step| {
            for u in slice_vertices(graph.order(), slice, step) {
                for (v, w) in arcs(graph, u, mode) {
                    visitor(u, v, w);
                }
            }
        });
    }

    /// Invoke `visitor(u)` for every vertex
    pub fn traverse_vertices<F>(&self, graph: &Graph, visitor: F)
    where
        F: Fn(u32) + Sync,
    {
        self.for_each_slice(graph.order(), |slice, step| {
            for u in slice_vertices(graph.order(), slice, step) {
                visitor(u);
            }
        });
    }

    /// Fold the arcs selected by `mode` into one accumulator per slice.
    ///
    /// Accumulators are returned in slice order; reducing them is left to the caller.
    pub fn fold_edges<T, I, F>(&self, graph: &Graph, mode: TraversalMode, init: I, fold: F) -> Vec<T>
    where
        T: Send,
        I: Fn() -> T + Sync,
        F: Fn(&mut T, u32, u32, f64) + Sync,
    {
        self.for_each_slice(graph.order(), |slice, step| {
            let mut acc = init();
            for u in slice_vertices(graph.order(), slice, step) {
                for (v, w) in arcs(graph, u, mode) {
                    fold(&mut acc, u, v, w);
                }
            }
            acc
        })
    }

    /// Per-vertex sums: `result[u] = Σ f(u, v, w)` over the arcs of `u` selected by `mode`
    pub fn accumulate_rows<F>(&self, graph: &Graph, mode: TraversalMode, f: F) -> Vec<f64>
    where
        F: Fn(u32, u32, f64) -> f64 + Sync,
    {
        self.map_vertices(graph, |u| arcs(graph, u, mode).map(|(v, w)| f(u, v, w)).sum())
    }

    /// Evaluate `f(u)` for every vertex, in local id order
    pub fn map_vertices<F>(&self, graph: &Graph, f: F) -> Vec<f64>
    where
        F: Fn(u32) -> f64 + Sync,
    {
        let order = graph.order();
        let parts = self.for_each_slice(order, |slice, step| {
            slice_vertices(order, slice, step)
                .map(&f)
                .collect::<Vec<f64>>()
        });

        // Scatter slice results back to their vertices
        let mut result = vec![0.0; order];
        let step = parts.len();
        for (slice, values) in parts.into_iter().enumerate() {
            for (k, value) in values.into_iter().enumerate() {
                result[slice + k * step] = value;
            }
        }
        result
    }

    /// Run `work(slice, step)` for each slice and return the results in slice order.
    ///
    /// A panic in any slice is re-raised here once all slices have finished.
    fn for_each_slice<T, F>(&self, order: usize, work: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize, usize) -> T + Sync,
    {
        if !self.is_parallel_for(order) {
            return vec![work(0, 1)];
        }

        let slices = self.slices;
        let (tx, rx) = channel::unbounded();
        let work = &work;
        match &self.pool {
            Some(pool) => pool.scope(|scope| spawn_slices(scope, slices, &tx, work)),
            None => rayon::scope(|scope| spawn_slices(scope, slices, &tx, work)),
        }
        drop(tx);

        let mut parts: Vec<(usize, T)> = rx.into_iter().collect();
        parts.sort_unstable_by_key(|(slice, _)| *slice);
        parts.into_iter().map(|(_, part)| part).collect()
    }
}

fn spawn_slices<'s, T, F>(
    scope: &rayon::Scope<'s>,
    slices: usize,
    tx: &channel::Sender<(usize, T)>,
    work: &'s F,
) where
    T: Send + 's,
    F: Fn(usize, usize) -> T + Sync,
{
    for slice in 0..slices {
        let tx = tx.clone();
        scope.spawn(move |_| {
            // The receiver outlives the scope, so the send cannot fail
            let _ = tx.send((slice, work(slice, slices)));
        });
    }
}

fn slice_vertices(order: usize, slice: usize, step: usize) -> impl Iterator<Item = u32> {
    (slice..order).step_by(step).map(|u| u as u32)
}

fn arcs(graph: &Graph, u: u32, mode: TraversalMode) -> impl Iterator<Item = (u32, f64)> + '_ {
    let neighbors = graph.neighbors(u);
    let end = match mode {
        TraversalMode::Default => neighbors.len(),
        TraversalMode::LowerTriangular => neighbors.partition_point(|&v| v <= u),
    };
    neighbors[..end]
        .iter()
        .copied()
        .zip(graph.neighbor_weights(u)[..end].iter().copied())
}
