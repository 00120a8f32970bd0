//! Power iteration eigensolver and its convergence criteria

use std::fmt::Debug;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};
use crate::graph::operators::LinearOperator;
use crate::graph::{vectors, Graph};

/// Decides when successive power iteration results are close enough.
///
/// A criterion may keep state across rounds and may rewrite the final vector
/// in [`ConvergenceCriterion::postprocess`] once the iteration stopped.
pub trait ConvergenceCriterion {
    /// Whether `current` is accepted; `iteration` counts from 0
    fn is_converged(&mut self, previous: &[f64], current: &[f64], iteration: usize) -> bool;

    /// Finalise a converged vector computed over `graph`
    fn postprocess(&mut self, _graph: &Graph, _vector: &mut [f64]) -> Result<()> {
        Ok(())
    }
}

/// Creates a fresh criterion for each graph that gets bisected
pub trait CriterionFactory: Debug + Send + Sync {
    fn create(&self, graph: &Graph) -> Box<dyn ConvergenceCriterion>;
}

/// Run power iteration from `initial` until `criterion` accepts an iterate.
///
/// Every iterate is unit length with a non-negative first coordinate. Fails
/// with [`Error::MaxIterationsExceeded`] once `max_iterations` rounds were
/// spent without convergence.
pub fn power_iteration<O>(
    operator: &mut O,
    criterion: &mut dyn ConvergenceCriterion,
    initial: Vec<f64>,
    max_iterations: usize,
) -> Result<Vec<f64>>
where
    O: LinearOperator + ?Sized,
{
    let started = Instant::now();
    let mut x = initial;
    vectors::normalize_signed(&mut x)?;

    for iteration in 0..max_iterations {
        let mut y = operator.apply(&x)?;
        vectors::normalize_signed(&mut y)?;
        if criterion.is_converged(&x, &y, iteration) {
            log::trace!(
                "Power iteration for size {} finished after {} rounds in {:?}",
                operator.size(),
                iteration + 1,
                started.elapsed()
            );
            return Ok(y);
        }
        x = y;
    }

    Err(Error::MaxIterationsExceeded { max_iterations })
}

/// Converged once the distance between successive iterates drops below `precision`
#[derive(Debug, Clone)]
pub struct DeltaNormConvergence {
    precision: f64,
}

impl DeltaNormConvergence {
    pub fn new(precision: f64) -> Self {
        Self { precision }
    }
}

impl ConvergenceCriterion for DeltaNormConvergence {
    fn is_converged(&mut self, previous: &[f64], current: &[f64], _iteration: usize) -> bool {
        vectors::distance(previous, current) < self.precision
    }
}

/// Converged once at most a fraction `max_unstable` of the coordinates
/// changed sign between two rounds, after at least `min_iterations` rounds
#[derive(Debug, Clone)]
pub struct SignumConvergence {
    max_unstable: f64,
    min_iterations: usize,
}

impl SignumConvergence {
    pub const DEFAULT_MIN_ITERATIONS: usize = 20;

    pub fn new(max_unstable: f64, min_iterations: usize) -> Self {
        Self {
            max_unstable,
            min_iterations,
        }
    }
}

impl ConvergenceCriterion for SignumConvergence {
    fn is_converged(&mut self, previous: &[f64], current: &[f64], iteration: usize) -> bool {
        if iteration < self.min_iterations {
            return false;
        }
        if current.is_empty() {
            return true;
        }
        let unstable = previous
            .iter()
            .zip(current)
            .filter(|(p, c)| signum(**p) != signum(**c))
            .count();
        unstable as f64 / current.len() as f64 <= self.max_unstable
    }
}

/// Sign-trail convergence.
///
/// Tracks, per coordinate, how many consecutive rounds its sign stayed the
/// same. The iteration is accepted once at least `threshold * order`
/// coordinates kept their sign for a whole trail of `trail_size` rounds. The
/// remaining unstable coordinates are then assigned a side in
/// [`ConvergenceCriterion::postprocess`] by how strongly their vertex is
/// attached to each side.
#[derive(Debug, Clone)]
pub struct SignTrailConvergence {
    trail_size: usize,
    threshold: usize,
    previous_signs: Vec<i8>,
    trail: Vec<usize>,
}

/// Sign recorded before the first round, distinct from every real signum
const NO_SIGN: i8 = -2;

impl SignTrailConvergence {
    pub fn new(order: usize, trail_size: usize, convergence_threshold: f64) -> Self {
        Self {
            trail_size,
            threshold: (convergence_threshold * order as f64) as usize,
            previous_signs: vec![NO_SIGN; order],
            trail: vec![0; order],
        }
    }

    /// Number of coordinates required to be stable
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    fn is_stable(&self, i: usize) -> bool {
        self.trail[i] + 1 >= self.trail_size
    }

    /// Subgraph of the unstable vertices plus the stable ones on one side
    fn side(&self, graph: &Graph, vector: &[f64], negative: bool) -> Result<Graph> {
        graph.local_subgraph((0..vector.len() as u32).filter(|&j| {
            let j = j as usize;
            !self.is_stable(j) || (vector[j] < 0.0) == negative
        }))
    }
}

fn relative_weight(side: &Graph, global: u32) -> f64 {
    let total = side.total_weight();
    if total <= 0.0 {
        return 0.0;
    }
    side.weight_for_global_id(global) / total
}

impl ConvergenceCriterion for SignTrailConvergence {
    fn is_converged(&mut self, _previous: &[f64], current: &[f64], _iteration: usize) -> bool {
        let mut converged = 0;
        for (i, &value) in current.iter().enumerate() {
            let sign = signum(value);
            if sign == self.previous_signs[i] {
                self.trail[i] += 1;
                if self.is_stable(i) {
                    converged += 1;
                }
            } else {
                self.trail[i] = 0;
            }
            self.previous_signs[i] = sign;
        }
        converged >= self.threshold
    }

    fn postprocess(&mut self, graph: &Graph, vector: &mut [f64]) -> Result<()> {
        if vector.len() != graph.order() || vector.len() != self.trail.len() {
            return Err(Error::DimensionMismatch {
                expected: self.trail.len(),
                found: vector.len(),
            });
        }

        let unstable: Vec<usize> = (0..vector.len()).filter(|&i| !self.is_stable(i)).collect();
        if unstable.is_empty() {
            return Ok(());
        }

        let negative = self.side(graph, vector, true)?;
        let positive = self.side(graph, vector, false)?;
        match (negative.is_empty(), positive.is_empty()) {
            (true, true) => {
                return Err(Error::PartialConvergence("both postprocessing sides are empty".into()))
            }
            (false, true) => unstable.iter().for_each(|&i| vector[i] = -1.0),
            (true, false) => unstable.iter().for_each(|&i| vector[i] = 1.0),
            (false, false) => {
                for &i in &unstable {
                    let global = graph.global_id(i as u32);
                    // Ties go to the negative side
                    vector[i] = if relative_weight(&negative, global) >= relative_weight(&positive, global) {
                        -1.0
                    } else {
                        1.0
                    };
                }
            }
        }
        Ok(())
    }
}

fn signum(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Sign-trail criterion with the given trail length and stable fraction
#[derive(Debug, Clone)]
pub struct SignTrailCriterion {
    pub trail_size: usize,
    pub convergence_threshold: f64,
}

impl Default for SignTrailCriterion {
    fn default() -> Self {
        Self {
            trail_size: 20,
            convergence_threshold: 0.95,
        }
    }
}

impl CriterionFactory for SignTrailCriterion {
    fn create(&self, graph: &Graph) -> Box<dyn ConvergenceCriterion> {
        Box::new(SignTrailConvergence::new(
            graph.order(),
            self.trail_size,
            self.convergence_threshold,
        ))
    }
}

/// Delta-norm criterion with a fixed precision
#[derive(Debug, Clone)]
pub struct DeltaNormCriterion {
    pub precision: f64,
}

impl CriterionFactory for DeltaNormCriterion {
    fn create(&self, _graph: &Graph) -> Box<dyn ConvergenceCriterion> {
        Box::new(DeltaNormConvergence::new(self.precision))
    }
}

/// Signum criterion with a maximum unstable fraction
#[derive(Debug, Clone)]
pub struct SignumCriterion {
    pub max_unstable: f64,
    pub min_iterations: usize,
}

impl CriterionFactory for SignumCriterion {
    fn create(&self, _graph: &Graph) -> Box<dyn ConvergenceCriterion> {
        Box::new(SignumConvergence::new(self.max_unstable, self.min_iterations))
    }
}

/// Seeded source of random start vectors.
///
/// One source is shared by a whole clustering run, so the vectors drawn
/// depend only on the seed and the sequence of requested sizes.
#[derive(Debug, Clone)]
pub struct RandomInitialVectors {
    rng: ChaCha8Rng,
}

impl RandomInitialVectors {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Vector of `size` coordinates drawn uniformly from [-1, 1)
    pub fn generate(&mut self, size: usize) -> Vec<f64> {
        (0..size).map(|_| self.rng.gen_range(-1.0..1.0)).collect()
    }
}
