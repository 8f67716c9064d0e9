//! Accelerated iterative hard thresholding for Bayesian coreset construction.
//!
//! Given a dictionary `phi` (M x N) whose columns are per-datapoint
//! contribution vectors and a target `y` (their sum), the solvers look for a
//! K-sparse, non-negative `x` minimizing `||y - phi x||_2`:
//!
//! - A-IHT I: momentum-accelerated projected gradient descent with an exact
//!   line search restricted to an active subspace.
//! - A-IHT II: the same loop with a debiasing gradient step on the selected
//!   support before negative entries are clipped.
//!
//! ```
//! use accel_iht_src::prelude::*;
//! use ndarray::prelude::*;
//!
//! let phi = arr2(&[[1.0, 0.0, 0.5], [0.0, 1.0, 0.5]]);
//! let y = arr1(&[2.0, 1.0]);
//! let solution = solve(phi.view(), y.view(), 2, Mode::IhtII, &SolverOptions::default()).unwrap();
//! assert!(solution.support.len() <= 2);
//! assert!(solution.weights.iter().all(|&w| w >= 0.0));
//! ```

pub mod config;
pub mod coreset;
pub mod iht;
pub mod iht_ii;
pub mod prelude;
pub mod report;
pub mod solver;
pub mod tangent;
pub mod util;

use ndarray::prelude::*;
use thiserror::Error;

use crate::solver::Problem;

pub use crate::config::SolverOptions;

pub type Result<T> = std::result::Result<T, Error>;

/// The pieces of an accelerated IHT iteration that differ between variants.
///
/// The outer loop (residual, momentum, stopping rule) lives in
/// [`solver::solve`]; a variant only decides how candidates are picked, how
/// the gradient step is projected and whether the projected point is
/// corrected before negative entries are clipped.
pub trait Threshold {
    /// S_i: the previous active set followed by the `k` columns with the
    /// largest gradient magnitude outside of it.
    fn candidate_support(&self, active: &[usize], grad: ArrayView1<f64>, k: usize) -> Vec<usize> {
        util::candidate_support(active, grad, k)
    }

    /// X_i: keep the `k` largest entries of the gradient step `b`.
    fn project(&self, b: ArrayView1<f64>, k: usize) -> (Array1<f64>, Vec<usize>) {
        util::project_top_k(b, k)
    }

    /// Correction of the projected iterate on its support. No-op by default.
    fn debias(&self, _problem: &mut Problem<'_>, _x: ArrayViewMut1<f64>, _support: &[usize]) {}
}

pub trait Reset {
    fn reset(&mut self);
}

#[derive(Debug, Error)]
pub enum Error {
    /// The tangent space could not be built from its input.
    #[error("construction error: {0}")]
    Construction(String),

    /// Invalid solver mode, sparsity budget or option.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("value error: {0}")]
    Value(String),
}
