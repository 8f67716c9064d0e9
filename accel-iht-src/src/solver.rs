use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use log::{debug, info, warn};
use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::iht::AihtI;
use crate::iht_ii::AihtII;
use crate::report::{IterationReport, Reporter, ReporterSlot};
use crate::util::{clip_negative, gather, l2_norm, nonzero_indices, rayleigh_step, restricted_dot};
use crate::{Error, Result, SolverOptions, Threshold};

/// Stand-in for `||phi x_cur - phi x_prev||^2` when it vanishes, so the
/// momentum weight degrades to zero instead of dividing by zero.
pub const MOMENTUM_DENOM_FLOOR: f64 = 1e-6;

/// Which accelerated IHT variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// A-IHT I.
    #[serde(rename = "IHT")]
    Iht,
    /// A-IHT II, with a debiasing step on the selected support.
    #[serde(rename = "IHT-2")]
    IhtII,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Mode> {
        match s {
            "IHT" => Ok(Mode::Iht),
            "IHT-2" | "IHT-II" => Ok(Mode::IhtII),
            other => Err(Error::Configuration(format!(
                "IHT mode error: should be IHT or IHT-2 (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Iht => write!(f, "IHT"),
            Mode::IhtII => write!(f, "IHT-2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// The relative change of the iterate dropped below `tol`.
    Converged,
    /// `max_iter` iterations ran without meeting the stopping rule.
    MaxIterations,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Length N, zero outside `support`.
    pub weights: Array1<f64>,
    /// Indices of the strictly positive weights, ascending. Clipping can
    /// leave fewer than K of them.
    pub support: Vec<usize>,
    /// `||y - phi weights||_2`.
    pub objective: f64,
    pub iterations: usize,
    pub status: SolveStatus,
}

impl Solution {
    pub fn converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    /// The weights on `support`, aligned with it.
    pub fn support_weights(&self) -> Vec<f64> {
        self.support.iter().map(|&i| self.weights[i]).collect()
    }
}

/// Uniformly random column subsets for the simulated stochastic gradient.
struct Batch {
    size: usize,
    rng: StdRng,
}

/// The least-squares problem `min ||y - phi x||` seen by one solve, together
/// with its gradient oracle.
pub struct Problem<'a> {
    phi: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    batch: Option<Batch>,
}

impl<'a> Problem<'a> {
    pub fn new(
        phi: ArrayView2<'a, f64>,
        y: ArrayView1<'a, f64>,
        options: &SolverOptions,
    ) -> Result<Problem<'a>> {
        if phi.nrows() != y.len() {
            return Err(Error::DimensionMismatch {
                expected: phi.nrows(),
                actual: y.len(),
            });
        }
        let batch = options.stochastic_ratio.map(|ratio| Batch {
            size: (phi.ncols() as f64 * ratio).floor() as usize,
            rng: match options.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
        });
        Ok(Problem { phi, y, batch })
    }

    pub fn phi(&self) -> ArrayView2<'a, f64> {
        self.phi
    }

    pub fn y(&self) -> ArrayView1<'a, f64> {
        self.y
    }

    /// `phi' r`. In stochastic mode every entry outside a freshly drawn batch
    /// of columns is zero, as if those columns of phi were zeroed.
    pub fn gradient(&mut self, residual: ArrayView1<f64>) -> Array1<f64> {
        let mut grad = self.phi.t().dot(&residual);
        if let Some(batch) = self.batch.as_mut() {
            let n = grad.len();
            let mut in_batch = Array1::from_elem(n, false);
            for j in rand::seq::index::sample(&mut batch.rng, n, batch.size).iter() {
                in_batch[j] = true;
            }
            grad.zip_mut_with(&in_batch, |g, &keep| {
                if !keep {
                    *g = 0f64;
                }
            });
        }
        grad
    }

    /// `phi x` for an x that vanishes outside `support`.
    pub fn apply(&self, support: &[usize], x: ArrayView1<f64>) -> Array1<f64> {
        restricted_dot(self.phi, support, gather(x, support).view())
    }

    /// Exact line-search step along `grad` restricted to `support`.
    pub fn step_size(&self, support: &[usize], grad: ArrayView1<f64>) -> f64 {
        rayleigh_step(self.phi, support, gather(grad, support).view())
    }
}

/// `r' dphi / ||dphi||^2`, the extrapolation weight that best explains the
/// residual along the last change of `phi x`.
pub fn momentum_weight(residual: ArrayView1<f64>, phi_diff: ArrayView1<f64>) -> f64 {
    let denom = phi_diff.dot(&phi_diff);
    let denom = if denom > 0f64 { denom } else { MOMENTUM_DENOM_FLOOR };
    residual.dot(&phi_diff) / denom
}

/// Find a `k`-sparse non-negative x approximately minimizing `||y - phi x||`.
pub fn solve<'a>(
    phi: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    k: usize,
    mode: Mode,
    options: &SolverOptions,
) -> Result<Solution> {
    solve_with_reporter(phi, y, k, mode, options, None)
}

pub fn solve_with_reporter<'a>(
    phi: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    k: usize,
    mode: Mode,
    options: &SolverOptions,
    reporter: Option<&mut dyn Reporter>,
) -> Result<Solution> {
    options.validate()?;
    let n = phi.ncols();
    if k == 0 || k > n {
        return Err(Error::Configuration(format!(
            "sparsity level must lie in 1..={n} (got {k})"
        )));
    }
    let problem = Problem::new(phi, y, options)?;
    let start_time = options.verbose.then(Instant::now);
    let mut reporter = ReporterSlot::new(reporter, options.verbose);

    let solution = match mode {
        Mode::Iht => accelerated_iht(&AihtI, problem, k, options, reporter.as_mut()),
        Mode::IhtII => accelerated_iht(&AihtII, problem, k, options, reporter.as_mut()),
    };

    if let Some(reporter) = reporter.as_mut() {
        reporter.on_finish();
    }
    info!(
        "{mode} sparsity level {k}: objective {:.6e} after {} iterations",
        solution.objective, solution.iterations
    );
    if !solution.converged() {
        warn!(
            "{mode} reached max_iter = {} without meeting tol = {:e}",
            options.max_iter, options.tol
        );
    }
    if let Some(start) = start_time {
        info!("time: {:.3} s", start.elapsed().as_secs_f64());
    }
    Ok(solution)
}

/// The accelerated IHT outer loop shared by both variants.
fn accelerated_iht<T: Threshold>(
    strategy: &T,
    mut problem: Problem<'_>,
    k: usize,
    options: &SolverOptions,
    mut reporter: Option<&mut dyn Reporter>,
) -> Solution {
    let y = problem.y();
    let (m, n) = problem.phi().dim();

    let mut x_cur = Array1::<f64>::zeros(n);
    let mut y_cur = Array1::<f64>::zeros(n);
    let mut phi_x_cur = Array1::<f64>::zeros(m);
    let mut phi_diff = Array1::<f64>::zeros(m);
    let mut tau = 0f64;
    let mut active: Vec<usize> = Vec::new();
    let mut objective = l2_norm(y);
    let mut status = SolveStatus::MaxIterations;
    let mut iterations = options.max_iter;

    for iter in 1..=options.max_iter {
        // residual at the extrapolated point y_cur, since phi y_cur = phi x_cur + tau * phi_diff
        let residual = if iter == 1 {
            y.to_owned()
        } else {
            &y - &phi_x_cur - &(&phi_diff * tau)
        };
        let grad = problem.gradient(residual.view());

        let candidates = strategy.candidate_support(&active, grad.view(), k);
        let mu_bar = problem.step_size(&candidates, grad.view());

        let b = &y_cur + &(&grad * mu_bar);
        let (mut x_next, support) = strategy.project(b.view(), k);
        strategy.debias(&mut problem, x_next.view_mut(), &support);
        clip_negative(x_next.view_mut());

        let x_prev = std::mem::replace(&mut x_cur, x_next);
        let phi_x_prev = std::mem::replace(&mut phi_x_cur, problem.apply(&support, x_cur.view()));
        let residual = &y - &phi_x_cur;

        phi_diff = if iter == 1 {
            phi_x_cur.clone()
        } else {
            &phi_x_cur - &phi_x_prev
        };
        tau = momentum_weight(residual.view(), phi_diff.view());

        let dx = &x_cur - &x_prev;
        y_cur = &x_cur + &(&dx * tau);
        active = nonzero_indices(y_cur.view());

        objective = l2_norm(residual.view());
        let step_norm = l2_norm(dx.view());
        let x_norm = l2_norm(x_cur.view());
        debug!(
            "iteration {iter}: objective {objective:.6e}, mu {mu_bar:.3e}, tau {tau:.3}, step {step_norm:.3e}"
        );
        if let Some(reporter) = reporter.as_mut() {
            reporter.on_iteration(&IterationReport {
                iteration: iter,
                objective,
                mu_bar,
                tau,
                step_norm,
                support_size: x_cur.iter().filter(|&&xi| xi != 0f64).count(),
                candidate_support: candidates,
            });
        }

        if iter > 1 && step_norm < options.tol * x_norm {
            status = SolveStatus::Converged;
            iterations = iter;
            break;
        }
    }

    Solution {
        support: nonzero_indices(x_cur.view()),
        weights: x_cur,
        objective,
        iterations,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::History;
    use approx::assert_abs_diff_eq;

    fn identity_problem() -> (Array2<f64>, Array1<f64>) {
        (Array2::eye(4), arr1(&[3.0, -1.0, 2.0, 0.5]))
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("IHT".parse::<Mode>().unwrap(), Mode::Iht);
        assert_eq!("IHT-2".parse::<Mode>().unwrap(), Mode::IhtII);
        assert!(matches!("iht3".parse::<Mode>(), Err(Error::Configuration(_))));
        assert_eq!(Mode::IhtII.to_string().parse::<Mode>().unwrap(), Mode::IhtII);
    }

    #[test]
    fn test_momentum_weight_floor() {
        let r = arr1(&[1.0, 2.0]);
        assert_abs_diff_eq!(momentum_weight(r.view(), arr1(&[1.0, 0.0]).view()), 1.0);
        assert_eq!(momentum_weight(r.view(), Array1::<f64>::zeros(2).view()), 0.0);
    }

    #[test]
    fn test_identity_dictionary() {
        // with phi = I the best 2-sparse non-negative fit keeps the two largest entries
        let (phi, y) = identity_problem();
        for mode in [Mode::Iht, Mode::IhtII] {
            let s = solve(phi.view(), y.view(), 2, mode, &SolverOptions::default()).unwrap();
            assert_eq!(s.support, vec![0, 2]);
            assert_abs_diff_eq!(s.weights[0], 3.0, epsilon = 1e-6);
            assert_abs_diff_eq!(s.weights[2], 2.0, epsilon = 1e-6);
            assert_abs_diff_eq!(s.objective, 1.25f64.sqrt(), epsilon = 1e-6);
            assert!(s.converged());
        }
    }

    #[test]
    fn test_views_from_separate_owners() {
        let phi = Array2::<f64>::eye(3);
        let s = {
            let y = arr1(&[1.0, 0.0, 2.0]);
            solve(phi.view(), y.view(), 1, Mode::Iht, &SolverOptions::default()).unwrap()
        };
        assert_eq!(s.support, vec![2]);
        assert_abs_diff_eq!(s.weights[2], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_bad_input() {
        let (phi, y) = identity_problem();
        let options = SolverOptions::default();
        assert!(matches!(
            solve(phi.view(), y.view(), 0, Mode::Iht, &options),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            solve(phi.view(), y.view(), 5, Mode::Iht, &options),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            solve(phi.view(), y.slice(s![..3]), 2, Mode::Iht, &options),
            Err(Error::DimensionMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_max_iter_is_reported() {
        let (phi, y) = identity_problem();
        let options = SolverOptions::default().with_max_iter(1);
        let s = solve(phi.view(), y.view(), 2, Mode::Iht, &options).unwrap();
        assert_eq!(s.status, SolveStatus::MaxIterations);
        assert_eq!(s.iterations, 1);
    }

    #[test]
    fn test_reporter_sees_every_iteration() {
        let (phi, y) = identity_problem();
        let mut history = History::new();
        let s = solve_with_reporter(
            phi.view(),
            y.view(),
            2,
            Mode::Iht,
            &SolverOptions::default(),
            Some(&mut history),
        )
        .unwrap();
        assert_eq!(history.reports.len(), s.iterations);
        assert_eq!(history.reports[0].candidate_support, vec![0, 2]);
        assert_abs_diff_eq!(history.objectives()[s.iterations - 1], s.objective);
    }

    #[test]
    fn test_stochastic_gradient_masks_columns() {
        let (phi, y) = identity_problem();
        let options = SolverOptions::default().with_stochastic_ratio(0.5).with_seed(3);
        let mut problem = Problem::new(phi.view(), y.view(), &options).unwrap();
        let grad = problem.gradient(y.view());
        let kept = grad.iter().filter(|&&g| g != 0f64).count();
        assert_eq!(kept, 2);
        for (g, yi) in grad.iter().zip(y.iter()) {
            assert!(*g == 0f64 || g == yi);
        }
    }
}
