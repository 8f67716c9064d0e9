//! Solver configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Options shared by A-IHT I and A-IHT II.
///
/// # Example
///
/// ```
/// use accel_iht_src::SolverOptions;
///
/// let options = SolverOptions::default()
///     .with_max_iter(500)
///     .with_stochastic_ratio(0.5)
///     .with_seed(233);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Stop once `||x_cur - x_prev|| < tol * ||x_cur||`.
    pub tol: f64,

    /// Upper bound on the number of iterations.
    pub max_iter: usize,

    /// Fraction of columns, in (0, 1), that contribute to each gradient
    /// evaluation. `None` uses the full dictionary.
    pub stochastic_ratio: Option<f64>,

    /// Seed for the stochastic batches. Drawn from the OS when unset.
    pub seed: Option<u64>,

    /// Render a per-iteration table when no reporter is supplied.
    pub verbose: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tol: 1e-5,
            max_iter: 300,
            stochastic_ratio: None,
            seed: None,
            verbose: false,
        }
    }
}

impl SolverOptions {
    #[must_use]
    pub const fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    #[must_use]
    pub const fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    #[must_use]
    pub const fn with_stochastic_ratio(mut self, ratio: f64) -> Self {
        self.stochastic_ratio = Some(ratio);
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tol.is_finite() || self.tol < 0f64 {
            return Err(Error::Configuration(format!(
                "tol must be finite and non-negative (got {})",
                self.tol
            )));
        }
        if self.max_iter == 0 {
            return Err(Error::Configuration(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if let Some(ratio) = self.stochastic_ratio {
            if !(ratio > 0f64 && ratio < 1f64) {
                return Err(Error::Configuration(format!(
                    "stochastic_ratio must lie in (0, 1) (got {ratio})"
                )));
            }
        }
        Ok(())
    }
}
