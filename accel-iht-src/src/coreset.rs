use crate::solver::{solve, Mode, Solution};
use crate::tangent::TangentSpace;
use crate::{Error, Reset, Result, SolverOptions};

/// Coreset construction by accelerated IHT.
///
/// The tangent space supplies the dictionary (one column per datapoint) and
/// the target (the sum over all datapoints). Every `build` starts a fresh
/// solve; the weights of the most recent one are kept.
pub struct Coreset {
    tangent: TangentSpace,
    mode: Mode,
    options: SolverOptions,
    solution: Option<Solution>,
}

impl Coreset {
    pub fn new(tangent: TangentSpace, mode: Mode, options: SolverOptions) -> Result<Coreset> {
        options.validate()?;
        Ok(Coreset {
            tangent,
            mode,
            options,
            solution: None,
        })
    }

    /// Select at most `size` datapoints. Sizes beyond the number of
    /// datapoints are capped.
    pub fn build(&mut self, size: usize) -> Result<&Solution> {
        if size == 0 {
            return Err(Error::Configuration(
                "coreset size must be at least 1".to_string(),
            ));
        }
        let k = size.min(self.tangent.num_vectors());
        let solution = solve(
            self.tangent.dictionary(),
            self.tangent.sum(),
            k,
            self.mode,
            &self.options,
        )?;
        Ok(&*self.solution.insert(solution))
    }

    /// Positive weights and the datapoints they belong to. Empty before the
    /// first build.
    pub fn weights(&self) -> (Vec<f64>, Vec<usize>) {
        match &self.solution {
            Some(s) => (s.support_weights(), s.support.clone()),
            None => (Vec::new(), Vec::new()),
        }
    }

    /// `||sum - sum_w||` of the current weights.
    pub fn error(&self) -> f64 {
        match &self.solution {
            Some(s) => s.objective,
            None => self.tangent.sum_norm(),
        }
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn tangent(&self) -> &TangentSpace {
        &self.tangent
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl Reset for Coreset {
    fn reset(&mut self) {
        self.solution = None;
    }
}
