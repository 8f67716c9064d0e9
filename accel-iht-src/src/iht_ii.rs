use crate::solver::Problem;
use crate::util::gather;
use crate::Threshold;
use ndarray::prelude::*;

/// A-IHT II: A-IHT I plus a debiasing step.
///
/// After the projection onto X_i, one more exact line-search gradient step is
/// taken on the least-squares problem restricted to X_i, so the weights of the
/// selected columns are refit before negative entries are clipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct AihtII;

impl Threshold for AihtII {
    fn debias(&self, problem: &mut Problem<'_>, mut x: ArrayViewMut1<f64>, support: &[usize]) {
        let residual = &problem.y() - &problem.apply(support, x.view());
        let grad = problem.gradient(residual.view());
        let mu = problem.step_size(support, grad.view());
        let g = gather(grad.view(), support);
        for (&i, &gi) in support.iter().zip(g.iter()) {
            x[i] += mu * gi;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SolverOptions;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_debias_refits_support() {
        // phi = I: one exact line search along the restricted gradient
        // moves x half way to y on the support
        let phi = Array2::<f64>::eye(3);
        let y = arr1(&[4.0, 2.0, 1.0]);
        let mut problem = Problem::new(phi.view(), y.view(), &SolverOptions::default()).unwrap();
        let mut x = arr1(&[2.0, 0.0, 0.0]);
        AihtII.debias(&mut problem, x.view_mut(), &[0]);
        assert_abs_diff_eq!(x[0], 3.0);
        assert_eq!(x[1], 0.0);
        assert_eq!(x[2], 0.0);
    }

    #[test]
    fn test_debias_fixed_point() {
        let phi = Array2::<f64>::eye(2);
        let y = arr1(&[1.0, 1.0]);
        let mut problem = Problem::new(phi.view(), y.view(), &SolverOptions::default()).unwrap();
        let mut x = arr1(&[1.0, 0.0]);
        AihtII.debias(&mut problem, x.view_mut(), &[0]);
        assert_eq!(x, arr1(&[1.0, 0.0]));
    }
}
