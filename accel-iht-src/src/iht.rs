use crate::Threshold;

/// A-IHT I: gradient step on the active subspace, hard threshold to the K
/// largest entries, clip negatives. Everything it needs is the default
/// behaviour of [`Threshold`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AihtI;

impl Threshold for AihtI {}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::prelude::*;

    #[test]
    fn test_threshold() {
        let grad = arr1(&[0.1, -2.0, 0.5, 1.0]);
        assert_eq!(AihtI.candidate_support(&[3], grad.view(), 2), vec![3, 1, 2]);

        let (x, support) = AihtI.project(arr1(&[0.1, -2.0, 0.5, 1.0]).view(), 2);
        assert_eq!(support, vec![3, 2]);
        assert_eq!(x, arr1(&[0.0, 0.0, 0.5, 1.0]));
    }
}
