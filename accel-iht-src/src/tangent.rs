use crate::{Error, Result};
use ndarray::prelude::*;

/// Finite-dimensional tangent space: N contribution vectors of dimension D,
/// stored as the rows of `vecs`, together with their sum and norms.
///
/// The coreset problem approximates `sum()` by a sparse non-negative
/// combination of the rows, so the dictionary handed to the solvers is
/// `vecs.t()` (D x N) and the target is `sum()`.
#[derive(Debug, Clone)]
pub struct TangentSpace {
    vecs: Array2<f64>,
    vsum: Array1<f64>,
    vsum_norm: f64,
    vnorms: Array1<f64>,
    vnorms_sum: f64,
}

impl TangentSpace {
    pub fn new(vecs: Array2<f64>) -> Result<TangentSpace> {
        let (n, d) = vecs.dim();
        if n == 0 || d == 0 {
            return Err(Error::Construction(format!(
                "tangent space needs at least one non-empty vector (got shape {n}x{d})"
            )));
        }
        let vnorms = vecs.map_axis(Axis(1), |v| v.dot(&v).sqrt());
        if let Some(i) = vnorms.iter().position(|&norm| norm == 0f64) {
            return Err(Error::Construction(format!(
                "tangent space must not have any 0 vectors (row {i})"
            )));
        }
        let vsum = vecs.sum_axis(Axis(0));
        let vsum_norm = vsum.dot(&vsum).sqrt();
        let vnorms_sum = vnorms.sum();
        Ok(TangentSpace {
            vecs,
            vsum,
            vsum_norm,
            vnorms,
            vnorms_sum,
        })
    }

    /// Build from a factory returning the stacked vectors. Anything other
    /// than a 2d array is rejected, since the intended layout would be ambiguous.
    pub fn from_factory<F>(factory: F) -> Result<TangentSpace>
    where
        F: FnOnce() -> ArrayD<f64>,
    {
        let vecs = factory();
        let ndim = vecs.ndim();
        let vecs = vecs.into_dimensionality::<Ix2>().map_err(|_| {
            Error::Construction(format!("vecs must be a 2d array (got {ndim} dimensions)"))
        })?;
        TangentSpace::new(vecs)
    }

    /// Like `from_factory`, but also requires every vector to have dimension `d`.
    pub fn from_factory_with_dim<F>(factory: F, d: usize) -> Result<TangentSpace>
    where
        F: FnOnce() -> ArrayD<f64>,
    {
        let space = TangentSpace::from_factory(factory)?;
        if space.dim() != d {
            return Err(Error::Construction(format!(
                "vecs must have dimension {d} (got {})",
                space.dim()
            )));
        }
        Ok(space)
    }

    pub fn vecs(&self) -> ArrayView2<f64> {
        self.vecs.view()
    }

    /// The solver dictionary, one column per vector.
    pub fn dictionary(&self) -> ArrayView2<f64> {
        self.vecs.t()
    }

    pub fn sum(&self) -> ArrayView1<f64> {
        self.vsum.view()
    }

    /// `sum_j w_j * vecs[idcs_j]`.
    pub fn sum_w(&self, w: ArrayView1<f64>, idcs: &[usize]) -> Result<Array1<f64>> {
        if w.len() != idcs.len() {
            return Err(Error::DimensionMismatch {
                expected: idcs.len(),
                actual: w.len(),
            });
        }
        if let Some(&i) = idcs.iter().find(|&&i| i >= self.num_vectors()) {
            return Err(Error::Value(format!(
                "index {i} out of range for {} vectors",
                self.num_vectors()
            )));
        }
        let mut out = Array1::zeros(self.dim());
        for (&wi, &i) in w.iter().zip(idcs) {
            out.scaled_add(wi, &self.vecs.row(i));
        }
        Ok(out)
    }

    pub fn sum_w_norm(&self, w: ArrayView1<f64>, idcs: &[usize]) -> Result<f64> {
        let s = self.sum_w(w, idcs)?;
        Ok(s.dot(&s).sqrt())
    }

    pub fn num_vectors(&self) -> usize {
        self.vecs.nrows()
    }

    pub fn dim(&self) -> usize {
        self.vecs.ncols()
    }

    pub fn norms(&self) -> ArrayView1<f64> {
        self.vnorms.view()
    }

    pub fn norms_sum(&self) -> f64 {
        self.vnorms_sum
    }

    pub fn sum_norm(&self) -> f64 {
        self.vsum_norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn small() -> Array2<f64> {
        arr2(&[[3.0, 4.0], [1.0, 0.0], [0.0, -2.0]])
    }

    #[test]
    fn test_aggregates() {
        let t = TangentSpace::new(small()).unwrap();
        assert_eq!(t.num_vectors(), 3);
        assert_eq!(t.dim(), 2);
        assert_eq!(t.sum(), arr1(&[4.0, 2.0]));
        assert_abs_diff_eq!(t.sum_norm(), 20f64.sqrt());
        assert_eq!(t.norms(), arr1(&[5.0, 1.0, 2.0]));
        assert_abs_diff_eq!(t.norms_sum(), 8.0);
        assert_eq!(t.dictionary().dim(), (2, 3));
        assert_eq!(t.dictionary().column(0), arr1(&[3.0, 4.0]));
        assert_eq!(t.vecs(), small());
        assert_eq!(t.dictionary(), t.vecs().t());
    }

    #[test]
    fn test_factory_from_borrowed_view() {
        let stacked = small().into_dyn();
        let view = stacked.view();
        let t = TangentSpace::from_factory(|| view.to_owned()).unwrap();
        assert_eq!(t.vecs(), stacked.view().into_dimensionality::<Ix2>().unwrap());
        assert_eq!(t.sum(), arr1(&[4.0, 2.0]));
    }

    #[test]
    fn test_sum_w() {
        let t = TangentSpace::new(small()).unwrap();
        let s = t.sum_w(arr1(&[2.0, 0.5]).view(), &[1, 2]).unwrap();
        assert_eq!(s, arr1(&[2.0, -1.0]));
        assert_abs_diff_eq!(t.sum_w_norm(arr1(&[1.0]).view(), &[0]).unwrap(), 5.0);

        let full = t.sum_w(arr1(&[1.0, 1.0, 1.0]).view(), &[0, 1, 2]).unwrap();
        assert_eq!(full, t.sum());

        assert!(matches!(
            t.sum_w(arr1(&[1.0]).view(), &[0, 1]),
            Err(Error::DimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            t.sum_w(arr1(&[1.0]).view(), &[3]),
            Err(Error::Value(_))
        ));
    }

    #[test]
    fn test_factory_must_be_2d() {
        let t = TangentSpace::from_factory(|| small().into_dyn()).unwrap();
        assert_eq!(t.num_vectors(), 3);

        let err = TangentSpace::from_factory(|| ArrayD::zeros(IxDyn(&[4]))).unwrap_err();
        assert!(matches!(err, Error::Construction(_)));
        let err = TangentSpace::from_factory(|| ArrayD::ones(IxDyn(&[2, 2, 2]))).unwrap_err();
        assert!(matches!(err, Error::Construction(_)));
    }

    #[test]
    fn test_factory_dim() {
        assert!(TangentSpace::from_factory_with_dim(|| small().into_dyn(), 2).is_ok());
        let err = TangentSpace::from_factory_with_dim(|| small().into_dyn(), 3).unwrap_err();
        assert!(matches!(err, Error::Construction(_)));
    }

    #[test]
    fn test_rejects_zero_vectors() {
        let mut vecs = small();
        vecs.row_mut(1).fill(0.0);
        assert!(matches!(
            TangentSpace::new(vecs),
            Err(Error::Construction(_))
        ));
        assert!(matches!(
            TangentSpace::new(Array2::zeros((0, 3))),
            Err(Error::Construction(_))
        ));
    }
}
