use accel_iht_src::prelude::*;
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArrayDyn};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn value_error(e: Error) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn options(
    tol: f64,
    max_iter: usize,
    stochastic_ratio: Option<f64>,
    seed: Option<u64>,
) -> SolverOptions {
    SolverOptions {
        tol,
        max_iter,
        stochastic_ratio,
        seed,
        verbose: false,
    }
}

/// Sparse non-negative recovery by accelerated IHT.
#[pymodule]
fn accel_iht(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(solve_py, m)?)?;
    m.add_function(wrap_pyfunction!(objective_py, m)?)?;
    m.add_class::<IHTCoreset>()?;
    Ok(())
}

/// solve(phi, y, k, mode="IHT", ...) -> (weights, support, objective, converged)
/// phi: (M, N) dictionary, one candidate per column
/// y: (M,) target
/// k: sparsity
/// mode: "IHT" or "IHT-2"
/// stochastic_ratio: fraction of columns per gradient, in (0, 1)
#[pyfunction]
#[pyo3(
    name = "solve",
    signature = (phi, y, k, mode = "IHT", tol = 1e-5, max_iter = 300, stochastic_ratio = None, seed = None)
)]
#[allow(clippy::too_many_arguments)]
fn solve_py<'py>(
    py: Python<'py>,
    phi: PyReadonlyArray2<'py, f64>,
    y: PyReadonlyArray1<'py, f64>,
    k: usize,
    mode: &str,
    tol: f64,
    max_iter: usize,
    stochastic_ratio: Option<f64>,
    seed: Option<u64>,
) -> PyResult<(Bound<'py, PyArray1<f64>>, Vec<usize>, f64, bool)> {
    let mode: Mode = mode.parse().map_err(value_error)?;
    let options = options(tol, max_iter, stochastic_ratio, seed);
    let s = solve(phi.as_array(), y.as_array(), k, mode, &options).map_err(value_error)?;
    let converged = s.converged();
    Ok((s.weights.into_pyarray(py), s.support, s.objective, converged))
}

/// objective(y, phi, x) -> ||y - phi x||
#[pyfunction]
#[pyo3(name = "objective")]
fn objective_py(
    y: PyReadonlyArray1<'_, f64>,
    phi: PyReadonlyArray2<'_, f64>,
    x: PyReadonlyArray1<'_, f64>,
) -> PyResult<f64> {
    let (y, phi, x) = (y.as_array(), phi.as_array(), x.as_array());
    if phi.nrows() != y.len() || phi.ncols() != x.len() {
        return Err(PyValueError::new_err(format!(
            "phi is {}x{}, y has {} entries and x has {}",
            phi.nrows(),
            phi.ncols(),
            y.len(),
            x.len()
        )));
    }
    Ok(objective(y, phi, x))
}

/// IHTCoreset(vecs, iht_mode="IHT", ...)
/// vecs: (N, D) array, one row per datapoint
///
/// build(size) selects at most `size` datapoints whose weighted sum
/// approximates the sum of all rows.
#[pyclass]
struct IHTCoreset {
    inner: Coreset,
}

#[pymethods]
impl IHTCoreset {
    #[new]
    #[pyo3(signature = (vecs, iht_mode = "IHT", stochastic_batch_ratio = None, tol = 1e-5, max_iter = 300, seed = None))]
    fn new(
        vecs: PyReadonlyArrayDyn<'_, f64>,
        iht_mode: &str,
        stochastic_batch_ratio: Option<f64>,
        tol: f64,
        max_iter: usize,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let mode: Mode = iht_mode.parse().map_err(value_error)?;
        let tangent = TangentSpace::from_factory(|| vecs.as_array().to_owned()).map_err(value_error)?;
        let inner = Coreset::new(
            tangent,
            mode,
            options(tol, max_iter, stochastic_batch_ratio, seed),
        )
        .map_err(value_error)?;
        Ok(IHTCoreset { inner })
    }

    /// build(size) -> converged
    fn build(&mut self, size: usize) -> PyResult<bool> {
        let solution = self.inner.build(size).map_err(value_error)?;
        Ok(solution.converged())
    }

    /// weights() -> (weights, indices), positive weights only
    fn weights<'py>(&self, py: Python<'py>) -> (Bound<'py, PyArray1<f64>>, Vec<usize>) {
        let (wts, idcs) = self.inner.weights();
        (wts.into_pyarray(py), idcs)
    }

    /// error() -> ||sum - sum_w||
    fn error(&self) -> f64 {
        self.inner.error()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    #[getter]
    fn num_vectors(&self) -> usize {
        self.inner.tangent().num_vectors()
    }

    /// "IHT" or "IHT-2"
    #[getter]
    fn iht_mode(&self) -> String {
        self.inner.mode().to_string()
    }
}
