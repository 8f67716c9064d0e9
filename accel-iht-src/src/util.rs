use ndarray::prelude::*;

/// Euclidean reconstruction error `||y - phi x||_2`.
#[inline]
pub fn objective(y: ArrayView1<f64>, phi: ArrayView2<f64>, x: ArrayView1<f64>) -> f64 {
    l2_norm((&y - &phi.dot(&x)).view())
}

#[inline]
pub fn l2_norm(x: ArrayView1<f64>) -> f64 {
    x.dot(&x).sqrt()
}

/// Indices of the entries of x that are not exactly zero, in ascending order.
pub fn nonzero_indices(x: ArrayView1<f64>) -> Vec<usize> {
    x.iter()
        .enumerate()
        .filter_map(|(i, &xi)| if xi != 0f64 { Some(i) } else { None })
        .collect()
}

/// Indices sorted by descending key. The sort is stable, so equal keys keep
/// ascending index order. NaN keys sort first.
pub fn descending_order<F>(x: ArrayView1<f64>, key: F) -> Vec<usize>
where
    F: Fn(f64) -> f64,
{
    let keys = x.mapv(key);
    let mut idx = (0..x.len()).collect::<Vec<usize>>();
    idx.sort_by(|&a, &b| keys[b].total_cmp(&keys[a]));
    idx
}

/// Active subspace identification.
///
/// The columns already in `active` are masked out, and the `k` columns with
/// the largest gradient magnitude among the remaining ones are appended to
/// `active`. The mask is rebuilt on every call, so the result never contains
/// duplicates.
pub fn candidate_support(active: &[usize], grad: ArrayView1<f64>, k: usize) -> Vec<usize> {
    let mut outside = Array1::from_elem(grad.len(), true);
    for &i in active {
        outside[i] = false;
    }
    let mut support = active.to_vec();
    support.extend(
        descending_order(grad, f64::abs)
            .into_iter()
            .filter(|&i| outside[i])
            .take(k),
    );
    support
}

/// Hard thresholding: keep the `k` largest entries of b (by value, not
/// magnitude) and zero the rest.
///
/// Returns the thresholded vector and the kept indices, largest first.
/// Negative entries are kept as well; clipping is done by the caller.
pub fn project_top_k(b: ArrayView1<f64>, k: usize) -> (Array1<f64>, Vec<usize>) {
    let mut order = descending_order(b, |bi| bi);
    order.truncate(k);
    let mut x = Array1::zeros(b.len());
    for &i in &order {
        x[i] = b[i];
    }
    (x, order)
}

/// Projection onto the non-negative orthant.
#[inline]
pub fn clip_negative(mut x: ArrayViewMut1<f64>) {
    x.mapv_inplace(|xi| if xi < 0f64 { 0f64 } else { xi });
}

/// `phi[:, support] . values`, with `values` aligned to `support`.
pub fn restricted_dot(
    phi: ArrayView2<f64>,
    support: &[usize],
    values: ArrayView1<f64>,
) -> Array1<f64> {
    let mut out = Array1::zeros(phi.nrows());
    for (&j, &v) in support.iter().zip(values.iter()) {
        if v != 0f64 {
            out.scaled_add(v, &phi.column(j));
        }
    }
    out
}

/// Entries of x at the given indices.
#[inline]
pub fn gather(x: ArrayView1<f64>, support: &[usize]) -> Array1<f64> {
    support.iter().map(|&i| x[i]).collect()
}

/// Exact line-search step along g restricted to `support`:
///
/// ```text
/// g'g / (2 * ||phi[:, support] g||^2)
/// ```
///
/// Returns 0 when the restricted gradient vanishes, leaving the iterate where it is.
pub fn rayleigh_step(phi: ArrayView2<f64>, support: &[usize], g: ArrayView1<f64>) -> f64 {
    let pg = restricted_dot(phi, support, g);
    let denom = 2f64 * pg.dot(&pg);
    if denom > 0f64 {
        g.dot(&g) / denom
    } else {
        0f64
    }
}
