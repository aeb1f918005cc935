//! # Observed order of accuracy
//! Given errors `e` at grid spacings `h`, estimate `p` in
//! $$
//! e \approx C h^p
//! $$
//! from the slope of `ln e` over `ln h`.
//!
//! Two policies are implemented, see [`OrderPolicy`]. They agree
//! on ideal data, but not on data with coarse-grid effects.
use crate::error::{Result, VerifyError};
use crate::types::FloatNum;
use serde::{Deserialize, Serialize};

/// How the log-log slope is fitted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPolicy {
    /// Two-point slope between the first and the last entry (default)
    #[default]
    Endpoints,
    /// Least squares fit through all entries
    LeastSquares,
}

/// Observed order from the first and last (spacing, error) pair.
///
/// # Example
/// ```
/// use taylorgreen::convergence::estimate_order;
///
/// let h: [f64; 2] = [1. / 16., 1. / 128.];
/// let e: [f64; 2] = [0.01 / 256., 0.01 / 16384.];
/// let p = estimate_order(&h, &e).unwrap();
/// assert!((p - 2.).abs() < 1e-12);
/// ```
///
/// # Errors
/// See [`estimate_order_with`]
pub fn estimate_order<A: FloatNum>(spacings: &[A], errors: &[A]) -> Result<A> {
    estimate_order_with(OrderPolicy::Endpoints, spacings, errors)
}

/// Observed order with the given policy.
///
/// `spacings` and `errors` are parallel sequences, ordered
/// consistently (usually from coarse to fine).
///
/// # Errors
/// - `InvalidInput` if the sequences differ in length
/// - `InsufficientData` if fewer than two pairs are supplied
/// - `DegenerateInput` if an error is zero, negative or not finite,
///   a spacing is not positive, or spacings are not strictly monotonic
pub fn estimate_order_with<A: FloatNum>(
    policy: OrderPolicy,
    spacings: &[A],
    errors: &[A],
) -> Result<A> {
    validate(spacings, errors)?;
    let n = spacings.len();
    match policy {
        OrderPolicy::Endpoints => Ok(slope(
            spacings[0],
            errors[0],
            spacings[n - 1],
            errors[n - 1],
        )),
        OrderPolicy::LeastSquares => Ok(least_squares_slope(spacings, errors)),
    }
}

/// Observed order between each pair of successive entries
///
/// # Errors
/// See [`estimate_order_with`]
pub fn local_orders<A: FloatNum>(spacings: &[A], errors: &[A]) -> Result<Vec<A>> {
    validate(spacings, errors)?;
    Ok(spacings
        .windows(2)
        .zip(errors.windows(2))
        .map(|(h, e)| slope(h[0], e[0], h[1], e[1]))
        .collect())
}

fn slope<A: FloatNum>(h0: A, e0: A, h1: A, e1: A) -> A {
    (e1.ln() - e0.ln()) / (h1.ln() - h0.ln())
}

fn least_squares_slope<A: FloatNum>(spacings: &[A], errors: &[A]) -> A {
    let x: Vec<A> = spacings.iter().map(|h| h.ln()).collect();
    let y: Vec<A> = errors.iter().map(|e| e.ln()).collect();
    // validated length >= 2
    let n = A::from_usize(x.len()).unwrap_or_else(A::one);
    let x_mean = x.iter().copied().sum::<A>() / n;
    let y_mean = y.iter().copied().sum::<A>() / n;
    let sxy: A = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (*xi - x_mean) * (*yi - y_mean))
        .sum();
    let sxx: A = x.iter().map(|xi| (*xi - x_mean).powi(2)).sum();
    sxy / sxx
}

fn validate<A: FloatNum>(spacings: &[A], errors: &[A]) -> Result<()> {
    if spacings.len() != errors.len() {
        return Err(VerifyError::InvalidInput(format!(
            "{} spacings but {} errors",
            spacings.len(),
            errors.len()
        )));
    }
    if spacings.len() < 2 {
        return Err(VerifyError::InsufficientData {
            required: 2,
            found: spacings.len(),
        });
    }
    if let Some((i, e)) = errors.iter().enumerate().find(|(_, e)| e.is_zero()) {
        return Err(VerifyError::DegenerateInput(format!(
            "error {} is exactly {}, logarithm undefined",
            i, e
        )));
    }
    if let Some(e) = errors.iter().find(|e| !(e.is_finite() && **e > A::zero())) {
        return Err(VerifyError::DegenerateInput(format!(
            "errors must be positive and finite, got {}",
            e
        )));
    }
    if let Some(h) = spacings.iter().find(|h| !(h.is_finite() && **h > A::zero())) {
        return Err(VerifyError::DegenerateInput(format!(
            "spacings must be positive and finite, got {}",
            h
        )));
    }
    let increasing = spacings.windows(2).all(|h| h[1] > h[0]);
    let decreasing = spacings.windows(2).all(|h| h[1] < h[0]);
    if !(increasing || decreasing) {
        return Err(VerifyError::DegenerateInput(format!(
            "spacings are not strictly monotonic: {:?}",
            spacings
        )));
    }
    Ok(())
}

/// Observed order of one field of one scheme
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConvergenceResult {
    /// Scheme label
    pub scheme: String,
    /// Field name
    pub field: String,
    /// Grid spacings, coarse to fine
    pub spacings: Vec<f64>,
    /// Errors at `spacings`
    pub errors: Vec<f64>,
    /// Estimated order
    pub order: f64,
    /// Order between successive resolutions
    pub local_orders: Vec<f64>,
    /// Policy used for `order`
    pub policy: OrderPolicy,
}

impl ConvergenceResult {
    /// Estimate the order of `field` from (spacing, error) pairs
    ///
    /// # Errors
    /// See [`estimate_order_with`]
    pub fn estimate(
        scheme: &str,
        field: &str,
        policy: OrderPolicy,
        spacings: Vec<f64>,
        errors: Vec<f64>,
    ) -> Result<Self> {
        let order = estimate_order_with(policy, &spacings, &errors)?;
        let local_orders = local_orders(&spacings, &errors)?;
        Ok(Self {
            scheme: scheme.to_owned(),
            field: field.to_owned(),
            spacings,
            errors,
            order,
            local_orders,
            policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn law(c: f64, p: f64, spacings: &[f64]) -> Vec<f64> {
        spacings.iter().map(|h| c * h.powf(p)).collect()
    }

    #[test]
    fn test_second_order_two_points() {
        let h = [1. / 16., 1. / 128.];
        let e = [0.01 / 256., 0.01 / 16384.];
        assert_abs_diff_eq!(estimate_order(&h, &e).unwrap(), 2., epsilon = 1e-10);
    }

    #[test]
    fn test_fourth_order_two_points() {
        let h = [1. / 16., 1. / 128.];
        let e = law(0.002, 4., &h);
        assert_abs_diff_eq!(estimate_order(&h, &e).unwrap(), 4., epsilon = 1e-10);
    }

    #[test]
    fn test_policies_agree_on_ideal_data() {
        let h = [1. / 16., 1. / 32., 1. / 64., 1. / 128.];
        let e = law(0.3, 2., &h);
        let endpoints = estimate_order_with(OrderPolicy::Endpoints, &h, &e).unwrap();
        let lsq = estimate_order_with(OrderPolicy::LeastSquares, &h, &e).unwrap();
        assert_abs_diff_eq!(endpoints, 2., epsilon = 1e-10);
        assert_abs_diff_eq!(lsq, 2., epsilon = 1e-10);
        for p in local_orders(&h, &e).unwrap() {
            assert_abs_diff_eq!(p, 2., epsilon = 1e-10);
        }
    }

    #[test]
    fn test_policies_differ_on_coarse_grid_effects() {
        let h = [1. / 16., 1. / 32., 1. / 64., 1. / 128.];
        let mut e = law(0.3, 2., &h);
        // coarsest run is off the asymptotic range
        e[0] *= 3.;
        let endpoints = estimate_order_with(OrderPolicy::Endpoints, &h, &e).unwrap();
        let lsq = estimate_order_with(OrderPolicy::LeastSquares, &h, &e).unwrap();
        let expected = 2. + 3f64.ln() / 8f64.ln();
        assert_abs_diff_eq!(endpoints, expected, epsilon = 1e-10);
        assert!((endpoints - lsq).abs() > 1e-3);
        let local = local_orders(&h, &e).unwrap();
        assert_abs_diff_eq!(local[0], 2. + 3f64.ln() / 2f64.ln(), epsilon = 1e-10);
        assert_abs_diff_eq!(local[2], 2., epsilon = 1e-10);
    }

    #[test]
    fn test_fine_to_coarse_ordering() {
        let h = [1. / 128., 1. / 64., 1. / 16.];
        let e = law(1., 3., &h);
        assert_abs_diff_eq!(estimate_order(&h, &e).unwrap(), 3., epsilon = 1e-10);
    }

    #[test]
    fn test_single_precision() {
        let h = [0.5f32, 0.25];
        let e = [0.25f32, 0.0625];
        assert!((estimate_order(&h, &e).unwrap() - 2.).abs() < 1e-5);
    }

    #[test]
    fn test_insufficient_data() {
        let res = estimate_order(&[0.1], &[0.01]);
        assert_eq!(
            res,
            Err(VerifyError::InsufficientData {
                required: 2,
                found: 1
            })
        );
        let res = estimate_order::<f64>(&[], &[]);
        assert!(matches!(res, Err(VerifyError::InsufficientData { .. })));
    }

    #[test]
    fn test_degenerate_input() {
        let degenerate = |r: Result<f64>| matches!(r, Err(VerifyError::DegenerateInput(_)));
        assert!(degenerate(estimate_order(&[0.1, 0.05], &[0.01, 0.])));
        assert!(degenerate(estimate_order(&[0.1, 0.05], &[-0.01, 0.001])));
        assert!(degenerate(estimate_order(&[0.1, 0.05, 0.07], &[0.01, 0.005, 0.001])));
        assert!(degenerate(estimate_order(&[0.1, 0.1], &[0.01, 0.005])));
        assert!(degenerate(estimate_order(&[0.1, 0.], &[0.01, 0.005])));
    }

    #[test]
    fn test_length_mismatch() {
        let res = estimate_order(&[0.1, 0.05], &[0.01]);
        assert!(matches!(res, Err(VerifyError::InvalidInput(_))));
    }

    #[test]
    fn test_convergence_result() {
        let h = vec![1. / 16., 1. / 32., 1. / 64.];
        let e = law(0.1, 4., &h);
        let res = ConvergenceResult::estimate("4th", "p", OrderPolicy::Endpoints, h, e).unwrap();
        assert_abs_diff_eq!(res.order, 4., epsilon = 1e-10);
        assert_eq!(res.local_orders.len(), 2);
        assert_eq!(res.field, "p");
    }
}
