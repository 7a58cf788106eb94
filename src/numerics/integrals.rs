//! numerics::integrals — matrix exponentials and their integrals over `[0, τ]`.
//!
//! For a square `M` and `τ > 0` the HJC matrices need
//!
//! - `e^{Mτ}`,
//! - `∫_0^τ e^{Mt} dt`,
//! - `∫_0^τ t e^{Mt} dt`.
//!
//! All three come from one exponential of the 3k×3k block matrix
//!
//! ```text
//!     B = | Mτ  τI   0 |        e^B = | e^{Mτ}  F1  F2 |
//!         |  0   0  τI |              |   0      I  τI |
//!         |  0   0   0 |              |   0      0   I |
//! ```
//!
//! with `F1 = ∫_0^τ e^{Mt} dt` and `F2 = τ F1 − ∫_0^τ t e^{Mt} dt`
//! (Van Loan). No inverse of `M` is formed, so singular `M` (e.g. a
//! generator at `s = 0`) is fine.
use crate::{
    likelihood::errors::{LikelihoodError, LikelihoodResult},
    numerics::bridge::all_finite,
};
use nalgebra::DMatrix;

/// `e^{Mτ}` together with its zeroth and first moment integrals on `[0, τ]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpIntegrals {
    /// `e^{Mτ}`.
    pub exp: DMatrix<f64>,
    /// `∫_0^τ e^{Mt} dt`.
    pub integral: DMatrix<f64>,
    /// `∫_0^τ t e^{Mt} dt`.
    pub weighted: DMatrix<f64>,
}

/// Evaluate [`ExpIntegrals`] for square `m` and horizon `tau`.
///
/// # Errors
/// - [`LikelihoodError::NonFiniteResult`] when the block exponential
///   overflows or `m` carries non-finite entries.
pub fn exp_integrals(m: &DMatrix<f64>, tau: f64) -> LikelihoodResult<ExpIntegrals> {
    let k = m.nrows();
    let mut block = DMatrix::<f64>::zeros(3 * k, 3 * k);
    block.view_mut((0, 0), (k, k)).copy_from(&(m * tau));
    block.view_mut((0, k), (k, k)).fill_diagonal(tau);
    block.view_mut((k, 2 * k), (k, k)).fill_diagonal(tau);

    let full = block.exp();
    if !all_finite(&full) {
        return Err(LikelihoodError::NonFiniteResult { context: "block matrix exponential" });
    }
    let exp = full.view((0, 0), (k, k)).into_owned();
    let integral = full.view((0, k), (k, k)).into_owned();
    let second = full.view((0, 2 * k), (k, k)).into_owned();
    let weighted = &integral * tau - second;
    Ok(ExpIntegrals { exp, integral, weighted })
}

/// `e^{Mt}` with a finiteness check.
pub fn exp_scaled(m: &DMatrix<f64>, t: f64) -> LikelihoodResult<DMatrix<f64>> {
    let out = (m * t).exp();
    if !all_finite(&out) {
        return Err(LikelihoodError::NonFiniteResult { context: "matrix exponential" });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Compare the Van Loan blocks with closed forms in the scalar case.
    //
    // Given
    // -----
    // - M = [−a] with a = 2, τ = 0.5.
    //
    // Expect
    // ------
    // - exp = e^{−aτ}, integral = (1 − e^{−aτ})/a,
    //   weighted = (1 − e^{−aτ}(1 + aτ))/a².
    fn scalar_case_matches_closed_form() {
        // Arrange
        let a = 2.0;
        let tau = 0.5;
        let m = DMatrix::from_element(1, 1, -a);

        // Act
        let out = exp_integrals(&m, tau).unwrap();

        // Assert
        let e = (-a * tau).exp();
        assert_relative_eq!(out.exp[(0, 0)], e, epsilon = 1e-12);
        assert_relative_eq!(out.integral[(0, 0)], (1.0 - e) / a, epsilon = 1e-12);
        assert_relative_eq!(
            out.weighted[(0, 0)],
            (1.0 - e * (1.0 + a * tau)) / (a * a),
            epsilon = 1e-12
        );
    }

    #[test]
    // Purpose
    // -------
    // Singular M must not break the integrals: for M = 0 the integrals are
    // τI and τ²/2 I.
    //
    // Given
    // -----
    // - M = 0 (2×2), τ = 0.3.
    //
    // Expect
    // ------
    // - exp = I, integral = 0.3 I, weighted = 0.045 I.
    fn zero_matrix_gives_polynomial_moments() {
        let m = DMatrix::<f64>::zeros(2, 2);

        let out = exp_integrals(&m, 0.3).unwrap();

        for i in 0..2 {
            for j in 0..2 {
                let delta = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(out.exp[(i, j)], delta, epsilon = 1e-14);
                assert_relative_eq!(out.integral[(i, j)], 0.3 * delta, epsilon = 1e-14);
                assert_relative_eq!(out.weighted[(i, j)], 0.045 * delta, epsilon = 1e-14);
            }
        }
    }
}
