//! The HJC (1990) coefficient recursion, generic over its element type.
//!
//! The survivor function of one direction is
//!
//! ```text
//!     R(t) = Σ_{m ≥ 0} (−1)^m M_m(t − mτ),   M_m(u) = Σ_i Σ_{l=0}^{m} C_{iml} u^l e^{−λ_i u}
//! ```
//!
//! with `M_m(u) = 0` for `u < 0`. The coefficients satisfy, for `m ≥ 1`,
//!
//! ```text
//!     C_{imm} = D_i C_{i,m−1,m−1} / m
//!     C_{im0} = Σ_{j≠i} Σ_{r=0}^{m−1} [ D_i C_{j,m−1,r} r!/(λ_j − λ_i)^{r+1}
//!                                       − D_j C_{i,m−1,r} r!/(λ_i − λ_j)^{r+1} ]
//!     C_{iml} = D_i C_{i,m−1,l−1} / l
//!               − Σ_{j≠i} Σ_{r=l}^{m−1} D_j C_{i,m−1,r} r!/(l! (λ_i − λ_j)^{r−l+1})   (1 ≤ l < m)
//! ```
//!
//! [`recursion_formula`] evaluates one step. Lower-order coefficients are
//! first made available through [`RecursionTerms::ensure`] and then read by
//! reference, so a step never copies the coefficients it consumes;
//! memoization is the implementor's job.
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use nalgebra::DMatrix;

/// Algebra needed by the recursion: products and scaled accumulation.
pub trait RecursionElement: Clone {
    /// `self · other` (matrix product for matrices).
    fn product(&self, other: &Self) -> Self;

    /// `self += factor · other`.
    fn add_scaled(&mut self, factor: f64, other: &Self);
}

impl RecursionElement for f64 {
    fn product(&self, other: &Self) -> Self {
        self * other
    }

    fn add_scaled(&mut self, factor: f64, other: &Self) {
        *self += factor * other;
    }
}

impl RecursionElement for DMatrix<f64> {
    fn product(&self, other: &Self) -> Self {
        self * other
    }

    fn add_scaled(&mut self, factor: f64, other: &Self) {
        *self += other * factor;
    }
}

/// Access to the data one recursion step reads.
pub trait RecursionTerms {
    type Element: RecursionElement;

    /// Number of eigenvalues `λ_i`.
    fn len(&self) -> usize;

    fn eigenvalue(&self, i: usize) -> f64;

    /// `D_i`.
    fn d(&self, i: usize) -> &Self::Element;

    /// Additive identity of the right shape.
    fn zero(&self) -> Self::Element;

    /// Compute and store `C_{iml}` unless it is already available.
    fn ensure(&mut self, i: usize, m: usize, l: usize) -> LikelihoodResult<()>;

    /// `C_{iml}` if it has been computed.
    fn cached_coefficient(&self, i: usize, m: usize, l: usize) -> Option<&Self::Element>;
}

/// One application of the recursion for `m ≥ 1`.
///
/// # Errors
/// - [`LikelihoodError::InvalidRecursionIndex`] for `m = 0` (the base case
///   belongs to the caller), `l > m` or `i` out of range.
/// - Whatever `terms.ensure` reports for lower-order entries.
pub fn recursion_formula<T: RecursionTerms>(
    terms: &mut T, i: usize, m: usize, l: usize,
) -> LikelihoodResult<T::Element> {
    if m == 0 || l > m || i >= terms.len() {
        return Err(LikelihoodError::InvalidRecursionIndex { i, m, l });
    }
    if l == m {
        terms.ensure(i, m - 1, m - 1)?;
        let previous = lookup(terms, i, m - 1, m - 1)?;
        let mut out = terms.zero();
        out.add_scaled(1.0 / m as f64, &terms.d(i).product(previous));
        return Ok(out);
    }
    if l == 0 {
        return zeroth_order(terms, i, m);
    }

    for r in (l - 1)..m {
        terms.ensure(i, m - 1, r)?;
    }
    let terms = &*terms;
    let lambda_i = terms.eigenvalue(i);
    let mut out = terms.zero();
    out.add_scaled(1.0 / l as f64, &terms.d(i).product(lookup(terms, i, m - 1, l - 1)?));
    for j in (0..terms.len()).filter(|&j| j != i) {
        let delta = lambda_i - terms.eigenvalue(j);
        for r in l..m {
            let c_imr = lookup(terms, i, m - 1, r)?;
            out.add_scaled(-factorial_ratio(r, l, delta), &terms.d(j).product(c_imr));
        }
    }
    Ok(out)
}

/// `C_{im0}`.
fn zeroth_order<T: RecursionTerms>(
    terms: &mut T, i: usize, m: usize,
) -> LikelihoodResult<T::Element> {
    for j in 0..terms.len() {
        for r in 0..m {
            terms.ensure(j, m - 1, r)?;
        }
    }
    let terms = &*terms;
    let lambda_i = terms.eigenvalue(i);
    let mut out = terms.zero();
    for j in (0..terms.len()).filter(|&j| j != i) {
        let lambda_j = terms.eigenvalue(j);
        for r in 0..m {
            let c_jr = lookup(terms, j, m - 1, r)?;
            let c_ir = lookup(terms, i, m - 1, r)?;
            out.add_scaled(factorial_ratio(r, 0, lambda_j - lambda_i), &terms.d(i).product(c_jr));
            out.add_scaled(-factorial_ratio(r, 0, lambda_i - lambda_j), &terms.d(j).product(c_ir));
        }
    }
    Ok(out)
}

/// Borrow a coefficient that `ensure` has made available.
fn lookup<T: RecursionTerms>(
    terms: &T, i: usize, m: usize, l: usize,
) -> LikelihoodResult<&T::Element> {
    terms.cached_coefficient(i, m, l).ok_or(LikelihoodError::InvalidRecursionIndex { i, m, l })
}

/// `r! / (l! δ^{r−l+1})` for `l <= r`, as a running product.
pub(crate) fn factorial_ratio(r: usize, l: usize, delta: f64) -> f64 {
    (l + 1..=r).fold(1.0 / delta, |acc, k| acc * k as f64 / delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests drive the recursion with scalar elements so every value
    // can be checked by hand.
    // -------------------------------------------------------------------------

    /// Scalar stand-in with λ = [1, 3], D = [0.5, 2], C_{i00} = [0.25, 0.75].
    struct ScalarTerms {
        eigenvalues: Vec<f64>,
        d: Vec<f64>,
        memo: HashMap<(usize, usize, usize), f64>,
    }

    impl ScalarTerms {
        fn new() -> Self {
            let mut memo = HashMap::new();
            memo.insert((0, 0, 0), 0.25);
            memo.insert((1, 0, 0), 0.75);
            Self { eigenvalues: vec![1.0, 3.0], d: vec![0.5, 2.0], memo }
        }

        fn coefficient(&mut self, i: usize, m: usize, l: usize) -> f64 {
            self.ensure(i, m, l).unwrap();
            self.memo[&(i, m, l)]
        }
    }

    impl RecursionTerms for ScalarTerms {
        type Element = f64;

        fn len(&self) -> usize {
            self.eigenvalues.len()
        }

        fn eigenvalue(&self, i: usize) -> f64 {
            self.eigenvalues[i]
        }

        fn d(&self, i: usize) -> &f64 {
            &self.d[i]
        }

        fn zero(&self) -> f64 {
            0.0
        }

        fn ensure(&mut self, i: usize, m: usize, l: usize) -> LikelihoodResult<()> {
            if !self.memo.contains_key(&(i, m, l)) {
                let value = recursion_formula(self, i, m, l)?;
                self.memo.insert((i, m, l), value);
            }
            Ok(())
        }

        fn cached_coefficient(&self, i: usize, m: usize, l: usize) -> Option<&f64> {
            self.memo.get(&(i, m, l))
        }
    }

    #[test]
    // Purpose
    // -------
    // Reproduce hand-computed first- and second-order coefficients.
    //
    // Given
    // -----
    // - λ = [1, 3], D = [0.5, 2], C_{i00} = [0.25, 0.75].
    //
    // Expect
    // ------
    // - C_{011} = 0.125, C_{010} = 0.4375, C_{110} = −0.4375,
    //   C_{021} = 0.34375.
    fn scalar_mock_matches_hand_computation() {
        let mut terms = ScalarTerms::new();

        assert_relative_eq!(terms.coefficient(0, 1, 1), 0.125, epsilon = 1e-15);
        assert_relative_eq!(terms.coefficient(0, 1, 0), 0.4375, epsilon = 1e-15);
        assert_relative_eq!(terms.coefficient(1, 1, 0), -0.4375, epsilon = 1e-15);
        assert_relative_eq!(terms.coefficient(0, 2, 1), 0.34375, epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Ensure invalid triples are rejected before any lookup.
    //
    // Given
    // -----
    // - m = 0, l > m, and i beyond the eigenvalue count.
    //
    // Expect
    // ------
    // - `InvalidRecursionIndex` for each.
    fn invalid_indices_are_rejected() {
        let mut terms = ScalarTerms::new();

        for (i, m, l) in [(0, 0, 0), (0, 1, 2), (2, 1, 0)] {
            assert_eq!(
                recursion_formula(&mut terms, i, m, l),
                Err(LikelihoodError::InvalidRecursionIndex { i, m, l })
            );
        }
    }

    #[test]
    // Purpose
    // -------
    // Check the running-product factorial ratio against direct evaluation.
    //
    // Given
    // -----
    // - (r, l, δ) = (4, 1, 2) and (3, 0, −0.5).
    //
    // Expect
    // ------
    // - 4!/(1!·2⁴) = 1.5 and 3!/(−0.5)⁴ = 96.
    fn factorial_ratio_matches_direct_formula() {
        assert_relative_eq!(factorial_ratio(4, 1, 2.0), 1.5, epsilon = 1e-15);
        assert_relative_eq!(factorial_ratio(3, 0, -0.5), 96.0, epsilon = 1e-12);
        assert_relative_eq!(factorial_ratio(0, 0, 4.0), 0.25, epsilon = 1e-15);
    }
}
