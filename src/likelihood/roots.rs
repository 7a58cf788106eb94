//! likelihood::roots — real roots of `det W(s) = 0`.
//!
//! Purpose
//! -------
//! Locate the exponents `s_i` of the asymptotic survivor function. For a
//! direction of size `k` there are `k` real, negative roots (counted with
//! multiplicity).
//!
//! Key behaviors
//! -------------
//! - Counting: the number of roots below `s` equals the number of
//!   eigenvalues of `H(s)` below `s` ([`count_roots_below`]).
//! - Bracketing: the upper bound starts at `0` and grows, the lower bound
//!   starts at `−1` and doubles, until the counts are `k` and `0`.
//! - Isolation: bisection on the counting function until every interval
//!   holds one root, or is narrower than the tolerance (a repeated root).
//! - Polishing: `argmin`'s [`BrentRoot`] on `det W(s)` for each single-root
//!   interval. If Brent rejects the bracket or fails, bisection on the
//!   counting function finishes the job.
//!
//! Conventions
//! -----------
//! - Roots are returned sorted ascending.
//! - With the `obs_slog` feature and `RootOptions::verbose`, each Brent run
//!   gets a terminal slog observer.
use crate::{
    likelihood::{
        determinant::DeterminantEq,
        errors::{LikelihoodError, LikelihoodResult},
        options::{RootOptions, SvdOptions},
    },
    numerics::spectral::eigenvalue_real_parts,
};
use argmin::{
    core::{CostFunction, Error, Executor, State},
    solver::brent::BrentRoot,
};

/// Bracket `[lower, upper]` holding `multiplicity` roots of `det W(s)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootInterval {
    pub lower: f64,
    pub upper: f64,
    pub multiplicity: usize,
}

impl RootInterval {
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }
}

/// Number of roots of `det W(s) = 0` strictly below `s`.
pub fn count_roots_below(
    eq: &DeterminantEq, s: f64, svd: &SvdOptions,
) -> LikelihoodResult<usize> {
    let eigenvalues = eigenvalue_real_parts(&eq.h(s)?, svd)?;
    Ok(eigenvalues.iter().filter(|&&value| value < s).count())
}

/// Isolate every root of `det W(s) = 0` in its own interval.
///
/// Parameters
/// ----------
/// - `eq`: equation for one direction.
/// - `opts`: tolerance and iteration budget; the budget bounds the number
///   of bound expansions and of bisection steps per interval.
/// - `svd`: thresholds for the eigenvalue counts.
///
/// Returns
/// -------
/// Intervals sorted by `lower`, multiplicities summing to `eq.size()`.
///
/// Errors
/// ------
/// - [`LikelihoodError::RootBracketFailed`] if no bound with the expected
///   count is found within the budget.
/// - [`LikelihoodError::RootCountMismatch`] if counts are not monotone
///   inside a bracket.
pub fn find_root_intervals(
    eq: &DeterminantEq, opts: &RootOptions, svd: &SvdOptions,
) -> LikelihoodResult<Vec<RootInterval>> {
    let expected = eq.size();
    let (upper, lower) = (upper_bound(eq, opts, svd)?, lower_bound(eq, opts, svd)?);

    let mut intervals = Vec::with_capacity(expected);
    let mut stack = vec![(lower, upper, 0_usize, expected)];
    while let Some((lo, hi, count_lo, count_hi)) = stack.pop() {
        let inside = count_hi - count_lo;
        if inside == 0 {
            continue;
        }
        if inside == 1 || is_resolved(lo, hi, opts.tolerance) {
            intervals.push(RootInterval { lower: lo, upper: hi, multiplicity: inside });
            continue;
        }
        let mid = 0.5 * (lo + hi);
        let count_mid = count_roots_below(eq, mid, svd)?;
        if count_mid < count_lo || count_mid > count_hi {
            return Err(LikelihoodError::RootCountMismatch { lower: count_lo, upper: count_hi });
        }
        stack.push((lo, mid, count_lo, count_mid));
        stack.push((mid, hi, count_mid, count_hi));
    }
    intervals.sort_by(|a, b| a.lower.total_cmp(&b.lower));
    Ok(intervals)
}

/// All roots of `det W(s) = 0`, ascending, repeated roots listed once per
/// multiplicity.
///
/// # Errors
/// - Everything [`find_root_intervals`] reports.
/// - [`LikelihoodError::NonNegativeRoot`] if a root is not strictly negative.
pub fn find_roots(
    eq: &DeterminantEq, opts: &RootOptions, svd: &SvdOptions,
) -> LikelihoodResult<Vec<f64>> {
    let mut roots = Vec::with_capacity(eq.size());
    for interval in find_root_intervals(eq, opts, svd)? {
        let root = if interval.multiplicity == 1 {
            match polish_with_brent(eq, &interval, opts) {
                Ok(root) => root,
                Err(_) => bisect_counts(eq, interval, opts, svd)?,
            }
        } else {
            interval.midpoint()
        };
        roots.extend(std::iter::repeat_n(root, interval.multiplicity));
    }
    roots.sort_by(|a, b| a.total_cmp(b));
    for (index, &root) in roots.iter().enumerate() {
        if root >= 0.0 {
            return Err(LikelihoodError::NonNegativeRoot { index, root });
        }
    }
    Ok(roots)
}

/// `det W(s)` as an `argmin` cost function.
struct DeterminantProblem<'a> {
    eq: &'a DeterminantEq,
}

impl CostFunction for DeterminantProblem<'_> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, s: &Self::Param) -> Result<Self::Output, Error> {
        self.eq.determinant(*s).map_err(Error::from)
    }
}

// ---- Helper Methods ----

fn polish_with_brent(
    eq: &DeterminantEq, interval: &RootInterval, opts: &RootOptions,
) -> LikelihoodResult<f64> {
    let tol = opts.tolerance * scale(interval.lower, interval.upper);
    let solver = BrentRoot::new(interval.lower, interval.upper, tol);
    let mut executor = Executor::new(DeterminantProblem { eq }, solver);
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    executor = executor.configure(|state| state.max_iters(opts.max_iter));

    let result = executor.run()?;
    let state = result.state();
    let root = state.get_best_param().or(state.get_param()).copied().ok_or(
        LikelihoodError::RootBracketFailed {
            bound: interval.midpoint(),
            count: 0,
            expected: interval.multiplicity,
        },
    )?;
    if root < interval.lower || root > interval.upper || !root.is_finite() {
        return Err(LikelihoodError::NonFiniteResult { context: "Brent root outside bracket" });
    }
    Ok(root)
}

/// Narrow a single-root interval by bisection on the counting function.
fn bisect_counts(
    eq: &DeterminantEq, interval: RootInterval, opts: &RootOptions, svd: &SvdOptions,
) -> LikelihoodResult<f64> {
    let count_lo = count_roots_below(eq, interval.lower, svd)?;
    let (mut lo, mut hi) = (interval.lower, interval.upper);
    for _ in 0..opts.max_iter {
        if is_resolved(lo, hi, opts.tolerance) {
            break;
        }
        let mid = 0.5 * (lo + hi);
        if count_roots_below(eq, mid, svd)? > count_lo {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}

fn upper_bound(eq: &DeterminantEq, opts: &RootOptions, svd: &SvdOptions) -> LikelihoodResult<f64> {
    let expected = eq.size();
    let mut bound = 0.0_f64;
    let mut count = count_roots_below(eq, bound, svd)?;
    for _ in 0..opts.max_iter {
        if count == expected {
            return Ok(bound);
        }
        bound = if bound == 0.0 { 1.0 } else { 2.0 * bound };
        count = count_roots_below(eq, bound, svd)?;
    }
    if count == expected {
        return Ok(bound);
    }
    Err(LikelihoodError::RootBracketFailed { bound, count, expected })
}

fn lower_bound(eq: &DeterminantEq, opts: &RootOptions, svd: &SvdOptions) -> LikelihoodResult<f64> {
    let mut bound = -1.0_f64;
    let mut count = count_roots_below(eq, bound, svd)?;
    for _ in 0..opts.max_iter {
        if count == 0 {
            return Ok(bound);
        }
        bound *= 2.0;
        count = count_roots_below(eq, bound, svd)?;
    }
    if count == 0 {
        return Ok(bound);
    }
    Err(LikelihoodError::RootBracketFailed { bound, count, expected: 0 })
}

fn scale(lower: f64, upper: f64) -> f64 {
    lower.abs().max(upper.abs()).max(1.0)
}

fn is_resolved(lower: f64, upper: f64, tolerance: f64) -> bool {
    upper - lower <= tolerance * scale(lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::qmatrix::QMatrix;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Root counting against the scalar two-state case.
    // - Root count equals block size and W(s_i) is singular.
    // - Error mapping for an impossible iteration budget.
    // -------------------------------------------------------------------------

    fn three_state() -> QMatrix {
        // Detailed balance with π = (0.2, 0.3, 0.5).
        QMatrix::new(array![[-5.5, 3.0, 2.5], [2.0, -5.0, 3.0], [1.0, 1.8, -2.8]], 2).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // A one-state class has exactly one root; for τ → small it sits near
    // −a (the ideal exit rate), and det W vanishes there.
    //
    // Given
    // -----
    // - Q = [[−2, 2], [5, −5]], τ = 0.01.
    //
    // Expect
    // ------
    // - One root in (−2, 0), det W(root) ≈ 0, count below root − ε is 0.
    fn single_open_state_has_one_root() {
        let q = QMatrix::new(array![[-2.0, 2.0], [5.0, -5.0]], 1).unwrap();
        let eq = DeterminantEq::new(&q, 0.01).unwrap();
        let svd = SvdOptions::default();

        let roots = find_roots(&eq, &RootOptions::default(), &svd).unwrap();

        assert_eq!(roots.len(), 1);
        assert!(roots[0] < 0.0 && roots[0] > -2.0);
        assert_relative_eq!(eq.determinant(roots[0]).unwrap(), 0.0, epsilon = 1e-9);
        assert_eq!(count_roots_below(&eq, roots[0] - 1e-3, &svd).unwrap(), 0);
        assert_eq!(count_roots_below(&eq, roots[0] + 1e-3, &svd).unwrap(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Both directions of a three-state chain yield block-size many negative
    // roots at which W(s) is numerically singular.
    //
    // Given
    // -----
    // - Three-state chain with two open states, τ = 0.05.
    //
    // Expect
    // ------
    // - 2 roots for AF, 1 for FA, each with |det W| tiny relative to the
    //   determinant scale and smallest singular value ≈ 0.
    fn root_count_matches_block_size() {
        let eq = DeterminantEq::new(&three_state(), 0.05).unwrap();
        let opts = RootOptions::default();
        let svd = SvdOptions::default();

        for (direction, size) in [(eq.clone(), 2_usize), (eq.transpose(), 1_usize)] {
            let roots = find_roots(&direction, &opts, &svd).unwrap();
            assert_eq!(roots.len(), size);
            for root in roots {
                assert!(root < 0.0);
                let w = direction.w(root).unwrap();
                let smallest = w.singular_values().iter().copied().fold(f64::INFINITY, f64::min);
                assert!(smallest < 1e-8, "smallest singular value {smallest}");
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure an exhausted bracketing budget surfaces as an error.
    //
    // Given
    // -----
    // - Rates of order 1e6 and `max_iter = 1`, so one doubling from −1 is
    //   not enough to clear every root.
    //
    // Expect
    // ------
    // - `RootBracketFailed`.
    fn tiny_budget_fails_to_bracket() {
        let q = QMatrix::new(array![[-1e6, 1e6], [1e6, -1e6]], 1).unwrap();
        let eq = DeterminantEq::new(&q, 1e-7).unwrap();
        let opts = RootOptions::new(1e-12, 1, false).unwrap();

        let err = find_roots(&eq, &opts, &SvdOptions::default()).unwrap_err();

        assert!(matches!(err, LikelihoodError::RootBracketFailed { .. }));
    }
}
