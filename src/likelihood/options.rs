//! likelihood::options — validated configuration for solvers and root search.
//!
//! Purpose
//! -------
//! Collect the handful of numerical knobs the likelihood layer exposes:
//! SVD thresholds for the least-squares and null-space solves, the root
//! search tolerance/iteration budget, and the exact-vs-asymptotic switch-over
//! used by [`MissedEventsG`](crate::likelihood::missed_events::MissedEventsG).
//!
//! Conventions
//! -----------
//! - Every options type has public fields, a validating `new(...)` returning
//!   [`LikelihoodResult`], and a `Default` matching the documented baseline.
//! - There is no environment or file configuration; callers construct these
//!   values explicitly.
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};

/// Default absolute tolerance (relative to the bracket scale) for roots of
/// `det W(s) = 0`.
pub const DEFAULT_ROOT_TOL: f64 = 1e-12;

/// Default iteration budget for Brent polishing and bisection fallbacks.
pub const DEFAULT_ROOT_MAX_ITER: u64 = 100;

/// Default number of dead-time periods evaluated with the exact survivor
/// before switching to the asymptotic expansion.
pub const DEFAULT_NMAX: usize = 2;

/// Default iteration cap for SVD and Schur decompositions.
pub const DEFAULT_DECOMPOSITION_MAX_ITER: usize = 10_000;

/// SvdOptions — thresholds for SVD-based solves.
///
/// Fields
/// ------
/// - `eps`: `f64`
///   Convergence threshold for the SVD and the cut-off below which singular
///   values are treated as zero in least-squares solves.
/// - `max_iter`: `usize`
///   Iteration cap forwarded to `nalgebra`'s SVD and Schur routines; hitting
///   it surfaces as [`LikelihoodError::SvdDidNotConverge`] or
///   [`LikelihoodError::SchurDidNotConverge`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvdOptions {
    pub eps: f64,
    pub max_iter: usize,
}

impl SvdOptions {
    /// Construct validated SVD options.
    ///
    /// # Rules
    /// - `eps` must be finite and strictly positive.
    /// - `max_iter` must be `> 0`.
    pub fn new(eps: f64, max_iter: usize) -> LikelihoodResult<Self> {
        if !eps.is_finite() || eps <= 0.0 {
            return Err(LikelihoodError::InvalidSvdEps {
                eps,
                reason: "SVD threshold must be finite and greater than zero.",
            });
        }
        if max_iter == 0 {
            return Err(LikelihoodError::InvalidMaxIter {
                max_iter,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { eps, max_iter })
    }
}

impl Default for SvdOptions {
    fn default() -> Self {
        Self { eps: f64::EPSILON, max_iter: DEFAULT_DECOMPOSITION_MAX_ITER }
    }
}

/// RootOptions — configuration for the `det W(s) = 0` root search.
///
/// Fields
/// ------
/// - `tolerance`: `f64`
///   Relative width at which brackets stop being refined; scaled by
///   `max(|lower|, |upper|, 1)`.
/// - `max_iter`: `u64`
///   Iteration budget for each Brent run and each bisection fallback.
/// - `verbose`: `bool`
///   With the `obs_slog` feature, attaches a terminal slog observer to the
///   Brent runs. Ignored otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootOptions {
    pub tolerance: f64,
    pub max_iter: u64,
    pub verbose: bool,
}

impl RootOptions {
    /// Construct validated root-search options.
    ///
    /// # Rules
    /// - `tolerance` must be finite and strictly positive.
    /// - `max_iter` must be `> 0`.
    pub fn new(tolerance: f64, max_iter: u64, verbose: bool) -> LikelihoodResult<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(LikelihoodError::InvalidRootTolerance {
                tol: tolerance,
                reason: "Root tolerance must be finite and greater than zero.",
            });
        }
        if max_iter == 0 {
            return Err(LikelihoodError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tolerance, max_iter, verbose })
    }
}

impl Default for RootOptions {
    fn default() -> Self {
        Self { tolerance: DEFAULT_ROOT_TOL, max_iter: DEFAULT_ROOT_MAX_ITER, verbose: false }
    }
}

/// MissedEventsOptions — configuration for a missed-events chain.
///
/// Fields
/// ------
/// - `nmax`: `usize`
///   Survivor arguments `u < nmax·τ` use the exact recursion; larger
///   arguments use the asymptotic expansion.
/// - `roots`: [`RootOptions`]
///   Root search settings for both asymptotic directions.
/// - `svd`: [`SvdOptions`]
///   Thresholds for spectral projectors, null vectors and occupancy solves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissedEventsOptions {
    pub nmax: usize,
    pub roots: RootOptions,
    pub svd: SvdOptions,
}

impl MissedEventsOptions {
    /// Construct validated missed-events options.
    ///
    /// The nested option structs are validated by their own constructors;
    /// only `nmax >= 1` is checked here.
    pub fn new(nmax: usize, roots: RootOptions, svd: SvdOptions) -> LikelihoodResult<Self> {
        if nmax == 0 {
            return Err(LikelihoodError::InvalidNMax {
                nmax,
                reason: "At least one dead-time period must use the exact survivor.",
            });
        }
        Ok(Self { nmax, roots, svd })
    }
}

impl Default for MissedEventsOptions {
    fn default() -> Self {
        Self { nmax: DEFAULT_NMAX, roots: RootOptions::default(), svd: SvdOptions::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Defaults match the documented constants.
    // - Each validating constructor rejects its invalid inputs.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that defaults match the documented baseline configuration.
    //
    // Given
    // -----
    // - No inputs; call the `Default` impls.
    //
    // Expect
    // ------
    // - Constants are wired through unchanged and `verbose` is off.
    fn defaults_match_documented_constants() {
        let opts = MissedEventsOptions::default();

        assert_eq!(opts.nmax, DEFAULT_NMAX);
        assert_eq!(opts.roots.tolerance, DEFAULT_ROOT_TOL);
        assert_eq!(opts.roots.max_iter, DEFAULT_ROOT_MAX_ITER);
        assert!(!opts.roots.verbose);
        assert_eq!(opts.svd.eps, f64::EPSILON);
        assert_eq!(opts.svd.max_iter, DEFAULT_DECOMPOSITION_MAX_ITER);
    }

    #[test]
    // Purpose
    // -------
    // Ensure invalid tolerances and iteration budgets are rejected.
    //
    // Given
    // -----
    // - Non-positive and non-finite tolerances, zero iteration caps, nmax = 0.
    //
    // Expect
    // ------
    // - Each constructor returns the matching error variant.
    fn constructors_reject_invalid_values() {
        assert!(matches!(
            RootOptions::new(0.0, 10, false),
            Err(LikelihoodError::InvalidRootTolerance { .. })
        ));
        assert!(matches!(
            RootOptions::new(f64::NAN, 10, false),
            Err(LikelihoodError::InvalidRootTolerance { .. })
        ));
        assert!(matches!(
            RootOptions::new(1e-10, 0, false),
            Err(LikelihoodError::InvalidMaxIter { .. })
        ));
        assert!(matches!(SvdOptions::new(-1.0, 10), Err(LikelihoodError::InvalidSvdEps { .. })));
        assert!(matches!(SvdOptions::new(1e-12, 0), Err(LikelihoodError::InvalidMaxIter { .. })));
        assert!(matches!(
            MissedEventsOptions::new(0, RootOptions::default(), SvdOptions::default()),
            Err(LikelihoodError::InvalidNMax { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Check that valid inputs are stored without normalization.
    //
    // Given
    // -----
    // - Explicit tolerance, iteration cap and verbosity.
    //
    // Expect
    // ------
    // - Fields equal the inputs.
    fn root_options_new_preserves_fields() {
        let opts = RootOptions::new(1e-9, 42, true).unwrap();

        assert_eq!(opts.tolerance, 1e-9);
        assert_eq!(opts.max_iter, 42);
        assert!(opts.verbose);
    }
}
