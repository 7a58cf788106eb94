//! Shared numerical tolerances.
//!
//! All tolerances are relative: callers scale them by the largest absolute
//! entry (or eigenvalue) of the matrix they are checking, floored at 1.

/// Relative tolerance on generator row sums.
///
/// A row passes when `|Σ_j q_ij| <= GENERATOR_TOL · max(1, max_j |q_ij|)`.
pub const GENERATOR_TOL: f64 = 1e-8;

/// Relative bound on the imaginary part of an eigenvalue treated as real.
pub const IMAGINARY_TOL: f64 = 1e-8;

/// Relative separation below which two eigenvalues are considered equal.
pub const DEGENERACY_TOL: f64 = 1e-10;

/// Bound on `|wᵀv|` for unit left/right null vectors; smaller overlaps mean
/// the eigenvalue is defective.
pub const OVERLAP_TOL: f64 = 1e-12;

/// Scale used by the relative tolerances: `max(1, max |entry|)`.
pub fn tolerance_scale<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().fold(1.0_f64, |acc, v| acc.max(v.abs()))
}
