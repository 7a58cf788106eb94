//! Errors for missed-events likelihood computations (generator validation,
//! survivor recursion, occupancy solves, root search and options checks).
//!
//! This module defines the crate-wide error type, [`LikelihoodError`], and the
//! result alias [`LikelihoodResult`]. Both the exact survivor engine and the
//! occupancy solver report failures exclusively through this type.
//!
//! ## Conventions
//! - **Indices are 0-based**; open states come first in every partition.
//! - Precondition violations (shape, partition, τ, negative times, recursion
//!   indices) and numerical failures (non-convergent decompositions,
//!   degenerate spectra, zero normalizations) are separate variant groups so
//!   callers can reject a degenerate generator without string matching.
//! - `argmin` backend errors raised while polishing roots are normalized to
//!   the `Argmin*`/[`LikelihoodError::BackendError`] variants.
use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for operations that may produce [`LikelihoodError`].
pub type LikelihoodResult<T> = Result<T, LikelihoodError>;

/// Unified error type for missed-events likelihood computations.
///
/// Covers generator/partition validation, survivor and recursion
/// preconditions, numerical breakdowns of the dense linear algebra, root
/// search failures and option validation. Every failure is all-or-nothing:
/// no partial matrix or vector is ever returned alongside an error.
#[derive(Debug, Clone, PartialEq)]
pub enum LikelihoodError {
    // ---- Generator / partition validation ----
    /// Matrix is not square.
    NotSquare { rows: usize, cols: usize },

    /// Partition boundary must satisfy 1 <= nopen < nstates.
    InvalidNOpen { nopen: usize, nstates: usize },

    /// Matrix entry is NaN/±inf.
    NonFiniteEntry { row: usize, col: usize, value: f64 },

    /// Off-diagonal transition rates must be non-negative.
    InvalidRate { row: usize, col: usize, value: f64 },

    /// Generator rows must sum to zero.
    RowSumNotZero { row: usize, sum: f64 },

    /// Matrix dimensions do not match the partition they are used with.
    DimensionMismatch { expected: (usize, usize), found: (usize, usize) },

    // ---- Survivor / recursion preconditions ----
    /// Dead-time must be finite and > 0.
    InvalidTau { value: f64 },

    /// Query times must be finite and >= 0.
    NegativeTime { value: f64 },

    /// Critical time must be finite and > 0.
    InvalidTcrit { value: f64 },

    /// Eigenvalue or component index beyond the available range.
    IndexOutOfRange { index: usize, len: usize },

    /// Recursion coefficient requested outside 0 <= l <= m, i < n (or m = 0
    /// outside the base case).
    InvalidRecursionIndex { i: usize, m: usize, l: usize },

    // ---- Numerical failures ----
    /// A linear solve met a singular (or numerically singular) matrix.
    SingularMatrix { context: &'static str },

    /// SVD did not converge within the iteration budget.
    SvdDidNotConverge { rows: usize, cols: usize },

    /// SVD-based least-squares solve failed.
    LeastSquaresFailed { reason: &'static str },

    /// Real Schur decomposition did not converge.
    SchurDidNotConverge { dim: usize },

    /// Eigen-decomposition produced a NaN/±inf eigenvalue.
    NonFiniteEigenvalue { index: usize, value: f64 },

    /// Eigenvalue has a non-negligible imaginary part.
    ComplexEigenvalue { index: usize, re: f64, im: f64 },

    /// Two eigenvalues coincide within tolerance.
    DegenerateEigenvalues { first: usize, second: usize, value: f64 },

    /// Left/right null vectors are (numerically) orthogonal.
    DefectiveEigenvector { index: usize, overlap: f64 },

    /// Computation produced a non-finite matrix or vector entry.
    NonFiniteResult { context: &'static str },

    /// Normalizing sum is zero or non-finite.
    ZeroNormalization { sum: f64 },

    // ---- Root search ----
    /// Could not bracket all roots of det W(s) = 0.
    RootBracketFailed { bound: f64, count: usize, expected: usize },

    /// Root counts are inconsistent across a bracket.
    RootCountMismatch { lower: usize, upper: usize },

    /// Asymptotic roots must be strictly negative.
    NonNegativeRoot { index: usize, root: f64 },

    // ---- Options validation ----
    /// Root tolerance needs to be positive and finite.
    InvalidRootTolerance { tol: f64, reason: &'static str },

    /// Maximum iterations needs to be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// Exact/asymptotic switch-over needs at least one dead-time period.
    InvalidNMax { nmax: usize, reason: &'static str },

    /// SVD threshold needs to be positive and finite.
    InvalidSvdEps { eps: f64, reason: &'static str },

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    ArgminInvalidParameter { text: String },

    /// Wrapper for argmin::ConditionViolated
    ArgminConditionViolated { text: String },

    /// Wrapper for argmin::PotentialBug
    ArgminPotentialBug { text: String },

    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for LikelihoodError {}

impl std::fmt::Display for LikelihoodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Generator / partition validation ----
            LikelihoodError::NotSquare { rows, cols } => {
                write!(f, "Matrix must be square; got {rows} x {cols}")
            }
            LikelihoodError::InvalidNOpen { nopen, nstates } => {
                write!(f, "Number of open states must satisfy 1 <= nopen < {nstates}; got {nopen}")
            }
            LikelihoodError::NonFiniteEntry { row, col, value } => {
                write!(f, "Matrix entry ({row}, {col}) is non-finite: {value}")
            }
            LikelihoodError::InvalidRate { row, col, value } => {
                write!(f, "Transition rate ({row}, {col}) must be non-negative; got {value}")
            }
            LikelihoodError::RowSumNotZero { row, sum } => {
                write!(f, "Generator row {row} must sum to zero; got {sum}")
            }
            LikelihoodError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {expected:?}, found {found:?}")
            }
            // ---- Survivor / recursion preconditions ----
            LikelihoodError::InvalidTau { value } => {
                write!(f, "Dead-time tau must be finite and > 0; got {value}")
            }
            LikelihoodError::NegativeTime { value } => {
                write!(f, "Time must be finite and >= 0; got {value}")
            }
            LikelihoodError::InvalidTcrit { value } => {
                write!(f, "Critical time tcrit must be finite and > 0; got {value}")
            }
            LikelihoodError::IndexOutOfRange { index, len } => {
                write!(f, "Index {index} out of range for length {len}")
            }
            LikelihoodError::InvalidRecursionIndex { i, m, l } => {
                write!(f, "Invalid recursion index (i = {i}, m = {m}, l = {l})")
            }
            // ---- Numerical failures ----
            LikelihoodError::SingularMatrix { context } => {
                write!(f, "Singular matrix encountered while computing {context}")
            }
            LikelihoodError::SvdDidNotConverge { rows, cols } => {
                write!(f, "SVD of a {rows} x {cols} matrix did not converge")
            }
            LikelihoodError::LeastSquaresFailed { reason } => {
                write!(f, "Least-squares solve failed: {reason}")
            }
            LikelihoodError::SchurDidNotConverge { dim } => {
                write!(f, "Schur decomposition of a {dim} x {dim} matrix did not converge")
            }
            LikelihoodError::NonFiniteEigenvalue { index, value } => {
                write!(f, "Eigenvalue {index} is non-finite: {value}")
            }
            LikelihoodError::ComplexEigenvalue { index, re, im } => {
                write!(f, "Eigenvalue {index} is complex: {re} + {im}i")
            }
            LikelihoodError::DegenerateEigenvalues { first, second, value } => {
                write!(f, "Eigenvalues {first} and {second} coincide at {value}")
            }
            LikelihoodError::DefectiveEigenvector { index, overlap } => {
                write!(f, "Left and right null vectors {index} are orthogonal (overlap {overlap})")
            }
            LikelihoodError::NonFiniteResult { context } => {
                write!(f, "Non-finite values produced while computing {context}")
            }
            LikelihoodError::ZeroNormalization { sum } => {
                write!(f, "Cannot normalize vector with sum {sum}")
            }
            // ---- Root search ----
            LikelihoodError::RootBracketFailed { bound, count, expected } => {
                write!(
                    f,
                    "Could not bracket roots of det W(s): {count} of {expected} roots below {bound}"
                )
            }
            LikelihoodError::RootCountMismatch { lower, upper } => {
                write!(f, "Root counts decrease across bracket: {lower} at lower, {upper} at upper")
            }
            LikelihoodError::NonNegativeRoot { index, root } => {
                write!(f, "Asymptotic root {index} must be negative; got {root}")
            }
            // ---- Options validation ----
            LikelihoodError::InvalidRootTolerance { tol, reason } => {
                write!(f, "Invalid root tolerance {tol}: {reason}")
            }
            LikelihoodError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            LikelihoodError::InvalidNMax { nmax, reason } => {
                write!(f, "Invalid nmax {nmax}: {reason}")
            }
            LikelihoodError::InvalidSvdEps { eps, reason } => {
                write!(f, "Invalid SVD threshold {eps}: {reason}")
            }
            // ---- Argmin ----
            LikelihoodError::ArgminInvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            LikelihoodError::ArgminConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            LikelihoodError::ArgminPotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            LikelihoodError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }
            // ---- Fallback ----
            LikelihoodError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl LikelihoodError {
    /// Whether the error signals a numerically degenerate generator rather
    /// than a caller precondition violation.
    ///
    /// Callers that draw random generators use this to discard and redraw
    /// inputs the dense linear algebra cannot handle.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            LikelihoodError::SingularMatrix { .. }
                | LikelihoodError::SvdDidNotConverge { .. }
                | LikelihoodError::LeastSquaresFailed { .. }
                | LikelihoodError::SchurDidNotConverge { .. }
                | LikelihoodError::NonFiniteEigenvalue { .. }
                | LikelihoodError::ComplexEigenvalue { .. }
                | LikelihoodError::DegenerateEigenvalues { .. }
                | LikelihoodError::DefectiveEigenvector { .. }
                | LikelihoodError::NonFiniteResult { .. }
                | LikelihoodError::ZeroNormalization { .. }
                | LikelihoodError::RootBracketFailed { .. }
                | LikelihoodError::RootCountMismatch { .. }
                | LikelihoodError::NonNegativeRoot { .. }
        )
    }
}

impl From<Error> for LikelihoodError {
    fn from(original_err: Error) -> Self {
        // Errors raised by our own cost functions come back unchanged.
        let original_err = match original_err.downcast::<LikelihoodError>() {
            Ok(own) => return own,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => {
                    LikelihoodError::ArgminInvalidParameter { text }
                }
                ArgminError::ConditionViolated { text } => {
                    LikelihoodError::ArgminConditionViolated { text }
                }
                ArgminError::PotentialBug { text } => LikelihoodError::ArgminPotentialBug { text },
                _ => LikelihoodError::UnknownError,
            },
            Err(err) => LikelihoodError::BackendError { text: err.to_string() },
        }
    }
}
