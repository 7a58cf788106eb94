//! numerics::spectral — eigenvalues, null vectors and spectral projectors.
//!
//! Purpose
//! -------
//! Provide the small amount of eigen-analysis the survivor engines need on
//! top of `nalgebra`, which offers a general real Schur decomposition but no
//! eigenvectors for non-symmetric matrices:
//!
//! - eigenvalues from [`nalgebra::Schur`], checked to be real and finite,
//! - right/left null vectors of `M − μI` from an SVD (smallest singular
//!   value),
//! - spectral projectors `A_i = v_i w_iᵀ / (w_iᵀ v_i)` so that
//!   `e^{Mt} = Σ_i A_i e^{μ_i t}` for diagonalizable `M`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are square; callers validate shapes upstream.
//! - Projectors are only meaningful for simple (non-repeated) eigenvalues;
//!   [`check_distinct`] rejects coinciding eigenvalues first.
//! - Eigenvalue vectors are returned sorted ascending so downstream indices
//!   are deterministic.
use crate::{
    likelihood::{
        errors::{LikelihoodError, LikelihoodResult},
        options::SvdOptions,
    },
    numerics::tolerances::{DEGENERACY_TOL, IMAGINARY_TOL, OVERLAP_TOL, tolerance_scale},
};
use nalgebra::{DMatrix, DVector, SVD, Schur};

/// Real parts of all eigenvalues of `matrix`, sorted ascending.
///
/// Complex pairs are allowed here; this is the variant used for counting
/// eigenvalues below a threshold.
///
/// # Errors
/// - [`LikelihoodError::SchurDidNotConverge`] if the Schur iteration hits
///   `opts.max_iter`.
/// - [`LikelihoodError::NonFiniteEigenvalue`] for NaN/±inf real parts.
pub fn eigenvalue_real_parts(
    matrix: &DMatrix<f64>, opts: &SvdOptions,
) -> LikelihoodResult<Vec<f64>> {
    let schur = Schur::try_new(matrix.clone(), opts.eps, opts.max_iter)
        .ok_or(LikelihoodError::SchurDidNotConverge { dim: matrix.nrows() })?;
    let mut values = Vec::with_capacity(matrix.nrows());
    for (index, z) in schur.complex_eigenvalues().iter().enumerate() {
        if !z.re.is_finite() || !z.im.is_finite() {
            return Err(LikelihoodError::NonFiniteEigenvalue { index, value: z.re });
        }
        values.push(z.re);
    }
    values.sort_by(|a, b| a.total_cmp(b));
    Ok(values)
}

/// Eigenvalues of `matrix`, required to be real, sorted ascending.
///
/// # Errors
/// - Everything [`eigenvalue_real_parts`] reports.
/// - [`LikelihoodError::ComplexEigenvalue`] when an imaginary part exceeds
///   `IMAGINARY_TOL` relative to the spectral scale.
pub fn real_eigenvalues(matrix: &DMatrix<f64>, opts: &SvdOptions) -> LikelihoodResult<Vec<f64>> {
    let schur = Schur::try_new(matrix.clone(), opts.eps, opts.max_iter)
        .ok_or(LikelihoodError::SchurDidNotConverge { dim: matrix.nrows() })?;
    let eigenvalues = schur.complex_eigenvalues();
    let scale = tolerance_scale(eigenvalues.iter().map(|z| z.re));

    let mut values = Vec::with_capacity(eigenvalues.len());
    for (index, z) in eigenvalues.iter().enumerate() {
        if !z.re.is_finite() || !z.im.is_finite() {
            return Err(LikelihoodError::NonFiniteEigenvalue { index, value: z.re });
        }
        if z.im.abs() > IMAGINARY_TOL * scale {
            return Err(LikelihoodError::ComplexEigenvalue { index, re: z.re, im: z.im });
        }
        values.push(z.re);
    }
    values.sort_by(|a, b| a.total_cmp(b));
    Ok(values)
}

/// Reject eigenvalue sets with two members closer than `DEGENERACY_TOL`
/// (relative to the largest magnitude).
pub fn check_distinct(values: &[f64]) -> LikelihoodResult<()> {
    let scale = tolerance_scale(values.iter().copied());
    for (first, a) in values.iter().enumerate() {
        for (offset, b) in values[first + 1..].iter().enumerate() {
            if (a - b).abs() <= DEGENERACY_TOL * scale {
                return Err(LikelihoodError::DegenerateEigenvalues {
                    first,
                    second: first + 1 + offset,
                    value: *a,
                });
            }
        }
    }
    Ok(())
}

/// Unit vector `v` minimizing `‖M v‖`, i.e. the right singular vector of
/// the smallest singular value.
///
/// For a numerically singular `M` this is its (right) null vector. Apply to
/// `Mᵀ` for the left null vector.
///
/// # Errors
/// - [`LikelihoodError::SvdDidNotConverge`] if the SVD hits the iteration cap.
/// - [`LikelihoodError::LeastSquaresFailed`] if `Vᵀ` was not produced.
pub fn right_null_vector(
    matrix: &DMatrix<f64>, opts: &SvdOptions,
) -> LikelihoodResult<DVector<f64>> {
    let (rows, cols) = matrix.shape();
    let svd = SVD::try_new(matrix.clone(), false, true, opts.eps, opts.max_iter)
        .ok_or(LikelihoodError::SvdDidNotConverge { rows, cols })?;
    let v_t = svd
        .v_t
        .ok_or(LikelihoodError::LeastSquaresFailed { reason: "SVD did not return V^T." })?;

    let mut smallest = 0;
    for (index, value) in svd.singular_values.iter().enumerate() {
        if *value < svd.singular_values[smallest] {
            smallest = index;
        }
    }
    Ok(v_t.row(smallest).transpose())
}

/// Spectral projectors of `generator` for the given (distinct, real)
/// eigenvalues.
///
/// Parameters
/// ----------
/// - `generator`: square matrix `M`.
/// - `eigenvalues`: eigenvalues `μ_i` of `M`, as returned by
///   [`real_eigenvalues`].
///
/// Returns
/// -------
/// `Vec<DMatrix<f64>>` with `A_i = v_i w_iᵀ / (w_iᵀ v_i)`, where `v_i`/`w_i`
/// are the right/left null vectors of `M − μ_i I`. For a diagonalizable `M`
/// the projectors sum to the identity and `A_i A_j = δ_ij A_i`.
///
/// Errors
/// ------
/// - SVD failures from [`right_null_vector`].
/// - [`LikelihoodError::DefectiveEigenvector`] when `|w_iᵀ v_i|` falls below
///   `OVERLAP_TOL`.
pub fn spectral_projectors(
    generator: &DMatrix<f64>, eigenvalues: &[f64], opts: &SvdOptions,
) -> LikelihoodResult<Vec<DMatrix<f64>>> {
    let n = generator.nrows();
    let mut projectors = Vec::with_capacity(eigenvalues.len());
    for (index, &mu) in eigenvalues.iter().enumerate() {
        let shifted = generator - DMatrix::<f64>::identity(n, n) * mu;
        let right = right_null_vector(&shifted, opts)?;
        let left = right_null_vector(&shifted.transpose(), opts)?;
        let overlap = left.dot(&right);
        if !overlap.is_finite() || overlap.abs() < OVERLAP_TOL {
            return Err(LikelihoodError::DefectiveEigenvector { index, overlap });
        }
        projectors.push(&right * left.transpose() / overlap);
    }
    Ok(projectors)
}
