//! likelihood::occupancies — equilibrium and occupancy probability vectors.
//!
//! Purpose
//! -------
//! Compute the distributions over open (or shut) states at the start of an
//! open (or shut) period, for the ideal and the missed-events chain, and the
//! CHS-corrected start/end vectors used when bursts are separated by gaps
//! longer than a critical time `tcrit`.
//!
//! Key behaviors
//! -------------
//! - [`stationary_vector`] solves `x = xM`, `Σx = 1` as the least-squares
//!   problem `[I − Mᵀ; 1ᵀ] xᵀ = [0; 1]` with an SVD, which tolerates the
//!   rank deficiency of `I − Mᵀ`.
//! - [`occupancies`] applies it to `M = G_AF(0) G_FA(0)` (open) or
//!   `M = G_FA(0) G_AF(0)` (shut) for any [`LaplaceBlocks`] chain;
//!   [`equilibrium`] is the same computation on the ideal chain.
//! - [`chs_occupancies`] weights shut occupancies by the CHS matrix
//!   `H_FA` ([`chs_matrix_hfa`]) for initial vectors, and returns the row
//!   sums of `H_FA` for final vectors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Returned probability vectors sum to one up to solver tolerance;
//!   entries are not clipped.
//! - A zero or non-finite CHS normalization is an error, never NaN.
//!
//! Conventions
//! -----------
//! - `open = true` selects the open-class vector (length `n_open`), and
//!   `false` the shut-class vector (length `n_shut`).
//! - For CHS vectors `initial = true` selects the normalized start vector
//!   (length `n_open`); `false` selects the end vector (length `n_shut`).
use crate::{
    likelihood::{
        errors::{LikelihoodError, LikelihoodResult},
        laplace::{IdealG, LaplaceBlocks},
        missed_events::MissedEventsG,
        options::SvdOptions,
    },
    numerics::bridge::{all_finite, column_to_array1, to_array2, to_dmatrix},
};
use nalgebra::{DMatrix, DVector, SVD};
use ndarray::{Array1, Array2, ArrayView2};

/// Stationary row vector of a square one-step operator.
///
/// Parameters
/// ----------
/// - `m`: `ArrayView2<f64>`
///   Square `n × n` matrix, typically a product of Laplace blocks at `s = 0`.
/// - `svd`: [`SvdOptions`]
///   Convergence threshold and iteration cap; `eps` is also the singular
///   value cut-off of the least-squares solve.
///
/// Returns
/// -------
/// `Array1<f64>` `x` of length `n` with `x ≈ xM` and `Σx ≈ 1`.
///
/// Errors
/// ------
/// - [`LikelihoodError::NotSquare`] for non-square input.
/// - [`LikelihoodError::SvdDidNotConverge`] / [`LikelihoodError::LeastSquaresFailed`]
///   from the SVD.
/// - [`LikelihoodError::NonFiniteResult`] if the solution is not finite.
pub fn stationary_vector(m: ArrayView2<'_, f64>, svd: &SvdOptions) -> LikelihoodResult<Array1<f64>> {
    stationary_dvector(&to_dmatrix(m), svd).map(|x| column_to_array1(&x))
}

/// Equilibrium vector of the ideal chain; identical to
/// `occupancies(idealg, open)`.
pub fn equilibrium(idealg: &IdealG, open: bool) -> LikelihoodResult<Array1<f64>> {
    occupancies(idealg, open)
}

/// Occupancy vector of any chain exposing Laplace blocks, with default
/// SVD thresholds.
pub fn occupancies<G: LaplaceBlocks>(g: &G, open: bool) -> LikelihoodResult<Array1<f64>> {
    occupancies_with_options(g, open, &SvdOptions::default())
}

/// [`occupancies`] with explicit SVD thresholds.
///
/// # Errors
/// - Errors from `laplace_af(0)`/`laplace_fa(0)`.
/// - Errors from [`stationary_vector`].
pub fn occupancies_with_options<G: LaplaceBlocks>(
    g: &G, open: bool, svd: &SvdOptions,
) -> LikelihoodResult<Array1<f64>> {
    let af = g.laplace_af(0.0)?;
    let fa = g.laplace_fa(0.0)?;
    let m = if open { af.dot(&fa) } else { fa.dot(&af) };
    stationary_vector(m.view(), svd)
}

/// CHS matrix `H_FA` (`n_shut × n_open`).
///
/// `H_FA = Σ_i R^F_i Q_FA e^{Q_AA τ} e^{s_i (tcrit − τ)} / (−s_i)` over the
/// asymptotic FA components `(s_i, R^F_i)`: the probability of an apparent
/// shut time longer than `tcrit` starting in each shut state and ending in
/// each open state.
///
/// # Errors
/// - [`LikelihoodError::InvalidTcrit`] unless `tcrit` is finite and `> 0`.
/// - [`LikelihoodError::NonFiniteResult`] on overflow.
pub fn chs_matrix_hfa(g: &MissedEventsG, tcrit: f64) -> LikelihoodResult<Array2<f64>> {
    if !tcrit.is_finite() || tcrit <= 0.0 {
        return Err(LikelihoodError::InvalidTcrit { value: tcrit });
    }
    let asymptotic = g.asymptotic_fa();
    let (nshut, nopen) = (g.nshut(), g.nopen());
    let mut weighted = DMatrix::<f64>::zeros(nshut, nshut);
    for (root, residue) in asymptotic.roots().iter().zip(asymptotic.residues()) {
        weighted += residue * ((root * (tcrit - g.tau())).exp() / -root);
    }
    let hfa = weighted * g.tail_fa();
    if !all_finite(&hfa) || hfa.shape() != (nshut, nopen) {
        return Err(LikelihoodError::NonFiniteResult { context: "CHS matrix H_FA" });
    }
    Ok(to_array2(&hfa))
}

/// CHS-corrected initial (`initial = true`) or final vector.
///
/// Initial: `φ_F H_FA / (φ_F H_FA 1)` with `φ_F = occupancies(g, false)`.
/// Final: `H_FA 1`, not normalized.
///
/// # Errors
/// - Errors from [`chs_matrix_hfa`] and [`occupancies`].
/// - [`LikelihoodError::ZeroNormalization`] when `φ_F H_FA 1` is zero or
///   non-finite.
pub fn chs_occupancies(
    g: &MissedEventsG, tcrit: f64, initial: bool,
) -> LikelihoodResult<Array1<f64>> {
    let hfa = chs_matrix_hfa(g, tcrit)?;
    if !initial {
        return Ok(hfa.sum_axis(ndarray::Axis(1)));
    }
    let phi_f = occupancies_with_options(g, false, &g.options().svd)?;
    let weighted = phi_f.dot(&hfa);
    let sum = weighted.sum();
    if !sum.is_finite() || sum == 0.0 {
        return Err(LikelihoodError::ZeroNormalization { sum });
    }
    Ok(weighted / sum)
}

// ---- Helper Methods ----

fn stationary_dvector(m: &DMatrix<f64>, opts: &SvdOptions) -> LikelihoodResult<DVector<f64>> {
    let (rows, cols) = m.shape();
    if rows != cols {
        return Err(LikelihoodError::NotSquare { rows, cols });
    }
    let n = rows;
    let mut system = DMatrix::<f64>::zeros(n + 1, n);
    system.view_mut((0, 0), (n, n)).copy_from(&(DMatrix::<f64>::identity(n, n) - m.transpose()));
    system.row_mut(n).fill(1.0);
    let mut rhs = DVector::<f64>::zeros(n + 1);
    rhs[n] = 1.0;

    let svd = SVD::try_new(system, true, true, opts.eps, opts.max_iter)
        .ok_or(LikelihoodError::SvdDidNotConverge { rows: n + 1, cols: n })?;
    let solution =
        svd.solve(&rhs, opts.eps).map_err(|reason| LikelihoodError::LeastSquaresFailed { reason })?;
    if !all_finite(&solution) {
        return Err(LikelihoodError::NonFiniteResult { context: "stationary vector" });
    }
    Ok(solution)
}
