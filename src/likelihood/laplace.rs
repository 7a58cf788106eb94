//! likelihood::laplace — Laplace-domain open/shut transition blocks.
//!
//! Purpose
//! -------
//! Define the capability shared by the ideal and missed-events chains: the
//! Laplace transforms `laplace_af(s)` and `laplace_fa(s)` of the densities
//! for leaving one aggregate class and entering the other. At `s = 0` these
//! are the one-step transition matrices between classes, which is all the
//! occupancy solver needs.
//!
//! Key behaviors
//! -------------
//! - [`LaplaceBlocks`] is the trait consumed by the generic solvers in
//!   [`occupancies`](crate::likelihood::occupancies).
//! - [`IdealG`] implements it for the uncorrected chain:
//!   `laplace_af(s) = (sI − Q_AA)^{-1} Q_AF`, `laplace_fa(s) = (sI − Q_FF)^{-1} Q_FA`.
//!
//! Conventions
//! -----------
//! - `s` is real. Linear solves use LU; no explicit inverse is formed.
use crate::{
    likelihood::{
        errors::{LikelihoodError, LikelihoodResult},
        qmatrix::{Blocks, QMatrix},
    },
    numerics::{
        bridge::{all_finite, to_array2},
        integrals::exp_scaled,
    },
};
use nalgebra::DMatrix;
use ndarray::Array2;

/// Laplace-domain transition blocks of a two-class chain.
///
/// Implementors return `nopen × nshut` matrices from [`laplace_af`] and
/// `nshut × nopen` matrices from [`laplace_fa`].
///
/// [`laplace_af`]: LaplaceBlocks::laplace_af
/// [`laplace_fa`]: LaplaceBlocks::laplace_fa
pub trait LaplaceBlocks {
    fn nopen(&self) -> usize;

    fn nshut(&self) -> usize;

    /// Laplace transform of the open → shut transition density at `s`.
    fn laplace_af(&self, s: f64) -> LikelihoodResult<Array2<f64>>;

    /// Laplace transform of the shut → open transition density at `s`.
    fn laplace_fa(&self, s: f64) -> LikelihoodResult<Array2<f64>>;
}

/// IdealG — the chain observed with perfect time resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct IdealG {
    qmatrix: QMatrix,
    blocks: Blocks,
}

impl IdealG {
    pub fn new(qmatrix: QMatrix) -> Self {
        let blocks = qmatrix.blocks();
        Self { qmatrix, blocks }
    }

    /// Validate `matrix`/`nopen` through [`QMatrix::new`] and wrap it.
    pub fn from_matrix(matrix: Array2<f64>, nopen: usize) -> LikelihoodResult<Self> {
        Ok(Self::new(QMatrix::new(matrix, nopen)?))
    }

    pub fn qmatrix(&self) -> &QMatrix {
        &self.qmatrix
    }

    /// Open-time density matrix `e^{Q_AA t} Q_AF`.
    ///
    /// # Errors
    /// - [`LikelihoodError::NegativeTime`] for `t < 0` or non-finite `t`.
    pub fn af(&self, t: f64) -> LikelihoodResult<Array2<f64>> {
        check_time(t)?;
        Ok(to_array2(&(exp_scaled(&self.blocks.aa, t)? * &self.blocks.af)))
    }

    /// Shut-time density matrix `e^{Q_FF t} Q_FA`.
    ///
    /// # Errors
    /// - [`LikelihoodError::NegativeTime`] for `t < 0` or non-finite `t`.
    pub fn fa(&self, t: f64) -> LikelihoodResult<Array2<f64>> {
        check_time(t)?;
        Ok(to_array2(&(exp_scaled(&self.blocks.ff, t)? * &self.blocks.fa)))
    }
}

impl LaplaceBlocks for IdealG {
    fn nopen(&self) -> usize {
        self.qmatrix.nopen()
    }

    fn nshut(&self) -> usize {
        self.qmatrix.nshut()
    }

    fn laplace_af(&self, s: f64) -> LikelihoodResult<Array2<f64>> {
        resolvent_times(&self.blocks.aa, &self.blocks.af, s).map(|m| to_array2(&m))
    }

    fn laplace_fa(&self, s: f64) -> LikelihoodResult<Array2<f64>> {
        resolvent_times(&self.blocks.ff, &self.blocks.fa, s).map(|m| to_array2(&m))
    }
}

// ---- Helper Methods ----

/// `(sI − diag_block)^{-1} off_block` by LU.
fn resolvent_times(
    diag_block: &DMatrix<f64>, off_block: &DMatrix<f64>, s: f64,
) -> LikelihoodResult<DMatrix<f64>> {
    let k = diag_block.nrows();
    let system = DMatrix::<f64>::identity(k, k) * s - diag_block;
    let solved = system
        .lu()
        .solve(off_block)
        .ok_or(LikelihoodError::SingularMatrix { context: "sI - Q_XX" })?;
    if !all_finite(&solved) {
        return Err(LikelihoodError::NonFiniteResult { context: "ideal Laplace block" });
    }
    Ok(solved)
}

pub(crate) fn check_time(t: f64) -> LikelihoodResult<()> {
    if !t.is_finite() || t < 0.0 {
        return Err(LikelihoodError::NegativeTime { value: t });
    }
    Ok(())
}
