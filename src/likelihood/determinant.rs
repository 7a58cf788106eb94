//! likelihood::determinant — the HJC matrices `H(s)`, `W(s)` and `W'(s)`.
//!
//! Purpose
//! -------
//! For one direction of a missed-events chain (X = the class whose apparent
//! sojourn is being described, Y = the other class) and dead-time `τ`,
//! provide
//!
//! ```text
//!     H(s)  = Q_XX + Q_XY [∫_0^τ e^{(Q_YY − sI)t} dt] Q_YX
//!     W(s)  = sI − H(s)
//!     W'(s) = I + Q_XY [∫_0^τ t e^{(Q_YY − sI)t} dt] Q_YX
//! ```
//!
//! The zeros of `det W(s)` are the exponents of the asymptotic survivor
//! function and `W(s)^{-1}` enters the missed-events Laplace blocks.
//!
//! Conventions
//! -----------
//! - [`DeterminantEq::new`] builds the open (AF) direction; the shut (FA)
//!   direction is [`DeterminantEq::transpose`] or
//!   `DeterminantEq::new(&q.transpose(), τ)`.
//! - Values are `nalgebra::DMatrix` since every consumer keeps working in
//!   `nalgebra` space (root search, residues, Laplace blocks).
//! - Integrals use [`exp_integrals`]; `Q_YY − sI` is never inverted.
use crate::{
    likelihood::{
        errors::{LikelihoodError, LikelihoodResult},
        qmatrix::QMatrix,
    },
    numerics::integrals::{exp_integrals, exp_scaled},
};
use nalgebra::DMatrix;

/// DeterminantEq — `W(s)` for one direction of a missed-events chain.
#[derive(Debug, Clone, PartialEq)]
pub struct DeterminantEq {
    xx: DMatrix<f64>,
    xy: DMatrix<f64>,
    yx: DMatrix<f64>,
    yy: DMatrix<f64>,
    tau: f64,
}

impl DeterminantEq {
    /// Open-direction equation for `qmatrix` with dead-time `tau`.
    ///
    /// # Errors
    /// - [`LikelihoodError::InvalidTau`] unless `tau` is finite and `> 0`.
    pub fn new(qmatrix: &QMatrix, tau: f64) -> LikelihoodResult<Self> {
        check_tau(tau)?;
        let blocks = qmatrix.blocks();
        Ok(Self { xx: blocks.aa, xy: blocks.af, yx: blocks.fa, yy: blocks.ff, tau })
    }

    /// Same chain and `τ`, opposite direction.
    pub fn transpose(&self) -> Self {
        Self {
            xx: self.yy.clone(),
            xy: self.yx.clone(),
            yx: self.xy.clone(),
            yy: self.xx.clone(),
            tau: self.tau,
        }
    }

    /// Dimension of `W(s)` (size of class X).
    pub fn size(&self) -> usize {
        self.xx.nrows()
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// `Q_XY` block.
    pub fn q_xy(&self) -> &DMatrix<f64> {
        &self.xy
    }

    /// `Q_YX` block.
    pub fn q_yx(&self) -> &DMatrix<f64> {
        &self.yx
    }

    /// `e^{Q_YY τ}`: probability of staying within Y for a whole dead-time.
    pub fn exp_yy_tau(&self) -> LikelihoodResult<DMatrix<f64>> {
        exp_scaled(&self.yy, self.tau)
    }

    /// `e^{Q_XX τ}`.
    pub fn exp_xx_tau(&self) -> LikelihoodResult<DMatrix<f64>> {
        exp_scaled(&self.xx, self.tau)
    }

    /// `H(s)`.
    pub fn h(&self, s: f64) -> LikelihoodResult<DMatrix<f64>> {
        let integrals = exp_integrals(&self.shifted_yy(s), self.tau)?;
        Ok(&self.xx + &self.xy * integrals.integral * &self.yx)
    }

    /// `W(s) = sI − H(s)`.
    pub fn w(&self, s: f64) -> LikelihoodResult<DMatrix<f64>> {
        let k = self.size();
        Ok(DMatrix::<f64>::identity(k, k) * s - self.h(s)?)
    }

    /// `dW/ds`.
    pub fn w_derivative(&self, s: f64) -> LikelihoodResult<DMatrix<f64>> {
        let k = self.size();
        let integrals = exp_integrals(&self.shifted_yy(s), self.tau)?;
        Ok(DMatrix::<f64>::identity(k, k) + &self.xy * integrals.weighted * &self.yx)
    }

    /// `det W(s)`.
    pub fn determinant(&self, s: f64) -> LikelihoodResult<f64> {
        let det = self.w(s)?.determinant();
        if !det.is_finite() {
            return Err(LikelihoodError::NonFiniteResult { context: "det W(s)" });
        }
        Ok(det)
    }

    fn shifted_yy(&self, s: f64) -> DMatrix<f64> {
        let k = self.yy.nrows();
        &self.yy - DMatrix::<f64>::identity(k, k) * s
    }
}

pub(crate) fn check_tau(tau: f64) -> LikelihoodResult<()> {
    if !tau.is_finite() || tau <= 0.0 {
        return Err(LikelihoodError::InvalidTau { value: tau });
    }
    Ok(())
}
