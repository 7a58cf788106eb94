//! likelihood::exact_survivor — exact missed-events survivor functions.
//!
//! Purpose
//! -------
//! Compute `R_AF(t)` (probability of staying in the open class with no
//! detected shut sojourn, i.e. no shut sojourn longer than `τ`, up to `t`)
//! and its mirror `R_FA(t)` through the HJC (1990) recursion.
//!
//! Key behaviors
//! -------------
//! - [`ExactSurvivor`] owns two [`RecursionInterface`] values: AF built on
//!   the generator as given, FA built on its open/shut role swap.
//! - Eigenvalues and `D_i` matrices are computed when the value is built;
//!   coefficients are computed lazily and cached, which is why `af`/`fa`
//!   take `&mut self`.
//! - [`ExactSurvivor::set`] rebuilds both directions. On error the previous
//!   state is left untouched.
//!
//! Invariants & assumptions
//! ------------------------
//! - `τ > 0` and finite.
//! - The full generator must have real, distinct eigenvalues; reversible
//!   mechanisms always have real spectra.
//! - `af(t) = [e^{Qt}]_AA` for `0 <= t < τ`; in particular `af(0) = I`.
//!
//! Conventions
//! -----------
//! - Public results are `ndarray` arrays; coefficients are `n_open × n_open`
//!   for AF and `n_shut × n_shut` for FA.
//! - Values are move-only: there is no `Clone`.
//!
//! Testing notes
//! -------------
//! - `formula` tests the recursion on a scalar mock; `recursion` checks the
//!   projector sum rules; this module checks the survivor against matrix
//!   exponentials and a quadrature of the first convolution term.
pub mod formula;
pub mod recursion;

pub use self::formula::{RecursionElement, RecursionTerms, recursion_formula};
pub use self::recursion::RecursionInterface;

use crate::{
    likelihood::{
        determinant::check_tau,
        errors::LikelihoodResult,
        laplace::check_time,
        options::SvdOptions,
        qmatrix::QMatrix,
    },
    numerics::bridge::to_array2,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// ExactSurvivor — exact `R_AF(t)` and `R_FA(t)` for one generator and `τ`.
#[derive(Debug)]
pub struct ExactSurvivor {
    recursion_af: RecursionInterface,
    recursion_fa: RecursionInterface,
    tau: f64,
    svd: SvdOptions,
}

impl ExactSurvivor {
    /// Build both directions with default SVD thresholds.
    ///
    /// # Errors
    /// - [`LikelihoodError::InvalidTau`](crate::likelihood::errors::LikelihoodError::InvalidTau)
    ///   for non-finite or non-positive `tau`.
    /// - Numerical errors from [`RecursionInterface::new`].
    pub fn new(qmatrix: &QMatrix, tau: f64) -> LikelihoodResult<Self> {
        Self::with_options(qmatrix, tau, SvdOptions::default())
    }

    pub fn with_options(qmatrix: &QMatrix, tau: f64, svd: SvdOptions) -> LikelihoodResult<Self> {
        check_tau(tau)?;
        let recursion_af = RecursionInterface::new(qmatrix, tau, &svd)?;
        let recursion_fa = RecursionInterface::new(&qmatrix.transpose(), tau, &svd)?;
        Ok(Self { recursion_af, recursion_fa, tau, svd })
    }

    /// Validate a raw generator and build from it.
    pub fn from_matrix(matrix: Array2<f64>, nopen: usize, tau: f64) -> LikelihoodResult<Self> {
        Self::new(&QMatrix::new(matrix, nopen)?, tau)
    }

    /// Rebuild for a new generator and `τ`, discarding every cached
    /// coefficient. Nothing changes if the rebuild fails.
    pub fn set(&mut self, qmatrix: &QMatrix, tau: f64) -> LikelihoodResult<()> {
        *self = Self::with_options(qmatrix, tau, self.svd)?;
        Ok(())
    }

    /// `R_AF(t)`, `n_open × n_open`.
    ///
    /// # Errors
    /// - [`LikelihoodError::NegativeTime`](crate::likelihood::errors::LikelihoodError::NegativeTime)
    ///   for negative or non-finite `t`.
    pub fn af(&mut self, t: f64) -> LikelihoodResult<Array2<f64>> {
        self.af_matrix(t).map(|m| to_array2(&m))
    }

    /// `R_FA(t)`, `n_shut × n_shut`.
    pub fn fa(&mut self, t: f64) -> LikelihoodResult<Array2<f64>> {
        self.fa_matrix(t).map(|m| to_array2(&m))
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Coefficient `C_{iml}` of the AF recursion.
    pub fn recursion_af(&mut self, i: usize, m: usize, l: usize) -> LikelihoodResult<Array2<f64>> {
        self.recursion_af.get(i, m, l).map(|c| to_array2(&c))
    }

    /// Coefficient `C_{iml}` of the FA recursion.
    pub fn recursion_fa(&mut self, i: usize, m: usize, l: usize) -> LikelihoodResult<Array2<f64>> {
        self.recursion_fa.get(i, m, l).map(|c| to_array2(&c))
    }

    /// `D_i` of the AF recursion.
    pub fn d_af(&self, i: usize) -> LikelihoodResult<Array2<f64>> {
        self.recursion_af.d_value(i).map(to_array2)
    }

    /// `D_i` of the FA recursion.
    pub fn d_fa(&self, i: usize) -> LikelihoodResult<Array2<f64>> {
        self.recursion_fa.d_value(i).map(to_array2)
    }

    pub fn eigenvalues_af(&self) -> Array1<f64> {
        Array1::from(self.recursion_af.eigenvalues().to_vec())
    }

    pub fn eigenvalues_fa(&self) -> Array1<f64> {
        Array1::from(self.recursion_fa.eigenvalues().to_vec())
    }

    pub(crate) fn af_matrix(&mut self, t: f64) -> LikelihoodResult<DMatrix<f64>> {
        check_time(t)?;
        self.recursion_af.evaluate(t, self.tau)
    }

    pub(crate) fn fa_matrix(&mut self, t: f64) -> LikelihoodResult<DMatrix<f64>> {
        check_time(t)?;
        self.recursion_fa.evaluate(t, self.tau)
    }
}

impl std::fmt::Display for ExactSurvivor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Exact survivor function (tau = {})", self.tau)?;
        writeln!(f, "  AF eigenvalues: {:?}", self.recursion_af.eigenvalues())?;
        writeln!(f, "  FA eigenvalues: {:?}", self.recursion_fa.eigenvalues())?;
        write!(
            f,
            "  cached coefficients: {} (AF), {} (FA)",
            self.recursion_af.cached(),
            self.recursion_fa.cached()
        )
    }
}
