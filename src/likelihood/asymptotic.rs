//! likelihood::asymptotic — asymptotic missed-events survivor functions.
//!
//! For arguments beyond a few dead-times the survivor is dominated by the
//! real poles of its Laplace transform `W(s)^{-1}`:
//!
//! ```text
//!     R(u) ≈ Σ_i R_i e^{s_i u},   R_i = c_i r_i / (r_i W'(s_i) c_i)
//! ```
//!
//! where `s_i` are the roots of `det W(s) = 0` and `c_i`/`r_i` the right
//! (column) and left (row) null vectors of `W(s_i)`.
use crate::{
    likelihood::{
        determinant::DeterminantEq,
        errors::{LikelihoodError, LikelihoodResult},
        laplace::check_time,
        options::{RootOptions, SvdOptions},
        roots::find_roots,
    },
    numerics::{
        spectral::{check_distinct, right_null_vector},
        tolerances::OVERLAP_TOL,
    },
};
use nalgebra::DMatrix;

/// AsymptoticSurvivor — roots and residue matrices for one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct AsymptoticSurvivor {
    roots: Vec<f64>,
    residues: Vec<DMatrix<f64>>,
}

impl AsymptoticSurvivor {
    /// Find the roots of `det W(s) = 0` and their residue matrices.
    ///
    /// # Errors
    /// - Root search errors from [`find_roots`].
    /// - [`LikelihoodError::DegenerateEigenvalues`] for repeated roots (the
    ///   simple-pole residue formula does not apply).
    /// - [`LikelihoodError::DefectiveEigenvector`] if `r_i W'(s_i) c_i`
    ///   vanishes.
    pub fn new(
        eq: &DeterminantEq, roots: &RootOptions, svd: &SvdOptions,
    ) -> LikelihoodResult<Self> {
        let roots = find_roots(eq, roots, svd)?;
        check_distinct(&roots)?;

        let mut residues = Vec::with_capacity(roots.len());
        for (index, &s) in roots.iter().enumerate() {
            let w = eq.w(s)?;
            let column = right_null_vector(&w, svd)?;
            let row = right_null_vector(&w.transpose(), svd)?.transpose();
            let denominator = (&row * eq.w_derivative(s)? * &column)[(0, 0)];
            if !denominator.is_finite() || denominator.abs() < OVERLAP_TOL {
                return Err(LikelihoodError::DefectiveEigenvector { index, overlap: denominator });
            }
            residues.push(&column * &row / denominator);
        }
        Ok(Self { roots, residues })
    }

    /// Roots `s_i`, ascending and strictly negative.
    pub fn roots(&self) -> &[f64] {
        &self.roots
    }

    /// Residue matrices `R_i`, aligned with [`roots`](Self::roots).
    pub fn residues(&self) -> &[DMatrix<f64>] {
        &self.residues
    }

    /// `Σ_i R_i e^{s_i u}`.
    ///
    /// # Errors
    /// - [`LikelihoodError::NegativeTime`] for negative or non-finite `u`.
    pub fn at(&self, u: f64) -> LikelihoodResult<DMatrix<f64>> {
        check_time(u)?;
        let k = self.residues.first().map_or(0, |r| r.nrows());
        let mut total = DMatrix::<f64>::zeros(k, k);
        for (root, residue) in self.roots.iter().zip(&self.residues) {
            total += residue * (root * u).exp();
        }
        Ok(total)
    }
}
