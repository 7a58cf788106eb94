//! Memoized recursion state for one direction of the exact survivor.
//!
//! Construction does the eigen-analysis of the full generator and builds the
//! `D_i` matrices eagerly; coefficients `C_{iml}` are computed on first use
//! and kept for the lifetime of the value.
use crate::{
    likelihood::{
        errors::{LikelihoodError, LikelihoodResult},
        exact_survivor::formula::{RecursionTerms, recursion_formula},
        options::SvdOptions,
        qmatrix::QMatrix,
    },
    numerics::{
        bridge::all_finite,
        integrals::exp_scaled,
        spectral::{check_distinct, real_eigenvalues, spectral_projectors},
    },
};
use nalgebra::DMatrix;
use std::collections::HashMap;

/// Recursion key `(i, m, l)`.
type Key = (usize, usize, usize);

/// RecursionInterface — eigen-data and coefficient cache for one direction.
///
/// The direction is fixed by the orientation of the `QMatrix` handed to
/// [`RecursionInterface::new`]: its open block is the class whose survivor
/// is computed. Pass `q.transpose()` for the shut direction.
#[derive(Debug)]
pub struct RecursionInterface {
    coefficients: HashMap<Key, DMatrix<f64>>,
    d_values: Vec<DMatrix<f64>>,
    eigenvalues: Vec<f64>,
    size: usize,
}

impl RecursionInterface {
    /// Build eigenvalues `λ_i = −eig_i(Q)`, the base coefficients
    /// `C_{i00} = A_i[A, A]` and `D_i = A_i[A, F] e^{Q_FF τ} Q_FA`.
    ///
    /// Eigenvalues are stored ascending (so `λ_0 ≈ 0` for a generator).
    ///
    /// # Errors
    /// - [`LikelihoodError::ComplexEigenvalue`], [`LikelihoodError::NonFiniteEigenvalue`]
    ///   or [`LikelihoodError::SchurDidNotConverge`] from the eigen-analysis.
    /// - [`LikelihoodError::DegenerateEigenvalues`] when two eigenvalues
    ///   coincide, since the recursion divides by their differences.
    /// - SVD failures and [`LikelihoodError::DefectiveEigenvector`] from the
    ///   projectors; [`LikelihoodError::NonFiniteResult`] from `e^{Q_FF τ}`.
    pub fn new(qmatrix: &QMatrix, tau: f64, svd: &SvdOptions) -> LikelihoodResult<Self> {
        let generator = qmatrix.to_dmatrix();
        let mut eig = real_eigenvalues(&generator, svd)?;
        eig.reverse();
        check_distinct(&eig)?;
        let projectors = spectral_projectors(&generator, &eig, svd)?;

        let k = qmatrix.nopen();
        let n = qmatrix.nstates();
        let blocks = qmatrix.blocks();
        let tail = exp_scaled(&blocks.ff, tau)? * &blocks.fa;

        let mut coefficients = HashMap::new();
        let mut d_values = Vec::with_capacity(n);
        for (i, projector) in projectors.iter().enumerate() {
            coefficients.insert((i, 0, 0), projector.view((0, 0), (k, k)).into_owned());
            d_values.push(projector.view((0, k), (k, n - k)) * &tail);
        }
        let eigenvalues = eig.iter().map(|mu| -mu).collect();
        Ok(Self { coefficients, d_values, eigenvalues, size: k })
    }

    /// `C_{iml}`, computed and cached on first request.
    ///
    /// Returns an owned copy; internal evaluation borrows from the cache.
    ///
    /// # Errors
    /// - [`LikelihoodError::InvalidRecursionIndex`] unless `i < n` and
    ///   `l <= m`.
    pub fn get(&mut self, i: usize, m: usize, l: usize) -> LikelihoodResult<DMatrix<f64>> {
        self.coefficient_ref(i, m, l).cloned()
    }

    /// Borrow `C_{iml}`, computing and caching it first if needed.
    fn coefficient_ref(
        &mut self, i: usize, m: usize, l: usize,
    ) -> LikelihoodResult<&DMatrix<f64>> {
        self.ensure(i, m, l)?;
        self.coefficients.get(&(i, m, l)).ok_or(LikelihoodError::InvalidRecursionIndex { i, m, l })
    }

    /// `D_i`.
    pub fn d_value(&self, i: usize) -> LikelihoodResult<&DMatrix<f64>> {
        self.d_values
            .get(i)
            .ok_or(LikelihoodError::IndexOutOfRange { index: i, len: self.d_values.len() })
    }

    /// `λ_i`, ascending.
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Block size of the survivor matrices.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of coefficients currently cached, base case included.
    pub fn cached(&self) -> usize {
        self.coefficients.len()
    }

    /// `R(t) = Σ_{m=0}^{⌊t/τ⌋} (−1)^m Σ_i Σ_{l=0}^{m} C_{iml} u^l e^{−λ_i u}`,
    /// `u = t − mτ`.
    ///
    /// `t` and `tau` are assumed validated by the caller.
    pub fn evaluate(&mut self, t: f64, tau: f64) -> LikelihoodResult<DMatrix<f64>> {
        let periods = (t / tau).floor() as usize;
        let mut total = DMatrix::<f64>::zeros(self.size, self.size);
        for m in 0..=periods {
            let u = (t - m as f64 * tau).max(0.0);
            let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
            for i in 0..self.eigenvalues.len() {
                let decay = (-self.eigenvalues[i] * u).exp();
                let mut power = 1.0;
                for l in 0..=m {
                    total += self.coefficient_ref(i, m, l)? * (sign * power * decay);
                    power *= u;
                }
            }
        }
        if !all_finite(&total) {
            return Err(LikelihoodError::NonFiniteResult { context: "exact survivor" });
        }
        Ok(total)
    }
}

impl RecursionTerms for RecursionInterface {
    type Element = DMatrix<f64>;

    fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    fn eigenvalue(&self, i: usize) -> f64 {
        self.eigenvalues[i]
    }

    fn d(&self, i: usize) -> &DMatrix<f64> {
        &self.d_values[i]
    }

    fn zero(&self) -> DMatrix<f64> {
        DMatrix::zeros(self.size, self.size)
    }

    fn ensure(&mut self, i: usize, m: usize, l: usize) -> LikelihoodResult<()> {
        if i >= self.eigenvalues.len() || l > m {
            return Err(LikelihoodError::InvalidRecursionIndex { i, m, l });
        }
        if !self.coefficients.contains_key(&(i, m, l)) {
            let value = recursion_formula(self, i, m, l)?;
            self.coefficients.insert((i, m, l), value);
        }
        Ok(())
    }

    fn cached_coefficient(&self, i: usize, m: usize, l: usize) -> Option<&DMatrix<f64>> {
        self.coefficients.get(&(i, m, l))
    }
}
