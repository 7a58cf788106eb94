//! likelihood::missed_events — the chain as seen through a dead-time `τ`.
//!
//! Purpose
//! -------
//! Combine the exact and asymptotic survivor functions into the apparent
//! ("e-") open and shut time densities of HJC theory, and expose the
//! corresponding Laplace blocks so the generic occupancy solver can run on
//! the corrected chain.
//!
//! Key behaviors
//! -------------
//! - `laplace_af(s) = W_AF(s)^{-1} Q_AF e^{Q_FF τ} e^{−sτ}` and the mirror
//!   `laplace_fa(s)`, both solved by LU.
//! - `af(t) = R_AF(t − τ) Q_AF e^{Q_FF τ}` for `t >= τ` and zero below `τ`
//!   (no apparent sojourn is shorter than the resolution). `R_AF(u)` is the
//!   exact survivor for `u < nmax·τ` and the asymptotic one beyond.
//! - The asymptotic components also feed the CHS correction in
//!   [`occupancies`](crate::likelihood::occupancies).
//!
//! Invariants & assumptions
//! ------------------------
//! - `laplace_af(0)` and `laplace_fa(0)` are row-stochastic.
//! - Construction fails as a whole if either direction's eigen-analysis or
//!   root search fails.
use crate::{
    likelihood::{
        asymptotic::AsymptoticSurvivor,
        determinant::DeterminantEq,
        errors::{LikelihoodError, LikelihoodResult},
        exact_survivor::ExactSurvivor,
        laplace::{LaplaceBlocks, check_time},
        options::MissedEventsOptions,
        qmatrix::QMatrix,
    },
    numerics::bridge::{all_finite, to_array2},
};
use nalgebra::DMatrix;
use ndarray::Array2;

/// MissedEventsG — missed-events corrected open/shut densities.
#[derive(Debug)]
pub struct MissedEventsG {
    qmatrix: QMatrix,
    eq_af: DeterminantEq,
    eq_fa: DeterminantEq,
    exact: ExactSurvivor,
    asymptotic_af: AsymptoticSurvivor,
    asymptotic_fa: AsymptoticSurvivor,
    /// `Q_AF e^{Q_FF τ}`.
    tail_af: DMatrix<f64>,
    /// `Q_FA e^{Q_AA τ}`.
    tail_fa: DMatrix<f64>,
    options: MissedEventsOptions,
}

impl MissedEventsG {
    pub fn new(qmatrix: QMatrix, tau: f64) -> LikelihoodResult<Self> {
        Self::with_options(qmatrix, tau, MissedEventsOptions::default())
    }

    /// Build both directions: determinant equations, exact survivor and
    /// asymptotic expansions.
    ///
    /// Errors
    /// ------
    /// - [`LikelihoodError::InvalidTau`] for non-finite or non-positive `tau`.
    /// - Eigen-analysis errors from [`ExactSurvivor::with_options`].
    /// - Root search and residue errors from [`AsymptoticSurvivor::new`].
    pub fn with_options(
        qmatrix: QMatrix, tau: f64, options: MissedEventsOptions,
    ) -> LikelihoodResult<Self> {
        let eq_af = DeterminantEq::new(&qmatrix, tau)?;
        let eq_fa = eq_af.transpose();
        let exact = ExactSurvivor::with_options(&qmatrix, tau, options.svd)?;
        let asymptotic_af = AsymptoticSurvivor::new(&eq_af, &options.roots, &options.svd)?;
        let asymptotic_fa = AsymptoticSurvivor::new(&eq_fa, &options.roots, &options.svd)?;
        let tail_af = eq_af.q_xy() * eq_af.exp_yy_tau()?;
        let tail_fa = eq_fa.q_xy() * eq_fa.exp_yy_tau()?;
        Ok(Self {
            qmatrix,
            eq_af,
            eq_fa,
            exact,
            asymptotic_af,
            asymptotic_fa,
            tail_af,
            tail_fa,
            options,
        })
    }

    /// Validate a raw generator and build from it with default options.
    pub fn from_matrix(matrix: Array2<f64>, nopen: usize, tau: f64) -> LikelihoodResult<Self> {
        Self::new(QMatrix::new(matrix, nopen)?, tau)
    }

    pub fn qmatrix(&self) -> &QMatrix {
        &self.qmatrix
    }

    pub fn tau(&self) -> f64 {
        self.eq_af.tau()
    }

    pub fn nmax(&self) -> usize {
        self.options.nmax
    }

    pub fn options(&self) -> &MissedEventsOptions {
        &self.options
    }

    /// Asymptotic expansion of `R_AF`.
    pub fn asymptotic_af(&self) -> &AsymptoticSurvivor {
        &self.asymptotic_af
    }

    /// Asymptotic expansion of `R_FA`.
    pub fn asymptotic_fa(&self) -> &AsymptoticSurvivor {
        &self.asymptotic_fa
    }

    /// `Q_FA e^{Q_AA τ}`: entering the open class and staying for `τ`.
    pub(crate) fn tail_fa(&self) -> &DMatrix<f64> {
        &self.tail_fa
    }

    /// Apparent open-time density matrix `af(t)` (`n_open × n_shut`).
    ///
    /// # Errors
    /// - [`LikelihoodError::NegativeTime`] for negative or non-finite `t`.
    pub fn af(&mut self, t: f64) -> LikelihoodResult<Array2<f64>> {
        check_time(t)?;
        let tau = self.tau();
        if t < tau {
            return Ok(Array2::zeros((self.qmatrix.nopen(), self.qmatrix.nshut())));
        }
        let u = t - tau;
        let survivor = if u < self.options.nmax as f64 * tau {
            self.exact.af_matrix(u)?
        } else {
            self.asymptotic_af.at(u)?
        };
        Ok(to_array2(&(survivor * &self.tail_af)))
    }

    /// Apparent shut-time density matrix `fa(t)` (`n_shut × n_open`).
    ///
    /// # Errors
    /// - [`LikelihoodError::NegativeTime`] for negative or non-finite `t`.
    pub fn fa(&mut self, t: f64) -> LikelihoodResult<Array2<f64>> {
        check_time(t)?;
        let tau = self.tau();
        if t < tau {
            return Ok(Array2::zeros((self.qmatrix.nshut(), self.qmatrix.nopen())));
        }
        let u = t - tau;
        let survivor = if u < self.options.nmax as f64 * tau {
            self.exact.fa_matrix(u)?
        } else {
            self.asymptotic_fa.at(u)?
        };
        Ok(to_array2(&(survivor * &self.tail_fa)))
    }

    /// Exact survivor used below `nmax·τ`, read-only.
    ///
    /// The survivor is rebuilt only together with the determinant equations
    /// and asymptotic components, so no mutable access is handed out.
    pub fn exact_survivor(&self) -> &ExactSurvivor {
        &self.exact
    }
}

impl LaplaceBlocks for MissedEventsG {
    fn nopen(&self) -> usize {
        self.qmatrix.nopen()
    }

    fn nshut(&self) -> usize {
        self.qmatrix.nshut()
    }

    fn laplace_af(&self, s: f64) -> LikelihoodResult<Array2<f64>> {
        laplace_block(&self.eq_af, &self.tail_af, s).map(|m| to_array2(&m))
    }

    fn laplace_fa(&self, s: f64) -> LikelihoodResult<Array2<f64>> {
        laplace_block(&self.eq_fa, &self.tail_fa, s).map(|m| to_array2(&m))
    }
}

// ---- Helper Methods ----

/// `W(s)^{-1} tail e^{−sτ}`.
fn laplace_block(eq: &DeterminantEq, tail: &DMatrix<f64>, s: f64) -> LikelihoodResult<DMatrix<f64>> {
    let rhs = tail * (-s * eq.tau()).exp();
    let solved =
        eq.w(s)?.lu().solve(&rhs).ok_or(LikelihoodError::SingularMatrix { context: "W(s)" })?;
    if !all_finite(&solved) {
        return Err(LikelihoodError::NonFiniteResult { context: "missed-events Laplace block" });
    }
    Ok(solved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::options::{RootOptions, SvdOptions};
    use approx::assert_relative_eq;
    use ndarray::{Axis, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Row-stochastic Laplace blocks at s = 0.
    // - Zero density below τ and the exact/asymptotic switch-over.
    // - The Laplace block at s = 0 equals the integral of the density.
    // - The exposed exact survivor stays consistent with the chain.
    // -------------------------------------------------------------------------

    const TAU: f64 = 0.05;

    fn reversible() -> QMatrix {
        QMatrix::new(array![[-5.5, 3.0, 2.5], [2.0, -5.0, 3.0], [1.0, 1.8, -2.8]], 2).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Every apparent open (shut) period ends eventually.
    //
    // Given
    // -----
    // - Reversible three-state chain, τ = 0.05.
    //
    // Expect
    // ------
    // - Rows of laplace_af(0), laplace_fa(0) sum to 1 with entries ≥ 0.
    fn laplace_blocks_are_row_stochastic_at_zero() {
        let g = MissedEventsG::new(reversible(), TAU).unwrap();

        let af = g.laplace_af(0.0).unwrap();
        let fa = g.laplace_fa(0.0).unwrap();

        assert_eq!(af.dim(), (2, 1));
        assert_eq!(fa.dim(), (1, 2));
        for sum in af.sum_axis(Axis(1)).iter().chain(fa.sum_axis(Axis(1)).iter()) {
            assert_relative_eq!(*sum, 1.0, epsilon = 1e-10);
        }
        assert!(af.iter().chain(fa.iter()).all(|&v| v >= -1e-12));
    }

    #[test]
    // Purpose
    // -------
    // Densities vanish below τ and are continuous across the switch from
    // exact to asymptotic survivor.
    //
    // Given
    // -----
    // - Reversible chain with nmax = 8; t just below τ and just either side
    //   of (nmax + 1)τ.
    //
    // Expect
    // ------
    // - Zero matrices below τ; agreement to 1e-7 at the switch-over.
    fn density_is_zero_below_tau_and_continuous_at_switch() {
        let options =
            MissedEventsOptions::new(8, RootOptions::default(), SvdOptions::default()).unwrap();
        let mut g = MissedEventsG::with_options(reversible(), TAU, options).unwrap();
        let switch = 9.0 * TAU;

        let below_tau = g.af(0.99 * TAU).unwrap();
        let before = g.af(switch * (1.0 - 1e-10)).unwrap();
        let after = g.af(switch * (1.0 + 1e-10)).unwrap();

        assert!(below_tau.iter().all(|&v| v == 0.0));
        assert!(g.fa(0.5 * TAU).unwrap().iter().all(|&v| v == 0.0));
        for (x, y) in before.iter().zip(after.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-7);
        }
        assert!(matches!(g.af(-1.0), Err(LikelihoodError::NegativeTime { .. })));
    }

    #[test]
    // Purpose
    // -------
    // laplace_af(0) = ∫_τ^∞ af(t) dt. Integrate the exact part with
    // Simpson's rule (panel boundaries on multiples of τ, where the survivor
    // has kinks) and the asymptotic tail analytically.
    //
    // Given
    // -----
    // - Reversible chain, nmax = 8.
    //
    // Expect
    // ------
    // - Agreement to 1e-7.
    fn laplace_at_zero_integrates_the_density() {
        // Arrange
        let options =
            MissedEventsOptions::new(8, RootOptions::default(), SvdOptions::default()).unwrap();
        let mut g = MissedEventsG::with_options(reversible(), TAU, options).unwrap();
        let cutoff = 8.0 * TAU;
        let panels = 40;
        let h = TAU / panels as f64;

        // Act
        let mut integral = Array2::<f64>::zeros((2, 1));
        for period in 0..8 {
            let start = TAU + period as f64 * TAU;
            for step in 0..=panels {
                let weight = if step == 0 || step == panels {
                    1.0
                } else if step % 2 == 1 {
                    4.0
                } else {
                    2.0
                };
                let t = start + step as f64 * h;
                integral = integral + g.af(t).unwrap() * (weight * h / 3.0);
            }
        }
        let mut tail = DMatrix::<f64>::zeros(2, 2);
        for (root, residue) in g.asymptotic_af().roots().iter().zip(g.asymptotic_af().residues()) {
            tail += residue * ((root * cutoff).exp() / -root);
        }
        let tail_af = g.eq_af.q_xy() * g.eq_af.exp_yy_tau().unwrap();
        integral = integral + to_array2(&(tail * tail_af));

        // Assert
        let laplace = g.laplace_af(0.0).unwrap();
        for (x, y) in integral.iter().zip(laplace.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-7);
        }
    }

    #[test]
    // Purpose
    // -------
    // The exact survivor handed out by the chain describes the same model
    // as the chain itself.
    //
    // Given
    // -----
    // - Reversible chain, τ = 0.05.
    // - A standalone exact survivor built from the same generator and τ.
    //
    // Expect
    // ------
    // - Same τ, eigenvalues and D matrices.
    // - Repeated density evaluations are unchanged.
    fn exact_survivor_view_matches_chain() {
        let mut g = MissedEventsG::new(reversible(), TAU).unwrap();
        let standalone = ExactSurvivor::new(&reversible(), TAU).unwrap();
        let first = g.af(0.13).unwrap();

        let view = g.exact_survivor();

        assert_eq!(view.tau(), g.tau());
        assert_eq!(view.eigenvalues_af(), standalone.eigenvalues_af());
        assert_eq!(view.eigenvalues_fa(), standalone.eigenvalues_fa());
        for i in 0..3 {
            assert_eq!(view.d_af(i).unwrap(), standalone.d_af(i).unwrap());
        }
        assert_eq!(g.af(0.13).unwrap(), first);
    }
}
