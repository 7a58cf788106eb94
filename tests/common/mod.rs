//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use hjc_likelihood::likelihood::QMatrix;
use ndarray::{Array2, array};
use proptest::prelude::*;

/// Dead-time used with the classic mechanism (seconds).
pub const CLASSIC_TAU: f64 = 1e-4;

/// Critical shut time used for CHS vectors on the classic mechanism.
pub const CLASSIC_TCRIT: f64 = 5e-3;

/// Purpose
/// -------
/// The classic five-state nicotinic receptor mechanism (two open states,
/// three shut states), rates in s⁻¹.
///
/// Invariants
/// ----------
/// - Satisfies detailed balance around its single cycle, so the spectrum
///   is real and the determinant roots are real.
pub fn classic_matrix() -> Array2<f64> {
    array![
        [-3050.0, 50.0, 3000.0, 0.0, 0.0],
        [2.0 / 3.0, -1502.0 / 3.0, 0.0, 500.0, 0.0],
        [15.0, 0.0, -2065.0, 50.0, 2000.0],
        [0.0, 15000.0, 4000.0, -19000.0, 0.0],
        [0.0, 0.0, 10.0, 0.0, -10.0],
    ]
}

pub fn classic_qmatrix() -> QMatrix {
    QMatrix::new(classic_matrix(), 2).expect("classic mechanism is a valid generator")
}

/// Purpose
/// -------
/// Build a reversible generator from stationary weights `pi` and symmetric
/// fluxes `flux` (upper triangle, row-major).
///
/// Invariants
/// ----------
/// - `q_ij = flux_ij / π_i` for `i ≠ j`, so `π_i q_ij = π_j q_ji` and every
///   row sums to zero.
pub fn reversible_generator(pi: &[f64], flux: &[f64]) -> Array2<f64> {
    let n = pi.len();
    let mut q = Array2::<f64>::zeros((n, n));
    let mut k = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            q[(i, j)] = flux[k] / pi[i];
            q[(j, i)] = flux[k] / pi[j];
            k += 1;
        }
    }
    for i in 0..n {
        let off: f64 = q.row(i).sum();
        q[(i, i)] = -off;
    }
    q
}

/// Strategy: a reversible generator with 3..=4 states and a valid `nopen`.
///
/// Weights and fluxes are kept within two decades so the spectra stay
/// well separated in most draws; the tests discard the rest.
pub fn reversible_qmatrix() -> impl Strategy<Value = QMatrix> {
    (3usize..=4)
        .prop_flat_map(|n| {
            let pairs = n * (n - 1) / 2;
            (
                prop::collection::vec(0.1f64..1.0, n),
                prop::collection::vec(0.5f64..20.0, pairs),
                1..n,
            )
        })
        .prop_map(|(weights, flux, nopen)| {
            let total: f64 = weights.iter().sum();
            let pi: Vec<f64> = weights.iter().map(|w| w / total).collect();
            let matrix = reversible_generator(&pi, &flux);
            QMatrix::new(matrix, nopen).expect("reversible construction yields a generator")
        })
}
