//! likelihood — missed-events (HJC) survivor functions and occupancies.
//!
//! Purpose
//! -------
//! Provide the building blocks of the Hawkes–Jalali–Colquhoun missed-events
//! likelihood for single ion-channel records: a validated generator
//! ([`QMatrix`]), the ideal and missed-events chains ([`IdealG`],
//! [`MissedEventsG`]), exact and asymptotic survivor functions
//! ([`ExactSurvivor`], [`AsymptoticSurvivor`]) and the equilibrium /
//! occupancy / CHS probability vectors that start and end a likelihood
//! product.
//!
//! Key behaviors
//! -------------
//! - [`QMatrix::new`] validates the generator once; everything downstream
//!   assumes its invariants.
//! - [`ExactSurvivor`] evaluates `R_AF(t)`/`R_FA(t)` through the memoized HJC
//!   recursion ([`exact_survivor::formula`]).
//! - [`DeterminantEq`] and [`roots`] locate the asymptotic exponents;
//!   [`AsymptoticSurvivor`] turns them into residue expansions.
//! - [`occupancies()`] is generic over [`LaplaceBlocks`] and runs unchanged on
//!   both chains; [`chs_occupancies`] adds the critical-time correction.
//!
//! Invariants & assumptions
//! ------------------------
//! - Open states come first: `[0, nopen)` open, `[nopen, n)` shut.
//! - Dead-time `τ > 0`; query times `t >= 0`.
//! - Full generators must have real, distinct eigenvalues for the exact
//!   survivor, and `det W(s)` must have real roots for the asymptotic one.
//!   Both hold for reversible mechanisms.
//!
//! Conventions
//! -----------
//! - Public inputs and outputs are `ndarray` arrays; `nalgebra` is used
//!   internally (see [`crate::numerics`]). [`DeterminantEq`] and
//!   [`AsymptoticSurvivor`] return `DMatrix` values since only numerical
//!   code consumes them.
//! - Every fallible operation returns [`LikelihoodResult`]; failures are
//!   all-or-nothing and nothing is logged. With the `obs_slog` feature and
//!   `RootOptions::verbose`, root polishing reports progress through a slog
//!   terminal observer.
//!
//! Downstream usage
//! ----------------
//! - Typical flow:
//!   1. Build a [`QMatrix`] from rates and `nopen`.
//!   2. Construct [`IdealG`] and/or [`MissedEventsG`] (with `τ` and
//!      [`MissedEventsOptions`]).
//!   3. Use [`occupancies()`] / [`chs_occupancies`] for initial and final
//!      vectors and `MissedEventsG::af`/`fa` for the densities in between.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; `tests/` holds end-to-end
//!   scenarios on the classic five-state mechanism and property tests on
//!   random reversible generators.
pub mod asymptotic;
pub mod determinant;
pub mod errors;
pub mod exact_survivor;
pub mod laplace;
pub mod missed_events;
pub mod occupancies;
pub mod options;
pub mod qmatrix;
pub mod roots;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::asymptotic::AsymptoticSurvivor;
pub use self::determinant::DeterminantEq;
pub use self::errors::{LikelihoodError, LikelihoodResult};
pub use self::exact_survivor::{ExactSurvivor, RecursionInterface};
pub use self::laplace::{IdealG, LaplaceBlocks};
pub use self::missed_events::MissedEventsG;
pub use self::occupancies::{
    chs_matrix_hfa, chs_occupancies, equilibrium, occupancies, occupancies_with_options,
    stationary_vector,
};
pub use self::options::{MissedEventsOptions, RootOptions, SvdOptions};
pub use self::qmatrix::QMatrix;
pub use self::roots::{RootInterval, find_root_intervals, find_roots};

// ---- Optional convenience prelude for downstream crates -------------------
//
//     use hjc_likelihood::likelihood::prelude::*;

pub mod prelude {
    pub use super::{
        AsymptoticSurvivor, ExactSurvivor, IdealG, LaplaceBlocks, LikelihoodError,
        LikelihoodResult, MissedEventsG, MissedEventsOptions, QMatrix, RootOptions, SvdOptions,
        chs_occupancies, equilibrium, occupancies,
    };
}
