//! hjc_likelihood — missed-events likelihood ingredients for ion-channel
//! kinetic models.
//!
//! Purpose
//! -------
//! Single-channel recordings cannot resolve sojourns shorter than a
//! dead-time `τ`. This crate computes the Hawkes–Jalali–Colquhoun
//! corrections for that: exact and asymptotic survivor functions of the
//! apparent open and shut periods, the corresponding densities and Laplace
//! blocks, and the equilibrium / occupancy / CHS vectors that bracket a
//! likelihood product.
//!
//! Key behaviors
//! -------------
//! - [`likelihood`] holds the domain surface: generators, chains, survivor
//!   engines, root search and occupancy solvers.
//! - [`numerics`] holds the dense linear-algebra helpers (`ndarray` ↔
//!   `nalgebra` copies, eigen/null-space analysis, Van Loan integrals).
//!
//! Conventions
//! -----------
//! - Single-threaded and synchronous; no I/O. Survivor engines cache
//!   coefficients, so their evaluation methods take `&mut self`.
//! - Errors are reported as [`likelihood::LikelihoodError`].
//!
//! Feature flags
//! -------------
//! - `obs_slog`: attach an `argmin` slog terminal observer to root
//!   polishing runs when `RootOptions::verbose` is set.

pub mod likelihood;
pub mod numerics;
