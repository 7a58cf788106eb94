//! numerics — dense linear-algebra helpers shared by the likelihood layer.
//!
//! Purpose
//! -------
//! Keep the `nalgebra`-specific machinery in one place: copies between
//! `ndarray` and `nalgebra`, relative tolerances, eigen/null-space analysis
//! for non-symmetric matrices, and Van Loan matrix-exponential integrals.
//!
//! Conventions
//! -----------
//! - Public likelihood APIs accept and return `ndarray` types; everything in
//!   this module works on `nalgebra::DMatrix`.
//! - Failures are reported as [`LikelihoodError`](crate::likelihood::errors::LikelihoodError)
//!   numerical variants; nothing here logs or retries.
pub mod bridge;
pub mod integrals;
pub mod spectral;
pub mod tolerances;

pub use self::bridge::{to_array2, to_dmatrix};
pub use self::integrals::{ExpIntegrals, exp_integrals, exp_scaled};
pub use self::spectral::{
    check_distinct, eigenvalue_real_parts, real_eigenvalues, right_null_vector,
    spectral_projectors,
};

pub mod prelude {
    pub use super::bridge::{to_array2, to_dmatrix};
    pub use super::integrals::{ExpIntegrals, exp_integrals};
    pub use super::spectral::{real_eigenvalues, spectral_projectors};
}
