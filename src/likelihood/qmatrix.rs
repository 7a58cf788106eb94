//! likelihood::qmatrix — validated, partitioned generator matrices.
//!
//! Purpose
//! -------
//! Represent the transition-rate (generator) matrix `Q` of a single-channel
//! kinetic model together with its open/shut partition. States
//! `[0, nopen)` are open (class A), states `[nopen, n)` are shut (class F).
//!
//! Key behaviors
//! -------------
//! - [`QMatrix::new`] validates shape, finiteness, non-negative off-diagonal
//!   rates, zero row sums and the partition boundary once; every downstream
//!   module assumes these invariants without re-checking.
//! - Block views `aa`, `af`, `fa`, `ff` borrow the stored matrix.
//! - [`QMatrix::transpose`] swaps the roles of open and shut states by
//!   permuting shut states first. FA-direction quantities are the AF
//!   quantities of the swapped matrix.
//!
//! Invariants & assumptions
//! ------------------------
//! - `1 <= nopen < nstates`.
//! - Row sums vanish to `GENERATOR_TOL` relative to the row's largest rate.
//! - Instances are immutable after construction.
use crate::{
    likelihood::errors::{LikelihoodError, LikelihoodResult},
    numerics::{
        bridge::to_dmatrix,
        tolerances::{GENERATOR_TOL, tolerance_scale},
    },
};
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2, s};

/// QMatrix — generator matrix with an open/shut partition.
#[derive(Debug, Clone, PartialEq)]
pub struct QMatrix {
    matrix: Array2<f64>,
    nopen: usize,
}

/// Owned `nalgebra` copies of the four partition blocks.
///
/// `aa` is nopen×nopen, `af` nopen×nshut, `fa` nshut×nopen, `ff`
/// nshut×nshut.
#[derive(Debug, Clone, PartialEq)]
pub struct Blocks {
    pub aa: DMatrix<f64>,
    pub af: DMatrix<f64>,
    pub fa: DMatrix<f64>,
    pub ff: DMatrix<f64>,
}

impl QMatrix {
    /// Validate and wrap a generator matrix.
    ///
    /// Parameters
    /// ----------
    /// - `matrix`: `Array2<f64>`
    ///   Square rate matrix. Off-diagonal entries are transition rates.
    /// - `nopen`: `usize`
    ///   Number of open states; open states come first.
    ///
    /// Errors
    /// ------
    /// - [`LikelihoodError::NotSquare`] for non-square input.
    /// - [`LikelihoodError::InvalidNOpen`] unless `1 <= nopen < n`.
    /// - [`LikelihoodError::NonFiniteEntry`] for NaN/±inf entries.
    /// - [`LikelihoodError::InvalidRate`] for a negative off-diagonal rate.
    /// - [`LikelihoodError::RowSumNotZero`] when a row does not sum to zero.
    pub fn new(matrix: Array2<f64>, nopen: usize) -> LikelihoodResult<Self> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(LikelihoodError::NotSquare { rows, cols });
        }
        if nopen == 0 || nopen >= rows {
            return Err(LikelihoodError::InvalidNOpen { nopen, nstates: rows });
        }
        for ((row, col), &value) in matrix.indexed_iter() {
            if !value.is_finite() {
                return Err(LikelihoodError::NonFiniteEntry { row, col, value });
            }
            if row != col && value < 0.0 {
                return Err(LikelihoodError::InvalidRate { row, col, value });
            }
        }
        for (row, values) in matrix.outer_iter().enumerate() {
            let sum = values.sum();
            if sum.abs() > GENERATOR_TOL * tolerance_scale(values.iter().copied()) {
                return Err(LikelihoodError::RowSumNotZero { row, sum });
            }
        }
        Ok(Self { matrix, nopen })
    }

    /// Full generator.
    pub fn matrix(&self) -> ArrayView2<'_, f64> {
        self.matrix.view()
    }

    pub fn nopen(&self) -> usize {
        self.nopen
    }

    pub fn nshut(&self) -> usize {
        self.nstates() - self.nopen
    }

    pub fn nstates(&self) -> usize {
        self.matrix.nrows()
    }

    /// Open → open block.
    pub fn aa(&self) -> ArrayView2<'_, f64> {
        self.matrix.slice(s![..self.nopen, ..self.nopen])
    }

    /// Open → shut block.
    pub fn af(&self) -> ArrayView2<'_, f64> {
        self.matrix.slice(s![..self.nopen, self.nopen..])
    }

    /// Shut → open block.
    pub fn fa(&self) -> ArrayView2<'_, f64> {
        self.matrix.slice(s![self.nopen.., ..self.nopen])
    }

    /// Shut → shut block.
    pub fn ff(&self) -> ArrayView2<'_, f64> {
        self.matrix.slice(s![self.nopen.., self.nopen..])
    }

    /// Role-swapped copy: shut states first, `nopen` becomes the old `nshut`.
    ///
    /// Within each class the original state order is kept, so
    /// `q.transpose().aa() == q.ff()` and `q.transpose().af() == q.fa()`.
    /// Applying it twice gives back the original matrix.
    pub fn transpose(&self) -> Self {
        let n = self.nstates();
        let k = self.nopen;
        let order: Vec<usize> = (k..n).chain(0..k).collect();
        let matrix = Array2::from_shape_fn((n, n), |(i, j)| self.matrix[[order[i], order[j]]]);
        Self { matrix, nopen: n - k }
    }

    /// Generator as a `DMatrix`.
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        to_dmatrix(self.matrix.view())
    }

    /// `nalgebra` copies of the four blocks.
    pub fn blocks(&self) -> Blocks {
        Blocks {
            aa: to_dmatrix(self.aa()),
            af: to_dmatrix(self.af()),
            fa: to_dmatrix(self.fa()),
            ff: to_dmatrix(self.ff()),
        }
    }
}

impl std::fmt::Display for QMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "QMatrix: nopen = {}, nstates = {}", self.nopen, self.nstates())?;
        for row in self.matrix.outer_iter() {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:>12.4}")).collect();
            writeln!(f, "  {}", cells.join(" "))?;
        }
        Ok(())
    }
}
