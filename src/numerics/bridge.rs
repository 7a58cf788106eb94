//! numerics::bridge — copies between `ndarray` and `nalgebra` containers.
//!
//! The public surface of the crate speaks `ndarray` (`Array1`, `Array2` and
//! their views) while decompositions (Schur, SVD, LU, matrix exponential)
//! run on `nalgebra::DMatrix`. These helpers perform the copies in both
//! directions; they never validate contents or reshape.
use nalgebra::{DMatrix, DVector, Dim, Matrix, RawStorage};
use ndarray::{Array1, Array2, ArrayView2};

/// Copy an `ndarray` matrix view into a freshly allocated `DMatrix`.
///
/// The copy walks column-major, matching `DMatrix` storage.
pub fn to_dmatrix(view: ArrayView2<'_, f64>) -> DMatrix<f64> {
    let (nrows, ncols) = view.dim();
    DMatrix::from_fn(nrows, ncols, |i, j| view[[i, j]])
}

/// Copy a `DMatrix` into an owned `Array2` with identical shape and values.
pub fn to_array2(matrix: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((matrix.nrows(), matrix.ncols()), |(i, j)| matrix[(i, j)])
}

/// Copy a column vector into an `Array1`.
pub fn column_to_array1(column: &DVector<f64>) -> Array1<f64> {
    column.iter().copied().collect()
}

/// Whether every entry of `matrix` (or vector) is finite.
pub fn all_finite<R: Dim, C: Dim, S: RawStorage<f64, R, C>>(
    matrix: &Matrix<f64, R, C, S>,
) -> bool {
    matrix.iter().all(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Verify that copying a non-square matrix into `DMatrix` and back
    // preserves shape and every entry.
    //
    // Given
    // -----
    // - A 2×3 `Array2<f64>` with distinct entries.
    //
    // Expect
    // ------
    // - Entry-wise equality in both containers and after the round trip.
    fn copies_preserve_shape_and_entries() {
        // Arrange
        let source = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];

        // Act
        let dmatrix = to_dmatrix(source.view());
        let back = to_array2(&dmatrix);

        // Assert
        assert_eq!(dmatrix.shape(), (2, 3));
        assert_eq!(dmatrix[(1, 2)], 6.0);
        assert_eq!(dmatrix[(0, 1)], 2.0);
        assert_eq!(back, source);
    }

    #[test]
    // Purpose
    // -------
    // Check that `all_finite` detects NaN entries.
    //
    // Given
    // -----
    // - A 2×2 matrix with one NaN.
    //
    // Expect
    // ------
    // - `all_finite` is false, and true once the NaN is replaced.
    fn all_finite_detects_nan() {
        let mut matrix = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, 0.0, 2.0]);
        assert!(!all_finite(&matrix));
        matrix[(0, 1)] = 3.0;
        assert!(all_finite(&matrix));
    }

    #[test]
    // Purpose
    // -------
    // `all_finite` accepts column vectors and views as well as matrices.
    //
    // Given
    // -----
    // - A `DVector` with an infinite entry and a column view of a finite
    //   matrix.
    //
    // Expect
    // ------
    // - false for the vector, true for the view.
    fn all_finite_accepts_vectors_and_views() {
        let vector = DVector::from_vec(vec![0.5, f64::INFINITY]);
        let matrix = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);

        assert!(!all_finite(&vector));
        assert!(all_finite(&matrix.column(1)));
    }
}
