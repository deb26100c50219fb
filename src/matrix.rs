//! Fingerprint output containers.
//!
//! Every transformer returns a [`FingerprintMatrix`]: one row per input
//! molecule, one column per fingerprint feature. Dense output is an
//! `ndarray::Array2<u32>`; sparse output is a CSR `sprs::CsMat<u32>` that never
//! materializes zero entries.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sprs::CsMat;

use crate::error::{ComputationError, Error};

/// Feature index → occurrence count for one molecule.
pub type FeatureCounts = BTreeMap<usize, u32>;

/// Value type and layout of a fingerprint matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    /// Emit occurrence counts instead of 0/1 presence bits.
    pub count: bool,
    /// Emit a CSR sparse matrix instead of a dense array.
    pub sparse: bool,
}

/// Fingerprints of a batch of molecules.
#[derive(Debug, Clone, PartialEq)]
pub enum FingerprintMatrix {
    /// Dense `(n_molecules, n_features)` array.
    Dense(Array2<u32>),
    /// Sparse CSR `(n_molecules, n_features)` matrix.
    Sparse(CsMat<u32>),
}

impl FingerprintMatrix {
    /// A matrix with no rows and `n_features` columns in the requested layout.
    pub fn empty(n_features: usize, sparse: bool) -> Self {
        if sparse {
            FingerprintMatrix::Sparse(CsMat::zero((0, n_features)))
        } else {
            FingerprintMatrix::Dense(Array2::zeros((0, n_features)))
        }
    }

    /// Number of rows (molecules).
    pub fn nrows(&self) -> usize {
        match self {
            FingerprintMatrix::Dense(a) => a.nrows(),
            FingerprintMatrix::Sparse(m) => m.rows(),
        }
    }

    /// Number of columns (features).
    pub fn ncols(&self) -> usize {
        match self {
            FingerprintMatrix::Dense(a) => a.ncols(),
            FingerprintMatrix::Sparse(m) => m.cols(),
        }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// Whether the matrix uses the sparse layout.
    pub fn is_sparse(&self) -> bool {
        matches!(self, FingerprintMatrix::Sparse(_))
    }

    /// Number of nonzero entries.
    pub fn nnz(&self) -> usize {
        match self {
            FingerprintMatrix::Dense(a) => a.iter().filter(|&&v| v != 0).count(),
            FingerprintMatrix::Sparse(m) => m.nnz(),
        }
    }

    /// Dense copy of the matrix.
    pub fn to_dense(&self) -> Array2<u32> {
        match self {
            FingerprintMatrix::Dense(a) => a.clone(),
            FingerprintMatrix::Sparse(m) => m.to_dense(),
        }
    }

    /// Borrow the dense array, if the matrix is dense.
    pub fn as_dense(&self) -> Option<&Array2<u32>> {
        match self {
            FingerprintMatrix::Dense(a) => Some(a),
            FingerprintMatrix::Sparse(_) => None,
        }
    }

    /// Borrow the sparse matrix, if the matrix is sparse.
    pub fn as_sparse(&self) -> Option<&CsMat<u32>> {
        match self {
            FingerprintMatrix::Dense(_) => None,
            FingerprintMatrix::Sparse(m) => Some(m),
        }
    }

    /// Row `index` as a dense vector.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.nrows()`.
    pub fn row(&self, index: usize) -> Vec<u32> {
        match self {
            FingerprintMatrix::Dense(a) => a.row(index).to_vec(),
            FingerprintMatrix::Sparse(m) => {
                let mut row = vec![0; m.cols()];
                if let Some(vec) = m.outer_view(index) {
                    for (col, &value) in vec.iter() {
                        row[col] = value;
                    }
                }
                row
            }
        }
    }
}

/// Accumulates per-molecule feature counts into a chunk matrix.
///
/// Used by [`FingerprintComputation::compute`](crate::FingerprintComputation::compute);
/// plugins with custom batch logic can use it directly.
#[derive(Debug)]
pub struct MatrixBuilder {
    n_features: usize,
    format: OutputFormat,
    rows: usize,
    dense: Vec<u32>,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<u32>,
}

impl MatrixBuilder {
    /// Creates a builder for about `capacity` rows of `n_features` columns.
    pub fn new(n_features: usize, format: OutputFormat, capacity: usize) -> Self {
        let mut builder = Self {
            n_features,
            format,
            rows: 0,
            dense: Vec::new(),
            indptr: Vec::new(),
            indices: Vec::new(),
            data: Vec::new(),
        };
        if format.sparse {
            builder.indptr.reserve(capacity + 1);
            builder.indptr.push(0);
        } else {
            builder.dense.reserve(capacity * n_features);
        }
        builder
    }

    /// Appends one molecule's features.
    ///
    /// # Errors
    ///
    /// A feature index outside `0..n_features` is reported as a computation
    /// failure of `fingerprint` for the molecule at `row`.
    pub fn push_row(
        &mut self,
        fingerprint: &'static str,
        row: usize,
        features: &FeatureCounts,
    ) -> Result<(), Error> {
        if let Some((&col, _)) = features.range(self.n_features..).next() {
            return Err(Error::Computation {
                molecule: row,
                source: ComputationError::new(
                    fingerprint,
                    format!("feature {col} outside 0..{}", self.n_features),
                ),
            });
        }

        let values = features
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(&col, &count)| (col, if self.format.count { count } else { 1 }));

        if self.format.sparse {
            for (col, value) in values {
                self.indices.push(col);
                self.data.push(value);
            }
            self.indptr.push(self.indices.len());
        } else {
            let start = self.dense.len();
            self.dense.resize(start + self.n_features, 0);
            for (col, value) in values {
                self.dense[start + col] = value;
            }
        }
        self.rows += 1;
        Ok(())
    }

    /// Finishes the chunk matrix.
    pub fn finish(self) -> Result<FingerprintMatrix, Error> {
        if self.format.sparse {
            Ok(FingerprintMatrix::Sparse(CsMat::new(
                (self.rows, self.n_features),
                self.indptr,
                self.indices,
                self.data,
            )))
        } else {
            Array2::from_shape_vec((self.rows, self.n_features), self.dense)
                .map(FingerprintMatrix::Dense)
                .map_err(|e| Error::shape(0, e.to_string()))
        }
    }
}
