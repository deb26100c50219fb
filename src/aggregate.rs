//! Merging of per-chunk results.
//!
//! Chunk matrices are stacked vertically in dispatch order. Dense chunks go
//! through `ndarray::concatenate`, sparse chunks through `sprs::vstack`, so the
//! output layout always matches the chunk layout and zeros are never
//! materialized for sparse output.

use log::trace;
use ndarray::{ArrayView2, Axis};
use sprs::CsMatView;

use crate::error::{Error, Result};
use crate::matrix::FingerprintMatrix;

/// Stacks chunk matrices row-wise into one matrix.
///
/// Every chunk must use the requested layout and have exactly `n_features`
/// columns. With no chunks (empty input) the result is a `(0, n_features)`
/// matrix in the requested layout.
///
/// # Errors
///
/// Returns [`Error::Shape`] naming the first chunk whose layout or width
/// disagrees with the configuration.
pub fn aggregate(
    chunks: Vec<FingerprintMatrix>,
    n_features: usize,
    sparse: bool,
) -> Result<FingerprintMatrix> {
    for (k, chunk) in chunks.iter().enumerate() {
        if chunk.is_sparse() != sparse {
            return Err(Error::shape(
                k,
                format!(
                    "expected {} output, found {}",
                    layout_name(sparse),
                    layout_name(chunk.is_sparse())
                ),
            ));
        }
        if chunk.ncols() != n_features {
            return Err(Error::shape(
                k,
                format!("{} columns, expected {n_features}", chunk.ncols()),
            ));
        }
    }

    trace!("aggregating {} chunk(s) of width {n_features}", chunks.len());

    let mut chunks = chunks;
    match chunks.len() {
        0 => Ok(FingerprintMatrix::empty(n_features, sparse)),
        1 => Ok(chunks.remove(0)),
        _ if sparse => {
            let views: Vec<CsMatView<'_, u32>> = chunks
                .iter()
                .filter_map(FingerprintMatrix::as_sparse)
                .map(|m| m.view())
                .collect();
            Ok(FingerprintMatrix::Sparse(sprs::vstack(&views)))
        }
        _ => {
            let views: Vec<ArrayView2<'_, u32>> = chunks
                .iter()
                .filter_map(FingerprintMatrix::as_dense)
                .map(|a| a.view())
                .collect();
            ndarray::concatenate(Axis(0), &views)
                .map(FingerprintMatrix::Dense)
                .map_err(|e| Error::shape(0, e.to_string()))
        }
    }
}

fn layout_name(sparse: bool) -> &'static str {
    if sparse {
        "sparse"
    } else {
        "dense"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use sprs::CsMat;

    #[test]
    fn dense_chunks_stack_in_order() {
        let a = FingerprintMatrix::Dense(array![[1, 0, 0], [0, 1, 0]]);
        let b = FingerprintMatrix::Dense(array![[0, 0, 1]]);
        let out = aggregate(vec![a, b], 3, false).unwrap();
        assert_eq!(out.to_dense(), array![[1, 0, 0], [0, 1, 0], [0, 0, 1]]);
    }

    #[test]
    fn sparse_chunks_stay_sparse() {
        let a = FingerprintMatrix::Sparse(CsMat::new((1, 3), vec![0, 1], vec![2], vec![5]));
        let b = FingerprintMatrix::Sparse(CsMat::new((1, 3), vec![0, 1], vec![0], vec![7]));
        let out = aggregate(vec![a, b], 3, true).unwrap();
        assert!(out.is_sparse());
        assert_eq!(out.nnz(), 2);
        assert_eq!(out.to_dense(), array![[0, 0, 5], [7, 0, 0]]);
    }

    #[test]
    fn no_chunks_gives_an_empty_matrix() {
        let out = aggregate(Vec::new(), 2048, true).unwrap();
        assert_eq!(out.shape(), (0, 2048));
        assert!(out.is_sparse());
    }

    #[test]
    fn width_mismatch_names_the_chunk() {
        let a = FingerprintMatrix::Dense(array![[1, 0, 0]]);
        let b = FingerprintMatrix::Dense(array![[1, 0]]);
        let err = aggregate(vec![a, b], 3, false).unwrap_err();
        assert!(matches!(err, Error::Shape { chunk: 1, .. }));
    }

    #[test]
    fn layout_mismatch_is_rejected() {
        let a = FingerprintMatrix::Dense(array![[1, 0]]);
        let err = aggregate(vec![a], 2, true).unwrap_err();
        assert!(matches!(err, Error::Shape { chunk: 0, .. }));
        assert!(err.to_string().contains("expected sparse"));
    }
}
