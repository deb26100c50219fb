//! CSV helpers for SMILES datasets and fingerprint matrices.
//!
//! Reading pulls one SMILES column out of a CSV file; writing emits one row per
//! molecule with a `fp_0, fp_1, …` header. Sparse matrices are written row by
//! row without densifying the whole matrix.
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::matrix::FingerprintMatrix;

/// Reads the `smiles_col` column of a CSV file.
///
/// ```no_run
/// use molfp::data_io::read_smiles_csv;
/// let smiles = read_smiles_csv("data/dataset.csv", "smiles")?;
/// # Ok::<(), molfp::Error>(())
/// ```
pub fn read_smiles_csv<P: AsRef<Path>>(path: P, smiles_col: &str) -> Result<Vec<String>> {
    read_column(csv::Reader::from_path(path)?, smiles_col)
}

/// Reads the `smiles_col` column from any reader (useful for tests and
/// in-memory data).
pub fn read_smiles_csv_from_reader(reader: impl Read, smiles_col: &str) -> Result<Vec<String>> {
    read_column(csv::Reader::from_reader(reader), smiles_col)
}

fn read_column<R: Read>(mut rdr: csv::Reader<R>, column: &str) -> Result<Vec<String>> {
    let idx = rdr
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| Error::MissingColumn(column.to_string()))?;

    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let value = record
            .get(idx)
            .ok_or_else(|| Error::MissingColumn(column.to_string()))?;
        values.push(value.trim().to_string());
    }
    Ok(values)
}

/// Writes a fingerprint matrix as CSV with columns `fp_0..fp_{d-1}`.
pub fn write_fingerprints_csv(writer: impl Write, matrix: &FingerprintMatrix) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record((0..matrix.ncols()).map(|j| format!("fp_{j}")))?;

    match matrix {
        FingerprintMatrix::Dense(array) => {
            for row in array.rows() {
                wtr.write_record(row.iter().map(u32::to_string))?;
            }
        }
        FingerprintMatrix::Sparse(sparse) => {
            let mut row = vec![0u32; sparse.cols()];
            for vec in sparse.outer_iterator() {
                row.iter_mut().for_each(|v| *v = 0);
                for (col, &value) in vec.iter() {
                    row[col] = value;
                }
                wtr.write_record(row.iter().map(u32::to_string))?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

/// [`write_fingerprints_csv`] to a file path.
pub fn write_fingerprints_csv_to_path<P: AsRef<Path>>(
    path: P,
    matrix: &FingerprintMatrix,
) -> Result<()> {
    write_fingerprints_csv(std::fs::File::create(path)?, matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use sprs::CsMat;

    #[test]
    fn reads_smiles_column() {
        let data = "name,smiles,pIC50\nwater,O,6.0\nethanol, CCO ,5.0\n";
        let smiles = read_smiles_csv_from_reader(data.as_bytes(), "smiles").unwrap();
        assert_eq!(smiles, vec!["O", "CCO"]);
    }

    #[test]
    fn missing_column_is_reported() {
        let data = "name,pIC50\nwater,6.0\n";
        let err = read_smiles_csv_from_reader(data.as_bytes(), "smiles").unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "smiles"));
    }

    #[test]
    fn writes_dense_and_sparse_identically() {
        let dense = FingerprintMatrix::Dense(array![[0, 2, 0], [1, 0, 0]]);
        let sparse = FingerprintMatrix::Sparse(CsMat::new(
            (2, 3),
            vec![0, 1, 2],
            vec![1, 0],
            vec![2, 1],
        ));

        let mut a = Vec::new();
        let mut b = Vec::new();
        write_fingerprints_csv(&mut a, &dense).unwrap();
        write_fingerprints_csv(&mut b, &sparse).unwrap();
        assert_eq!(a, b);
        assert_eq!(String::from_utf8(a).unwrap(), "fp_0,fp_1,fp_2\n0,2,0\n1,0,0\n");
    }
}
