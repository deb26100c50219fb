// src/fingerprints/atom_pair.rs
//! Atom-pair fingerprint.
//!
//! Every unordered pair of atoms contributes one feature made of both atom
//! codes (branch count, pi electrons, element) and their topological distance
//! from the Floyd–Warshall distance matrix. Pairs outside
//! `min_distance..=max_distance` and pairs in different fragments are
//! skipped.

use serde::{Deserialize, Serialize};

use super::{add_hashed, atom_code, check_fp_size, hash_feature, FingerprintComputation};
use crate::error::{ComputationError, Error, Result};
use crate::matrix::FeatureCounts;
use crate::molecule::Molecule;

/// Atom-pair fingerprint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtomPairFingerprint {
    /// Number of folded columns.
    pub fp_size: usize,
    /// Shortest pair distance counted, in bonds.
    pub min_distance: u32,
    /// Longest pair distance counted, in bonds.
    pub max_distance: u32,
}

impl Default for AtomPairFingerprint {
    fn default() -> Self {
        Self {
            fp_size: 2048,
            min_distance: 1,
            max_distance: 30,
        }
    }
}

impl FingerprintComputation for AtomPairFingerprint {
    fn name(&self) -> &'static str {
        "atom_pair"
    }

    fn n_features(&self) -> usize {
        self.fp_size
    }

    fn validate(&self) -> Result<()> {
        check_fp_size(self.name(), self.fp_size)?;
        if self.min_distance > self.max_distance {
            return Err(Error::configuration(format!(
                "atom_pair: min_distance {} exceeds max_distance {}",
                self.min_distance, self.max_distance
            )));
        }
        Ok(())
    }

    fn features(&self, molecule: &Molecule) -> Result<FeatureCounts, ComputationError> {
        let n = molecule.atom_count();
        let codes = (0..n)
            .map(|i| atom_code(self.name(), molecule, i, 0))
            .collect::<Result<Vec<_>, _>>()?;
        let dist = molecule.distance_matrix();

        let mut counts = FeatureCounts::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let d = dist[i][j];
                if d == u32::MAX || d < self.min_distance || d > self.max_distance {
                    continue;
                }
                let (a, b) = (codes[i].min(codes[j]), codes[i].max(codes[j]));
                add_hashed(&mut counts, hash_feature(&(a, d, b)), self.fp_size);
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mol(smiles: &str) -> Molecule {
        Molecule::from_smiles(smiles).unwrap()
    }

    #[test]
    fn counts_every_connected_pair() {
        let fp = AtomPairFingerprint::default();
        let counts = fp.features(&mol("CCO")).unwrap();
        assert_eq!(counts.values().sum::<u32>(), 3);
    }

    #[test]
    fn distance_window_filters_pairs() {
        let fp = AtomPairFingerprint {
            min_distance: 2,
            max_distance: 2,
            ..AtomPairFingerprint::default()
        };
        // only C1..O at distance 2
        assert_eq!(fp.features(&mol("CCO")).unwrap().values().sum::<u32>(), 1);
    }

    #[test]
    fn fragments_do_not_pair() {
        let fp = AtomPairFingerprint::default();
        assert!(fp.features(&mol("C.C")).unwrap().is_empty());
    }

    #[test]
    fn single_atom_has_no_pairs() {
        let fp = AtomPairFingerprint::default();
        assert!(fp.features(&mol("O")).unwrap().is_empty());
    }

    #[test]
    fn hypervalent_centre_is_rejected() {
        let fp = AtomPairFingerprint::default();
        let err = fp.features(&mol("[S](F)(F)(F)(F)(F)(F)(F)F")).unwrap_err();
        assert_eq!(err.fingerprint, "atom_pair");
    }

    #[test]
    fn inverted_window_is_a_configuration_error() {
        let fp = AtomPairFingerprint {
            min_distance: 5,
            max_distance: 2,
            ..AtomPairFingerprint::default()
        };
        assert!(matches!(fp.validate(), Err(Error::Configuration(_))));
    }
}
