// src/fingerprints/path.rs
//! Linear path (Daylight-like) fingerprint.
//!
//! Enumerates every simple path of `min_path..=max_path` bonds and hashes its
//! sequence of atom and bond tokens, read in the direction that gives the
//! smaller sequence. Single atoms are not paths, so a molecule without bonds
//! yields an all-zero row.

use serde::{Deserialize, Serialize};

use super::{add_hashed, check_fp_size, hash_feature, linear_paths, FingerprintComputation};
use crate::error::{ComputationError, Error, Result};
use crate::matrix::FeatureCounts;
use crate::molecule::Molecule;

const MAX_PATH: usize = 32;

/// Path fingerprint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathFingerprint {
    /// Number of folded columns.
    pub fp_size: usize,
    /// Shortest path, in bonds.
    pub min_path: usize,
    /// Longest path, in bonds.
    pub max_path: usize,
    /// Distinguish paths by bond order.
    pub use_bond_order: bool,
}

impl Default for PathFingerprint {
    fn default() -> Self {
        Self {
            fp_size: 512,
            min_path: 1,
            max_path: 7,
            use_bond_order: true,
        }
    }
}

impl FingerprintComputation for PathFingerprint {
    fn name(&self) -> &'static str {
        "path"
    }

    fn n_features(&self) -> usize {
        self.fp_size
    }

    fn validate(&self) -> Result<()> {
        check_fp_size(self.name(), self.fp_size)?;
        if self.min_path == 0 || self.min_path > self.max_path || self.max_path > MAX_PATH {
            return Err(Error::configuration(format!(
                "path: need 1 <= min_path <= max_path <= {MAX_PATH}, got {}..={}",
                self.min_path, self.max_path
            )));
        }
        Ok(())
    }

    fn features(&self, molecule: &Molecule) -> Result<FeatureCounts, ComputationError> {
        let mut counts = FeatureCounts::new();
        for path in linear_paths(molecule, self.min_path + 1, self.max_path + 1) {
            let mut forward = Vec::with_capacity(2 * path.len() - 1);
            for (pos, &atom) in path.iter().enumerate() {
                if pos > 0 {
                    forward.push(self.bond_token(molecule, path[pos - 1], atom));
                }
                let a = molecule.atom(atom);
                forward.push(u16::from(a.atomic_number) | (u16::from(a.aromatic) << 8));
            }
            let reverse: Vec<u16> = forward.iter().rev().copied().collect();
            let key = forward.min(reverse);
            add_hashed(&mut counts, hash_feature(&key), self.fp_size);
        }
        Ok(counts)
    }
}

impl PathFingerprint {
    fn bond_token(&self, molecule: &Molecule, a: usize, b: usize) -> u16 {
        let code = match molecule.bond_between(a, b) {
            Some(bond) if self.use_bond_order => bond.order.code(),
            _ => 0,
        };
        // keep bond tokens apart from atom tokens
        0x1000 | u16::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(fp: &PathFingerprint, smiles: &str) -> FeatureCounts {
        fp.features(&Molecule::from_smiles(smiles).unwrap()).unwrap()
    }

    #[test]
    fn single_atoms_give_empty_rows() {
        let fp = PathFingerprint::default();
        assert!(features(&fp, "O").is_empty());
        assert!(features(&fp, "[Na+].[Cl-]").is_empty());
    }

    #[test]
    fn ethanol_paths() {
        let fp = PathFingerprint::default();
        // C-C, C-O, C-C-O
        let counts = features(&fp, "CCO");
        assert_eq!(counts.values().sum::<u32>(), 3);
    }

    #[test]
    fn direction_does_not_matter() {
        let fp = PathFingerprint::default();
        assert_eq!(features(&fp, "OCC"), features(&fp, "CCO"));
    }

    #[test]
    fn bond_order_can_be_ignored() {
        let plain = PathFingerprint {
            use_bond_order: false,
            ..PathFingerprint::default()
        };
        assert_eq!(features(&plain, "C=C"), features(&plain, "CC"));
        let typed = PathFingerprint::default();
        assert_ne!(features(&typed, "C=C"), features(&typed, "CC"));
    }

    #[test]
    fn invalid_lengths_are_rejected() {
        let fp = PathFingerprint {
            min_path: 0,
            ..PathFingerprint::default()
        };
        assert!(fp.validate().is_err());
        let fp = PathFingerprint {
            min_path: 4,
            max_path: 2,
            ..PathFingerprint::default()
        };
        assert!(fp.validate().is_err());
    }

    #[test]
    fn path_length_is_bounded() {
        let at_limit = PathFingerprint {
            max_path: MAX_PATH,
            ..PathFingerprint::default()
        };
        assert!(at_limit.validate().is_ok());
        for max_path in [MAX_PATH + 1, usize::MAX] {
            let fp = PathFingerprint {
                max_path,
                ..PathFingerprint::default()
            };
            assert!(matches!(fp.validate(), Err(Error::Configuration(_))));
        }
    }
}
