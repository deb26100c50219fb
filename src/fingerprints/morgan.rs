// src/fingerprints/morgan.rs
//! Morgan (circular, ECFP-like) fingerprint.
//!
//! Each atom starts from an invariant built from its atomic number, heavy
//! degree, total hydrogen count, formal charge, isotope and ring membership.
//! Every iteration rehashes an atom's identifier together with the sorted
//! `(bond, neighbour identifier)` pairs around it, so iteration `r` describes
//! the environment of radius `r`. Identifiers from iterations `0..=radius` are
//! folded into `fp_size` columns.
//!
//! ```
//! use molfp::fingerprints::MorganFingerprint;
//! use molfp::{FingerprintComputation, Molecule};
//!
//! let fp = MorganFingerprint::default();
//! let ethanol = fp.features(&Molecule::from_smiles("CCO").unwrap()).unwrap();
//! // three atoms, three environments per atom at radius 2
//! assert_eq!(ethanol.values().sum::<u32>(), 9);
//! ```

use serde::{Deserialize, Serialize};

use super::{add_hashed, check_fp_size, hash_feature, FingerprintComputation};
use crate::error::{ComputationError, Error, Result};
use crate::matrix::FeatureCounts;
use crate::molecule::Molecule;

/// Circular fingerprint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorganFingerprint {
    /// Number of folded columns.
    pub fp_size: usize,
    /// Largest environment radius, in bonds.
    pub radius: usize,
    /// Distinguish neighbours by bond order.
    pub use_bond_types: bool,
    /// Include ring membership in the initial atom invariant.
    pub include_ring_membership: bool,
}

impl Default for MorganFingerprint {
    fn default() -> Self {
        Self {
            fp_size: 2048,
            radius: 2,
            use_bond_types: true,
            include_ring_membership: true,
        }
    }
}

impl FingerprintComputation for MorganFingerprint {
    fn name(&self) -> &'static str {
        "morgan"
    }

    fn n_features(&self) -> usize {
        self.fp_size
    }

    fn validate(&self) -> Result<()> {
        check_fp_size(self.name(), self.fp_size)?;
        if self.radius > 16 {
            return Err(Error::configuration(format!(
                "morgan: radius {} is too large (at most 16)",
                self.radius
            )));
        }
        Ok(())
    }

    fn features(&self, molecule: &Molecule) -> Result<FeatureCounts, ComputationError> {
        let n = molecule.atom_count();
        let in_ring = if self.include_ring_membership {
            molecule.ring_atoms()
        } else {
            vec![false; n]
        };

        let mut ids: Vec<u64> = (0..n)
            .map(|i| {
                let atom = molecule.atom(i);
                hash_feature(&(
                    atom.atomic_number,
                    molecule.degree(i),
                    molecule.total_hydrogens(i),
                    atom.charge,
                    atom.isotope.unwrap_or(0),
                    in_ring[i],
                ))
            })
            .collect();

        let mut counts = FeatureCounts::new();
        for &id in &ids {
            add_hashed(&mut counts, id, self.fp_size);
        }

        for iteration in 1..=self.radius {
            let next: Vec<u64> = (0..n)
                .map(|i| {
                    let mut around: Vec<(u8, u64)> = molecule
                        .neighbors(i)
                        .iter()
                        .map(|&(nbr, bond)| {
                            let order = if self.use_bond_types {
                                molecule.bonds()[bond].order.code()
                            } else {
                                0
                            };
                            (order, ids[nbr])
                        })
                        .collect();
                    around.sort_unstable();
                    hash_feature(&(iteration, ids[i], around))
                })
                .collect();
            for &id in &next {
                add_hashed(&mut counts, id, self.fp_size);
            }
            ids = next;
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(fp: &MorganFingerprint, smiles: &str) -> FeatureCounts {
        fp.features(&Molecule::from_smiles(smiles).unwrap()).unwrap()
    }

    #[test]
    fn symmetric_atoms_share_identifiers() {
        let fp = MorganFingerprint::default();
        // benzene: every atom is equivalent at every radius
        let counts = features(&fp, "c1ccccc1");
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|&c| c == 6));
    }

    #[test]
    fn radius_zero_only_hashes_atoms() {
        let fp = MorganFingerprint {
            radius: 0,
            ..MorganFingerprint::default()
        };
        let counts = features(&fp, "CC");
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.values().sum::<u32>(), 2);
    }

    #[test]
    fn bond_types_separate_isomers() {
        let typed = MorganFingerprint::default();
        assert_ne!(features(&typed, "C=CC"), features(&typed, "CCC"));
    }

    #[test]
    fn columns_fit_the_fold() {
        let fp = MorganFingerprint {
            fp_size: 64,
            ..MorganFingerprint::default()
        };
        let counts = features(&fp, "CC(=O)Oc1ccccc1C(=O)O");
        assert!(counts.keys().all(|&k| k < 64));
    }

    #[test]
    fn zero_width_is_rejected() {
        let fp = MorganFingerprint {
            fp_size: 0,
            ..MorganFingerprint::default()
        };
        assert!(matches!(fp.validate(), Err(Error::Configuration(_))));
    }
}
