// src/fingerprints/torsion.rs
//! Topological-torsion fingerprint.
//!
//! A torsion is a linear path of `torsion_atom_count` atoms. End atoms are
//! coded with their branches minus the path neighbour, inner atoms with their
//! branches minus both path neighbours. The path is read in whichever
//! direction gives the smaller code sequence so that it is counted the same
//! from both ends.

use serde::{Deserialize, Serialize};

use super::{
    add_hashed, atom_code, check_fp_size, hash_feature, linear_paths, FingerprintComputation,
};
use crate::error::{ComputationError, Error, Result};
use crate::matrix::FeatureCounts;
use crate::molecule::Molecule;

const MAX_TORSION_ATOMS: usize = 32;

/// Topological-torsion fingerprint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologicalTorsionFingerprint {
    /// Number of folded columns.
    pub fp_size: usize,
    /// Atoms per torsion path.
    pub torsion_atom_count: usize,
}

impl Default for TopologicalTorsionFingerprint {
    fn default() -> Self {
        Self {
            fp_size: 2048,
            torsion_atom_count: 4,
        }
    }
}

impl FingerprintComputation for TopologicalTorsionFingerprint {
    fn name(&self) -> &'static str {
        "topological_torsion"
    }

    fn n_features(&self) -> usize {
        self.fp_size
    }

    fn validate(&self) -> Result<()> {
        check_fp_size(self.name(), self.fp_size)?;
        if !(2..=MAX_TORSION_ATOMS).contains(&self.torsion_atom_count) {
            return Err(Error::configuration(format!(
                "topological_torsion: torsion_atom_count must be in 2..={MAX_TORSION_ATOMS}, got {}",
                self.torsion_atom_count
            )));
        }
        Ok(())
    }

    fn features(&self, molecule: &Molecule) -> Result<FeatureCounts, ComputationError> {
        let k = self.torsion_atom_count;
        let mut counts = FeatureCounts::new();
        for path in linear_paths(molecule, k, k) {
            let forward = path
                .iter()
                .enumerate()
                .map(|(pos, &atom)| {
                    let skip = if pos == 0 || pos + 1 == k { 1 } else { 2 };
                    atom_code(self.name(), molecule, atom, skip)
                })
                .collect::<Result<Vec<_>, _>>()?;
            let reverse: Vec<u32> = forward.iter().rev().copied().collect();
            let key = forward.min(reverse);
            add_hashed(&mut counts, hash_feature(&key), self.fp_size);
        }
        Ok(counts)
    }
}
