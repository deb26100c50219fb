// src/fingerprints.rs
//! Fingerprint algorithms.
//!
//! Every algorithm implements [`FingerprintComputation`]: it maps one
//! [`Molecule`] to a set of folded feature indices with occurrence counts.
//! The provided [`FingerprintComputation::compute`] turns a batch of molecules
//! into a chunk matrix in the requested [`OutputFormat`], which is what the
//! parallel dispatcher calls once per chunk.
//!
//! | Type                            | Columns (default) | Counts | Features                                 |
//! |---------------------------------|-------------------|--------|------------------------------------------|
//! | [`MorganFingerprint`]           | 2048              | yes    | circular atom environments (ECFP-like)   |
//! | [`AtomPairFingerprint`]         | 2048              | yes    | atom pairs with topological distance     |
//! | [`TopologicalTorsionFingerprint`] | 2048            | yes    | linear paths of four atoms               |
//! | [`PathFingerprint`]             | 512               | yes    | linear bond paths of 1–7 bonds           |
//! | [`MaccsFingerprint`]            | 166               | no     | structural keys                          |
//!
//! Hashed features use [`std::collections::hash_map::DefaultHasher`] created
//! with fixed keys, so a given molecule always produces the same row on every
//! thread and every run of the same build.

pub mod atom_pair;
pub mod maccs;
pub mod morgan;
pub mod path;
pub mod torsion;

pub use atom_pair::AtomPairFingerprint;
pub use maccs::MaccsFingerprint;
pub use morgan::MorganFingerprint;
pub use path::PathFingerprint;
pub use torsion::TopologicalTorsionFingerprint;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{ComputationError, Error, Result};
use crate::matrix::{FeatureCounts, FingerprintMatrix, MatrixBuilder, OutputFormat};
use crate::molecule::Molecule;

/// A fingerprint algorithm that can be run on independent chunks of
/// molecules.
///
/// Implementations hold only their parameters; they are shared read-only by
/// every worker, so they must be `Send + Sync`.
pub trait FingerprintComputation: Send + Sync {
    /// Short identifier used in errors and logs.
    fn name(&self) -> &'static str;

    /// Number of output columns.
    fn n_features(&self) -> usize;

    /// Whether occurrence counts are meaningful for this algorithm.
    fn supports_count(&self) -> bool {
        true
    }

    /// Checks the algorithm parameters.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Features of one molecule as `column → count`.
    ///
    /// Every column must be below [`n_features`](Self::n_features).
    fn features(&self, molecule: &Molecule) -> Result<FeatureCounts, ComputationError>;

    /// Fingerprints a chunk of molecules, one row per molecule.
    ///
    /// # Errors
    ///
    /// The first molecule the algorithm rejects fails the chunk with
    /// [`Error::Computation`], indexed within `molecules`.
    fn compute(&self, molecules: &[Molecule], format: OutputFormat) -> Result<FingerprintMatrix> {
        let mut builder = MatrixBuilder::new(self.n_features(), format, molecules.len());
        for (i, molecule) in molecules.iter().enumerate() {
            let features = self
                .features(molecule)
                .map_err(|source| Error::Computation { molecule: i, source })?;
            builder.push_row(self.name(), i, &features)?;
        }
        builder.finish()
    }
}

/// Hashes any feature key to 64 bits.
pub(crate) fn hash_feature<T: Hash + ?Sized>(key: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// Folds a 64-bit hash into `0..fp_size` and counts it.
pub(crate) fn add_hashed(counts: &mut FeatureCounts, hash: u64, fp_size: usize) {
    let bit = (hash % fp_size as u64) as usize;
    *counts.entry(bit).or_insert(0) += 1;
}

pub(crate) fn check_fp_size(name: &str, fp_size: usize) -> Result<()> {
    if fp_size == 0 {
        return Err(Error::configuration(format!(
            "{name}: fp_size must be at least 1"
        )));
    }
    Ok(())
}

/// Packed atom code shared by the atom-pair and torsion fingerprints:
/// 3 bits of branch count, 2 bits of pi electrons, then the atomic number.
///
/// `skip` neighbours are not counted as branches (path neighbours in a
/// torsion).
pub(crate) fn atom_code(
    name: &'static str,
    molecule: &Molecule,
    atom: usize,
    skip: usize,
) -> Result<u32, ComputationError> {
    let degree = molecule.degree(atom);
    if degree > MAX_ENCODED_DEGREE {
        return Err(ComputationError::new(
            name,
            format!(
                "atom {atom} ({}) has {degree} heavy-atom neighbours, at most {MAX_ENCODED_DEGREE} can be encoded",
                molecule.atom(atom).symbol()
            ),
        ));
    }
    let branches = degree.saturating_sub(skip) as u32;
    let pi = u32::from(molecule.pi_electrons(atom).min(3));
    let z = u32::from(molecule.atom(atom).atomic_number);
    Ok(branches | (pi << 3) | (z << 5))
}

const MAX_ENCODED_DEGREE: usize = 7;

/// All simple paths with `min_atoms..=max_atoms` atoms (at least two), each
/// reported once, starting at its lower-indexed end.
pub(crate) fn linear_paths(molecule: &Molecule, min_atoms: usize, max_atoms: usize) -> Vec<Vec<usize>> {
    let mut walk = PathWalk {
        molecule,
        min_atoms: min_atoms.max(2),
        max_atoms,
        path: Vec::with_capacity(max_atoms.min(molecule.atom_count())),
        on_path: vec![false; molecule.atom_count()],
        found: Vec::new(),
    };
    for start in 0..molecule.atom_count() {
        walk.grow(start);
    }
    walk.found
}

struct PathWalk<'a> {
    molecule: &'a Molecule,
    min_atoms: usize,
    max_atoms: usize,
    path: Vec<usize>,
    on_path: Vec<bool>,
    found: Vec<Vec<usize>>,
}

impl PathWalk<'_> {
    fn grow(&mut self, atom: usize) {
        self.path.push(atom);
        self.on_path[atom] = true;

        if self.path.len() >= self.min_atoms && self.path[0] < atom {
            self.found.push(self.path.clone());
        }
        if self.path.len() < self.max_atoms {
            for &(nbr, _) in self.molecule.neighbors(atom) {
                if !self.on_path[nbr] {
                    self.grow(nbr);
                }
            }
        }

        self.on_path[atom] = false;
        self.path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mol(smiles: &str) -> Molecule {
        Molecule::from_smiles(smiles).unwrap()
    }

    #[test]
    fn paths_are_reported_once() {
        // propane: 0-1, 1-2, 0-1-2
        let paths = linear_paths(&mol("CCC"), 2, 3);
        assert_eq!(paths, vec![vec![0, 1], vec![0, 1, 2], vec![1, 2]]);
    }

    #[test]
    fn ring_paths_go_both_ways_round() {
        // cyclopropane: three bonds and three two-bond paths
        let paths = linear_paths(&mol("C1CC1"), 2, 3);
        assert_eq!(paths.iter().filter(|p| p.len() == 2).count(), 3);
        assert_eq!(paths.iter().filter(|p| p.len() == 3).count(), 3);
    }

    #[test]
    fn atom_code_rejects_high_degree() {
        let m = mol("[S](F)(F)(F)(F)(F)(F)(F)F");
        let err = atom_code("atom_pair", &m, 0, 0).unwrap_err();
        assert_eq!(err.fingerprint, "atom_pair");
        assert!(err.detail.contains("8 heavy-atom neighbours"));
        assert!(atom_code("atom_pair", &m, 1, 0).is_ok());
    }

    #[test]
    fn hashing_is_stable() {
        assert_eq!(hash_feature(&(6u8, 2usize)), hash_feature(&(6u8, 2usize)));
        assert_ne!(hash_feature(&(6u8, 2usize)), hash_feature(&(7u8, 2usize)));
    }
}
