// src/fingerprints/maccs.rs
//! MACCS structural keys.
//!
//! 166 binary keys; key `k` is stored in column `k - 1`. Keys are presence
//! tests, so count output is not supported. The keys evaluated here are the
//! ones expressible on a hydrogen-suppressed graph without substructure
//! search; every other column stays zero.
//!
//! | Key | Meaning                   | Key | Meaning                   |
//! |-----|---------------------------|-----|---------------------------|
//! | 11  | 4-membered ring           | 145 | more than one 6-ring      |
//! | 22  | 3-membered ring           | 149 | more than one CH3         |
//! | 29  | P                         | 154 | C=O                       |
//! | 42  | F                         | 157 | C-O                       |
//! | 46  | Br                        | 158 | C-N                       |
//! | 88  | S                         | 160 | CH3                       |
//! | 96  | 5-membered ring           | 161 | N                         |
//! | 101 | ring of 8 or more atoms   | 162 | aromatic atom             |
//! | 103 | Cl                        | 163 | 6-membered ring           |
//! | 125 | more than one aromatic ring | 164 | O                       |
//! | 134 | halogen                   | 165 | ring                      |
//! | 139 | OH                        | 166 | more than one fragment    |

use serde::{Deserialize, Serialize};

use super::{linear_paths, FingerprintComputation};
use crate::error::ComputationError;
use crate::matrix::FeatureCounts;
use crate::molecule::{BondOrder, Molecule};

const N_KEYS: usize = 166;

/// MACCS keys. Has no parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaccsFingerprint {}

impl MaccsFingerprint {
    /// Creates the key set.
    pub fn new() -> Self {
        Self {}
    }
}

impl FingerprintComputation for MaccsFingerprint {
    fn name(&self) -> &'static str {
        "maccs"
    }

    fn n_features(&self) -> usize {
        N_KEYS
    }

    fn supports_count(&self) -> bool {
        false
    }

    fn features(&self, molecule: &Molecule) -> Result<FeatureCounts, ComputationError> {
        let mut keys = Keys::default();
        let has = |z: u8| molecule.atoms().iter().any(|a| a.atomic_number == z);

        for (key, z) in [(29, 15), (42, 9), (46, 35), (88, 16), (103, 17), (161, 7), (164, 8)] {
            keys.set(key, has(z));
        }
        keys.set(134, [9, 17, 35, 53].into_iter().any(has));
        keys.set(162, molecule.atoms().iter().any(|a| a.aromatic));

        let methyls = (0..molecule.atom_count())
            .filter(|&i| {
                let atom = molecule.atom(i);
                atom.atomic_number == 6 && !atom.aromatic && molecule.total_hydrogens(i) == 3
            })
            .count();
        keys.set(160, methyls > 0);
        keys.set(149, methyls > 1);

        keys.set(
            139,
            (0..molecule.atom_count())
                .any(|i| molecule.atom(i).atomic_number == 8 && molecule.total_hydrogens(i) > 0),
        );

        let bonded = |a: u8, b: u8, order: BondOrder| {
            molecule.bonds().iter().any(|bond| {
                let (x, y) = (
                    molecule.atom(bond.begin).atomic_number,
                    molecule.atom(bond.end).atomic_number,
                );
                bond.order == order && ((x, y) == (a, b) || (x, y) == (b, a))
            })
        };
        keys.set(154, bonded(6, 8, BondOrder::Double));
        keys.set(157, bonded(6, 8, BondOrder::Single));
        keys.set(158, bonded(6, 7, BondOrder::Single));

        let ring_bonds = molecule.ring_bonds();
        keys.set(165, ring_bonds.iter().any(|&r| r));
        keys.set(22, cycle_count(molecule, 3) > 0);
        keys.set(11, cycle_count(molecule, 4) > 0);
        keys.set(96, cycle_count(molecule, 5) > 0);
        let six = cycle_count(molecule, 6);
        keys.set(163, six > 0);
        keys.set(145, six > 1);
        keys.set(
            101,
            ring_bonds
                .iter()
                .enumerate()
                .filter(|&(_, &r)| r)
                .any(|(b, _)| molecule.smallest_ring_size(b).is_some_and(|s| s >= 8)),
        );
        keys.set(125, aromatic_ring_count(molecule) > 1);
        keys.set(166, molecule.component_count() > 1);

        Ok(keys.0)
    }
}

#[derive(Default)]
struct Keys(FeatureCounts);

impl Keys {
    fn set(&mut self, key: usize, on: bool) {
        if on {
            self.0.insert(key - 1, 1);
        }
    }
}

/// Number of simple cycles with exactly `size` atoms.
///
/// A cycle of `size` atoms contains `size` distinct open paths over the same
/// atoms, one per removed bond.
fn cycle_count(molecule: &Molecule, size: usize) -> usize {
    let closed = linear_paths(molecule, size, size)
        .into_iter()
        .filter(|p| molecule.bond_between(p[0], p[size - 1]).is_some())
        .count();
    closed / size
}

/// Independent cycles of the aromatic-bond subgraph: every aromatic bond
/// that closes a loop in a union-find forest adds one.
fn aromatic_ring_count(molecule: &Molecule) -> usize {
    let n = molecule.atom_count();
    let mut parent: Vec<usize> = (0..n).collect();
    let mut cycles = 0;

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for bond in molecule.bonds() {
        if bond.order != BondOrder::Aromatic {
            continue;
        }
        let (a, b) = (find(&mut parent, bond.begin), find(&mut parent, bond.end));
        if a == b {
            cycles += 1;
        } else {
            parent[a] = b;
        }
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(smiles: &str) -> Vec<usize> {
        let fp = MaccsFingerprint::new();
        fp.features(&Molecule::from_smiles(smiles).unwrap())
            .unwrap()
            .keys()
            .map(|col| col + 1)
            .collect()
    }

    #[test]
    fn ethanol_keys() {
        assert_eq!(keys("CCO"), vec![139, 157, 160, 164]);
    }

    #[test]
    fn benzene_keys() {
        assert_eq!(keys("c1ccccc1"), vec![162, 163, 165]);
    }

    #[test]
    fn naphthalene_has_two_aromatic_rings() {
        let k = keys("c1ccc2ccccc2c1");
        assert!(k.contains(&125));
        assert!(k.contains(&145));
    }

    #[test]
    fn small_and_large_rings() {
        assert!(keys("C1CC1").contains(&22));
        assert!(keys("C1CCC1").contains(&11));
        assert!(keys("C1CCCC1").contains(&96));
        assert!(keys("C1CCCCCCC1").contains(&101));
        assert!(!keys("C1CCCCC1").contains(&101));
    }

    #[test]
    fn salts_and_halogens() {
        let k = keys("CCCl.[Na+]");
        assert!(k.contains(&103));
        assert!(k.contains(&134));
        assert!(k.contains(&166));
    }

    #[test]
    fn water_sets_oxygen_keys_only() {
        assert_eq!(keys("O"), vec![139, 164]);
    }

    #[test]
    fn counts_are_not_supported() {
        assert!(!MaccsFingerprint::new().supports_count());
        assert_eq!(MaccsFingerprint::new().n_features(), 166);
    }
}
