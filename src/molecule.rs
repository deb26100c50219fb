// src/molecule.rs
//! In-memory molecular graph consumed by the fingerprint plugins.
//!
//! A [`Molecule`] is an immutable, hydrogen-suppressed graph: heavy atoms are
//! vertices, bonds are edges, and hydrogens are carried as per-atom counts.
//! Molecules are produced by the SMILES reader in [`smiles`] (or built
//! directly with [`Molecule::new`]) and written back with [`writer`].
//!
//! The graph exposes the handful of queries fingerprints need:
//!
//! | Query                     | Meaning                                             |
//! |---------------------------|-----------------------------------------------------|
//! | `degree`                  | number of heavy-atom neighbours                     |
//! | `total_hydrogens`         | explicit (bracket) or implicit hydrogen count       |
//! | `ring_bonds`              | bonds that are part of at least one cycle           |
//! | `smallest_ring_size`      | size of the smallest cycle through a ring bond      |
//! | `distance_matrix`         | topological (bond-count) distances between atoms    |
//! | `component_count`         | number of disconnected fragments                    |
//!
//! # Example
//!
//! ```
//! use molfp::Molecule;
//!
//! let ethanol = Molecule::from_smiles("CCO").unwrap();
//! assert_eq!(ethanol.atom_count(), 3);
//! assert_eq!(ethanol.total_hydrogens(0), 3);
//! assert_eq!(ethanol.total_hydrogens(2), 1);
//! ```

pub mod smiles;
pub mod writer;

use std::collections::VecDeque;

use thiserror::Error;

pub use smiles::{parse_smiles, SmilesError, SmilesParser};
pub use writer::{to_smiles, SmilesWriter};

/// Chemical bond order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    /// Single bond (`-` or implicit).
    Single,
    /// Double bond (`=`).
    Double,
    /// Triple bond (`#`).
    Triple,
    /// Aromatic bond (`:` or implicit between aromatic atoms).
    Aromatic,
}

impl BondOrder {
    /// Contribution of this bond to the valence of either endpoint.
    ///
    /// Aromatic bonds count as one; the extra half-bond of an aromatic atom
    /// is added once per atom in [`Molecule::valence`].
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    /// Small stable integer used when hashing bond environments.
    pub fn code(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }

    /// SMILES bond symbol.
    pub fn symbol(self) -> char {
        match self {
            BondOrder::Single => '-',
            BondOrder::Double => '=',
            BondOrder::Triple => '#',
            BondOrder::Aromatic => ':',
        }
    }
}

/// A heavy atom with its hydrogen-suppressed properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    /// Atomic number (1..=86).
    pub atomic_number: u8,
    /// Whether the atom is part of an aromatic system.
    pub aromatic: bool,
    /// Formal charge.
    pub charge: i8,
    /// Mass number, if specified.
    pub isotope: Option<u16>,
    /// Hydrogen count given explicitly (bracket atoms). `None` means the
    /// count is derived from the default valence.
    pub hydrogens: Option<u8>,
}

impl Atom {
    /// Creates a neutral, non-aromatic atom with implicit hydrogens.
    pub fn new(atomic_number: u8) -> Self {
        Self {
            atomic_number,
            aromatic: false,
            charge: 0,
            isotope: None,
            hydrogens: None,
        }
    }

    /// Element symbol, e.g. `"C"` or `"Cl"`.
    pub fn symbol(&self) -> &'static str {
        element_symbol(self.atomic_number).unwrap_or("*")
    }

    /// Whether the atom can be written without brackets in SMILES.
    pub fn is_organic_subset(&self) -> bool {
        default_valences(self.atomic_number).is_some()
    }
}

/// A bond between two atoms, by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    /// First atom index.
    pub begin: usize,
    /// Second atom index.
    pub end: usize,
    /// Bond order.
    pub order: BondOrder,
}

impl Bond {
    /// Creates a new bond.
    pub fn new(begin: usize, end: usize, order: BondOrder) -> Self {
        Self { begin, end, order }
    }

    /// The endpoint opposite to `atom`.
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

/// Structural problems detected while assembling a [`Molecule`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A bond references an atom that does not exist.
    #[error("bond {bond} references atom {atom}, but the molecule has {atom_count} atoms")]
    AtomOutOfRange {
        /// Bond index.
        bond: usize,
        /// Offending atom index.
        atom: usize,
        /// Number of atoms in the molecule.
        atom_count: usize,
    },

    /// A bond connects an atom to itself.
    #[error("bond {bond} connects atom {atom} to itself")]
    SelfLoop {
        /// Bond index.
        bond: usize,
        /// Atom index.
        atom: usize,
    },

    /// Two bonds connect the same pair of atoms.
    #[error("atoms {begin} and {end} are bonded more than once")]
    DuplicateBond {
        /// First atom index.
        begin: usize,
        /// Second atom index.
        end: usize,
    },

    /// An atom carries an unknown atomic number.
    #[error("atom {atom} has unsupported atomic number {atomic_number}")]
    UnknownElement {
        /// Atom index.
        atom: usize,
        /// Atomic number found.
        atomic_number: u8,
    },
}

/// Immutable hydrogen-suppressed molecular graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// `adjacency[i]` lists `(neighbour, bond index)` sorted by neighbour.
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    /// Assembles a molecule from atoms and bonds.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] if a bond references a missing atom, loops on
    /// one atom, duplicates another bond, or an atom has an unknown element.
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Result<Self, GraphError> {
        for (i, atom) in atoms.iter().enumerate() {
            if element_symbol(atom.atomic_number).is_none() {
                return Err(GraphError::UnknownElement {
                    atom: i,
                    atomic_number: atom.atomic_number,
                });
            }
        }

        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (b, bond) in bonds.iter().enumerate() {
            for atom in [bond.begin, bond.end] {
                if atom >= atoms.len() {
                    return Err(GraphError::AtomOutOfRange {
                        bond: b,
                        atom,
                        atom_count: atoms.len(),
                    });
                }
            }
            if bond.begin == bond.end {
                return Err(GraphError::SelfLoop {
                    bond: b,
                    atom: bond.begin,
                });
            }
            if adjacency[bond.begin]
                .iter()
                .any(|&(nbr, _)| nbr == bond.end)
            {
                return Err(GraphError::DuplicateBond {
                    begin: bond.begin.min(bond.end),
                    end: bond.begin.max(bond.end),
                });
            }
            adjacency[bond.begin].push((bond.end, b));
            adjacency[bond.end].push((bond.begin, b));
        }
        for list in &mut adjacency {
            list.sort_unstable();
        }

        Ok(Self {
            atoms,
            bonds,
            adjacency,
        })
    }

    /// Parses a SMILES string with default (sanitizing) options.
    ///
    /// # Errors
    ///
    /// Returns a [`SmilesError`] describing the first syntax or valence
    /// problem encountered.
    pub fn from_smiles(smiles: &str) -> Result<Self, SmilesError> {
        parse_smiles(smiles)
    }

    /// Writes the molecule as SMILES with default options.
    pub fn to_smiles(&self) -> String {
        to_smiles(self)
    }

    /// Number of heavy atoms.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// All atoms, in input order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// All bonds, in input order.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// The atom at `index`.
    pub fn atom(&self, index: usize) -> &Atom {
        &self.atoms[index]
    }

    /// Neighbours of `atom` as `(neighbour, bond index)`, sorted by neighbour.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    /// The bond joining atoms `a` and `b`, if any.
    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        let list = &self.adjacency[a];
        list.binary_search_by_key(&b, |&(nbr, _)| nbr)
            .ok()
            .map(|pos| &self.bonds[list[pos].1])
    }

    /// Number of heavy-atom neighbours.
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Bond-order sum of `atom`, counting one extra unit for aromatic atoms.
    ///
    /// Aromatic chalcogens (`o`, `s`, `se`) donate a lone pair instead and get
    /// no extra unit. Saturates at `u8::MAX`.
    pub fn valence(&self, atom: usize) -> u8 {
        let bonded = self.adjacency[atom]
            .iter()
            .fold(0u8, |sum, &(_, b)| sum.saturating_add(self.bonds[b].order.valence()));
        let a = &self.atoms[atom];
        let pi_bond = a.aromatic && !matches!(a.atomic_number, 8 | 16 | 34);
        bonded.saturating_add(u8::from(pi_bond))
    }

    /// Explicit hydrogen count for bracket atoms, otherwise the number of
    /// hydrogens needed to reach the smallest default valence.
    pub fn total_hydrogens(&self, atom: usize) -> u8 {
        match self.atoms[atom].hydrogens {
            Some(h) => h,
            None => self.implicit_hydrogens(atom),
        }
    }

    /// Hydrogens implied by the default valence of an organic-subset atom.
    pub(crate) fn implicit_hydrogens(&self, atom: usize) -> u8 {
        let used = self.valence(atom);
        default_valences(self.atoms[atom].atomic_number)
            .and_then(|valences| valences.iter().find(|&&v| v >= used))
            .map(|&v| v - used)
            .unwrap_or(0)
    }

    /// Number of pi electrons contributed by multiple and aromatic bonds.
    pub fn pi_electrons(&self, atom: usize) -> u8 {
        let multiple = self.adjacency[atom]
            .iter()
            .fold(0u8, |sum, &(_, b)| sum.saturating_add(self.bonds[b].order.valence() - 1));
        multiple.saturating_add(u8::from(self.atoms[atom].aromatic))
    }

    /// Marks every bond that lies on a cycle.
    ///
    /// A bond is a ring bond iff it is not a bridge of the graph.
    pub fn ring_bonds(&self) -> Vec<bool> {
        let n = self.atoms.len();
        let mut discovery = vec![usize::MAX; n];
        let mut low = vec![0usize; n];
        let mut is_bridge = vec![false; self.bonds.len()];
        let mut timer = 0usize;

        for root in 0..n {
            if discovery[root] != usize::MAX {
                continue;
            }
            // Iterative Tarjan: (atom, parent bond, next neighbour slot)
            let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
            discovery[root] = timer;
            low[root] = timer;
            timer += 1;

            while let Some(top) = stack.last_mut() {
                let (u, parent_bond, slot) = *top;
                if let Some(&(v, b)) = self.adjacency[u].get(slot) {
                    top.2 += 1;
                    if Some(b) == parent_bond {
                        continue;
                    }
                    if discovery[v] == usize::MAX {
                        discovery[v] = timer;
                        low[v] = timer;
                        timer += 1;
                        stack.push((v, Some(b), 0));
                    } else {
                        low[u] = low[u].min(discovery[v]);
                    }
                } else {
                    stack.pop();
                    if let (Some(b), Some(&(p, _, _))) = (parent_bond, stack.last()) {
                        low[p] = low[p].min(low[u]);
                        if low[u] > discovery[p] {
                            is_bridge[b] = true;
                        }
                    }
                }
            }
        }

        is_bridge.into_iter().map(|bridge| !bridge).collect()
    }

    /// Marks every atom that belongs to at least one ring.
    pub fn ring_atoms(&self) -> Vec<bool> {
        let mut in_ring = vec![false; self.atoms.len()];
        for (bond, ring) in self.bonds.iter().zip(self.ring_bonds()) {
            if ring {
                in_ring[bond.begin] = true;
                in_ring[bond.end] = true;
            }
        }
        in_ring
    }

    /// Size of the smallest cycle passing through `bond`, or `None` for
    /// acyclic bonds.
    pub fn smallest_ring_size(&self, bond: usize) -> Option<usize> {
        let Bond { begin, end, .. } = self.bonds[bond];
        let mut dist = vec![usize::MAX; self.atoms.len()];
        let mut queue = VecDeque::from([begin]);
        dist[begin] = 0;

        while let Some(u) = queue.pop_front() {
            for &(v, b) in &self.adjacency[u] {
                if b == bond || dist[v] != usize::MAX {
                    continue;
                }
                dist[v] = dist[u] + 1;
                if v == end {
                    return Some(dist[v] + 1);
                }
                queue.push_back(v);
            }
        }
        None
    }

    /// All-pairs topological distances (number of bonds on the shortest
    /// path). Disconnected pairs hold `u32::MAX`.
    pub fn distance_matrix(&self) -> Vec<Vec<u32>> {
        let n = self.atoms.len();
        let mut dist = vec![vec![u32::MAX; n]; n];
        for (i, row) in dist.iter_mut().enumerate() {
            row[i] = 0;
        }
        for bond in &self.bonds {
            dist[bond.begin][bond.end] = 1;
            dist[bond.end][bond.begin] = 1;
        }
        for k in 0..n {
            for i in 0..n {
                if dist[i][k] == u32::MAX {
                    continue;
                }
                for j in 0..n {
                    if dist[k][j] < u32::MAX {
                        let through = dist[i][k] + dist[k][j];
                        if through < dist[i][j] {
                            dist[i][j] = through;
                        }
                    }
                }
            }
        }
        dist
    }

    /// Number of disconnected fragments.
    pub fn component_count(&self) -> usize {
        let mut seen = vec![false; self.atoms.len()];
        let mut components = 0;
        for root in 0..self.atoms.len() {
            if seen[root] {
                continue;
            }
            components += 1;
            let mut stack = vec![root];
            seen[root] = true;
            while let Some(u) = stack.pop() {
                for &(v, _) in &self.adjacency[u] {
                    if !seen[v] {
                        seen[v] = true;
                        stack.push(v);
                    }
                }
            }
        }
        components
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Element data
// ─────────────────────────────────────────────────────────────────────────────

const ELEMENTS: [&str; 86] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn",
];

/// Element symbol for an atomic number.
pub fn element_symbol(atomic_number: u8) -> Option<&'static str> {
    ELEMENTS.get(usize::from(atomic_number).checked_sub(1)?).copied()
}

/// Atomic number for an element symbol (case-sensitive, e.g. `"Cl"`).
pub fn atomic_number(symbol: &str) -> Option<u8> {
    ELEMENTS
        .iter()
        .position(|&s| s == symbol)
        .and_then(|i| u8::try_from(i + 1).ok())
}

/// Allowed valences of the SMILES organic subset, smallest first.
pub(crate) fn default_valences(atomic_number: u8) -> Option<&'static [u8]> {
    match atomic_number {
        5 => Some(&[3]),
        6 => Some(&[4]),
        7 => Some(&[3, 5]),
        8 => Some(&[2]),
        15 => Some(&[3, 5]),
        16 => Some(&[2, 4, 6]),
        9 | 17 | 35 | 53 => Some(&[1]),
        _ => None,
    }
}
