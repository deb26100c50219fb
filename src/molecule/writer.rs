// src/molecule/writer.rs
//! SMILES writer.
//!
//! Produces a (non-canonical) SMILES by depth-first traversal in atom order:
//! every fragment starts at its lowest-indexed atom, neighbours are visited in
//! index order, the last child continues the main chain and earlier children
//! become parenthesized branches. Ring closures take the lowest free number,
//! written as `%(n)` from 100 on.
//!
//! Molecules read from SMILES written in that same order round-trip exactly:
//!
//! ```
//! use molfp::{parse_smiles, to_smiles};
//!
//! for smiles in ["O", "CC", "[C-]#N", "CC=O", "c1ccccc1"] {
//!     assert_eq!(to_smiles(&parse_smiles(smiles).unwrap()), smiles);
//! }
//! ```

use std::fmt::Write;

use super::{BondOrder, Molecule};

/// Configurable SMILES writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmilesWriter {
    all_bonds_explicit: bool,
    all_hs_explicit: bool,
}

impl SmilesWriter {
    /// Creates a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every bond symbol, including implicit single and aromatic bonds.
    pub fn all_bonds_explicit(mut self, yes: bool) -> Self {
        self.all_bonds_explicit = yes;
        self
    }

    /// Write every atom in brackets with its hydrogen count.
    pub fn all_hs_explicit(mut self, yes: bool) -> Self {
        self.all_hs_explicit = yes;
        self
    }

    /// Writes `molecule` as SMILES.
    pub fn write(&self, molecule: &Molecule) -> String {
        let plan = Plan::new(molecule);
        let mut out = String::new();
        let mut digits = RingDigits::default();
        for (k, &root) in plan.roots.iter().enumerate() {
            if k > 0 {
                out.push('.');
            }
            self.emit(molecule, &plan, root, &mut digits, &mut out);
        }
        out
    }

    /// Writes the tree below `root`; explicit stack of (atom, next child).
    fn emit(
        &self,
        molecule: &Molecule,
        plan: &Plan,
        root: usize,
        digits: &mut RingDigits,
        out: &mut String,
    ) {
        self.write_atom_and_closures(molecule, plan, root, digits, out);
        let mut stack = vec![(root, 0usize)];

        while let Some((atom, k)) = stack.pop() {
            let children = &plan.children[atom];
            // returning from a branch child
            if k > 0 && k < children.len() {
                out.push(')');
            }
            let Some(&(child, bond)) = children.get(k) else {
                continue;
            };
            if k + 1 < children.len() {
                out.push('(');
            }
            let order = molecule.bonds()[bond].order;
            self.write_bond(molecule, atom, child, order, out);
            self.write_atom_and_closures(molecule, plan, child, digits, out);
            stack.push((atom, k + 1));
            stack.push((child, 0));
        }
    }

    fn write_atom_and_closures(
        &self,
        molecule: &Molecule,
        plan: &Plan,
        atom: usize,
        digits: &mut RingDigits,
        out: &mut String,
    ) {
        self.write_atom(molecule, atom, out);
        for &bond in &plan.closures[atom] {
            match digits.close(bond) {
                Some(digit) => write_ring_digit(out, digit),
                None => {
                    let b = molecule.bonds()[bond];
                    self.write_bond(molecule, b.begin, b.end, b.order, out);
                    write_ring_digit(out, digits.open(bond));
                }
            }
        }
    }

    fn write_bond(&self, molecule: &Molecule, a: usize, b: usize, order: BondOrder, out: &mut String) {
        let both_aromatic = molecule.atom(a).aromatic && molecule.atom(b).aromatic;
        let needed = match order {
            BondOrder::Double | BondOrder::Triple => true,
            BondOrder::Single => both_aromatic,
            BondOrder::Aromatic => !both_aromatic,
        };
        if needed || self.all_bonds_explicit {
            out.push(order.symbol());
        }
    }

    fn write_atom(&self, molecule: &Molecule, index: usize, out: &mut String) {
        let atom = molecule.atom(index);
        let hydrogens = molecule.total_hydrogens(index);
        let symbol = if atom.aromatic {
            atom.symbol().to_ascii_lowercase()
        } else {
            atom.symbol().to_string()
        };

        let bare = !self.all_hs_explicit
            && atom.is_organic_subset()
            && atom.charge == 0
            && atom.isotope.is_none()
            && hydrogens == molecule.implicit_hydrogens(index);
        if bare {
            out.push_str(&symbol);
            return;
        }

        out.push('[');
        if let Some(isotope) = atom.isotope {
            let _ = write!(out, "{isotope}");
        }
        out.push_str(&symbol);
        match hydrogens {
            0 => {}
            1 => out.push('H'),
            h => {
                let _ = write!(out, "H{h}");
            }
        }
        match atom.charge {
            0 => {}
            1 => out.push('+'),
            -1 => out.push('-'),
            c if c > 0 => {
                let _ = write!(out, "+{c}");
            }
            c => {
                let _ = write!(out, "{c}");
            }
        }
        out.push(']');
    }
}

/// Writes `molecule` as SMILES with default options.
pub fn to_smiles(molecule: &Molecule) -> String {
    SmilesWriter::new().write(molecule)
}

/// Depth-first spanning forest with ring-closure bonds attached to both ends.
struct Plan {
    roots: Vec<usize>,
    children: Vec<Vec<(usize, usize)>>,
    closures: Vec<Vec<usize>>,
}

impl Plan {
    fn new(molecule: &Molecule) -> Self {
        let n = molecule.atom_count();
        let mut plan = Plan {
            roots: Vec::new(),
            children: vec![Vec::new(); n],
            closures: vec![Vec::new(); n],
        };
        let mut visited = vec![false; n];
        let mut bond_seen = vec![false; molecule.bond_count()];

        for root in 0..n {
            if visited[root] {
                continue;
            }
            plan.roots.push(root);
            visited[root] = true;
            // (atom, next neighbour slot)
            let mut stack = vec![(root, 0usize)];
            while let Some(top) = stack.last_mut() {
                let (atom, slot) = *top;
                let Some(&(nbr, bond)) = molecule.neighbors(atom).get(slot) else {
                    stack.pop();
                    continue;
                };
                top.1 += 1;
                if bond_seen[bond] {
                    continue;
                }
                bond_seen[bond] = true;
                if visited[nbr] {
                    plan.closures[nbr].push(bond);
                    plan.closures[atom].push(bond);
                } else {
                    plan.children[atom].push((nbr, bond));
                    visited[nbr] = true;
                    stack.push((nbr, 0));
                }
            }
        }
        plan
    }
}

#[derive(Default)]
struct RingDigits {
    open: Vec<(usize, u32)>,
}

impl RingDigits {
    fn open(&mut self, bond: usize) -> u32 {
        let digit = (1..)
            .find(|d| self.open.iter().all(|&(_, used)| used != *d))
            .unwrap_or(1);
        self.open.push((bond, digit));
        digit
    }

    fn close(&mut self, bond: usize) -> Option<u32> {
        let pos = self.open.iter().position(|&(b, _)| b == bond)?;
        Some(self.open.swap_remove(pos).1)
    }
}

fn write_ring_digit(out: &mut String, digit: u32) {
    let _ = match digit {
        0..=9 => write!(out, "{digit}"),
        10..=99 => write!(out, "%{digit}"),
        _ => write!(out, "%({digit})"),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::{parse_smiles, SmilesParser};

    fn round_trip(smiles: &str) -> String {
        to_smiles(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn writes_simple_molecules_verbatim() {
        for smiles in ["O", "CC", "[C-]#N", "CC=O", "CCO", "C#N", "[NH4+]"] {
            assert_eq!(round_trip(smiles), smiles);
        }
    }

    #[test]
    fn writes_branches_and_rings() {
        assert_eq!(round_trip("CC(C)C"), "CC(C)C");
        assert_eq!(round_trip("c1ccccc1"), "c1ccccc1");
        assert_eq!(round_trip("C1CCCCC1"), "C1CCCCC1");
        assert_eq!(round_trip("CCO.[Na+]"), "CCO.[Na+]");
    }

    #[test]
    fn rewritten_smiles_reparse_to_the_same_graph() {
        for smiles in [
            "CC(=O)Oc1ccccc1C(=O)O",
            "CN1C=NC2=C1C(=O)N(C(=O)N2C)C",
            "c1ccc2ccccc2c1",
            "[13CH4]",
            "N[C@@H](C)C(=O)O",
        ] {
            let mol = parse_smiles(smiles).unwrap();
            let again = parse_smiles(&to_smiles(&mol)).unwrap();
            assert_eq!(again.atom_count(), mol.atom_count(), "{smiles}");
            assert_eq!(again.bond_count(), mol.bond_count(), "{smiles}");
            let h: Vec<u8> = (0..mol.atom_count()).map(|i| mol.total_hydrogens(i)).collect();
            let h_again: Vec<u8> = (0..again.atom_count()).map(|i| again.total_hydrogens(i)).collect();
            let mut h_sorted = h.clone();
            let mut h_again_sorted = h_again.clone();
            h_sorted.sort_unstable();
            h_again_sorted.sort_unstable();
            assert_eq!(h_sorted, h_again_sorted, "{smiles}");
        }
    }

    #[test]
    fn many_open_rings_use_parenthesized_numbers() {
        // a hub bonded to 120 atoms that all close back to a second hub
        let mut smiles = String::from("C");
        for d in 1..=120u32 {
            write_ring_digit(&mut smiles, d);
        }
        smiles.push('C');
        for d in 1..=120u32 {
            smiles.push_str("(C");
            write_ring_digit(&mut smiles, d);
            smiles.push(')');
        }
        let mol = SmilesParser::new().sanitize(false).parse(&smiles).unwrap();
        let written = to_smiles(&mol);
        assert!(written.contains("%(100)"));
        let again = SmilesParser::new().sanitize(false).parse(&written).unwrap();
        assert_eq!(again.atom_count(), mol.atom_count());
        assert_eq!(again.bond_count(), mol.bond_count());
    }

    #[test]
    fn long_chains_do_not_recurse() {
        let smiles = "C".repeat(200_000);
        let mol = parse_smiles(&smiles).unwrap();
        assert_eq!(to_smiles(&mol), smiles);
    }

    #[test]
    fn explicit_options() {
        let mol = parse_smiles("CC=O").unwrap();
        let writer = SmilesWriter::new().all_bonds_explicit(true);
        assert_eq!(writer.write(&mol), "C-C=O");
        let writer = SmilesWriter::new().all_hs_explicit(true);
        assert_eq!(writer.write(&mol), "[CH3][CH]=[O]");
    }
}
