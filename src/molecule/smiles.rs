// src/molecule/smiles.rs
//! SMILES reader.
//!
//! Supported syntax:
//! - organic-subset atoms (`B C N O P S F Cl Br I`) and their aromatic forms
//!   (`b c n o p s`)
//! - bracket atoms with isotope, element, chirality (accepted and ignored),
//!   hydrogen count, charge and atom-map number, e.g. `[13CH4]`, `[NH4+]`,
//!   `[C@@H]`, `[Fe+2]`, `[nH]`
//! - bonds `- = # :` and the directional `/ \` (read as single)
//! - branches `( )`, ring closures `1`–`9`, `%nn` and
//!   `%(nnn)`, fragments `.`
//!
//! With sanitization enabled (the default) organic-subset atoms whose bond
//! order sum exceeds their largest default valence are rejected, e.g.
//! pentavalent carbon.

use std::collections::BTreeMap;

use thiserror::Error;

use super::{atomic_number, default_valences, Atom, Bond, BondOrder, GraphError, Molecule};

/// Errors returned by the SMILES reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmilesError {
    /// The input contains no atoms.
    #[error("empty SMILES")]
    Empty,

    /// A character that is not valid at this position.
    #[error("unexpected character {ch:?} at position {pos}")]
    UnexpectedChar {
        /// Offending character.
        ch: char,
        /// Character offset.
        pos: usize,
    },

    /// A bracket atom is not terminated by `]`.
    #[error("unclosed bracket atom starting at position {0}")]
    UnclosedBracket(usize),

    /// A bracket atom names an element we do not know.
    #[error("unknown element {symbol:?} at position {pos}")]
    UnknownElement {
        /// The symbol as written.
        symbol: String,
        /// Character offset.
        pos: usize,
    },

    /// `(` without a matching `)` or vice versa.
    #[error("unbalanced parenthesis at position {0}")]
    UnbalancedParenthesis(usize),

    /// A ring-closure digit was opened but never closed.
    #[error("ring closure {0} is never closed")]
    UnclosedRing(u32),

    /// The two halves of a ring closure specify different bond orders.
    #[error("conflicting bond orders for ring closure {0}")]
    RingBondConflict(u32),

    /// A bracket-atom charge does not fit in a signed byte.
    #[error("charge at position {0} is out of range")]
    ChargeRange(usize),

    /// A bond symbol is not followed by an atom.
    #[error("bond at position {0} is not followed by an atom")]
    DanglingBond(usize),

    /// An organic-subset atom exceeds its allowed valence.
    #[error("atom {atom} ({symbol}) has valence {valence}, more than allowed")]
    Valence {
        /// Atom index.
        atom: usize,
        /// Element symbol.
        symbol: &'static str,
        /// Bond order sum found.
        valence: u8,
    },

    /// The assembled graph is inconsistent (e.g. a ring closure duplicating
    /// an existing bond).
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Configurable SMILES reader.
///
/// ```
/// use molfp::SmilesParser;
///
/// let strict = SmilesParser::new();
/// assert!(strict.parse("C(C)(C)(C)(C)C").is_err()); // pentavalent carbon
///
/// let lenient = SmilesParser::new().sanitize(false);
/// assert_eq!(lenient.parse("C(C)(C)(C)(C)C").unwrap().atom_count(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmilesParser {
    sanitize: bool,
}

impl Default for SmilesParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SmilesParser {
    /// Creates a sanitizing parser.
    pub fn new() -> Self {
        Self { sanitize: true }
    }

    /// Enables or disables valence checks.
    pub fn sanitize(mut self, sanitize: bool) -> Self {
        self.sanitize = sanitize;
        self
    }

    /// Parses `smiles` into a [`Molecule`].
    ///
    /// # Errors
    ///
    /// Returns the first [`SmilesError`] found while scanning left to right.
    pub fn parse(&self, smiles: &str) -> Result<Molecule, SmilesError> {
        let molecule = Reader::new(smiles.trim()).read()?;
        if self.sanitize {
            check_valences(&molecule)?;
        }
        Ok(molecule)
    }
}

/// Parses a SMILES string with the default (sanitizing) reader.
///
/// # Examples
///
/// ```
/// use molfp::parse_smiles;
///
/// let cyanide = parse_smiles("[C-]#N").unwrap();
/// assert_eq!(cyanide.atom(0).charge, -1);
/// assert!(parse_smiles("not_a_valid_structure!!").is_err());
/// ```
pub fn parse_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
    SmilesParser::new().parse(smiles)
}

struct PendingBond {
    begin: usize,
    end: usize,
    order: Option<BondOrder>,
}

struct Reader {
    chars: Vec<char>,
    pos: usize,
    atoms: Vec<Atom>,
    bonds: Vec<PendingBond>,
    prev: Option<usize>,
    branches: Vec<(usize, usize)>,
    pending: Option<(BondOrder, usize)>,
    rings: BTreeMap<u32, (usize, Option<BondOrder>)>,
}

impl Reader {
    fn new(smiles: &str) -> Self {
        Self {
            chars: smiles.chars().collect(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            prev: None,
            branches: Vec::new(),
            pending: None,
            rings: BTreeMap::new(),
        }
    }

    fn read(mut self) -> Result<Molecule, SmilesError> {
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            match c {
                '(' => {
                    let Some(prev) = self.prev else {
                        return Err(self.unexpected());
                    };
                    if self.pending.is_some() {
                        return Err(self.unexpected());
                    }
                    self.branches.push((prev, self.pos));
                    self.pos += 1;
                }
                ')' => {
                    if let Some((_, at)) = self.pending {
                        return Err(SmilesError::DanglingBond(at));
                    }
                    let Some((atom, _)) = self.branches.pop() else {
                        return Err(SmilesError::UnbalancedParenthesis(self.pos));
                    };
                    self.prev = Some(atom);
                    self.pos += 1;
                }
                '-' | '/' | '\\' => self.bond_symbol(BondOrder::Single)?,
                '=' => self.bond_symbol(BondOrder::Double)?,
                '#' => self.bond_symbol(BondOrder::Triple)?,
                ':' => self.bond_symbol(BondOrder::Aromatic)?,
                '.' => {
                    if self.prev.is_none() || self.pending.is_some() {
                        return Err(self.unexpected());
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                '%' => {
                    let start = self.pos;
                    let (digits, len) = if self.chars.get(start + 1) == Some(&'(') {
                        let digits: String = self.chars[start + 2..]
                            .iter()
                            .take_while(|ch| ch.is_ascii_digit())
                            .collect();
                        if digits.is_empty() || self.chars.get(start + 2 + digits.len()) != Some(&')') {
                            return Err(self.unexpected());
                        }
                        let len = digits.len() + 3;
                        (digits, len)
                    } else {
                        let digits: String = self.chars[start + 1..]
                            .iter()
                            .take(2)
                            .take_while(|ch| ch.is_ascii_digit())
                            .collect();
                        if digits.len() != 2 {
                            return Err(self.unexpected());
                        }
                        (digits, 3)
                    };
                    self.pos += len;
                    let number = digits.parse().map_err(|_| SmilesError::UnexpectedChar {
                        ch: '%',
                        pos: start,
                    })?;
                    self.ring_closure(number, start)?;
                }
                d if d.is_ascii_digit() => {
                    let start = self.pos;
                    self.pos += 1;
                    self.ring_closure(d.to_digit(10).unwrap_or_default(), start)?;
                }
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.add_atom(atom);
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.add_atom(atom);
                }
            }
        }

        if let Some(&(_, at)) = self.branches.last() {
            return Err(SmilesError::UnbalancedParenthesis(at));
        }
        if let Some((_, at)) = self.pending {
            return Err(SmilesError::DanglingBond(at));
        }
        if let Some(&number) = self.rings.keys().next() {
            return Err(SmilesError::UnclosedRing(number));
        }
        if self.atoms.is_empty() {
            return Err(SmilesError::Empty);
        }

        let bonds = self
            .bonds
            .iter()
            .map(|pb| {
                let order = pb.order.unwrap_or(
                    if self.atoms[pb.begin].aromatic && self.atoms[pb.end].aromatic {
                        BondOrder::Aromatic
                    } else {
                        BondOrder::Single
                    },
                );
                Bond::new(pb.begin, pb.end, order)
            })
            .collect();
        Ok(Molecule::new(self.atoms, bonds)?)
    }

    fn unexpected(&self) -> SmilesError {
        SmilesError::UnexpectedChar {
            ch: self.chars[self.pos],
            pos: self.pos,
        }
    }

    fn bond_symbol(&mut self, order: BondOrder) -> Result<(), SmilesError> {
        if self.prev.is_none() || self.pending.is_some() {
            return Err(self.unexpected());
        }
        self.pending = Some((order, self.pos));
        self.pos += 1;
        Ok(())
    }

    fn add_atom(&mut self, atom: Atom) {
        let index = self.atoms.len();
        self.atoms.push(atom);
        if let Some(prev) = self.prev {
            let order = self.pending.take().map(|(order, _)| order);
            self.bonds.push(PendingBond {
                begin: prev,
                end: index,
                order,
            });
        }
        self.prev = Some(index);
    }

    fn ring_closure(&mut self, number: u32, at: usize) -> Result<(), SmilesError> {
        let Some(current) = self.prev else {
            return Err(SmilesError::UnexpectedChar {
                ch: self.chars[at],
                pos: at,
            });
        };
        let order = self.pending.take().map(|(order, _)| order);
        match self.rings.remove(&number) {
            Some((opener, opened_with)) => {
                let order = match (opened_with, order) {
                    (Some(a), Some(b)) if a != b => return Err(SmilesError::RingBondConflict(number)),
                    (a, b) => a.or(b),
                };
                self.bonds.push(PendingBond {
                    begin: opener,
                    end: current,
                    order,
                });
            }
            None => {
                self.rings.insert(number, (current, order));
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom, SmilesError> {
        let c = self.chars[self.pos];
        let next = self.chars.get(self.pos + 1).copied();
        let (symbol, aromatic, width) = match (c, next) {
            ('C', Some('l')) => ("Cl", false, 2),
            ('B', Some('r')) => ("Br", false, 2),
            ('B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I', _) => (organic_symbol(c), false, 1),
            ('b' | 'c' | 'n' | 'o' | 'p' | 's', _) => {
                (organic_symbol(c.to_ascii_uppercase()), true, 1)
            }
            _ => return Err(self.unexpected()),
        };
        let z = atomic_number(symbol).ok_or_else(|| SmilesError::UnknownElement {
            symbol: symbol.to_string(),
            pos: self.pos,
        })?;
        self.pos += width;
        Ok(Atom {
            aromatic,
            ..Atom::new(z)
        })
    }

    fn bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        let open = self.pos;
        let close = self.chars[open..]
            .iter()
            .position(|&ch| ch == ']')
            .map(|offset| open + offset)
            .ok_or(SmilesError::UnclosedBracket(open))?;
        let content = &self.chars[open + 1..close];
        let offset = open + 1;
        let unexpected = |i: usize| SmilesError::UnexpectedChar {
            ch: content[i],
            pos: offset + i,
        };
        let mut i = 0usize;

        // isotope
        let mut isotope = None;
        let digits: String = content.iter().take_while(|ch| ch.is_ascii_digit()).collect();
        if !digits.is_empty() {
            i += digits.len();
            isotope = Some(digits.parse::<u16>().map_err(|_| unexpected(0))?);
        }

        // element symbol
        let Some(&first) = content.get(i) else {
            return Err(SmilesError::UnknownElement {
                symbol: String::new(),
                pos: offset + i,
            });
        };
        let (symbol, aromatic) = if first.is_ascii_uppercase() {
            let mut symbol = first.to_string();
            if let Some(&second) = content.get(i + 1) {
                let candidate = format!("{first}{second}");
                if second.is_ascii_lowercase() && atomic_number(&candidate).is_some() {
                    symbol = candidate;
                }
            }
            (symbol, false)
        } else if first.is_ascii_lowercase() {
            let two: String = content[i..].iter().take(2).collect();
            if two == "se" || two == "as" {
                (capitalize(&two), true)
            } else if matches!(first, 'b' | 'c' | 'n' | 'o' | 'p' | 's') {
                (first.to_ascii_uppercase().to_string(), true)
            } else {
                return Err(unexpected(i));
            }
        } else {
            return Err(unexpected(i));
        };
        let z = atomic_number(&symbol).ok_or_else(|| SmilesError::UnknownElement {
            symbol: symbol.clone(),
            pos: offset + i,
        })?;
        i += symbol.len();

        // chirality
        while content.get(i) == Some(&'@') {
            i += 1;
        }

        // hydrogens
        let mut hydrogens = 0u8;
        if content.get(i) == Some(&'H') {
            i += 1;
            let digits: String = content[i..].iter().take_while(|ch| ch.is_ascii_digit()).collect();
            hydrogens = if digits.is_empty() {
                1
            } else {
                digits.parse().map_err(|_| unexpected(i))?
            };
            i += digits.len();
        }

        // charge
        let mut charge = 0i8;
        if let Some(&sign @ ('+' | '-')) = content.get(i) {
            let unit: i8 = if sign == '+' { 1 } else { -1 };
            i += 1;
            let digits: String = content[i..].iter().take_while(|ch| ch.is_ascii_digit()).collect();
            let out_of_range = SmilesError::ChargeRange(offset + i - 1);
            if !digits.is_empty() {
                let magnitude: i8 = digits.parse().map_err(|_| out_of_range.clone())?;
                charge = unit.checked_mul(magnitude).ok_or(out_of_range)?;
                i += digits.len();
            } else {
                charge = unit;
                while content.get(i) == Some(&sign) {
                    charge = charge.checked_add(unit).ok_or_else(|| out_of_range.clone())?;
                    i += 1;
                }
            }
        }

        // atom map
        if content.get(i) == Some(&':') {
            i += 1;
            let digits = content[i..].iter().take_while(|ch| ch.is_ascii_digit()).count();
            if digits == 0 {
                return Err(unexpected(i - 1));
            }
            i += digits;
        }

        if i != content.len() {
            return Err(unexpected(i));
        }

        self.pos = close + 1;
        Ok(Atom {
            atomic_number: z,
            aromatic,
            charge,
            isotope,
            hydrogens: Some(hydrogens),
        })
    }
}

fn organic_symbol(c: char) -> &'static str {
    match c {
        'B' => "B",
        'C' => "C",
        'N' => "N",
        'O' => "O",
        'P' => "P",
        'S' => "S",
        'F' => "F",
        _ => "I",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn check_valences(molecule: &Molecule) -> Result<(), SmilesError> {
    for (i, atom) in molecule.atoms().iter().enumerate() {
        if atom.hydrogens.is_some() {
            continue;
        }
        let Some(valences) = default_valences(atom.atomic_number) else {
            continue;
        };
        let valence = molecule.valence(i);
        let max = valences.iter().copied().max().unwrap_or(0);
        if valence > max {
            return Err(SmilesError::Valence {
                atom: i,
                symbol: atom.symbol(),
                valence,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_chains() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.atom(2).symbol(), "O");
    }

    #[test]
    fn branches_and_ring_closures() {
        // aspirin
        let mol = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        assert_eq!(mol.atom_count(), 13);
        assert_eq!(mol.bond_count(), 13);
        assert_eq!(mol.bonds()[1].order, BondOrder::Double);
        let aromatic = mol
            .bonds()
            .iter()
            .filter(|b| b.order == BondOrder::Aromatic)
            .count();
        assert_eq!(aromatic, 6);
    }

    #[test]
    fn two_digit_ring_closures_and_fragments() {
        let mol = parse_smiles("C%10CCCC%10.[Na+]").unwrap();
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bond_count(), 5);
        assert_eq!(mol.component_count(), 2);
        assert_eq!(mol.atom(5).charge, 1);
    }

    #[test]
    fn parenthesized_ring_numbers() {
        let mol = parse_smiles("C%(123)CCC%(123)").unwrap();
        assert_eq!(mol.bond_count(), 4);
        assert_eq!(mol.ring_atoms(), vec![true; 4]);
        assert!(parse_smiles("C%()CC").is_err());
        assert!(parse_smiles("C%(12CC").is_err());
    }

    #[test]
    fn bracket_atoms() {
        let mol = parse_smiles("[13CH4]").unwrap();
        assert_eq!(mol.atom(0).isotope, Some(13));
        assert_eq!(mol.total_hydrogens(0), 4);

        let mol = parse_smiles("[NH4+]").unwrap();
        assert_eq!(mol.atom(0).charge, 1);
        assert_eq!(mol.total_hydrogens(0), 4);

        let mol = parse_smiles("[Fe+2]").unwrap();
        assert_eq!(mol.atom(0).atomic_number, 26);
        assert_eq!(mol.atom(0).charge, 2);

        let mol = parse_smiles("[O--]").unwrap();
        assert_eq!(mol.atom(0).charge, -2);

        let mol = parse_smiles("N[C@@H](C)C(=O)O").unwrap();
        assert_eq!(mol.total_hydrogens(1), 1);

        let mol = parse_smiles("c1cc[nH]c1").unwrap();
        assert!(mol.atom(3).aromatic);
        assert_eq!(mol.total_hydrogens(3), 1);

        let mol = parse_smiles("[CH3:1]Cl").unwrap();
        assert_eq!(mol.atom(1).atomic_number, 17);
    }

    #[test]
    fn aromatic_heteroatoms() {
        let furan = parse_smiles("c1ccoc1").unwrap();
        assert_eq!(furan.total_hydrogens(3), 0);
        let thiophene = parse_smiles("c1ccsc1").unwrap();
        assert_eq!(thiophene.total_hydrogens(3), 0);
        let pyridine = parse_smiles("c1ccncc1").unwrap();
        assert_eq!(pyridine.total_hydrogens(3), 0);
        assert_eq!(pyridine.total_hydrogens(0), 1);
    }

    #[test]
    fn oversized_charges_are_errors() {
        let many_plus = format!("[C{}]", "+".repeat(130));
        assert!(matches!(
            parse_smiles(&many_plus),
            Err(SmilesError::ChargeRange(2))
        ));
        assert!(matches!(
            parse_smiles("[C-200]"),
            Err(SmilesError::ChargeRange(_))
        ));
        assert_eq!(parse_smiles("[C-127]").unwrap().atom(0).charge, -127);
        assert_eq!(parse_smiles("[C+127]").unwrap().atom(0).charge, 127);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_smiles("not_a_valid_structure!!"),
            Err(SmilesError::UnexpectedChar { ch: 't', pos: 2 })
        ));
        assert_eq!(parse_smiles(""), Err(SmilesError::Empty));
        assert_eq!(parse_smiles("C1CC"), Err(SmilesError::UnclosedRing(1)));
        assert_eq!(parse_smiles("C(C"), Err(SmilesError::UnbalancedParenthesis(1)));
        assert_eq!(parse_smiles("CC)"), Err(SmilesError::UnbalancedParenthesis(2)));
        assert_eq!(parse_smiles("CC="), Err(SmilesError::DanglingBond(2)));
        assert_eq!(parse_smiles("[CH4"), Err(SmilesError::UnclosedBracket(0)));
        assert!(matches!(
            parse_smiles("[Xx]"),
            Err(SmilesError::UnknownElement { .. })
        ));
        assert_eq!(parse_smiles("C=1CC-1"), Err(SmilesError::RingBondConflict(1)));
    }

    #[test]
    fn ring_closure_duplicating_a_bond_is_rejected() {
        assert!(matches!(
            parse_smiles("C12C12"),
            Err(SmilesError::Graph(GraphError::DuplicateBond { .. }))
        ));
    }

    #[test]
    fn sanitization_checks_valence() {
        assert!(matches!(
            parse_smiles("C=C=C=C(C)C"),
            Ok(_)
        ));
        assert!(matches!(
            parse_smiles("CC(C)(C)(C)C"),
            Err(SmilesError::Valence { atom: 1, symbol: "C", valence: 5 })
        ));
        assert!(SmilesParser::new()
            .sanitize(false)
            .parse("CC(C)(C)(C)C")
            .is_ok());
    }
}
