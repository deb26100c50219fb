//! Input validation.
//!
//! Transformers accept heterogeneous input: SMILES strings, already-parsed
//! [`Molecule`]s, or a mix of both. Everything is normalized to molecules up
//! front, before any chunk is dispatched, so a bad entry fails the call
//! immediately and names its position.

use serde_json::Value;

use crate::error::ValidationError;
use crate::molecule::{Molecule, SmilesParser};

/// One raw input entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MoleculeInput {
    /// A SMILES string to be parsed.
    Smiles(String),
    /// An already-parsed molecule.
    Molecule(Molecule),
}

impl From<&str> for MoleculeInput {
    fn from(smiles: &str) -> Self {
        MoleculeInput::Smiles(smiles.to_string())
    }
}

impl From<String> for MoleculeInput {
    fn from(smiles: String) -> Self {
        MoleculeInput::Smiles(smiles)
    }
}

impl From<Molecule> for MoleculeInput {
    fn from(molecule: Molecule) -> Self {
        MoleculeInput::Molecule(molecule)
    }
}

impl From<&Molecule> for MoleculeInput {
    fn from(molecule: &Molecule) -> Self {
        MoleculeInput::Molecule(molecule.clone())
    }
}

/// Converts any iterator of SMILES / molecules into input entries.
///
/// ```
/// use molfp::validation::inputs;
///
/// let x = inputs(["O", "CC", "[C-]#N", "CC=O"]);
/// assert_eq!(x.len(), 4);
/// ```
pub fn inputs<I, T>(entries: I) -> Vec<MoleculeInput>
where
    I: IntoIterator<Item = T>,
    T: Into<MoleculeInput>,
{
    entries.into_iter().map(Into::into).collect()
}

/// Normalizes entries into molecules, preserving length and order.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidSmiles`] for the first string that does
/// not parse.
pub fn validate(entries: &[MoleculeInput]) -> Result<Vec<Molecule>, ValidationError> {
    let parser = SmilesParser::new();
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            MoleculeInput::Smiles(smiles) => parse_entry(&parser, index, smiles),
            MoleculeInput::Molecule(molecule) => Ok(molecule.clone()),
        })
        .collect()
}

/// Parses a list of SMILES strings.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidSmiles`] for the first string that does
/// not parse.
pub fn validate_smiles<S: AsRef<str>>(smiles: &[S]) -> Result<Vec<Molecule>, ValidationError> {
    validate_smiles_with(&SmilesParser::new(), smiles)
}

/// Parses a list of SMILES strings with a custom reader.
pub(crate) fn validate_smiles_with<S: AsRef<str>>(
    parser: &SmilesParser,
    smiles: &[S],
) -> Result<Vec<Molecule>, ValidationError> {
    smiles
        .iter()
        .enumerate()
        .map(|(index, s)| parse_entry(parser, index, s.as_ref()))
        .collect()
}

/// Validates dynamically typed entries, e.g. a column read from JSON.
///
/// Only strings are accepted; any other JSON type is rejected with
/// [`ValidationError::UnsupportedEntry`] before any string is parsed.
///
/// ```
/// use molfp::validation::validate_json;
/// use serde_json::json;
///
/// assert!(validate_json(&[json!("CCO"), json!("c1ccccc1")]).is_ok());
/// let err = validate_json(&[json!("CCO"), json!(42)]).unwrap_err();
/// assert_eq!(err.index(), 1);
/// ```
pub fn validate_json(values: &[Value]) -> Result<Vec<Molecule>, ValidationError> {
    let mut smiles = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        match value {
            Value::String(s) => smiles.push(s.as_str()),
            other => {
                return Err(ValidationError::UnsupportedEntry {
                    index,
                    detail: format!("found JSON {}", json_kind(other)),
                })
            }
        }
    }
    validate_smiles(&smiles)
}

fn parse_entry(parser: &SmilesParser, index: usize, smiles: &str) -> Result<Molecule, ValidationError> {
    parser
        .parse(smiles)
        .map_err(|source| ValidationError::InvalidSmiles {
            index,
            smiles: smiles.to_string(),
            source,
        })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mixed_entries_keep_order() {
        let benzene = Molecule::from_smiles("c1ccccc1").unwrap();
        let entries = vec![
            MoleculeInput::from("O"),
            MoleculeInput::from(benzene.clone()),
            MoleculeInput::from("CC"),
        ];
        let mols = validate(&entries).unwrap();
        assert_eq!(mols.len(), 3);
        assert_eq!(mols[0].atom_count(), 1);
        assert_eq!(mols[1], benzene);
        assert_eq!(mols[2].atom_count(), 2);
    }

    #[test]
    fn invalid_smiles_names_the_entry() {
        let err = validate(&inputs(["CCO", "not_a_valid_structure!!"])).unwrap_err();
        match err {
            ValidationError::InvalidSmiles { index, smiles, .. } => {
                assert_eq!(index, 1);
                assert_eq!(smiles, "not_a_valid_structure!!");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn json_type_errors_win_over_parse_errors() {
        let err = validate_json(&[json!("garbage!!"), json!(null)]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnsupportedEntry { index: 1, .. }
        ));
        assert!(err.to_string().contains("null"));
    }

    #[test]
    fn empty_input_is_valid() {
        assert!(validate(&[]).unwrap().is_empty());
        assert!(validate_smiles::<&str>(&[]).unwrap().is_empty());
    }
}
