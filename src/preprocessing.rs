//! SMILES ↔ molecule conversion transformers.
//!
//! Both run on the same chunked dispatcher as the fingerprint transformers
//! and can be chained with them in a [`Pipeline`](crate::Pipeline).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::molecule::{Molecule, SmilesParser, SmilesWriter};
use crate::parallel::{effective_n_jobs, Partitioning};
use crate::transformer::{from_params, merge_params, to_params, Estimator, Transformer};
use crate::validation::validate_smiles_with;

/// Parameters of [`MolFromSmilesTransformer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MolFromSmilesParams {
    /// Check organic-subset valences while parsing.
    pub sanitize: bool,
    /// Substring substitutions applied to each SMILES before parsing, in key
    /// order, e.g. `"[Ph]" -> "c1ccccc1"`.
    pub replacements: BTreeMap<String, String>,
    /// Requested workers, as in [`TransformerConfig`](crate::TransformerConfig).
    pub n_jobs: Option<isize>,
    /// Fixed chunk size.
    pub batch_size: Option<usize>,
}

impl Default for MolFromSmilesParams {
    fn default() -> Self {
        Self {
            sanitize: true,
            replacements: BTreeMap::new(),
            n_jobs: None,
            batch_size: None,
        }
    }
}

/// Parses SMILES strings into molecules.
#[derive(Debug, Clone)]
pub struct MolFromSmilesTransformer {
    params: MolFromSmilesParams,
    partitioning: Partitioning,
}

impl MolFromSmilesTransformer {
    /// Builds the transformer, resolving `n_jobs` once.
    pub fn new(params: MolFromSmilesParams) -> Result<Self> {
        let partitioning =
            Partitioning::new(effective_n_jobs(params.n_jobs)?).with_batch_size(params.batch_size)?;
        Ok(Self {
            params,
            partitioning,
        })
    }

    /// Current parameters.
    pub fn params(&self) -> &MolFromSmilesParams {
        &self.params
    }
}

impl Default for MolFromSmilesTransformer {
    fn default() -> Self {
        Self {
            params: MolFromSmilesParams::default(),
            partitioning: Partitioning::new(1),
        }
    }
}

impl Transformer for MolFromSmilesTransformer {
    type Input = String;
    type Output = Vec<Molecule>;

    /// # Errors
    ///
    /// An unparseable string fails the call; [`Error::failing_entry`] gives
    /// its position in `x`.
    fn transform(&self, x: &[String]) -> Result<Vec<Molecule>> {
        let parser = SmilesParser::new().sanitize(self.params.sanitize);
        let chunks = self.partitioning.dispatch(x, |chunk| {
            let parsed = if self.params.replacements.is_empty() {
                validate_smiles_with(&parser, chunk)
            } else {
                let expanded: Vec<String> = chunk.iter().map(|s| self.expand(s)).collect();
                validate_smiles_with(&parser, &expanded)
            };
            parsed.map_err(Error::from)
        })?;
        Ok(chunks.into_iter().flatten().collect())
    }
}

impl MolFromSmilesTransformer {
    fn expand(&self, smiles: &str) -> String {
        self.params
            .replacements
            .iter()
            .fold(smiles.to_string(), |s, (from, to)| s.replace(from.as_str(), to))
    }
}

impl Estimator for MolFromSmilesTransformer {
    fn get_params(&self) -> Result<Map<String, Value>> {
        to_params(&self.params)
    }

    fn set_params(&self, params: &Map<String, Value>) -> Result<Self> {
        Self::new(from_params(merge_params(self.get_params()?, params)?)?)
    }
}

/// Parameters of [`MolToSmilesTransformer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MolToSmilesParams {
    /// Write every bond symbol.
    pub all_bonds_explicit: bool,
    /// Write every atom in brackets with its hydrogen count.
    pub all_hs_explicit: bool,
    /// Requested workers.
    pub n_jobs: Option<isize>,
    /// Fixed chunk size.
    pub batch_size: Option<usize>,
}

/// Writes molecules as SMILES strings.
#[derive(Debug, Clone)]
pub struct MolToSmilesTransformer {
    params: MolToSmilesParams,
    partitioning: Partitioning,
}

impl MolToSmilesTransformer {
    /// Builds the transformer, resolving `n_jobs` once.
    pub fn new(params: MolToSmilesParams) -> Result<Self> {
        let partitioning =
            Partitioning::new(effective_n_jobs(params.n_jobs)?).with_batch_size(params.batch_size)?;
        Ok(Self {
            params,
            partitioning,
        })
    }

    /// Current parameters.
    pub fn params(&self) -> &MolToSmilesParams {
        &self.params
    }
}

impl Default for MolToSmilesTransformer {
    fn default() -> Self {
        Self {
            params: MolToSmilesParams::default(),
            partitioning: Partitioning::new(1),
        }
    }
}

impl Transformer for MolToSmilesTransformer {
    type Input = Molecule;
    type Output = Vec<String>;

    fn transform(&self, x: &[Molecule]) -> Result<Vec<String>> {
        let writer = SmilesWriter::new()
            .all_bonds_explicit(self.params.all_bonds_explicit)
            .all_hs_explicit(self.params.all_hs_explicit);
        let chunks = self
            .partitioning
            .dispatch(x, |chunk| Ok(chunk.iter().map(|m| writer.write(m)).collect::<Vec<_>>()))?;
        Ok(chunks.into_iter().flatten().collect())
    }
}

impl Estimator for MolToSmilesTransformer {
    fn get_params(&self) -> Result<Map<String, Value>> {
        to_params(&self.params)
    }

    fn set_params(&self, params: &Map<String, Value>) -> Result<Self> {
        Self::new(from_params(merge_params(self.get_params()?, params)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parallel_parse_keeps_order() {
        let smiles = strings(&["O", "CC", "[C-]#N", "CC=O", "CCO", "c1ccccc1", "N"]);
        let serial = MolFromSmilesTransformer::default().transform(&smiles).unwrap();
        let parallel = MolFromSmilesTransformer::new(MolFromSmilesParams {
            n_jobs: Some(3),
            ..MolFromSmilesParams::default()
        })
        .unwrap()
        .transform(&smiles)
        .unwrap();
        assert_eq!(serial, parallel);
        assert_eq!(parallel[5].atom_count(), 6);
    }

    #[test]
    fn parse_failure_reports_global_index() {
        let t = MolFromSmilesTransformer::new(MolFromSmilesParams {
            n_jobs: Some(2),
            batch_size: Some(2),
            ..MolFromSmilesParams::default()
        })
        .unwrap();
        let err = t
            .transform(&strings(&["O", "CC", "CCO", "C1CC"]))
            .unwrap_err();
        assert_eq!(err.failing_entry(), Some(3));
    }

    #[test]
    fn unsanitized_parse_accepts_odd_valences() {
        let smiles = strings(&["C(C)(C)(C)(C)C"]);
        assert!(MolFromSmilesTransformer::default().transform(&smiles).is_err());
        let lax = MolFromSmilesTransformer::default()
            .set_params(json!({"sanitize": false}).as_object().unwrap())
            .unwrap();
        assert_eq!(lax.transform(&smiles).unwrap()[0].atom_count(), 6);
    }

    #[test]
    fn replacements_expand_abbreviations() {
        let mut replacements = BTreeMap::new();
        replacements.insert("[Ph]".to_string(), "c1ccccc1".to_string());
        replacements.insert("[Me]".to_string(), "C".to_string());
        let t = MolFromSmilesTransformer::new(MolFromSmilesParams {
            replacements,
            n_jobs: Some(2),
            ..MolFromSmilesParams::default()
        })
        .unwrap();

        let mols = t.transform(&strings(&["[Ph][Me]", "CC", "O[Ph]"])).unwrap();
        let expected = MolFromSmilesTransformer::default()
            .transform(&strings(&["c1ccccc1C", "CC", "Oc1ccccc1"]))
            .unwrap();
        assert_eq!(mols, expected);

        // without the table the abbreviation is not a known element
        assert!(MolFromSmilesTransformer::default()
            .transform(&strings(&["[Ph][Me]"]))
            .is_err());
    }

    #[test]
    fn replacements_are_params() {
        let t = MolFromSmilesTransformer::default()
            .set_params(json!({"replacements": {"[R]": "CC"}}).as_object().unwrap())
            .unwrap();
        assert_eq!(t.get_params().unwrap()["replacements"], json!({"[R]": "CC"}));
        assert_eq!(t.transform(&strings(&["O[R]"])).unwrap()[0].atom_count(), 3);
    }

    #[test]
    fn round_trip_through_both_transformers() {
        let smiles = strings(&["O", "CC", "[C-]#N", "CC=O"]);
        let mols = MolFromSmilesTransformer::default().transform(&smiles).unwrap();
        let back = MolToSmilesTransformer::new(MolToSmilesParams {
            n_jobs: Some(2),
            ..MolToSmilesParams::default()
        })
        .unwrap()
        .transform(&mols)
        .unwrap();
        assert_eq!(back, smiles);
    }

    #[test]
    fn explicit_writer_options() {
        let mols = MolFromSmilesTransformer::default()
            .transform(&strings(&["CC=O"]))
            .unwrap();
        let t = MolToSmilesTransformer::new(MolToSmilesParams {
            all_bonds_explicit: true,
            ..MolToSmilesParams::default()
        })
        .unwrap();
        assert_eq!(t.transform(&mols).unwrap(), vec!["C-C=O".to_string()]);
    }

    #[test]
    fn params_round_trip() {
        let t = MolToSmilesTransformer::default();
        let p = t.get_params().unwrap();
        assert_eq!(p["all_hs_explicit"], json!(false));
        assert!(t.set_params(json!({"bogus": 1}).as_object().unwrap()).is_err());
    }
}
