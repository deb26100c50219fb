// src/transformer.rs
//! Transformer facade.
//!
//! [`FingerprintTransformer`] wraps any [`FingerprintComputation`] with the
//! shared machinery: input validation, worker-count resolution, chunked
//! parallel dispatch and result aggregation. Each call is a pure function of
//! the input and the configuration, so `fit` is a no-op and any number of
//! threads may share one transformer.
//!
//! ```
//! use molfp::fingerprints::PathFingerprint;
//! use molfp::validation::inputs;
//! use molfp::{FingerprintTransformer, Transformer, TransformerConfig};
//!
//! let config = TransformerConfig { n_jobs: Some(2), ..TransformerConfig::default() };
//! let fp = FingerprintTransformer::new(PathFingerprint::default(), config).unwrap();
//! let x = fp.transform(&inputs(["O", "CC", "[C-]#N", "CC=O"])).unwrap();
//! assert_eq!(x.shape(), (4, 512));
//! ```

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregate::aggregate;
use crate::error::{Error, Result};
use crate::fingerprints::FingerprintComputation;
use crate::matrix::{FingerprintMatrix, OutputFormat};
use crate::molecule::Molecule;
use crate::parallel::{effective_n_jobs, Partitioning};
use crate::validation::{validate, validate_smiles, MoleculeInput};

// ─────────────────────────────────────────────────────────────────────────────
// Traits
// ─────────────────────────────────────────────────────────────────────────────

/// A stateless batch transformation.
pub trait Transformer {
    /// Element type of the input batch.
    type Input;
    /// Result of transforming one batch.
    type Output;

    /// Transforms a batch.
    fn transform(&self, x: &[Self::Input]) -> Result<Self::Output>;

    /// Learns nothing; present for pipeline compatibility.
    fn fit(&self, _x: &[Self::Input], _y: Option<&[f64]>) -> &Self {
        self
    }

    /// `fit` followed by `transform`.
    fn fit_transform(&self, x: &[Self::Input], y: Option<&[f64]>) -> Result<Self::Output> {
        self.fit(x, y).transform(x)
    }
}

/// Introspection and reconfiguration through a flat parameter map.
pub trait Estimator: Sized {
    /// All hyperparameters as a flat JSON object.
    fn get_params(&self) -> Result<Map<String, Value>>;

    /// A new instance with `params` applied on top of the current ones.
    ///
    /// # Errors
    ///
    /// Unknown keys and invalid values are rejected; the new instance is
    /// validated exactly like a freshly constructed one.
    fn set_params(&self, params: &Map<String, Value>) -> Result<Self>;
}

/// Serializes a parameter struct into a JSON object.
pub(crate) fn to_params<P: Serialize>(params: &P) -> Result<Map<String, Value>> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::configuration(format!(
            "parameters must serialize to an object, got {other}"
        ))),
    }
}

/// Applies `updates` to `current`, rejecting keys `current` does not have.
pub(crate) fn merge_params(
    mut current: Map<String, Value>,
    updates: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    for (key, value) in updates {
        match current.get_mut(key) {
            Some(slot) => *slot = value.clone(),
            None => {
                return Err(Error::configuration(format!(
                    "unknown parameter '{key}'"
                )))
            }
        }
    }
    Ok(current)
}

pub(crate) fn from_params<P: DeserializeOwned>(params: Map<String, Value>) -> Result<P> {
    Ok(serde_json::from_value(Value::Object(params))?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Fingerprint transformer
// ─────────────────────────────────────────────────────────────────────────────

/// Output and parallelism options shared by all fingerprints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Emit occurrence counts instead of 0/1 bits.
    pub count: bool,
    /// Emit a sparse CSR matrix.
    pub sparse: bool,
    /// Requested workers: unset is 1, negative counts back from the CPU
    /// count (`-1` = all), zero is invalid.
    pub n_jobs: Option<isize>,
    /// Fixed chunk size; unset derives it from the worker count.
    pub batch_size: Option<usize>,
}

const CONFIG_KEYS: [&str; 4] = ["count", "sparse", "n_jobs", "batch_size"];

/// A fingerprint algorithm plus validation, dispatch and aggregation.
#[derive(Debug, Clone)]
pub struct FingerprintTransformer<F> {
    fingerprint: F,
    config: TransformerConfig,
    partitioning: Partitioning,
}

impl<F: FingerprintComputation> FingerprintTransformer<F> {
    /// Builds a transformer, resolving `n_jobs` once.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the algorithm parameters are invalid,
    /// `count` is requested from a binary-only algorithm, `n_jobs` is zero or
    /// `batch_size` is zero.
    pub fn new(fingerprint: F, config: TransformerConfig) -> Result<Self> {
        fingerprint.validate()?;
        if config.count && !fingerprint.supports_count() {
            return Err(Error::configuration(format!(
                "{} fingerprint does not support count output",
                fingerprint.name()
            )));
        }
        let n_jobs = effective_n_jobs(config.n_jobs)?;
        let partitioning = Partitioning::new(n_jobs).with_batch_size(config.batch_size)?;
        debug!(
            "{} transformer: n_jobs {:?} resolved to {n_jobs} worker(s), {} columns",
            fingerprint.name(),
            config.n_jobs,
            fingerprint.n_features()
        );
        Ok(Self {
            fingerprint,
            config,
            partitioning,
        })
    }

    /// The wrapped algorithm.
    pub fn fingerprint(&self) -> &F {
        &self.fingerprint
    }

    /// Output and parallelism options.
    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Number of output columns.
    pub fn n_features(&self) -> usize {
        self.fingerprint.n_features()
    }

    /// Worker count resolved at construction.
    pub fn effective_n_jobs(&self) -> usize {
        self.partitioning.n_jobs()
    }

    fn output_format(&self) -> OutputFormat {
        OutputFormat {
            count: self.config.count,
            sparse: self.config.sparse,
        }
    }

    /// Fingerprints already-parsed molecules.
    pub fn transform_molecules(&self, molecules: &[Molecule]) -> Result<FingerprintMatrix> {
        let format = self.output_format();
        let fingerprint = &self.fingerprint;
        let chunks = self
            .partitioning
            .dispatch(molecules, move |chunk| fingerprint.compute(chunk, format))?;
        aggregate(chunks, self.n_features(), format.sparse)
    }

    /// Parses and fingerprints SMILES strings.
    ///
    /// # Errors
    ///
    /// Every string is parsed before any fingerprint is computed; the first
    /// unparseable one fails the call with [`Error::Validation`].
    pub fn transform_smiles<S: AsRef<str>>(&self, smiles: &[S]) -> Result<FingerprintMatrix> {
        let molecules = validate_smiles(smiles)?;
        self.transform_molecules(&molecules)
    }
}

impl<F: FingerprintComputation> Transformer for FingerprintTransformer<F> {
    type Input = MoleculeInput;
    type Output = FingerprintMatrix;

    fn transform(&self, x: &[MoleculeInput]) -> Result<FingerprintMatrix> {
        let molecules = validate(x)?;
        self.transform_molecules(&molecules)
    }
}

impl<F> Estimator for FingerprintTransformer<F>
where
    F: FingerprintComputation + Serialize + DeserializeOwned,
{
    fn get_params(&self) -> Result<Map<String, Value>> {
        let mut params = to_params(&self.fingerprint)?;
        params.extend(to_params(&self.config)?);
        Ok(params)
    }

    fn set_params(&self, updates: &Map<String, Value>) -> Result<Self> {
        let merged = merge_params(self.get_params()?, updates)?;
        let (config, fingerprint): (Map<_, _>, Map<_, _>) = merged
            .into_iter()
            .partition(|(key, _)| CONFIG_KEYS.contains(&key.as_str()));
        Self::new(from_params(fingerprint)?, from_params(config)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Two transformers applied in sequence.
///
/// ```
/// use molfp::fingerprints::MorganFingerprint;
/// use molfp::preprocessing::MolFromSmilesTransformer;
/// use molfp::{FingerprintTransformer, Pipeline, Transformer};
///
/// let pipeline = Pipeline::new(
///     MolFromSmilesTransformer::default(),
///     FingerprintTransformer::new(MorganFingerprint::default(), Default::default()).unwrap(),
/// );
/// let x = pipeline.transform(&["CCO".to_string(), "c1ccccc1".to_string()]).unwrap();
/// assert_eq!(x.shape(), (2, 2048));
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline<A, B> {
    first: A,
    second: B,
}

impl<A, B> Pipeline<A, B> {
    /// Chains `first` into `second`.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// The first stage.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The second stage.
    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A, B> Transformer for Pipeline<A, B>
where
    A: Transformer,
    A::Output: IntoIterator,
    <A::Output as IntoIterator>::Item: Into<B::Input>,
    B: Transformer,
{
    type Input = A::Input;
    type Output = B::Output;

    fn transform(&self, x: &[A::Input]) -> Result<B::Output> {
        let intermediate: Vec<B::Input> = self
            .first
            .transform(x)?
            .into_iter()
            .map(Into::into)
            .collect();
        self.second.transform(&intermediate)
    }
}
