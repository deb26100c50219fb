#![warn(missing_docs)]
//! molfp — parallel molecular fingerprint transformers.
//!
//! This crate turns batches of molecules (SMILES strings or parsed graphs) into
//! fingerprint matrices, splitting large batches into chunks that run on a
//! worker pool and stitching the chunk results back together in input order.
//!
//! - **molecule** — hydrogen-suppressed molecular graph, SMILES reader/writer
//! - **validation** — up-front input checking, so bad entries fail before any work starts
//! - **fingerprints** — Morgan, atom-pair, topological-torsion, path and MACCS
//! - **parallel** — `n_jobs` resolution, batch partitioning, ordered dispatch
//! - **aggregate** — dense (`ndarray`) and sparse (`sprs` CSR) row stacking
//! - **transformer** — the [`FingerprintTransformer`] facade, [`Estimator`] params, [`Pipeline`]
//! - **preprocessing** — SMILES ↔ molecule transformers on the same dispatcher
//! - **data_io** — CSV loaders for SMILES columns and writers for fingerprints
//!
//! Output never depends on the worker count: `n_jobs = 1` and `n_jobs = -1`
//! produce identical matrices.
//!
//! # Quick examples
//!
//! ### Count fingerprints in parallel
//! ```
//! use molfp::fingerprints::MorganFingerprint;
//! use molfp::{FingerprintTransformer, TransformerConfig};
//!
//! let config = TransformerConfig { count: true, n_jobs: Some(-1), ..Default::default() };
//! let fp = FingerprintTransformer::new(MorganFingerprint::default(), config).unwrap();
//! let x = fp.transform_smiles(&["CCO", "CC(=O)Oc1ccccc1C(=O)O", "c1ccccc1"]).unwrap();
//! assert_eq!(x.shape(), (3, 2048));
//! ```
//!
//! ### Sparse output
//! ```
//! use molfp::fingerprints::AtomPairFingerprint;
//! use molfp::{FingerprintTransformer, TransformerConfig};
//!
//! let config = TransformerConfig { sparse: true, n_jobs: Some(2), ..Default::default() };
//! let fp = FingerprintTransformer::new(AtomPairFingerprint::default(), config).unwrap();
//! let x = fp.transform_smiles(&["CCO", "CCN"]).unwrap();
//! assert!(x.is_sparse());
//! ```
//!
//! ### Load a dataset and write fingerprints
//! ```no_run
//! use molfp::data_io::{read_smiles_csv, write_fingerprints_csv_to_path};
//! use molfp::fingerprints::MaccsFingerprint;
//! use molfp::{FingerprintTransformer, TransformerConfig};
//!
//! let smiles = read_smiles_csv("data.csv", "smiles")?;
//! let fp = FingerprintTransformer::new(MaccsFingerprint::new(), TransformerConfig::default())?;
//! write_fingerprints_csv_to_path("maccs.csv", &fp.transform_smiles(&smiles)?)?;
//! # Ok::<(), molfp::Error>(())
//! ```

pub mod aggregate;
pub mod data_io;
pub mod error;
pub mod fingerprints;
pub mod matrix;
pub mod molecule;
pub mod parallel;
pub mod preprocessing;
pub mod transformer;
pub mod validation;

// ─────────────────────────────────────────────────────────────────────────────
// Convenience re-exports
// ─────────────────────────────────────────────────────────────────────────────
pub use error::{ComputationError, Error, Result, ValidationError};
pub use fingerprints::FingerprintComputation;
pub use matrix::{FeatureCounts, FingerprintMatrix, OutputFormat};
pub use molecule::{
    parse_smiles, to_smiles, Atom, Bond, BondOrder, GraphError, Molecule, SmilesError,
    SmilesParser, SmilesWriter,
};
pub use transformer::{Estimator, FingerprintTransformer, Pipeline, Transformer, TransformerConfig};
pub use validation::MoleculeInput;
