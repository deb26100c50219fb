//! Error types for fingerprint transformation.
//!
//! Every fallible operation in the crate returns [`Error`]. Failures are
//! categorized by the stage that raised them:
//!
//! | Variant               | Stage                  | Raised when                                      |
//! |-----------------------|------------------------|--------------------------------------------------|
//! | `Validation`          | Input validation       | an entry is not a parseable SMILES / valid mol   |
//! | `Computation`         | Fingerprint plugin     | a molecule violates a fingerprint precondition   |
//! | `Chunk`               | Parallel dispatch      | wraps any failure raised inside a worker chunk   |
//! | `Shape`               | Result aggregation     | chunk outputs disagree on layout or width        |
//! | `Configuration`       | Construction           | an invalid parameter combination is requested    |
//!
//! All errors are fatal to the call that produced them: no partial matrices
//! are ever returned.

use thiserror::Error;

use crate::molecule::SmilesError;

/// Errors that can occur while validating input or computing fingerprints.
#[derive(Debug, Error)]
pub enum Error {
    /// An input entry was rejected before any work was dispatched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A fingerprint plugin could not process one molecule of its chunk.
    ///
    /// `molecule` is the position inside the slice handed to the plugin. When
    /// the error travels through the dispatcher it is wrapped in
    /// [`Error::Chunk`]; use [`Error::failing_entry`] to recover the index in
    /// the original input.
    #[error("molecule {molecule} could not be fingerprinted: {source}")]
    Computation {
        /// Index of the molecule inside the computed slice.
        molecule: usize,
        /// The plugin failure.
        #[source]
        source: ComputationError,
    },

    /// A worker chunk failed; the whole call fails with it.
    #[error("chunk {chunk} (inputs {start}..{end}) failed: {source}")]
    Chunk {
        /// Position of the chunk in dispatch order.
        chunk: usize,
        /// First input index covered by the chunk.
        start: usize,
        /// One past the last input index covered by the chunk.
        end: usize,
        /// The error raised inside the worker.
        #[source]
        source: Box<Error>,
    },

    /// Chunk outputs could not be merged into one matrix.
    #[error("chunk {chunk} has shape mismatch: {detail}")]
    Shape {
        /// Position of the offending chunk.
        chunk: usize,
        /// Description of the mismatch.
        detail: String,
    },

    /// An invalid parameter combination was requested.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Parameters could not be converted to or from their JSON form.
    #[error("invalid parameter value: {0}")]
    Params(#[from] serde_json::Error),

    /// The worker thread pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// A required CSV column is absent from the header.
    #[error("column '{0}' not found")]
    MissingColumn(String),

    /// Reading or writing a CSV file failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a [`Configuration`](Error::Configuration) error.
    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::Configuration(detail.into())
    }

    /// Creates a [`Shape`](Error::Shape) error for the given chunk.
    pub fn shape(chunk: usize, detail: impl Into<String>) -> Self {
        Self::Shape {
            chunk,
            detail: detail.into(),
        }
    }

    /// Index of the failing entry in the original input, when known.
    ///
    /// Chunk offsets are added while unwinding nested [`Chunk`](Error::Chunk)
    /// wrappers, so the result always refers to the caller's input order.
    ///
    /// ```
    /// use molfp::{ComputationError, Error};
    ///
    /// let inner = Error::Computation {
    ///     molecule: 1,
    ///     source: ComputationError::new("atom_pair", "atom 3 has degree 8"),
    /// };
    /// let err = Error::Chunk { chunk: 2, start: 4, end: 6, source: Box::new(inner) };
    /// assert_eq!(err.failing_entry(), Some(5));
    /// ```
    pub fn failing_entry(&self) -> Option<usize> {
        match self {
            Error::Validation(err) => Some(err.index()),
            Error::Computation { molecule, .. } => Some(*molecule),
            Error::Chunk { start, source, .. } => source.failing_entry().map(|i| start + i),
            _ => None,
        }
    }
}

/// Errors raised by input validation.
///
/// Both variants carry the index of the offending entry so the caller can
/// locate it in the original collection.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A string entry is not a parseable SMILES.
    #[error("entry {index} ({smiles:?}) is not a valid SMILES: {source}")]
    InvalidSmiles {
        /// Position of the entry in the input.
        index: usize,
        /// The rejected text.
        smiles: String,
        /// Parser diagnosis.
        #[source]
        source: SmilesError,
    },

    /// An entry is neither a SMILES string nor a well-formed molecule.
    #[error("entry {index} is neither a SMILES string nor a molecule: {detail}")]
    UnsupportedEntry {
        /// Position of the entry in the input.
        index: usize,
        /// What was found instead.
        detail: String,
    },
}

impl ValidationError {
    /// Position of the rejected entry.
    pub fn index(&self) -> usize {
        match self {
            ValidationError::InvalidSmiles { index, .. }
            | ValidationError::UnsupportedEntry { index, .. } => *index,
        }
    }
}

/// A fingerprint plugin rejected a molecule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{fingerprint}: {detail}")]
pub struct ComputationError {
    /// Name of the fingerprint that failed.
    pub fingerprint: &'static str,
    /// Description of the violated precondition.
    pub detail: String,
}

impl ComputationError {
    /// Creates a new computation error for the named fingerprint.
    pub fn new(fingerprint: &'static str, detail: impl Into<String>) -> Self {
        Self {
            fingerprint,
            detail: detail.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_entry_resolves_nested_chunks() {
        let inner = Error::Computation {
            molecule: 2,
            source: ComputationError::new("morgan", "boom"),
        };
        let chunk = Error::Chunk {
            chunk: 3,
            start: 9,
            end: 12,
            source: Box::new(inner),
        };
        assert_eq!(chunk.failing_entry(), Some(11));
        assert!(chunk.to_string().contains("chunk 3 (inputs 9..12)"));
    }

    #[test]
    fn configuration_errors_have_no_entry() {
        let err = Error::configuration("count not supported");
        assert_eq!(err.failing_entry(), None);
        assert_eq!(err.to_string(), "invalid configuration: count not supported");
    }
}
