//! Error types for docufill-edit.
//!
//! Two levels:
//! - Placeholder errors are caught at the per-placeholder boundary and never abort a document.
//! - Document errors abort the whole document (invalid structure, cancellation, runtime).

use docufill_tree::TreeError;
use docufill_types::Scope;
use thiserror::Error;

/// Failure while processing one placeholder.
#[derive(Debug, Error)]
pub enum PlaceholderError {
    /// No container or run could be found. The placeholder is left untouched.
    #[error("structural lookup failed for '{tag}': {message}")]
    StructuralLookup { tag: String, message: String },

    /// The fill data has no value for this tag.
    #[error("no fill value for '{tag}'")]
    DataMissing { tag: String },

    /// A tree edit failed part-way through this placeholder.
    #[error("mutation of '{tag}' in {scope} failed: {source}")]
    Mutation {
        tag: String,
        scope: Scope,
        #[source]
        source: TreeError,
    },
}

impl PlaceholderError {
    /// Skipped without any user-visible warning.
    pub fn is_silent(&self) -> bool {
        matches!(self, PlaceholderError::DataMissing { .. })
    }

    /// Recoverable skip that should surface as a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, PlaceholderError::StructuralLookup { .. })
    }

    pub fn tag(&self) -> &str {
        match self {
            PlaceholderError::StructuralLookup { tag, .. }
            | PlaceholderError::DataMissing { tag }
            | PlaceholderError::Mutation { tag, .. } => tag,
        }
    }
}

/// Failure that stops work on a whole document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// No usable root; no placeholder work can proceed.
    #[error("document structure invalid: {0}")]
    StructureInvalid(String),

    /// The cancel token fired between placeholders.
    #[error("cancelled")]
    Cancelled,

    #[error("runtime error: {0}")]
    Runtime(#[from] anyhow::Error),
}

impl DocumentError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DocumentError::Cancelled)
    }
}

impl From<TreeError> for DocumentError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::InvalidRoot { .. } => DocumentError::StructureInvalid(err.to_string()),
            other => DocumentError::Runtime(anyhow::Error::new(other)),
        }
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;
