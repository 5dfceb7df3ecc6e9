use crate::placeholder::Scope;
use serde::{Deserialize, Serialize};

/// One successful placeholder mutation, as forwarded to loggers and hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderEvent {
    pub tag: String,
    pub scope: Scope,
    pub previous: String,
    pub new: String,

    /// Strategy that performed the mutation (`standard`, `in_cell_inline`, ...).
    pub strategy: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillReport {
    pub schema: String,
    pub mutated: u64,
    pub skipped_missing: u64,
    pub skipped_untagged: u64,
    pub skipped_structural: u64,
    pub failed: u64,
    pub annotations_added: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    #[serde(default)]
    pub events: Vec<PlaceholderEvent>,
}

impl Default for FillReport {
    fn default() -> Self {
        Self {
            schema: crate::schema::DOCUFILL_FILL_REPORT_V1.to_string(),
            mutated: 0,
            skipped_missing: 0,
            skipped_untagged: 0,
            skipped_structural: 0,
            failed: 0,
            annotations_added: 0,
            warnings: vec![],
            events: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    pub schema: String,
    pub annotations_removed: u64,
    pub placeholders_unwrapped: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Default for CleanupReport {
    fn default() -> Self {
        Self {
            schema: crate::schema::DOCUFILL_CLEANUP_REPORT_V1.to_string(),
            annotations_removed: 0,
            placeholders_unwrapped: 0,
            warnings: vec![],
        }
    }
}

impl CleanupReport {
    pub fn is_noop(&self) -> bool {
        self.annotations_removed == 0 && self.placeholders_unwrapped == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Filled {
        mutated: u64,
    },
    Cleaned {
        annotations_removed: u64,
        placeholders_unwrapped: u64,
    },
    Failed {
        error: String,
    },
    Cancelled,
}

impl DocumentStatus {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DocumentStatus::Filled { .. } | DocumentStatus::Cleaned { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub input: String,
    pub output: String,

    #[serde(flatten)]
    pub status: DocumentStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub schema: String,

    #[serde(default)]
    pub documents: Vec<DocumentOutcome>,
}

impl Default for BatchSummary {
    fn default() -> Self {
        Self {
            schema: crate::schema::DOCUFILL_BATCH_V1.to_string(),
            documents: vec![],
        }
    }
}

impl BatchSummary {
    pub fn succeeded(&self) -> u64 {
        self.documents
            .iter()
            .filter(|d| d.status.is_success())
            .count() as u64
    }

    pub fn failed(&self) -> u64 {
        self.documents
            .iter()
            .filter(|d| matches!(d.status, DocumentStatus::Failed { .. }))
            .count() as u64
    }

    pub fn cancelled(&self) -> u64 {
        self.documents
            .iter()
            .filter(|d| matches!(d.status, DocumentStatus::Cancelled))
            .count() as u64
    }

    pub fn warnings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.documents
            .iter()
            .flat_map(|d| d.warnings.iter().map(move |w| (d.input.as_str(), w.as_str())))
    }
}
