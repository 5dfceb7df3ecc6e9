//! Edit engine for docufill document trees.
//!
//! Responsibilities:
//! - Fill tagged placeholders with plain or script-formatted values without breaking table or
//!   paragraph topology ([`replace`], [`render`]).
//! - Record each fill as an anchored audit annotation ([`annotate`]).
//! - Strip annotations and unwrap placeholders back into plain content ([`cleanup`]).
//!
//! A single document is always mutated from one thread. Parallelism belongs to the caller, one
//! document per worker.

pub mod annotate;
pub mod cells;
pub mod cleanup;
pub mod error;
pub mod render;
pub mod replace;

pub use cleanup::{cleanup_document, CleanupOptions};
pub use error::{DocumentError, DocumentResult, PlaceholderError};

use chrono::Utc;
use docufill_tree::resolve::{find_all_in_document, placeholder_ids};
use docufill_tree::{DocTree, PlaceholderNode};
use docufill_types::{FillData, FillReport, PlaceholderEvent};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DEFAULT_AUTHOR: &str = "docufill";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillOptions {
    /// Author recorded on annotations.
    pub author: String,

    /// Record an annotation for every successful mutation.
    pub annotate: bool,

    /// Colour applied to every rendered run, e.g. `FF0000`.
    pub highlight_color: Option<String>,

    pub merge_cell_paragraphs: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            annotate: true,
            highlight_color: None,
            merge_cell_paragraphs: true,
        }
    }
}

/// Cooperative cancellation flag, shared between a host and its workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fills every tagged placeholder in body, headers and footers.
///
/// Per-placeholder failures are counted and logged, never propagated. The token is checked
/// between placeholders; a placeholder that has started is always finished first.
pub fn fill_document(
    tree: &mut DocTree,
    data: &FillData,
    options: &FillOptions,
    cancel: &CancelToken,
) -> DocumentResult<FillReport> {
    tree.validate()?;

    let mut report = FillReport::default();
    let placeholders = find_all_in_document(tree);
    let total: usize = tree
        .scope_roots()
        .into_iter()
        .map(|(_, root)| placeholder_ids(tree, root).len())
        .sum();
    report.skipped_untagged = total.saturating_sub(placeholders.len()) as u64;

    for placeholder in &placeholders {
        if cancel.is_cancelled() {
            info!(mutated = report.mutated, "fill cancelled");
            return Err(DocumentError::Cancelled);
        }

        match fill_placeholder(tree, placeholder, data, options) {
            Ok(filled) => {
                report.mutated += 1;
                if filled.event.annotation_id.is_some() {
                    report.annotations_added += 1;
                }
                report.warnings.extend(filled.warnings);
                report.events.push(filled.event);
            }
            Err(err) if err.is_silent() => {
                debug!(tag = err.tag(), "no fill value, leaving placeholder untouched");
                report.skipped_missing += 1;
            }
            Err(err) if err.is_warning() => {
                warn!(tag = err.tag(), scope = %placeholder.scope, "{err}");
                report.skipped_structural += 1;
                report.warnings.push(err.to_string());
            }
            Err(err) => {
                error!(tag = err.tag(), scope = %placeholder.scope, "{err}");
                report.failed += 1;
                report.warnings.push(err.to_string());
            }
        }
    }

    if options.merge_cell_paragraphs {
        cells::merge_cell_paragraphs(tree)?;
    }

    Ok(report)
}

struct Filled {
    event: PlaceholderEvent,
    warnings: Vec<String>,
}

fn fill_placeholder(
    tree: &mut DocTree,
    placeholder: &PlaceholderNode,
    data: &FillData,
    options: &FillOptions,
) -> Result<Filled, PlaceholderError> {
    if !tree.contains(placeholder.id) {
        return Err(PlaceholderError::StructuralLookup {
            tag: placeholder.tag.clone(),
            message: "placeholder was removed by an earlier replacement".to_string(),
        });
    }

    let value = data
        .get(&placeholder.tag)
        .ok_or_else(|| PlaceholderError::DataMissing {
            tag: placeholder.tag.clone(),
        })?;

    let previous = tree.text_of(placeholder.id);
    let new = value.plain_text();

    let replacement = replace::replace(
        tree,
        placeholder,
        value,
        options.highlight_color.as_deref(),
    )?;
    let mut warnings = replacement.warnings;

    let mut annotation_id = None;
    if options.annotate {
        if replacement.runs.is_empty() {
            warnings.push(format!(
                "placeholder '{}' was cleared; no annotation recorded",
                placeholder.tag
            ));
        } else {
            let now = Utc::now();
            let body =
                annotate::change_message(placeholder.scope, now, &placeholder.tag, &previous, &new);
            // The content is already replaced; a failed annotation leaves it in place.
            match annotate::record_change(tree, &replacement.runs, body, &options.author, now) {
                Ok(id) => annotation_id = id,
                Err(err) => {
                    warn!(tag = %placeholder.tag, scope = %placeholder.scope, "{err}");
                    warnings.push(format!(
                        "placeholder '{}' was filled but no annotation recorded: {err}",
                        placeholder.tag
                    ));
                }
            }
        }
    }

    info!(
        tag = %placeholder.tag,
        scope = %placeholder.scope,
        previous = %previous,
        new = %new,
        strategy = replacement.strategy.name(),
        "placeholder filled"
    );

    Ok(Filled {
        event: PlaceholderEvent {
            tag: placeholder.tag.clone(),
            scope: placeholder.scope,
            previous,
            new,
            strategy: replacement.strategy.name().to_string(),
            annotation_id,
        },
        warnings,
    })
}
