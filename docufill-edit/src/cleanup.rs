//! Cleanup: strip the audit trail and unwrap placeholders into plain content.

use docufill_tree::navigate::find_container;
use docufill_tree::resolve::{placeholder_ids, read_tag};
use docufill_tree::{DocTree, NodeId, NodeKind, RunStyle, TreeResult};
use docufill_types::CleanupReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::error::DocumentResult;

pub const DEFAULT_NEUTRAL_COLOR: &str = "000000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupOptions {
    /// Colour given to every run inside an annotated span.
    pub neutral_color: String,
    pub strip_annotations: bool,
    pub unwrap_placeholders: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            neutral_color: DEFAULT_NEUTRAL_COLOR.to_string(),
            strip_annotations: true,
            unwrap_placeholders: true,
        }
    }
}

/// Strips annotations, then unwraps placeholders, on the same open document.
pub fn cleanup_document(
    tree: &mut DocTree,
    options: &CleanupOptions,
) -> DocumentResult<CleanupReport> {
    tree.validate()?;
    let mut report = CleanupReport::default();

    if options.strip_annotations {
        report.annotations_removed = strip_annotations(tree, &options.neutral_color)?;
    }
    if options.unwrap_placeholders {
        let (count, warnings) = unwrap_placeholders(tree)?;
        report.placeholders_unwrapped = count;
        report.warnings = warnings;
    }

    info!(
        annotations_removed = report.annotations_removed,
        placeholders_unwrapped = report.placeholders_unwrapped,
        "cleanup complete"
    );
    Ok(report)
}

/// Removes every annotation in the store together with its markers, and deletes the store.
///
/// Runs inside each annotated span (nested ones included) get `neutral_color`. Returns the
/// number of annotations removed; a document without a store is a no-op.
pub fn strip_annotations(tree: &mut DocTree, neutral_color: &str) -> TreeResult<u64> {
    let ids: BTreeSet<String> = match tree.annotations() {
        Some(store) if !store.is_empty() => store.ids().map(str::to_string).collect(),
        _ => {
            debug!("no annotations to strip");
            return Ok(0);
        }
    };

    let mut markers = Vec::new();
    let mut to_neutralize = Vec::new();
    for (_, root) in tree.scope_roots() {
        let mut open: BTreeSet<&str> = BTreeSet::new();
        for node in tree.descendants(root) {
            match tree.kind(node) {
                Some(NodeKind::AnnotationStart { id }) if ids.contains(id) => {
                    open.insert(id.as_str());
                    markers.push(node);
                }
                Some(NodeKind::AnnotationEnd { id }) if ids.contains(id) => {
                    open.remove(id.as_str());
                    markers.push(node);
                }
                Some(NodeKind::AnnotationReference { id }) if ids.contains(id) => {
                    markers.push(node);
                }
                Some(NodeKind::Run { .. }) if !open.is_empty() => to_neutralize.push(node),
                _ => {}
            }
        }
    }

    for run in to_neutralize {
        if let Some(NodeKind::Run { style }) = tree.kind_mut(run) {
            style.get_or_insert_with(RunStyle::default).color = Some(neutral_color.to_string());
        }
    }
    for marker in markers {
        if tree.contains(marker) {
            tree.remove(marker)?;
        }
    }

    let removed = tree.take_annotations().map_or(0, |store| store.len()) as u64;
    debug!(removed, "annotations stripped");
    Ok(removed)
}

/// Unwraps every placeholder across body, then headers, then footers.
///
/// Each placeholder has its container's children moved out in order, then is deleted. For a
/// cell wrapper that promotes the wrapped cells; a block wrapping a table hands back the whole
/// table. Placeholders without a container are skipped with a warning, so no cell is lost.
pub fn unwrap_placeholders(tree: &mut DocTree) -> TreeResult<(u64, Vec<String>)> {
    let mut count = 0;
    let mut warnings = Vec::new();

    for (scope, root) in tree.scope_roots() {
        for placeholder in placeholder_ids(tree, root) {
            if !tree.contains(placeholder) {
                continue;
            }
            let tag = read_tag(tree, placeholder);

            let Some(container) = find_container(tree, placeholder) else {
                warn!(%tag, %scope, "placeholder has no content container, skipping unwrap");
                warnings.push(format!("placeholder '{tag}' ({scope}) has no content container"));
                continue;
            };

            let children: Vec<NodeId> = tree.children(container.id()).to_vec();
            for child in children {
                tree.move_before(placeholder, child)?;
            }
            tree.remove(placeholder)?;
            count += 1;
        }
    }

    Ok((count, warnings))
}
