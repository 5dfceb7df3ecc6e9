//! Placeholder enumeration.

use crate::node::{NodeId, NodeKind};
use crate::tree::DocTree;
use docufill_types::{PlaceholderInfo, Scope, StructuralKind};
use tracing::warn;

/// A tagged placeholder found in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderNode {
    pub id: NodeId,
    pub tag: String,
    pub title: Option<String>,
    pub scope: Scope,
    pub kind: StructuralKind,
}

impl PlaceholderNode {
    pub fn info(&self) -> PlaceholderInfo {
        PlaceholderInfo {
            tag: self.tag.clone(),
            title: self.title.clone(),
            scope: self.scope,
            kind: self.kind,
        }
    }
}

/// Declared tag of a placeholder, trimmed; empty if the node has none or is not a placeholder.
pub fn read_tag(tree: &DocTree, node: NodeId) -> String {
    match tree.kind(node) {
        Some(NodeKind::Placeholder(props)) => props
            .tag
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

pub fn read_title(tree: &DocTree, node: NodeId) -> Option<String> {
    match tree.kind(node) {
        Some(NodeKind::Placeholder(props)) => props.title.clone(),
        _ => None,
    }
}

/// Every placeholder node under `root`, tagged or not, in document order.
pub fn placeholder_ids(tree: &DocTree, root: NodeId) -> Vec<NodeId> {
    tree.descendants(root)
        .into_iter()
        .filter(|&d| tree.kind(d).is_some_and(NodeKind::is_placeholder))
        .collect()
}

/// Tagged placeholders under `root` in document order. Untagged ones are skipped with a warning.
pub fn find_all(tree: &DocTree, root: NodeId, scope: Scope) -> Vec<PlaceholderNode> {
    let mut out = Vec::new();
    for id in placeholder_ids(tree, root) {
        let tag = read_tag(tree, id);
        if tag.is_empty() {
            warn!(node = %id, %scope, "placeholder has no tag, skipping");
            continue;
        }
        let kind = match tree.kind(id) {
            Some(NodeKind::Placeholder(props)) => props.kind,
            _ => continue,
        };
        out.push(PlaceholderNode {
            id,
            tag,
            title: read_title(tree, id),
            scope,
            kind,
        });
    }
    out
}

/// Tagged placeholders across body, then headers, then footers.
pub fn find_all_in_document(tree: &DocTree) -> Vec<PlaceholderNode> {
    tree.scope_roots()
        .into_iter()
        .flat_map(|(scope, root)| find_all(tree, root, scope))
        .collect()
}

pub fn list_placeholders(tree: &DocTree) -> Vec<PlaceholderInfo> {
    find_all_in_document(tree)
        .iter()
        .map(PlaceholderNode::info)
        .collect()
}
