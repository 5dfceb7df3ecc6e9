//! Structural classification queries.
//!
//! Every function walks the tree on each call. Callers mutate the tree between calls, so no
//! answer may be cached across mutations.

use crate::node::{ContainerKind, NodeId, NodeKind};
use crate::tree::DocTree;

/// The structural child directly owned by a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Inline(NodeId),
    Block(NodeId),
    Cell(NodeId),
}

impl Container {
    pub fn id(self) -> NodeId {
        match self {
            Container::Inline(id) | Container::Block(id) | Container::Cell(id) => id,
        }
    }

    pub fn kind(self) -> ContainerKind {
        match self {
            Container::Inline(_) => ContainerKind::Inline,
            Container::Block(_) => ContainerKind::Block,
            Container::Cell(_) => ContainerKind::Cell,
        }
    }
}

/// True if any descendant of `node` is a table cell.
pub fn contains_cell(tree: &DocTree, node: NodeId) -> bool {
    first_cell_descendant(tree, node).is_some()
}

/// True if any ancestor of `node` is a table cell.
pub fn is_within_cell(tree: &DocTree, node: NodeId) -> bool {
    enclosing_cell(tree, node).is_some()
}

pub fn first_cell_descendant(tree: &DocTree, node: NodeId) -> Option<NodeId> {
    tree.descendants(node)
        .into_iter()
        .find(|&d| tree.kind(d).is_some_and(NodeKind::is_cell))
}

pub fn enclosing_cell(tree: &DocTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node)
        .find(|&a| tree.kind(a).is_some_and(NodeKind::is_cell))
}

pub fn enclosing_paragraph(tree: &DocTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node)
        .find(|&a| tree.kind(a).is_some_and(NodeKind::is_paragraph))
}

/// First placeholder-typed ancestor of `node`, or none.
pub fn nearest_enclosing_placeholder(tree: &DocTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node)
        .find(|&a| tree.kind(a).is_some_and(NodeKind::is_placeholder))
}

/// The placeholder's content container.
///
/// Only direct children are considered. If a malformed placeholder owns several, inline wins over
/// block, and block over cell.
pub fn find_container(tree: &DocTree, placeholder: NodeId) -> Option<Container> {
    let mut block = None;
    let mut cell = None;
    for &child in tree.children(placeholder) {
        match tree.kind(child) {
            Some(NodeKind::Container {
                kind: ContainerKind::Inline,
            }) => return Some(Container::Inline(child)),
            Some(NodeKind::Container {
                kind: ContainerKind::Block,
            }) => {
                block.get_or_insert(child);
            }
            Some(NodeKind::Container {
                kind: ContainerKind::Cell,
            }) => {
                cell.get_or_insert(child);
            }
            _ => {}
        }
    }
    block.map(Container::Block).or(cell.map(Container::Cell))
}

/// Runs attributable to exactly this placeholder: descendant runs whose nearest enclosing
/// placeholder is `placeholder` itself. Runs of nested placeholders are excluded.
pub fn owned_runs(tree: &DocTree, placeholder: NodeId) -> Vec<NodeId> {
    owned_runs_under(tree, placeholder, placeholder)
}

/// Like [`owned_runs`], but the search is restricted to runs below `scope`.
pub fn owned_runs_under(tree: &DocTree, scope: NodeId, placeholder: NodeId) -> Vec<NodeId> {
    tree.descendants(scope)
        .into_iter()
        .filter(|&d| tree.kind(d).is_some_and(NodeKind::is_run))
        .filter(|&d| nearest_enclosing_placeholder(tree, d) == Some(placeholder))
        .collect()
}

/// Direct paragraph children of `node`.
pub fn paragraphs(tree: &DocTree, node: NodeId) -> Vec<NodeId> {
    tree.children(node)
        .iter()
        .copied()
        .filter(|&c| tree.kind(c).is_some_and(NodeKind::is_paragraph))
        .collect()
}

/// Number of cells in the row holding `cell`.
pub fn row_cell_count(tree: &DocTree, cell: NodeId) -> Option<usize> {
    let row = tree
        .ancestors(cell)
        .find(|&a| matches!(tree.kind(a), Some(NodeKind::TableRow)))?;
    Some(
        tree.descendants(row)
            .into_iter()
            .filter(|&d| tree.kind(d).is_some_and(NodeKind::is_cell))
            .filter(|&d| enclosing_cell(tree, d).is_none_or(|outer| !is_below(tree, outer, row)))
            .count(),
    )
}

fn is_below(tree: &DocTree, node: NodeId, root: NodeId) -> bool {
    tree.ancestors(node).any(|a| a == root)
}
