//! Replacement engine: classify a placeholder's structural context, then fill it.
//!
//! Every strategy keeps these guarantees:
//! - the placeholder's container kind never changes
//! - table cells are never added or removed
//! - a block container keeps at least one paragraph
//! - only runs owned by this placeholder are touched

use crate::error::PlaceholderError;
use crate::render::{render_value, RenderedRun, RunContent};
use docufill_tree::navigate::{
    contains_cell, enclosing_cell, enclosing_paragraph, find_container, first_cell_descendant,
    is_within_cell, owned_runs_under, paragraphs, Container,
};
use docufill_tree::{
    DocTree, NodeId, NodeKind, PlaceholderNode, RunStyle, TreeError, TreeResult,
};
use docufill_types::FillValue;
use tracing::{debug, warn};

/// Mutation strategy, chosen once per placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The placeholder wraps a table cell and is not itself inside one.
    WrappedCell,
    InCellBlock,
    InCellInline,
    Standard,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::WrappedCell => "wrapped_cell",
            Strategy::InCellBlock => "in_cell_block",
            Strategy::InCellInline => "in_cell_inline",
            Strategy::Standard => "standard",
        }
    }
}

/// Classification in priority order: wraps-cell, in-cell block, in-cell inline, standard.
pub fn classify(tree: &DocTree, placeholder: NodeId, container: Container) -> Strategy {
    let within = is_within_cell(tree, placeholder);
    if contains_cell(tree, placeholder) && !within {
        return Strategy::WrappedCell;
    }
    if !within {
        return Strategy::Standard;
    }
    match container {
        Container::Block(_) => Strategy::InCellBlock,
        Container::Inline(_) => Strategy::InCellInline,
        Container::Cell(_) => Strategy::Standard,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Strategy that actually ran (a wrapped-cell fallback reports `Standard`).
    pub strategy: Strategy,

    /// Runs written, in document order. Empty when the value cleared all content.
    pub runs: Vec<NodeId>,

    pub warnings: Vec<String>,
}

/// Replaces a placeholder's content with `value`.
///
/// A missing container is a recoverable lookup failure and leaves the tree untouched. A tree
/// error part-way through is reported as a mutation failure for this placeholder only.
pub fn replace(
    tree: &mut DocTree,
    placeholder: &PlaceholderNode,
    value: &FillValue,
    highlight: Option<&str>,
) -> Result<Replacement, PlaceholderError> {
    let container =
        find_container(tree, placeholder.id).ok_or_else(|| PlaceholderError::StructuralLookup {
            tag: placeholder.tag.clone(),
            message: "no content container".to_string(),
        })?;

    let strategy = classify(tree, placeholder.id, container);
    debug!(
        tag = %placeholder.tag,
        scope = %placeholder.scope,
        strategy = strategy.name(),
        "replacing placeholder"
    );

    let fill = Fill {
        placeholder: placeholder.id,
        value,
        highlight,
    };

    let result = match strategy {
        Strategy::Standard => fill.standard(tree, container, placeholder.id),
        Strategy::InCellInline => {
            let cell = enclosing_cell(tree, placeholder.id).unwrap_or(placeholder.id);
            fill.standard(tree, container, cell)
        }
        Strategy::InCellBlock => {
            let cell = enclosing_cell(tree, placeholder.id).unwrap_or(placeholder.id);
            fill.in_cell_block(tree, container.id(), cell)
        }
        Strategy::WrappedCell => fill.wrapped_cell(tree, container, &placeholder.tag),
    };

    result.map_err(|source| PlaceholderError::Mutation {
        tag: placeholder.tag.clone(),
        scope: placeholder.scope,
        source,
    })
}

struct Fill<'a> {
    placeholder: NodeId,
    value: &'a FillValue,
    highlight: Option<&'a str>,
}

impl Fill<'_> {
    /// Reuse the first owned run under `search_root`, delete the others; or create a target.
    fn standard(
        &self,
        tree: &mut DocTree,
        container: Container,
        search_root: NodeId,
    ) -> TreeResult<Replacement> {
        let own = owned_runs_under(tree, search_root, self.placeholder);
        let base = self.base_style(tree, &own);

        let target = match own.split_first() {
            Some((&first, rest)) => {
                self.remove_runs(tree, rest, first, true)?;
                first
            }
            None => create_target(tree, container)?,
        };

        let runs = self.write(tree, target, base.as_ref())?;
        Ok(Replacement {
            strategy: Strategy::Standard,
            runs,
            warnings: vec![],
        })
    }

    /// Like standard, but never removes a paragraph: siblings in a shared block keep theirs.
    fn in_cell_block(
        &self,
        tree: &mut DocTree,
        block: NodeId,
        cell: NodeId,
    ) -> TreeResult<Replacement> {
        let first_para = match paragraphs(tree, block).first() {
            Some(&p) => p,
            None => tree.add_paragraph(block)?,
        };

        let own = owned_runs_under(tree, cell, self.placeholder);
        let base = self.base_style(tree, &own);

        let target = match own.split_first() {
            Some((&first, rest)) => {
                self.remove_runs(tree, rest, first, false)?;
                first
            }
            None => tree.append_child(first_para, NodeKind::run())?,
        };

        let runs = self.write(tree, target, base.as_ref())?;
        Ok(Replacement {
            strategy: Strategy::InCellBlock,
            runs,
            warnings: vec![],
        })
    }

    /// Fill the first nested cell in place.
    ///
    /// When the wrapper's cell container directly holds that cell, the container's children are
    /// promoted to the wrapper's position and the wrapper is deleted. Any other wrapper (a block
    /// around a whole table, say) stays, so every cell it holds survives.
    fn wrapped_cell(
        &self,
        tree: &mut DocTree,
        container: Container,
        tag: &str,
    ) -> TreeResult<Replacement> {
        let Some(cell) = first_cell_descendant(tree, self.placeholder) else {
            warn!(tag, "no nested cell in cell wrapper, falling back to standard");
            let mut replacement = self.standard(tree, container, self.placeholder)?;
            replacement
                .warnings
                .push(format!("placeholder '{tag}' wraps no cell; filled as standard"));
            return Ok(replacement);
        };

        let own = owned_runs_under(tree, cell, self.placeholder);
        let base = self.base_style(tree, &own);

        let target = match own.split_first() {
            Some((&first, rest)) => {
                self.remove_runs(tree, rest, first, true)?;
                first
            }
            None => {
                let para = match paragraphs(tree, cell).first() {
                    Some(&p) => p,
                    None => tree.add_paragraph(cell)?,
                };
                tree.append_child(para, NodeKind::run())?
            }
        };

        let runs = self.write(tree, target, base.as_ref())?;

        match container {
            Container::Cell(c) if tree.parent(cell) == Some(c) => {
                let children: Vec<NodeId> = tree.children(c).to_vec();
                for child in children {
                    tree.move_before(self.placeholder, child)?;
                }
                tree.remove(self.placeholder)?;
            }
            _ => debug!(tag, "wrapper is not a direct cell container, keeping it"),
        }

        Ok(Replacement {
            strategy: Strategy::WrappedCell,
            runs,
            warnings: vec![],
        })
    }

    /// Plain strings inherit the target run's own style. Formatted values inherit from the
    /// first owned run that has explicit formatting.
    fn base_style(&self, tree: &DocTree, own: &[NodeId]) -> Option<RunStyle> {
        match self.value {
            FillValue::Plain(_) => own.first().and_then(|&r| run_style(tree, r)),
            FillValue::Formatted(_) => own.iter().find_map(|&r| run_style(tree, r)),
        }
    }

    /// Deletes `runs`. With `prune`, paragraphs inside this placeholder that the deletion left
    /// empty go too, unless they hold `keep` or are the last paragraph of their parent.
    fn remove_runs(
        &self,
        tree: &mut DocTree,
        runs: &[NodeId],
        keep: NodeId,
        prune: bool,
    ) -> TreeResult<()> {
        let keep_para = enclosing_paragraph(tree, keep);
        for &run in runs {
            if !tree.contains(run) {
                continue;
            }
            let para = enclosing_paragraph(tree, run);
            tree.remove(run)?;

            let Some(para) = para.filter(|_| prune) else {
                continue;
            };
            if Some(para) == keep_para || !tree.children(para).is_empty() {
                continue;
            }
            if !tree.ancestors(para).any(|a| a == self.placeholder) {
                continue;
            }
            let has_sibling = tree
                .parent(para)
                .is_some_and(|parent| paragraphs(tree, parent).len() > 1);
            if has_sibling {
                tree.remove(para)?;
            }
        }
        Ok(())
    }

    fn write(
        &self,
        tree: &mut DocTree,
        target: NodeId,
        base: Option<&RunStyle>,
    ) -> TreeResult<Vec<NodeId>> {
        let mut rendered = render_value(self.value, base);
        if let Some(color) = self.highlight {
            for run in rendered.iter_mut().filter(|r| !r.is_break()) {
                run.style.get_or_insert_with(RunStyle::default).color = Some(color.to_string());
            }
        }
        materialize(tree, target, &rendered)
    }
}

fn run_style(tree: &DocTree, run: NodeId) -> Option<RunStyle> {
    match tree.kind(run) {
        Some(NodeKind::Run { style }) => style.clone(),
        _ => None,
    }
}

fn create_target(tree: &mut DocTree, container: Container) -> TreeResult<NodeId> {
    match container {
        Container::Inline(c) => tree.append_child(c, NodeKind::run()),
        Container::Block(c) | Container::Cell(c) => {
            let para = tree.add_paragraph(c)?;
            tree.append_child(para, NodeKind::run())
        }
    }
}

/// Writes rendered runs into the tree. The first one goes into `target`, the rest follow it as
/// siblings. No rendered runs means the target itself is removed.
fn materialize(
    tree: &mut DocTree,
    target: NodeId,
    rendered: &[RenderedRun],
) -> TreeResult<Vec<NodeId>> {
    let Some((first, rest)) = rendered.split_first() else {
        tree.remove(target)?;
        return Ok(vec![]);
    };

    write_run(tree, target, first)?;
    let mut written = vec![target];
    let mut anchor = target;
    for run in rest {
        let id = tree.insert_after(anchor, NodeKind::styled_run(None))?;
        write_run(tree, id, run)?;
        written.push(id);
        anchor = id;
    }
    Ok(written)
}

fn write_run(tree: &mut DocTree, run: NodeId, rendered: &RenderedRun) -> TreeResult<()> {
    match tree.kind_mut(run) {
        Some(NodeKind::Run { style }) => *style = rendered.style.clone(),
        Some(_) => {
            return Err(TreeError::WrongKind {
                node: run,
                expected: "run",
            });
        }
        None => return Err(TreeError::NodeNotFound(run)),
    }
    tree.clear_children(run)?;
    for content in &rendered.content {
        let kind = match content {
            RunContent::Text(text) => NodeKind::text(text.as_str()),
            RunContent::Break => NodeKind::Break,
        };
        tree.append_child(run, kind)?;
    }
    Ok(())
}
