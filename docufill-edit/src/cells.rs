use docufill_tree::navigate::{nearest_enclosing_placeholder, paragraphs};
use docufill_tree::{DocTree, NodeId, NodeKind, TreeResult};
use tracing::debug;

/// Merges extra direct paragraphs of placeholder-bearing cells into the first one.
///
/// A cell qualifies when it sits inside a placeholder or has one among its descendants. A break
/// run separates two merged paragraphs only when both carry content. Paragraphs nested in block containers are not
/// direct children of the cell, so they are left alone. Returns the number of cells changed.
pub fn merge_cell_paragraphs(tree: &mut DocTree) -> TreeResult<u64> {
    let mut cells = Vec::new();
    for (_, root) in tree.scope_roots() {
        cells.extend(
            tree.descendants(root)
                .into_iter()
                .filter(|&d| tree.kind(d).is_some_and(NodeKind::is_cell)),
        );
    }

    let mut merged = 0;
    for cell in cells {
        if !tree.contains(cell) || !involves_placeholder(tree, cell) {
            continue;
        }
        let paras = paragraphs(tree, cell);
        let Some((&first, rest)) = paras.split_first() else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        for &para in rest {
            if has_content(tree, first) && has_content(tree, para) {
                let br = tree.append_child(first, NodeKind::run())?;
                tree.append_child(br, NodeKind::Break)?;
            }
            let children: Vec<NodeId> = tree.children(para).to_vec();
            for child in children {
                tree.move_to_end(first, child)?;
            }
            tree.remove(para)?;
        }
        debug!(cell = %cell, paragraphs = paras.len(), "merged cell paragraphs");
        merged += 1;
    }
    Ok(merged)
}

/// Non-empty text or a break anywhere below `para`.
fn has_content(tree: &DocTree, para: NodeId) -> bool {
    tree.descendants(para).into_iter().any(|d| match tree.kind(d) {
        Some(NodeKind::Text { value }) => !value.is_empty(),
        Some(NodeKind::Break) => true,
        _ => false,
    })
}

fn involves_placeholder(tree: &DocTree, cell: NodeId) -> bool {
    nearest_enclosing_placeholder(tree, cell).is_some()
        || tree
            .descendants(cell)
            .into_iter()
            .any(|d| tree.kind(d).is_some_and(NodeKind::is_placeholder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docufill_tree::{ContainerKind, PlaceholderProps};
    use docufill_types::StructuralKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn merges_direct_paragraphs_with_breaks() {
        let mut tree = DocTree::new();
        let table = tree.add_table(tree.body()).unwrap();
        let row = tree.add_row(table).unwrap();
        let cell = tree.add_cell(row).unwrap();
        let first = tree.add_paragraph(cell).unwrap();
        let (_, c) = tree
            .add_placeholder(
                first,
                PlaceholderProps::new("x", StructuralKind::Inline),
                ContainerKind::Inline,
            )
            .unwrap();
        tree.add_run(c, "a", None).unwrap();
        tree.add_text_paragraph(cell, "b").unwrap();

        assert_eq!(merge_cell_paragraphs(&mut tree).unwrap(), 1);
        assert_eq!(paragraphs(&tree, cell), vec![first]);
        assert_eq!(tree.visible_text(cell), "a\nb\n");
    }

    #[test]
    fn empty_paragraphs_merge_without_breaks() {
        let mut tree = DocTree::new();
        let table = tree.add_table(tree.body()).unwrap();
        let row = tree.add_row(table).unwrap();
        let cell = tree.add_cell(row).unwrap();
        let first = tree.add_paragraph(cell).unwrap();
        let (ph, c) = tree
            .add_placeholder(
                first,
                PlaceholderProps::new("x", StructuralKind::Inline),
                ContainerKind::Inline,
            )
            .unwrap();
        tree.add_run(c, "", None).unwrap();
        tree.add_text_paragraph(cell, "b").unwrap();
        tree.add_paragraph(cell).unwrap();

        assert_eq!(merge_cell_paragraphs(&mut tree).unwrap(), 1);
        assert_eq!(paragraphs(&tree, cell), vec![first]);
        assert!(tree.contains(ph));
        assert_eq!(tree.visible_text(cell), "b\n");
    }

    #[test]
    fn leaves_cells_without_placeholders_alone() {
        let mut tree = DocTree::new();
        let table = tree.add_table(tree.body()).unwrap();
        let row = tree.add_row(table).unwrap();
        let cell = tree.add_cell(row).unwrap();
        tree.add_text_paragraph(cell, "a").unwrap();
        tree.add_text_paragraph(cell, "b").unwrap();

        assert_eq!(merge_cell_paragraphs(&mut tree).unwrap(), 0);
        assert_eq!(paragraphs(&tree, cell).len(), 2);
    }

    #[test]
    fn block_container_paragraphs_are_not_direct() {
        let mut tree = DocTree::new();
        let table = tree.add_table(tree.body()).unwrap();
        let row = tree.add_row(table).unwrap();
        let cell = tree.add_cell(row).unwrap();
        let (_, block) = tree
            .add_placeholder(
                cell,
                PlaceholderProps::new("x", StructuralKind::Block),
                ContainerKind::Block,
            )
            .unwrap();
        tree.add_text_paragraph(block, "a").unwrap();
        tree.add_text_paragraph(block, "b").unwrap();

        assert_eq!(merge_cell_paragraphs(&mut tree).unwrap(), 0);
        assert_eq!(paragraphs(&tree, block).len(), 2);
    }
}
