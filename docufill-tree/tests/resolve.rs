use docufill_tree::resolve::{find_all, find_all_in_document, list_placeholders, read_tag};
use docufill_tree::{ContainerKind, DocTree, NodeKind, PlaceholderProps};
use docufill_types::{Scope, StructuralKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn sample() -> DocTree {
    let mut tree = DocTree::new();
    let body = tree.body();
    let header = tree.add_header();
    let footer = tree.add_footer();

    let para = tree.add_paragraph(body).unwrap();
    let (_, c) = tree
        .add_placeholder(
            para,
            PlaceholderProps::new("name", StructuralKind::Inline).with_title("Name"),
            ContainerKind::Inline,
        )
        .unwrap();
    tree.add_run(c, "old", None).unwrap();

    tree.add_placeholder(
        body,
        PlaceholderProps::untagged(StructuralKind::Block),
        ContainerKind::Block,
    )
    .unwrap();

    tree.add_placeholder(
        footer,
        PlaceholderProps::new("page", StructuralKind::Block),
        ContainerKind::Block,
    )
    .unwrap();
    tree.add_placeholder(
        header,
        PlaceholderProps::new("  title  ", StructuralKind::Block),
        ContainerKind::Block,
    )
    .unwrap();
    tree
}

#[test]
fn find_all_skips_untagged_placeholders() {
    let tree = sample();
    let found = find_all(&tree, tree.body(), Scope::Body);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].tag, "name");
    assert_eq!(found[0].title.as_deref(), Some("Name"));
    assert_eq!(found[0].kind, StructuralKind::Inline);
}

#[test]
fn document_order_is_body_headers_footers() {
    let tree = sample();
    let scopes: Vec<_> = find_all_in_document(&tree)
        .into_iter()
        .map(|p| (p.scope, p.tag))
        .collect();
    assert_eq!(
        scopes,
        vec![
            (Scope::Body, "name".to_string()),
            (Scope::Header, "title".to_string()),
            (Scope::Footer, "page".to_string()),
        ]
    );
}

#[test]
fn listing_carries_titles() {
    let tree = sample();
    let listing = list_placeholders(&tree);
    assert_eq!(listing.len(), 3);
    assert_eq!(listing[0].title.as_deref(), Some("Name"));
    assert_eq!(listing[2].title, None);
}

#[test]
fn read_tag_of_non_placeholder_is_empty() {
    let tree = sample();
    assert_eq!(read_tag(&tree, tree.body()), "");
}

#[test]
fn snapshot_round_trips_through_json() {
    let mut tree = sample();
    let doomed = tree.add_text_paragraph(tree.body(), "gone").unwrap();
    tree.remove(doomed).unwrap();

    let json = serde_json::to_string(&tree).expect("serialize");
    let back: DocTree = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, tree);
    assert!(back.validate().is_ok());
    assert!(!back.contains(doomed));
}

proptest! {
    /// Every appended paragraph shows up exactly once among the body's descendants.
    #[test]
    fn descendants_cover_every_appended_node(texts in prop::collection::vec("[a-z]{0,5}", 0..12)) {
        let mut tree = DocTree::new();
        let body = tree.body();
        for t in &texts {
            tree.add_text_paragraph(body, t).unwrap();
        }
        let paragraphs = tree
            .descendants(body)
            .into_iter()
            .filter(|&d| matches!(tree.kind(d), Some(NodeKind::Paragraph)))
            .count();
        prop_assert_eq!(paragraphs, texts.len());

        let expected: String = texts.iter().map(|t| format!("{t}\n")).collect();
        prop_assert_eq!(tree.visible_text(body), expected);
    }
}
