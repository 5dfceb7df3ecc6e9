use crate::annotations::AnnotationStore;
use crate::error::{TreeError, TreeResult};
use crate::node::{ContainerKind, NodeId, NodeKind, PlaceholderProps, RunStyle};
use docufill_types::Scope;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Node {
    kind: NodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<NodeId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeId>,
}

/// An open document: one body, any number of headers and footers, and at most one annotation
/// store shared by all of them.
///
/// Nodes live in an arena. Removing a node tombstones its whole subtree; later lookups of those
/// ids report [`TreeError::NodeNotFound`] (or empty results from the infallible queries).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTree {
    nodes: Vec<Option<Node>>,
    body: NodeId,

    #[serde(default)]
    headers: Vec<NodeId>,

    #[serde(default)]
    footers: Vec<NodeId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotations: Option<AnnotationStore>,
}

impl Default for DocTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocTree {
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            body: NodeId(0),
            headers: Vec::new(),
            footers: Vec::new(),
            annotations: None,
        };
        tree.body = tree.alloc(NodeKind::Body);
        tree
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn headers(&self) -> &[NodeId] {
        &self.headers
    }

    pub fn footers(&self) -> &[NodeId] {
        &self.footers
    }

    pub fn add_header(&mut self) -> NodeId {
        let id = self.alloc(NodeKind::Header);
        self.headers.push(id);
        id
    }

    pub fn add_footer(&mut self) -> NodeId {
        let id = self.alloc(NodeKind::Footer);
        self.footers.push(id);
        id
    }

    /// Scope roots in processing order: body, then headers, then footers.
    pub fn scope_roots(&self) -> Vec<(Scope, NodeId)> {
        let mut roots = vec![(Scope::Body, self.body)];
        roots.extend(self.headers.iter().map(|&h| (Scope::Header, h)));
        roots.extend(self.footers.iter().map(|&f| (Scope::Footer, f)));
        roots
    }

    /// Checks that every scope root is alive and of the right kind.
    pub fn validate(&self) -> TreeResult<()> {
        for (scope, root) in self.scope_roots() {
            let expected = match scope {
                Scope::Body => NodeKind::Body,
                Scope::Header => NodeKind::Header,
                Scope::Footer => NodeKind::Footer,
            };
            match self.node(root) {
                None => {
                    return Err(TreeError::InvalidRoot {
                        scope,
                        reason: format!("root {root} does not exist"),
                    });
                }
                Some(node) if node.kind != expected => {
                    return Err(TreeError::InvalidRoot {
                        scope,
                        reason: format!("root {root} is a {}", node.kind.name()),
                    });
                }
                Some(node) if node.parent.is_some() => {
                    return Err(TreeError::InvalidRoot {
                        scope,
                        reason: format!("root {root} is attached to another node"),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Scope of the root this node hangs from, if it is attached to one.
    pub fn scope_of(&self, id: NodeId) -> Option<Scope> {
        if !self.contains(id) {
            return None;
        }
        let root = self.ancestors(id).last().unwrap_or(id);
        self.scope_roots()
            .into_iter()
            .find(|(_, r)| *r == root)
            .map(|(scope, _)| scope)
    }

    // ---- annotation store ------------------------------------------------

    pub fn annotations(&self) -> Option<&AnnotationStore> {
        self.annotations.as_ref()
    }

    pub fn annotations_mut(&mut self) -> Option<&mut AnnotationStore> {
        self.annotations.as_mut()
    }

    /// Returns the store, creating an empty one if the document has none yet.
    pub fn annotations_or_default(&mut self) -> &mut AnnotationStore {
        self.annotations.get_or_insert_with(AnnotationStore::default)
    }

    /// Deletes the store entirely, returning what it held.
    pub fn take_annotations(&mut self) -> Option<AnnotationStore> {
        self.annotations.take()
    }

    // ---- queries ---------------------------------------------------------

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn require(&self, id: NodeId) -> TreeResult<&Node> {
        self.node(id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.node_mut(id).map(|n| &mut n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Direct children in document order; empty for removed ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Ancestors from the parent upwards, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// All descendants in pre-order (document order), excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        idx.checked_sub(1).map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        self.children(parent).get(idx + 1).copied()
    }

    /// Concatenated text of every text node under `id` (breaks contribute nothing).
    pub fn text_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Text { value }) = self.kind(id) {
            out.push_str(value);
        }
        for d in self.descendants(id) {
            if let Some(NodeKind::Text { value }) = self.kind(d) {
                out.push_str(value);
            }
        }
        out
    }

    /// Human-visible text of a subtree: paragraphs end with a newline, breaks become newlines.
    pub fn visible_text(&self, root: NodeId) -> String {
        let mut out = String::new();
        self.push_visible(root, &mut out);
        out
    }

    fn push_visible(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text { value }) => out.push_str(value),
            Some(NodeKind::Break) => out.push('\n'),
            Some(NodeKind::Paragraph) => {
                for &c in self.children(id) {
                    self.push_visible(c, out);
                }
                out.push('\n');
            }
            Some(_) => {
                for &c in self.children(id) {
                    self.push_visible(c, out);
                }
            }
            None => {}
        }
    }

    /// Every live node id, in allocation order.
    pub fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(i, _)| NodeId(i))
    }

    // ---- mutation --------------------------------------------------------

    /// Allocates a detached node.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            kind,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    pub fn append_child(&mut self, parent: NodeId, kind: NodeKind) -> TreeResult<NodeId> {
        self.require(parent)?;
        let id = self.alloc(kind);
        self.link(parent, None, id);
        Ok(id)
    }

    pub fn insert_before(&mut self, anchor: NodeId, kind: NodeKind) -> TreeResult<NodeId> {
        let (parent, idx) = self.position(anchor)?;
        let id = self.alloc(kind);
        self.link(parent, Some(idx), id);
        Ok(id)
    }

    pub fn insert_after(&mut self, anchor: NodeId, kind: NodeKind) -> TreeResult<NodeId> {
        let (parent, idx) = self.position(anchor)?;
        let id = self.alloc(kind);
        self.link(parent, Some(idx + 1), id);
        Ok(id)
    }

    /// Moves an existing node (and its subtree) to sit right before `anchor`.
    pub fn move_before(&mut self, anchor: NodeId, node: NodeId) -> TreeResult<()> {
        self.require(node)?;
        let (parent, _) = self.position(anchor)?;
        self.check_cycle(parent, node)?;
        self.detach(node)?;
        let (parent, idx) = self.position(anchor)?;
        self.link(parent, Some(idx), node);
        Ok(())
    }

    /// Moves an existing node (and its subtree) to the end of `parent`'s children.
    pub fn move_to_end(&mut self, parent: NodeId, node: NodeId) -> TreeResult<()> {
        self.require(node)?;
        self.require(parent)?;
        self.check_cycle(parent, node)?;
        self.detach(node)?;
        self.link(parent, None, node);
        Ok(())
    }

    /// Unlinks a node from its parent. The subtree stays alive so it can be re-attached.
    pub fn detach(&mut self, id: NodeId) -> TreeResult<()> {
        let parent = self.require(id)?.parent;
        if let Some(parent) = parent {
            if let Some(p) = self.node_mut(parent) {
                p.children.retain(|&c| c != id);
            }
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
        Ok(())
    }

    /// Unlinks a node and tombstones its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> TreeResult<()> {
        self.detach(id)?;
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for d in doomed {
            if let Some(slot) = self.nodes.get_mut(d.0) {
                *slot = None;
            }
        }
        Ok(())
    }

    /// Removes every child of `id`, keeping `id` itself.
    pub fn clear_children(&mut self, id: NodeId) -> TreeResult<()> {
        let children = self.require(id)?.children.clone();
        for c in children {
            self.remove(c)?;
        }
        Ok(())
    }

    fn position(&self, anchor: NodeId) -> TreeResult<(NodeId, usize)> {
        let node = self.require(anchor)?;
        let parent = node.parent.ok_or(TreeError::NoParent(anchor))?;
        let idx = self
            .index_in_parent(anchor)
            .ok_or(TreeError::NoParent(anchor))?;
        Ok((parent, idx))
    }

    fn check_cycle(&self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(TreeError::Cycle { parent, child });
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeId, at: Option<usize>, child: NodeId) {
        if let Some(p) = self.node_mut(parent) {
            match at {
                Some(idx) if idx <= p.children.len() => p.children.insert(idx, child),
                _ => p.children.push(child),
            }
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
    }

    // ---- builders --------------------------------------------------------

    pub fn add_paragraph(&mut self, parent: NodeId) -> TreeResult<NodeId> {
        self.append_child(parent, NodeKind::Paragraph)
    }

    /// Appends a run holding one text node.
    pub fn add_run(
        &mut self,
        parent: NodeId,
        text: &str,
        style: Option<RunStyle>,
    ) -> TreeResult<NodeId> {
        let run = self.append_child(parent, NodeKind::styled_run(style))?;
        self.append_child(run, NodeKind::text(text))?;
        Ok(run)
    }

    /// Appends a paragraph holding a single unstyled run.
    pub fn add_text_paragraph(&mut self, parent: NodeId, text: &str) -> TreeResult<NodeId> {
        let para = self.add_paragraph(parent)?;
        self.add_run(para, text, None)?;
        Ok(para)
    }

    pub fn add_table(&mut self, parent: NodeId) -> TreeResult<NodeId> {
        self.append_child(parent, NodeKind::Table)
    }

    pub fn add_row(&mut self, table: NodeId) -> TreeResult<NodeId> {
        self.append_child(table, NodeKind::TableRow)
    }

    pub fn add_cell(&mut self, row: NodeId) -> TreeResult<NodeId> {
        self.append_child(row, NodeKind::TableCell)
    }

    /// Appends a placeholder and its content container. Returns `(placeholder, container)`.
    pub fn add_placeholder(
        &mut self,
        parent: NodeId,
        props: PlaceholderProps,
        container: ContainerKind,
    ) -> TreeResult<(NodeId, NodeId)> {
        let ph = self.append_child(parent, NodeKind::Placeholder(props))?;
        let content = self.append_child(ph, NodeKind::container(container))?;
        Ok((ph, content))
    }
}

pub struct Ancestors<'a> {
    tree: &'a DocTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docufill_types::StructuralKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn descendants_are_pre_order() {
        let mut tree = DocTree::new();
        let body = tree.body();
        let p1 = tree.add_paragraph(body).unwrap();
        let r1 = tree.add_run(p1, "a", None).unwrap();
        let p2 = tree.add_paragraph(body).unwrap();

        let d = tree.descendants(body);
        assert_eq!(d[0], p1);
        assert_eq!(d[1], r1);
        assert_eq!(*d.last().unwrap(), p2);
    }

    #[test]
    fn remove_tombstones_subtree() {
        let mut tree = DocTree::new();
        let p = tree.add_paragraph(tree.body()).unwrap();
        let r = tree.add_run(p, "x", None).unwrap();
        let t = tree.children(r)[0];

        tree.remove(p).unwrap();
        assert!(!tree.contains(p));
        assert!(!tree.contains(r));
        assert!(!tree.contains(t));
        assert!(tree.children(tree.body()).is_empty());
        assert_eq!(tree.remove(p), Err(TreeError::NodeNotFound(p)));
    }

    #[test]
    fn insert_before_and_after_keep_order() {
        let mut tree = DocTree::new();
        let body = tree.body();
        let mid = tree.add_paragraph(body).unwrap();
        let before = tree.insert_before(mid, NodeKind::Paragraph).unwrap();
        let after = tree.insert_after(mid, NodeKind::Paragraph).unwrap();

        assert_eq!(tree.children(body), &[before, mid, after]);
        assert_eq!(tree.prev_sibling(mid), Some(before));
        assert_eq!(tree.next_sibling(mid), Some(after));
        assert_eq!(tree.next_sibling(after), None);
    }

    #[test]
    fn insert_next_to_root_fails() {
        let mut tree = DocTree::new();
        let body = tree.body();
        assert_eq!(
            tree.insert_before(body, NodeKind::Paragraph),
            Err(TreeError::NoParent(body))
        );
    }

    #[test]
    fn move_before_rejects_cycles() {
        let mut tree = DocTree::new();
        let body = tree.body();
        let outer = tree.add_paragraph(body).unwrap();
        let inner = tree.add_run(outer, "x", None).unwrap();

        let err = tree.move_before(inner, outer).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
        assert_eq!(tree.parent(inner), Some(outer));
    }

    #[test]
    fn visible_text_joins_paragraphs_and_breaks() {
        let mut tree = DocTree::new();
        let body = tree.body();
        let p = tree.add_paragraph(body).unwrap();
        tree.add_run(p, "one", None).unwrap();
        let br = tree.append_child(p, NodeKind::run()).unwrap();
        tree.append_child(br, NodeKind::Break).unwrap();
        tree.add_run(p, "two", None).unwrap();
        tree.add_text_paragraph(body, "three").unwrap();

        assert_eq!(tree.visible_text(body), "one\ntwo\nthree\n");
        assert_eq!(tree.text_of(p), "onetwo");
    }

    #[test]
    fn scope_of_follows_roots() {
        let mut tree = DocTree::new();
        let header = tree.add_header();
        let (ph, _) = tree
            .add_placeholder(
                header,
                PlaceholderProps::new("t", StructuralKind::Block),
                ContainerKind::Block,
            )
            .unwrap();
        assert_eq!(tree.scope_of(ph), Some(Scope::Header));

        let loose = tree.alloc(NodeKind::Paragraph);
        assert_eq!(tree.scope_of(loose), None);
    }

    #[test]
    fn validate_rejects_wrong_root_kind() {
        let mut tree = DocTree::new();
        let body = tree.body();
        *tree.kind_mut(body).unwrap() = NodeKind::Paragraph;
        assert!(matches!(
            tree.validate(),
            Err(TreeError::InvalidRoot {
                scope: Scope::Body,
                ..
            })
        ));
    }
}
