use docufill_types::StructuralKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Vertical text position (the script property of a run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalPosition {
    Superscript,
    Subscript,
}

/// Explicit run formatting. A run with `style: None` inherits everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_half_points: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<VerticalPosition>,
}

/// Content holder kind directly owned by a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Inline,
    Block,
    Cell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub kind: StructuralKind,
}

impl PlaceholderProps {
    pub fn new(tag: impl Into<String>, kind: StructuralKind) -> Self {
        Self {
            tag: Some(tag.into()),
            title: None,
            kind,
        }
    }

    pub fn untagged(kind: StructuralKind) -> Self {
        Self {
            tag: None,
            title: None,
            kind,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Node payload. Closed set: every structural decision matches on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Body,
    Header,
    Footer,
    Paragraph,
    Run {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<RunStyle>,
    },
    Text {
        value: String,
    },
    Break,
    Table,
    TableRow,
    TableCell,
    Placeholder(PlaceholderProps),
    Container {
        kind: ContainerKind,
    },
    AnnotationStart {
        id: String,
    },
    AnnotationEnd {
        id: String,
    },
    AnnotationReference {
        id: String,
    },
}

impl NodeKind {
    pub fn run() -> Self {
        NodeKind::Run { style: None }
    }

    pub fn styled_run(style: Option<RunStyle>) -> Self {
        NodeKind::Run { style }
    }

    pub fn text(value: impl Into<String>) -> Self {
        NodeKind::Text {
            value: value.into(),
        }
    }

    pub fn container(kind: ContainerKind) -> Self {
        NodeKind::Container { kind }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Body => "body",
            NodeKind::Header => "header",
            NodeKind::Footer => "footer",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Run { .. } => "run",
            NodeKind::Text { .. } => "text",
            NodeKind::Break => "break",
            NodeKind::Table => "table",
            NodeKind::TableRow => "table row",
            NodeKind::TableCell => "table cell",
            NodeKind::Placeholder(_) => "placeholder",
            NodeKind::Container { .. } => "container",
            NodeKind::AnnotationStart { .. } => "annotation start",
            NodeKind::AnnotationEnd { .. } => "annotation end",
            NodeKind::AnnotationReference { .. } => "annotation reference",
        }
    }

    pub fn is_run(&self) -> bool {
        matches!(self, NodeKind::Run { .. })
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self, NodeKind::Paragraph)
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, NodeKind::TableCell)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, NodeKind::Placeholder(_))
    }

    /// Id carried by an annotation marker, if this is one.
    pub fn annotation_marker_id(&self) -> Option<&str> {
        match self {
            NodeKind::AnnotationStart { id }
            | NodeKind::AnnotationEnd { id }
            | NodeKind::AnnotationReference { id } => Some(id),
            _ => None,
        }
    }
}
