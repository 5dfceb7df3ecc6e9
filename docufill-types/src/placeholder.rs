use serde::{Deserialize, Serialize};
use std::fmt;

/// Document region a placeholder lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Body,
    Header,
    Footer,
}

impl Scope {
    pub fn label(self) -> &'static str {
        match self {
            Scope::Body => "body",
            Scope::Header => "header",
            Scope::Footer => "footer",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declared structural kind of a placeholder.
///
/// - inline: holds runs inside a paragraph
/// - block: holds paragraphs (and possibly tables)
/// - cell: wraps a single table cell inside a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralKind {
    Inline,
    Block,
    Cell,
}

impl StructuralKind {
    pub fn label(self) -> &'static str {
        match self {
            StructuralKind::Inline => "inline",
            StructuralKind::Block => "block",
            StructuralKind::Cell => "cell",
        }
    }
}

impl fmt::Display for StructuralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Listing entry for a tagged placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderInfo {
    pub tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub scope: Scope,
    pub kind: StructuralKind,
}
