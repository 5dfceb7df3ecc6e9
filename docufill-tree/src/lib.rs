//! In-memory document tree for docufill.
//!
//! This crate owns the *shape* of an open document: an arena of typed nodes rooted at one body,
//! any number of headers and footers, and the per-document annotation store. It also answers
//! structural questions about that shape ([`navigate`]) and enumerates placeholders
//! ([`resolve`]). It does not decide *how* placeholders are filled; that's the `docufill-edit`
//! crate.
//!
//! Navigation queries are recomputed on every call. The tree mutates while placeholders are being
//! processed, so nothing here caches structural answers.

mod annotations;
mod error;
pub mod navigate;
mod node;
pub mod resolve;
mod tree;

pub use annotations::{Annotation, AnnotationStore};
pub use error::{TreeError, TreeResult};
pub use navigate::Container;
pub use node::{ContainerKind, NodeId, NodeKind, PlaceholderProps, RunStyle, VerticalPosition};
pub use resolve::PlaceholderNode;
pub use tree::DocTree;
