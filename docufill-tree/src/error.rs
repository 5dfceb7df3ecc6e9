use crate::node::NodeId;
use docufill_types::Scope;
use thiserror::Error;

/// Structural errors raised by tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The id was never allocated or its subtree has been removed.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The operation needs a parent but the node is a root or detached.
    #[error("node {0} has no parent")]
    NoParent(NodeId),

    /// A scope root is dead or not of the expected kind.
    #[error("invalid {scope} root: {reason}")]
    InvalidRoot { scope: Scope, reason: String },

    /// The node exists but is of the wrong kind for the operation.
    #[error("node {node} is not a {expected}")]
    WrongKind {
        node: NodeId,
        expected: &'static str,
    },

    /// Attaching would make a node its own ancestor.
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    /// The annotation store already holds the largest representable numeric id.
    #[error("annotation id space exhausted after {last}")]
    AnnotationIdsExhausted { last: String },
}

pub type TreeResult<T> = Result<T, TreeError>;
