//! Error types for tendril_render

use thiserror::Error;

/// Errors raised by a host surface while rendering
///
/// Plan shapes are closed enums, so an unrecognized plan kind cannot be
/// constructed. What remains are plans the host refuses (a bad tag name)
/// and host operations on nodes in an unexpected state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The tag name cannot be used to create an element
    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),

    /// The node does not exist on this host
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Children can only be inserted into element nodes
    #[error("node cannot contain children: {0}")]
    NotAContainer(String),

    /// The node is not a child of the given parent
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    /// Inserting the node would create a cycle
    #[error("cannot insert {child} into its own subtree")]
    InvalidHierarchy { child: String },

    /// The listener is not attached to the given node
    #[error("unknown event listener on {0}")]
    UnknownListener(String),
}

/// Result type for render operations
pub type Result<T> = std::result::Result<T, RenderError>;
