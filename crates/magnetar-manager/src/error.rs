use miette::Diagnostic;
use thiserror::Error;

use magnetar_core::{CoreError, NodeId};

/// Resource manager error type
#[derive(Error, Debug, Diagnostic)]
pub enum ManagerError {
    /// Node already registered
    #[error("Node already registered: {node_id}")]
    #[diagnostic(
        code(magnetar::manager::node_already_registered),
        help("Remove the node before registering it again")
    )]
    NodeAlreadyRegistered { node_id: NodeId },

    /// Node not found
    #[error("Node not found: {node_id}")]
    #[diagnostic(
        code(magnetar::manager::node_not_found),
        help("Verify the node id against the current cluster membership")
    )]
    NodeNotFound { node_id: NodeId },

    /// The nil node id cannot be registered
    #[error("The nil node id cannot be registered")]
    #[diagnostic(
        code(magnetar::manager::nil_node_id),
        help("The nil id is reserved as an unassigned marker")
    )]
    NilNodeId,

    /// Core error
    #[error("Core error: {0}")]
    #[diagnostic(
        code(magnetar::manager::core_error),
        help("The node's resource view failed validation")
    )]
    CoreError(#[from] CoreError),
}

/// Result type for resource manager operations
pub type Result<T> = std::result::Result<T, ManagerError>;

impl ManagerError {
    /// Create a NodeAlreadyRegistered error
    pub fn node_already_registered(node_id: NodeId) -> Self {
        Self::NodeAlreadyRegistered { node_id }
    }

    /// Create a NodeNotFound error
    pub fn node_not_found(node_id: NodeId) -> Self {
        Self::NodeNotFound { node_id }
    }
}
