use thiserror::Error;

use super::types::ConnectionType;

pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors raised while building or mutating a people network.
///
/// `MultipleOrigins`, `MissingOrigin` and `MissingCenterNode` abort
/// construction. Everything else concerns a single node or edge and leaves
/// the rest of the network usable.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("multiple origin nodes found: {first} and {second}")]
    MultipleOrigins { first: String, second: String },

    #[error("no origin node found")]
    MissingOrigin,

    #[error("center node not found after initialization")]
    MissingCenterNode,

    #[error("unknown node {0}")]
    UnknownNode(String),

    #[error("node {0} already exists")]
    DuplicateNode(String),

    #[error("edge {0} already exists")]
    DuplicateEdge(String),

    #[error("edge {edge} references missing node {node}")]
    InvalidEdge { edge: String, node: String },

    #[error("no simulated body for node {0}")]
    MissingBody(String),

    #[error("no style configured for connection type {0}")]
    MissingStyle(ConnectionType),

    #[error("attached {attached} of {total} nodes after {steps} traversal steps")]
    IncompleteAttachment {
        attached: usize,
        total: usize,
        steps: usize,
    },

    #[error("network has been destroyed")]
    Destroyed,
}

impl NetworkError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MultipleOrigins { .. } | Self::MissingOrigin | Self::MissingCenterNode
        )
    }
}
