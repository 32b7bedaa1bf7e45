use thiserror::Error;

use crate::tree::NodeId;

pub type Result<T> = std::result::Result<T, AmlError>;

/// Errors produced while building or serializing an AML object tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmlError {
    #[error("invalid AML name segment {0:?}")]
    InvalidNameSeg(String),

    #[error("invalid AML name string {0:?}")]
    InvalidNameString(String),

    #[error("node {0:?} does not exist in this tree")]
    UnknownNode(NodeId),

    #[error("node {0:?} cannot hold children")]
    NotAContainer(NodeId),

    #[error("node {node:?} already holds the maximum of {max} children")]
    TooManyChildren { node: NodeId, max: usize },

    #[error("node {0:?} is not an integer object")]
    NotAnInteger(NodeId),

    #[error("node {0:?} is not a counted package")]
    NotACountedPackage(NodeId),

    #[error("method argument count {0} exceeds 7")]
    TooManyArgs(u8),

    #[error("AML strings must not contain NUL bytes")]
    StringContainsNul,

    #[error("AML PkgLength too large: {0} bytes")]
    PkgLengthOverflow(usize),
}
