use thiserror::Error;

use crate::kind::EntityKind;
use crate::tree::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("entity name must not be blank")]
    InvalidName,

    #[error("no implementation registered for {kind} and it cannot be constructed directly")]
    NotConstructible { kind: EntityKind },

    #[error("implementation {implementation} registered for {expected} built a {found}")]
    KindMismatch {
        implementation: &'static str,
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("unknown entity tag <{0}>")]
    UnknownTag(String),

    #[error("cannot construct {kind}: {reason}")]
    Construction { kind: EntityKind, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} is not in the tree")]
    UnknownNode(NodeId),

    #[error("node {0} already has a parent")]
    AlreadyAttached(NodeId),

    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("a {parent} cannot contain a {child}")]
    IllegalContainment {
        parent: EntityKind,
        child: EntityKind,
    },

    #[error("node {0} has no parent")]
    NotAttached(NodeId),
}

pub type Result<T, E = TreeError> = std::result::Result<T, E>;
