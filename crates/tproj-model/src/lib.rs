//! Test project entities.
//!
//! - [`EntityKind`]: the abstract kinds and which kinds may contain which.
//! - [`Entity`]: the capability every concrete node implements; all nodes are
//!   [`tproj_mapping::Mappable`] so they can be persisted field by field.
//! - [`NodeFactory`]: builds a concrete node for a kind and a name.
//! - [`EntityTree`]: owns the nodes and their parent/child links.
//! - [`UnresolvedReference`] / [`UserMessage`]: dangling references and the
//!   prompt offered for them.

pub mod entity;
pub mod error;
pub mod factory;
pub mod kind;
pub mod nodes;
pub mod reference;
pub mod tree;

pub use entity::{ENTITY_HEADER_INFO, Entity, EntityHeader};
pub use error::{FactoryError, TreeError};
pub use factory::{Constructor, CreateHints, Implementation, NodeFactory};
pub use kind::EntityKind;
pub use nodes::{
    ActionNode, CaseNode, GenericNode, ProjectNode, ReferenceNode, StepNode, SuiteNode,
    TemplateNode, TemplateProjectNode,
};
pub use reference::{ObjectRef, UnresolvedReference, UserMessage};
pub use tree::{EntityTree, NodeId};
