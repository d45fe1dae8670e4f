//! Construction of concrete entities from abstract kinds.
//!
//! [`NodeFactory`] is an explicit registry from [`EntityKind`] to an
//! [`Implementation`]. Callers only name the kind; the factory decides which
//! concrete type they get. Nodes come back detached: attaching them to a tree
//! is up to the caller.
//!
//! A kind with no registered implementation falls back to a [`GenericNode`]
//! when the kind is directly constructible (actions, templates and
//! references). The fallback is logged as a warning since a registry missing
//! one of those kinds is usually a wiring mistake.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::entity::{Entity, EntityHeader};
use crate::error::FactoryError;
use crate::kind::EntityKind;
use crate::nodes::{
    ActionNode, CaseNode, GenericNode, ProjectNode, ReferenceNode, StepNode, SuiteNode,
    TemplateNode, TemplateProjectNode,
};

/// Optional construction inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateHints {
    /// Uid to use instead of a freshly generated one.
    pub uid: Option<String>,
    pub description: Option<String>,
    /// Reference target uid (reference nodes only).
    pub target: Option<String>,
    pub target_kind: Option<EntityKind>,
}

impl CreateHints {
    pub fn with_uid(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            ..Self::default()
        }
    }

    /// Header for a new node, generating a uid when none was given.
    pub fn header(&self, name: &str) -> EntityHeader {
        let uid = self
            .uid
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        EntityHeader {
            name: name.to_string(),
            uid,
            description: self.description.clone(),
        }
    }
}

pub type Constructor = fn(&str, &CreateHints) -> Result<Box<dyn Entity>, FactoryError>;

/// A concrete type registered for a kind.
#[derive(Clone, Copy)]
pub struct Implementation {
    name: &'static str,
    construct: Constructor,
}

impl Implementation {
    pub const fn new(name: &'static str, construct: Constructor) -> Self {
        Self { name, construct }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Implementation").field(&self.name).finish()
    }
}

/// Registry of concrete implementations, fixed once built.
#[derive(Debug, Clone, Default)]
pub struct NodeFactory {
    implementations: BTreeMap<EntityKind, Implementation>,
}

impl NodeFactory {
    /// An empty factory; every kind goes through the fallback rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with the standard implementation for every kind.
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.register(
            EntityKind::Project,
            Implementation::new("ProjectNode", |name, hints| {
                Ok(Box::new(ProjectNode::new(hints.header(name))))
            }),
        );
        factory.register(
            EntityKind::TemplateProject,
            Implementation::new("TemplateProjectNode", |name, hints| {
                Ok(Box::new(TemplateProjectNode::new(hints.header(name))))
            }),
        );
        factory.register(
            EntityKind::TestSuite,
            Implementation::new("SuiteNode", |name, hints| {
                Ok(Box::new(SuiteNode::new(hints.header(name))))
            }),
        );
        factory.register(
            EntityKind::TestCase,
            Implementation::new("CaseNode", |name, hints| {
                Ok(Box::new(CaseNode::new(hints.header(name))))
            }),
        );
        factory.register(
            EntityKind::TestStep,
            Implementation::new("StepNode", |name, hints| {
                Ok(Box::new(StepNode::new(hints.header(name))))
            }),
        );
        factory.register(
            EntityKind::TestAction,
            Implementation::new("ActionNode", |name, hints| {
                Ok(Box::new(ActionNode::new(hints.header(name))))
            }),
        );
        factory.register(
            EntityKind::Template,
            Implementation::new("TemplateNode", |name, hints| {
                Ok(Box::new(TemplateNode::new(hints.header(name))))
            }),
        );
        factory.register(
            EntityKind::Reference,
            Implementation::new("ReferenceNode", construct_reference),
        );
        factory
    }

    /// Register (or replace) the implementation of a kind.
    pub fn register(
        &mut self,
        kind: EntityKind,
        implementation: Implementation,
    ) -> Option<Implementation> {
        self.implementations.insert(kind, implementation)
    }

    pub fn implementation(&self, kind: EntityKind) -> Option<&Implementation> {
        self.implementations.get(&kind)
    }

    pub fn create(&self, kind: EntityKind, name: &str) -> Result<Box<dyn Entity>, FactoryError> {
        self.create_with(kind, name, &CreateHints::default())
    }

    pub fn create_with(
        &self,
        kind: EntityKind,
        name: &str,
        hints: &CreateHints,
    ) -> Result<Box<dyn Entity>, FactoryError> {
        if name.trim().is_empty() {
            return Err(FactoryError::InvalidName);
        }

        let Some(implementation) = self.implementations.get(&kind) else {
            return Self::fallback(kind, name, hints);
        };

        let entity = (implementation.construct)(name, hints)?;
        if entity.kind() != kind {
            return Err(FactoryError::KindMismatch {
                implementation: implementation.name,
                expected: kind,
                found: entity.kind(),
            });
        }
        debug!(
            kind = kind.tag(),
            implementation = implementation.name,
            name,
            "created entity"
        );
        Ok(entity)
    }

    /// Create by element tag, as found in a persisted document.
    pub fn create_by_tag(
        &self,
        tag: &str,
        name: &str,
        hints: &CreateHints,
    ) -> Result<Box<dyn Entity>, FactoryError> {
        let kind =
            EntityKind::from_tag(tag).ok_or_else(|| FactoryError::UnknownTag(tag.to_string()))?;
        self.create_with(kind, name, hints)
    }

    fn fallback(
        kind: EntityKind,
        name: &str,
        hints: &CreateHints,
    ) -> Result<Box<dyn Entity>, FactoryError> {
        if !kind.is_directly_constructible() {
            return Err(FactoryError::NotConstructible { kind });
        }
        warn!(
            kind = kind.tag(),
            name, "no implementation registered, constructing a generic node"
        );
        Ok(Box::new(GenericNode::new(kind, hints.header(name))))
    }
}

fn construct_reference(name: &str, hints: &CreateHints) -> Result<Box<dyn Entity>, FactoryError> {
    let reference = ReferenceNode::new(hints.header(name))
        .pointing_at(hints.target.clone().unwrap_or_default(), hints.target_kind);
    Ok(Box::new(reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_registered_implementation_with_name() {
        let factory = NodeFactory::with_defaults();
        let suite = factory.create(EntityKind::TestSuite, "Foo").unwrap();
        assert_eq!(suite.kind(), EntityKind::TestSuite);
        assert_eq!(suite.implementation(), "SuiteNode");
        assert_eq!(suite.name(), "Foo");
        assert!(!suite.uid().is_empty());
        assert!(suite.downcast_ref::<SuiteNode>().is_some());
    }

    #[test]
    fn every_kind_has_a_default() {
        let factory = NodeFactory::with_defaults();
        for kind in EntityKind::ALL {
            let entity = factory.create(kind, "x").unwrap();
            assert_eq!(entity.kind(), kind);
            assert_ne!(entity.implementation(), "GenericNode");
        }
    }

    #[test]
    fn hints_fix_uid_and_reference_target() {
        let factory = NodeFactory::with_defaults();
        let hints = CreateHints {
            uid: Some("r-1".into()),
            target: Some("t-9".into()),
            target_kind: Some(EntityKind::Template),
            ..CreateHints::default()
        };
        let entity = factory
            .create_with(EntityKind::Reference, "login", &hints)
            .unwrap();
        assert_eq!(entity.uid(), "r-1");
        let reference = entity.downcast_ref::<ReferenceNode>().unwrap();
        assert_eq!(reference.target, "t-9");
        assert_eq!(reference.target_kind, Some(EntityKind::Template));
    }

    #[test]
    fn unregistered_leaf_kind_falls_back_to_generic() {
        let factory = NodeFactory::new();
        let action = factory.create(EntityKind::TestAction, "click").unwrap();
        assert_eq!(action.implementation(), "GenericNode");
        assert_eq!(action.kind(), EntityKind::TestAction);
        assert_eq!(action.name(), "click");
    }

    #[test]
    fn unregistered_container_kind_is_an_error() {
        let factory = NodeFactory::new();
        assert_eq!(
            factory.create(EntityKind::TestSuite, "Foo").unwrap_err(),
            FactoryError::NotConstructible {
                kind: EntityKind::TestSuite
            }
        );
    }

    #[test]
    fn blank_names_are_rejected() {
        let factory = NodeFactory::with_defaults();
        assert_eq!(
            factory.create(EntityKind::TestCase, "  ").unwrap_err(),
            FactoryError::InvalidName
        );
    }

    #[test]
    fn mismatched_registration_is_reported() {
        let mut factory = NodeFactory::new();
        factory.register(
            EntityKind::TestCase,
            Implementation::new("StepNode", |name, hints| {
                Ok(Box::new(StepNode::new(hints.header(name))))
            }),
        );
        assert!(matches!(
            factory.create(EntityKind::TestCase, "c"),
            Err(FactoryError::KindMismatch { .. })
        ));
    }

    #[test]
    fn constructor_failures_surface() {
        let mut factory = NodeFactory::new();
        factory.register(
            EntityKind::TestStep,
            Implementation::new("Broken", |_, _| {
                Err(FactoryError::Construction {
                    kind: EntityKind::TestStep,
                    reason: "no backing store".into(),
                })
            }),
        );
        assert!(matches!(
            factory.create(EntityKind::TestStep, "s"),
            Err(FactoryError::Construction { .. })
        ));
    }

    #[test]
    fn create_by_tag_rejects_unknown_tags() {
        let factory = NodeFactory::with_defaults();
        let case = factory
            .create_by_tag("case", "c", &CreateHints::default())
            .unwrap();
        assert_eq!(case.kind(), EntityKind::TestCase);
        assert_eq!(
            factory
                .create_by_tag("folder", "f", &CreateHints::default())
                .unwrap_err(),
            FactoryError::UnknownTag("folder".into())
        );
    }
}
