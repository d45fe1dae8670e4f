//! Cross references that cannot be resolved, and the prompts built for them.
//!
//! Resolution itself is left to whoever renders the [`UserMessage`]; the model
//! only reports which references dangle and which objects could replace the
//! missing target.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::kind::EntityKind;
use crate::nodes::ReferenceNode;
use crate::tree::{EntityTree, NodeId};

/// A message shown to a person while importing a project.
///
/// Encoded with a `type` discriminator:
///
/// ```json
/// {"type": "CONFIRMATION", "text": "Overwrite?"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserMessage {
    Confirmation {
        text: String,
    },
    ChooseAnotherObject {
        text: String,
        /// Tag of the kind the missing object must have.
        object_type: String,
        /// Uid the reference points at.
        object: String,
        candidates: Vec<ObjectRef>,
        /// Candidates whose name or uid resembles the missing target.
        suggestions: Vec<ObjectRef>,
    },
}

impl UserMessage {
    pub fn confirmation(text: impl Into<String>) -> Self {
        UserMessage::Confirmation { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            UserMessage::Confirmation { text } | UserMessage::ChooseAnotherObject { text, .. } => {
                text
            }
        }
    }
}

/// An entity offered as a replacement target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub uid: String,
    pub name: String,
    pub path: String,
}

/// A reference whose target uid does not name a node of the target kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub node: NodeId,
    pub name: String,
    pub target: String,
    pub target_kind: Option<EntityKind>,
}

impl UnresolvedReference {
    /// Build the prompt asking for another target.
    ///
    /// Candidates are every node of the target kind (any non-reference node
    /// when the kind is open); suggestions are the candidates that resemble
    /// the missing uid.
    pub fn to_message(&self, tree: &EntityTree) -> UserMessage {
        let candidates: Vec<ObjectRef> = tree
            .iter()
            .filter(|(_, entity)| match self.target_kind {
                Some(kind) => entity.kind() == kind,
                None => entity.kind() != EntityKind::Reference,
            })
            .map(|(id, entity)| ObjectRef {
                uid: entity.uid().to_string(),
                name: entity.name().to_string(),
                path: tree.path(id).unwrap_or_default(),
            })
            .collect();
        let suggestions = candidates
            .iter()
            .filter(|candidate| {
                resembles(&candidate.name, &self.target) || resembles(&candidate.uid, &self.target)
            })
            .cloned()
            .collect();

        let object_type = self
            .target_kind
            .map_or("entity", |kind| kind.tag())
            .to_string();
        let text = if self.target.is_empty() {
            let article = if object_type.starts_with(['a', 'e', 'i', 'o', 'u']) {
                "an"
            } else {
                "a"
            };
            format!(
                "Reference \"{}\" has no target. Choose {article} {object_type}.",
                self.name
            )
        } else {
            format!(
                "Reference \"{}\" points to {object_type} \"{}\", which does not exist. Choose another {object_type}.",
                self.name, self.target
            )
        };

        UserMessage::ChooseAnotherObject {
            text,
            object_type,
            object: self.target.clone(),
            candidates,
            suggestions,
        }
    }
}

/// Case-insensitive containment either way, or a shared prefix of at least
/// three characters.
fn resembles(candidate: &str, target: &str) -> bool {
    let candidate = candidate.to_lowercase();
    let target = target.to_lowercase();
    if candidate.is_empty() || target.is_empty() {
        return false;
    }
    if candidate.contains(&target) || target.contains(&candidate) {
        return true;
    }
    candidate
        .chars()
        .zip(target.chars())
        .take_while(|(a, b)| a == b)
        .count()
        >= 3
}

impl EntityTree {
    /// Every reference whose target is missing or has the wrong kind, in
    /// insertion order.
    ///
    /// A reference built by another implementation (such as a
    /// [`GenericNode`](crate::GenericNode) fallback) carries no target and is
    /// always reported.
    pub fn unresolved_references(&self) -> Vec<UnresolvedReference> {
        self.iter()
            .filter_map(|(id, entity)| {
                if entity.kind() != EntityKind::Reference {
                    return None;
                }
                let Some(reference) = entity.downcast_ref::<ReferenceNode>() else {
                    warn!(
                        name = entity.name(),
                        implementation = entity.implementation(),
                        "reference without a target field reported as unresolved"
                    );
                    return Some(UnresolvedReference {
                        node: id,
                        name: entity.name().to_string(),
                        target: String::new(),
                        target_kind: None,
                    });
                };
                let resolved = self
                    .find_by_uid(&reference.target)
                    .and_then(|target| self.get(target))
                    .is_some_and(|target| {
                        target.kind() != EntityKind::Reference
                            && reference
                                .target_kind
                                .is_none_or(|kind| target.kind() == kind)
                    });
                if resolved && !reference.target.is_empty() {
                    return None;
                }
                Some(UnresolvedReference {
                    node: id,
                    name: reference.header.name.clone(),
                    target: reference.target.clone(),
                    target_kind: reference.target_kind,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityHeader;
    use crate::factory::{CreateHints, NodeFactory};
    use crate::nodes::GenericNode;

    fn tree_with_reference(target: &str) -> (EntityTree, NodeId) {
        let factory = NodeFactory::with_defaults();
        let mut tree = EntityTree::new();
        let project = tree.insert_root(
            factory
                .create_with(EntityKind::Project, "shop", &CreateHints::with_uid("p"))
                .unwrap(),
        );
        for (name, uid) in [("login", "tpl-login"), ("logout", "tpl-logout")] {
            tree.insert_child(
                project,
                factory
                    .create_with(EntityKind::Template, name, &CreateHints::with_uid(uid))
                    .unwrap(),
            )
            .unwrap();
        }
        let hints = CreateHints {
            uid: Some("ref".into()),
            target: Some(target.into()),
            target_kind: Some(EntityKind::Template),
            ..CreateHints::default()
        };
        let reference = tree
            .insert_child(
                project,
                factory
                    .create_with(EntityKind::Reference, "use login", &hints)
                    .unwrap(),
            )
            .unwrap();
        (tree, reference)
    }

    #[test]
    fn resolved_references_are_not_reported() {
        let (tree, _) = tree_with_reference("tpl-login");
        assert!(tree.unresolved_references().is_empty());
    }

    #[test]
    fn dangling_reference_is_reported() {
        let (tree, reference) = tree_with_reference("tpl-signin");
        let unresolved = tree.unresolved_references();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].node, reference);
        assert_eq!(unresolved[0].target, "tpl-signin");
    }

    #[test]
    fn wrong_kind_is_unresolved() {
        let (tree, _) = tree_with_reference("p");
        assert_eq!(tree.unresolved_references().len(), 1);
    }

    #[test]
    fn reference_without_target_field_is_reported() {
        let (mut tree, _) = tree_with_reference("tpl-login");
        let project = tree.roots()[0];
        let generic = tree
            .insert_child(
                project,
                Box::new(GenericNode::new(
                    EntityKind::Reference,
                    EntityHeader::new("legacy", "ref-2"),
                )),
            )
            .unwrap();

        let unresolved = tree.unresolved_references();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].node, generic);
        assert_eq!(unresolved[0].target, "");
        assert_eq!(unresolved[0].target_kind, None);
        assert_eq!(
            unresolved[0].to_message(&tree).text(),
            "Reference \"legacy\" has no target. Choose an entity."
        );
    }

    #[test]
    fn message_lists_candidates_and_suggestions() {
        let (tree, _) = tree_with_reference("tpl-log");
        let unresolved = tree.unresolved_references();
        let message = unresolved[0].to_message(&tree);
        let UserMessage::ChooseAnotherObject {
            object_type,
            object,
            candidates,
            suggestions,
            ..
        } = &message
        else {
            panic!("expected a choose-another-object message");
        };
        assert_eq!(object_type, "template");
        assert_eq!(object, "tpl-log");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].path, "shop/login");
        assert_eq!(suggestions.len(), 2);
    }

    #[test]
    fn messages_carry_a_type_tag() {
        let json = serde_json::to_value(UserMessage::confirmation("Overwrite?")).unwrap();
        insta::assert_json_snapshot!(json, @r#"
        {
          "text": "Overwrite?",
          "type": "CONFIRMATION"
        }
        "#);

        let choose = UserMessage::ChooseAnotherObject {
            text: "pick".into(),
            object_type: "template".into(),
            object: "t".into(),
            candidates: vec![ObjectRef {
                uid: "t1".into(),
                name: "one".into(),
                path: "p/one".into(),
            }],
            suggestions: Vec::new(),
        };
        let encoded = serde_json::to_string(&choose).unwrap();
        assert!(encoded.starts_with(r#"{"type":"CHOOSE_ANOTHER_OBJECT""#));
        let decoded: UserMessage = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, choose);
    }
}
