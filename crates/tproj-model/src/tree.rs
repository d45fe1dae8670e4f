//! Arena-backed entity tree.
//!
//! The tree owns every entity. A node has at most one parent and the parent
//! owns its children exclusively; cross links between entities are expressed
//! with [`ReferenceNode`](crate::nodes::ReferenceNode)s, never structurally.
//!
//! [`NodeId`]s are never reused, so an id kept across a `remove` simply stops
//! resolving.

use std::fmt;

use tracing::debug;

use crate::entity::Entity;
use crate::error::{Result, TreeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Slot {
    entity: Box<dyn Entity>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A forest of entities; parentless nodes are roots.
#[derive(Debug, Default)]
pub struct EntityTree {
    slots: Vec<Option<Slot>>,
    roots: Vec<NodeId>,
}

impl EntityTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node. It stays a root until attached somewhere.
    pub fn insert_root(&mut self, entity: Box<dyn Entity>) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Slot {
            entity,
            parent: None,
            children: Vec::new(),
        }));
        self.roots.push(id);
        id
    }

    /// Insert a node and attach it under `parent` in one step.
    pub fn insert_child(&mut self, parent: NodeId, entity: Box<dyn Entity>) -> Result<NodeId> {
        let parent_kind = self.slot(parent)?.entity.kind();
        if !parent_kind.accepts(entity.kind()) {
            return Err(TreeError::IllegalContainment {
                parent: parent_kind,
                child: entity.kind(),
            });
        }
        let id = self.insert_root(entity);
        self.attach(parent, id)?;
        Ok(id)
    }

    /// Make `child` the last child of `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_kind = self.slot(parent)?.entity.kind();
        let child_slot = self.slot(child)?;
        if child_slot.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        if parent == child || self.ancestors(parent).contains(&child) {
            return Err(TreeError::Cycle { parent, child });
        }
        let child_kind = child_slot.entity.kind();
        if !parent_kind.accepts(child_kind) {
            return Err(TreeError::IllegalContainment {
                parent: parent_kind,
                child: child_kind,
            });
        }

        self.roots.retain(|root| *root != child);
        self.slot_mut(child)?.parent = Some(parent);
        self.slot_mut(parent)?.children.push(child);
        debug!(%parent, %child, kind = child_kind.tag(), "attached entity");
        Ok(())
    }

    /// Detach `child` from its parent; it becomes a root.
    pub fn detach(&mut self, child: NodeId) -> Result<()> {
        let parent = self
            .slot(child)?
            .parent
            .ok_or(TreeError::NotAttached(child))?;
        self.slot_mut(parent)?.children.retain(|id| *id != child);
        self.slot_mut(child)?.parent = None;
        self.roots.push(child);
        Ok(())
    }

    /// Remove a node and its whole subtree, returning the entities in
    /// depth-first order.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<Box<dyn Entity>>> {
        let parent = self.slot(id)?.parent;
        match parent {
            Some(parent) => self.slot_mut(parent)?.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }
        let order: Vec<NodeId> = self.walk(id).into_iter().map(|(node, _)| node).collect();
        let removed = order
            .into_iter()
            .filter_map(|node| self.slots.get_mut(node.0).and_then(Option::take))
            .map(|slot| slot.entity)
            .collect();
        Ok(removed)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_ok()
    }

    pub fn get(&self, id: NodeId) -> Option<&dyn Entity> {
        self.slot(id).ok().map(|slot| slot.entity.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut (dyn Entity + 'static)> {
        self.slot_mut(id).ok().map(|slot| slot.entity.as_mut())
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Children in insertion order; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.slot(id) {
            Ok(slot) => &slot.children,
            Err(_) => &[],
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).ok().and_then(|slot| slot.parent)
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            ancestors.push(node);
            current = self.parent(node);
        }
        ancestors
    }

    /// Names from the root down to `id`, joined with `/`.
    pub fn path(&self, id: NodeId) -> Option<String> {
        let entity = self.get(id)?;
        let mut names: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .filter_map(|node| self.get(node).map(|entity| entity.name()))
            .collect();
        names.reverse();
        names.push(entity.name());
        Some(names.join("/"))
    }

    /// Depth-first pre-order walk of the subtree at `id`, with depths
    /// relative to `id`.
    pub fn walk(&self, id: NodeId) -> Vec<(NodeId, usize)> {
        let mut order = Vec::new();
        if !self.contains(id) {
            return order;
        }
        let mut stack = vec![(id, 0)];
        while let Some((node, depth)) = stack.pop() {
            order.push((node, depth));
            for child in self.children(node).iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        order
    }

    /// Walk every root in order.
    pub fn walk_all(&self) -> Vec<(NodeId, usize)> {
        self.roots.iter().flat_map(|root| self.walk(*root)).collect()
    }

    pub fn find_by_uid(&self, uid: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, entity)| entity.uid() == uid)
            .map(|(id, _)| id)
    }

    /// Live nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &dyn Entity)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.as_ref()
                .map(|slot| (NodeId(idx), slot.entity.as_ref()))
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: NodeId) -> Result<&Slot> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(TreeError::UnknownNode(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownNode(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::NodeFactory;
    use crate::kind::EntityKind;

    struct Fixture {
        tree: EntityTree,
        project: NodeId,
        suite: NodeId,
        case: NodeId,
    }

    fn fixture() -> Fixture {
        let factory = NodeFactory::with_defaults();
        let mut tree = EntityTree::new();
        let project = tree.insert_root(factory.create(EntityKind::Project, "shop").unwrap());
        let suite = tree
            .insert_child(project, factory.create(EntityKind::TestSuite, "checkout").unwrap())
            .unwrap();
        let case = tree
            .insert_child(suite, factory.create(EntityKind::TestCase, "pay").unwrap())
            .unwrap();
        Fixture {
            tree,
            project,
            suite,
            case,
        }
    }

    #[test]
    fn navigation() {
        let f = fixture();
        assert_eq!(f.tree.roots(), &[f.project]);
        assert_eq!(f.tree.children(f.project), &[f.suite]);
        assert_eq!(f.tree.parent(f.case), Some(f.suite));
        assert_eq!(f.tree.ancestors(f.case), vec![f.suite, f.project]);
        assert_eq!(f.tree.path(f.case).as_deref(), Some("shop/checkout/pay"));
        let walk: Vec<usize> = f.tree.walk(f.project).iter().map(|(_, d)| *d).collect();
        assert_eq!(walk, vec![0, 1, 2]);
    }

    #[test]
    fn attach_rejects_cycles() {
        let mut f = fixture();
        let factory = NodeFactory::with_defaults();
        let inner = f
            .tree
            .insert_child(f.suite, factory.create(EntityKind::TestSuite, "inner").unwrap())
            .unwrap();
        f.tree.detach(f.suite).unwrap();
        assert_eq!(
            f.tree.attach(inner, f.suite),
            Err(TreeError::Cycle {
                parent: inner,
                child: f.suite
            })
        );
        assert_eq!(
            f.tree.attach(f.suite, f.suite),
            Err(TreeError::Cycle {
                parent: f.suite,
                child: f.suite
            })
        );
    }

    #[test]
    fn attach_rejects_second_parent() {
        let mut f = fixture();
        let factory = NodeFactory::with_defaults();
        let other = f
            .tree
            .insert_child(f.project, factory.create(EntityKind::TestSuite, "other").unwrap())
            .unwrap();
        assert_eq!(
            f.tree.attach(other, f.case),
            Err(TreeError::AlreadyAttached(f.case))
        );
    }

    #[test]
    fn attach_enforces_containment() {
        let mut f = fixture();
        let factory = NodeFactory::with_defaults();
        let action = f
            .tree
            .insert_root(factory.create(EntityKind::TestAction, "click").unwrap());
        assert_eq!(
            f.tree.attach(f.case, action),
            Err(TreeError::IllegalContainment {
                parent: EntityKind::TestCase,
                child: EntityKind::TestAction
            })
        );
        assert!(f.tree.roots().contains(&action));
    }

    #[test]
    fn detach_makes_a_root() {
        let mut f = fixture();
        f.tree.detach(f.case).unwrap();
        assert_eq!(f.tree.parent(f.case), None);
        assert!(f.tree.children(f.suite).is_empty());
        assert_eq!(f.tree.roots(), &[f.project, f.case]);
        assert_eq!(f.tree.detach(f.case), Err(TreeError::NotAttached(f.case)));
    }

    #[test]
    fn remove_drops_subtree() {
        let mut f = fixture();
        let removed = f.tree.remove(f.suite).unwrap();
        let names: Vec<&str> = removed.iter().map(|entity| entity.name()).collect();
        assert_eq!(names, vec!["checkout", "pay"]);
        assert_eq!(f.tree.len(), 1);
        assert!(f.tree.get(f.case).is_none());
        assert!(f.tree.children(f.project).is_empty());
        assert_eq!(f.tree.remove(f.case).unwrap_err(), TreeError::UnknownNode(f.case));
    }

    #[test]
    fn find_by_uid() {
        let f = fixture();
        let uid = f.tree.get(f.case).unwrap().uid().to_string();
        assert_eq!(f.tree.find_by_uid(&uid), Some(f.case));
        assert_eq!(f.tree.find_by_uid("missing"), None);
    }
}
