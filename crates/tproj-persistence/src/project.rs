//! Project documents: an [`EntityTree`] persisted as nested XML elements.
//!
//! Each entity is an element named by its kind tag. The entity's own fields
//! are mapped into that element and its children are nested under a
//! `children` element:
//!
//! ```text
//! <project-document>
//!     <project name="webshop" uid="..">
//!         <children>
//!             <suite name="checkout" uid="..">
//!                 <children>..</children>
//!             </suite>
//!         </children>
//!     </project>
//! </project-document>
//! ```
//!
//! Loading builds every node through the [`NodeFactory`]. An element that
//! cannot become a node (unknown tag, missing name, factory or containment
//! failure) is skipped together with its subtree and reported; the rest of
//! the document still loads.

use std::path::{Path, PathBuf};

use tproj_mapping::MappingReport;
use tproj_model::{
    CreateHints, Entity, EntityKind, EntityTree, NodeFactory, NodeId, ReferenceNode,
};
use tproj_xml::{Element, WriteOptions};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::storer::XmlStorer;

/// Root element of a project document.
pub const PROJECT_ROOT: &str = "project-document";

/// Element holding the child entities of an entity.
pub const CHILDREN: &str = "children";

/// An entity element that was not loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub tag: String,
    pub name: Option<String>,
    pub reason: String,
}

/// Result of loading a project document.
#[derive(Debug, Default)]
pub struct ProjectLoad {
    pub tree: EntityTree,
    pub report: MappingReport,
    pub skipped: Vec<SkippedEntry>,
}

impl ProjectLoad {
    pub fn is_clean(&self) -> bool {
        self.report.is_clean() && self.skipped.is_empty()
    }
}

#[derive(Debug)]
pub struct ProjectDocument {
    storer: XmlStorer,
    factory: NodeFactory,
}

impl ProjectDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            storer: XmlStorer::new(path, PROJECT_ROOT),
            factory: NodeFactory::with_defaults(),
        }
    }

    pub fn with_factory(mut self, factory: NodeFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.storer = self.storer.with_options(options);
        self
    }

    pub fn path(&self) -> &Path {
        self.storer.path()
    }

    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    pub fn storer(&self) -> &XmlStorer {
        &self.storer
    }

    pub fn storer_mut(&mut self) -> &mut XmlStorer {
        &mut self.storer
    }

    /// Parse the backing file and build its tree.
    pub fn read(&mut self) -> Result<ProjectLoad> {
        self.storer.read()?;
        self.load_tree()
    }

    /// Build a tree from the current document.
    ///
    /// A document that was never read yields an empty tree.
    pub fn load_tree(&self) -> Result<ProjectLoad> {
        let mut load = ProjectLoad::default();
        let Some(document) = self.storer.state().document() else {
            return Ok(load);
        };
        for element in document.root().children() {
            if EntityKind::from_tag(element.name()).is_some() {
                self.load_entity(element, None, &mut load)?;
            }
        }
        debug!(
            nodes = load.tree.len(),
            skipped = load.skipped.len(),
            failures = load.report.failures.len(),
            "loaded project tree"
        );
        Ok(load)
    }

    fn load_entity(
        &self,
        element: &Element,
        parent: Option<NodeId>,
        load: &mut ProjectLoad,
    ) -> Result<()> {
        let name = element.attribute("name").map(str::to_string);
        let hints = CreateHints {
            uid: element.attribute("uid").map(str::to_string),
            ..CreateHints::default()
        };

        let created = self.factory.create_by_tag(
            element.name(),
            name.as_deref().unwrap_or_default(),
            &hints,
        );
        let mut entity = match created {
            Ok(entity) => entity,
            Err(error) => {
                skip(load, element, name, error.to_string());
                return Ok(());
            }
        };
        if entity.kind() == EntityKind::Reference
            && entity.downcast_ref::<ReferenceNode>().is_none()
        {
            warn!(
                name = entity.name(),
                implementation = entity.implementation(),
                target = element.attribute("target").unwrap_or_default(),
                "reference loaded without its target; it will be reported unresolved"
            );
        }

        load.report
            .merge(self.storer.mapper().load(&mut *entity, element)?);

        let inserted = match parent {
            Some(parent) => load.tree.insert_child(parent, entity),
            None => Ok(load.tree.insert_root(entity)),
        };
        let id = match inserted {
            Ok(id) => id,
            Err(error) => {
                skip(load, element, name, error.to_string());
                return Ok(());
            }
        };

        if let Some(children) = element.child(CHILDREN) {
            for child in children.children() {
                self.load_entity(child, Some(id), load)?;
            }
        }
        Ok(())
    }

    /// Replace the entity elements of the document with `tree`.
    ///
    /// Other content under the root is kept.
    pub fn store_tree(&mut self, tree: &EntityTree) -> Result<MappingReport> {
        let mut report = MappingReport::default();
        let mut elements = Vec::with_capacity(tree.roots().len());
        for (root, entity) in nodes(tree, tree.roots()) {
            elements.push(self.entity_element(tree, root, entity, &mut report)?);
        }

        let root = self.storer.document_mut().root_mut();
        let children = root.children_mut();
        let at = children
            .iter()
            .position(|child| EntityKind::from_tag(child.name()).is_some())
            .unwrap_or(children.len());
        children.retain(|child| EntityKind::from_tag(child.name()).is_none());
        children.splice(at..at, elements);

        debug!(
            nodes = tree.len(),
            failures = report.failures.len(),
            "stored project tree"
        );
        Ok(report)
    }

    fn entity_element(
        &self,
        tree: &EntityTree,
        id: NodeId,
        entity: &dyn Entity,
        report: &mut MappingReport,
    ) -> Result<Element> {
        let mut element = Element::new(entity.kind().tag());
        report.merge(self.storer.mapper().save(entity, &mut element)?);

        let mut children = Element::new(CHILDREN);
        for (child, entity) in nodes(tree, tree.children(id)) {
            children.push_child(self.entity_element(tree, child, entity, report)?);
        }
        if !children.is_empty() {
            element.push_child(children);
        }
        Ok(element)
    }

    /// Store `tree` and write the backing file.
    pub fn write(&mut self, tree: &EntityTree) -> Result<MappingReport> {
        let report = self.store_tree(tree)?;
        self.storer.write()?;
        info!(
            path = %self.storer.path().display(),
            nodes = tree.len(),
            "saved project"
        );
        Ok(report)
    }

    /// Store `tree` and write it to another file.
    pub fn write_as(&mut self, tree: &EntityTree, path: &Path) -> Result<MappingReport> {
        let report = self.store_tree(tree)?;
        self.storer.write_as(path)?;
        Ok(report)
    }
}

fn nodes<'a>(
    tree: &'a EntityTree,
    ids: &'a [NodeId],
) -> impl Iterator<Item = (NodeId, &'a dyn Entity)> + 'a {
    ids.iter()
        .filter_map(move |&id| tree.get(id).map(|entity| (id, entity)))
}

fn skip(load: &mut ProjectLoad, element: &Element, name: Option<String>, reason: String) {
    warn!(
        tag = element.name(),
        name = name.as_deref().unwrap_or_default(),
        %reason,
        "skipping entity element"
    );
    load.skipped.push(SkippedEntry {
        tag: element.name().to_string(),
        name,
        reason,
    });
}
