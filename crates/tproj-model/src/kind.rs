//! Abstract entity kinds and their containment rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The eight abstract kinds of node in a test project.
///
/// The tag is the element name used when a tree is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Project,
    TemplateProject,
    TestSuite,
    TestCase,
    TestStep,
    TestAction,
    Template,
    Reference,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Project,
        EntityKind::TemplateProject,
        EntityKind::TestSuite,
        EntityKind::TestCase,
        EntityKind::TestStep,
        EntityKind::TestAction,
        EntityKind::Template,
        EntityKind::Reference,
    ];

    /// Element tag of the kind.
    pub fn tag(&self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::TemplateProject => "template-project",
            EntityKind::TestSuite => "suite",
            EntityKind::TestCase => "case",
            EntityKind::TestStep => "step",
            EntityKind::TestAction => "action",
            EntityKind::Template => "template",
            EntityKind::Reference => "reference",
        }
    }

    /// Kind persisted under element tag `tag`.
    pub fn from_tag(tag: &str) -> Option<EntityKind> {
        EntityKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Human readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "Project",
            EntityKind::TemplateProject => "Template Project",
            EntityKind::TestSuite => "Test Suite",
            EntityKind::TestCase => "Test Case",
            EntityKind::TestStep => "Test Step",
            EntityKind::TestAction => "Test Action",
            EntityKind::Template => "Template",
            EntityKind::Reference => "Reference",
        }
    }

    /// Whether a node of this kind may own a child of kind `child`.
    pub fn accepts(&self, child: EntityKind) -> bool {
        use EntityKind as K;
        match self {
            K::Project => matches!(child, K::TestSuite | K::Template | K::Reference),
            K::TemplateProject => matches!(child, K::Template),
            K::TestSuite => matches!(child, K::TestSuite | K::TestCase | K::Reference),
            K::TestCase => matches!(child, K::TestStep | K::Reference),
            K::TestStep => matches!(child, K::TestAction | K::Reference),
            K::Template => matches!(child, K::TestStep | K::TestAction),
            K::TestAction | K::Reference => false,
        }
    }

    /// Kinds the factory may build as a generic node when no implementation
    /// is registered.
    pub fn is_directly_constructible(&self) -> bool {
        matches!(
            self,
            EntityKind::TestAction | EntityKind::Template | EntityKind::Reference
        )
    }

    /// Kinds that can only appear as a tree root.
    pub fn is_root_kind(&self) -> bool {
        matches!(self, EntityKind::Project | EntityKind::TemplateProject)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    /// Accepts the element tag or the human readable name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| {
                kind.tag() == normalized || kind.as_str().to_ascii_lowercase() == normalized
            })
            .ok_or_else(|| format!("Unknown entity kind: {s}"))
    }
}
