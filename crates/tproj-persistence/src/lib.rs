//! File storage for tproj documents.
//!
//! - [`XmlStorer`]: one XML file, loaded on demand and written atomically.
//! - [`Resource`] / [`ResourceFile`]: a root document made of fixed
//!   [`Associable`] sections, such as the [`EnvironmentResource`].
//! - [`ProjectDocument`]: an entity tree stored as nested elements.

pub mod environment;
pub mod error;
pub mod io;
pub mod project;
pub mod resource;
pub mod storer;

pub use environment::{
    EnvironmentLink, EnvironmentLinksSection, EnvironmentListSection, EnvironmentResource,
    SECTION_HEADER_INFO, SectionHeader, ServerTypesSection, ServersSection,
};
pub use error::{PersistenceError, Result};
pub use io::{compute_file_hash, digest, write_atomic};
pub use project::{CHILDREN, PROJECT_ROOT, ProjectDocument, ProjectLoad, SkippedEntry};
pub use resource::{Associable, Resource, ResourceFile};
pub use storer::{DocumentState, XmlStorer};
